//! # Check Subcommand
//!
//! Evaluates a dataset file against template files with the compliance
//! engine, exactly as the API does on a dataset write.
//!
//! ## Usage
//!
//! ```bash
//! # Print the report, or the reconciled dataset when compliant:
//! chart check dataset.json --template sales.yaml --template regions.json
//!
//! # Write the reconciled dataset to a file instead:
//! chart check dataset.yaml -t sales.yaml --output reconciled.yaml
//! ```
//!
//! Files ending in `.yaml` or `.yml` are read and written as YAML, anything
//! else as JSON. A template file holds one template or a list of them.
//!
//! Exit codes: 0 compliant, 1 non-compliant, 2 operational error.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chart_compliance::{check_compliance, Outcome};
use chart_core::{Dataset, Template, TemplateId};
use clap::Args;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

pub const EXIT_COMPLIANT: u8 = 0;
pub const EXIT_NON_COMPLIANT: u8 = 1;
pub const EXIT_ERROR: u8 = 2;

/// Arguments for the check subcommand.
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Dataset file (JSON or YAML).
    pub dataset: PathBuf,

    /// Template file. Repeat for each file; order between files does not
    /// matter, the dataset's `parentTemplates` decides precedence.
    #[arg(short, long = "template", required = true)]
    pub templates: Vec<PathBuf>,

    /// Write the reconciled dataset here instead of printing it.
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TemplateFile {
    Many(Vec<Template>),
    One(Box<Template>),
}

/// Execute the check subcommand.
pub fn run_check(args: &CheckArgs) -> Result<u8> {
    let dataset: Dataset = read_file(&args.dataset)?;
    let templates = load_templates(&args.templates)?;
    tracing::info!(
        dataset_id = %dataset.id,
        templates = templates.len(),
        parents = dataset.parent_templates.len(),
        "checking dataset"
    );

    let outcome = check_compliance(&templates, dataset.data.clone(), &dataset.parent_templates)
        .with_context(|| format!("cannot check {}", args.dataset.display()))?;

    match outcome {
        Outcome::Compliant(data) => {
            let reconciled = Dataset { data, ..dataset };
            match &args.output {
                Some(path) => {
                    write_file(path, &reconciled)?;
                    tracing::info!(path = %path.display(), "reconciled dataset written");
                }
                None => println!("{}", serde_json::to_string_pretty(&reconciled)?),
            }
            Ok(EXIT_COMPLIANT)
        }
        Outcome::NonCompliant(report) => {
            tracing::info!(
                violations = report.violation_count(),
                "dataset is not compliant"
            );
            print!("{report}");
            Ok(EXIT_NON_COMPLIANT)
        }
    }
}

/// Load every template from `paths`, keyed by id. A later duplicate id
/// replaces an earlier one.
fn load_templates(paths: &[PathBuf]) -> Result<HashMap<TemplateId, Template>> {
    let mut templates = HashMap::new();
    for path in paths {
        let loaded = match read_file::<TemplateFile>(path)? {
            TemplateFile::Many(list) => list,
            TemplateFile::One(template) => vec![*template],
        };
        for template in loaded {
            if let Some(previous) = templates.insert(template.id, template) {
                tracing::warn!(
                    template_id = %previous.id,
                    path = %path.display(),
                    "duplicate template id, keeping the later definition"
                );
            }
        }
    }
    Ok(templates)
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml" | "yml")
    )
}

fn read_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read {}", path.display()))?;
    if is_yaml(path) {
        serde_yaml::from_str(&content).with_context(|| format!("invalid YAML in {}", path.display()))
    } else {
        serde_json::from_str(&content).with_context(|| format!("invalid JSON in {}", path.display()))
    }
}

fn write_file<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let content = if is_yaml(path) {
        serde_yaml::to_string(value)?
    } else {
        let mut json = serde_json::to_string_pretty(value)?;
        json.push('\n');
        json
    };
    std::fs::write(path, content).with_context(|| format!("cannot write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chart_core::DocumentValue;
    use serde_json::json;

    const TEMPLATE_A: &str = "5f0c3f52-4b7e-4a55-9a8e-0d2f6c1b7a01";
    const TEMPLATE_B: &str = "9a3e6b1d-2c44-4f0e-8d1b-3e7f5a9c2b02";

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    fn dataset_json(parents: &[&str], data: serde_json::Value) -> String {
        json!({
            "id": "c1d2e3f4-0000-4000-8000-000000000001",
            "title": "Q1",
            "parentTemplates": parents,
            "data": data
        })
        .to_string()
    }

    fn templates_yaml() -> String {
        format!(
            "- id: {TEMPLATE_A}\n  title: A\n  oneTimeData:\n    metadata:\n      assignDefaults: true\n    data:\n      x: 1\n\
             - id: {TEMPLATE_B}\n  title: B\n  oneTimeData:\n    data:\n      y: str\n"
        )
    }

    fn args(dataset: PathBuf, templates: Vec<PathBuf>, output: Option<PathBuf>) -> CheckArgs {
        CheckArgs {
            dataset,
            templates,
            output,
        }
    }

    #[test]
    fn compliant_dataset_is_written_reconciled() {
        let dir = tempfile::tempdir().unwrap();
        let dataset = write(dir.path(), "data.json", &dataset_json(&[TEMPLATE_A], json!({})));
        let templates = write(dir.path(), "templates.yaml", &templates_yaml());
        let output = dir.path().join("out.json");

        let code = run_check(&args(dataset, vec![templates], Some(output.clone()))).unwrap();
        assert_eq!(code, EXIT_COMPLIANT);

        let written: Dataset = read_file(&output).unwrap();
        assert_eq!(written.title, "Q1");
        assert_eq!(written.data.get("x"), Some(&DocumentValue::from(1)));
    }

    #[test]
    fn yaml_output_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let dataset = write(dir.path(), "data.json", &dataset_json(&[TEMPLATE_A], json!({})));
        let templates = write(dir.path(), "templates.yaml", &templates_yaml());
        let output = dir.path().join("out.yml");

        run_check(&args(dataset, vec![templates], Some(output.clone()))).unwrap();
        let content = std::fs::read_to_string(&output).unwrap();
        assert!(content.contains("x: 1"));
    }

    #[test]
    fn non_compliant_dataset_exits_one() {
        let dir = tempfile::tempdir().unwrap();
        let dataset = write(
            dir.path(),
            "data.json",
            &dataset_json(&[TEMPLATE_A, TEMPLATE_B], json!({})),
        );
        let templates = write(dir.path(), "templates.yaml", &templates_yaml());
        let output = dir.path().join("out.json");

        let code = run_check(&args(dataset, vec![templates], Some(output.clone()))).unwrap();
        assert_eq!(code, EXIT_NON_COMPLIANT);
        assert!(!output.exists());
    }

    #[test]
    fn single_template_json_file_is_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let dataset = write(dir.path(), "data.json", &dataset_json(&[TEMPLATE_B], json!({"y": "ok"})));
        let template = write(
            dir.path(),
            "b.json",
            &json!({"id": TEMPLATE_B, "title": "B", "oneTimeData": {"data": {"y": "s"}}}).to_string(),
        );
        let output = dir.path().join("out.json");

        let code = run_check(&args(dataset, vec![template], Some(output))).unwrap();
        assert_eq!(code, EXIT_COMPLIANT);
    }

    #[test]
    fn unknown_parent_template_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = "00000000-0000-4000-8000-00000000dead";
        let dataset = write(dir.path(), "data.json", &dataset_json(&[missing], json!({})));
        let templates = write(dir.path(), "templates.yaml", &templates_yaml());

        let err = run_check(&args(dataset, vec![templates], None)).unwrap_err();
        assert!(format!("{err:#}").contains(missing));
    }

    #[test]
    fn unreadable_dataset_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let templates = write(dir.path(), "templates.yaml", &templates_yaml());
        let err = run_check(&args(dir.path().join("absent.json"), vec![templates], None))
            .unwrap_err();
        assert!(err.to_string().contains("cannot read"));
    }

    #[test]
    fn malformed_template_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let dataset = write(dir.path(), "data.json", &dataset_json(&[], json!({})));
        let templates = write(dir.path(), "bad.json", "{\"title\": 3");
        let err = run_check(&args(dataset, vec![templates], None)).unwrap_err();
        assert!(err.to_string().contains("invalid JSON"));
    }
}
