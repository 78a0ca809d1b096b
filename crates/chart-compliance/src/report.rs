//! # Violation Aggregator
//!
//! Turns an [`Evaluation`] into an [`Outcome`]: the reconciled document when
//! no violation was found, otherwise a [`ComplianceReport`] grouping the
//! violations by template.
//!
//! Rendered report format, one block per template:
//!
//! ```text
//! price violation against template Sales (6f1c...)
//! - found string, expected number
//!
//! region violation against template Regions (0b2e...)
//! - missing required key "region"
//! ```

use chart_core::{DocumentValue, Template, TemplateId};
use serde::Serialize;

use crate::evaluator::Evaluation;
use crate::violation::Violation;

/// Violations raised by one template, in encounter order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateViolations {
    pub template_id: TemplateId,
    pub template_title: String,
    pub violations: Vec<Violation>,
}

impl TemplateViolations {
    fn display_title(&self) -> &str {
        if self.template_title.is_empty() {
            "<unknown>"
        } else {
            &self.template_title
        }
    }

    fn render_into(&self, out: &mut String) {
        let mut keys: Vec<String> = Vec::new();
        for violation in &self.violations {
            let key = violation.key_path.to_string();
            if !keys.contains(&key) {
                keys.push(key);
            }
        }
        for key in keys {
            out.push_str(&format!(
                "{key} violation against template {} ({})\n",
                self.display_title(),
                self.template_id
            ));
            for violation in self
                .violations
                .iter()
                .filter(|v| v.key_path.to_string() == key)
            {
                out.push_str(&format!("- {}\n", violation.detail));
            }
        }
    }
}

/// Every violation of a failed check, grouped by template.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceReport {
    pub templates: Vec<TemplateViolations>,
}

impl ComplianceReport {
    /// Group `violations` by template in order of first appearance.
    pub fn from_violations(violations: Vec<Violation>) -> Self {
        let mut templates: Vec<TemplateViolations> = Vec::new();
        for violation in violations {
            match templates
                .iter_mut()
                .find(|group| group.template_id == violation.template_id)
            {
                Some(group) => group.violations.push(violation),
                None => templates.push(TemplateViolations {
                    template_id: violation.template_id,
                    template_title: violation.template_title.clone(),
                    violations: vec![violation],
                }),
            }
        }
        Self { templates }
    }

    pub fn violation_count(&self) -> usize {
        self.templates.iter().map(|g| g.violations.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.violation_count() == 0
    }

    pub fn violations(&self) -> impl Iterator<Item = &Violation> {
        self.templates.iter().flat_map(|g| g.violations.iter())
    }

    /// Human-readable report, blocks separated by a blank line.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (i, group) in self.templates.iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            group.render_into(&mut out);
        }
        out
    }
}

impl std::fmt::Display for ComplianceReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.render())
    }
}

/// Result of a compliance check.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Already compliant or repaired; carries the reconciled document.
    Compliant(DocumentValue),
    NonCompliant(ComplianceReport),
}

impl Outcome {
    pub fn is_compliant(&self) -> bool {
        matches!(self, Self::Compliant(_))
    }

    pub fn into_result(self) -> Result<DocumentValue, ComplianceReport> {
        match self {
            Self::Compliant(document) => Ok(document),
            Self::NonCompliant(report) => Err(report),
        }
    }
}

/// Decide pass/fail. Groups follow the order of `templates`.
pub fn summarize(evaluation: Evaluation, templates: &[Template]) -> Outcome {
    if evaluation.violations.is_empty() {
        return Outcome::Compliant(evaluation.document);
    }

    let mut groups: Vec<TemplateViolations> = Vec::new();
    for template in templates {
        if groups.iter().any(|g| g.template_id == template.id) {
            continue;
        }
        let violations: Vec<Violation> = evaluation
            .violations
            .iter()
            .filter(|v| v.template_id == template.id)
            .cloned()
            .collect();
        if !violations.is_empty() {
            groups.push(TemplateViolations {
                template_id: template.id,
                template_title: template.title.clone(),
                violations,
            });
        }
    }
    Outcome::NonCompliant(ComplianceReport { templates: groups })
}
