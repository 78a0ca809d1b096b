//! # Compliance Enforcement
//!
//! Glue between the template store and the compliance engine. The template
//! store resolves template ids for the engine; every dataset write goes
//! through [`enforce`], and the dry-run endpoint through [`dry_run`].

use chart_compliance::{check_compliance, Outcome, ResolveError, TemplateResolver};
use chart_core::{DocumentValue, Template, TemplateId};
use uuid::Uuid;

use crate::error::AppError;
use crate::state::{Store, TemplateRecord};

pub const COMPLIANCE_CHECKS_TOTAL: &str = "chart_compliance_checks_total";

impl TemplateResolver for Store<TemplateRecord> {
    fn fetch(&self, id: &TemplateId) -> Result<Option<Template>, ResolveError> {
        Ok(self.get(id.as_uuid()).map(|record| record.to_template()))
    }
}

fn record_outcome(outcome: &'static str) {
    metrics::counter!(COMPLIANCE_CHECKS_TOTAL, "outcome" => outcome).increment(1);
}

/// Run a compliance check of `data` against `parents`, in order.
pub fn dry_run(
    templates: &Store<TemplateRecord>,
    data: DocumentValue,
    parents: &[Uuid],
) -> Result<Outcome, AppError> {
    let ids: Vec<TemplateId> = parents.iter().copied().map(TemplateId::from).collect();
    let outcome = check_compliance(templates, data, &ids).map_err(|err| {
        record_outcome("unresolved");
        tracing::info!(error = %err, "compliance check could not resolve templates");
        AppError::from(err)
    })?;

    match &outcome {
        Outcome::Compliant(_) => record_outcome("compliant"),
        Outcome::NonCompliant(report) => {
            record_outcome("non_compliant");
            tracing::info!(
                templates = parents.len(),
                violations = report.violation_count(),
                "dataset failed compliance check"
            );
        }
    }
    Ok(outcome)
}

/// Return the reconciled document, or fail with the violation report.
pub fn enforce(
    templates: &Store<TemplateRecord>,
    data: DocumentValue,
    parents: &[Uuid],
) -> Result<DocumentValue, AppError> {
    dry_run(templates, data, parents)?
        .into_result()
        .map_err(AppError::NonCompliant)
}
