//! # chart-compliance: Template Compliance Engine
//!
//! Decides whether a document satisfies every template it declares and,
//! where a template permits, repairs it by inserting the template's
//! example values.
//!
//! ## Flow
//!
//! 1. [`resolve`]: the caller's [`TemplateResolver`] turns template ids into
//!    templates. Any unknown id fails the whole check before evaluation.
//! 2. [`evaluator`]: each template's required keys are applied to a working
//!    copy of the document, first template wins on conflicts.
//! 3. [`report`]: violations are grouped per template into a
//!    [`ComplianceReport`], or the reconciled document is returned.
//!
//! [`check_compliance`] runs all three steps.
//!
//! ## Crate Policy
//!
//! - Depends only on `chart-core` internally.
//! - Synchronous and allocation-bounded by the input. No I/O.
//! - Malformed document content is reported, never a panic.

pub mod evaluator;
pub mod path;
pub mod report;
pub mod resolve;
pub mod violation;

pub use evaluator::{evaluate, Evaluation};
pub use path::{KeyPath, Segment};
pub use report::{summarize, ComplianceReport, Outcome, TemplateViolations};
pub use resolve::{ResolveError, TemplateResolver};
pub use violation::{Violation, ViolationKind};

use chart_core::{DocumentValue, TemplateId};

/// Check `data` against the templates named by `template_ids`, in order.
///
/// An empty id list is trivially compliant and does not touch the resolver.
///
/// # Errors
///
/// Returns [`ResolveError`] when any template cannot be resolved. Nothing is
/// evaluated in that case.
pub fn check_compliance<R>(
    resolver: &R,
    data: DocumentValue,
    template_ids: &[TemplateId],
) -> Result<Outcome, ResolveError>
where
    R: TemplateResolver + ?Sized,
{
    if template_ids.is_empty() {
        return Ok(Outcome::Compliant(data));
    }
    let templates = resolver.resolve(template_ids)?;
    let evaluation = evaluate(data, &templates);
    Ok(summarize(evaluation, &templates))
}
