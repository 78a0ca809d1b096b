//! # Violations
//!
//! A [`Violation`] is one detected non-compliance. Violations are produced
//! and consumed within a single compliance check and never persisted.

use chart_core::{Template, TemplateId, ValueKind};
use serde::Serialize;

use crate::path::KeyPath;

/// Category of a detected non-compliance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ViolationKind {
    /// A required key is absent and defaults are disallowed.
    MissingKey,
    /// A present key holds the wrong kind and defaults are disallowed.
    TypeMismatch,
    /// A declared template identifier does not resolve.
    TemplateNotFound,
}

impl ViolationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissingKey => "MISSING_KEY",
            Self::TypeMismatch => "TYPE_MISMATCH",
            Self::TemplateNotFound => "TEMPLATE_NOT_FOUND",
        }
    }
}

impl std::fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single non-compliance against one template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Violation {
    pub kind: ViolationKind,
    pub template_id: TemplateId,
    pub template_title: String,
    pub key_path: KeyPath,
    /// Human-readable description, one report line.
    pub detail: String,
}

impl Violation {
    pub fn missing_key(template: &Template, key_path: KeyPath) -> Self {
        let detail = format!("missing required key \"{key_path}\"");
        Self {
            kind: ViolationKind::MissingKey,
            template_id: template.id,
            template_title: template.title.clone(),
            key_path,
            detail,
        }
    }

    pub fn type_mismatch(
        template: &Template,
        key_path: KeyPath,
        found: ValueKind,
        expected: ValueKind,
    ) -> Self {
        Self {
            kind: ViolationKind::TypeMismatch,
            template_id: template.id,
            template_title: template.title.clone(),
            key_path,
            detail: format!("found {found}, expected {expected}"),
        }
    }

    /// An unresolved template reference. There is no title to report.
    pub fn template_not_found(template_id: TemplateId) -> Self {
        Self {
            kind: ViolationKind::TemplateNotFound,
            template_id,
            template_title: String::new(),
            key_path: KeyPath::root(),
            detail: format!("template {template_id} does not exist"),
        }
    }
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} at {}: {}", self.kind, self.key_path, self.detail)
    }
}
