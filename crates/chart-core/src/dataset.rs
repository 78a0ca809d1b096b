//! # Dataset Model
//!
//! An arbitrary document plus the ordered list of templates it claims to
//! comply with. The order of `parentTemplates` is significant: when two
//! templates supply a default for the same key, the earlier one wins.

use serde::{Deserialize, Serialize};

use crate::identity::{DatasetId, TemplateId};
use crate::value::DocumentValue;

/// A stored dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    pub id: DatasetId,
    pub title: String,
    #[serde(default)]
    pub parent_templates: Vec<TemplateId>,
    #[serde(default = "DocumentValue::object")]
    pub data: DocumentValue,
}

impl Dataset {
    /// Whether the dataset declares compliance with `template`.
    pub fn declares(&self, template: &TemplateId) -> bool {
        self.parent_templates.contains(template)
    }
}
