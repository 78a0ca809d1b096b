//! # Template Model
//!
//! A [`Template`] is a named set of required-key rules. It carries two
//! [`RequiredKeySpec`]s:
//!
//! - `oneTimeData` applies once, to the top level of a dataset's `data`.
//! - `iteratedData` applies to every element of the list stored under
//!   `iteratedKey` in the dataset's `data`.
//!
//! In a spec's `data` map, each declared value is an *example*: its
//! [`ValueKind`](crate::ValueKind) is the expected type and the value itself
//! is the default written when `assignDefaults` is set. A `null` example
//! accepts any type.

use serde::{Deserialize, Serialize};

use crate::identity::TemplateId;
use crate::value::ObjectMap;

/// List field that `iteratedData` applies to when a template names none.
pub const DEFAULT_ITERATED_KEY: &str = "items";

/// Evaluation policy attached to a [`RequiredKeySpec`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Metadata {
    /// Recurse into nested object/array examples instead of checking only
    /// the kind at the declared level.
    pub any_depth: bool,
    /// Repair missing or mismatched keys with the example value.
    pub assign_defaults: bool,
    /// Reserved for rejecting undeclared keys. Not enforced.
    pub strict_match: bool,
}

/// Required keys with example values, plus the policy to apply them with.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RequiredKeySpec {
    pub metadata: Metadata,
    pub data: ObjectMap,
}

impl RequiredKeySpec {
    /// Build a spec from a policy and a key → example map.
    pub fn new(metadata: Metadata, data: ObjectMap) -> Self {
        Self { metadata, data }
    }

    /// True when the spec declares no keys at all.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// A named set of required-key rules that datasets may declare compliance
/// with. Owned by the document store; the compliance engine only reads it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub id: TemplateId,
    pub title: String,
    #[serde(default)]
    pub one_time_data: RequiredKeySpec,
    #[serde(default)]
    pub iterated_data: RequiredKeySpec,
    #[serde(default = "default_iterated_key")]
    pub iterated_key: String,
}

fn default_iterated_key() -> String {
    DEFAULT_ITERATED_KEY.to_string()
}

impl Template {
    /// A template with only one-time requirements.
    pub fn one_time(id: TemplateId, title: impl Into<String>, spec: RequiredKeySpec) -> Self {
        Self {
            id,
            title: title.into(),
            one_time_data: spec,
            iterated_data: RequiredKeySpec::default(),
            iterated_key: default_iterated_key(),
        }
    }

    /// Attach iterated requirements for the list stored under `key`.
    pub fn with_iterated(mut self, key: impl Into<String>, spec: RequiredKeySpec) -> Self {
        self.iterated_key = key.into();
        self.iterated_data = spec;
        self
    }
}
