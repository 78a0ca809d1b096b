//! # Identifier Newtypes
//!
//! Newtype wrappers for dataset and template identifiers. You cannot pass a
//! `DatasetId` where a `TemplateId` is expected; on the wire both serialize
//! as bare UUID strings.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

/// Unique identifier for a stored dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DatasetId(pub Uuid);

/// Unique identifier for a stored template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TemplateId(pub Uuid);

impl DatasetId {
    /// Generate a new random dataset identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl TemplateId {
    /// Generate a new random template identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for DatasetId {
    fn default() -> Self {
        Self::new()
    }
}

impl Default for TemplateId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for DatasetId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl From<Uuid> for TemplateId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl FromStr for DatasetId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_uuid("dataset", s).map(Self)
    }
}

impl FromStr for TemplateId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_uuid("template", s).map(Self)
    }
}

fn parse_uuid(kind: &'static str, s: &str) -> Result<Uuid, ValidationError> {
    Uuid::parse_str(s.trim()).map_err(|e| ValidationError::InvalidIdentifier {
        kind,
        value: s.to_string(),
        reason: e.to_string(),
    })
}

impl std::fmt::Display for DatasetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::fmt::Display for TemplateId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_id_round_trips_through_display() {
        let id = TemplateId::new();
        let parsed: TemplateId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn template_id_rejects_garbage() {
        let err = "not-real-id".parse::<TemplateId>().unwrap_err();
        assert!(err.to_string().contains("not-real-id"));
        assert!(err.to_string().contains("template"));
    }

    #[test]
    fn ids_serialize_as_bare_uuid_strings() {
        let uuid = Uuid::new_v4();
        let json = serde_json::to_string(&DatasetId(uuid)).unwrap();
        assert_eq!(json, format!("\"{uuid}\""));
    }

    #[test]
    fn distinct_ids_are_unique() {
        assert_ne!(TemplateId::new(), TemplateId::new());
    }
}
