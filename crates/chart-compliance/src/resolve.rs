//! # Template Resolution
//!
//! The engine never reads storage directly. Callers hand it a
//! [`TemplateResolver`] that turns template identifiers into templates.

use std::collections::HashMap;

use chart_core::{Template, TemplateId};
use thiserror::Error;

use crate::violation::Violation;

/// Errors from resolving template identifiers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// A requested identifier has no template.
    #[error("template {0} does not exist")]
    TemplateNotFound(TemplateId),

    /// The template store itself failed.
    #[error("template store failure: {0}")]
    Backend(String),
}

impl ResolveError {
    /// The failure as a client-facing violation, if it names a template.
    pub fn violation(&self) -> Option<Violation> {
        match self {
            Self::TemplateNotFound(id) => Some(Violation::template_not_found(*id)),
            Self::Backend(_) => None,
        }
    }
}

/// Read access to stored templates. Must be callable concurrently.
pub trait TemplateResolver: Send + Sync {
    /// Look up one template. `Ok(None)` means it does not exist.
    fn fetch(&self, id: &TemplateId) -> Result<Option<Template>, ResolveError>;

    /// Resolve `ids` in order, duplicates included. Fails as a whole on the
    /// first unknown identifier.
    fn resolve(&self, ids: &[TemplateId]) -> Result<Vec<Template>, ResolveError> {
        ids.iter()
            .map(|id| self.fetch(id)?.ok_or(ResolveError::TemplateNotFound(*id)))
            .collect()
    }
}

impl TemplateResolver for HashMap<TemplateId, Template> {
    fn fetch(&self, id: &TemplateId) -> Result<Option<Template>, ResolveError> {
        Ok(self.get(id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chart_core::RequiredKeySpec;

    fn store(titles: &[&str]) -> (HashMap<TemplateId, Template>, Vec<TemplateId>) {
        let mut map = HashMap::new();
        let mut ids = Vec::new();
        for title in titles {
            let t = Template::one_time(TemplateId::new(), *title, RequiredKeySpec::default());
            ids.push(t.id);
            map.insert(t.id, t);
        }
        (map, ids)
    }

    #[test]
    fn resolve_preserves_order_and_duplicates() {
        let (map, ids) = store(&["A", "B"]);
        let resolved = map.resolve(&[ids[1], ids[0], ids[1]]).unwrap();
        let titles: Vec<&str> = resolved.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["B", "A", "B"]);
    }

    #[test]
    fn resolve_fails_on_first_unknown() {
        let (map, ids) = store(&["A"]);
        let missing = TemplateId::new();
        assert_eq!(
            map.resolve(&[ids[0], missing, TemplateId::new()]),
            Err(ResolveError::TemplateNotFound(missing))
        );
    }

    #[test]
    fn not_found_converts_to_violation() {
        let id = TemplateId::new();
        let violation = ResolveError::TemplateNotFound(id).violation().unwrap();
        assert_eq!(violation.template_id, id);
        assert_eq!(violation.detail, format!("template {id} does not exist"));
        assert!(ResolveError::Backend("down".into()).violation().is_none());
    }
}
