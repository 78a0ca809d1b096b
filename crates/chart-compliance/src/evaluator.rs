//! # Compliance Evaluator
//!
//! Walks each template's required keys against a working copy of a
//! document. Missing or mistyped keys are either repaired with the
//! template's example value (`assignDefaults`) or recorded as violations.
//!
//! ## Pass order
//!
//! Every template's `oneTimeData` is applied to the document root first, in
//! template order. Only then is every template's `iteratedData` applied to
//! the elements of its list field, again in template order.
//!
//! ## Claims
//!
//! When several templates require the same key, the first one to settle it
//! wins. Settling a path (assigning it, or accepting an existing value)
//! records a claim on exactly that path, and a claimed value is never
//! overwritten. An assignment also claims every nested path the assigning
//! template would check on a re-run, so a reconciled document re-checks
//! clean. Inserting a key that is absent is always allowed.

use std::collections::HashMap;

use chart_core::{DocumentValue, Metadata, ObjectMap, Template, ValueError, ValueKind};

use crate::path::KeyPath;
use crate::violation::Violation;

/// Reconciled document plus every violation found, in encounter order.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub document: DocumentValue,
    pub violations: Vec<Violation>,
}

impl Evaluation {
    pub fn is_compliant(&self) -> bool {
        self.violations.is_empty()
    }
}

/// Evaluate `document` against `templates` in order.
///
/// Never fails: every problem is reported as a [`Violation`] and evaluation
/// continues with the next key.
pub fn evaluate(document: DocumentValue, templates: &[Template]) -> Evaluation {
    let mut working = document;
    let mut walk = Walk::default();

    for (owner, template) in templates.iter().enumerate() {
        let spec = &template.one_time_data;
        if spec.metadata.strict_match {
            tracing::debug!(template_id = %template.id, "strictMatch is not enforced");
        }
        let pass = Pass {
            owner,
            template,
            metadata: spec.metadata,
        };
        if working.kind() == ValueKind::Object {
            walk.apply_keys(&pass, &mut working, &spec.data, &KeyPath::root());
        } else if !spec.is_empty() || !template.iterated_data.is_empty() {
            walk.violations.push(Violation::type_mismatch(
                template,
                KeyPath::root(),
                working.kind(),
                ValueKind::Object,
            ));
        }
    }

    if working.kind() == ValueKind::Object {
        for (owner, template) in templates.iter().enumerate() {
            walk.apply_iterated(owner, template, &mut working);
        }
    }

    tracing::debug!(
        templates = templates.len(),
        violations = walk.violations.len(),
        "compliance evaluation finished"
    );

    Evaluation {
        document: working,
        violations: walk.violations,
    }
}

/// First-claim-wins record of which template settled which path.
#[derive(Debug, Default)]
struct Claims {
    by_path: HashMap<KeyPath, usize>,
}

impl Claims {
    fn claim(&mut self, path: KeyPath, owner: usize) {
        self.by_path.entry(path).or_insert(owner);
    }

    fn owner(&self, path: &KeyPath) -> Option<usize> {
        self.by_path.get(path).copied()
    }
}

/// One template applying one of its specs.
struct Pass<'a> {
    owner: usize,
    template: &'a Template,
    metadata: Metadata,
}

#[derive(Default)]
struct Walk {
    claims: Claims,
    violations: Vec<Violation>,
}

impl Walk {
    /// Apply `declared` to the object `target`.
    fn apply_keys(
        &mut self,
        pass: &Pass<'_>,
        target: &mut DocumentValue,
        declared: &ObjectMap,
        at: &KeyPath,
    ) {
        for (key, expected) in declared {
            if expected.is_null() {
                continue;
            }
            let path = at.key(key.as_str());
            match target.get_mut(key) {
                Some(found) => self.check_present(pass, found, expected, path),
                None if pass.metadata.assign_defaults => {
                    match target.set(key.as_str(), expected.clone()) {
                        Ok(_) => self.assigned(pass, path, expected),
                        Err(err) => self.container_error(pass, at, err),
                    }
                }
                None => self
                    .violations
                    .push(Violation::missing_key(pass.template, path)),
            }
        }
    }

    /// Apply `declared` element by element to the array `target`.
    fn apply_elements(
        &mut self,
        pass: &Pass<'_>,
        target: &mut DocumentValue,
        declared: &[DocumentValue],
        at: &KeyPath,
    ) {
        for (index, expected) in declared.iter().enumerate() {
            if expected.is_null() {
                continue;
            }
            let path = at.index(index);
            match target.get_index_mut(index) {
                Some(found) => self.check_present(pass, found, expected, path),
                None if pass.metadata.assign_defaults => {
                    // Wildcard positions before `index` are padded with null.
                    let appended = (target.len()..index)
                        .try_for_each(|_| target.push(DocumentValue::Null))
                        .and_then(|()| target.push(expected.clone()));
                    match appended {
                        Ok(()) => self.assigned(pass, path, expected),
                        Err(err) => self.container_error(pass, at, err),
                    }
                }
                None => self
                    .violations
                    .push(Violation::missing_key(pass.template, path)),
            }
        }
    }

    fn check_present(
        &mut self,
        pass: &Pass<'_>,
        found: &mut DocumentValue,
        expected: &DocumentValue,
        path: KeyPath,
    ) {
        if !found.is_kind_compatible(expected) {
            self.reconcile_mismatch(pass, found, expected, path);
            return;
        }

        self.claims.claim(path.clone(), pass.owner);
        if !pass.metadata.any_depth {
            return;
        }
        match expected {
            DocumentValue::Object(declared) => self.apply_keys(pass, found, declared, &path),
            DocumentValue::Array(declared) => self.apply_elements(pass, found, declared, &path),
            _ => {}
        }
    }

    /// `found` has the wrong kind: overwrite it, keep it, or report it.
    fn reconcile_mismatch(
        &mut self,
        pass: &Pass<'_>,
        found: &mut DocumentValue,
        expected: &DocumentValue,
        path: KeyPath,
    ) {
        if !pass.metadata.assign_defaults {
            self.violations.push(Violation::type_mismatch(
                pass.template,
                path,
                found.kind(),
                expected.kind(),
            ));
            return;
        }
        if let Some(owner) = self.claims.owner(&path) {
            tracing::debug!(
                template_id = %pass.template.id,
                key_path = %path,
                owner,
                "keeping value settled by an earlier template"
            );
            return;
        }
        *found = expected.clone();
        self.assigned(pass, path, expected);
    }

    /// Claim an assigned value and every nested path a re-check would
    /// settle: declared children, when the template checks at any depth.
    fn assigned(&mut self, pass: &Pass<'_>, path: KeyPath, value: &DocumentValue) {
        tracing::debug!(template_id = %pass.template.id, key_path = %path, "assigned default");
        self.claim_declared(pass, path, value);
    }

    fn claim_declared(&mut self, pass: &Pass<'_>, path: KeyPath, value: &DocumentValue) {
        if pass.metadata.any_depth {
            match value {
                DocumentValue::Object(map) => {
                    for (key, child) in map.iter().filter(|(_, v)| !v.is_null()) {
                        self.claim_declared(pass, path.key(key.as_str()), child);
                    }
                }
                DocumentValue::Array(items) => {
                    for (index, child) in items.iter().enumerate().filter(|(_, v)| !v.is_null()) {
                        self.claim_declared(pass, path.index(index), child);
                    }
                }
                _ => {}
            }
        }
        self.claims.claim(path, pass.owner);
    }

    /// A container changed kind under the walk. Unreachable for documents
    /// built through the public API, reported rather than ignored.
    fn container_error(&mut self, pass: &Pass<'_>, at: &KeyPath, err: ValueError) {
        let ValueError::TypeMismatch { expected, found } = err;
        self.violations.push(Violation::type_mismatch(
            pass.template,
            at.clone(),
            found,
            expected,
        ));
    }

    fn apply_iterated(&mut self, owner: usize, template: &Template, root: &mut DocumentValue) {
        let spec = &template.iterated_data;
        if spec.is_empty() {
            return;
        }
        let key = &template.iterated_key;
        let list_path = KeyPath::root().key(key.as_str());
        let pass = Pass {
            owner,
            template,
            metadata: spec.metadata,
        };

        // The list field is checked as a required key declared `[]`.
        let list_spec: ObjectMap = [(key.clone(), DocumentValue::Array(Vec::new()))]
            .into_iter()
            .collect();
        self.apply_keys(&pass, root, &list_spec, &KeyPath::root());

        let Some(list) = root.get_mut(key) else {
            return;
        };
        if list.kind() != ValueKind::Array {
            return;
        }
        for index in 0..list.len() {
            let path = list_path.index(index);
            let Some(item) = list.get_index_mut(index) else {
                break;
            };
            if item.kind() == ValueKind::Object {
                self.apply_keys(&pass, item, &spec.data, &path);
                continue;
            }
            if !spec.metadata.assign_defaults {
                self.violations.push(Violation::type_mismatch(
                    template,
                    path,
                    item.kind(),
                    ValueKind::Object,
                ));
            } else if let Some(owner) = self.claims.owner(&path) {
                tracing::debug!(
                    template_id = %template.id,
                    key_path = %path,
                    owner,
                    "keeping element settled by an earlier template"
                );
            } else {
                // Rebuild the element key by key so it is claimed exactly as
                // a re-check of the object would claim it.
                *item = DocumentValue::object();
                self.apply_keys(&pass, item, &spec.data, &path);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::violation::ViolationKind;
    use chart_core::{RequiredKeySpec, TemplateId};
    use serde_json::json;

    fn doc(value: serde_json::Value) -> DocumentValue {
        DocumentValue::from(value)
    }

    fn spec(assign: bool, any_depth: bool, data: serde_json::Value) -> RequiredKeySpec {
        let DocumentValue::Object(map) = doc(data) else {
            panic!("spec data must be an object");
        };
        RequiredKeySpec::new(
            Metadata {
                any_depth,
                assign_defaults: assign,
                strict_match: false,
            },
            map,
        )
    }

    fn template(title: &str, spec: RequiredKeySpec) -> Template {
        Template::one_time(TemplateId::new(), title, spec)
    }

    #[test]
    fn no_templates_leaves_document_untouched() {
        let input = doc(json!({"a": 1}));
        let result = evaluate(input.clone(), &[]);
        assert_eq!(result.document, input);
        assert!(result.is_compliant());
    }

    #[test]
    fn wildcard_accepts_absent_and_any_kind() {
        let t = template("T", spec(false, false, json!({"anything": null})));
        assert!(evaluate(doc(json!({})), &[t.clone()]).is_compliant());
        assert!(evaluate(doc(json!({"anything": [1, 2]})), &[t]).is_compliant());
    }

    #[test]
    fn shallow_check_ignores_nested_contents() {
        let t = template("T", spec(false, false, json!({"obj": {"inner": 1}})));
        let result = evaluate(doc(json!({"obj": {}})), &[t]);
        assert!(result.is_compliant());
    }

    #[test]
    fn any_depth_reports_nested_path() {
        let t = template("T", spec(false, true, json!({"a": {"b": [0, {"c": true}]}})));
        let result = evaluate(doc(json!({"a": {"b": [5, {"c": "no"}]}})), &[t]);
        assert_eq!(result.violations.len(), 1);
        let v = &result.violations[0];
        assert_eq!(v.kind, ViolationKind::TypeMismatch);
        assert_eq!(v.key_path.to_string(), "a.b[1].c");
        assert_eq!(v.detail, "found string, expected bool");
    }

    #[test]
    fn any_depth_appends_missing_array_indices() {
        let t = template("T", spec(true, true, json!({"xs": [1, "two", null, false]})));
        let result = evaluate(doc(json!({"xs": [7]})), &[t]);
        assert!(result.is_compliant());
        assert_eq!(result.document, doc(json!({"xs": [7, "two", null, false]})));
    }

    #[test]
    fn missing_array_index_without_defaults_is_reported() {
        let t = template("T", spec(false, true, json!({"xs": [1, 2]})));
        let result = evaluate(doc(json!({"xs": [1]})), &[t]);
        assert_eq!(result.violations.len(), 1);
        assert_eq!(result.violations[0].kind, ViolationKind::MissingKey);
        assert_eq!(result.violations[0].key_path.to_string(), "xs[1]");
    }

    #[test]
    fn non_object_root_reports_once_per_template() {
        let a = template("A", spec(true, false, json!({"x": 1, "y": 2})));
        let b = template("B", spec(false, false, json!({"z": 1})));
        let result = evaluate(doc(json!([1, 2])), &[a, b]);
        assert_eq!(result.violations.len(), 2);
        assert!(result.violations.iter().all(|v| v.key_path.is_root()));
        assert_eq!(result.violations[0].detail, "found array, expected object");
    }

    #[test]
    fn earlier_assignment_blocks_later_overwrite() {
        let a = template("A", spec(true, false, json!({"k": 1})));
        let b = template("B", spec(true, false, json!({"k": "s"})));
        let result = evaluate(doc(json!({})), &[a, b]);
        assert!(result.is_compliant());
        assert_eq!(result.document, doc(json!({"k": 1})));
    }

    #[test]
    fn claimed_path_still_reports_for_template_without_defaults() {
        let a = template("A", spec(true, false, json!({"k": 1})));
        let b = template("B", spec(false, false, json!({"k": "s"})));
        let result = evaluate(doc(json!({})), &[a, b.clone()]);
        assert_eq!(result.violations.len(), 1);
        assert_eq!(result.violations[0].template_id, b.id);
    }

    #[test]
    fn descent_claims_only_the_container_node() {
        let a = template("A", spec(true, true, json!({"obj": {"a": 1}})));
        let b = template("B", spec(true, true, json!({"obj": {"b": "x"}, "other": 2})));
        let result = evaluate(doc(json!({"obj": {"b": 3}})), &[a, b]);
        assert!(result.is_compliant());
        assert_eq!(
            result.document,
            doc(json!({"obj": {"a": 1, "b": "x"}, "other": 2}))
        );
    }

    #[test]
    fn accepted_container_does_not_block_nested_repair() {
        let a = template("A", spec(false, false, json!({"o": {}})));
        let b = template("B", spec(true, true, json!({"o": {"x": 1}})));
        let result = evaluate(doc(json!({"o": {"x": "str"}})), &[a, b]);
        assert!(result.is_compliant());
        assert_eq!(result.document, doc(json!({"o": {"x": 1}})));
    }

    #[test]
    fn shallow_assignment_leaves_nested_paths_open() {
        let a = template("A", spec(true, false, json!({"o": {"x": 1}})));
        let b = template("B", spec(true, true, json!({"o": {"x": "s"}})));
        let result = evaluate(doc(json!({})), &[a, b]);
        assert!(result.is_compliant());
        assert_eq!(result.document, doc(json!({"o": {"x": "s"}})));
    }

    #[test]
    fn deep_assignment_claims_declared_children() {
        let a = template("A", spec(true, true, json!({"o": {"x": 1}})));
        let b = template("B", spec(true, true, json!({"o": {"x": "s"}})));
        let first = evaluate(doc(json!({})), &[a.clone(), b.clone()]);
        assert!(first.is_compliant());
        assert_eq!(first.document, doc(json!({"o": {"x": 1}})));

        let second = evaluate(first.document.clone(), &[a, b]);
        assert_eq!(second, first);
    }

    #[test]
    fn iterated_list_accepted_by_one_time_pass_is_still_repaired() {
        let seed = spec(true, false, json!({"items": []}));
        let t = Template::one_time(TemplateId::new(), "Rows", seed)
            .with_iterated("items", spec(true, false, json!({"amount": 0})));
        let result = evaluate(doc(json!({"items": [{"amount": "x"}, 7]})), &[t]);
        assert!(result.is_compliant());
        let items = result.document.get("items").expect("items kept");
        assert_eq!(items.get_index(0), Some(&doc(json!({"amount": 0}))));
        assert_eq!(items.get_index(1), Some(&doc(json!({"amount": 0}))));
        assert_eq!(items.get_index(2), None);
    }

    #[test]
    fn iterated_spec_applies_to_each_element() {
        let t = Template::one_time(TemplateId::new(), "Rows", RequiredKeySpec::default())
            .with_iterated("rows", spec(true, false, json!({"amount": 0})));
        let result = evaluate(doc(json!({"rows": [{"amount": 5}, {}, 3]})), &[t]);
        assert!(result.is_compliant());
        assert_eq!(
            result.document,
            doc(json!({"rows": [{"amount": 5}, {"amount": 0}, {"amount": 0}]}))
        );
    }

    #[test]
    fn iterated_list_missing_without_defaults() {
        let t = Template::one_time(TemplateId::new(), "Rows", RequiredKeySpec::default())
            .with_iterated("rows", spec(false, false, json!({"amount": 0})));
        let result = evaluate(doc(json!({})), &[t]);
        assert_eq!(result.violations.len(), 1);
        assert_eq!(result.violations[0].kind, ViolationKind::MissingKey);
        assert_eq!(result.violations[0].key_path.to_string(), "rows");
    }

    #[test]
    fn iterated_element_of_wrong_kind_is_reported() {
        let t = Template::one_time(TemplateId::new(), "Rows", RequiredKeySpec::default())
            .with_iterated("items", spec(false, false, json!({"amount": 0})));
        let result = evaluate(doc(json!({"items": [{"amount": 1}, "bad"]})), &[t]);
        assert_eq!(result.violations.len(), 1);
        assert_eq!(result.violations[0].key_path.to_string(), "items[1]");
        assert_eq!(result.violations[0].detail, "found string, expected object");
    }

    #[test]
    fn one_time_passes_run_before_iterated_passes() {
        let rows = Template::one_time(TemplateId::new(), "Rows", RequiredKeySpec::default())
            .with_iterated("items", spec(true, false, json!({"n": 0})));
        let seed = template("Seed", spec(true, false, json!({"items": [{}]})));
        let result = evaluate(doc(json!({})), &[rows, seed]);
        assert!(result.is_compliant());
        assert_eq!(result.document, doc(json!({"items": [{"n": 0}]})));
    }

    #[test]
    fn evaluation_never_drops_keys() {
        let t = template("T", spec(true, true, json!({"a": {"b": 1}})));
        let result = evaluate(doc(json!({"a": {"keep": true}, "z": null})), &[t]);
        assert_eq!(
            result.document,
            doc(json!({"a": {"b": 1, "keep": true}, "z": null}))
        );
    }
}
