//! Local form state
//!
//! The locally-edited mirror of a project's survey data. Always a full
//! superset shape: schema defaults merged with whatever the remote
//! document holds, so the view never sees a missing field.
//!
//! Edits apply here synchronously (optimistic UI); the sync session
//! decides when the state reconciles into the remote document.

use crate::models::{FieldValue, SurveyData};
use crate::schema::SurveySchema;

/// The locally-edited survey form
#[derive(Debug, Clone, PartialEq)]
pub struct FormState {
    values: SurveyData,
}

impl FormState {
    /// Seed form state from schema defaults plus a remote snapshot
    pub fn from_remote(schema: &SurveySchema, remote: &SurveyData) -> Self {
        Self {
            values: schema.merged(remote),
        }
    }

    /// Current value of a field
    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.values.get(key)
    }

    /// All current values
    pub fn values(&self) -> &SurveyData {
        &self.values
    }

    /// Apply a single field edit
    ///
    /// Returns false (and changes nothing) for keys outside the schema.
    /// Editing an address component recomputes the composite mailing
    /// address in the same step, before any persistence.
    pub fn apply_change(&mut self, schema: &SurveySchema, field: &str, value: FieldValue) -> bool {
        if schema.field(field).is_none() {
            return false;
        }

        self.values.insert(field.to_string(), value);

        if schema.is_address_component(field) {
            if let (Some(group), Some(composite)) =
                (schema.address_group(), schema.compose_address(&self.values))
            {
                self.values.insert(group.composite.clone(), composite);
            }
        }

        true
    }

    /// Replace the whole form with a fresh defaults-plus-snapshot merge
    pub fn reset_from_remote(&mut self, schema: &SurveySchema, remote: &SurveyData) {
        self.values = schema.merged(remote);
    }
}

/// Keys whose values differ structurally between two payloads
///
/// Compares by value equality, not reference: nested shapes like
/// per-collaborator acknowledgement maps compare deeply. A key present
/// on only one side counts as changed.
pub fn changed_fields(current: &SurveyData, baseline: &SurveyData) -> Vec<String> {
    let mut changed = Vec::new();

    for (key, value) in current {
        if baseline.get(key) != Some(value) {
            changed.push(key.clone());
        }
    }
    for key in baseline.keys() {
        if !current.contains_key(key) {
            changed.push(key.clone());
        }
    }

    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn schema() -> SurveySchema {
        SurveySchema::cofounder_agreement()
    }

    #[test]
    fn test_from_remote_merges_defaults() {
        let schema = schema();
        let mut remote = SurveyData::new();
        remote.insert(
            "companyName".to_string(),
            FieldValue::Text("Acme".to_string()),
        );

        let form = FormState::from_remote(&schema, &remote);
        assert_eq!(
            form.get("companyName"),
            Some(&FieldValue::Text("Acme".to_string()))
        );
        // Fields missing remotely exist at their defaults
        assert_eq!(form.get("equitySplit"), Some(&FieldValue::NumberText(String::new())));
    }

    #[test]
    fn test_apply_change_rejects_unknown_field() {
        let schema = schema();
        let mut form = FormState::from_remote(&schema, &SurveyData::new());

        assert!(!form.apply_change(&schema, "noSuchField", FieldValue::Text("x".to_string())));
        assert!(form.get("noSuchField").is_none());
    }

    #[test]
    fn test_address_edit_recomputes_composite() {
        let schema = schema();
        let mut form = FormState::from_remote(&schema, &SurveyData::new());

        form.apply_change(
            &schema,
            "streetAddress",
            FieldValue::Text("1 Infinite Loop".to_string()),
        );
        form.apply_change(&schema, "city", FieldValue::Text("Cupertino".to_string()));
        form.apply_change(&schema, "state", FieldValue::Text("CA".to_string()));

        assert_eq!(
            form.get("mailingAddress"),
            Some(&FieldValue::Text("1 Infinite Loop, Cupertino, CA".to_string()))
        );
    }

    #[test]
    fn test_non_address_edit_leaves_composite_alone() {
        let schema = schema();
        let mut form = FormState::from_remote(&schema, &SurveyData::new());

        form.apply_change(&schema, "city", FieldValue::Text("Dover".to_string()));
        let before = form.get("mailingAddress").cloned();

        form.apply_change(&schema, "companyName", FieldValue::Text("Acme".to_string()));
        assert_eq!(form.get("mailingAddress").cloned(), before);
    }

    #[test]
    fn test_changed_fields_structural_equality() {
        let mut a = SurveyData::new();
        let mut b = SurveyData::new();

        let mut ack_a = BTreeMap::new();
        ack_a.insert("alice@example.com".to_string(), true);
        let ack_b = ack_a.clone();

        a.insert("ack".to_string(), FieldValue::AckMap(ack_a));
        b.insert("ack".to_string(), FieldValue::AckMap(ack_b));
        assert!(changed_fields(&a, &b).is_empty());

        a.insert("name".to_string(), FieldValue::Text("Acme".to_string()));
        b.insert("name".to_string(), FieldValue::Text("Acme Inc".to_string()));
        assert_eq!(changed_fields(&a, &b), vec!["name".to_string()]);
    }

    #[test]
    fn test_changed_fields_one_sided_keys() {
        let mut a = SurveyData::new();
        a.insert("onlyInA".to_string(), FieldValue::Text("x".to_string()));
        let b = SurveyData::new();

        assert_eq!(changed_fields(&a, &b), vec!["onlyInA".to_string()]);
        assert_eq!(changed_fields(&b, &a), vec!["onlyInA".to_string()]);
    }

    #[test]
    fn test_identical_payloads_have_empty_diff() {
        let schema = schema();
        let form = FormState::from_remote(&schema, &SurveyData::new());
        assert!(changed_fields(form.values(), form.values()).is_empty());
    }
}
