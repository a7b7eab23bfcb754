//! Completion and progress derivation
//!
//! Pure functions over the schema, the current form state, and the
//! project's collaborator roster. No I/O, no mutation, no caching:
//! cheap enough to recompute on every state change.

use crate::form::FormState;
use crate::models::{CollaboratorId, FieldValue};
use crate::schema::SurveySchema;

/// Whether a single field counts as completed
///
/// Text-like and list fields complete when non-empty. Acknowledgement
/// maps complete only when every collaborator on the project has a
/// `true` entry; a partially-acknowledged map is incomplete.
pub fn is_field_completed(value: Option<&FieldValue>, collaborators: &[CollaboratorId]) -> bool {
    let Some(value) = value else {
        return false;
    };

    match value {
        FieldValue::AckMap(map) => collaborators
            .iter()
            .all(|id| map.get(id).copied().unwrap_or(false)),
        other => !other.is_empty(),
    }
}

/// Whether every required field of a section is filled in
pub fn is_section_completed(
    schema: &SurveySchema,
    section_id: &str,
    form: &FormState,
    collaborators: &[CollaboratorId],
) -> bool {
    schema
        .required_fields(section_id)
        .all(|spec| is_field_completed(form.get(&spec.key), collaborators))
}

/// Overall survey progress as an integer percent in [0, 100]
///
/// Completed sections over total sections, rounded. A schema with no
/// sections reports 100.
pub fn calculate_progress(
    schema: &SurveySchema,
    form: &FormState,
    collaborators: &[CollaboratorId],
) -> u8 {
    let total = schema.sections().len();
    if total == 0 {
        return 100;
    }

    let completed = schema
        .sections()
        .iter()
        .filter(|section| is_section_completed(schema, &section.id, form, collaborators))
        .count();

    ((completed as f64 / total as f64) * 100.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SurveyData;
    use std::collections::BTreeMap;

    fn schema() -> SurveySchema {
        SurveySchema::cofounder_agreement()
    }

    fn collaborators() -> Vec<CollaboratorId> {
        vec!["alice@example.com".to_string(), "bob@example.com".to_string()]
    }

    fn fill_company_section(form: &mut FormState, schema: &SurveySchema) {
        form.apply_change(schema, "companyName", FieldValue::Text("Acme".to_string()));
        form.apply_change(schema, "entityType", FieldValue::Choice("LLC".to_string()));
        form.apply_change(
            schema,
            "stateOfFormation",
            FieldValue::Choice("Delaware".to_string()),
        );
    }

    #[test]
    fn test_empty_form_has_no_completed_sections() {
        let schema = schema();
        let form = FormState::from_remote(&schema, &SurveyData::new());
        let collabs = collaborators();

        for section in schema.sections() {
            assert!(!is_section_completed(&schema, &section.id, &form, &collabs));
        }
        assert_eq!(calculate_progress(&schema, &form, &collabs), 0);
    }

    #[test]
    fn test_section_completes_when_required_fields_filled() {
        let schema = schema();
        let mut form = FormState::from_remote(&schema, &SurveyData::new());
        let collabs = collaborators();

        fill_company_section(&mut form, &schema);
        assert!(is_section_completed(&schema, "company", &form, &collabs));
        // Optional companion field stays empty without blocking completion
        assert_eq!(
            form.get("entityTypeOther"),
            Some(&FieldValue::Text(String::new()))
        );
    }

    #[test]
    fn test_partial_ack_map_is_incomplete() {
        // Two collaborators, only alice has acknowledged
        let schema = schema();
        let mut form = FormState::from_remote(&schema, &SurveyData::new());
        let collabs = collaborators();

        form.apply_change(
            &schema,
            "ipAssignment",
            FieldValue::Choice("Assigned to company".to_string()),
        );

        let mut ack = BTreeMap::new();
        ack.insert("alice@example.com".to_string(), true);
        form.apply_change(&schema, "acknowledgeForfeiture", FieldValue::AckMap(ack.clone()));
        assert!(!is_section_completed(&schema, "ip", &form, &collabs));

        ack.insert("bob@example.com".to_string(), true);
        form.apply_change(&schema, "acknowledgeForfeiture", FieldValue::AckMap(ack));
        assert!(is_section_completed(&schema, "ip", &form, &collabs));
    }

    #[test]
    fn test_false_ack_entry_is_incomplete() {
        let schema = schema();
        let mut form = FormState::from_remote(&schema, &SurveyData::new());
        let collabs = collaborators();

        form.apply_change(
            &schema,
            "ipAssignment",
            FieldValue::Choice("Assigned to company".to_string()),
        );

        let mut ack = BTreeMap::new();
        ack.insert("alice@example.com".to_string(), true);
        ack.insert("bob@example.com".to_string(), false);
        form.apply_change(&schema, "acknowledgeForfeiture", FieldValue::AckMap(ack));

        assert!(!is_section_completed(&schema, "ip", &form, &collabs));
    }

    #[test]
    fn test_progress_rounds_to_percent() {
        let schema = schema();
        let mut form = FormState::from_remote(&schema, &SurveyData::new());
        let collabs = collaborators();

        fill_company_section(&mut form, &schema);
        // 1 of 5 sections
        assert_eq!(calculate_progress(&schema, &form, &collabs), 20);
    }

    #[test]
    fn test_completing_a_section_never_decreases_progress() {
        let schema = schema();
        let mut form = FormState::from_remote(&schema, &SurveyData::new());
        let collabs = collaborators();

        let before = calculate_progress(&schema, &form, &collabs);
        fill_company_section(&mut form, &schema);
        let after = calculate_progress(&schema, &form, &collabs);
        assert!(after >= before);

        form.apply_change(&schema, "streetAddress", FieldValue::Text("1 Main".to_string()));
        form.apply_change(&schema, "city", FieldValue::Text("Dover".to_string()));
        form.apply_change(&schema, "state", FieldValue::Text("DE".to_string()));
        form.apply_change(&schema, "postalCode", FieldValue::Text("19901".to_string()));
        let final_progress = calculate_progress(&schema, &form, &collabs);
        assert!(final_progress >= after);
        assert_eq!(final_progress, 40);
    }
}
