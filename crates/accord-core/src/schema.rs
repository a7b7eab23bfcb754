//! Survey schema
//!
//! The schema is static configuration: the fixed set of survey fields,
//! their value shapes and defaults, which fields each section requires,
//! which "choice + other" companion pairs exist, and the address
//! component group that feeds the derived mailing-address field.
//!
//! The sync core takes the schema as a parameter and never mutates it.

use crate::models::{FieldValue, SurveyData};

/// The sentinel choice value indicating a companion free-text field
/// supplies the real answer
pub const OTHER_SENTINEL: &str = "Other";

/// Shape of a survey field's value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Free text
    Text,
    /// One option from a fixed list
    Choice,
    /// Zero or more options from a fixed list
    MultiChoice,
    /// Per-collaborator acknowledgement flags
    AckMap,
    /// A number kept as a string
    Number,
}

impl FieldKind {
    /// The empty default value for this shape
    pub fn default_value(self) -> FieldValue {
        match self {
            FieldKind::Text => FieldValue::Text(String::new()),
            FieldKind::Choice => FieldValue::Choice(String::new()),
            FieldKind::MultiChoice => FieldValue::MultiChoice(Vec::new()),
            FieldKind::AckMap => FieldValue::AckMap(Default::default()),
            FieldKind::Number => FieldValue::NumberText(String::new()),
        }
    }
}

/// One survey field
#[derive(Debug, Clone)]
pub struct FieldSpec {
    /// Field key as stored in survey data
    pub key: String,
    /// Value shape
    pub kind: FieldKind,
    /// Section this field belongs to
    pub section: String,
    /// Whether the section is incomplete while this field is empty
    pub required: bool,
}

impl FieldSpec {
    fn new(key: &str, kind: FieldKind, section: &str, required: bool) -> Self {
        Self {
            key: key.to_string(),
            kind,
            section: section.to_string(),
            required,
        }
    }
}

/// An ordered survey section
#[derive(Debug, Clone)]
pub struct SectionSpec {
    /// Stable section id
    pub id: String,
    /// Display title
    pub title: String,
}

/// A "choice + other" pairing: when `choice` holds the `"Other"`
/// sentinel, `companion` holds the real answer
#[derive(Debug, Clone)]
pub struct OtherPair {
    /// Key of the choice field
    pub choice: String,
    /// Key of the companion free-text field (never persisted)
    pub companion: String,
}

/// The address component fields and the composite they derive
#[derive(Debug, Clone)]
pub struct AddressGroup {
    /// Component field keys, in display order
    pub components: Vec<String>,
    /// Key of the derived full mailing address field
    pub composite: String,
}

/// The full survey schema
#[derive(Debug, Clone)]
pub struct SurveySchema {
    sections: Vec<SectionSpec>,
    fields: Vec<FieldSpec>,
    other_pairs: Vec<OtherPair>,
    address: Option<AddressGroup>,
}

impl SurveySchema {
    /// Build a schema from its parts
    pub fn new(
        sections: Vec<SectionSpec>,
        fields: Vec<FieldSpec>,
        other_pairs: Vec<OtherPair>,
        address: Option<AddressGroup>,
    ) -> Self {
        Self {
            sections,
            fields,
            other_pairs,
            address,
        }
    }

    /// The standard cofounder agreement survey
    pub fn cofounder_agreement() -> Self {
        let section = |id: &str, title: &str| SectionSpec {
            id: id.to_string(),
            title: title.to_string(),
        };

        let sections = vec![
            section("company", "Company Basics"),
            section("address", "Registered Address"),
            section("equity", "Equity & Vesting"),
            section("roles", "Roles & Decision Making"),
            section("ip", "Intellectual Property"),
        ];

        use FieldKind::*;
        let fields = vec![
            FieldSpec::new("companyName", Text, "company", true),
            FieldSpec::new("entityType", Choice, "company", true),
            FieldSpec::new("entityTypeOther", Text, "company", false),
            FieldSpec::new("stateOfFormation", Choice, "company", true),
            FieldSpec::new("streetAddress", Text, "address", true),
            FieldSpec::new("addressLine2", Text, "address", false),
            FieldSpec::new("city", Text, "address", true),
            FieldSpec::new("state", Text, "address", true),
            FieldSpec::new("postalCode", Text, "address", true),
            FieldSpec::new("mailingAddress", Text, "address", false),
            FieldSpec::new("equitySplit", Number, "equity", true),
            FieldSpec::new("vestingSchedule", Choice, "equity", true),
            FieldSpec::new("vestingScheduleOther", Text, "equity", false),
            FieldSpec::new("rolesAndTitles", Text, "roles", true),
            FieldSpec::new("decisionMaking", Choice, "roles", true),
            FieldSpec::new("decisionMakingOther", Text, "roles", false),
            FieldSpec::new("workingDays", MultiChoice, "roles", true),
            FieldSpec::new("ipAssignment", Choice, "ip", true),
            FieldSpec::new("acknowledgeForfeiture", AckMap, "ip", true),
        ];

        let pair = |choice: &str, companion: &str| OtherPair {
            choice: choice.to_string(),
            companion: companion.to_string(),
        };
        let other_pairs = vec![
            pair("entityType", "entityTypeOther"),
            pair("vestingSchedule", "vestingScheduleOther"),
            pair("decisionMaking", "decisionMakingOther"),
        ];

        let address = Some(AddressGroup {
            components: vec![
                "streetAddress".to_string(),
                "addressLine2".to_string(),
                "city".to_string(),
                "state".to_string(),
                "postalCode".to_string(),
            ],
            composite: "mailingAddress".to_string(),
        });

        Self::new(sections, fields, other_pairs, address)
    }

    /// Sections in display order
    pub fn sections(&self) -> &[SectionSpec] {
        &self.sections
    }

    /// All fields
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Look up a field by key
    pub fn field(&self, key: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.key == key)
    }

    /// Required field specs for a section
    pub fn required_fields<'a>(
        &'a self,
        section_id: &'a str,
    ) -> impl Iterator<Item = &'a FieldSpec> + 'a {
        self.fields
            .iter()
            .filter(move |f| f.section == section_id && f.required)
    }

    /// Whether `key` is the companion free-text side of an other-pair
    pub fn is_companion(&self, key: &str) -> bool {
        self.other_pairs.iter().any(|p| p.companion == key)
    }

    /// Whether `key` is an address component feeding the composite
    pub fn is_address_component(&self, key: &str) -> bool {
        self.address
            .as_ref()
            .map(|group| group.components.iter().any(|c| c == key))
            .unwrap_or(false)
    }

    /// The address group, if the schema has one
    pub fn address_group(&self) -> Option<&AddressGroup> {
        self.address.as_ref()
    }

    /// Full default form state: every field at its empty default
    pub fn defaults(&self) -> SurveyData {
        self.fields
            .iter()
            .map(|f| (f.key.clone(), f.kind.default_value()))
            .collect()
    }

    /// Defaults overlaid with whatever the remote document holds
    ///
    /// Remote values win for known keys; missing keys fall back to the
    /// schema default, so the form never has to special-case "field
    /// missing". Keys outside the schema are ignored.
    pub fn merged(&self, remote: &SurveyData) -> SurveyData {
        let mut merged = self.defaults();
        for (key, value) in remote {
            if merged.contains_key(key) {
                merged.insert(key.clone(), value.clone());
            }
        }
        merged
    }

    /// Normalize a form payload for persistence
    ///
    /// For each other-pair whose choice holds the `"Other"` sentinel
    /// and whose companion text is non-empty, the companion's text
    /// replaces the choice value. Every companion field is then
    /// stripped; companions exist only in local form state.
    pub fn normalize(&self, values: &SurveyData) -> SurveyData {
        let mut out = values.clone();

        for pair in &self.other_pairs {
            let companion_text = out
                .get(&pair.companion)
                .and_then(FieldValue::as_text)
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string);

            if let Some(text) = companion_text {
                let is_other = matches!(
                    out.get(&pair.choice),
                    Some(FieldValue::Choice(c)) if c == OTHER_SENTINEL
                );
                if is_other {
                    out.insert(pair.choice.clone(), FieldValue::Choice(text));
                }
            }
        }

        for pair in &self.other_pairs {
            out.remove(&pair.companion);
        }

        out
    }

    /// Recompute the composite mailing address from its components
    ///
    /// Joins non-empty component values with ", ". Returns `None` when
    /// the schema has no address group.
    pub fn compose_address(&self, values: &SurveyData) -> Option<FieldValue> {
        let group = self.address.as_ref()?;
        let joined = group
            .components
            .iter()
            .filter_map(|key| values.get(key))
            .filter_map(FieldValue::as_text)
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(", ");
        Some(FieldValue::Text(joined))
    }
}
