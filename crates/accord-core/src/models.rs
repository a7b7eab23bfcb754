//! Data models for Accord
//!
//! Defines the shared project document and the typed survey field values.
//! A `Project` is the remote, multi-writer document; the local editable
//! mirror lives in [`crate::form::FormState`].

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier for a collaborator on a project (a stable account id,
/// typically an email address). Used as the key of approval and
/// acknowledgement maps.
pub type CollaboratorId = String;

/// Opaque, stable identifier for a project document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(Uuid);

impl ProjectId {
    /// Generate a fresh project id
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ProjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ProjectId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::from_str(s)?))
    }
}

/// A single survey field value
///
/// The survey schema is a fixed set of keys, each with exactly one of
/// these shapes. Keeping the union closed means normalization and
/// diffing are exhaustive instead of stringly-typed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    /// Free text
    Text(String),
    /// One option from a fixed list (may be the `"Other"` sentinel)
    Choice(String),
    /// Zero or more options from a fixed list
    MultiChoice(Vec<String>),
    /// Per-collaborator acknowledgement flags
    AckMap(BTreeMap<CollaboratorId, bool>),
    /// A number kept in its string form (percentages, share counts)
    NumberText(String),
}

impl FieldValue {
    /// Whether this value counts as "filled in" for completion purposes
    ///
    /// Ack maps are handled separately by validation, which also needs
    /// the collaborator roster; here an ack map is non-empty if it has
    /// at least one `true` entry.
    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Text(s) | FieldValue::Choice(s) | FieldValue::NumberText(s) => {
                s.trim().is_empty()
            }
            FieldValue::MultiChoice(items) => items.is_empty(),
            FieldValue::AckMap(map) => !map.values().any(|acked| *acked),
        }
    }

    /// The inner text, if this is a text-like value
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) | FieldValue::Choice(s) | FieldValue::NumberText(s) => Some(s),
            _ => None,
        }
    }

    /// The acknowledgement map, if this is an ack-map value
    pub fn as_ack_map(&self) -> Option<&BTreeMap<CollaboratorId, bool>> {
        match self {
            FieldValue::AckMap(map) => Some(map),
            _ => None,
        }
    }
}

/// Survey answers keyed by field name
pub type SurveyData = BTreeMap<String, FieldValue>;

/// The remote shared document representing one agreement survey
///
/// Multi-writer: every collaborator edits the same project. Writes are
/// last-write-wins at the document level; the sync session is
/// responsible for not clobbering local keystrokes with its own echo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    /// Stable identifier
    pub id: ProjectId,
    /// Current survey answers (never contains companion "…Other" keys)
    #[serde(default)]
    pub survey_data: SurveyData,
    /// Which collaborators have approved the current survey data
    #[serde(default)]
    pub approvals: BTreeMap<CollaboratorId, bool>,
    /// Everyone with edit/approval rights on this project
    #[serde(default)]
    pub collaborators: Vec<CollaboratorId>,
    /// When the document was last written
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
    /// Display name of the last editor
    #[serde(default)]
    pub last_edited_by: Option<String>,
    /// When true, any accepted change clears `approvals`
    #[serde(default)]
    pub requires_approvals: bool,
    /// Once true, the project is read-only from the editing surface
    #[serde(default)]
    pub submitted: bool,
    /// Edits lock after this point, independent of `submitted`
    #[serde(default)]
    pub edit_deadline: Option<DateTime<Utc>>,
}

impl Project {
    /// Create an empty project with the given collaborators
    pub fn new(collaborators: Vec<CollaboratorId>) -> Self {
        Self {
            id: ProjectId::new(),
            survey_data: SurveyData::new(),
            approvals: BTreeMap::new(),
            collaborators,
            last_updated: None,
            last_edited_by: None,
            requires_approvals: false,
            submitted: false,
            edit_deadline: None,
        }
    }

    /// Require collaborator approvals on this project
    pub fn with_required_approvals(mut self) -> Self {
        self.requires_approvals = true;
        self
    }

    /// Set the edit deadline
    pub fn with_edit_deadline(mut self, deadline: DateTime<Utc>) -> Self {
        self.edit_deadline = Some(deadline);
        self
    }

    /// Whether the editing surface is locked at `now`
    pub fn is_read_only(&self, now: DateTime<Utc>) -> bool {
        if self.submitted {
            return true;
        }
        match self.edit_deadline {
            Some(deadline) => now >= deadline,
            None => false,
        }
    }

    /// Count of collaborators who have approved the current data
    pub fn approval_count(&self) -> usize {
        self.approvals.values().filter(|approved| **approved).count()
    }
}

/// A single atomic write against a project
///
/// Carries the full normalized survey payload plus editor provenance.
/// The store assigns the update timestamp server-side. When
/// `clear_approvals` is set, the approvals map is emptied in the same
/// write; when clear, approvals are left untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectUpdate {
    /// Normalized survey data (companion fields already stripped)
    pub survey_data: SurveyData,
    /// Display name of the editor issuing the write
    pub edited_by: String,
    /// Reset `approvals` to empty as part of this write
    pub clear_approvals: bool,
}

/// The identity editing a project: a stable collaborator id plus a
/// display label for provenance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Editor {
    /// Stable collaborator identifier (ack-map and approval key)
    pub id: CollaboratorId,
    /// Human-readable label for "last edited by"
    pub display_name: String,
}

impl Editor {
    /// Create an editor identity
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
        }
    }
}
