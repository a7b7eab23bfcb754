//! Accord Core Library
//!
//! This crate provides the synchronization core for Accord, a
//! collaborative agreement-survey editor: a multi-user form backed by
//! a shared remote document, kept consistent by autosave.
//!
//! # Architecture
//!
//! Three cooperating pieces, all owned by one session task per project:
//!
//! - **Remote sync**: a live subscription mirrors the shared document
//!   locally, suppressing the echo of our own in-flight writes so
//!   concurrent keystrokes are never clobbered.
//! - **Autosave**: edits apply optimistically, then a trailing-edge
//!   debounce normalizes the form (merging `"Other"` free-text
//!   companions), diffs it against the remote, and issues one atomic
//!   write, clearing collaborator approvals only on real changes.
//! - **Validation**: pure derivation of per-section completion and
//!   overall progress from form state plus the collaborator roster.
//!
//! # Quick Start
//!
//! ```text
//! let store = MemoryStore::new();
//! store.insert(project);
//!
//! let handle = spawn_session(
//!     store,
//!     project_id,
//!     Editor::new("alice@example.com", "Alice"),
//!     SurveySchema::cofounder_agreement(),
//!     SessionConfig::default(),
//! )?;
//!
//! handle.edit("companyName", FieldValue::Text("Acme".into())).await;
//! let progress = handle.view().calculate_progress();
//! ```
//!
//! # Modules
//!
//! - `sync`: the session task (entry point), save status machine
//! - `models`: project document and typed field values
//! - `schema`: static survey schema, defaults, merge normalization
//! - `form`: local form state and structural diffing
//! - `validation`: completion and progress derivation
//! - `store`: document store interface and in-memory implementation
//! - `config`: application configuration

pub mod config;
pub mod form;
pub mod models;
pub mod schema;
pub mod store;
pub mod sync;
pub mod validation;

pub use config::Config;
pub use form::FormState;
pub use models::{Editor, FieldValue, Project, ProjectId, ProjectUpdate, SurveyData};
pub use schema::{SurveySchema, OTHER_SENTINEL};
pub use store::{DocumentStore, MemoryStore, StoreError, StoreEvent, Subscription};
pub use sync::{spawn_session, SaveStatus, SessionConfig, SessionEvent, SessionHandle, SessionView};
