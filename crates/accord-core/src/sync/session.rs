//! Project sync session
//!
//! A background task that owns one project's live subscription and the
//! locally-edited form state. Callers hold a [`SessionHandle`]: send
//! [`SessionCommand`]s, receive [`SessionEvent`]s, and read the latest
//! [`SessionView`] from a watch channel.
//!
//! Control flow: a field edit applies to the form synchronously, then
//! (re)arms the debounce timer. When the timer fires the form is
//! normalized, diffed against the last-known remote values, and written
//! in one atomic update, clearing approvals only when the diff is
//! non-empty and the project requires them. While the write (plus a settle
//! window) is outstanding, incoming snapshots update the project mirror
//! but never the form's field values.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, watch};
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info, warn};

use crate::form::{changed_fields, FormState};
use crate::models::{Editor, FieldValue, Project, ProjectId, ProjectUpdate};
use crate::schema::SurveySchema;
use crate::store::{DocumentStore, StoreEvent, StoreResult, Subscription};

use super::status::{SaveStatus, WriteState};

/// Timing knobs for a session
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Quiet period after the last edit before a write is issued
    pub debounce: Duration,
    /// Grace window after a write resolves during which our own echo
    /// is still treated as stale for form field values
    pub settle: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_secs(2),
            settle: Duration::from_millis(1500),
        }
    }
}

/// Commands sent to the session task
#[derive(Debug, Clone)]
pub enum SessionCommand {
    /// A local field edit (optimistic; debounce re-armed)
    FieldChanged {
        /// Survey field key
        field: String,
        /// New value
        value: FieldValue,
    },
    /// Persist a pending debounced edit immediately
    Flush,
    /// Shut the session down
    Shutdown,
}

/// Events emitted by the session task
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// Local form state changed
    FormChanged,
    /// The authoritative project mirror changed
    ProjectChanged,
    /// Save indicator changed
    SaveStatusChanged(SaveStatus),
    /// The store rejected the subscription (terminal)
    AccessDenied,
    /// A non-fatal subscription error; last known state retained
    SyncError(String),
}

/// Snapshot of session state for the view layer
#[derive(Debug, Clone)]
pub struct SessionView {
    schema: Arc<SurveySchema>,
    /// Latest authoritative project (approvals, submitted, deadline)
    pub project: Project,
    /// Locally-edited form state
    pub form: FormState,
    /// Save indicator
    pub save_status: SaveStatus,
    /// When the last successful write resolved
    pub last_saved_at: Option<DateTime<Utc>>,
    /// The subscription was rejected; show a dedicated message
    pub access_denied: bool,
}

impl SessionView {
    /// The schema this session was opened with
    pub fn schema(&self) -> &SurveySchema {
        &self.schema
    }

    /// Whether every required field of a section is filled in
    pub fn is_section_completed(&self, section_id: &str) -> bool {
        crate::validation::is_section_completed(
            &self.schema,
            section_id,
            &self.form,
            &self.project.collaborators,
        )
    }

    /// Overall progress in [0, 100]
    pub fn calculate_progress(&self) -> u8 {
        crate::validation::calculate_progress(&self.schema, &self.form, &self.project.collaborators)
    }

    /// Whether the editing surface is locked right now
    pub fn is_read_only(&self) -> bool {
        self.project.is_read_only(Utc::now())
    }
}

/// Handle to a running session
pub struct SessionHandle {
    /// Send commands to the session task
    pub command_tx: mpsc::Sender<SessionCommand>,
    /// Receive events from the session task
    pub event_rx: mpsc::Receiver<SessionEvent>,
    /// Watch the latest session view
    pub view_rx: watch::Receiver<SessionView>,
}

impl SessionHandle {
    /// The latest view snapshot
    pub fn view(&self) -> SessionView {
        self.view_rx.borrow().clone()
    }

    /// Apply a field edit
    pub async fn edit(&self, field: impl Into<String>, value: FieldValue) {
        let _ = self
            .command_tx
            .send(SessionCommand::FieldChanged {
                field: field.into(),
                value,
            })
            .await;
    }

    /// Persist any pending debounced edit now
    pub async fn flush(&self) {
        let _ = self.command_tx.send(SessionCommand::Flush).await;
    }

    /// Shut the session down
    pub async fn shutdown(&self) {
        let _ = self.command_tx.send(SessionCommand::Shutdown).await;
    }
}

/// Spawn a sync session for one project
///
/// Subscribes before spawning, so a missing project surfaces as an
/// error here rather than inside the task. The view starts from an
/// empty placeholder and fills in when the first snapshot arrives.
pub fn spawn_session<S: DocumentStore>(
    store: S,
    project_id: ProjectId,
    editor: Editor,
    schema: SurveySchema,
    config: SessionConfig,
) -> StoreResult<SessionHandle> {
    let subscription = store.subscribe(project_id)?;

    let (command_tx, command_rx) = mpsc::channel(16);
    let (event_tx, event_rx) = mpsc::channel(64);

    let schema = Arc::new(schema);
    let mut placeholder = Project::new(Vec::new());
    placeholder.id = project_id;
    let form = FormState::from_remote(&schema, &placeholder.survey_data);

    let view = SessionView {
        schema: Arc::clone(&schema),
        project: placeholder.clone(),
        form: form.clone(),
        save_status: SaveStatus::Idle,
        last_saved_at: None,
        access_denied: false,
    };
    let (view_tx, view_rx) = watch::channel(view);

    let session = ProjectSession {
        store,
        project_id,
        editor,
        schema,
        config,
        subscription,
        subscription_open: true,
        command_rx,
        event_tx,
        view_tx,
        project: placeholder,
        form,
        write_state: WriteState::Idle,
        save_status: SaveStatus::Idle,
        last_saved_at: None,
        access_denied: false,
        debounce_deadline: None,
        settle_deadline: None,
    };

    tokio::spawn(session.run());

    Ok(SessionHandle {
        command_tx,
        event_rx,
        view_rx,
    })
}

/// The session task state
struct ProjectSession<S> {
    store: S,
    project_id: ProjectId,
    editor: Editor,
    schema: Arc<SurveySchema>,
    config: SessionConfig,
    subscription: Subscription,
    subscription_open: bool,
    command_rx: mpsc::Receiver<SessionCommand>,
    event_tx: mpsc::Sender<SessionEvent>,
    view_tx: watch::Sender<SessionView>,
    project: Project,
    form: FormState,
    write_state: WriteState,
    save_status: SaveStatus,
    last_saved_at: Option<DateTime<Utc>>,
    access_denied: bool,
    debounce_deadline: Option<Instant>,
    settle_deadline: Option<Instant>,
}

/// What woke the session loop
enum Wakeup {
    Store(Option<StoreEvent>),
    Command(Option<SessionCommand>),
    DebounceFired,
    SettleElapsed,
}

impl<S: DocumentStore> ProjectSession<S> {
    async fn run(mut self) {
        info!(project = %self.project_id, "sync session started");

        loop {
            // A gated arm still needs a deadline value to construct its
            // sleep; the gate keeps it from ever being polled when unset.
            let idle = Instant::now() + Duration::from_secs(3600);
            let debounce_at = self.debounce_deadline.unwrap_or(idle);
            let settle_at = self.settle_deadline.unwrap_or(idle);

            let wakeup = tokio::select! {
                event = self.subscription.recv(), if self.subscription_open => {
                    Wakeup::Store(event)
                }
                cmd = self.command_rx.recv() => Wakeup::Command(cmd),
                _ = sleep_until(debounce_at), if self.debounce_deadline.is_some() => {
                    Wakeup::DebounceFired
                }
                _ = sleep_until(settle_at), if self.settle_deadline.is_some() => {
                    Wakeup::SettleElapsed
                }
            };

            match wakeup {
                Wakeup::Store(Some(StoreEvent::Snapshot(project))) => {
                    self.on_snapshot(project).await;
                }
                Wakeup::Store(Some(StoreEvent::AccessDenied)) => {
                    self.on_access_denied().await;
                }
                Wakeup::Store(Some(StoreEvent::SubscriptionError(message))) => {
                    // Mirror keeps its last known-good value
                    warn!(project = %self.project_id, "subscription error: {}", message);
                    let _ = self.event_tx.send(SessionEvent::SyncError(message)).await;
                }
                Wakeup::Store(None) => {
                    debug!(project = %self.project_id, "subscription closed");
                    self.subscription_open = false;
                }
                Wakeup::Command(Some(SessionCommand::FieldChanged { field, value })) => {
                    self.on_field_change(field, value).await;
                }
                Wakeup::Command(Some(SessionCommand::Flush)) => {
                    if self.write_state == WriteState::Debounced {
                        self.write_state = self.write_state.on_debounce_fire();
                        self.persist().await;
                    }
                }
                Wakeup::Command(Some(SessionCommand::Shutdown)) | Wakeup::Command(None) => break,
                Wakeup::DebounceFired => {
                    self.debounce_deadline = None;
                    self.write_state = self.write_state.on_debounce_fire();
                    if self.write_state == WriteState::Writing {
                        self.persist().await;
                    }
                }
                Wakeup::SettleElapsed => {
                    self.settle_deadline = None;
                    self.write_state = self.write_state.on_settle_elapsed();
                }
            }
        }

        info!(project = %self.project_id, "sync session stopped");
    }

    /// Whether an incoming snapshot must be treated as our own echo
    ///
    /// The grace window is bounded by the settle timer alone: an edit
    /// made while the timer is pending re-arms the debounce but must
    /// not reopen the form to the delayed echo of the previous write.
    fn echo_window_open(&self) -> bool {
        self.write_state.suppresses_echo() || self.settle_deadline.is_some()
    }

    /// A remote snapshot arrived
    ///
    /// The authoritative project mirror always updates, so approval
    /// counts, read-only flags, and provenance stay current. Form field
    /// values are replaced only when no write of ours is outstanding;
    /// otherwise the snapshot is our own (possibly stale) echo and
    /// applying it would erase keystrokes made during the round trip.
    async fn on_snapshot(&mut self, project: Project) {
        self.project = project;

        if self.echo_window_open() {
            debug!(project = %self.project_id, "echo window open, keeping local form values");
        } else {
            self.form
                .reset_from_remote(&self.schema, &self.project.survey_data);
            let _ = self.event_tx.send(SessionEvent::FormChanged).await;
        }

        let _ = self.event_tx.send(SessionEvent::ProjectChanged).await;
        self.publish_view();
    }

    /// The store rejected our subscription. Terminal: no retry.
    async fn on_access_denied(&mut self) {
        warn!(project = %self.project_id, "access denied");
        self.access_denied = true;
        self.subscription_open = false;
        let _ = self.event_tx.send(SessionEvent::AccessDenied).await;
        self.publish_view();
    }

    /// Apply a local edit and re-arm the debounce
    async fn on_field_change(&mut self, field: String, value: FieldValue) {
        if self.access_denied || self.project.is_read_only(Utc::now()) {
            debug!(project = %self.project_id, field, "edit ignored: project is read-only");
            return;
        }

        if !self.form.apply_change(&self.schema, &field, value) {
            debug!(project = %self.project_id, field, "edit ignored: unknown field");
            return;
        }

        self.write_state = self.write_state.on_edit();
        self.debounce_deadline = Some(Instant::now() + self.config.debounce);
        self.set_save_status(SaveStatus::Saving).await;

        let _ = self.event_tx.send(SessionEvent::FormChanged).await;
        self.publish_view();
    }

    /// Normalize, diff, and write the current form state
    async fn persist(&mut self) {
        self.debounce_deadline = None;

        if self.project.is_read_only(Utc::now()) {
            debug!(project = %self.project_id, "dropping pending write: project is read-only");
            self.write_state = WriteState::Idle;
            return;
        }

        let payload = self.schema.normalize(self.form.values());
        let baseline = self.schema.merged(&self.project.survey_data);
        let baseline = self.schema.normalize(&baseline);
        let changed = changed_fields(&payload, &baseline);

        let clear_approvals = !changed.is_empty() && self.project.requires_approvals;
        debug!(
            project = %self.project_id,
            changed = changed.len(),
            clear_approvals,
            "persisting form state"
        );

        let update = ProjectUpdate {
            survey_data: payload,
            edited_by: self.editor.display_name.clone(),
            clear_approvals,
        };

        match self.store.update(self.project_id, update).await {
            Ok(()) => {
                self.write_state = self.write_state.on_write_ok();
                self.settle_deadline = Some(Instant::now() + self.config.settle);
                self.last_saved_at = Some(Utc::now());
                self.set_save_status(SaveStatus::Saved).await;
            }
            Err(e) => {
                // Optimistic state is kept; the next edit re-arms the
                // debounce and retries with the latest form.
                warn!(project = %self.project_id, "write failed: {}", e);
                self.write_state = self.write_state.on_write_err();
                self.set_save_status(SaveStatus::Error).await;
            }
        }
        self.publish_view();
    }

    async fn set_save_status(&mut self, status: SaveStatus) {
        if self.save_status != status {
            self.save_status = status;
            let _ = self
                .event_tx
                .send(SessionEvent::SaveStatusChanged(status))
                .await;
        }
    }

    fn publish_view(&self) {
        let view = SessionView {
            schema: Arc::clone(&self.schema),
            project: self.project.clone(),
            form: self.form.clone(),
            save_status: self.save_status,
            last_saved_at: self.last_saved_at,
            access_denied: self.access_denied,
        };
        let _ = self.view_tx.send(view);
    }
}
