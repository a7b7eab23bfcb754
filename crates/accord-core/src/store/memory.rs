//! In-memory document store
//!
//! Reference [`DocumentStore`] used by tests and the CLI demo. Behaves
//! like the real store from the session's point of view: subscriptions
//! deliver the current snapshot immediately, every accepted write is
//! broadcast back to all watchers (including the writer), and access
//! denial is reported on the subscription channel.
//!
//! Test hooks: deny access per project, fail the next write, and apply
//! out-of-band mutations as "another collaborator".

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use tokio::sync::mpsc;
use tracing::debug;

use crate::models::{Project, ProjectId, ProjectUpdate};

use super::{DocumentStore, StoreError, StoreEvent, StoreResult, Subscription};

#[derive(Default)]
struct Inner {
    projects: HashMap<ProjectId, Project>,
    watchers: HashMap<ProjectId, Vec<mpsc::UnboundedSender<StoreEvent>>>,
    denied: HashSet<ProjectId>,
    fail_next_update: bool,
    update_count: usize,
}

impl Inner {
    /// Send the project's current snapshot to every live watcher,
    /// pruning watchers whose subscription has been dropped.
    fn broadcast(&mut self, id: ProjectId) {
        let Some(project) = self.projects.get(&id).cloned() else {
            return;
        };
        if let Some(senders) = self.watchers.get_mut(&id) {
            senders.retain(|tx| tx.send(StoreEvent::Snapshot(project.clone())).is_ok());
        }
    }
}

/// In-process document store
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a project
    pub fn insert(&self, project: Project) {
        let mut inner = self.inner.lock().expect("store lock poisoned");
        inner.projects.insert(project.id, project);
    }

    /// Reject future subscriptions to this project
    pub fn deny_access(&self, id: ProjectId) {
        let mut inner = self.inner.lock().expect("store lock poisoned");
        inner.denied.insert(id);
    }

    /// Make the next `update` call fail with a write error
    pub fn fail_next_update(&self) {
        let mut inner = self.inner.lock().expect("store lock poisoned");
        inner.fail_next_update = true;
    }

    /// Number of writes accepted so far
    pub fn update_count(&self) -> usize {
        self.inner.lock().expect("store lock poisoned").update_count
    }

    /// Current state of a project
    pub fn snapshot(&self, id: ProjectId) -> Option<Project> {
        self.inner
            .lock()
            .expect("store lock poisoned")
            .projects
            .get(&id)
            .cloned()
    }

    /// Mutate a project out of band and notify watchers
    ///
    /// Stands in for another collaborator's client writing to the same
    /// document from a different device.
    pub fn mutate<F>(&self, id: ProjectId, mutate: F) -> StoreResult<()>
    where
        F: FnOnce(&mut Project),
    {
        let mut inner = self.inner.lock().expect("store lock poisoned");
        let project = inner
            .projects
            .get_mut(&id)
            .ok_or(StoreError::NotFound(id))?;
        mutate(project);
        project.last_updated = Some(Utc::now());
        inner.broadcast(id);
        Ok(())
    }
}

impl DocumentStore for MemoryStore {
    fn subscribe(&self, id: ProjectId) -> StoreResult<Subscription> {
        let mut inner = self.inner.lock().expect("store lock poisoned");
        let (tx, rx) = mpsc::unbounded_channel();

        if inner.denied.contains(&id) {
            // Denial arrives on the event channel, after the listener
            // attaches, like a remote store's security rules.
            let _ = tx.send(StoreEvent::AccessDenied);
            return Ok(Subscription::new(rx));
        }

        let project = inner.projects.get(&id).ok_or(StoreError::NotFound(id))?;
        let _ = tx.send(StoreEvent::Snapshot(project.clone()));
        inner.watchers.entry(id).or_default().push(tx);

        Ok(Subscription::new(rx))
    }

    async fn update(&self, id: ProjectId, update: ProjectUpdate) -> StoreResult<()> {
        let mut inner = self.inner.lock().expect("store lock poisoned");

        if inner.fail_next_update {
            inner.fail_next_update = false;
            return Err(StoreError::WriteFailed("injected failure".to_string()));
        }

        let project = inner
            .projects
            .get_mut(&id)
            .ok_or(StoreError::NotFound(id))?;

        project.survey_data = update.survey_data;
        project.last_updated = Some(Utc::now());
        project.last_edited_by = Some(update.edited_by);
        if update.clear_approvals {
            project.approvals.clear();
        }

        inner.update_count += 1;
        debug!(project = %id, "applied update #{}", inner.update_count);
        inner.broadcast(id);
        Ok(())
    }
}
