//! Document store interface
//!
//! The sync core talks to the remote document store through the narrow
//! [`DocumentStore`] trait: subscribe to whole-document snapshots, and
//! issue atomic writes. The concrete client is constructed by the
//! composition root and injected; the core never reaches for a global.
//!
//! Snapshots are full documents, not diffs. Access denial arrives on
//! the subscription's event channel, the way a remote store's security
//! rules would reject a listener after it attaches.

mod memory;

pub use memory::MemoryStore;

use std::future::Future;

use thiserror::Error;
use tokio::sync::mpsc;

use crate::models::{Project, ProjectId, ProjectUpdate};

/// Errors from store operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// The caller lacks access to the project
    #[error("access denied to project '{0}'")]
    AccessDenied(ProjectId),

    /// The project does not exist
    #[error("project '{0}' not found")]
    NotFound(ProjectId),

    /// A write attempt was rejected or lost
    #[error("write failed: {0}")]
    WriteFailed(String),
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Notifications delivered on a live subscription
#[derive(Debug, Clone)]
pub enum StoreEvent {
    /// The document changed; the full current snapshot
    Snapshot(Project),
    /// The store's access rules rejected this subscription (terminal)
    AccessDenied,
    /// Any other subscription failure; the last snapshot stays valid
    SubscriptionError(String),
}

/// A live subscription to one document
///
/// Dropping the subscription closes the channel and releases the
/// watcher on the store side; no explicit cleanup call is needed.
#[derive(Debug)]
pub struct Subscription {
    events: mpsc::UnboundedReceiver<StoreEvent>,
}

impl Subscription {
    /// Build a subscription from its receiving half
    pub fn new(events: mpsc::UnboundedReceiver<StoreEvent>) -> Self {
        Self { events }
    }

    /// Receive the next event; `None` once the store side is gone
    pub async fn recv(&mut self) -> Option<StoreEvent> {
        self.events.recv().await
    }
}

/// Client interface to the remote document store
pub trait DocumentStore: Send + Sync + 'static {
    /// Open a live subscription to a document
    ///
    /// The current snapshot is delivered as the first event.
    fn subscribe(&self, id: ProjectId) -> StoreResult<Subscription>;

    /// Apply one atomic write to a document
    ///
    /// The store assigns the update timestamp. Subscribers (including
    /// the writer) observe the result as a fresh snapshot.
    fn update(
        &self,
        id: ProjectId,
        update: ProjectUpdate,
    ) -> impl Future<Output = StoreResult<()>> + Send;
}
