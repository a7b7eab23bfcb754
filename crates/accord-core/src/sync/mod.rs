//! Real-time project synchronization
//!
//! One [`session::ProjectSession`] task per open project keeps the
//! local form consistent with the shared remote document: optimistic
//! edits, trailing-edge debounced writes, merge-on-write normalization,
//! approval reset on real changes, and echo suppression so the user's
//! keystrokes survive the write round trip.

pub mod session;
pub mod status;

pub use session::{
    spawn_session, SessionCommand, SessionConfig, SessionEvent, SessionHandle, SessionView,
};
pub use status::{SaveStatus, WriteState};
