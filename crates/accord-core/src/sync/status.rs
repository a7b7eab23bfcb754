//! Save status and the write state machine
//!
//! The session's write lifecycle is an explicit state machine instead
//! of a hidden "is saving" flag:
//!
//! ```text
//! Idle -> Debounced -> Writing -> Settling -> Idle
//!            ^                       |
//!            +--------- edit --------+
//! ```
//!
//! `Writing` covers the in-flight store call; `Settling` is the fixed
//! grace window that bridges the gap between the write resolving and
//! its echo arriving on the subscription. Both suppress the echo.

use std::fmt;

use serde::{Deserialize, Serialize};

/// User-facing save indicator
///
/// Deliberately coarser than [`WriteState`]: a pending debounce and an
/// in-flight write both display as `Saving`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SaveStatus {
    /// No edits since the session opened
    Idle,
    /// Edits pending or a write in flight
    Saving,
    /// The last write succeeded
    Saved,
    /// The last write failed; editing again retries
    Error,
}

impl SaveStatus {
    /// Whether the last write cycle has resolved, one way or the other
    pub fn is_terminal(self) -> bool {
        matches!(self, SaveStatus::Saved | SaveStatus::Error)
    }
}

impl fmt::Display for SaveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SaveStatus::Idle => "idle",
            SaveStatus::Saving => "saving",
            SaveStatus::Saved => "saved",
            SaveStatus::Error => "error",
        };
        write!(f, "{}", label)
    }
}

/// Internal write lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteState {
    /// Nothing pending
    Idle,
    /// An edit is waiting for the debounce timer
    Debounced,
    /// A write is in flight
    Writing,
    /// Write done; echo grace window still open
    Settling,
}

impl WriteState {
    /// A local edit arrived; (re)arm the debounce
    pub fn on_edit(self) -> Self {
        WriteState::Debounced
    }

    /// The debounce timer fired
    pub fn on_debounce_fire(self) -> Self {
        match self {
            WriteState::Debounced => WriteState::Writing,
            other => other,
        }
    }

    /// The in-flight write succeeded
    pub fn on_write_ok(self) -> Self {
        WriteState::Settling
    }

    /// The in-flight write failed
    pub fn on_write_err(self) -> Self {
        WriteState::Idle
    }

    /// The settle grace window elapsed
    pub fn on_settle_elapsed(self) -> Self {
        match self {
            WriteState::Settling => WriteState::Idle,
            other => other,
        }
    }

    /// Whether an incoming snapshot's field values must not overwrite
    /// the locally-edited form
    ///
    /// Covers the in-flight write only. The session also keeps the
    /// window open while its settle timer is pending, so an edit that
    /// moves the machine back to `Debounced` does not readmit the
    /// previous write's echo.
    pub fn suppresses_echo(self) -> bool {
        matches!(self, WriteState::Writing | WriteState::Settling)
    }
}
