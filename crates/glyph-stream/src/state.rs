//! Stream session state machine with validated transitions.
//!
//! Enforces the session lifecycle:
//! - Idle -> Connecting (start query)
//! - Connecting -> Streaming (transport opened)
//! - Connecting -> Errored (validation or open failure)
//! - Streaming -> Complete (terminal sentinel or user cancel)
//! - Streaming -> Errored (transport dropped mid-stream)
//! - Complete -> Connecting (run again)
//! - Errored -> Connecting (retry)

use std::fmt;

/// Lifecycle state of a streaming query session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamState {
    /// No query in progress. Ready to start.
    Idle,
    /// Validating credentials and opening the transport.
    Connecting,
    /// Receiving partial text fragments from the gateway.
    Streaming,
    /// Terminal: the full response was assembled (or the user stopped early).
    Complete,
    /// Terminal: the session failed with a user-facing reason.
    Errored,
}

impl fmt::Display for StreamState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamState::Idle => write!(f, "Idle"),
            StreamState::Connecting => write!(f, "Connecting"),
            StreamState::Streaming => write!(f, "Streaming"),
            StreamState::Complete => write!(f, "Complete"),
            StreamState::Errored => write!(f, "Errored"),
        }
    }
}

impl StreamState {
    /// Returns whether a transition from `self` to `target` is valid.
    pub fn can_transition_to(&self, target: &StreamState) -> bool {
        matches!(
            (self, target),
            (StreamState::Idle, StreamState::Connecting)
                | (StreamState::Connecting, StreamState::Streaming)
                | (StreamState::Connecting, StreamState::Errored)
                | (StreamState::Streaming, StreamState::Complete)
                | (StreamState::Streaming, StreamState::Errored)
                // Retry / run-again transitions
                | (StreamState::Complete, StreamState::Connecting)
                | (StreamState::Errored, StreamState::Connecting)
        )
    }

    /// Whether this is a terminal state (retry is permitted from here).
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamState::Complete | StreamState::Errored)
    }
}

// =============================================================================
// Tests
// =============================================================================
