//! Per-action phase machine with validated transitions.
//!
//! Each executed action moves through:
//! Proposed -> Executed (direct success)
//! Proposed -> Pending -> Executed (confirmation handshake)

use std::fmt;

use crate::error::ActionError;

/// Lifecycle phase of one action execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionPhase {
    /// Sent to the gateway, response not yet interpreted.
    Proposed,
    /// The gateway parked the action behind a confirmation ticket.
    Pending,
    /// The action took effect.
    Executed,
}

impl fmt::Display for ActionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionPhase::Proposed => write!(f, "proposed"),
            ActionPhase::Pending => write!(f, "pending"),
            ActionPhase::Executed => write!(f, "executed"),
        }
    }
}

/// Validate that a phase transition is allowed.
///
/// Valid transitions:
/// - Proposed -> Pending
/// - Proposed -> Executed
/// - Pending -> Executed
pub fn validate_transition(from: ActionPhase, to: ActionPhase) -> Result<(), ActionError> {
    let valid = matches!(
        (from, to),
        (ActionPhase::Proposed, ActionPhase::Pending)
            | (ActionPhase::Proposed, ActionPhase::Executed)
            | (ActionPhase::Pending, ActionPhase::Executed)
    );

    if valid {
        Ok(())
    } else {
        Err(ActionError::InvalidTransition(from, to))
    }
}
