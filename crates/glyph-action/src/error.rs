//! Error types for action execution.

use glyph_core::{ActionKind, GlyphError};
use glyph_gateway::GatewayError;
use thiserror::Error;

use crate::phase::ActionPhase;

/// Errors from the action relay.
///
/// Every variant renders as a user-visible message; confirmation-ticket
/// failures keep their HTTP-status distinctions from the gateway layer.
#[derive(Debug, Error)]
pub enum ActionError {
    #[error("action '{0}' is not routed through the gateway")]
    Unroutable(ActionKind),
    #[error("confirmation expired, run the action again")]
    ConfirmationExpired,
    #[error("confirmation was issued to a different user")]
    ConfirmationForbidden,
    #[error("confirmation pending without a ticket id")]
    MissingTicket,
    #[error("gateway rejected the action: {0}")]
    Rejected(String),
    #[error("gateway error: {0}")]
    Gateway(String),
    #[error("invalid action phase transition: {0} -> {1}")]
    InvalidTransition(ActionPhase, ActionPhase),
}

impl From<GatewayError> for ActionError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::ConfirmationExpired => ActionError::ConfirmationExpired,
            GatewayError::ConfirmationForbidden => ActionError::ConfirmationForbidden,
            GatewayError::Status { message, .. } => ActionError::Rejected(message),
            other => ActionError::Gateway(other.to_string()),
        }
    }
}

impl From<ActionError> for GlyphError {
    fn from(err: ActionError) -> Self {
        GlyphError::Action(err.to_string())
    }
}
