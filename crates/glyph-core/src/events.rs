use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::Timestamp;

/// All domain events emitted by the Glyph pipeline.
///
/// Events are emitted after state changes and consumed by:
/// - The UI layer (for live status updates)
/// - The event log (for audit/debugging)
#[derive(Clone, Debug, Serialize, Deserialize)]
#[non_exhaustive]
pub enum UiEvent {
    // =========================================================================
    // Streaming Events
    // =========================================================================
    /// A streaming query session opened its transport.
    StreamStarted {
        session_id: Uuid,
        timestamp: Timestamp,
    },

    /// A streaming session reached its terminal sentinel.
    StreamCompleted {
        session_id: Uuid,
        text_length: usize,
        timestamp: Timestamp,
    },

    /// A streaming session failed.
    StreamErrored {
        session_id: Uuid,
        reason: String,
        timestamp: Timestamp,
    },

    /// A streaming session was cancelled by the user.
    StreamCancelled {
        session_id: Uuid,
        timestamp: Timestamp,
    },

    // =========================================================================
    // Dispatch Events
    // =========================================================================
    /// A directive was extracted from a completed response.
    DirectiveDetected {
        domain: String,
        component: String,
        timestamp: Timestamp,
    },

    /// A component envelope was dispatched to a renderer.
    ComponentRendered {
        component_type: String,
        fallback: bool,
        timestamp: Timestamp,
    },

    /// A rendered component emitted an outbound action.
    ActionEmitted {
        action: String,
        timestamp: Timestamp,
    },

    /// A pending confirmation ticket was consumed.
    ConfirmationResolved {
        confirmation_id: String,
        approved: bool,
        timestamp: Timestamp,
    },

    /// Narration text was handed to the speech engine.
    NarrationSpoken {
        text_length: usize,
        timestamp: Timestamp,
    },
}

/// Broadcast sender carrying [`UiEvent`]s to interested listeners.
pub type EventSender = tokio::sync::broadcast::Sender<UiEvent>;

/// Send an event if a sender is attached, ignoring lagging receivers.
pub fn emit(sender: &Option<EventSender>, event: UiEvent) {
    if let Some(tx) = sender {
        // A send error only means no receiver is currently subscribed.
        let _ = tx.send(event);
    }
}

// =============================================================================
// Tests
// =============================================================================
