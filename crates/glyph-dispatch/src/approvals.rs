//! Approvals-queue adapter.
//!
//! The approvals queue is the one component whose renderer takes three
//! narrower callbacks instead of the generic emitter. The callbacks carry
//! the same semantic payload through the same channel; this is an adapter
//! over the generic contract, not a different one.

use glyph_core::{ActionKind, ComponentAction};

use crate::registry::ActionEmitter;

/// Narrow callback surface handed to the approvals-queue renderer.
#[derive(Debug, Clone)]
pub struct ApprovalsCallbacks {
    emitter: ActionEmitter,
}

impl ApprovalsCallbacks {
    pub fn new(emitter: ActionEmitter) -> Self {
        Self { emitter }
    }

    /// Approve the request with the given id.
    pub fn approve(&self, request_id: &str) {
        self.emitter
            .emit(ComponentAction::with_target(ActionKind::Approve, request_id));
    }

    /// Reject the request with the given id.
    pub fn reject(&self, request_id: &str) {
        self.emitter
            .emit(ComponentAction::with_target(ActionKind::Reject, request_id));
    }

    /// Open the detail view for the request with the given id.
    pub fn view_details(&self, request_id: &str) {
        self.emitter.emit(ComponentAction::with_target(
            ActionKind::Drilldown,
            request_id,
        ));
    }
}

// =============================================================================
// Tests
// =============================================================================
