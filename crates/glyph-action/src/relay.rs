//! Action relay: gateway execution plus the auto-confirm handshake.

use glyph_core::events::{emit, EventSender};
use glyph_core::{ComponentAction, ComponentResponse, Timestamp, UiEvent};
use glyph_gateway::{ActionStatus, GatewayApi};

use crate::error::ActionError;
use crate::phase::{validate_transition, ActionPhase};

/// Result of one relayed action.
#[derive(Debug)]
pub struct ActionOutcome {
    /// Terminal phase, always `Executed` on success.
    pub phase: ActionPhase,
    /// Whether the confirmation handshake ran.
    pub confirmed: bool,
    /// Server-supplied message from the action call, if any.
    pub message: Option<String>,
    /// The re-fetched envelope reflecting post-action state, when the
    /// refresh succeeded.
    pub refreshed: Option<ComponentResponse>,
}

/// Relays approve/reject actions to the gateway.
///
/// Calls are never pipelined: the confirmation follow-up is issued only
/// after the initiating call's response has been fully received, and the
/// refresh only after the handshake settled. Nothing is retried
/// automatically.
pub struct ActionRelay<G: GatewayApi> {
    gateway: G,
    events: Option<EventSender>,
}

impl<G: GatewayApi> ActionRelay<G> {
    pub fn new(gateway: G) -> Self {
        Self {
            gateway,
            events: None,
        }
    }

    /// Attach a broadcast sender for confirmation events.
    pub fn with_events(mut self, events: EventSender) -> Self {
        self.events = Some(events);
        self
    }

    /// Execute `action` in `domain`, then re-issue `directive` so the caller
    /// can refresh the rendered view with post-action state.
    pub async fn execute(
        &self,
        domain: &str,
        action: &ComponentAction,
        directive: &str,
        token: &str,
    ) -> Result<ActionOutcome, ActionError> {
        if !action.kind.is_remote() {
            return Err(ActionError::Unroutable(action.kind));
        }

        let mut phase = ActionPhase::Proposed;
        let body = action_body(action);
        let response = self
            .gateway
            .execute_action(domain, &action.kind.to_string(), &body, token)
            .await?;
        let message = response.message.clone();

        let confirmed = match response.status {
            ActionStatus::Success => false,
            ActionStatus::PendingConfirmation => {
                let ticket = response
                    .confirmation_id
                    .as_deref()
                    .ok_or(ActionError::MissingTicket)?;
                phase = advance(phase, ActionPhase::Pending)?;
                tracing::debug!(confirmation_id = %ticket, "Auto-confirming pending action");
                // The human already made the approve/reject decision at the
                // UI; this hop authorizes execution, so it always carries
                // approved=true, independent of the business polarity.
                self.gateway.confirm(ticket, true, token).await?;
                emit(
                    &self.events,
                    UiEvent::ConfirmationResolved {
                        confirmation_id: ticket.to_string(),
                        approved: true,
                        timestamp: Timestamp::now(),
                    },
                );
                true
            }
            ActionStatus::Other => {
                return Err(ActionError::Rejected(
                    message.unwrap_or_else(|| "action failed".to_string()),
                ));
            }
        };

        phase = advance(phase, ActionPhase::Executed)?;

        // The action took effect; a failed refresh downgrades to a missing
        // envelope rather than undoing the success.
        let refreshed = match self.gateway.fetch_display(directive, token).await {
            Ok(envelope) => Some(envelope),
            Err(e) => {
                tracing::warn!(error = %e, "Post-action refresh failed");
                None
            }
        };

        Ok(ActionOutcome {
            phase,
            confirmed,
            message,
            refreshed,
        })
    }
}

fn advance(from: ActionPhase, to: ActionPhase) -> Result<ActionPhase, ActionError> {
    validate_transition(from, to)?;
    tracing::debug!("Action phase: {} -> {}", from, to);
    Ok(to)
}

/// Build the domain-specific JSON body for an action call.
fn action_body(action: &ComponentAction) -> serde_json::Value {
    let mut body = serde_json::Map::new();
    if let Some(target) = &action.target {
        body.insert("requestId".to_string(), serde_json::json!(target));
    }
    for (key, value) in &action.params {
        body.insert(key.clone(), serde_json::json!(value));
    }
    serde_json::Value::Object(body)
}

// =============================================================================
// Tests
// =============================================================================
