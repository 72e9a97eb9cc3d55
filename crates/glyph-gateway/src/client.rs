//! Gateway API trait, wire types, and the reqwest implementation.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use glyph_core::config::GatewayConfig;
use glyph_core::{ComponentResponse, GlyphError, Narration};

// =============================================================================
// Errors
// =============================================================================

/// Errors from gateway and rendering-service calls.
///
/// Confirmation-ticket failures are distinguished by HTTP status so the UI
/// can tell an expired ticket from one issued to another principal.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("display response is missing the component payload")]
    MissingComponent,
    #[error("confirmation expired")]
    ConfirmationExpired,
    #[error("confirmation belongs to a different user")]
    ConfirmationForbidden,
    #[error("gateway returned {status}: {message}")]
    Status { status: u16, message: String },
}

impl From<GatewayError> for GlyphError {
    fn from(err: GatewayError) -> Self {
        GlyphError::Gateway(err.to_string())
    }
}

// =============================================================================
// Wire types
// =============================================================================

#[derive(Debug, Serialize)]
struct DisplayRequest<'a> {
    directive: &'a str,
}

/// Success body of `POST /api/display`.
#[derive(Debug, Deserialize)]
pub struct DisplayPayload {
    #[serde(default)]
    pub status: Option<String>,
    pub component: Option<ComponentResponse>,
    #[serde(default)]
    pub narration: Option<Narration>,
    #[serde(default)]
    pub metadata: serde_json::Value,
}

impl DisplayPayload {
    /// Collapse the payload into the component envelope.
    ///
    /// A body without a `component` field is a hard error. Top-level
    /// narration is folded into the envelope when the component itself
    /// carries none.
    pub fn into_component(self) -> Result<ComponentResponse, GatewayError> {
        let mut component = self.component.ok_or(GatewayError::MissingComponent)?;
        if component.narration.is_none() {
            component.narration = self.narration;
        }
        Ok(component)
    }
}

/// Outcome reported by an action execution call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionStatus {
    Success,
    PendingConfirmation,
    #[serde(other)]
    Other,
}

/// Body of `POST /api/mcp/<domain>/<action>`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionResponse {
    pub status: ActionStatus,
    #[serde(default)]
    pub confirmation_id: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ActionResponse {
    /// A plain success with no message.
    pub fn success() -> Self {
        Self {
            status: ActionStatus::Success,
            confirmation_id: None,
            message: None,
        }
    }

    /// A pending-confirmation response carrying a ticket id.
    pub fn pending(confirmation_id: impl Into<String>) -> Self {
        Self {
            status: ActionStatus::PendingConfirmation,
            confirmation_id: Some(confirmation_id.into()),
            message: None,
        }
    }
}

// =============================================================================
// Traits
// =============================================================================

/// Client-side view of the gateway and rendering service.
#[async_trait]
pub trait GatewayApi: Send + Sync {
    /// Fetch the component envelope for a directive string.
    async fn fetch_display(
        &self,
        directive: &str,
        token: &str,
    ) -> Result<ComponentResponse, GatewayError>;

    /// Execute a domain action with a domain-specific JSON body.
    async fn execute_action(
        &self,
        domain: &str,
        action: &str,
        body: &serde_json::Value,
        token: &str,
    ) -> Result<ActionResponse, GatewayError>;

    /// Consume a pending confirmation ticket.
    async fn confirm(
        &self,
        confirmation_id: &str,
        approved: bool,
        token: &str,
    ) -> Result<(), GatewayError>;
}

// A shared gateway is itself a gateway, so one client can back both the
// action relay and direct display fetches.
#[async_trait]
impl<T: GatewayApi + ?Sized> GatewayApi for Arc<T> {
    async fn fetch_display(
        &self,
        directive: &str,
        token: &str,
    ) -> Result<ComponentResponse, GatewayError> {
        (**self).fetch_display(directive, token).await
    }

    async fn execute_action(
        &self,
        domain: &str,
        action: &str,
        body: &serde_json::Value,
        token: &str,
    ) -> Result<ActionResponse, GatewayError> {
        (**self).execute_action(domain, action, body, token).await
    }

    async fn confirm(
        &self,
        confirmation_id: &str,
        approved: bool,
        token: &str,
    ) -> Result<(), GatewayError> {
        (**self).confirm(confirmation_id, approved, token).await
    }
}

// =============================================================================
// HttpGateway
// =============================================================================

/// Reqwest-backed gateway client.
pub struct HttpGateway {
    http: reqwest::Client,
    base_url: String,
    ui_service_url: String,
}

impl HttpGateway {
    /// Build a client from the gateway configuration.
    pub fn new(config: &GatewayConfig) -> Result<Self, GatewayError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            ui_service_url: config.ui_service_url.trim_end_matches('/').to_string(),
        })
    }
}

/// Pull a human-readable message out of an error response body.
///
/// Prefers a JSON `error` or `message` field, falling back to the HTTP
/// status text.
async fn error_message(resp: reqwest::Response) -> String {
    let fallback = resp
        .status()
        .canonical_reason()
        .unwrap_or("unknown error")
        .to_string();
    match resp.json::<serde_json::Value>().await {
        Ok(body) => body
            .get("error")
            .or_else(|| body.get("message"))
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
            .unwrap_or(fallback),
        Err(_) => fallback,
    }
}

#[async_trait]
impl GatewayApi for HttpGateway {
    async fn fetch_display(
        &self,
        directive: &str,
        token: &str,
    ) -> Result<ComponentResponse, GatewayError> {
        let resp = self
            .http
            .post(format!("{}/api/display", self.ui_service_url))
            .bearer_auth(token)
            .json(&DisplayRequest { directive })
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(GatewayError::Status {
                status: status.as_u16(),
                message: error_message(resp).await,
            });
        }
        let payload: DisplayPayload = resp.json().await?;
        payload.into_component()
    }

    async fn execute_action(
        &self,
        domain: &str,
        action: &str,
        body: &serde_json::Value,
        token: &str,
    ) -> Result<ActionResponse, GatewayError> {
        let resp = self
            .http
            .post(format!("{}/api/mcp/{}/{}", self.base_url, domain, action))
            .bearer_auth(token)
            .json(body)
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(GatewayError::Status {
                status: status.as_u16(),
                message: error_message(resp).await,
            });
        }
        Ok(resp.json().await?)
    }

    async fn confirm(
        &self,
        confirmation_id: &str,
        approved: bool,
        token: &str,
    ) -> Result<(), GatewayError> {
        let resp = self
            .http
            .post(format!("{}/api/confirm/{}", self.base_url, confirmation_id))
            .bearer_auth(token)
            .json(&serde_json::json!({ "approved": approved }))
            .send()
            .await?;
        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }
        match status {
            StatusCode::NOT_FOUND => Err(GatewayError::ConfirmationExpired),
            StatusCode::FORBIDDEN => Err(GatewayError::ConfirmationForbidden),
            _ => Err(GatewayError::Status {
                status: status.as_u16(),
                message: error_message(resp).await,
            }),
        }
    }
}

// =============================================================================
// Mock implementation
// =============================================================================

/// Scripted behavior of [`MockGateway::confirm`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ConfirmBehavior {
    #[default]
    Ok,
    Expired,
    Forbidden,
    Fail(String),
}

/// One recorded call against a [`MockGateway`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayCall {
    FetchDisplay {
        directive: String,
    },
    ExecuteAction {
        domain: String,
        action: String,
    },
    Confirm {
        confirmation_id: String,
        approved: bool,
    },
}

/// Mock gateway recording every call, for tests without a network.
#[derive(Default)]
pub struct MockGateway {
    display: Mutex<Option<ComponentResponse>>,
    fail_display: bool,
    action_response: Mutex<Option<ActionResponse>>,
    confirm_behavior: Mutex<ConfirmBehavior>,
    calls: Mutex<Vec<GatewayCall>>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the envelope returned by `fetch_display`.
    pub fn with_display(self, envelope: ComponentResponse) -> Self {
        *self.display.lock().expect("display mutex poisoned") = Some(envelope);
        self
    }

    /// Make `fetch_display` fail with a missing-component error.
    pub fn with_display_error(mut self) -> Self {
        self.fail_display = true;
        self
    }

    /// Set the response returned by `execute_action`.
    pub fn with_action_response(self, response: ActionResponse) -> Self {
        *self
            .action_response
            .lock()
            .expect("action mutex poisoned") = Some(response);
        self
    }

    /// Script the behavior of `confirm`.
    pub fn with_confirm_behavior(self, behavior: ConfirmBehavior) -> Self {
        *self
            .confirm_behavior
            .lock()
            .expect("confirm mutex poisoned") = behavior;
        self
    }

    /// All calls made so far, in order.
    pub fn calls(&self) -> Vec<GatewayCall> {
        self.calls.lock().expect("calls mutex poisoned").clone()
    }

    fn record(&self, call: GatewayCall) {
        self.calls.lock().expect("calls mutex poisoned").push(call);
    }
}

#[async_trait]
impl GatewayApi for MockGateway {
    async fn fetch_display(
        &self,
        directive: &str,
        _token: &str,
    ) -> Result<ComponentResponse, GatewayError> {
        self.record(GatewayCall::FetchDisplay {
            directive: directive.to_string(),
        });
        if self.fail_display {
            return Err(GatewayError::MissingComponent);
        }
        Ok(self
            .display
            .lock()
            .expect("display mutex poisoned")
            .clone()
            .unwrap_or_default())
    }

    async fn execute_action(
        &self,
        domain: &str,
        action: &str,
        _body: &serde_json::Value,
        _token: &str,
    ) -> Result<ActionResponse, GatewayError> {
        self.record(GatewayCall::ExecuteAction {
            domain: domain.to_string(),
            action: action.to_string(),
        });
        Ok(self
            .action_response
            .lock()
            .expect("action mutex poisoned")
            .clone()
            .unwrap_or_else(ActionResponse::success))
    }

    async fn confirm(
        &self,
        confirmation_id: &str,
        approved: bool,
        _token: &str,
    ) -> Result<(), GatewayError> {
        self.record(GatewayCall::Confirm {
            confirmation_id: confirmation_id.to_string(),
            approved,
        });
        let behavior = self
            .confirm_behavior
            .lock()
            .expect("confirm mutex poisoned")
            .clone();
        match behavior {
            ConfirmBehavior::Ok => Ok(()),
            ConfirmBehavior::Expired => Err(GatewayError::ConfirmationExpired),
            ConfirmBehavior::Forbidden => Err(GatewayError::ConfirmationForbidden),
            ConfirmBehavior::Fail(message) => Err(GatewayError::Status {
                status: 500,
                message,
            }),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
