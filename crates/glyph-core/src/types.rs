//! Core types and value objects shared across the Glyph pipeline.
//!
//! Defines the component envelope returned by the rendering service, the
//! outbound actions a rendered component can emit, and the narration payload
//! consumed by the voice side-channel.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

// =============================================================================
// Newtype Wrappers
// =============================================================================

/// Epoch-second timestamp used in domain events.
///
/// Compared by value. Two Timestamps with the same inner value are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(pub i64);

impl Timestamp {
    pub fn now() -> Self {
        Self(Utc::now().timestamp())
    }

    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt.timestamp())
    }

    pub fn to_datetime(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.0, 0).unwrap_or_default()
    }
}

// =============================================================================
// Enums
// =============================================================================

/// Kinds of outbound action a rendered component can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Navigate,
    Drilldown,
    Approve,
    Reject,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionKind::Navigate => write!(f, "navigate"),
            ActionKind::Drilldown => write!(f, "drilldown"),
            ActionKind::Approve => write!(f, "approve"),
            ActionKind::Reject => write!(f, "reject"),
        }
    }
}

impl std::str::FromStr for ActionKind {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "navigate" => Ok(ActionKind::Navigate),
            "drilldown" => Ok(ActionKind::Drilldown),
            "approve" => Ok(ActionKind::Approve),
            "reject" => Ok(ActionKind::Reject),
            _ => Err(format!("Unknown action kind: {}", s)),
        }
    }
}

impl ActionKind {
    /// Whether this action kind mutates remote state and therefore routes
    /// through the gateway (navigate/drilldown stay client-side).
    pub fn is_remote(&self) -> bool {
        matches!(self, ActionKind::Approve | ActionKind::Reject)
    }
}

// =============================================================================
// Domain Structs
// =============================================================================

/// An action emitted by a rendered component.
///
/// Stateless and single-use: emitted by a renderer, consumed once by the
/// action relay, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentAction {
    #[serde(rename = "type")]
    pub kind: ActionKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub params: HashMap<String, String>,
}

impl ComponentAction {
    /// Construct an action with no target and no params.
    pub fn new(kind: ActionKind) -> Self {
        Self {
            kind,
            target: None,
            params: HashMap::new(),
        }
    }

    /// Construct an action aimed at a specific target id.
    pub fn with_target(kind: ActionKind, target: impl Into<String>) -> Self {
        Self {
            kind,
            target: Some(target.into()),
            params: HashMap::new(),
        }
    }
}

/// Narration payload for the text-to-speech side-channel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Narration {
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssml: Option<String>,
}

/// The component envelope returned by the rendering service.
///
/// Owned by the rendering layer for one render cycle and replaced wholesale
/// on every new directive.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ComponentResponse {
    /// Server-declared component identifier, matched case-sensitively by the
    /// dispatch registry. Empty means unknown.
    #[serde(rename = "type", default)]
    pub component_type: String,
    /// Renderer configuration, forwarded verbatim to the selected renderer.
    #[serde(default)]
    pub props: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    pub actions: Vec<ComponentAction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub narration: Option<Narration>,
}

impl ComponentResponse {
    /// Narration text if present and non-empty.
    pub fn narration_text(&self) -> Option<&str> {
        self.narration
            .as_ref()
            .map(|n| n.text.as_str())
            .filter(|t| !t.is_empty())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    // ---- Timestamp ----

    #[test]
    fn test_timestamp_now_is_positive() {
        assert!(Timestamp::now().0 > 0);
    }

    #[test]
    fn test_timestamp_datetime_round_trip() {
        let ts = Timestamp::now();
        let rt = Timestamp::from_datetime(ts.to_datetime());
        assert_eq!(ts, rt);
    }

    #[test]
    fn test_timestamp_serde_round_trip() {
        let ts = Timestamp(1700000000);
        let json = serde_json::to_string(&ts).unwrap();
        let rt: Timestamp = serde_json::from_str(&json).unwrap();
        assert_eq!(ts, rt);
    }

    // ---- ActionKind ----

    #[test]
    fn test_action_kind_display() {
        assert_eq!(ActionKind::Navigate.to_string(), "navigate");
        assert_eq!(ActionKind::Drilldown.to_string(), "drilldown");
        assert_eq!(ActionKind::Approve.to_string(), "approve");
        assert_eq!(ActionKind::Reject.to_string(), "reject");
    }

    #[test]
    fn test_action_kind_from_str() {
        assert_eq!("navigate".parse::<ActionKind>().unwrap(), ActionKind::Navigate);
        assert_eq!("drilldown".parse::<ActionKind>().unwrap(), ActionKind::Drilldown);
        assert_eq!("approve".parse::<ActionKind>().unwrap(), ActionKind::Approve);
        assert_eq!("reject".parse::<ActionKind>().unwrap(), ActionKind::Reject);
        assert!("invalid".parse::<ActionKind>().is_err());
    }

    #[test]
    fn test_action_kind_from_str_case_sensitive() {
        assert!("Navigate".parse::<ActionKind>().is_err());
        assert!("APPROVE".parse::<ActionKind>().is_err());
    }

    #[test]
    fn test_action_kind_display_from_str_round_trip() {
        for variant in [
            ActionKind::Navigate,
            ActionKind::Drilldown,
            ActionKind::Approve,
            ActionKind::Reject,
        ] {
            let s = variant.to_string();
            let parsed: ActionKind = s.parse().unwrap();
            assert_eq!(variant, parsed);
        }
    }

    #[test]
    fn test_action_kind_serde_json_format() {
        assert_eq!(
            serde_json::to_string(&ActionKind::Drilldown).unwrap(),
            "\"drilldown\""
        );
        assert_eq!(
            serde_json::to_string(&ActionKind::Approve).unwrap(),
            "\"approve\""
        );
    }

    #[test]
    fn test_action_kind_is_remote() {
        assert!(ActionKind::Approve.is_remote());
        assert!(ActionKind::Reject.is_remote());
        assert!(!ActionKind::Navigate.is_remote());
        assert!(!ActionKind::Drilldown.is_remote());
    }

    // ---- ComponentAction ----

    #[test]
    fn test_component_action_serde_round_trip() {
        let mut params = HashMap::new();
        params.insert("requestId".to_string(), "REQ-7".to_string());
        let action = ComponentAction {
            kind: ActionKind::Approve,
            target: Some("REQ-7".to_string()),
            params,
        };
        let json = serde_json::to_string(&action).unwrap();
        let rt: ComponentAction = serde_json::from_str(&json).unwrap();
        assert_eq!(action, rt);
    }

    #[test]
    fn test_component_action_wire_type_field() {
        let action = ComponentAction::new(ActionKind::Navigate);
        let json = serde_json::to_value(&action).unwrap();
        assert_eq!(json["type"], "navigate");
    }

    #[test]
    fn test_component_action_deserialize_minimal() {
        let action: ComponentAction = serde_json::from_str(r#"{"type":"reject"}"#).unwrap();
        assert_eq!(action.kind, ActionKind::Reject);
        assert!(action.target.is_none());
        assert!(action.params.is_empty());
    }

    #[test]
    fn test_component_action_with_target() {
        let action = ComponentAction::with_target(ActionKind::Drilldown, "emp-42");
        assert_eq!(action.target.as_deref(), Some("emp-42"));
        assert!(action.params.is_empty());
    }

    // ---- Narration ----

    #[test]
    fn test_narration_serde_round_trip() {
        let narration = Narration {
            text: "Here is the org chart.".to_string(),
            ssml: Some("<speak>Here is the org chart.</speak>".to_string()),
        };
        let json = serde_json::to_string(&narration).unwrap();
        let rt: Narration = serde_json::from_str(&json).unwrap();
        assert_eq!(narration, rt);
    }

    #[test]
    fn test_narration_default_is_empty() {
        let narration = Narration::default();
        assert!(narration.text.is_empty());
        assert!(narration.ssml.is_none());
    }

    // ---- ComponentResponse ----

    #[test]
    fn test_component_response_deserialize_full() {
        let json = r#"{
            "type": "OrgChartComponent",
            "props": {"rootUserId": "me", "depth": 2},
            "actions": [{"type": "drilldown", "target": "emp-1"}],
            "narration": {"text": "Your org chart."}
        }"#;
        let envelope: ComponentResponse = serde_json::from_str(json).unwrap();
        assert_eq!(envelope.component_type, "OrgChartComponent");
        assert_eq!(envelope.props["rootUserId"], "me");
        assert_eq!(envelope.actions.len(), 1);
        assert_eq!(envelope.narration_text(), Some("Your org chart."));
    }

    #[test]
    fn test_component_response_deserialize_missing_fields() {
        let envelope: ComponentResponse = serde_json::from_str("{}").unwrap();
        assert!(envelope.component_type.is_empty());
        assert!(envelope.props.is_empty());
        assert!(envelope.actions.is_empty());
        assert!(envelope.narration.is_none());
    }

    #[test]
    fn test_component_response_narration_text_empty_is_none() {
        let envelope = ComponentResponse {
            narration: Some(Narration::default()),
            ..Default::default()
        };
        assert!(envelope.narration_text().is_none());
    }

    #[test]
    fn test_component_response_props_preserved_verbatim() {
        let json = r#"{"type":"DataTableComponent","props":{"rows":[{"a":1}],"nested":{"k":"v"}}}"#;
        let envelope: ComponentResponse = serde_json::from_str(json).unwrap();
        assert_eq!(envelope.props["rows"][0]["a"], 1);
        assert_eq!(envelope.props["nested"]["k"], "v");
    }
}
