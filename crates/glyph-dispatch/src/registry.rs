//! Component kind resolution and the dispatcher.

use tokio::sync::mpsc;

use glyph_core::events::{emit, EventSender};
use glyph_core::{ComponentAction, ComponentResponse, Timestamp, UiEvent};
use glyph_voice::NarrationChannel;

use crate::approvals::ApprovalsCallbacks;

// =============================================================================
// ComponentKind
// =============================================================================

/// The closed set of renderable component kinds.
///
/// Resolution is an exact, case-sensitive string match; everything else is
/// `Unknown`, which carries the raw type string so the fallback renderer can
/// display it. Modeling the registry as an enum makes the fallback a
/// compiler-checked default case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComponentKind {
    OrgChart,
    EmployeeProfile,
    DataTable,
    KpiDashboard,
    ApprovalsQueue,
    Unknown(String),
}

impl ComponentKind {
    /// Resolve a server-declared type string. No case normalization, no
    /// fuzzy matching: a casing mismatch is a wholly unknown type.
    pub fn resolve(component_type: &str) -> Self {
        match component_type {
            "OrgChartComponent" => ComponentKind::OrgChart,
            "EmployeeProfileComponent" => ComponentKind::EmployeeProfile,
            "DataTableComponent" => ComponentKind::DataTable,
            "KpiDashboardComponent" => ComponentKind::KpiDashboard,
            "ApprovalsQueueComponent" => ComponentKind::ApprovalsQueue,
            other => ComponentKind::Unknown(other.to_string()),
        }
    }

    /// The identifier to display: the registry name for known kinds, the raw
    /// (possibly empty) type string for unknown ones.
    pub fn identifier(&self) -> &str {
        match self {
            ComponentKind::OrgChart => "OrgChartComponent",
            ComponentKind::EmployeeProfile => "EmployeeProfileComponent",
            ComponentKind::DataTable => "DataTableComponent",
            ComponentKind::KpiDashboard => "KpiDashboardComponent",
            ComponentKind::ApprovalsQueue => "ApprovalsQueueComponent",
            ComponentKind::Unknown(raw) => raw,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, ComponentKind::Unknown(_))
    }
}

// =============================================================================
// ActionEmitter
// =============================================================================

/// Outbound action channel injected into every renderer.
#[derive(Debug, Clone)]
pub struct ActionEmitter {
    tx: mpsc::UnboundedSender<ComponentAction>,
}

impl ActionEmitter {
    pub fn new(tx: mpsc::UnboundedSender<ComponentAction>) -> Self {
        Self { tx }
    }

    /// Send an action to the dispatcher's consumer.
    pub fn emit(&self, action: ComponentAction) {
        if self.tx.send(action).is_err() {
            tracing::warn!("Action emitted after the action consumer was dropped");
        }
    }
}

// =============================================================================
// RenderInstruction
// =============================================================================

/// Everything a renderer needs for one render cycle.
///
/// Replaced wholesale on every new envelope; renderers hold nothing across
/// cycles.
pub struct RenderInstruction {
    pub kind: ComponentKind,
    /// Renderer configuration, forwarded verbatim from the envelope.
    pub props: serde_json::Map<String, serde_json::Value>,
    /// Actions the envelope offers for this component.
    pub actions: Vec<ComponentAction>,
    /// Generic outbound-action emitter, injected into every renderer.
    pub emitter: ActionEmitter,
    /// Narrower callbacks, present only for the approvals queue.
    pub approvals: Option<ApprovalsCallbacks>,
    /// The fallback path is announced as an accessibility alert region.
    pub fallback_alert: bool,
}

impl RenderInstruction {
    /// The type string the fallback renderer shows (possibly empty).
    pub fn display_type(&self) -> &str {
        self.kind.identifier()
    }
}

// =============================================================================
// Dispatcher
// =============================================================================

/// Routes component envelopes to renderer instructions.
///
/// Owns the narration dedup state across render cycles; everything else is
/// rebuilt per dispatch.
pub struct Dispatcher {
    actions_tx: mpsc::UnboundedSender<ComponentAction>,
    narration: NarrationChannel,
    events: Option<EventSender>,
}

impl Dispatcher {
    /// Create a dispatcher emitting actions on `actions_tx`.
    pub fn new(
        actions_tx: mpsc::UnboundedSender<ComponentAction>,
        narration: NarrationChannel,
    ) -> Self {
        Self {
            actions_tx,
            narration,
            events: None,
        }
    }

    /// Attach a broadcast sender for dispatch events.
    pub fn with_events(mut self, events: EventSender) -> Self {
        self.events = Some(events);
        self
    }

    /// Enable or disable the narration side-channel.
    pub fn set_voice_enabled(&mut self, enabled: bool) {
        self.narration.set_enabled(enabled);
    }

    /// Dispatch one envelope to its renderer instruction.
    pub fn dispatch(&mut self, envelope: &ComponentResponse) -> RenderInstruction {
        let kind = ComponentKind::resolve(&envelope.component_type);
        let fallback = !kind.is_known();
        if fallback {
            tracing::warn!(
                component_type = %envelope.component_type,
                "Unknown component type, using fallback renderer"
            );
        }

        // Best-effort narration, spoken once per distinct value.
        if let Some(text) = envelope.narration_text() {
            if self.narration.narrate(text) {
                emit(
                    &self.events,
                    UiEvent::NarrationSpoken {
                        text_length: text.len(),
                        timestamp: Timestamp::now(),
                    },
                );
            }
        }

        emit(
            &self.events,
            UiEvent::ComponentRendered {
                component_type: envelope.component_type.clone(),
                fallback,
                timestamp: Timestamp::now(),
            },
        );

        let emitter = ActionEmitter::new(self.actions_tx.clone());
        let approvals = matches!(kind, ComponentKind::ApprovalsQueue)
            .then(|| ApprovalsCallbacks::new(emitter.clone()));

        RenderInstruction {
            kind,
            props: envelope.props.clone(),
            actions: envelope.actions.clone(),
            emitter,
            approvals,
            fallback_alert: fallback,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use glyph_core::{ActionKind, Narration};
    use glyph_voice::MockSpeechService;
    use std::sync::Arc;

    fn envelope(component_type: &str) -> ComponentResponse {
        ComponentResponse {
            component_type: component_type.to_string(),
            ..Default::default()
        }
    }

    fn dispatcher(
        voice_enabled: bool,
    ) -> (
        Dispatcher,
        mpsc::UnboundedReceiver<ComponentAction>,
        Arc<MockSpeechService>,
    ) {
        let (tx, rx) = mpsc::unbounded_channel();
        let engine = Arc::new(MockSpeechService::new());
        let narration = NarrationChannel::new(engine.clone(), voice_enabled);
        (Dispatcher::new(tx, narration), rx, engine)
    }

    // ---- ComponentKind resolution ----

    #[test]
    fn test_resolve_known_types() {
        assert_eq!(
            ComponentKind::resolve("OrgChartComponent"),
            ComponentKind::OrgChart
        );
        assert_eq!(
            ComponentKind::resolve("EmployeeProfileComponent"),
            ComponentKind::EmployeeProfile
        );
        assert_eq!(
            ComponentKind::resolve("DataTableComponent"),
            ComponentKind::DataTable
        );
        assert_eq!(
            ComponentKind::resolve("KpiDashboardComponent"),
            ComponentKind::KpiDashboard
        );
        assert_eq!(
            ComponentKind::resolve("ApprovalsQueueComponent"),
            ComponentKind::ApprovalsQueue
        );
    }

    #[test]
    fn test_resolve_is_case_sensitive() {
        // A casing mismatch is treated exactly like a wholly unknown type.
        assert_eq!(
            ComponentKind::resolve("orgchartcomponent"),
            ComponentKind::Unknown("orgchartcomponent".to_string())
        );
        assert_eq!(
            ComponentKind::resolve("ORGCHARTCOMPONENT"),
            ComponentKind::Unknown("ORGCHARTCOMPONENT".to_string())
        );
    }

    #[test]
    fn test_resolve_unknown_and_empty() {
        assert_eq!(
            ComponentKind::resolve("WeatherComponent"),
            ComponentKind::Unknown("WeatherComponent".to_string())
        );
        assert_eq!(
            ComponentKind::resolve(""),
            ComponentKind::Unknown(String::new())
        );
    }

    #[test]
    fn test_identifier_round_trip_for_known_kinds() {
        for name in [
            "OrgChartComponent",
            "EmployeeProfileComponent",
            "DataTableComponent",
            "KpiDashboardComponent",
            "ApprovalsQueueComponent",
        ] {
            let kind = ComponentKind::resolve(name);
            assert!(kind.is_known());
            assert_eq!(kind.identifier(), name);
        }
    }

    #[test]
    fn test_identifier_preserves_raw_unknown() {
        let kind = ComponentKind::resolve("mystery");
        assert_eq!(kind.identifier(), "mystery");
        assert!(!kind.is_known());
    }

    // ---- Dispatch ----

    #[test]
    fn test_dispatch_known_type() {
        let (mut dispatcher, _rx, _engine) = dispatcher(false);
        let mut env = envelope("OrgChartComponent");
        env.props
            .insert("depth".to_string(), serde_json::json!(2));

        let instruction = dispatcher.dispatch(&env);
        assert_eq!(instruction.kind, ComponentKind::OrgChart);
        assert!(!instruction.fallback_alert);
        assert_eq!(instruction.props["depth"], 2);
    }

    #[test]
    fn test_dispatch_unknown_type_falls_back() {
        let (mut dispatcher, _rx, _engine) = dispatcher(false);
        let instruction = dispatcher.dispatch(&envelope("WeatherComponent"));
        assert!(instruction.fallback_alert);
        assert_eq!(instruction.display_type(), "WeatherComponent");
    }

    #[test]
    fn test_dispatch_lowercase_known_type_falls_back() {
        let (mut dispatcher, _rx, _engine) = dispatcher(false);
        let instruction = dispatcher.dispatch(&envelope("orgchartcomponent"));
        assert!(instruction.fallback_alert);
        assert_eq!(instruction.display_type(), "orgchartcomponent");
    }

    #[test]
    fn test_dispatch_empty_type_falls_back() {
        let (mut dispatcher, _rx, _engine) = dispatcher(false);
        let instruction = dispatcher.dispatch(&envelope(""));
        assert!(instruction.fallback_alert);
        assert_eq!(instruction.display_type(), "");
    }

    #[test]
    fn test_dispatch_forwards_props_verbatim() {
        let (mut dispatcher, _rx, _engine) = dispatcher(false);
        let env: ComponentResponse = serde_json::from_str(
            r#"{
                "type": "DataTableComponent",
                "props": {"columns": ["a", "b"], "rows": [[1, 2]], "meta": {"page": 1}}
            }"#,
        )
        .unwrap();
        let instruction = dispatcher.dispatch(&env);
        assert_eq!(instruction.props["columns"][1], "b");
        assert_eq!(instruction.props["rows"][0][0], 1);
        assert_eq!(instruction.props["meta"]["page"], 1);
    }

    #[tokio::test]
    async fn test_emitter_delivers_actions() {
        let (mut dispatcher, mut rx, _engine) = dispatcher(false);
        let instruction = dispatcher.dispatch(&envelope("KpiDashboardComponent"));

        instruction
            .emitter
            .emit(ComponentAction::with_target(ActionKind::Drilldown, "q3"));
        let action = rx.recv().await.unwrap();
        assert_eq!(action.kind, ActionKind::Drilldown);
        assert_eq!(action.target.as_deref(), Some("q3"));
    }

    #[test]
    fn test_emit_after_consumer_dropped_does_not_panic() {
        let (mut dispatcher, rx, _engine) = dispatcher(false);
        let instruction = dispatcher.dispatch(&envelope("KpiDashboardComponent"));
        drop(rx);
        instruction
            .emitter
            .emit(ComponentAction::new(ActionKind::Navigate));
    }

    // ---- Approvals adapter ----

    #[test]
    fn test_approvals_callbacks_only_for_approvals_queue() {
        let (mut dispatcher, _rx, _engine) = dispatcher(false);
        assert!(dispatcher
            .dispatch(&envelope("ApprovalsQueueComponent"))
            .approvals
            .is_some());
        assert!(dispatcher
            .dispatch(&envelope("OrgChartComponent"))
            .approvals
            .is_none());
        assert!(dispatcher.dispatch(&envelope("bogus")).approvals.is_none());
    }

    // ---- Narration side effect ----

    fn narrated(component_type: &str, text: &str) -> ComponentResponse {
        ComponentResponse {
            component_type: component_type.to_string(),
            narration: Some(Narration {
                text: text.to_string(),
                ssml: None,
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_narration_spoken_when_enabled() {
        let (mut dispatcher, _rx, engine) = dispatcher(true);
        dispatcher.dispatch(&narrated("OrgChartComponent", "Your team."));
        assert_eq!(engine.utterances(), vec!["Your team."]);
    }

    #[test]
    fn test_narration_silent_when_disabled() {
        let (mut dispatcher, _rx, engine) = dispatcher(false);
        dispatcher.dispatch(&narrated("OrgChartComponent", "Your team."));
        assert!(engine.utterances().is_empty());
    }

    #[test]
    fn test_narration_spoken_once_per_distinct_value() {
        let (mut dispatcher, _rx, engine) = dispatcher(true);
        let env = narrated("OrgChartComponent", "Same narration.");
        dispatcher.dispatch(&env);
        dispatcher.dispatch(&env);
        assert_eq!(engine.utterances(), vec!["Same narration."]);

        dispatcher.dispatch(&narrated("OrgChartComponent", "New narration."));
        assert_eq!(
            engine.utterances(),
            vec!["Same narration.", "New narration."]
        );
    }

    #[test]
    fn test_narration_change_cancels_previous() {
        let (mut dispatcher, _rx, engine) = dispatcher(true);
        dispatcher.dispatch(&narrated("OrgChartComponent", "First."));
        let cancels = engine.cancel_count();
        dispatcher.dispatch(&narrated("OrgChartComponent", "Second."));
        assert!(engine.cancel_count() > cancels);
    }

    #[test]
    fn test_voice_toggle_respeaks_on_next_dispatch() {
        let (mut dispatcher, _rx, engine) = dispatcher(true);
        let env = narrated("OrgChartComponent", "Status.");
        dispatcher.dispatch(&env);
        dispatcher.set_voice_enabled(false);
        dispatcher.set_voice_enabled(true);
        dispatcher.dispatch(&env);
        assert_eq!(engine.utterances(), vec!["Status.", "Status."]);
    }

    #[test]
    fn test_empty_narration_is_silent() {
        let (mut dispatcher, _rx, engine) = dispatcher(true);
        dispatcher.dispatch(&narrated("OrgChartComponent", ""));
        assert!(engine.utterances().is_empty());
    }

    // ---- Events ----

    #[test]
    fn test_dispatch_emits_render_event() {
        let (tx, mut rx) = tokio::sync::broadcast::channel(8);
        let (dispatcher, _arx, _engine) = dispatcher(false);
        let mut dispatcher = dispatcher.with_events(tx);

        dispatcher.dispatch(&envelope("bogus"));
        match rx.try_recv().unwrap() {
            UiEvent::ComponentRendered {
                component_type,
                fallback,
                ..
            } => {
                assert_eq!(component_type, "bogus");
                assert!(fallback);
            }
            other => panic!("Expected ComponentRendered, got {:?}", other),
        }
    }
}
