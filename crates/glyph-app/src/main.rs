//! Glyph client binary - composition root.
//!
//! Ties together the Glyph crates into a single executable:
//! 1. Load configuration from TOML and fold in CLI overrides
//! 2. Initialize tracing
//! 3. Stream a query through the gateway (SSE) and assemble the answer
//! 4. Extract the display directive and fetch the component envelope
//! 5. Dispatch the envelope to a renderer instruction (with narration)
//! 6. Relay approve/reject actions through the confirmation handshake

mod cli;
mod render;

use std::sync::Arc;

use clap::Parser;
use tokio::sync::{broadcast, mpsc};

use glyph_action::ActionRelay;
use glyph_core::{
    ActionKind, ComponentAction, GlyphConfig, GlyphError, Result, Timestamp, UiEvent,
};
use glyph_dispatch::Dispatcher;
use glyph_gateway::{GatewayApi, HttpGateway, SseTransport};
use glyph_stream::{SessionOutcome, StreamSession};
use glyph_voice::{NarrationChannel, TracingSpeechService};

use cli::{CliArgs, Command};

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();
    let config_path = args.resolve_config_path();
    let mut config = GlyphConfig::load_or_default(&config_path);
    args.apply_overrides(&mut config);

    // Tracing. RUST_LOG wins over the configured level.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new(&config.general.log_level)
            }),
        )
        .init();

    tracing::info!("Starting Glyph v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(path = %config_path.display(), "Configuration loaded");

    let (event_tx, event_rx) = broadcast::channel::<UiEvent>(256);
    spawn_event_logger(event_rx);

    let gateway = Arc::new(HttpGateway::new(&config.gateway).map_err(GlyphError::from)?);
    let token = args.resolve_token().unwrap_or_default();

    match args.command {
        Command::Query { ref query } => {
            run_query(&config, gateway, &event_tx, query, &token).await
        }
        Command::Act {
            ref kind,
            ref domain,
            ref target,
            ref directive,
        } => run_act(&config, gateway, &event_tx, kind, domain, target, directive, &token).await,
    }
}

/// Stream one query, then render the directive its answer carries.
async fn run_query(
    config: &GlyphConfig,
    gateway: Arc<HttpGateway>,
    event_tx: &broadcast::Sender<UiEvent>,
    query: &str,
    token: &str,
) -> Result<()> {
    let transport = SseTransport::new(&config.gateway, &config.stream)?;
    let mut session = StreamSession::new(transport).with_events(event_tx.clone());

    let text = match session.run(query, token).await {
        SessionOutcome::Completed(text) => text,
        SessionOutcome::Cancelled(text) => text,
        SessionOutcome::Failed(reason) => return Err(GlyphError::Stream(reason)),
    };

    let Some(directive) = glyph_directive::parse(&text) else {
        // No widget in this answer; show the prose as-is.
        println!("{}", text);
        return Ok(());
    };
    let _ = event_tx.send(UiEvent::DirectiveDetected {
        domain: directive.domain.clone(),
        component: directive.component.clone(),
        timestamp: Timestamp::now(),
    });

    let prose = glyph_directive::strip_directive(&text);
    if !prose.is_empty() {
        println!("{}", prose);
    }

    let envelope = gateway
        .fetch_display(&directive.raw, token)
        .await
        .map_err(GlyphError::from)?;

    // A one-shot render never emits actions; the channel exists because the
    // dispatcher contract requires an emitter.
    let (actions_tx, _actions_rx) = mpsc::unbounded_channel();
    let narration = NarrationChannel::new(Arc::new(TracingSpeechService), config.voice.enabled);
    let mut dispatcher = Dispatcher::new(actions_tx, narration).with_events(event_tx.clone());
    let instruction = dispatcher.dispatch(&envelope);
    render::print_instruction(&instruction);

    Ok(())
}

/// Execute one approve/reject action and render the refreshed view.
#[allow(clippy::too_many_arguments)]
async fn run_act(
    config: &GlyphConfig,
    gateway: Arc<HttpGateway>,
    event_tx: &broadcast::Sender<UiEvent>,
    kind: &str,
    domain: &str,
    target: &str,
    directive: &str,
    token: &str,
) -> Result<()> {
    let kind: ActionKind = kind.parse().map_err(GlyphError::Action)?;
    let action = ComponentAction::with_target(kind, target);
    let _ = event_tx.send(UiEvent::ActionEmitted {
        action: kind.to_string(),
        timestamp: Timestamp::now(),
    });

    let relay = ActionRelay::new(Arc::clone(&gateway)).with_events(event_tx.clone());
    let outcome = relay.execute(domain, &action, directive, token).await?;

    if let Some(message) = &outcome.message {
        println!("{}", message);
    }
    println!(
        "Action {}{}.",
        outcome.phase,
        if outcome.confirmed {
            " (auto-confirmed)"
        } else {
            ""
        }
    );

    if let Some(envelope) = outcome.refreshed {
        let (actions_tx, _actions_rx) = mpsc::unbounded_channel();
        let narration =
            NarrationChannel::new(Arc::new(TracingSpeechService), config.voice.enabled);
        let mut dispatcher = Dispatcher::new(actions_tx, narration).with_events(event_tx.clone());
        let instruction = dispatcher.dispatch(&envelope);
        render::print_instruction(&instruction);
    }

    Ok(())
}

/// Log every broadcast event at debug level.
fn spawn_event_logger(mut rx: broadcast::Receiver<UiEvent>) {
    tokio::spawn(async move {
        while let Ok(event) = rx.recv().await {
            tracing::debug!(event = ?event, "UI event");
        }
    });
}
