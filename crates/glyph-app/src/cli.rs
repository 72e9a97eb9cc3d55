//! CLI argument definitions for the Glyph client.
//!
//! Uses `clap` with derive macros for ergonomic argument parsing.
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use glyph_core::GlyphConfig;

/// Glyph - a generative-UI client for a conversational AI gateway.
#[derive(Parser, Debug)]
#[command(name = "glyph", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Query/action gateway base URL.
    #[arg(long = "gateway-url")]
    pub gateway_url: Option<String>,

    /// UI rendering service base URL.
    #[arg(long = "ui-service-url")]
    pub ui_service_url: Option<String>,

    /// Bearer token for gateway calls.
    #[arg(short = 't', long = "token")]
    pub token: Option<String>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,

    /// Speak narration text aloud.
    #[arg(long = "voice")]
    pub voice: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Stream a query and render the directive its answer carries.
    Query {
        /// Natural-language query to send to the gateway.
        query: String,
    },
    /// Execute an approve/reject action against a rendered view.
    Act {
        /// Action to execute: approve or reject.
        kind: String,
        /// Business domain the action belongs to (e.g. finance, hr).
        #[arg(long)]
        domain: String,
        /// Id of the request being approved or rejected.
        #[arg(long)]
        target: String,
        /// Original directive to re-fetch after the action settles.
        #[arg(long)]
        directive: String,
    },
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > GLYPH_CONFIG env var > platform default
    /// (~/.glyph/config.toml).
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("GLYPH_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Resolve the bearer token.
    ///
    /// Priority: --token flag > GLYPH_TOKEN env var.
    pub fn resolve_token(&self) -> Option<String> {
        if let Some(ref t) = self.token {
            return Some(t.clone());
        }
        std::env::var("GLYPH_TOKEN").ok()
    }

    /// Fold CLI overrides into the loaded configuration.
    pub fn apply_overrides(&self, config: &mut GlyphConfig) {
        if let Some(ref url) = self.gateway_url {
            config.gateway.base_url = url.clone();
        }
        if let Some(ref url) = self.ui_service_url {
            config.gateway.ui_service_url = url.clone();
        }
        if let Some(ref level) = self.log_level {
            config.general.log_level = level.clone();
        }
        if self.voice {
            config.voice.enabled = true;
        }
    }
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home).join(".glyph").join("config.toml");
    }
    #[cfg(not(target_os = "windows"))]
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".glyph").join("config.toml");
    }
    PathBuf::from("config.toml")
}

// =============================================================================
// Tests
// =============================================================================
