//! Shared kernel for the Glyph generative-UI client.
//!
//! Defines the component envelope and action types exchanged with the
//! gateway, the top-level error type, TOML configuration, and the domain
//! events broadcast to UI listeners.

pub mod config;
pub mod error;
pub mod events;
pub mod types;

pub use config::GlyphConfig;
pub use error::{GlyphError, Result};
pub use events::UiEvent;
pub use types::*;
