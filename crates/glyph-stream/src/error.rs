//! Error types for the streaming ingestion subsystem.

use glyph_core::GlyphError;
use thiserror::Error;

/// Errors from the streaming session and its transport.
///
/// Authentication and transport failures are distinct variants so the UI can
/// show a different message before a transport is ever opened.
#[derive(Debug, Error)]
pub enum StreamError {
    #[error("not authenticated")]
    NotAuthenticated,
    #[error("query cannot be empty")]
    EmptyQuery,
    #[error("transport failure: {0}")]
    Transport(String),
}

impl From<StreamError> for GlyphError {
    fn from(err: StreamError) -> Self {
        GlyphError::Stream(err.to_string())
    }
}
