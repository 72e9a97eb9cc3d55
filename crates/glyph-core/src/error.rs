use thiserror::Error;

/// Top-level error type for the Glyph client.
///
/// Each variant wraps a subsystem-specific error. Subsystem crates define
/// their own error types and implement `From<SubsystemError> for GlyphError`
/// so that the `?` operator works seamlessly across crate boundaries.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GlyphError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Directive error: {0}")]
    Directive(String),

    #[error("Stream error: {0}")]
    Stream(String),

    #[error("Gateway error: {0}")]
    Gateway(String),

    #[error("Dispatch error: {0}")]
    Dispatch(String),

    #[error("Action error: {0}")]
    Action(String),

    #[error("Voice error: {0}")]
    Voice(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for GlyphError {
    fn from(err: toml::de::Error) -> Self {
        GlyphError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for GlyphError {
    fn from(err: toml::ser::Error) -> Self {
        GlyphError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for GlyphError {
    fn from(err: serde_json::Error) -> Self {
        GlyphError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for Glyph operations.
pub type Result<T> = std::result::Result<T, GlyphError>;
