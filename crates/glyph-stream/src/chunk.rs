//! Decoding of raw transport chunks.
//!
//! The gateway pushes each fragment as JSON `{"text": "..."}` and signals
//! the end of the response with the literal sentinel `[DONE]`. Decoding is
//! pure; the session decides what to do with a malformed chunk (log and
//! skip, never crash).

use serde::Deserialize;

/// Terminal sentinel marking the end of a streamed response.
pub const DONE_SENTINEL: &str = "[DONE]";

/// Result of decoding one raw chunk payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChunkEvent {
    /// A partial text fragment to append verbatim.
    Text(String),
    /// The terminal sentinel: the response is complete.
    Done,
    /// The chunk did not parse as either form.
    Malformed,
}

#[derive(Debug, Deserialize)]
struct ChunkPayload {
    text: String,
}

/// Decode a single raw chunk payload.
pub fn decode_chunk(raw: &str) -> ChunkEvent {
    let trimmed = raw.trim();
    if trimmed == DONE_SENTINEL {
        return ChunkEvent::Done;
    }
    match serde_json::from_str::<ChunkPayload>(trimmed) {
        Ok(payload) => ChunkEvent::Text(payload.text),
        Err(_) => ChunkEvent::Malformed,
    }
}

// =============================================================================
// Tests
// =============================================================================
