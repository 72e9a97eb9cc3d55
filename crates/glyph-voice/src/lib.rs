//! Narration side-channel for rendered components.
//!
//! Provides trait-based abstraction over a text-to-speech engine plus the
//! [`NarrationChannel`] that enforces the at-most-one-utterance rule.
//! Narration is best-effort: a failed utterance is logged, never surfaced as
//! a render failure. Includes a mock engine for testing without audio
//! hardware.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use glyph_core::GlyphError;
use thiserror::Error;

// =============================================================================
// Errors
// =============================================================================

/// Errors from a speech engine.
#[derive(Debug, Error)]
pub enum VoiceError {
    #[error("speech engine error: {0}")]
    Engine(String),
}

impl From<VoiceError> for GlyphError {
    fn from(err: VoiceError) -> Self {
        GlyphError::Voice(err.to_string())
    }
}

// =============================================================================
// Traits
// =============================================================================

/// A text-to-speech engine.
///
/// `speak` enqueues an utterance and returns immediately; `cancel` stops
/// whatever is currently audible. Implementations must tolerate `cancel`
/// with nothing in flight.
pub trait SpeechService: Send + Sync {
    /// Enqueue `text` for playback.
    fn speak(&self, text: &str) -> Result<(), VoiceError>;

    /// Stop any in-flight utterance.
    fn cancel(&self);
}

// =============================================================================
// NarrationChannel
// =============================================================================

/// Wraps a [`SpeechService`] with the narration rules of the render cycle.
///
/// - Speaks at most once per distinct narration value.
/// - Cancels any in-flight utterance before speaking a new value.
/// - Toggling the enabled flag cancels playback and clears the dedup state,
///   so re-enabling re-speaks the current narration on the next render.
pub struct NarrationChannel {
    engine: Arc<dyn SpeechService>,
    enabled: bool,
    last_spoken: Option<String>,
}

impl NarrationChannel {
    /// Create a channel over the given engine.
    pub fn new(engine: Arc<dyn SpeechService>, enabled: bool) -> Self {
        Self {
            engine,
            enabled,
            last_spoken: None,
        }
    }

    /// Whether narration is currently enabled.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Enable or disable narration. Any flag change cancels in-flight speech
    /// and forgets the last utterance.
    pub fn set_enabled(&mut self, enabled: bool) {
        if self.enabled == enabled {
            return;
        }
        self.engine.cancel();
        self.last_spoken = None;
        self.enabled = enabled;
    }

    /// Speak `text` if enabled, non-empty, and different from the last value
    /// spoken. Returns whether an utterance was started.
    pub fn narrate(&mut self, text: &str) -> bool {
        if !self.enabled || text.is_empty() {
            return false;
        }
        if self.last_spoken.as_deref() == Some(text) {
            return false;
        }
        self.engine.cancel();
        if let Err(e) = self.engine.speak(text) {
            tracing::warn!(error = %e, "Narration failed");
            return false;
        }
        self.last_spoken = Some(text.to_string());
        true
    }
}

// =============================================================================
// Engines
// =============================================================================

/// Speech engine that logs utterances instead of synthesizing audio.
///
/// The default engine in the CLI composition root, where no audio output
/// device is assumed.
pub struct TracingSpeechService;

impl SpeechService for TracingSpeechService {
    fn speak(&self, text: &str) -> Result<(), VoiceError> {
        tracing::info!(text = %text, "Narration");
        Ok(())
    }

    fn cancel(&self) {
        tracing::debug!("Narration cancelled");
    }
}

/// Mock speech engine that records utterances and cancels for tests.
#[derive(Default)]
pub struct MockSpeechService {
    utterances: Mutex<Vec<String>>,
    cancels: AtomicUsize,
    fail: bool,
}

impl MockSpeechService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mock whose `speak` always fails.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// All texts spoken so far, in order.
    pub fn utterances(&self) -> Vec<String> {
        self.utterances.lock().expect("utterance mutex poisoned").clone()
    }

    /// Number of times `cancel` was called.
    pub fn cancel_count(&self) -> usize {
        self.cancels.load(Ordering::SeqCst)
    }
}

impl SpeechService for MockSpeechService {
    fn speak(&self, text: &str) -> Result<(), VoiceError> {
        if self.fail {
            return Err(VoiceError::Engine("mock engine failure".to_string()));
        }
        self.utterances
            .lock()
            .expect("utterance mutex poisoned")
            .push(text.to_string());
        Ok(())
    }

    fn cancel(&self) {
        self.cancels.fetch_add(1, Ordering::SeqCst);
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn channel(enabled: bool) -> (Arc<MockSpeechService>, NarrationChannel) {
        let engine = Arc::new(MockSpeechService::new());
        let channel = NarrationChannel::new(engine.clone(), enabled);
        (engine, channel)
    }

    // ---- narrate ----

    #[test]
    fn test_narrate_speaks_when_enabled() {
        let (engine, mut channel) = channel(true);
        assert!(channel.narrate("hello"));
        assert_eq!(engine.utterances(), vec!["hello"]);
    }

    #[test]
    fn test_narrate_disabled_is_silent() {
        let (engine, mut channel) = channel(false);
        assert!(!channel.narrate("hello"));
        assert!(engine.utterances().is_empty());
    }

    #[test]
    fn test_narrate_empty_text_is_silent() {
        let (engine, mut channel) = channel(true);
        assert!(!channel.narrate(""));
        assert!(engine.utterances().is_empty());
    }

    #[test]
    fn test_narrate_same_text_speaks_once() {
        let (engine, mut channel) = channel(true);
        assert!(channel.narrate("same"));
        assert!(!channel.narrate("same"));
        assert!(!channel.narrate("same"));
        assert_eq!(engine.utterances(), vec!["same"]);
    }

    #[test]
    fn test_narrate_new_text_cancels_previous() {
        let (engine, mut channel) = channel(true);
        channel.narrate("first");
        let cancels_before = engine.cancel_count();
        channel.narrate("second");
        assert!(engine.cancel_count() > cancels_before);
        assert_eq!(engine.utterances(), vec!["first", "second"]);
    }

    #[test]
    fn test_narrate_alternating_texts_speak_each_time() {
        let (engine, mut channel) = channel(true);
        channel.narrate("a");
        channel.narrate("b");
        channel.narrate("a");
        assert_eq!(engine.utterances(), vec!["a", "b", "a"]);
    }

    #[test]
    fn test_narrate_engine_failure_is_swallowed() {
        let engine = Arc::new(MockSpeechService::failing());
        let mut channel = NarrationChannel::new(engine, true);
        // Best-effort: failure reported as "did not speak", not an error.
        assert!(!channel.narrate("hello"));
    }

    #[test]
    fn test_failed_utterance_not_marked_spoken() {
        let engine = Arc::new(MockSpeechService::failing());
        let mut channel = NarrationChannel::new(engine, true);
        channel.narrate("hello");
        // A later retry with the same text is still attempted.
        assert!(!channel.narrate("hello"));
    }

    // ---- set_enabled ----

    #[test]
    fn test_disable_cancels_in_flight_speech() {
        let (engine, mut channel) = channel(true);
        channel.narrate("talking");
        let cancels_before = engine.cancel_count();
        channel.set_enabled(false);
        assert!(engine.cancel_count() > cancels_before);
    }

    #[test]
    fn test_reenable_respeaks_current_narration() {
        let (engine, mut channel) = channel(true);
        channel.narrate("status");
        channel.set_enabled(false);
        channel.set_enabled(true);
        assert!(channel.narrate("status"));
        assert_eq!(engine.utterances(), vec!["status", "status"]);
    }

    #[test]
    fn test_set_enabled_same_value_is_noop() {
        let (engine, mut channel) = channel(true);
        channel.narrate("keep");
        let cancels_before = engine.cancel_count();
        channel.set_enabled(true);
        assert_eq!(engine.cancel_count(), cancels_before);
        // Dedup state survives a no-op toggle.
        assert!(!channel.narrate("keep"));
    }

    // ---- engines ----

    #[test]
    fn test_tracing_engine_accepts_speech() {
        let engine = TracingSpeechService;
        assert!(engine.speak("logged").is_ok());
        engine.cancel();
    }

    #[test]
    fn test_voice_error_conversion() {
        let err: GlyphError = VoiceError::Engine("busy".to_string()).into();
        assert!(matches!(err, GlyphError::Voice(_)));
        assert!(err.to_string().contains("busy"));
    }
}
