//! Streaming query session.
//!
//! Drives one query at a time against a [`QueryTransport`], appending text
//! fragments in arrival order until the terminal sentinel arrives. Exactly
//! one outcome is produced per run. Starting a new run always tears down the
//! previous transport first, so at most one connection is live per session.

use std::sync::Arc;

use tokio::sync::Notify;
use uuid::Uuid;

use glyph_core::events::{emit, EventSender};
use glyph_core::{Timestamp, UiEvent};

use crate::chunk::{decode_chunk, ChunkEvent};
use crate::error::StreamError;
use crate::state::StreamState;
use crate::transport::{QueryTransport, TransportHandle};

// =============================================================================
// Outcome and cancellation
// =============================================================================

/// The single downstream notification produced by one session run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    /// The stream reached its terminal sentinel; carries the full text.
    Completed(String),
    /// The user stopped the stream; carries the text accumulated so far.
    Cancelled(String),
    /// The session failed; carries a human-readable reason.
    Failed(String),
}

/// Cloneable handle that lets the user stop the in-flight run.
///
/// Cancelling when no run is in flight applies to the next run.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    notify: Arc<Notify>,
}

impl CancelHandle {
    /// Request cancellation of the session's current (or next) run.
    pub fn cancel(&self) {
        self.notify.notify_one();
    }
}

// =============================================================================
// StreamSession
// =============================================================================

/// Assembles one streamed gateway response at a time.
pub struct StreamSession<T: QueryTransport> {
    transport: T,
    state: StreamState,
    accumulated: String,
    handle: Option<TransportHandle>,
    session_id: Uuid,
    cancel: Arc<Notify>,
    events: Option<EventSender>,
}

/// Marker for how the chunk loop ended.
enum LoopEnd {
    Done,
    Cancelled,
    TransportEnded,
}

impl<T: QueryTransport> StreamSession<T> {
    /// Create a new idle session over the given transport.
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            state: StreamState::Idle,
            accumulated: String::new(),
            handle: None,
            session_id: Uuid::new_v4(),
            cancel: Arc::new(Notify::new()),
            events: None,
        }
    }

    /// Attach a broadcast sender for lifecycle events.
    pub fn with_events(mut self, events: EventSender) -> Self {
        self.events = Some(events);
        self
    }

    /// Current lifecycle state.
    pub fn state(&self) -> StreamState {
        self.state
    }

    /// Text accumulated so far (final text once `Complete`).
    pub fn accumulated_text(&self) -> &str {
        &self.accumulated
    }

    /// Session identifier carried in emitted events.
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Whether a transport connection is currently held open.
    pub fn has_live_transport(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_closed())
    }

    /// Handle for stopping the in-flight run from elsewhere.
    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            notify: Arc::clone(&self.cancel),
        }
    }

    /// Close the active transport, if any. Safe to call repeatedly; used on
    /// teardown (e.g. component unmount) and before every new run.
    pub fn shutdown(&mut self) {
        if let Some(mut handle) = self.handle.take() {
            handle.close();
        }
    }

    /// Run one query to completion, producing exactly one outcome.
    ///
    /// Any previous transport is closed before a new one is opened, and
    /// previously accumulated text is discarded; a retry is a fresh attempt.
    pub async fn run(&mut self, query: &str, token: &str) -> SessionOutcome {
        self.shutdown();
        self.accumulated.clear();
        self.set_state(StreamState::Connecting);

        // Validation happens before any transport is opened, with reasons
        // the UI can tell apart.
        if query.trim().is_empty() {
            return self.fail(StreamError::EmptyQuery);
        }
        if token.trim().is_empty() {
            return self.fail(StreamError::NotAuthenticated);
        }

        match self.transport.open(query, token).await {
            Ok(handle) => self.handle = Some(handle),
            Err(e) => return self.fail(e),
        }
        self.set_state(StreamState::Streaming);
        emit(
            &self.events,
            UiEvent::StreamStarted {
                session_id: self.session_id,
                timestamp: Timestamp::now(),
            },
        );

        let end = loop {
            let handle = self
                .handle
                .as_mut()
                .expect("transport handle present while streaming");
            // Biased so a pending cancellation always wins over a ready chunk.
            let received = tokio::select! {
                biased;
                _ = self.cancel.notified() => None,
                chunk = handle.next_chunk() => Some(chunk),
            };
            match received {
                None => break LoopEnd::Cancelled,
                Some(None) => break LoopEnd::TransportEnded,
                Some(Some(raw)) => match decode_chunk(&raw) {
                    ChunkEvent::Text(fragment) => self.accumulated.push_str(&fragment),
                    ChunkEvent::Done => break LoopEnd::Done,
                    ChunkEvent::Malformed => {
                        tracing::warn!(chunk = %raw, "Skipping malformed stream chunk");
                    }
                },
            }
        };

        self.shutdown();
        match end {
            LoopEnd::Done => {
                self.set_state(StreamState::Complete);
                emit(
                    &self.events,
                    UiEvent::StreamCompleted {
                        session_id: self.session_id,
                        text_length: self.accumulated.len(),
                        timestamp: Timestamp::now(),
                    },
                );
                SessionOutcome::Completed(self.accumulated.clone())
            }
            LoopEnd::Cancelled => {
                self.set_state(StreamState::Complete);
                emit(
                    &self.events,
                    UiEvent::StreamCancelled {
                        session_id: self.session_id,
                        timestamp: Timestamp::now(),
                    },
                );
                SessionOutcome::Cancelled(self.accumulated.clone())
            }
            LoopEnd::TransportEnded => {
                let reason = StreamError::Transport(
                    "the stream ended before the response completed".to_string(),
                );
                self.fail(reason)
            }
        }
    }

    /// Enter `Errored` with a user-facing reason and emit the notification.
    fn fail(&mut self, err: StreamError) -> SessionOutcome {
        self.shutdown();
        self.set_state(StreamState::Errored);
        let reason = err.to_string();
        emit(
            &self.events,
            UiEvent::StreamErrored {
                session_id: self.session_id,
                reason: reason.clone(),
                timestamp: Timestamp::now(),
            },
        );
        SessionOutcome::Failed(reason)
    }

    fn set_state(&mut self, target: StreamState) {
        debug_assert!(
            self.state.can_transition_to(&target),
            "invalid stream transition: {} -> {}",
            self.state,
            target
        );
        tracing::debug!("Stream state: {} -> {}", self.state, target);
        self.state = target;
    }
}

impl<T: QueryTransport> Drop for StreamSession<T> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

// =============================================================================
// Tests
// =============================================================================
