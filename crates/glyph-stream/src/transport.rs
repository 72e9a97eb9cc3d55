//! Transport abstraction for the server-push query connection.
//!
//! The session owns at most one [`TransportHandle`] at a time; closing a
//! handle is idempotent and dropping it closes it. A channel-backed
//! [`MockTransport`] is provided for testing without a network.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};

use crate::error::StreamError;

// =============================================================================
// Traits
// =============================================================================

/// Opens a long-lived push connection for one query.
///
/// Implementations deliver raw chunk payloads in arrival order; the session
/// never reorders them.
#[async_trait]
pub trait QueryTransport: Send + Sync {
    /// Open a push connection for `query`, authenticated by `token`.
    async fn open(&self, query: &str, token: &str) -> Result<TransportHandle, StreamError>;
}

// =============================================================================
// TransportHandle
// =============================================================================

/// Exclusive handle to one open push connection.
///
/// Receives raw chunk payloads and owns the shutdown signal for the
/// underlying connection. There is never more than one live handle per
/// session; the session closes the old handle before opening a new one.
#[derive(Debug)]
pub struct TransportHandle {
    chunks: mpsc::Receiver<String>,
    shutdown: Option<oneshot::Sender<()>>,
}

impl TransportHandle {
    /// Build a handle from a chunk receiver and a shutdown sender.
    pub fn new(chunks: mpsc::Receiver<String>, shutdown: oneshot::Sender<()>) -> Self {
        Self {
            chunks,
            shutdown: Some(shutdown),
        }
    }

    /// Receive the next raw chunk payload.
    ///
    /// Returns `None` when the connection has ended (with or without the
    /// terminal sentinel having been delivered).
    pub async fn next_chunk(&mut self) -> Option<String> {
        self.chunks.recv().await
    }

    /// Close the connection. Safe to call more than once.
    pub fn close(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        self.chunks.close();
    }

    /// Whether `close` has already been called.
    pub fn is_closed(&self) -> bool {
        self.shutdown.is_none()
    }
}

impl Drop for TransportHandle {
    fn drop(&mut self) {
        self.close();
    }
}

// =============================================================================
// Mock implementation
// =============================================================================

/// Mock transport that replays a scripted list of chunk payloads.
///
/// Tracks how many connections were opened and how many are still live so
/// tests can assert the one-transport-at-a-time invariant.
#[derive(Debug, Clone)]
pub struct MockTransport {
    chunks: Vec<String>,
    fail_open: bool,
    hold_open: bool,
    opens: Arc<AtomicUsize>,
    live: Arc<AtomicUsize>,
}

impl MockTransport {
    /// Mock that delivers the given payloads and then ends the connection.
    pub fn new(chunks: &[&str]) -> Self {
        Self {
            chunks: chunks.iter().map(|c| c.to_string()).collect(),
            fail_open: false,
            hold_open: false,
            opens: Arc::new(AtomicUsize::new(0)),
            live: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Mock whose `open` always fails with a transport error.
    pub fn failing() -> Self {
        Self {
            fail_open: true,
            ..Self::new(&[])
        }
    }

    /// Keep the connection open after the scripted chunks are delivered,
    /// until the handle is closed (used to test cancellation).
    pub fn hold_open(mut self) -> Self {
        self.hold_open = true;
        self
    }

    /// Number of connections opened so far.
    pub fn open_count(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    /// Number of connections currently live (not yet closed).
    pub fn live_connections(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QueryTransport for MockTransport {
    async fn open(&self, _query: &str, _token: &str) -> Result<TransportHandle, StreamError> {
        if self.fail_open {
            return Err(StreamError::Transport(
                "mock transport refused to open".to_string(),
            ));
        }

        self.opens.fetch_add(1, Ordering::SeqCst);
        self.live.fetch_add(1, Ordering::SeqCst);

        let (tx, rx) = mpsc::channel(16);
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();
        let chunks = self.chunks.clone();
        let hold_open = self.hold_open;
        let live = Arc::clone(&self.live);

        tokio::spawn(async move {
            let mut interrupted = false;
            for raw in chunks {
                tokio::select! {
                    _ = &mut shutdown_rx => {
                        interrupted = true;
                        break;
                    }
                    sent = tx.send(raw) => {
                        if sent.is_err() {
                            interrupted = true;
                            break;
                        }
                    }
                }
            }
            if !interrupted {
                if !hold_open {
                    // End the connection without a sentinel.
                    drop(tx);
                }
                let _ = shutdown_rx.await;
            }
            live.fetch_sub(1, Ordering::SeqCst);
        });

        Ok(TransportHandle::new(rx, shutdown_tx))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_handle_delivers_chunks_in_order() {
        let transport = MockTransport::new(&["one", "two", "three"]);
        let mut handle = transport.open("q", "t").await.unwrap();
        assert_eq!(handle.next_chunk().await.as_deref(), Some("one"));
        assert_eq!(handle.next_chunk().await.as_deref(), Some("two"));
        assert_eq!(handle.next_chunk().await.as_deref(), Some("three"));
        assert_eq!(handle.next_chunk().await, None);
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let transport = MockTransport::new(&["one"]);
        let mut handle = transport.open("q", "t").await.unwrap();
        assert!(!handle.is_closed());
        handle.close();
        assert!(handle.is_closed());
        // Second close must be a no-op, not a panic.
        handle.close();
        assert!(handle.is_closed());
    }

    #[tokio::test]
    async fn test_closed_handle_stops_delivering() {
        let transport = MockTransport::new(&["one", "two"]).hold_open();
        let mut handle = transport.open("q", "t").await.unwrap();
        handle.close();
        // Any buffered chunk may still drain, but the channel must end.
        while handle.next_chunk().await.is_some() {}
    }

    #[tokio::test]
    async fn test_failing_transport() {
        let transport = MockTransport::failing();
        let err = transport.open("q", "t").await.unwrap_err();
        assert!(matches!(err, StreamError::Transport(_)));
        assert_eq!(transport.open_count(), 0);
    }

    #[tokio::test]
    async fn test_open_count_increments() {
        let transport = MockTransport::new(&[]);
        let _h1 = transport.open("q", "t").await.unwrap();
        let _h2 = transport.open("q", "t").await.unwrap();
        assert_eq!(transport.open_count(), 2);
    }

    #[tokio::test]
    async fn test_drop_closes_connection() {
        let transport = MockTransport::new(&["one"]).hold_open();
        {
            let _handle = transport.open("q", "t").await.unwrap();
        }
        // Give the replay task a moment to observe the shutdown.
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert_eq!(transport.live_connections(), 0);
    }
}
