//! Server-sent-events transport for the streaming query endpoint.
//!
//! Opens `GET <gateway>/api/query?q=<query>&token=<token>` and forwards each
//! `data:` line payload, in arrival order, over the transport handle's
//! channel. The session layer decodes payloads; this layer only frames them.

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use tokio::sync::{mpsc, oneshot};

use glyph_core::config::{GatewayConfig, StreamConfig};
use glyph_stream::{QueryTransport, StreamError, TransportHandle};

/// Extract the payload of one SSE line.
///
/// Returns `Some` only for `data:` lines; comment lines and other SSE fields
/// (`event:`, `id:`, `retry:`) carry no chunk payload. A single optional
/// space after the colon is consumed per the SSE framing rules.
pub fn parse_sse_line(line: &str) -> Option<&str> {
    let rest = line.strip_prefix("data:")?;
    Some(rest.strip_prefix(' ').unwrap_or(rest))
}

/// Long-lived SSE push connection to the query gateway.
pub struct SseTransport {
    http: reqwest::Client,
    base_url: String,
    channel_capacity: usize,
}

impl SseTransport {
    /// Build the transport from gateway and stream configuration.
    ///
    /// The HTTP client carries only a connect timeout; the connection itself
    /// stays open for as long as the gateway keeps pushing.
    pub fn new(gateway: &GatewayConfig, stream: &StreamConfig) -> Result<Self, StreamError> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(gateway.request_timeout_secs))
            .build()
            .map_err(|e| StreamError::Transport(e.to_string()))?;
        Ok(Self {
            http,
            base_url: gateway.base_url.trim_end_matches('/').to_string(),
            channel_capacity: stream.channel_capacity.max(1),
        })
    }
}

#[async_trait]
impl QueryTransport for SseTransport {
    async fn open(&self, query: &str, token: &str) -> Result<TransportHandle, StreamError> {
        let resp = self
            .http
            .get(format!("{}/api/query", self.base_url))
            .query(&[("q", query), ("token", token)])
            .send()
            .await
            .map_err(|e| StreamError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(StreamError::Transport(format!(
                "gateway returned {}",
                status
            )));
        }

        let (tx, rx) = mpsc::channel(self.channel_capacity);
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();

        tokio::spawn(async move {
            let mut bytes = resp.bytes_stream();
            let mut buffer = String::new();
            loop {
                let chunk = tokio::select! {
                    biased;
                    _ = &mut shutdown_rx => break,
                    chunk = bytes.next() => chunk,
                };
                match chunk {
                    Some(Ok(data)) => {
                        buffer.push_str(&String::from_utf8_lossy(&data));
                        while let Some(pos) = buffer.find('\n') {
                            let line = buffer[..pos].trim_end_matches('\r').to_string();
                            buffer.drain(..=pos);
                            if let Some(payload) = parse_sse_line(&line) {
                                if tx.send(payload.to_string()).await.is_err() {
                                    return;
                                }
                            }
                        }
                    }
                    Some(Err(e)) => {
                        tracing::warn!(error = %e, "SSE stream read failed");
                        break;
                    }
                    None => break,
                }
            }
        });

        Ok(TransportHandle::new(rx, shutdown_tx))
    }
}

// =============================================================================
// Tests
// =============================================================================
