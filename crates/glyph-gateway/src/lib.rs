//! HTTP client for the query gateway and the UI rendering service.
//!
//! Exposes the [`GatewayApi`] trait so the action relay and the app can be
//! tested against a mock, the [`HttpGateway`] implementation over reqwest,
//! and the [`SseTransport`] push connection used by the streaming session.

pub mod client;
pub mod sse;

pub use client::{
    ActionResponse, ActionStatus, ConfirmBehavior, GatewayApi, GatewayCall, GatewayError,
    HttpGateway, MockGateway,
};
pub use sse::SseTransport;
