//! Streaming ingestion for gateway query responses.
//!
//! Assembles partial text fragments pushed by the gateway into a full
//! response, enforcing a strict session lifecycle (`Idle -> Connecting ->
//! Streaming -> Complete/Errored`) and the one-live-transport invariant.
//! Includes a channel-backed mock transport for testing without a network.

pub mod chunk;
pub mod error;
pub mod session;
pub mod state;
pub mod transport;

pub use chunk::{decode_chunk, ChunkEvent, DONE_SENTINEL};
pub use error::StreamError;
pub use session::{CancelHandle, SessionOutcome, StreamSession};
pub use state::StreamState;
pub use transport::{MockTransport, QueryTransport, TransportHandle};
