//! Action execution with the two-phase confirmation handshake.
//!
//! Routes approve/reject actions to the gateway and, when the gateway parks
//! the action behind a confirmation ticket, consumes the ticket automatically
//! with approved semantics. The user decided once at the UI; the second hop
//! is system-level authorization, never a second prompt.

pub mod error;
pub mod phase;
pub mod relay;

pub use error::ActionError;
pub use phase::{validate_transition, ActionPhase};
pub use relay::{ActionOutcome, ActionRelay};
