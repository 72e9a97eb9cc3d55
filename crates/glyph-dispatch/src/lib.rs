//! Component dispatch registry.
//!
//! Maps the server-declared component type of an envelope onto a concrete
//! renderer kind with a compiler-checked fallback for unknown types, injects
//! the outbound action emitter, adapts the approvals queue to its narrower
//! callback shape, and triggers the narration side-channel.

pub mod approvals;
pub mod registry;

pub use approvals::ApprovalsCallbacks;
pub use registry::{ActionEmitter, ComponentKind, Dispatcher, RenderInstruction};
