//! Listener dispatch for newly accepted events.

/// Thread-safe listener collection with snapshot iteration.
pub mod registry;
/// Per-variant visitor trait and listener errors.
pub mod visitor;

pub use registry::{ListenerRef, ListenerRegistry};
pub use visitor::{ListenerError, ListenerResult, RaceLogEventVisitor};
