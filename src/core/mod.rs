//! The race log container, its ordering rules and delivery cursors.

/// Per-client delivery bookkeeping.
pub mod delivery;
mod dispatch;
/// Canonical comparator and duplicate key.
pub mod ordering;
/// Thread-safe race log.
pub mod race_log;

pub use race_log::{RaceLog, RaceLogError, ReadLock};
