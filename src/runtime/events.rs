//! Runtime notification payloads.

use crate::{
    event::EventType,
    types::{EventId, PassId},
};

/// Notifications emitted by a running journal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RaceLogNotification {
    /// An event was accepted by the race log.
    EventAdded {
        /// Accepted event id.
        id: EventId,
        /// Variant of the accepted event.
        event_type: EventType,
        /// Pass of the accepted event.
        pass_id: PassId,
        /// True when derived caches must be recomputed.
        invalidates_caches: bool,
    },
    /// The sink holds at least this many records for the log.
    DurableUpTo {
        /// Records durably stored.
        count: u64,
    },
}
