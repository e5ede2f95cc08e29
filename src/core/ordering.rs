//! Canonical ordering and duplicate detection for race log events.

use std::cmp::Ordering;

use crate::{
    event::RaceLogEvent,
    types::{EventId, PassId, TimeMs},
};

/// Ascending canonical order: lower priority first, then older `created_at`
/// first, then by id. Descending views iterate this order in reverse, so the
/// most authoritative, most recent event comes first.
///
/// Events equal under this comparison (same priority, creation time and id)
/// are ordered by the caller's insertion sequence.
pub fn compare_events(a: &RaceLogEvent, b: &RaceLogEvent) -> Ordering {
    a.author()
        .compare_priority(b.author())
        .then_with(|| a.created_at().cmp(&b.created_at()))
        .then_with(|| a.id().cmp(b.id()))
        .then_with(|| a.pass_id().cmp(&b.pass_id()))
        .then_with(|| a.author().name.cmp(&b.author().name))
}

/// Key under which two events count as the same statement.
///
/// The author component is the handle address: equal-valued but distinct
/// authors never collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DedupKey {
    pass_id: PassId,
    author: usize,
    created_at: TimeMs,
    id: EventId,
}

impl DedupKey {
    pub fn of(event: &RaceLogEvent) -> Self {
        Self {
            pass_id: event.pass_id(),
            author: std::sync::Arc::as_ptr(event.author()) as usize,
            created_at: event.created_at(),
            id: event.id().clone(),
        }
    }
}
