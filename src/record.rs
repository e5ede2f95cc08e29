//! Serializable event records and their versioned wrapper.

use serde::{Deserialize, Serialize};

use crate::{
    author::{Author, AuthorRegistry},
    event::{EventKind, EventRef, RaceLogEvent},
    types::{CompetitorId, EventId, PassId, TimeMs},
};

/// Version number for serialized [`EventRecordEnvelope`] payloads.
pub const RECORD_FORMAT_VERSION: u16 = 1;

/// Plain-value form of an event, with the author carried by value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Event identity.
    pub id: EventId,
    /// Authoring time.
    pub created_at: TimeMs,
    /// Time point the event is about.
    pub logical_time_point: TimeMs,
    /// Pass the event belongs to.
    pub pass_id: PassId,
    /// Author value; interned back to a shared handle on restore.
    pub author: Author,
    /// Involved competitors.
    pub involved_competitors: Vec<CompetitorId>,
    /// Variant payload.
    pub kind: EventKind,
}

impl EventRecord {
    /// Captures `event` as a record.
    pub fn from_event(event: &RaceLogEvent) -> Self {
        Self {
            id: event.id().clone(),
            created_at: event.created_at(),
            logical_time_point: event.logical_time_point(),
            pass_id: event.pass_id(),
            author: Author::clone(event.author()),
            involved_competitors: event.involved_competitors().to_vec(),
            kind: event.kind().clone(),
        }
    }

    /// Rebuilds the event, resolving the author through `authors` so records
    /// from the same identity share one handle.
    pub fn into_event(self, authors: &AuthorRegistry) -> EventRef {
        let author = authors.intern(&self.author.name, self.author.priority);
        RaceLogEvent::new(
            self.id,
            self.created_at,
            self.logical_time_point,
            self.pass_id,
            author,
            self.involved_competitors,
            self.kind,
        )
    }
}

/// Versioned wrapper for stable on-disk and on-wire decoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecordEnvelope {
    /// Payload format version.
    pub format_version: u16,
    /// Wrapped record.
    pub record: EventRecord,
}

impl EventRecordEnvelope {
    /// Constructs an envelope using [`RECORD_FORMAT_VERSION`].
    pub fn new(record: EventRecord) -> Self {
        Self {
            format_version: RECORD_FORMAT_VERSION,
            record,
        }
    }
}
