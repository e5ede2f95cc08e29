//! Per-client delivery cursors for incremental polling.

use hashbrown::{HashMap, HashSet};

use crate::{event::EventRef, types::ClientId};

/// Sequence number the log assigns to each accepted event.
pub type EntrySeq = u64;

/// Remembers, per client, which accepted events it has already received.
///
/// Cursors live in memory only. After a restart every client is unknown again
/// and its next delta is the complete history.
#[derive(Debug, Default)]
pub struct ClientDeliveryTracker {
    delivered: HashMap<ClientId, HashSet<EntrySeq>>,
}

impl ClientDeliveryTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the events in `all` not yet delivered to `client`, skipping
    /// `suppressed`, then marks everything in `all` (and `suppressed`) as
    /// delivered. Unknown clients have received nothing.
    pub fn deliver<'a>(
        &mut self,
        client: ClientId,
        all: impl IntoIterator<Item = (EntrySeq, &'a EventRef)>,
        suppressed: Option<EntrySeq>,
    ) -> Vec<EventRef> {
        let delivered = self.delivered.entry(client).or_default();
        let mut out = Vec::new();
        for (seq, event) in all {
            if Some(seq) == suppressed {
                continue;
            }
            if delivered.insert(seq) {
                out.push(EventRef::clone(event));
            }
        }
        if let Some(seq) = suppressed {
            delivered.insert(seq);
        }
        out
    }

    /// Marks every entry in `seqs` delivered to `client`.
    pub fn mark_delivered(&mut self, client: ClientId, seqs: impl IntoIterator<Item = EntrySeq>) {
        self.delivered.entry(client).or_default().extend(seqs);
    }

    pub fn has_received(&self, client: &ClientId, seq: EntrySeq) -> bool {
        self.delivered
            .get(client)
            .is_some_and(|set| set.contains(&seq))
    }

    /// Number of clients seen so far.
    pub fn client_count(&self) -> usize {
        self.delivered.len()
    }

    /// Drops every cursor, as a process restart would.
    pub fn reset(&mut self) {
        self.delivered.clear();
    }
}
