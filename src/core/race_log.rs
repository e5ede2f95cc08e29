use std::{
    cmp::Ordering,
    marker::PhantomData,
    sync::{Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard},
    thread::{self, ThreadId},
};

use hashbrown::{HashMap, HashSet};
use thiserror::Error;
use tracing::{debug, error, trace, warn};

use crate::{
    author::AuthorRef,
    event::{EventKind, EventRef, RaceLogEvent},
    factory::EventFactory,
    listener::{ListenerRef, ListenerRegistry},
    types::{ClientId, DEFAULT_PASS_ID, EventId, PassId, TimeMs},
};

use super::{
    delivery::{ClientDeliveryTracker, EntrySeq},
    dispatch::DispatchGate,
    ordering::{DedupKey, compare_events},
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RaceLogError {
    /// A read query ran on a thread that does not hold the read lock.
    #[error("race log read lock is not held by the calling thread")]
    NotLocked,
    #[error("event cannot be revoked: {0}")]
    NotRevokable(String),
}

#[derive(Debug, Clone)]
struct Entry {
    seq: EntrySeq,
    event: EventRef,
}

#[derive(Debug, Default)]
struct LogState {
    raw: Vec<Entry>,
    sorted: Vec<Entry>,
    keys: HashMap<DedupKey, EntrySeq>,
    by_id: HashMap<EventId, EventRef>,
    revoked: HashSet<EventId>,
    current_pass_id: PassId,
    next_seq: EntrySeq,
    delivery: ClientDeliveryTracker,
}

impl LogState {
    fn insert(&mut self, log_id: &str, event: &EventRef) -> Option<EntrySeq> {
        let key = DedupKey::of(event);
        if self.keys.contains_key(&key) {
            return None;
        }

        let seq = self.next_seq;
        self.next_seq += 1;
        self.keys.insert(key, seq);

        let entry = Entry {
            seq,
            event: EventRef::clone(event),
        };
        let pos = self
            .sorted
            .partition_point(|e| compare_events(&e.event, event) != Ordering::Greater);
        self.sorted.insert(pos, entry.clone());
        self.raw.push(entry);
        self.by_id.insert(event.id().clone(), EventRef::clone(event));

        if event.pass_id() > self.current_pass_id {
            debug!(race_log = log_id, pass_id = event.pass_id(), "changing current pass");
            self.current_pass_id = event.pass_id();
        }

        if let EventKind::Revoke(revocation) = event.kind() {
            match self.check_revoke(event) {
                Ok(()) => {
                    if !self.by_id.contains_key(&revocation.revoked_event_id) {
                        warn!(
                            race_log = log_id,
                            revoked = %revocation.revoked_event_id,
                            "revoke refers to an event not in the log yet"
                        );
                    }
                    self.revoked.insert(revocation.revoked_event_id.clone());
                }
                Err(err) => {
                    warn!(race_log = log_id, event = %event, error = %err, "revoke has no effect");
                }
            }
        }

        Some(seq)
    }

    /// An unknown target passes: it may simply not have arrived yet.
    fn check_revoke(&self, revoke: &RaceLogEvent) -> Result<(), RaceLogError> {
        let Some(target_id) = revoke.revoked_event_id() else {
            return Err(RaceLogError::NotRevokable(format!("{} is not a revoke event", revoke.id())));
        };
        let Some(target) = self.by_id.get(target_id) else {
            return Ok(());
        };
        if !target.is_revokable() {
            return Err(RaceLogError::NotRevokable(format!(
                "{} events are not revokable",
                target.event_type()
            )));
        }
        if !revoke.author().outranks_or_equals(target.author()) {
            return Err(RaceLogError::NotRevokable(format!(
                "author {} has insufficient priority to revoke {}",
                revoke.author(),
                target.id()
            )));
        }
        Ok(())
    }

    fn is_unrevoked(&self, event: &RaceLogEvent) -> bool {
        event.revoked_event_id().is_none() && !self.revoked.contains(event.id())
    }
}

/// The authoritative, append-mostly event record of one race.
///
/// Writers (`add`, `add_for_client`, `load`) may run on any number of threads;
/// each insertion is atomic. Read queries must run between
/// [`RaceLog::lock_for_read`] and [`RaceLog::unlock_after_read`] on the same
/// thread (or inside a [`ReadLock`] guard) and return copies, never live views.
/// Holding the read lock does not block writers.
///
/// Listeners are notified synchronously on the writer's thread. Writers that
/// notify are serialized from insertion through dispatch, so every listener
/// sees events in acceptance order. The internal state lock is released
/// before dispatch: a listener may query the log, register listeners, or add
/// further events from its callback.
pub struct RaceLog {
    id: String,
    state: RwLock<LogState>,
    readers: Mutex<HashMap<ThreadId, usize>>,
    dispatch: DispatchGate,
    listeners: ListenerRegistry,
    factory: EventFactory,
}

impl RaceLog {
    pub fn new(id: impl Into<String>) -> Self {
        Self::with_factory(id, EventFactory::default())
    }

    /// Log whose generated events (revocations) use `factory`.
    pub fn with_factory(id: impl Into<String>, factory: EventFactory) -> Self {
        Self {
            id: id.into(),
            state: RwLock::new(LogState {
                current_pass_id: DEFAULT_PASS_ID,
                ..LogState::default()
            }),
            readers: Mutex::new(HashMap::new()),
            dispatch: DispatchGate::default(),
            listeners: ListenerRegistry::new(),
            factory,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Inserts `event` unless it duplicates an accepted one, then notifies
    /// every registered listener. Returns whether the event was inserted.
    pub fn add(&self, event: EventRef) -> bool {
        let _dispatch = self.dispatch.enter();
        let listeners = {
            let mut state = self.write_state();
            if state.insert(&self.id, &event).is_none() {
                debug!(race_log = %self.id, event = %event, "duplicate event not added");
                return false;
            }
            // Taken under the write lock: listeners registered from now on
            // only see later events.
            self.listeners.snapshot()
        };
        trace!(race_log = %self.id, event = %event, "event added");
        self.notify_listeners(&event, &listeners);
        true
    }

    /// Adds `event`, then returns every other accepted event not yet
    /// delivered to `client` and marks all of them, plus `event`, delivered.
    pub fn add_for_client(&self, event: EventRef, client: ClientId) -> Vec<EventRef> {
        self.add(EventRef::clone(&event));
        let mut state = self.write_state();
        let suppressed = state.keys.get(&DedupKey::of(&event)).copied();
        let LogState { raw, delivery, .. } = &mut *state;
        delivery.deliver(client, raw.iter().map(|e| (e.seq, &e.event)), suppressed)
    }

    /// Undelivered events for `client`, marked delivered on return.
    pub fn get_events_to_deliver(&self, client: ClientId) -> Vec<EventRef> {
        let mut state = self.write_state();
        let LogState { raw, delivery, .. } = &mut *state;
        delivery.deliver(client, raw.iter().map(|e| (e.seq, &e.event)), None)
    }

    /// Bulk ingestion from storage or replication: same dedup as `add`, no
    /// listener calls, no cursor changes.
    pub fn load(&self, event: EventRef) -> bool {
        let mut state = self.write_state();
        let loaded = state.insert(&self.id, &event).is_some();
        if loaded {
            trace!(race_log = %self.id, event = %event, "event loaded");
        } else {
            debug!(race_log = %self.id, event = %event, "duplicate event not loaded");
        }
        loaded
    }

    /// Adds every raw fix of `other` this log does not already hold.
    /// Returns the number of events added.
    pub fn merge(&self, other: &RaceLog) -> usize {
        if std::ptr::eq(self, other) {
            return 0;
        }
        let incoming: Vec<EventRef> = other.read_state().raw.iter().map(|e| EventRef::clone(&e.event)).collect();
        incoming.into_iter().filter(|event| self.add(EventRef::clone(event))).count()
    }

    /// Creates, checks and adds a revocation of `target` in the current pass.
    pub fn revoke_event(
        &self,
        author: &AuthorRef,
        target: &RaceLogEvent,
        reason: Option<String>,
    ) -> Result<EventRef, RaceLogError> {
        let revoke = self.factory.revoke(author, self.current_pass_id(), target, reason);
        self.read_state().check_revoke(&revoke)?;
        self.add(EventRef::clone(&revoke));
        Ok(revoke)
    }

    /// Highest pass id accepted so far, or [`DEFAULT_PASS_ID`].
    pub fn current_pass_id(&self) -> PassId {
        self.read_state().current_pass_id
    }

    /// Acquires the shared read lock for the calling thread. Re-entrant.
    pub fn lock_for_read(&self) {
        let mut readers = self.readers.lock().unwrap_or_else(|e| e.into_inner());
        *readers.entry(thread::current().id()).or_insert(0) += 1;
    }

    /// Releases one hold of the read lock. Unpaired calls are a bug and
    /// report [`RaceLogError::NotLocked`].
    pub fn unlock_after_read(&self) -> Result<(), RaceLogError> {
        let mut readers = self.readers.lock().unwrap_or_else(|e| e.into_inner());
        let me = thread::current().id();
        let count = readers.get_mut(&me).ok_or(RaceLogError::NotLocked)?;
        *count -= 1;
        if *count == 0 {
            readers.remove(&me);
        }
        Ok(())
    }

    /// Scoped read lock released on drop.
    pub fn read(&self) -> ReadLock<'_> {
        self.lock_for_read();
        ReadLock {
            log: self,
            _not_send: PhantomData,
        }
    }

    pub fn holds_read_lock(&self) -> bool {
        self.readers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains_key(&thread::current().id())
    }

    /// All accepted events in acceptance order.
    pub fn get_raw_fixes(&self) -> Result<Vec<EventRef>, RaceLogError> {
        self.assert_read_lock()?;
        Ok(self.read_state().raw.iter().map(|e| EventRef::clone(&e.event)).collect())
    }

    /// All accepted events, most authoritative and most recent first.
    pub fn get_raw_fixes_descending(&self) -> Result<Vec<EventRef>, RaceLogError> {
        self.assert_read_lock()?;
        Ok(self
            .read_state()
            .sorted
            .iter()
            .rev()
            .map(|e| EventRef::clone(&e.event))
            .collect())
    }

    /// Current-pass events in ascending canonical order.
    pub fn get_fixes(&self) -> Result<Vec<EventRef>, RaceLogError> {
        self.assert_read_lock()?;
        let state = self.read_state();
        let pass = state.current_pass_id;
        Ok(state
            .sorted
            .iter()
            .filter(|e| e.event.pass_id() == pass)
            .map(|e| EventRef::clone(&e.event))
            .collect())
    }

    /// Current-pass events, most authoritative and most recent first.
    pub fn get_fixes_descending(&self) -> Result<Vec<EventRef>, RaceLogError> {
        let mut fixes = self.get_fixes()?;
        fixes.reverse();
        Ok(fixes)
    }

    /// Current-pass event with the smallest logical time point strictly after
    /// `time_point`; ties go to the event first in descending order.
    pub fn get_first_fix_after(&self, time_point: TimeMs) -> Result<Option<EventRef>, RaceLogError> {
        self.assert_read_lock()?;
        let state = self.read_state();
        let pass = state.current_pass_id;
        let mut best: Option<&EventRef> = None;
        for entry in state.sorted.iter().rev() {
            let event = &entry.event;
            if event.pass_id() != pass || event.logical_time_point() <= time_point {
                continue;
            }
            if best.is_none_or(|b| event.logical_time_point() < b.logical_time_point()) {
                best = Some(event);
            }
        }
        Ok(best.cloned())
    }

    /// Returns all raw fixes and marks them delivered to `client`.
    pub fn get_raw_fixes_for_client(&self, client: ClientId) -> Result<Vec<EventRef>, RaceLogError> {
        self.assert_read_lock()?;
        let mut state = self.write_state();
        let seqs: Vec<EntrySeq> = state.raw.iter().map(|e| e.seq).collect();
        state.delivery.mark_delivered(client, seqs);
        Ok(state.raw.iter().map(|e| EventRef::clone(&e.event)).collect())
    }

    /// Most recently accepted event carrying `id`.
    pub fn get_event_by_id(&self, id: &EventId) -> Result<Option<EventRef>, RaceLogError> {
        self.assert_read_lock()?;
        Ok(self.read_state().by_id.get(id).cloned())
    }

    /// Raw fixes without revocations and without revoked events, ascending.
    pub fn get_unrevoked_events(&self) -> Result<Vec<EventRef>, RaceLogError> {
        self.assert_read_lock()?;
        let state = self.read_state();
        Ok(state
            .sorted
            .iter()
            .filter(|e| state.is_unrevoked(&e.event))
            .map(|e| EventRef::clone(&e.event))
            .collect())
    }

    pub fn get_unrevoked_events_descending(&self) -> Result<Vec<EventRef>, RaceLogError> {
        let mut events = self.get_unrevoked_events()?;
        events.reverse();
        Ok(events)
    }

    pub fn is_revoked(&self, id: &EventId) -> Result<bool, RaceLogError> {
        self.assert_read_lock()?;
        Ok(self.read_state().revoked.contains(id))
    }

    pub fn is_empty(&self) -> Result<bool, RaceLogError> {
        self.assert_read_lock()?;
        Ok(self.read_state().raw.is_empty())
    }

    pub fn len(&self) -> Result<usize, RaceLogError> {
        self.assert_read_lock()?;
        Ok(self.read_state().raw.len())
    }

    pub fn add_listener(&self, listener: ListenerRef) -> bool {
        self.listeners.add(listener)
    }

    pub fn remove_listener(&self, listener: &ListenerRef) -> bool {
        self.listeners.remove(listener)
    }

    pub fn get_all_listeners(&self) -> Vec<ListenerRef> {
        self.listeners.snapshot()
    }

    pub fn remove_all_listeners(&self) -> Vec<ListenerRef> {
        self.listeners.remove_all()
    }

    pub fn add_all_listeners(&self, listeners: impl IntoIterator<Item = ListenerRef>) {
        self.listeners.add_all(listeners);
    }

    /// Drops every client delivery cursor, as a process restart does.
    pub fn reset_client_cursors(&self) {
        self.write_state().delivery.reset();
    }

    fn notify_listeners(&self, event: &RaceLogEvent, listeners: &[ListenerRef]) {
        for listener in listeners {
            if let Err(err) = event.accept(listener.as_ref()) {
                error!(race_log = %self.id, event = %event, error = %err, "listener failed");
            }
        }
    }

    fn assert_read_lock(&self) -> Result<(), RaceLogError> {
        if self.holds_read_lock() {
            Ok(())
        } else {
            Err(RaceLogError::NotLocked)
        }
    }

    fn read_state(&self) -> RwLockReadGuard<'_, LogState> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, LogState> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl std::fmt::Debug for RaceLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.read_state();
        f.debug_struct("RaceLog")
            .field("id", &self.id)
            .field("events", &state.raw.len())
            .field("current_pass_id", &state.current_pass_id)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

/// Read lock held for the lifetime of the guard on the creating thread.
pub struct ReadLock<'a> {
    log: &'a RaceLog,
    _not_send: PhantomData<*const ()>,
}

impl std::ops::Deref for ReadLock<'_> {
    type Target = RaceLog;

    fn deref(&self) -> &RaceLog {
        self.log
    }
}

impl Drop for ReadLock<'_> {
    fn drop(&mut self) {
        // Paired with the lock_for_read in RaceLog::read on this thread.
        let _ = self.log.unlock_after_read();
    }
}
