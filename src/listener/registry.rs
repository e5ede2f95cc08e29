use std::sync::{Arc, Mutex};

use super::visitor::RaceLogEventVisitor;

/// Shared listener handle; identity is the allocation, not the value.
pub type ListenerRef = Arc<dyn RaceLogEventVisitor>;

/// Listener set guarded by its own lock so callbacks may register or remove
/// listeners while a dispatch is in progress.
#[derive(Default)]
pub struct ListenerRegistry {
    listeners: Mutex<Vec<ListenerRef>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `listener` unless the same handle is already registered.
    pub fn add(&self, listener: ListenerRef) -> bool {
        let mut listeners = self.lock();
        if listeners.iter().any(|l| same_listener(l, &listener)) {
            return false;
        }
        listeners.push(listener);
        true
    }

    pub fn remove(&self, listener: &ListenerRef) -> bool {
        let mut listeners = self.lock();
        let before = listeners.len();
        listeners.retain(|l| !same_listener(l, listener));
        listeners.len() != before
    }

    /// Copy of the current listeners; later registrations do not affect it.
    pub fn snapshot(&self) -> Vec<ListenerRef> {
        self.lock().clone()
    }

    pub fn remove_all(&self) -> Vec<ListenerRef> {
        std::mem::take(&mut *self.lock())
    }

    pub fn add_all(&self, listeners: impl IntoIterator<Item = ListenerRef>) {
        for listener in listeners {
            self.add(listener);
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<ListenerRef>> {
        self.listeners.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn same_listener(a: &ListenerRef, b: &ListenerRef) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}
