//! Writer gate that keeps listener dispatch in acceptance order.

use std::{
    marker::PhantomData,
    sync::{Condvar, Mutex},
    thread::{self, ThreadId},
};

/// Re-entrant, per-thread gate held by a writer from insertion until every
/// listener has been notified.
///
/// Read queries and listener registration never touch the gate. A listener
/// that adds to the same log from its callback re-enters it on the writer's
/// thread; one that hands the add to another thread and waits for it
/// deadlocks.
#[derive(Debug, Default)]
pub(crate) struct DispatchGate {
    owner: Mutex<Option<(ThreadId, usize)>>,
    released: Condvar,
}

impl DispatchGate {
    pub(crate) fn enter(&self) -> DispatchGuard<'_> {
        let me = thread::current().id();
        let mut owner = self.owner.lock().unwrap_or_else(|e| e.into_inner());
        loop {
            match *owner {
                None => {
                    *owner = Some((me, 1));
                    break;
                }
                Some((id, ref mut depth)) if id == me => {
                    *depth += 1;
                    break;
                }
                Some(_) => {}
            }
            owner = self.released.wait(owner).unwrap_or_else(|e| e.into_inner());
        }
        DispatchGuard {
            gate: self,
            _not_send: PhantomData,
        }
    }

    fn leave(&self) {
        let mut owner = self.owner.lock().unwrap_or_else(|e| e.into_inner());
        if let Some((_, depth)) = owner.as_mut() {
            *depth -= 1;
            if *depth == 0 {
                *owner = None;
                self.released.notify_one();
            }
        }
    }
}

/// Releases one hold of the gate on drop, including during unwinding.
pub(crate) struct DispatchGuard<'a> {
    gate: &'a DispatchGate,
    _not_send: PhantomData<*const ()>,
}

impl Drop for DispatchGuard<'_> {
    fn drop(&mut self) {
        self.gate.leave();
    }
}
