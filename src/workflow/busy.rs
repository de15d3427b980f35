//! Row-level single-flight lock.
//!
//! The busy table lives outside the replaceable purchase-order snapshot and
//! is keyed by PO id, so a poll overwrite never loses an in-flight marker.
//! While an id is held, every transition for that row is rejected, not just
//! the one in flight.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Clone, Default)]
pub struct BusyTable {
    inner: Arc<Mutex<HashSet<u64>>>,
}

impl BusyTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashSet<u64>> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Claims the row for one in-flight transition. Returns `None` when the
    /// row is already busy; the returned guard releases the row on drop, on
    /// every exit path.
    pub fn try_begin(&self, id: u64) -> Option<BusyGuard> {
        let mut held = self.lock();
        if held.insert(id) {
            Some(BusyGuard {
                table: self.clone(),
                id,
            })
        } else {
            None
        }
    }

    pub fn is_busy(&self, id: u64) -> bool {
        self.lock().contains(&id)
    }
}

#[derive(Debug)]
pub struct BusyGuard {
    table: BusyTable,
    id: u64,
}

impl BusyGuard {
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.table.lock().remove(&self.id);
    }
}
