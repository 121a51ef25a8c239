use std::collections::HashSet;

use parking_lot::{Condvar, Mutex};

use super::domain::ApplicationId;

/// Per-id exclusion for read-validate-write sequences.
///
/// Only operations on the same id wait for each other; the shared set is held just
/// long enough to mark or clear an id.
#[derive(Debug, Default)]
pub struct IdLocks {
    held: Mutex<HashSet<ApplicationId>>,
    released: Condvar,
}

impl IdLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Block until `id` is free, then hold it until the guard drops.
    pub fn acquire(&self, id: ApplicationId) -> IdGuard<'_> {
        let mut held = self.held.lock();
        while held.contains(&id) {
            self.released.wait(&mut held);
        }
        held.insert(id);
        IdGuard { locks: self, id }
    }

    /// Number of ids currently held.
    pub fn held(&self) -> usize {
        self.held.lock().len()
    }
}

#[must_use = "the id is released as soon as the guard is dropped"]
pub struct IdGuard<'a> {
    locks: &'a IdLocks,
    id: ApplicationId,
}

impl Drop for IdGuard<'_> {
    fn drop(&mut self) {
        self.locks.held.lock().remove(&self.id);
        self.locks.released.notify_all();
    }
}
