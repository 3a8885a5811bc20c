//! # Snapshot slot
//!
//! Single slot, latest-wins cell shared between the control loop and the visualisation thread.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Condvar, Mutex, MutexGuard,
    },
    time::Duration,
};

use super::Snapshot;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Cloning the slot gives another handle to the same cell.
#[derive(Clone, Default)]
pub struct SnapshotSlot {
    inner: Arc<SlotInner>,
}

#[derive(Default)]
struct SlotInner {
    current: Mutex<Option<Snapshot>>,

    published: Condvar,

    num_published: AtomicU64,

    num_overwritten: AtomicU64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl SnapshotSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish a snapshot, replacing any snapshot which hasn't been taken yet.
    ///
    /// Only waits for the slot lock, which is never held while rendering.
    pub fn publish(&self, snapshot: Snapshot) {
        let replaced = self.replace(snapshot);

        self.inner.published.notify_one();

        // Frame buffers of a replaced snapshot are freed here, outside the lock
        drop(replaced);
    }

    /// Take the current snapshot, leaving the slot empty.
    pub fn take(&self) -> Option<Snapshot> {
        self.lock().take()
    }

    /// Take the current snapshot, waiting up to `timeout` for one to be published.
    pub fn wait_take(&self, timeout: Duration) -> Option<Snapshot> {
        let current = self.lock();

        let mut current = if current.is_none() {
            match self.inner.published.wait_timeout(current, timeout) {
                Ok((guard, _)) => guard,
                Err(poisoned) => poisoned.into_inner().0,
            }
        } else {
            current
        };

        current.take()
    }

    /// Number of snapshots published so far.
    pub fn num_published(&self) -> u64 {
        self.inner.num_published.load(Ordering::Relaxed)
    }

    /// Number of snapshots replaced before they were taken.
    pub fn num_overwritten(&self) -> u64 {
        self.inner.num_overwritten.load(Ordering::Relaxed)
    }

    /// Swap in a new snapshot, returning the one it replaced once the lock is released.
    fn replace(&self, snapshot: Snapshot) -> Option<Snapshot> {
        let replaced = self.lock().replace(snapshot);

        if replaced.is_some() {
            self.inner.num_overwritten.fetch_add(1, Ordering::Relaxed);
        }
        self.inner.num_published.fetch_add(1, Ordering::Relaxed);

        replaced
    }

    fn lock(&self) -> MutexGuard<Option<Snapshot>> {
        // A panic while holding the lock can't leave the slot half written, so carry on
        match self.inner.current.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
