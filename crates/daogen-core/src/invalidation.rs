// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Table invalidation fan-out.
//!
//! Reactive queries register an [`Observer`] for the tables their statement
//! reads. Every published write names the tables it touched; observers whose
//! set intersects it receive the intersection. Table names compare
//! case-insensitively.
//!
//! Dropping an [`Observer`] unregisters it.

use std::{
    collections::{BTreeSet, HashMap},
    sync::{
        Arc, Mutex, MutexGuard, PoisonError, Weak,
        atomic::{AtomicU64, Ordering}
    }
};

use tokio::sync::mpsc;
use tracing::{debug, trace};

struct Registration {
    tables: BTreeSet<String>,
    sender: mpsc::UnboundedSender<Vec<String>>
}

#[derive(Default)]
struct TrackerInner {
    next_id:   AtomicU64,
    observers: Mutex<HashMap<u64, Registration>>
}

impl TrackerInner {
    fn lock(&self) -> MutexGuard<'_, HashMap<u64, Registration>> {
        self.observers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Registry of table observers.
///
/// Cloning shares the registry.
///
/// # Example
///
/// ```rust
/// use daogen_core::InvalidationTracker;
///
/// # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
/// let tracker = InvalidationTracker::new();
/// let mut observer = tracker.observe(["users"]);
///
/// tracker.notify(["Users", "orders"]);
/// assert_eq!(observer.changed().await, Some(vec!["users".to_owned()]));
/// # });
/// ```
#[derive(Clone, Default)]
pub struct InvalidationTracker {
    inner: Arc<TrackerInner>
}

impl InvalidationTracker {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an observer for `tables`.
    pub fn observe<I, S>(&self, tables: I) -> Observer
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>
    {
        let tables: BTreeSet<String> = tables
            .into_iter()
            .map(|t| t.as_ref().to_ascii_lowercase())
            .collect();
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let (sender, receiver) = mpsc::unbounded_channel();
        debug!(id, tables = ?tables, "observer registered");
        self.inner.lock().insert(
            id,
            Registration {
                tables,
                sender
            }
        );
        Observer {
            id,
            receiver,
            tracker: Arc::downgrade(&self.inner)
        }
    }

    /// Publish that `tables` were written.
    pub fn notify<I, S>(&self, tables: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>
    {
        let changed: BTreeSet<String> = tables
            .into_iter()
            .map(|t| t.as_ref().to_ascii_lowercase())
            .collect();
        if changed.is_empty() {
            return;
        }

        let mut observers = self.inner.lock();
        let mut delivered = 0_usize;
        observers.retain(|_, registration| {
            let hit: Vec<String> = registration
                .tables
                .intersection(&changed)
                .cloned()
                .collect();
            if hit.is_empty() {
                return true;
            }
            delivered += 1;
            registration.sender.send(hit).is_ok()
        });
        trace!(tables = ?changed, delivered, "invalidation published");
    }

    /// Number of live observers.
    pub fn observer_count(&self) -> usize {
        self.inner.lock().len()
    }
}

/// Receives invalidations for one table set.
pub struct Observer {
    id:       u64,
    receiver: mpsc::UnboundedReceiver<Vec<String>>,
    tracker:  Weak<TrackerInner>
}

impl Observer {
    /// Wait for the next invalidation.
    ///
    /// Notifications that queued up meanwhile are coalesced into one set.
    /// Returns `None` once the tracker is gone.
    pub async fn changed(&mut self) -> Option<Vec<String>> {
        let first = self.receiver.recv().await?;
        let mut tables: BTreeSet<String> = first.into_iter().collect();
        while let Ok(more) = self.receiver.try_recv() {
            tables.extend(more);
        }
        Some(tables.into_iter().collect())
    }

    /// Discard pending notifications. Returns `true` if any were queued.
    pub fn drain(&mut self) -> bool {
        let mut any = false;
        while self.receiver.try_recv().is_ok() {
            any = true;
        }
        any
    }
}

impl Drop for Observer {
    fn drop(&mut self) {
        if let Some(tracker) = self.tracker.upgrade() {
            tracker.lock().remove(&self.id);
            debug!(id = self.id, "observer unregistered");
        }
    }
}
