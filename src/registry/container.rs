//! A keyed collection that sweeps out stale entries on a timer.

use crate::policy::CleanFrequencyPolicy;
use crate::scheduler::PurgeScheduler;
use parking_lot::{Mutex, RwLock, RwLockWriteGuard};
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::trace;

/// Staleness predicate deciding which entries a purge removes
pub type StalePredicate<K, V> = dyn Fn(&K, &V) -> bool + Send + Sync;

struct Shared<K, V> {
    entries: RwLock<HashMap<K, V>>,
    is_stale: Box<StalePredicate<K, V>>,
}

impl<K: Eq + Hash, V> Shared<K, V> {
    /// Move stale entries out of `entries` and hand them back to the caller.
    fn extract_stale(&self, entries: &mut HashMap<K, V>) -> Vec<(K, V)> {
        if !entries.iter().any(|(key, value)| (self.is_stale)(key, value)) {
            return Vec::new();
        }
        let (stale, live): (Vec<_>, Vec<_>) = entries
            .drain()
            .partition(|(key, value)| (self.is_stale)(key, value));
        entries.extend(live);
        stale
    }

    /// Purge under the write lock and report `(evicted, remaining)`.
    ///
    /// The lock is released before returning, so dropping the evicted
    /// entries never runs under it.
    fn purge(&self) -> (Vec<(K, V)>, usize) {
        let mut entries = self.entries.write();
        let evicted = self.extract_stale(&mut entries);
        (evicted, entries.len())
    }
}

/// Thread-safe `HashMap` with background purging of stale entries.
///
/// Mutations, purges and timer ticks take the write lock; reads share the
/// read lock. The timer holds only a weak handle to the entries and is
/// aborted when the container is dropped.
///
/// Purged entries are always dropped after the lock is released, so their
/// destructors may use whatever owns the container.
pub struct PeriodicPurgingContainer<K, V> {
    shared: Arc<Shared<K, V>>,
    timer: Mutex<Option<JoinHandle<()>>>,
}

impl<K, V> PeriodicPurgingContainer<K, V>
where
    K: Eq + Hash + Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    /// Create a container seeded with `initial`, purging entries for which
    /// `is_stale` returns true.
    pub fn new<P>(initial: HashMap<K, V>, is_stale: P) -> Self
    where
        P: Fn(&K, &V) -> bool + Send + Sync + 'static,
    {
        Self {
            shared: Arc::new(Shared {
                entries: RwLock::new(initial),
                is_stale: Box::new(is_stale),
            }),
            timer: Mutex::new(None),
        }
    }

    /// Start the purge timer, replacing any timer already running.
    ///
    /// The first sweep happens after `policy.interval(len)`; each sweep
    /// re-arms the timer from the number of entries it left behind.
    pub fn start(&self, scheduler: &PurgeScheduler, policy: Arc<dyn CleanFrequencyPolicy>) {
        let weak = Arc::downgrade(&self.shared);
        let mut delay = policy.interval(self.len());

        let task = scheduler.spawn(async move {
            loop {
                tokio::time::sleep(delay).await;

                let Some(shared) = weak.upgrade() else {
                    break;
                };
                let (evicted, remaining) = shared.purge();
                trace!(removed = evicted.len(), remaining, "Periodic purge");
                drop(evicted);

                delay = policy.interval(remaining);
            }
        });

        if let Some(previous) = self.timer.lock().replace(task) {
            previous.abort();
        }
    }

    /// Stop the purge timer if it is running
    pub fn stop(&self) {
        if let Some(task) = self.timer.lock().take() {
            task.abort();
        }
    }

    /// Whether a purge timer is currently running
    pub fn is_running(&self) -> bool {
        self.timer
            .lock()
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }

    /// Run `f` with exclusive access to the entries
    pub fn mutate<R>(&self, f: impl FnOnce(&mut HashMap<K, V>) -> R) -> R {
        f(&mut self.shared.entries.write())
    }

    /// Run `f` with shared access to the entries, without purging
    pub fn read<R>(&self, f: impl FnOnce(&HashMap<K, V>) -> R) -> R {
        f(&self.shared.entries.read())
    }

    /// Remove stale entries now, returning how many were removed
    pub fn clean(&self) -> usize {
        self.drain_stale().len()
    }

    /// Remove stale entries now and hand them to the caller
    pub fn drain_stale(&self) -> Vec<(K, V)> {
        self.shared.purge().0
    }

    /// Number of entries, stale ones included
    pub fn len(&self) -> usize {
        self.shared.entries.read().len()
    }

    /// Whether the container holds no entries
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K, V> PeriodicPurgingContainer<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Purge, then copy the surviving entries.
    ///
    /// The write lock taken for the purge is downgraded for the copy, so no
    /// writer can slip in between and the copy never contains stale entries
    /// as of the moment it was taken.
    pub fn snapshot(&self) -> HashMap<K, V> {
        self.purge_and_snapshot().0
    }

    /// Like [`snapshot`](Self::snapshot), but also hands back the entries
    /// the purge removed instead of dropping them.
    pub fn purge_and_snapshot(&self) -> (HashMap<K, V>, Vec<(K, V)>) {
        let mut entries = self.shared.entries.write();
        let evicted = self.shared.extract_stale(&mut entries);
        if !evicted.is_empty() {
            trace!(removed = evicted.len(), "Purged before snapshot");
        }
        let entries = RwLockWriteGuard::downgrade(entries);
        (entries.clone(), evicted)
    }
}

impl<K, V> Drop for PeriodicPurgingContainer<K, V> {
    fn drop(&mut self) {
        if let Some(task) = self.timer.get_mut().take() {
            task.abort();
        }
    }
}

impl<K, V> fmt::Debug for PeriodicPurgingContainer<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PeriodicPurgingContainer")
            .field("len", &self.shared.entries.read().len())
            .field("timer", &self.timer.lock().is_some())
            .finish()
    }
}
