//! Event registry for mapping event types to their subscriptions.
//!
//! The registry owns one [`PeriodicPurgingContainer`] per event type. The map
//! of buckets sits behind a single reader/writer lock: subscribing and
//! unsubscribing are writers, emission lookups and snapshots are readers.
//! Lock order is always registry, then bucket. Entries taken out of a bucket
//! are dropped only after both locks are released.

use crate::event::EventTypeKey;
use crate::policy::CleanFrequencyPolicy;
use crate::scheduler::PurgeScheduler;
use crate::subscription::{Subscription, SubscriptionIdentity};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};

pub mod container;
pub use container::PeriodicPurgingContainer;

/// The subscriptions for one event type
pub type Bucket = PeriodicPurgingContainer<SubscriptionIdentity, Subscription>;

/// Registry of buckets keyed by event type.
pub struct Registry {
    buckets: RwLock<HashMap<EventTypeKey, Bucket>>,
    scheduler: PurgeScheduler,
    policy: Arc<dyn CleanFrequencyPolicy>,
}

impl Registry {
    /// Create an empty registry whose buckets purge on `scheduler`
    pub fn new(scheduler: PurgeScheduler, policy: Arc<dyn CleanFrequencyPolicy>) -> Self {
        Self {
            buckets: RwLock::new(HashMap::new()),
            scheduler,
            policy,
        }
    }

    fn new_bucket(&self) -> Bucket {
        let bucket = Bucket::new(HashMap::new(), |identity, _| !identity.is_valid());
        bucket.start(&self.scheduler, self.policy.clone());
        bucket
    }

    /// Insert a subscription, replacing any entry with the same identity.
    ///
    /// Creates and starts the bucket on first use. Returns true when an
    /// existing entry was replaced.
    pub fn insert(&self, key: EventTypeKey, subscription: Subscription) -> bool {
        let identity = subscription.identity().clone();
        let previous = {
            let mut buckets = self.buckets.write();
            let bucket = buckets.entry(key).or_insert_with(|| {
                debug!(event_type = %key, "Creating bucket");
                self.new_bucket()
            });
            bucket.mutate(|entries| entries.insert(identity, subscription))
        };

        let replaced = previous.is_some();
        trace!(event_type = %key, replaced, "Subscription registered");
        replaced
    }

    /// Remove one entry from one bucket. Returns whether it existed.
    pub fn remove(&self, key: EventTypeKey, identity: &SubscriptionIdentity) -> bool {
        let evicted = {
            let buckets = self.buckets.write();
            buckets
                .get(&key)
                .and_then(|bucket| bucket.mutate(|entries| entries.remove(identity)))
        };

        let removed = evicted.is_some();
        trace!(event_type = %key, removed, "Subscription removal");
        removed
    }

    /// Remove an identity from every bucket. Returns how many entries went.
    pub fn remove_everywhere(&self, identity: &SubscriptionIdentity) -> usize {
        let evicted: Vec<Subscription> = {
            let buckets = self.buckets.write();
            buckets
                .values()
                .filter_map(|bucket| bucket.mutate(|entries| entries.remove(identity)))
                .collect()
        };

        trace!(removed = evicted.len(), "Identity removed from all buckets");
        evicted.len()
    }

    /// Purge and copy the live subscriptions for `key`.
    ///
    /// Returns `None` when no bucket exists for the event type.
    pub fn snapshot(&self, key: EventTypeKey) -> Option<Vec<Subscription>> {
        let buckets = self.buckets.read();
        let (live, evicted) = buckets.get(&key)?.purge_and_snapshot();
        drop(buckets);
        drop(evicted);
        Some(live.into_values().collect())
    }

    /// Purge every bucket and drop the ones left empty.
    ///
    /// Returns how many entries were removed.
    pub fn clean(&self) -> usize {
        let (evicted, buckets_dropped) = {
            let mut buckets = self.buckets.write();
            let evicted: Vec<_> = buckets.values().flat_map(Bucket::drain_stale).collect();
            let before = buckets.len();
            buckets.retain(|_, bucket| !bucket.is_empty());
            (evicted, before - buckets.len())
        };

        let removed = evicted.len();
        debug!(removed, buckets_dropped, "Registry cleaned");
        drop(evicted);
        removed
    }

    /// Number of live entries for `key`
    pub fn subscription_count(&self, key: EventTypeKey) -> usize {
        self.buckets.read().get(&key).map_or(0, live_entries)
    }

    /// Number of live entries across all buckets
    pub fn total_subscriptions(&self) -> usize {
        self.buckets.read().values().map(live_entries).sum()
    }

    /// Event types that currently have a bucket
    pub fn event_types(&self) -> Vec<EventTypeKey> {
        self.buckets.read().keys().copied().collect()
    }

    /// Current registry statistics
    pub fn stats(&self) -> RegistryStats {
        let buckets = self.buckets.read();
        let mut stats = RegistryStats {
            event_types: buckets.len(),
            ..RegistryStats::default()
        };

        for bucket in buckets.values() {
            bucket.read(|entries| {
                let live = entries.keys().filter(|identity| identity.is_valid()).count();
                stats.live_subscriptions += live;
                stats.stale_subscriptions += entries.len() - live;
            });
        }
        stats
    }
}

fn live_entries(bucket: &Bucket) -> usize {
    bucket.read(|entries| entries.keys().filter(|identity| identity.is_valid()).count())
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("buckets", &*self.buckets.read())
            .field("scheduler", &self.scheduler)
            .finish()
    }
}

/// Registry statistics for monitoring
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegistryStats {
    /// Number of event types with a bucket
    pub event_types: usize,

    /// Entries whose identity is still valid
    pub live_subscriptions: usize,

    /// Entries waiting for a purge
    pub stale_subscriptions: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subscription::{PayloadHandler, SubscriberHandler, SubscriptionToken};
    use std::time::Duration;

    struct TestEvent;
    struct AnotherEvent;

    fn registry() -> Registry {
        let scheduler = PurgeScheduler::owned().unwrap();
        Registry::new(scheduler, Arc::new(|_: usize| Duration::from_secs(60)))
    }

    fn token_subscription(token: &str) -> Subscription {
        Subscription::new(
            SubscriptionIdentity::token(SubscriptionToken::from(token)),
            Arc::new(PayloadHandler::new(|_: &()| {})),
        )
    }

    fn subscriber_subscription(subscriber: &Arc<String>) -> Subscription {
        Subscription::new(
            SubscriptionIdentity::subscriber(subscriber),
            Arc::new(SubscriberHandler::new(|_: &String, _: &()| {})),
        )
    }

    #[test]
    fn test_register_and_snapshot() {
        let registry = registry();
        assert!(registry.snapshot(EventTypeKey::of::<TestEvent>()).is_none());

        registry.insert(EventTypeKey::of::<TestEvent>(), token_subscription("1"));
        registry.insert(EventTypeKey::of::<TestEvent>(), token_subscription("2"));

        let subs = registry.snapshot(EventTypeKey::of::<TestEvent>()).unwrap();
        assert_eq!(subs.len(), 2);
        assert!(registry.snapshot(EventTypeKey::of::<AnotherEvent>()).is_none());
    }

    #[test]
    fn test_insert_replaces_same_identity() {
        let registry = registry();
        let subscriber = Arc::new("s".to_string());

        assert!(!registry.insert(EventTypeKey::of::<TestEvent>(), subscriber_subscription(&subscriber)));
        assert!(registry.insert(EventTypeKey::of::<TestEvent>(), subscriber_subscription(&subscriber)));
        assert_eq!(registry.subscription_count(EventTypeKey::of::<TestEvent>()), 1);
    }

    #[test]
    fn test_remove_only_touches_one_bucket() {
        let registry = registry();
        let subscriber = Arc::new("s".to_string());
        registry.insert(EventTypeKey::of::<TestEvent>(), subscriber_subscription(&subscriber));
        registry.insert(EventTypeKey::of::<AnotherEvent>(), subscriber_subscription(&subscriber));

        let identity = SubscriptionIdentity::subscriber(&subscriber);
        assert!(registry.remove(EventTypeKey::of::<TestEvent>(), &identity));
        assert!(!registry.remove(EventTypeKey::of::<TestEvent>(), &identity));

        assert_eq!(registry.subscription_count(EventTypeKey::of::<TestEvent>()), 0);
        assert_eq!(registry.subscription_count(EventTypeKey::of::<AnotherEvent>()), 1);
    }

    #[test]
    fn test_remove_everywhere() {
        let registry = registry();
        let subscriber = Arc::new("s".to_string());
        registry.insert(EventTypeKey::of::<TestEvent>(), subscriber_subscription(&subscriber));
        registry.insert(EventTypeKey::of::<AnotherEvent>(), subscriber_subscription(&subscriber));
        registry.insert(EventTypeKey::of::<AnotherEvent>(), token_subscription("1"));

        let identity = SubscriptionIdentity::subscriber(&subscriber);
        assert_eq!(registry.remove_everywhere(&identity), 2);
        assert_eq!(registry.total_subscriptions(), 1);
        assert_eq!(registry.event_types().len(), 2);
    }

    #[test]
    fn test_clean_drops_empty_buckets() {
        let registry = registry();
        let subscriber = Arc::new("s".to_string());
        registry.insert(EventTypeKey::of::<TestEvent>(), subscriber_subscription(&subscriber));
        registry.insert(EventTypeKey::of::<AnotherEvent>(), token_subscription("1"));

        drop(subscriber);
        assert_eq!(
            registry.stats(),
            RegistryStats {
                event_types: 2,
                live_subscriptions: 1,
                stale_subscriptions: 1,
            }
        );

        assert_eq!(registry.clean(), 1);
        assert_eq!(registry.event_types(), vec![EventTypeKey::of::<AnotherEvent>()]);
    }
}
