//! The main EventBus implementation.
//!
//! The EventBus is the primary interface for subscribing to and emitting
//! events. Emission is synchronous: callbacks run on the emitting thread,
//! outside every lock, before `emit` returns.

use crate::event::Event;
use crate::registry::Registry;
use crate::subscription::{
    PayloadHandler, SubscriberHandler, Subscription, SubscriptionIdentity, SubscriptionToken,
};
use crate::Result;
use std::any::Any;
use std::fmt;
use std::sync::{Arc, Weak};
use tracing::{debug, trace};

pub mod builder;
pub mod config;

pub use builder::EventBusBuilder;
pub use config::EventBusConfig;

/// A type-safe, thread-safe, in-process event bus.
///
/// Subscriptions are either anonymous, identified by a
/// [`SubscriptionToken`], or bound to a subscriber held through a weak
/// reference. A subscriber that is dropped stops receiving events at once
/// and its entries are purged in the background.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use weak_events::{declare_event, EventBus};
///
/// declare_event! {
///     pub struct Greeting(String);
/// }
///
/// struct Screen;
///
/// let bus = EventBus::new()?;
/// let screen = Arc::new(Screen);
///
/// let token = bus.on::<Greeting>(|text| println!("anonymous: {text}"));
/// bus.on_subscriber::<Greeting, _>(&screen, |_screen, text| println!("screen: {text}"));
///
/// assert_eq!(bus.emit(Greeting::new("hi".into())), 2);
///
/// bus.off_token::<Greeting>(&token);
/// drop(screen);
/// assert_eq!(bus.emit(Greeting::new("bye".into())), 0);
/// # Ok::<(), weak_events::Error>(())
/// ```
pub struct EventBus {
    pub(crate) registry: Registry,
    pub(crate) config: EventBusConfig,
}

impl EventBus {
    /// Create a new EventBus builder
    pub fn builder() -> EventBusBuilder {
        EventBusBuilder::new()
    }

    /// Create a bus with the default configuration
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    /// Create a bus from an explicit configuration
    pub fn with_config(config: EventBusConfig) -> Result<Self> {
        Self::builder().config(config).build()
    }

    /// The configuration this bus was built with
    pub fn config(&self) -> &EventBusConfig {
        &self.config
    }

    /// Subscribe an anonymous callback to events of type `E`.
    ///
    /// Every call adds a new subscription. Keep the returned token to remove
    /// it with [`off_token`](Self::off_token).
    pub fn on<E: Event>(
        &self,
        callback: impl Fn(&E::Payload) + Send + Sync + 'static,
    ) -> SubscriptionToken {
        let token = self.config.token_provider.next_token();

        debug!(event_type = E::event_type(), token = %token, "Subscribing anonymous callback");

        let subscription = Subscription::new(
            SubscriptionIdentity::token(token.clone()),
            Arc::new(PayloadHandler::<E::Payload, _>::new(callback)),
        );
        self.registry.insert(E::key(), subscription);
        token
    }

    /// Subscribe `subscriber` to events of type `E`.
    ///
    /// The bus holds the subscriber weakly. Subscribing the same subscriber
    /// to the same event type again replaces the previous callback.
    pub fn on_subscriber<E, S>(
        &self,
        subscriber: &Arc<S>,
        callback: impl Fn(&S, &E::Payload) + Send + Sync + 'static,
    ) where
        E: Event,
        S: Send + Sync + 'static,
    {
        self.subscribe_identity::<E, S>(SubscriptionIdentity::subscriber(subscriber), callback);
    }

    /// Subscribe a weakly held subscriber to events of type `E`.
    ///
    /// A `Weak` whose subscriber is already gone is accepted: the entry never
    /// fires and is removed by the next purge.
    pub fn on_weak<E, S>(
        &self,
        subscriber: Weak<S>,
        callback: impl Fn(&S, &E::Payload) + Send + Sync + 'static,
    ) where
        E: Event,
        S: Send + Sync + 'static,
    {
        self.subscribe_identity::<E, S>(SubscriptionIdentity::weak_subscriber(subscriber), callback);
    }

    fn subscribe_identity<E, S>(
        &self,
        identity: SubscriptionIdentity,
        callback: impl Fn(&S, &E::Payload) + Send + Sync + 'static,
    ) where
        E: Event,
        S: Send + Sync + 'static,
    {
        let handler = SubscriberHandler::<S, E::Payload, _>::new(callback);
        let subscription = Subscription::new(identity, Arc::new(handler));
        let replaced = self.registry.insert(E::key(), subscription);

        debug!(event_type = E::event_type(), replaced, "Subscribed subscriber callback");
    }

    /// Remove `subscriber`'s subscription to events of type `E`.
    ///
    /// Returns whether a subscription was removed.
    pub fn off<E, S>(&self, subscriber: &Arc<S>) -> bool
    where
        E: Event,
        S: Send + Sync + 'static,
    {
        self.registry
            .remove(E::key(), &SubscriptionIdentity::subscriber(subscriber))
    }

    /// Remove the anonymous subscription identified by `token` from events
    /// of type `E`.
    ///
    /// Returns whether a subscription was removed.
    pub fn off_token<E: Event>(&self, token: &SubscriptionToken) -> bool {
        self.registry
            .remove(E::key(), &SubscriptionIdentity::token(token.clone()))
    }

    /// Remove `subscriber` from every event type.
    ///
    /// Returns how many subscriptions were removed.
    pub fn reset<S: Send + Sync + 'static>(&self, subscriber: &Arc<S>) -> usize {
        let removed = self
            .registry
            .remove_everywhere(&SubscriptionIdentity::subscriber(subscriber));

        debug!(removed, "Subscriber reset");
        removed
    }

    /// Deliver `event` to every live subscription for its type.
    ///
    /// Callbacks run synchronously on the calling thread, in no particular
    /// order, with no lock held; they may subscribe or unsubscribe. Returns
    /// the number of callbacks invoked.
    pub fn emit<E: Event>(&self, event: E) -> usize {
        let Some(subscriptions) = self.registry.snapshot(E::key()) else {
            trace!(event_type = E::event_type(), "No bucket for event type");
            return 0;
        };

        let payload: &dyn Any = event.payload();
        let delivered = subscriptions
            .iter()
            .filter(|subscription| subscription.deliver(payload))
            .count();

        trace!(
            event_type = E::event_type(),
            snapshot = subscriptions.len(),
            delivered,
            "Event emitted"
        );
        delivered
    }

    /// Number of live subscriptions to events of type `E`
    pub fn subscriber_count<E: Event>(&self) -> usize {
        self.registry.subscription_count(E::key())
    }

    /// Purge every bucket now and drop buckets left empty.
    ///
    /// Returns how many subscriptions were removed.
    pub fn clean(&self) -> usize {
        self.registry.clean()
    }

    /// Get statistics about the event bus
    pub fn stats(&self) -> EventBusStats {
        let stats = self.registry.stats();
        EventBusStats {
            event_types: stats.event_types,
            total_subscriptions: stats.live_subscriptions,
            stale_subscriptions: stats.stale_subscriptions,
        }
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("registry", &self.registry)
            .field("config", &self.config)
            .finish()
    }
}

/// Statistics about the event bus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventBusStats {
    /// Number of event types with a bucket
    pub event_types: usize,

    /// Live subscriptions across all event types
    pub total_subscriptions: usize,

    /// Subscriptions whose subscriber is gone, awaiting a purge
    pub stale_subscriptions: usize,
}

impl fmt::Display for EventBusStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "EventBus Stats: {} subscriptions, {} event types, {} awaiting purge",
            self.total_subscriptions, self.event_types, self.stale_subscriptions
        )
    }
}
