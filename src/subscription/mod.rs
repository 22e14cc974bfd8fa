//! Subscription identities and entries.
//!
//! Every entry in a bucket is keyed by a [`SubscriptionIdentity`]: either a
//! token handed back to the caller, or a weak reference to the subscriber
//! whose lifetime bounds the subscription.

use std::any::Any;
use std::fmt;
use std::sync::{Arc, Weak};

pub mod handler;
pub mod token;
pub mod weak;

pub use handler::{ErasedHandler, PayloadHandler, SubscriberHandler};
pub use token::{CounterTokenProvider, SubscriptionToken, TokenProvider, UuidTokenProvider};
pub use weak::WeakReference;

/// Type-erased subscriber object as stored in the registry
pub type AnySubscriber = dyn Any + Send + Sync;

/// How a subscription entry is keyed, and whether it is still alive.
#[derive(Clone, PartialEq, Eq, Hash)]
pub enum SubscriptionIdentity {
    /// Anonymous subscription, alive until removed with its token
    Token(SubscriptionToken),
    /// Subscription bound to the lifetime of a subscriber
    Subscriber(WeakReference<AnySubscriber>),
}

impl SubscriptionIdentity {
    /// Identity for an anonymous subscription
    pub fn token(token: SubscriptionToken) -> Self {
        SubscriptionIdentity::Token(token)
    }

    /// Identity bound to a live subscriber
    pub fn subscriber<S: Send + Sync + 'static>(subscriber: &Arc<S>) -> Self {
        let erased: Arc<AnySubscriber> = subscriber.clone();
        SubscriptionIdentity::Subscriber(WeakReference::new(&erased))
    }

    /// Identity bound to a weakly held subscriber.
    ///
    /// An empty `Weak` yields an identity that is invalid from the start.
    pub fn weak_subscriber<S: Send + Sync + 'static>(subscriber: Weak<S>) -> Self {
        let erased: Weak<AnySubscriber> = subscriber;
        SubscriptionIdentity::Subscriber(WeakReference::from_weak(erased))
    }

    /// Token identities are always valid; subscriber identities are valid
    /// while the subscriber is alive.
    pub fn is_valid(&self) -> bool {
        match self {
            SubscriptionIdentity::Token(_) => true,
            SubscriptionIdentity::Subscriber(weak) => weak.is_alive(),
        }
    }

    /// Whether this identity belongs to `subscriber`
    pub fn is_subscriber<S: Send + Sync + 'static>(&self, subscriber: &Arc<S>) -> bool {
        match self {
            SubscriptionIdentity::Token(_) => false,
            SubscriptionIdentity::Subscriber(weak) => {
                let erased: Arc<AnySubscriber> = subscriber.clone();
                weak.refers_to(&erased)
            }
        }
    }
}

impl fmt::Debug for SubscriptionIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubscriptionIdentity::Token(token) => f.debug_tuple("Token").field(token).finish(),
            SubscriptionIdentity::Subscriber(weak) => {
                f.debug_tuple("Subscriber").field(weak).finish()
            }
        }
    }
}

/// A registered callback together with its identity.
#[derive(Clone)]
pub struct Subscription {
    identity: SubscriptionIdentity,
    handler: Arc<dyn ErasedHandler>,
}

impl Subscription {
    /// Pair an identity with a handler
    pub fn new(identity: SubscriptionIdentity, handler: Arc<dyn ErasedHandler>) -> Self {
        Self { identity, handler }
    }

    /// The identity this subscription is keyed by
    pub fn identity(&self) -> &SubscriptionIdentity {
        &self.identity
    }

    /// Deliver `payload` to the callback.
    ///
    /// Returns `false` without calling anything when the subscriber has
    /// been released since the entry was read.
    pub fn deliver(&self, payload: &dyn Any) -> bool {
        match &self.identity {
            SubscriptionIdentity::Token(_) => {
                self.handler.invoke(None, payload);
                true
            }
            SubscriptionIdentity::Subscriber(weak) => match weak.resolve() {
                Some(subscriber) => {
                    self.handler.invoke(Some(&*subscriber), payload);
                    true
                }
                None => false,
            },
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("identity", &self.identity)
            .field("handler", &self.handler.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Listener {
        hits: AtomicUsize,
    }

    fn listener() -> Arc<Listener> {
        Arc::new(Listener {
            hits: AtomicUsize::new(0),
        })
    }

    fn counting_handler() -> Arc<dyn ErasedHandler> {
        Arc::new(SubscriberHandler::new(|listener: &Listener, _: &()| {
            listener.hits.fetch_add(1, Ordering::SeqCst);
        }))
    }

    #[test]
    fn test_token_identity_always_valid() {
        let identity = SubscriptionIdentity::token("7".into());
        assert!(identity.is_valid());
        assert_eq!(identity, SubscriptionIdentity::token("7".into()));
        assert_ne!(identity, SubscriptionIdentity::token("8".into()));
    }

    #[test]
    fn test_subscriber_identity_follows_lifetime() {
        let subscriber = listener();
        let identity = SubscriptionIdentity::subscriber(&subscriber);

        assert!(identity.is_valid());
        assert!(identity.is_subscriber(&subscriber));
        assert_eq!(identity, SubscriptionIdentity::subscriber(&subscriber));

        drop(subscriber);
        assert!(!identity.is_valid());
    }

    #[test]
    fn test_empty_weak_identity_is_invalid() {
        let identity = SubscriptionIdentity::weak_subscriber(Weak::<Listener>::new());
        assert!(!identity.is_valid());
        assert_ne!(
            identity,
            SubscriptionIdentity::weak_subscriber(Weak::<Listener>::new())
        );
    }

    #[test]
    fn test_dead_identities_do_not_overwrite_each_other() {
        let first = listener();
        let second = listener();
        let mut bucket = HashMap::new();
        bucket.insert(SubscriptionIdentity::subscriber(&first), 1);
        bucket.insert(SubscriptionIdentity::subscriber(&second), 2);
        drop(first);
        drop(second);

        bucket.insert(SubscriptionIdentity::weak_subscriber(Weak::<Listener>::new()), 3);
        assert_eq!(bucket.len(), 3);
        assert!(bucket.keys().all(|identity| !identity.is_valid()));
    }

    #[test]
    fn test_deliver_skips_released_subscriber() {
        let subscriber = listener();
        let subscription =
            Subscription::new(SubscriptionIdentity::subscriber(&subscriber), counting_handler());

        assert!(subscription.deliver(&()));
        assert_eq!(subscriber.hits.load(Ordering::SeqCst), 1);

        let weak = Arc::downgrade(&subscriber);
        drop(subscriber);
        assert!(!subscription.deliver(&()));
        assert!(weak.upgrade().is_none());
    }
}
