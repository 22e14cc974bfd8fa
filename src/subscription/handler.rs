//! Type-erased callback adapters.
//!
//! Subscriptions for every event type live in one registry, so callbacks are
//! stored behind [`ErasedHandler`]. Each adapter is generated for a concrete
//! payload (and subscriber) type and downcasts at the boundary before calling
//! the user's typed closure.

use std::any::{type_name, Any};
use std::fmt;
use std::marker::PhantomData;
use tracing::warn;

/// A callback that accepts a type-erased subscriber and payload.
pub trait ErasedHandler: Send + Sync + 'static {
    /// Invoke the callback.
    ///
    /// `subscriber` is `None` for token subscriptions. A payload or
    /// subscriber of the wrong type is ignored.
    fn invoke(&self, subscriber: Option<&(dyn Any + Send + Sync)>, payload: &dyn Any);

    /// Get the handler name for debugging
    fn name(&self) -> &str;
}

/// Adapter for anonymous callbacks receiving only the payload.
pub struct PayloadHandler<P, F> {
    callback: F,
    name: String,
    _payload: PhantomData<fn(&P)>,
}

impl<P, F> PayloadHandler<P, F>
where
    P: 'static,
    F: Fn(&P) + Send + Sync + 'static,
{
    /// Create a new payload handler
    pub fn new(callback: F) -> Self {
        Self {
            callback,
            name: format!("PayloadHandler<{}>", type_name::<P>()),
            _payload: PhantomData,
        }
    }
}

impl<P, F> ErasedHandler for PayloadHandler<P, F>
where
    P: 'static,
    F: Fn(&P) + Send + Sync + 'static,
{
    fn invoke(&self, _subscriber: Option<&(dyn Any + Send + Sync)>, payload: &dyn Any) {
        match payload.downcast_ref::<P>() {
            Some(payload) => (self.callback)(payload),
            None => warn!(handler = %self.name, "Payload type mismatch, skipping"),
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl<P, F> fmt::Debug for PayloadHandler<P, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PayloadHandler").field("name", &self.name).finish()
    }
}

/// Adapter for callbacks bound to a subscriber object.
pub struct SubscriberHandler<S, P, F> {
    callback: F,
    name: String,
    _types: PhantomData<fn(&S, &P)>,
}

impl<S, P, F> SubscriberHandler<S, P, F>
where
    S: Send + Sync + 'static,
    P: 'static,
    F: Fn(&S, &P) + Send + Sync + 'static,
{
    /// Create a new subscriber handler
    pub fn new(callback: F) -> Self {
        Self {
            callback,
            name: format!(
                "SubscriberHandler<{}, {}>",
                type_name::<S>(),
                type_name::<P>()
            ),
            _types: PhantomData,
        }
    }
}

impl<S, P, F> ErasedHandler for SubscriberHandler<S, P, F>
where
    S: Send + Sync + 'static,
    P: 'static,
    F: Fn(&S, &P) + Send + Sync + 'static,
{
    fn invoke(&self, subscriber: Option<&(dyn Any + Send + Sync)>, payload: &dyn Any) {
        let subscriber = subscriber.and_then(|s| s.downcast_ref::<S>());
        match (subscriber, payload.downcast_ref::<P>()) {
            (Some(subscriber), Some(payload)) => (self.callback)(subscriber, payload),
            _ => warn!(handler = %self.name, "Subscriber or payload type mismatch, skipping"),
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl<S, P, F> fmt::Debug for SubscriberHandler<S, P, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriberHandler")
            .field("name", &self.name)
            .finish()
    }
}
