//! Core event traits and types.
//!
//! This module defines the `Event` trait that every emitted type implements,
//! and the `EventTypeKey` used to route emissions to the right bucket.

pub mod key;

pub use key::EventTypeKey;

/// Core trait that all events must implement.
///
/// An event is a short-lived value carrying a fixed payload. Subscribers
/// receive a reference to the payload, never the event itself.
///
/// # Example
///
/// ```rust
/// use weak_events::Event;
///
/// struct UserRegistered {
///     email: String,
/// }
///
/// impl Event for UserRegistered {
///     type Payload = String;
///
///     fn payload(&self) -> &String {
///         &self.email
///     }
/// }
/// ```
pub trait Event: 'static {
    /// The value handed to subscribers on emission.
    type Payload: 'static;

    /// Borrow the payload carried by this event instance.
    fn payload(&self) -> &Self::Payload;

    /// Returns the type name of this event.
    ///
    /// This is used for logging only; routing goes through [`Event::key`].
    fn event_type() -> &'static str
    where
        Self: Sized,
    {
        std::any::type_name::<Self>()
    }

    /// Get the routing key for this event type.
    fn key() -> EventTypeKey
    where
        Self: Sized,
    {
        EventTypeKey::of::<Self>()
    }
}

/// Declare an event type carrying a single payload value.
///
/// The generated struct has a public `payload` field, a `new` constructor
/// and an [`Event`] implementation.
///
/// ```rust
/// weak_events::declare_event! {
///     /// Sent when someone says hello.
///     #[derive(Debug, Clone)]
///     pub struct Greeting(String);
/// }
///
/// let greeting = Greeting::new("hi".to_string());
/// assert_eq!(greeting.payload, "hi");
/// ```
#[macro_export]
macro_rules! declare_event {
    ($(#[$meta:meta])* $vis:vis struct $name:ident($payload:ty);) => {
        $(#[$meta])*
        $vis struct $name {
            /// The value delivered to subscribers.
            pub payload: $payload,
        }

        impl $name {
            /// Create a new event instance.
            #[allow(dead_code)]
            pub fn new(payload: $payload) -> Self {
                Self { payload }
            }
        }

        impl $crate::Event for $name {
            type Payload = $payload;

            fn payload(&self) -> &$payload {
                &self.payload
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    crate::declare_event! {
        #[derive(Debug, Clone)]
        struct Ping(u32);
    }

    mod other {
        crate::declare_event! {
            pub(super) struct Ping(u32);
        }
    }

    #[test]
    fn test_payload_access() {
        let ping = Ping::new(7);
        assert_eq!(*ping.payload(), 7);
    }

    #[test]
    fn test_key_is_stable() {
        assert_eq!(Ping::key(), Ping::key());
    }

    #[test]
    fn test_same_short_name_different_keys() {
        assert_ne!(Ping::key(), other::Ping::key());
        assert!(Ping::event_type().ends_with("Ping"));
        assert!(other::Ping::event_type().contains("other"));
    }
}
