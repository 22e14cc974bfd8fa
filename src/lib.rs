//! # weak-events
//!
//! A type-safe, thread-safe, synchronous event bus for decoupling components
//! inside one process.
//!
//! ## Features
//!
//! - **Type-safe** subscriptions routed by event type
//! - **Weak subscribers**: a dropped subscriber silently stops receiving events
//! - **Background purging** of dead subscriptions, paced by a pluggable policy
//! - **Thread-safe**: subscribe, unsubscribe and emit from any thread
//! - **Re-entrant**: callbacks run outside every lock and may use the bus
//!
//! ## Quick Example
//!
//! ```rust
//! use std::sync::Arc;
//! use weak_events::{declare_event, EventBus};
//!
//! declare_event! {
//!     /// A user signed up
//!     pub struct UserRegistered(String);
//! }
//!
//! struct Mailer;
//!
//! impl Mailer {
//!     fn welcome(&self, email: &str) {
//!         println!("welcome mail to {email}");
//!     }
//! }
//!
//! let bus = EventBus::new()?;
//!
//! let mailer = Arc::new(Mailer);
//! bus.on_subscriber::<UserRegistered, _>(&mailer, |mailer, email| mailer.welcome(email));
//!
//! bus.emit(UserRegistered::new("user@example.com".into()));
//!
//! // Dropping the subscriber is enough to stop delivery
//! drop(mailer);
//! assert_eq!(bus.emit(UserRegistered::new("late@example.com".into())), 0);
//! # Ok::<(), weak_events::Error>(())
//! ```

#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    unreachable_pub
)]
#![cfg_attr(docsrs, feature(doc_cfg))]

/// Core event traits and types
pub mod event;

/// Error types and result aliases
pub mod error;

/// Purge interval policies
pub mod policy;

/// Runtime that drives purge timers
pub mod scheduler;

/// Subscription identities, tokens and handlers
pub mod subscription;

/// Event registry for type-to-subscription mapping
pub mod registry;

/// The main event bus implementation
pub mod bus;

// Re-export commonly used types
pub use bus::{EventBus, EventBusBuilder, EventBusConfig, EventBusStats};
pub use error::{Error, Result};
pub use event::{Event, EventTypeKey};
pub use policy::{CleanFrequencyPolicy, LinearCleanFrequency};
pub use registry::PeriodicPurgingContainer;
pub use scheduler::PurgeScheduler;
pub use subscription::{
    CounterTokenProvider, SubscriptionIdentity, SubscriptionToken, TokenProvider,
    UuidTokenProvider, WeakReference,
};

/// Prelude module for convenient imports
///
/// # Example
/// ```rust
/// use weak_events::prelude::*;
/// ```
pub mod prelude {
    pub use crate::bus::{EventBus, EventBusBuilder, EventBusConfig};
    pub use crate::declare_event;
    pub use crate::error::{Error, Result};
    pub use crate::event::Event;
    pub use crate::subscription::SubscriptionToken;
}
