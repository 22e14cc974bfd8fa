//! Configuration for the event bus.

use crate::policy::{CleanFrequencyPolicy, LinearCleanFrequency};
use crate::subscription::{CounterTokenProvider, TokenProvider, UuidTokenProvider};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;

/// Configuration for the event bus
#[derive(Clone)]
pub struct EventBusConfig {
    /// Mints tokens for anonymous subscriptions
    pub token_provider: Arc<dyn TokenProvider>,

    /// Decides how often each bucket is swept for dead subscribers
    pub clean_frequency: Arc<dyn CleanFrequencyPolicy>,

    /// Runtime for purge timers; `None` starts a dedicated one. A supplied
    /// runtime must outlive the bus
    pub runtime: Option<Handle>,
}

impl Default for EventBusConfig {
    fn default() -> Self {
        Self {
            token_provider: Arc::new(CounterTokenProvider::new()),
            clean_frequency: Arc::new(LinearCleanFrequency::default()),
            runtime: None,
        }
    }
}

impl EventBusConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the token provider
    pub fn token_provider(mut self, provider: impl TokenProvider) -> Self {
        self.token_provider = Arc::new(provider);
        self
    }

    /// Set the clean frequency policy
    pub fn clean_frequency(mut self, policy: impl CleanFrequencyPolicy) -> Self {
        self.clean_frequency = Arc::new(policy);
        self
    }

    /// Run purge timers on the runtime behind `handle`
    pub fn runtime(mut self, handle: Handle) -> Self {
        self.runtime = Some(handle);
        self
    }
}

/// Preset configurations for common use cases
impl EventBusConfig {
    /// Configuration minting random UUID tokens
    pub fn uuid_tokens() -> Self {
        Self::default().token_provider(UuidTokenProvider)
    }

    /// Configuration for testing: buckets are swept every few milliseconds
    pub fn test() -> Self {
        Self::default().clean_frequency(|_: usize| Duration::from_millis(10))
    }
}

impl fmt::Debug for EventBusConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBusConfig")
            .field("clean_interval_empty", &self.clean_frequency.interval(0))
            .field("runtime", &self.runtime.is_some())
            .finish_non_exhaustive()
    }
}
