//! Builder pattern for constructing EventBus instances.

use crate::bus::config::EventBusConfig;
use crate::policy::{CleanFrequencyPolicy, LinearCleanFrequency};
use crate::registry::Registry;
use crate::scheduler::PurgeScheduler;
use crate::subscription::TokenProvider;
use crate::{EventBus, Result};
use std::time::Duration;
use tokio::runtime::Handle;
use tracing::info;

/// Builder for creating EventBus instances
#[derive(Debug, Default)]
pub struct EventBusBuilder {
    config: EventBusConfig,
    linear: Option<(Duration, Duration, usize)>,
}

impl EventBusBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a custom configuration
    pub fn config(mut self, config: EventBusConfig) -> Self {
        self.config = config;
        self.linear = None;
        self
    }

    /// Configure the event bus
    pub fn configure<F>(mut self, f: F) -> Self
    where
        F: FnOnce(EventBusConfig) -> EventBusConfig,
    {
        self.config = f(self.config);
        self.linear = None;
        self
    }

    /// Use a custom token provider
    pub fn token_provider(mut self, provider: impl TokenProvider) -> Self {
        self.config = self.config.token_provider(provider);
        self
    }

    /// Use a custom clean frequency policy
    pub fn clean_frequency(mut self, policy: impl CleanFrequencyPolicy) -> Self {
        self.config = self.config.clean_frequency(policy);
        self.linear = None;
        self
    }

    /// Use the default linear policy with custom bounds.
    ///
    /// The bounds are validated by [`build`](Self::build).
    pub fn linear_clean_frequency(mut self, min: Duration, max: Duration, saturation: usize) -> Self {
        self.linear = Some((min, max, saturation));
        self
    }

    /// Run purge timers on the runtime behind `handle`
    pub fn runtime(mut self, handle: Handle) -> Self {
        self.config = self.config.runtime(handle);
        self
    }

    /// Sweep buckets every few milliseconds, keeping everything else
    pub fn test(mut self) -> Self {
        self.config.clean_frequency = EventBusConfig::test().clean_frequency;
        self.linear = None;
        self
    }

    /// Build the EventBus
    pub fn build(mut self) -> Result<EventBus> {
        info!("Building EventBus");

        if let Some((min, max, saturation)) = self.linear {
            let policy = LinearCleanFrequency::new(min, max, saturation)?;
            self.config = self.config.clean_frequency(policy);
        }

        let scheduler = match self.config.runtime.clone() {
            Some(handle) => {
                info!("Using configured runtime for purge timers");
                PurgeScheduler::from_handle(handle)
            }
            None => PurgeScheduler::owned()?,
        };

        let registry = Registry::new(scheduler, self.config.clean_frequency.clone());

        info!("EventBus built successfully");
        Ok(EventBus {
            registry,
            config: self.config,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subscription::SubscriptionToken;
    use crate::Error;

    #[test]
    fn test_builder_default() {
        let bus = EventBusBuilder::new().build().unwrap();
        assert_eq!(bus.stats().event_types, 0);
    }

    #[test]
    fn test_builder_rejects_bad_bounds() {
        let err = EventBusBuilder::new()
            .linear_clean_frequency(Duration::from_secs(30), Duration::from_secs(5), 100)
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::ConfigError(_)));
    }

    #[test]
    fn test_builder_linear_bounds() {
        let bus = EventBusBuilder::new()
            .linear_clean_frequency(Duration::from_secs(1), Duration::from_secs(3), 2)
            .build()
            .unwrap();
        assert_eq!(bus.config().clean_frequency.interval(1), Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_builder_explicit_runtime() {
        let bus = EventBusBuilder::new()
            .test()
            .runtime(Handle::current())
            .build()
            .unwrap();
        assert!(bus.config().runtime.is_some());
        assert_eq!(bus.config().clean_frequency.interval(0), Duration::from_millis(10));
    }

    #[test]
    fn test_preset_keeps_token_provider() {
        let bus = EventBusBuilder::new()
            .token_provider(|| SubscriptionToken::from("fixed"))
            .test()
            .build()
            .unwrap();
        assert_eq!(bus.config().token_provider.next_token().as_str(), "fixed");
        assert_eq!(bus.config().clean_frequency.interval(0), Duration::from_millis(10));
    }

    #[test]
    fn test_later_config_overrides_linear_bounds() {
        let bus = EventBusBuilder::new()
            .linear_clean_frequency(Duration::from_secs(1), Duration::from_secs(3), 2)
            .config(EventBusConfig::test())
            .build()
            .unwrap();
        assert_eq!(bus.config().clean_frequency.interval(0), Duration::from_millis(10));

        let bus = EventBusBuilder::new()
            .linear_clean_frequency(Duration::from_secs(1), Duration::from_secs(3), 2)
            .configure(|config| config.clean_frequency(|_: usize| Duration::from_secs(7)))
            .build()
            .unwrap();
        assert_eq!(bus.config().clean_frequency.interval(0), Duration::from_secs(7));
    }

    #[tokio::test]
    async fn test_default_scheduler_is_owned() {
        let bus = EventBusBuilder::new().build().unwrap();
        assert!(bus.config().runtime.is_none());
        assert!(format!("{:?}", bus).contains("owned: true"));
    }
}
