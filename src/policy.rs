//! Purge interval policies.
//!
//! Each bucket re-arms its purge timer after every sweep, asking the policy
//! how long to wait given the number of entries that survived.

use crate::{Error, Result};
use std::time::Duration;

/// Maps the current subscriber count of a bucket to the delay before its
/// next purge.
pub trait CleanFrequencyPolicy: Send + Sync + 'static {
    /// Delay before the next sweep of a bucket holding `count` entries
    fn interval(&self, count: usize) -> Duration;
}

impl<F> CleanFrequencyPolicy for F
where
    F: Fn(usize) -> Duration + Send + Sync + 'static,
{
    fn interval(&self, count: usize) -> Duration {
        self(count)
    }
}

/// Linear interpolation between a relaxed and an eager interval.
///
/// An empty bucket is swept every `max`; the interval shrinks linearly as
/// the bucket fills and stays at `min` from `saturation` entries upward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinearCleanFrequency {
    min: Duration,
    max: Duration,
    saturation: usize,
}

impl LinearCleanFrequency {
    /// Shortest interval, used for crowded buckets
    pub const DEFAULT_MIN: Duration = Duration::from_secs(10);
    /// Longest interval, used for empty buckets
    pub const DEFAULT_MAX: Duration = Duration::from_secs(120);
    /// Subscriber count at which the interval bottoms out
    pub const DEFAULT_SATURATION: usize = 100;

    /// Create a policy, validating the bounds
    pub fn new(min: Duration, max: Duration, saturation: usize) -> Result<Self> {
        if min > max {
            return Err(Error::config(format!(
                "clean interval min ({:?}) exceeds max ({:?})",
                min, max
            )));
        }
        if saturation == 0 {
            return Err(Error::config("clean saturation must be at least 1"));
        }
        Ok(Self {
            min,
            max,
            saturation,
        })
    }

    /// Shortest interval
    pub fn min(&self) -> Duration {
        self.min
    }

    /// Longest interval
    pub fn max(&self) -> Duration {
        self.max
    }

    /// Subscriber count at which the interval bottoms out
    pub fn saturation(&self) -> usize {
        self.saturation
    }
}

impl Default for LinearCleanFrequency {
    fn default() -> Self {
        Self {
            min: Self::DEFAULT_MIN,
            max: Self::DEFAULT_MAX,
            saturation: Self::DEFAULT_SATURATION,
        }
    }
}

impl CleanFrequencyPolicy for LinearCleanFrequency {
    fn interval(&self, count: usize) -> Duration {
        let filled = count.min(self.saturation) as f64 / self.saturation as f64;
        self.max - (self.max - self.min).mul_f64(filled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_bounds() {
        let policy = LinearCleanFrequency::default();
        assert_eq!(policy.interval(0), Duration::from_secs(120));
        assert_eq!(policy.interval(50), Duration::from_secs(65));
        assert_eq!(policy.interval(100), Duration::from_secs(10));
        assert_eq!(policy.interval(10_000), Duration::from_secs(10));
    }

    #[test]
    fn test_interval_never_grows_with_count() {
        let policy = LinearCleanFrequency::default();
        let mut previous = policy.interval(0);
        for count in 1..=150 {
            let current = policy.interval(count);
            assert!(current <= previous);
            previous = current;
        }
    }

    #[test]
    fn test_invalid_bounds_rejected() {
        let err = LinearCleanFrequency::new(Duration::from_secs(5), Duration::from_secs(1), 10)
            .unwrap_err();
        assert!(matches!(err, Error::ConfigError(_)));

        assert!(LinearCleanFrequency::new(Duration::ZERO, Duration::ZERO, 0).is_err());
        assert!(LinearCleanFrequency::new(Duration::ZERO, Duration::ZERO, 1).is_ok());
    }

    #[test]
    fn test_closure_policy() {
        let policy = |count: usize| Duration::from_millis(count as u64);
        assert_eq!(policy.interval(25), Duration::from_millis(25));
    }
}
