//! Subscription tokens and the providers that mint them.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use uuid::Uuid;

/// An opaque identity for a subscription that is not bound to a subscriber.
///
/// Keep the token to remove the subscription later with
/// [`EventBus::off_token`](crate::EventBus::off_token).
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionToken(Arc<str>);

impl SubscriptionToken {
    /// Create a token from its string identity
    pub fn new(id: impl Into<Arc<str>>) -> Self {
        Self(id.into())
    }

    /// The string identity of this token
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for SubscriptionToken {
    fn from(id: String) -> Self {
        Self::new(id)
    }
}

impl From<&str> for SubscriptionToken {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl fmt::Debug for SubscriptionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SubscriptionToken").field(&&*self.0).finish()
    }
}

impl fmt::Display for SubscriptionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Mints tokens for anonymous subscriptions.
///
/// Providers are shared by every thread using the bus, so `next_token` must
/// be safe to call concurrently and must never hand out the same token twice.
pub trait TokenProvider: Send + Sync + 'static {
    /// Produce a new unique token
    fn next_token(&self) -> SubscriptionToken;
}

impl<F> TokenProvider for F
where
    F: Fn() -> SubscriptionToken + Send + Sync + 'static,
{
    fn next_token(&self) -> SubscriptionToken {
        self()
    }
}

/// Default provider: an atomic counter rendered as a decimal string.
#[derive(Debug, Default)]
pub struct CounterTokenProvider {
    next: AtomicU64,
}

impl CounterTokenProvider {
    /// Create a provider whose first token is `"0"`
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a provider starting at `start`
    pub fn starting_at(start: u64) -> Self {
        Self {
            next: AtomicU64::new(start),
        }
    }
}

impl TokenProvider for CounterTokenProvider {
    fn next_token(&self) -> SubscriptionToken {
        let id = self.next.fetch_add(1, Ordering::Relaxed);
        SubscriptionToken::new(id.to_string())
    }
}

/// Provider that mints random v4 UUIDs.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidTokenProvider;

impl TokenProvider for UuidTokenProvider {
    fn next_token(&self) -> SubscriptionToken {
        SubscriptionToken::new(Uuid::new_v4().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::thread;

    #[test]
    fn test_counter_tokens_increment() {
        let provider = CounterTokenProvider::starting_at(41);
        assert_eq!(provider.next_token().as_str(), "41");
        assert_eq!(provider.next_token().as_str(), "42");
    }

    #[test]
    fn test_counter_tokens_unique_across_threads() {
        let provider = Arc::new(CounterTokenProvider::new());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let provider = provider.clone();
                thread::spawn(move || {
                    (0..500).map(|_| provider.next_token()).collect::<Vec<_>>()
                })
            })
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            for token in handle.join().unwrap() {
                assert!(seen.insert(token));
            }
        }
        assert_eq!(seen.len(), 4000);
    }

    #[test]
    fn test_uuid_tokens_unique() {
        let provider = UuidTokenProvider;
        let first = provider.next_token();
        let second = provider.next_token();
        assert_ne!(first, second);
        assert!(Uuid::parse_str(first.as_str()).is_ok());
    }

    #[test]
    fn test_closure_provider() {
        let provider = || SubscriptionToken::from("fixed");
        assert_eq!(provider.next_token(), SubscriptionToken::from("fixed".to_string()));
        assert_eq!(provider.next_token().to_string(), "fixed");
    }
}
