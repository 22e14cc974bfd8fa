//! Error types for the weak-events library.
//!
//! Dispatch itself never fails: type mismatches, dead subscribers and
//! missing entries are absorbed as no-ops. Only building a bus can fail.

use thiserror::Error;

/// Type alias for Results in this crate
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for weak-events
#[derive(Error, Debug)]
pub enum Error {
    /// The runtime driving purge timers could not be started
    #[error("Failed to start purge scheduler: {0}")]
    Scheduler(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl Error {
    /// Create a new configuration error with a custom message
    pub fn config(msg: impl Into<String>) -> Self {
        Error::ConfigError(msg.into())
    }

    /// Check if this error comes from the purge scheduler
    pub fn is_scheduler_error(&self) -> bool {
        matches!(self, Error::Scheduler(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::config("min interval exceeds max interval");
        assert_eq!(
            err.to_string(),
            "Configuration error: min interval exceeds max interval"
        );
    }

    #[test]
    fn test_scheduler_error_from_io() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "no threads");
        let err: Error = io.into();
        assert!(err.is_scheduler_error());
        assert!(err.to_string().contains("no threads"));
        assert!(!Error::config("x").is_scheduler_error());
    }
}
