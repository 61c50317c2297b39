//! # Canteen Testing
//!
//! Testing utilities shared by the canteen crates.
//!
//! This crate provides:
//! - `FixedClock`: deterministic, manually advanced time
//! - `InMemoryKeyValueStore`: TTL-aware key-value store driven by a clock,
//!   with a switch to simulate an outage
//! - `init_test_tracing`: opt-in log output while debugging a test
//!
//! ## Example
//!
//! ```
//! use canteen_core::environment::Clock;
//! use canteen_testing::test_clock;
//!
//! let clock = test_clock();
//! let start = clock.now();
//! clock.advance(chrono::Duration::seconds(301));
//! assert_eq!((clock.now() - start).num_seconds(), 301);
//! ```

use canteen_core::environment::Clock;
use chrono::{DateTime, Utc};

mod kv;

/// Mock implementations of capability interfaces.
pub mod mocks {
    use super::{Clock, DateTime, Utc};
    use std::sync::{Arc, Mutex, PoisonError};

    pub use crate::kv::InMemoryKeyValueStore;

    /// Fixed clock for deterministic tests
    ///
    /// Returns the same time until moved with [`FixedClock::advance`] or
    /// [`FixedClock::set`]. Clones share the same instant, so a test can keep
    /// a handle while services hold an `Arc<dyn Clock>`.
    ///
    /// # Example
    ///
    /// ```
    /// use canteen_testing::mocks::FixedClock;
    /// use canteen_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// let time1 = clock.now();
    /// let time2 = clock.now();
    /// assert_eq!(time1, time2);
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: Arc<Mutex<DateTime<Utc>>>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub fn new(time: DateTime<Utc>) -> Self {
            Self {
                time: Arc::new(Mutex::new(time)),
            }
        }

        /// Move the clock forward.
        pub fn advance(&self, by: chrono::Duration) {
            let mut time = self.time.lock().unwrap_or_else(PoisonError::into_inner);
            *time += by;
        }

        /// Jump to an absolute instant.
        pub fn set(&self, to: DateTime<Utc>) {
            *self.time.lock().unwrap_or_else(PoisonError::into_inner) = to;
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            *self.time.lock().unwrap_or_else(PoisonError::into_inner)
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    ///
    /// # Panics
    ///
    /// This function will panic if the hardcoded timestamp fails to parse,
    /// which should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }
}

/// Install a `tracing` subscriber that writes to the test harness output.
///
/// Safe to call from every test; only the first call installs anything.
/// Filtering follows `RUST_LOG`.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// Re-export commonly used items
pub use mocks::{FixedClock, InMemoryKeyValueStore, test_clock};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock() {
        let clock = test_clock();
        let time1 = clock.now();
        let time2 = clock.now();
        assert_eq!(time1, time2);
    }

    #[test]
    fn test_clones_share_time() {
        let clock = test_clock();
        let handle = clock.clone();
        handle.advance(chrono::Duration::seconds(60));
        assert_eq!(clock.now(), handle.now());
        assert_eq!(clock.now().timestamp(), 1_735_689_660);
    }
}
