//! # Canteen Core
//!
//! Capability interfaces shared by the access and ordering crates.
//!
//! Nothing in this crate performs I/O. It defines the seams that the
//! request handlers are wired through so that every piece of ambient state
//! (wall-clock time, the ephemeral key-value store, currency amounts) is
//! passed in explicitly instead of being read from globals.
//!
//! ## Capabilities
//!
//! - **Clock**: injected time source (`SystemClock` in production)
//! - **`KeyValueStore`**: shared ephemeral store with atomic increment and
//!   per-key expiry, backing rate buckets, access sessions and checkout stashes
//! - **Money**: fixed-point currency amounts in minor units
//!
//! ## Example
//!
//! ```ignore
//! use canteen_core::environment::{Clock, SystemClock};
//! use canteen_core::kv::KeyValueStore;
//! use std::sync::Arc;
//!
//! async fn count_attempt(kv: Arc<dyn KeyValueStore>) -> Result<i64, canteen_core::kv::KvError> {
//!     kv.incr("rate_limit:scan:203.0.113.7", std::time::Duration::from_secs(60)).await
//! }
//! ```

#![forbid(unsafe_code)]

// Re-export commonly used types
pub use chrono::{DateTime, Utc};

pub mod kv;
pub mod money;

pub use kv::{KeyValueStore, KvError};
pub use money::Money;

/// Environment module - injected dependencies that abstract over the outside world.
pub mod environment {
    use chrono::{DateTime, Utc};

    /// Clock trait - abstracts time operations for testability
    ///
    /// Every expiry decision in the system (pass validity, session lifetime,
    /// checkout stash age) is taken against this clock.
    ///
    /// # Examples
    ///
    /// ```
    /// use canteen_core::environment::{Clock, SystemClock};
    ///
    /// let clock = SystemClock;
    /// let before = clock.now();
    /// assert!(clock.now() >= before);
    /// ```
    pub trait Clock: Send + Sync {
        /// Get the current time
        fn now(&self) -> DateTime<Utc>;
    }

    /// Production clock backed by the system time.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::environment::{Clock, SystemClock};

    #[test]
    fn system_clock_is_monotonic_enough() {
        let clock = SystemClock;
        let first = clock.now();
        let second = clock.now();
        assert!(second >= first);
    }
}
