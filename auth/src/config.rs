//! Access configuration.
//!
//! Configuration values are provided by the application; the defaults match
//! the behaviour of a single-venue deployment.

use chrono::Duration;

/// Argon2id cost parameters used when hashing pass codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashCost {
    /// Memory size in KiB.
    pub memory_kib: u32,
    /// Number of passes.
    pub iterations: u32,
    /// Degree of parallelism.
    pub parallelism: u32,
}

impl HashCost {
    /// Cheapest parameters Argon2 accepts. For tests only.
    #[must_use]
    pub const fn minimal() -> Self {
        Self {
            memory_kib: 8,
            iterations: 1,
            parallelism: 1,
        }
    }
}

impl Default for HashCost {
    /// OWASP-recommended Argon2id baseline (19 MiB, 2 passes, 1 lane).
    fn default() -> Self {
        Self {
            memory_kib: 19_456,
            iterations: 2,
            parallelism: 1,
        }
    }
}

/// Pass verification and access session configuration.
#[derive(Debug, Clone)]
pub struct AccessConfig {
    /// Validity window of an issued or reset pass.
    ///
    /// Default: 30 days
    pub pass_ttl: Duration,

    /// Hard wall-clock lifetime of an access session.
    ///
    /// Default: 300 seconds
    pub session_duration: Duration,

    /// How long an expired session is remembered so the caller can be told
    /// "session expired" instead of "not authenticated".
    ///
    /// Default: 300 seconds
    pub expired_notice_grace: Duration,

    /// Verification attempts allowed per client within one window.
    ///
    /// Default: 10
    pub rate_limit_attempts: u32,

    /// Fixed rate limit window.
    ///
    /// Default: 60 seconds
    pub rate_limit_window: std::time::Duration,

    /// Longest accepted code, in characters.
    ///
    /// Default: 1000
    pub max_code_length: usize,

    /// Argon2id cost.
    pub hash_cost: HashCost,
}

impl AccessConfig {
    /// Set pass validity window.
    #[must_use]
    pub const fn with_pass_ttl(mut self, ttl: Duration) -> Self {
        self.pass_ttl = ttl;
        self
    }

    /// Set session duration.
    #[must_use]
    pub const fn with_session_duration(mut self, duration: Duration) -> Self {
        self.session_duration = duration;
        self
    }

    /// Set the expired-session notice grace period.
    #[must_use]
    pub const fn with_expired_notice_grace(mut self, grace: Duration) -> Self {
        self.expired_notice_grace = grace;
        self
    }

    /// Set rate limit attempts and window.
    #[must_use]
    pub const fn with_rate_limit(mut self, attempts: u32, window: std::time::Duration) -> Self {
        self.rate_limit_attempts = attempts;
        self.rate_limit_window = window;
        self
    }

    /// Set maximum code length.
    #[must_use]
    pub const fn with_max_code_length(mut self, max: usize) -> Self {
        self.max_code_length = max;
        self
    }

    /// Set Argon2id cost.
    #[must_use]
    pub const fn with_hash_cost(mut self, cost: HashCost) -> Self {
        self.hash_cost = cost;
        self
    }
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            pass_ttl: Duration::days(30),
            session_duration: Duration::seconds(300),
            expired_notice_grace: Duration::seconds(300),
            rate_limit_attempts: 10,
            rate_limit_window: std::time::Duration::from_secs(60),
            max_code_length: 1000,
            hash_cost: HashCost::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AccessConfig::default();
        assert_eq!(config.pass_ttl, Duration::days(30));
        assert_eq!(config.session_duration.num_seconds(), 300);
        assert_eq!(config.rate_limit_attempts, 10);
        assert_eq!(config.rate_limit_window.as_secs(), 60);
        assert_eq!(config.max_code_length, 1000);
    }

    #[test]
    fn test_builder() {
        let config = AccessConfig::default()
            .with_rate_limit(3, std::time::Duration::from_secs(10))
            .with_hash_cost(HashCost::minimal());
        assert_eq!(config.rate_limit_attempts, 3);
        assert_eq!(config.hash_cost.memory_kib, 8);
    }
}
