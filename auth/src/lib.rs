//! # Canteen Access
//!
//! Time-limited access via QR passes.
//!
//! ## Components
//!
//! - **Secret store** ([`secret`]): generates codes, keeps only Argon2id hashes
//! - **Pass registry** ([`registry`]): issue, reset, deactivate, search
//! - **Rate limiter** ([`limiter`]): fixed-window per-client attempt counter
//! - **Access verifier** ([`verifier`]): full-scan verification, session issuance
//! - **Session guard** ([`guard`]): 300-second access sessions in the shared store
//!
//! ## Flow
//!
//! ```text
//! scan → RateLimiter → AccessVerifier (SecretStore + PassRepository) → SessionGuard
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use canteen_auth::{AccessConfig, AccessServices};
//!
//! let access = AccessServices::new(&AccessConfig::default(), repo, kv, clock)?;
//! let issued = access.registry.issue(Some("guest-1".into())).await?;
//! let verified = access.verifier.verify(&issued.code, "203.0.113.7", None).await?;
//! assert!(access.guard.is_authenticated(Some(&verified.token)).await?);
//! ```

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]

// Public modules
pub mod config;
pub mod constants;
pub mod error;
pub mod guard;
pub mod limiter;
pub mod providers;
pub mod registry;
pub mod secret;
pub mod state;
pub mod verifier;

#[cfg(any(test, feature = "test-utils"))]
pub mod mocks;

// Re-export main types for convenience
pub use config::{AccessConfig, HashCost};
pub use error::{AccessError, InputProblem, Result};
pub use guard::{SessionGuard, SessionStatus};
pub use limiter::RateLimiter;
pub use providers::PassRepository;
pub use registry::PassRegistry;
pub use secret::SecretStore;
pub use state::{AccessSession, IssuedPass, Pass, PassId, PassSummary, SessionToken};
pub use verifier::{AccessVerifier, Verified};

use canteen_core::KeyValueStore;
use canteen_core::environment::Clock;
use std::sync::Arc;

/// The access components wired together from one [`AccessConfig`].
#[derive(Clone)]
pub struct AccessServices {
    /// Verification endpoint logic.
    pub verifier: AccessVerifier,
    /// Session checks for protected endpoints.
    pub guard: SessionGuard,
    /// Pass administration.
    pub registry: PassRegistry,
}

impl AccessServices {
    /// Wire the access components.
    ///
    /// # Errors
    ///
    /// Returns `AccessError::InternalError` if the hash cost is rejected.
    pub fn new(
        config: &AccessConfig,
        repo: Arc<dyn PassRepository>,
        kv: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let secrets = SecretStore::new(config.hash_cost)?;
        let limiter = RateLimiter::new(
            Arc::clone(&kv),
            config.rate_limit_attempts,
            config.rate_limit_window,
        );
        let guard = SessionGuard::new(
            kv,
            Arc::clone(&clock),
            config.session_duration,
            config.expired_notice_grace,
        );
        let registry = PassRegistry::new(
            Arc::clone(&repo),
            secrets.clone(),
            Arc::clone(&clock),
            config.pass_ttl,
        );
        let verifier = AccessVerifier::new(
            limiter,
            repo,
            secrets,
            guard.clone(),
            clock,
            config.max_code_length,
        );

        Ok(Self {
            verifier,
            guard,
            registry,
        })
    }
}
