//! Access verifier: turns a scanned code into an access session.
//!
//! # Flow
//!
//! 1. Rate limit the client (fails closed)
//! 2. Reject empty or oversized input
//! 3. Verify the code against **every** active pass
//! 4. Require the matched pass to be valid now
//! 5. Record the use and issue a fresh session token
//!
//! # Security
//!
//! Step 3 never stops early. Response time depends on the number of active
//! passes, not on which one (if any) matched. Wrong, expired and inactive
//! codes all produce the same [`AccessError::InvalidCode`].

use crate::error::{AccessError, InputProblem, Result};
use crate::guard::SessionGuard;
use crate::limiter::RateLimiter;
use crate::providers::PassRepository;
use crate::secret::SecretStore;
use crate::state::{Pass, PassId, SessionToken};
use canteen_core::environment::Clock;
use std::sync::Arc;

/// Successful verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verified {
    /// Pass that matched.
    pub pass_id: PassId,
    /// Owner label carried into the session.
    pub owner_label: String,
    /// New session token for the caller.
    pub token: SessionToken,
}

/// Orchestrates pass verification.
#[derive(Clone)]
pub struct AccessVerifier {
    limiter: RateLimiter,
    repo: Arc<dyn PassRepository>,
    secrets: SecretStore,
    guard: SessionGuard,
    clock: Arc<dyn Clock>,
    max_code_length: usize,
}

impl AccessVerifier {
    /// Assemble a verifier.
    #[must_use]
    pub fn new(
        limiter: RateLimiter,
        repo: Arc<dyn PassRepository>,
        secrets: SecretStore,
        guard: SessionGuard,
        clock: Arc<dyn Clock>,
        max_code_length: usize,
    ) -> Self {
        Self {
            limiter,
            repo,
            secrets,
            guard,
            clock,
            max_code_length,
        }
    }

    /// Verify a submitted code for `client_key`.
    ///
    /// `current` is the caller's existing session token, which is replaced.
    ///
    /// # Errors
    ///
    /// - `AccessError::RateLimited` if the client exceeded its attempts
    /// - `AccessError::InvalidInput` if the code is empty or too long
    /// - `AccessError::InvalidCode` if no valid pass matched
    /// - storage or internal errors otherwise
    pub async fn verify(
        &self,
        code: &str,
        client_key: &str,
        current: Option<&SessionToken>,
    ) -> Result<Verified> {
        let result = self.verify_inner(code, client_key, current).await;

        let outcome = match &result {
            Ok(_) => "valid",
            Err(AccessError::RateLimited { .. }) => "rate_limited",
            Err(AccessError::InvalidInput { .. }) => "invalid_input",
            Err(AccessError::InvalidCode) => "invalid",
            Err(_) => "error",
        };
        metrics::counter!("access.verify.attempts", "outcome" => outcome).increment(1);

        result
    }

    /// Count a request whose body could not be read as an attempt.
    ///
    /// # Errors
    ///
    /// `AccessError::RateLimited` if this attempt is over the limit.
    pub async fn record_unreadable(&self, client_key: &str) -> Result<()> {
        let result = self.limiter.check_and_record(client_key).await;
        let outcome = if result.is_ok() { "unreadable" } else { "rate_limited" };
        metrics::counter!("access.verify.attempts", "outcome" => outcome).increment(1);
        tracing::debug!(client_ip = %client_key, "Unreadable verification request");
        result
    }

    async fn verify_inner(
        &self,
        code: &str,
        client_key: &str,
        current: Option<&SessionToken>,
    ) -> Result<Verified> {
        self.limiter.check_and_record(client_key).await?;

        let code = code.trim();
        if code.is_empty() {
            return Err(AccessError::InvalidInput {
                reason: InputProblem::Missing,
            });
        }
        if code.chars().count() > self.max_code_length {
            tracing::warn!(client_ip = %client_key, "Oversized code rejected");
            return Err(AccessError::InvalidInput {
                reason: InputProblem::TooLong,
            });
        }

        let active = self.repo.list_active().await?;
        let active_passes = active.len();
        let matched = self.scan(code.to_string(), active).await?;

        let now = self.clock.now();
        let Some(pass) = matched.filter(|pass| pass.is_valid(now)) else {
            tracing::warn!(client_ip = %client_key, active_passes, "Invalid or expired code");
            return Err(AccessError::InvalidCode);
        };

        let pass = self.repo.record_use(pass.id, now).await?;
        let owner_label = pass.display_owner().to_string();
        let token = self.guard.issue(&owner_label, current).await?;

        tracing::info!(
            client_ip = %client_key,
            pass_id = %pass.id,
            owner_label = %owner_label,
            use_count = pass.use_count,
            "Pass verified"
        );

        Ok(Verified {
            pass_id: pass.id,
            owner_label,
            token,
        })
    }

    /// Verify `code` against every pass on a blocking thread and return the
    /// first match.
    async fn scan(&self, code: String, passes: Vec<Pass>) -> Result<Option<Pass>> {
        let secrets = self.secrets.clone();
        tokio::task::spawn_blocking(move || {
            let mut matched = None;
            for pass in passes {
                let is_match = secrets.verify_code(&code, &pass.secret_hash);
                if is_match && matched.is_none() {
                    matched = Some(pass);
                }
            }
            matched
        })
        .await
        .map_err(|e| AccessError::InternalError(format!("Verification task failed: {e}")))
    }
}
