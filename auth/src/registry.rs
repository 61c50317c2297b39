//! Pass registry: issuance, reset and administration of passes.

use crate::error::{AccessError, Result};
use crate::providers::PassRepository;
use crate::secret::SecretStore;
use crate::state::{IssuedPass, NewPass, Pass, PassId, PassSummary};
use canteen_core::environment::Clock;
use chrono::Duration;
use std::sync::Arc;

/// Issues and administers passes.
///
/// The plaintext code is returned exactly once from [`issue`](Self::issue) or
/// [`reset`](Self::reset) and is never stored.
#[derive(Clone)]
pub struct PassRegistry {
    repo: Arc<dyn PassRepository>,
    secrets: SecretStore,
    clock: Arc<dyn Clock>,
    pass_ttl: Duration,
}

impl PassRegistry {
    /// Create a registry issuing passes valid for `pass_ttl`.
    #[must_use]
    pub fn new(
        repo: Arc<dyn PassRepository>,
        secrets: SecretStore,
        clock: Arc<dyn Clock>,
        pass_ttl: Duration,
    ) -> Self {
        Self {
            repo,
            secrets,
            clock,
            pass_ttl,
        }
    }

    /// Issue a new pass.
    ///
    /// # Errors
    ///
    /// Returns `AccessError::InternalError` if hashing fails, or
    /// `AccessError::DatabaseError` if the insert fails.
    pub async fn issue(&self, owner_label: Option<String>) -> Result<IssuedPass> {
        let now = self.clock.now();
        let (code, secret_hash) = self.new_secret().await?;

        let pass = self
            .repo
            .insert(NewPass {
                secret_hash,
                owner_label: normalize_label(owner_label),
                created_at: now,
                expires_at: Some(now + self.pass_ttl),
            })
            .await?;

        tracing::info!(pass_id = %pass.id, owner_label = pass.display_owner(), "Pass issued");

        Ok(IssuedPass {
            pass: pass.summary(),
            code,
        })
    }

    /// Reset a pass: new code, usage cleared, re-activated, expiry extended.
    ///
    /// # Errors
    ///
    /// Returns `AccessError::PassNotFound` for an unknown id, or a storage error.
    pub async fn reset(&self, id: PassId) -> Result<IssuedPass> {
        if self.repo.get(id).await?.is_none() {
            return Err(AccessError::PassNotFound);
        }

        let (code, secret_hash) = self.new_secret().await?;
        let expires_at = Some(self.clock.now() + self.pass_ttl);
        let pass = self.repo.replace_secret(id, secret_hash, expires_at).await?;

        tracing::info!(pass_id = %pass.id, owner_label = pass.display_owner(), "Pass reset");

        Ok(IssuedPass {
            pass: pass.summary(),
            code,
        })
    }

    /// Deactivate a pass. Existing access sessions are unaffected.
    ///
    /// # Errors
    ///
    /// Returns `AccessError::PassNotFound` for an unknown id, or a storage error.
    pub async fn deactivate(&self, id: PassId) -> Result<PassSummary> {
        let pass = self.repo.set_active(id, false).await?;
        tracing::info!(pass_id = %pass.id, "Pass deactivated");
        Ok(pass.summary())
    }

    /// Record a successful use of a pass.
    ///
    /// # Errors
    ///
    /// Returns `AccessError::PassNotFound` for an unknown id, or a storage error.
    pub async fn mark_used(&self, id: PassId) -> Result<Pass> {
        self.repo.record_use(id, self.clock.now()).await
    }

    /// Search passes by owner label, newest first.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the query fails.
    pub async fn search(&self, query: Option<String>) -> Result<Vec<PassSummary>> {
        let query = query.map(|q| q.trim().to_string()).filter(|q| !q.is_empty());
        let passes = self.repo.search(query).await?;
        Ok(passes.iter().map(Pass::summary).collect())
    }

    async fn new_secret(&self) -> Result<(String, String)> {
        let code = SecretStore::generate_code();
        let secrets = self.secrets.clone();
        let plaintext = code.clone();
        let secret_hash = tokio::task::spawn_blocking(move || secrets.hash_code(&plaintext))
            .await
            .map_err(|e| AccessError::InternalError(format!("Hashing task failed: {e}")))??;
        Ok((code, secret_hash))
    }
}

fn normalize_label(label: Option<String>) -> Option<String> {
    label
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
}
