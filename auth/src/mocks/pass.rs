//! Mock pass repository for testing.

use crate::error::{AccessError, Result};
use crate::providers::{PassRepository, RepoFuture};
use crate::state::{NewPass, Pass, PassId};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// In-memory pass repository.
#[derive(Debug, Clone, Default)]
pub struct MockPassRepository {
    passes: Arc<Mutex<BTreeMap<PassId, Pass>>>,
}

impl MockPassRepository {
    /// Create an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of a stored pass (for assertions).
    ///
    /// # Errors
    ///
    /// Returns error if lock is poisoned.
    pub fn snapshot(&self, id: PassId) -> Result<Option<Pass>> {
        Ok(self.lock()?.get(&id).cloned())
    }

    /// Number of stored passes.
    ///
    /// # Errors
    ///
    /// Returns error if lock is poisoned.
    pub fn pass_count(&self) -> Result<usize> {
        Ok(self.lock()?.len())
    }

    /// Overwrite a stored pass, e.g. to back-date its expiry.
    ///
    /// # Errors
    ///
    /// Returns error if lock is poisoned.
    pub fn put(&self, pass: Pass) -> Result<()> {
        self.lock()?.insert(pass.id, pass);
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, BTreeMap<PassId, Pass>>> {
        self.passes
            .lock()
            .map_err(|_| AccessError::InternalError("Mutex lock failed".to_string()))
    }

    fn update(&self, id: PassId, f: impl FnOnce(&mut Pass)) -> Result<Pass> {
        let mut passes = self.lock()?;
        let pass = passes.get_mut(&id).ok_or(AccessError::PassNotFound)?;
        f(pass);
        Ok(pass.clone())
    }
}

impl PassRepository for MockPassRepository {
    fn insert(&self, new: NewPass) -> RepoFuture<'_, Pass> {
        let result = self.lock().map(|mut passes| {
            let next = passes.keys().next_back().map_or(1, |id| id.0 + 1);
            let pass = Pass {
                id: PassId(next),
                secret_hash: new.secret_hash,
                owner_label: new.owner_label,
                created_at: new.created_at,
                expires_at: new.expires_at,
                is_active: true,
                used_at: None,
                use_count: 0,
            };
            passes.insert(pass.id, pass.clone());
            pass
        });
        Box::pin(async move { result })
    }

    fn get(&self, id: PassId) -> RepoFuture<'_, Option<Pass>> {
        let result = self.snapshot(id);
        Box::pin(async move { result })
    }

    fn list_active(&self) -> RepoFuture<'_, Vec<Pass>> {
        let result = self
            .lock()
            .map(|passes| passes.values().filter(|p| p.is_active).cloned().collect());
        Box::pin(async move { result })
    }

    fn record_use(&self, id: PassId, now: DateTime<Utc>) -> RepoFuture<'_, Pass> {
        let result = self.update(id, |pass| pass.mark_used(now));
        Box::pin(async move { result })
    }

    fn replace_secret(
        &self,
        id: PassId,
        secret_hash: String,
        expires_at: Option<DateTime<Utc>>,
    ) -> RepoFuture<'_, Pass> {
        let result = self.update(id, |pass| {
            pass.secret_hash = secret_hash;
            pass.expires_at = expires_at;
            pass.use_count = 0;
            pass.is_active = true;
        });
        Box::pin(async move { result })
    }

    fn set_active(&self, id: PassId, active: bool) -> RepoFuture<'_, Pass> {
        let result = self.update(id, |pass| pass.is_active = active);
        Box::pin(async move { result })
    }

    fn search(&self, query: Option<String>) -> RepoFuture<'_, Vec<Pass>> {
        let needle = query.map(|q| q.to_lowercase());
        let result = self.lock().map(|passes| {
            let mut found: Vec<Pass> = passes
                .values()
                .filter(|p| match &needle {
                    Some(needle) => p
                        .owner_label
                        .as_deref()
                        .is_some_and(|label| label.to_lowercase().contains(needle.as_str())),
                    None => true,
                })
                .cloned()
                .collect();
            found.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
            found
        });
        Box::pin(async move { result })
    }
}
