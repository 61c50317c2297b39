//! Access providers.
//!
//! Traits for the persistent side of the access path. The verifier and the
//! registry depend on these traits; `canteen-postgres` provides the
//! production implementation and [`crate::mocks`] an in-memory one.
//!
//! The ephemeral side (rate buckets, sessions) goes through
//! [`canteen_core::KeyValueStore`] instead.

use crate::error::Result;
use crate::state::{NewPass, Pass, PassId};
use chrono::{DateTime, Utc};
use std::future::Future;
use std::pin::Pin;

/// Boxed future returned by [`PassRepository`] operations.
pub type RepoFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// Storage for access passes.
///
/// Passes are never hard-deleted; deactivation is the only way to retire one.
///
/// # Dyn Compatibility
///
/// Methods return boxed futures so services can hold `Arc<dyn PassRepository>`.
pub trait PassRepository: Send + Sync {
    /// Insert a new pass (active, unused).
    ///
    /// # Errors
    ///
    /// Returns `AccessError::DatabaseError` if the insert fails.
    fn insert(&self, pass: NewPass) -> RepoFuture<'_, Pass>;

    /// Fetch a pass by id.
    ///
    /// # Errors
    ///
    /// Returns `AccessError::DatabaseError` if the query fails.
    fn get(&self, id: PassId) -> RepoFuture<'_, Option<Pass>>;

    /// Every pass with `is_active = true`, expired or not.
    ///
    /// # Errors
    ///
    /// Returns `AccessError::DatabaseError` if the query fails.
    fn list_active(&self) -> RepoFuture<'_, Vec<Pass>>;

    /// Atomically `use_count += 1` and `used_at = now`.
    ///
    /// # Errors
    ///
    /// Returns `AccessError::PassNotFound` if the pass does not exist, or
    /// `AccessError::DatabaseError` if the update fails.
    fn record_use(&self, id: PassId, now: DateTime<Utc>) -> RepoFuture<'_, Pass>;

    /// Reset a pass: new hash and expiry, `use_count = 0`, re-activated.
    ///
    /// # Errors
    ///
    /// Returns `AccessError::PassNotFound` if the pass does not exist, or
    /// `AccessError::DatabaseError` if the update fails.
    fn replace_secret(
        &self,
        id: PassId,
        secret_hash: String,
        expires_at: Option<DateTime<Utc>>,
    ) -> RepoFuture<'_, Pass>;

    /// Activate or deactivate a pass.
    ///
    /// # Errors
    ///
    /// Returns `AccessError::PassNotFound` if the pass does not exist, or
    /// `AccessError::DatabaseError` if the update fails.
    fn set_active(&self, id: PassId, active: bool) -> RepoFuture<'_, Pass>;

    /// Passes whose owner label contains `query` (case-insensitive), newest first.
    /// `None` lists every pass.
    ///
    /// # Errors
    ///
    /// Returns `AccessError::DatabaseError` if the query fails.
    fn search(&self, query: Option<String>) -> RepoFuture<'_, Vec<Pass>>;
}
