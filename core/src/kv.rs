//! Ephemeral key-value store abstraction.
//!
//! Rate buckets, access sessions and pending checkout stashes all live in a
//! shared store that outlives any single request worker. The store must offer
//! per-key atomic increment and per-key expiry so that concurrent requests for
//! the same client or checkout reference observe consistent state.
//!
//! # Implementations
//!
//! - `RedisKeyValueStore` (in `canteen-redis`): production implementation
//! - `InMemoryKeyValueStore` (in `canteen-testing`): deterministic tests
//!
//! # Dyn Compatibility
//!
//! The trait returns explicit `Pin<Box<dyn Future>>` values instead of using
//! `async fn` so services can hold an `Arc<dyn KeyValueStore>`.

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use thiserror::Error;

/// Boxed future returned by [`KeyValueStore`] operations.
pub type KvFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, KvError>> + Send + 'a>>;

/// Errors raised by a key-value store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KvError {
    /// The backing store could not be reached or rejected the command.
    #[error("Key-value store unavailable: {0}")]
    Unavailable(String),

    /// A stored value could not be encoded or decoded.
    #[error("Key-value serialization error: {0}")]
    Serialization(String),
}

/// Shared ephemeral store with atomic increment and per-key expiry.
///
/// Keys are plain strings; callers namespace them (`rate_limit:`, `access_session:`,
/// `checkout:stash:`). Values are opaque bytes.
pub trait KeyValueStore: Send + Sync {
    /// Read a value. Expired keys read as `None`.
    ///
    /// # Errors
    ///
    /// Returns [`KvError::Unavailable`] if the store cannot be reached.
    fn get(&self, key: &str) -> KvFuture<'_, Option<Vec<u8>>>;

    /// Write a value, replacing any previous value and expiry.
    ///
    /// `ttl = None` stores the value without expiry.
    ///
    /// # Errors
    ///
    /// Returns [`KvError::Unavailable`] if the store cannot be reached.
    fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> KvFuture<'_, ()>;

    /// Atomically increment an integer counter and return the new value.
    ///
    /// When the key does not exist (never written, or its window lapsed) the
    /// counter starts from zero, so the first call returns `1`, and `ttl` is
    /// applied to the freshly created key. Existing keys keep their expiry.
    ///
    /// # Errors
    ///
    /// Returns [`KvError::Unavailable`] if the store cannot be reached.
    fn incr(&self, key: &str, ttl: Duration) -> KvFuture<'_, i64>;

    /// Delete a key. Returns `true` if the key existed.
    ///
    /// # Errors
    ///
    /// Returns [`KvError::Unavailable`] if the store cannot be reached.
    fn delete(&self, key: &str) -> KvFuture<'_, bool>;

    /// Reset the expiry of an existing key. Returns `false` if the key is absent.
    ///
    /// # Errors
    ///
    /// Returns [`KvError::Unavailable`] if the store cannot be reached.
    fn expire(&self, key: &str, ttl: Duration) -> KvFuture<'_, bool>;
}

/// Read a JSON-encoded value.
///
/// # Errors
///
/// Returns [`KvError::Serialization`] if the stored bytes are not valid JSON for `T`,
/// or the store's own error.
pub async fn get_json<T: DeserializeOwned>(
    kv: &dyn KeyValueStore,
    key: &str,
) -> Result<Option<T>, KvError> {
    match kv.get(key).await? {
        Some(bytes) => serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| KvError::Serialization(e.to_string())),
        None => Ok(None),
    }
}

/// Write a JSON-encoded value.
///
/// # Errors
///
/// Returns [`KvError::Serialization`] if `value` cannot be encoded, or the store's own error.
pub async fn set_json<T: Serialize + Sync>(
    kv: &dyn KeyValueStore,
    key: &str,
    value: &T,
    ttl: Option<Duration>,
) -> Result<(), KvError> {
    let bytes = serde_json::to_vec(value).map_err(|e| KvError::Serialization(e.to_string()))?;
    kv.set(key, bytes, ttl).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = KvError::Unavailable("connection refused".to_string());
        assert_eq!(
            err.to_string(),
            "Key-value store unavailable: connection refused"
        );
    }

    #[test]
    fn test_trait_is_dyn_compatible() {
        fn assert_dyn(_: Option<&dyn KeyValueStore>) {}
        assert_dyn(None);
    }
}
