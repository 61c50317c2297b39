//! `Redis` implementation of [`KeyValueStore`].
//!
//! Every request worker shares one `Redis`, so rate buckets, access
//! sessions and pending checkouts are consistent across processes.
//!
//! # Atomic increment
//!
//! `INCR` followed by `PEXPIRE` is two round trips, and a crash between them
//! would leave a counter that never expires. [`KeyValueStore::incr`] runs
//! both in one Lua script, applying the TTL only when the key was created.
//!
//! # Example
//!
//! ```no_run
//! use canteen_core::kv::KeyValueStore;
//! use canteen_redis::RedisKeyValueStore;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let kv = RedisKeyValueStore::new("redis://127.0.0.1:6379").await?;
//! let attempts = kv.incr("rate_limit:scan:203.0.113.9", Duration::from_secs(60)).await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use canteen_core::kv::{KeyValueStore, KvError, KvFuture};
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client, Script};
use std::time::Duration;

const INCR_WITH_TTL: &str = r"
    local value = redis.call('INCR', KEYS[1])
    if value == 1 then
        redis.call('PEXPIRE', KEYS[1], ARGV[1])
    end
    return value
";

/// `Redis`-backed key-value store.
///
/// Clones share the same `ConnectionManager`.
#[derive(Clone)]
pub struct RedisKeyValueStore {
    conn_manager: ConnectionManager,
    incr_script: Script,
}

impl std::fmt::Debug for RedisKeyValueStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisKeyValueStore").finish_non_exhaustive()
    }
}

impl RedisKeyValueStore {
    /// Connect to `Redis`.
    ///
    /// # Errors
    ///
    /// Returns [`KvError::Unavailable`] if the URL is invalid or the
    /// connection cannot be established.
    pub async fn new(redis_url: &str) -> Result<Self, KvError> {
        let client = Client::open(redis_url)
            .map_err(|e| KvError::Unavailable(format!("Failed to create Redis client: {e}")))?;

        let conn_manager = ConnectionManager::new(client).await.map_err(|e| {
            KvError::Unavailable(format!("Failed to create Redis connection manager: {e}"))
        })?;

        tracing::info!("Connected to Redis");
        Ok(Self {
            conn_manager,
            incr_script: Script::new(INCR_WITH_TTL),
        })
    }
}

/// Milliseconds for `PX`/`PEXPIRE`, at least 1 so a TTL never deletes outright.
fn millis(ttl: Duration) -> u64 {
    u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1)
}

fn unavailable(context: &str) -> impl Fn(redis::RedisError) -> KvError + '_ {
    move |e| KvError::Unavailable(format!("{context}: {e}"))
}

impl KeyValueStore for RedisKeyValueStore {
    fn get(&self, key: &str) -> KvFuture<'_, Option<Vec<u8>>> {
        let mut conn = self.conn_manager.clone();
        let key = key.to_string();
        Box::pin(async move {
            conn.get::<_, Option<Vec<u8>>>(&key)
                .await
                .map_err(unavailable("Failed to read key"))
        })
    }

    fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> KvFuture<'_, ()> {
        let mut conn = self.conn_manager.clone();
        let key = key.to_string();
        Box::pin(async move {
            match ttl {
                Some(ttl) => conn
                    .pset_ex::<_, _, ()>(&key, value, millis(ttl))
                    .await
                    .map_err(unavailable("Failed to write key")),
                None => conn
                    .set::<_, _, ()>(&key, value)
                    .await
                    .map_err(unavailable("Failed to write key")),
            }
        })
    }

    fn incr(&self, key: &str, ttl: Duration) -> KvFuture<'_, i64> {
        let mut conn = self.conn_manager.clone();
        let key = key.to_string();
        Box::pin(async move {
            let value: i64 = self
                .incr_script
                .key(&key)
                .arg(millis(ttl))
                .invoke_async(&mut conn)
                .await
                .map_err(unavailable("Failed to increment counter"))?;
            Ok(value)
        })
    }

    fn delete(&self, key: &str) -> KvFuture<'_, bool> {
        let mut conn = self.conn_manager.clone();
        let key = key.to_string();
        Box::pin(async move {
            let removed: i64 = conn
                .del(&key)
                .await
                .map_err(unavailable("Failed to delete key"))?;
            Ok(removed > 0)
        })
    }

    fn expire(&self, key: &str, ttl: Duration) -> KvFuture<'_, bool> {
        let mut conn = self.conn_manager.clone();
        let key = key.to_string();
        Box::pin(async move {
            let ms = i64::try_from(millis(ttl)).unwrap_or(i64::MAX);
            conn.pexpire::<_, bool>(&key, ms)
                .await
                .map_err(unavailable("Failed to set expiry"))
        })
    }
}
