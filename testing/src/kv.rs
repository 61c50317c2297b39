//! In-memory key-value store for tests.

use canteen_core::environment::Clock;
use canteen_core::kv::{KeyValueStore, KvError, KvFuture};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone)]
struct Entry {
    value: Vec<u8>,
    expires_at: Option<DateTime<Utc>>,
}

impl Entry {
    fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_none_or(|at| now < at)
    }
}

/// In-memory key-value store.
///
/// Expiry is evaluated lazily against the injected clock, so advancing a
/// [`FixedClock`](crate::FixedClock) past a key's TTL makes it disappear
/// without any background sweep. Counters are stored as decimal text, the
/// same representation Redis uses for `INCR`.
///
/// Calling [`set_unavailable(true)`](Self::set_unavailable) makes every
/// operation fail with [`KvError::Unavailable`].
#[derive(Clone)]
pub struct InMemoryKeyValueStore {
    entries: Arc<Mutex<HashMap<String, Entry>>>,
    clock: Arc<dyn Clock>,
    unavailable: Arc<AtomicBool>,
}

impl InMemoryKeyValueStore {
    /// Create an empty store driven by `clock`.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            clock,
            unavailable: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Simulate the backing store going down (or coming back).
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Whether a live (non-expired) value exists under `key`.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        let now = self.clock.now();
        self.entries
            .lock()
            .map(|entries| entries.get(key).is_some_and(|e| e.is_live(now)))
            .unwrap_or(false)
    }

    /// Number of live keys starting with `prefix`.
    #[must_use]
    pub fn count_prefix(&self, prefix: &str) -> usize {
        let now = self.clock.now();
        self.entries
            .lock()
            .map(|entries| {
                entries
                    .iter()
                    .filter(|(k, e)| k.starts_with(prefix) && e.is_live(now))
                    .count()
            })
            .unwrap_or(0)
    }

    fn with_entries<T>(
        &self,
        f: impl FnOnce(&mut HashMap<String, Entry>, DateTime<Utc>) -> Result<T, KvError>,
    ) -> Result<T, KvError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(KvError::Unavailable("simulated outage".to_string()));
        }
        let now = self.clock.now();
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| KvError::Unavailable("Mutex lock failed".to_string()))?;
        entries.retain(|_, e| e.is_live(now));
        f(&mut entries, now)
    }
}

fn deadline(now: DateTime<Utc>, ttl: Duration) -> Result<DateTime<Utc>, KvError> {
    chrono::Duration::from_std(ttl)
        .ok()
        .and_then(|ttl| now.checked_add_signed(ttl))
        .ok_or_else(|| KvError::Serialization("TTL out of range".to_string()))
}

impl KeyValueStore for InMemoryKeyValueStore {
    fn get(&self, key: &str) -> KvFuture<'_, Option<Vec<u8>>> {
        let result = self.with_entries(|entries, _| Ok(entries.get(key).map(|e| e.value.clone())));
        Box::pin(async move { result })
    }

    fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> KvFuture<'_, ()> {
        let result = self.with_entries(|entries, now| {
            let expires_at = ttl.map(|ttl| deadline(now, ttl)).transpose()?;
            entries.insert(key.to_string(), Entry { value, expires_at });
            Ok(())
        });
        Box::pin(async move { result })
    }

    fn incr(&self, key: &str, ttl: Duration) -> KvFuture<'_, i64> {
        let result = self.with_entries(|entries, now| {
            if let Some(entry) = entries.get_mut(key) {
                let current: i64 = std::str::from_utf8(&entry.value)
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .ok_or_else(|| {
                        KvError::Serialization(format!("value at {key} is not an integer"))
                    })?;
                let next = current.saturating_add(1);
                entry.value = next.to_string().into_bytes();
                Ok(next)
            } else {
                let expires_at = Some(deadline(now, ttl)?);
                entries.insert(
                    key.to_string(),
                    Entry {
                        value: b"1".to_vec(),
                        expires_at,
                    },
                );
                Ok(1)
            }
        });
        Box::pin(async move { result })
    }

    fn delete(&self, key: &str) -> KvFuture<'_, bool> {
        let result = self.with_entries(|entries, _| Ok(entries.remove(key).is_some()));
        Box::pin(async move { result })
    }

    fn expire(&self, key: &str, ttl: Duration) -> KvFuture<'_, bool> {
        let result = self.with_entries(|entries, now| match entries.get_mut(key) {
            Some(entry) => {
                entry.expires_at = Some(deadline(now, ttl)?);
                Ok(true)
            }
            None => Ok(false),
        });
        Box::pin(async move { result })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_clock;

    fn store() -> (InMemoryKeyValueStore, crate::FixedClock) {
        let clock = test_clock();
        (InMemoryKeyValueStore::new(Arc::new(clock.clone())), clock)
    }

    #[tokio::test]
    async fn test_incr_starts_at_one_and_expires() {
        let (kv, clock) = store();

        assert_eq!(kv.incr("k", Duration::from_secs(60)).await.unwrap(), 1);
        assert_eq!(kv.incr("k", Duration::from_secs(60)).await.unwrap(), 2);

        clock.advance(chrono::Duration::seconds(60));
        assert_eq!(kv.incr("k", Duration::from_secs(60)).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_incr_keeps_original_expiry() {
        let (kv, clock) = store();

        kv.incr("k", Duration::from_secs(60)).await.unwrap();
        clock.advance(chrono::Duration::seconds(59));
        assert_eq!(kv.incr("k", Duration::from_secs(60)).await.unwrap(), 2);
        clock.advance(chrono::Duration::seconds(1));
        assert_eq!(kv.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_set_get_delete() {
        let (kv, _) = store();

        kv.set("a", b"x".to_vec(), None).await.unwrap();
        assert_eq!(kv.get("a").await.unwrap(), Some(b"x".to_vec()));
        assert!(kv.delete("a").await.unwrap());
        assert!(!kv.delete("a").await.unwrap());
    }

    #[tokio::test]
    async fn test_expire_absent_key() {
        let (kv, _) = store();
        assert!(!kv.expire("missing", Duration::from_secs(5)).await.unwrap());
    }

    #[tokio::test]
    async fn test_simulated_outage() {
        let (kv, _) = store();
        kv.set_unavailable(true);
        assert!(matches!(
            kv.get("a").await,
            Err(KvError::Unavailable(_))
        ));
        kv.set_unavailable(false);
        assert_eq!(kv.get("a").await.unwrap(), None);
    }
}
