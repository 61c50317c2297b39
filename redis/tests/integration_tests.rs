//! Integration tests for `RedisKeyValueStore` using testcontainers.
//!
//! Docker must be running. Run with `cargo test -p canteen-redis -- --ignored`.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use canteen_core::kv::{self, KeyValueStore};
use canteen_redis::RedisKeyValueStore;
use std::time::Duration;
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::redis::Redis;

async fn setup_store() -> (ContainerAsync<Redis>, RedisKeyValueStore) {
    let container = Redis::default()
        .start()
        .await
        .expect("Failed to start redis container");
    let port = container
        .get_host_port_ipv4(6379)
        .await
        .expect("Failed to get redis port");
    let url = format!("redis://127.0.0.1:{port}");

    let mut retries = 0;
    loop {
        if let Ok(store) = RedisKeyValueStore::new(&url).await {
            return (container, store);
        }
        assert!(retries < 30, "Failed to connect after 30 retries");
        retries += 1;
        tokio::time::sleep(Duration::from_secs(1)).await;
    }
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_incr_applies_ttl_on_create_only() {
    let (_container, store) = setup_store().await;

    assert_eq!(store.incr("rate_limit:scan:a", Duration::from_millis(400)).await.unwrap(), 1);
    assert_eq!(store.incr("rate_limit:scan:a", Duration::from_secs(600)).await.unwrap(), 2);

    tokio::time::sleep(Duration::from_millis(600)).await;
    assert_eq!(store.incr("rate_limit:scan:a", Duration::from_secs(60)).await.unwrap(), 1);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_json_round_trip_and_delete() {
    let (_container, store) = setup_store().await;

    kv::set_json(&store, "checkout:stash:cs_1", &vec![1_u32, 2, 3], Some(Duration::from_secs(60)))
        .await
        .unwrap();
    let value: Option<Vec<u32>> = kv::get_json(&store, "checkout:stash:cs_1").await.unwrap();
    assert_eq!(value, Some(vec![1, 2, 3]));

    assert!(store.delete("checkout:stash:cs_1").await.unwrap());
    assert!(!store.delete("checkout:stash:cs_1").await.unwrap());
    assert_eq!(store.get("checkout:stash:cs_1").await.unwrap(), None);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_expire_reports_missing_key() {
    let (_container, store) = setup_store().await;

    store.set("access_session:t", b"{}".to_vec(), None).await.unwrap();
    assert!(store.expire("access_session:t", Duration::from_millis(300)).await.unwrap());
    assert!(!store.expire("access_session:missing", Duration::from_secs(1)).await.unwrap());

    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(store.get("access_session:t").await.unwrap(), None);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_unreachable_server_is_unavailable() {
    let err = RedisKeyValueStore::new("redis://127.0.0.1:1").await.unwrap_err();
    assert!(matches!(err, canteen_core::KvError::Unavailable(_)));
}
