//! 需要真实 Redis：`REDIS_URL=redis://127.0.0.1:6379 cargo test -- --ignored`

use std::time::Duration;

use furumaru_adapter_redis::{RedisCache, check_connection, create_connection_manager};
use furumaru_ports::CachePort;

async fn connect(namespace: &str) -> RedisCache {
    let url = std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string());
    let mut conn = create_connection_manager(&url).await.expect("redis connection");
    check_connection(&mut conn).await.expect("redis ping");
    RedisCache::new(conn, namespace)
}

#[tokio::test]
#[ignore]
async fn test_set_get_scan_delete() {
    let namespace = format!("furumaru-test-{}", std::process::id());
    let cache = connect(&namespace).await;

    cache.set("tokens:a", "1", Some(Duration::from_secs(30))).await.unwrap();
    cache.set("tokens:b", "2", Some(Duration::from_secs(30))).await.unwrap();
    cache.set("other:c", "3", Some(Duration::from_secs(30))).await.unwrap();

    assert_eq!(cache.get("tokens:a").await.unwrap().as_deref(), Some("1"));

    let mut values = cache.scan_prefix("tokens:").await.unwrap();
    values.sort();
    assert_eq!(values, vec!["1".to_string(), "2".to_string()]);

    cache
        .delete_many(&["tokens:a".to_string(), "tokens:b".to_string(), "other:c".to_string()])
        .await
        .unwrap();
    assert!(cache.get("tokens:a").await.unwrap().is_none());
    assert!(cache.scan_prefix("tokens:").await.unwrap().is_empty());
}

#[tokio::test]
#[ignore]
async fn test_ttl_expires_entry() {
    let namespace = format!("furumaru-ttl-{}", std::process::id());
    let cache = connect(&namespace).await;

    cache.set("k", "v", Some(Duration::from_secs(1))).await.unwrap();
    tokio::time::sleep(Duration::from_millis(2100)).await;

    assert!(cache.get("k").await.unwrap().is_none());
}
