use std::time::Duration;

use linkhop_cache::RedisUrlCache;
use linkhop_core::{ShortCode, UrlCache};
use linkhop_test_infra::RedisServer;
use redis::AsyncCommands;

/// Test fixture that manages a Redis container using test-infra.
struct Fixture {
    #[allow(dead_code)]
    server: RedisServer,
    conn: redis::aio::MultiplexedConnection,
}

impl Fixture {
    async fn start() -> Self {
        let server = RedisServer::new().await.expect("Failed to start Redis");
        let conn = server
            .connection()
            .await
            .expect("Failed to get Redis connection");
        Self { server, conn }
    }

    fn cache(&self) -> RedisUrlCache {
        RedisUrlCache::new(self.conn.clone())
    }
}

fn code(s: &str) -> ShortCode {
    ShortCode::new(s).unwrap()
}

#[tokio::test]
#[ignore = "requires docker"]
async fn test_redis_cache_basic_get_set() {
    let fixture = Fixture::start().await;
    let cache = fixture.cache();
    let c = code("test123");

    assert!(cache.get(&c).await.unwrap().is_none());

    cache.set(&c, "https://example.com/page", None).await.unwrap();

    assert_eq!(
        cache.get(&c).await.unwrap().as_deref(),
        Some("https://example.com/page")
    );
}

#[tokio::test]
#[ignore = "requires docker"]
async fn test_redis_cache_uses_url_prefix_and_ttl() {
    let fixture = Fixture::start().await;
    let cache = fixture.cache();
    let c = code("prefixed1");

    cache
        .set(&c, "https://example.com/page", Some(Duration::from_secs(120)))
        .await
        .unwrap();

    let mut conn = fixture.conn.clone();
    let raw: Option<String> = conn.get("url:prefixed1").await.unwrap();
    assert_eq!(raw.as_deref(), Some("https://example.com/page"));

    let ttl: i64 = conn.ttl("url:prefixed1").await.unwrap();
    assert!(ttl > 0 && ttl <= 120, "unexpected ttl {ttl}");
}

#[tokio::test]
#[ignore = "requires docker"]
async fn test_redis_cache_default_ttl_is_one_day() {
    let fixture = Fixture::start().await;
    let cache = fixture.cache();
    let c = code("daylong1");

    cache.set(&c, "https://example.com/page", None).await.unwrap();

    let mut conn = fixture.conn.clone();
    let ttl: i64 = conn.ttl("url:daylong1").await.unwrap();
    assert!(ttl > 24 * 60 * 60 - 10 && ttl <= 24 * 60 * 60);
}

#[tokio::test]
#[ignore = "requires docker"]
async fn test_redis_cache_entry_expires() {
    let fixture = Fixture::start().await;
    let cache = fixture.cache();
    let c = code("expiring1");

    cache
        .set(&c, "https://example.com/page", Some(Duration::from_secs(1)))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(2_100)).await;

    assert!(cache.get(&c).await.unwrap().is_none());
}

#[tokio::test]
#[ignore = "requires docker"]
async fn test_redis_cache_delete() {
    let fixture = Fixture::start().await;
    let cache = fixture.cache();
    let c = code("delete1");

    cache.set(&c, "https://example.com/page", None).await.unwrap();
    cache.del(&c).await.unwrap();
    cache.del(&c).await.unwrap();

    assert!(cache.get(&c).await.unwrap().is_none());
}

#[tokio::test]
#[ignore = "requires docker"]
async fn test_redis_cache_ping() {
    let fixture = Fixture::start().await;
    fixture.cache().ping().await.unwrap();
}
