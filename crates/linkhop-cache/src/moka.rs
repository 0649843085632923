use async_trait::async_trait;
use linkhop_core::cache::Result;
use linkhop_core::{ShortCode, UrlCache, DEFAULT_CACHE_TTL};
use moka::future::Cache;
use moka::Expiry;
use std::time::{Duration, Instant};
use tracing::{debug, trace};
use typed_builder::TypedBuilder;

#[derive(Debug, Clone)]
struct Entry {
    original_url: String,
    ttl: Duration,
}

/// Expires each entry after the TTL it was written with.
struct EntryTtl;

impl Expiry<String, Entry> for EntryTtl {
    fn expire_after_create(&self, _key: &String, value: &Entry, _created_at: Instant) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &Entry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// Process-local [`UrlCache`] with a bounded capacity and per-entry TTL.
#[derive(Debug, Clone)]
pub struct MokaUrlCache {
    cache: Cache<String, Entry>,
    default_ttl: Duration,
}

impl MokaUrlCache {
    /// Creates a cache holding up to 10,000 entries with a 24 hour TTL.
    pub fn new() -> Self {
        Self::from_config(CacheConfig::default())
    }

    /// Creates a cache whose entries expire after `ttl` unless a write
    /// overrides it.
    pub fn with_ttl(max_capacity: u64, ttl: Duration) -> Self {
        Self::from_config(
            CacheConfig::builder()
                .max_capacity(max_capacity)
                .default_ttl(ttl)
                .build(),
        )
    }

    pub fn from_config(config: CacheConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(config.max_capacity)
            .expire_after(EntryTtl)
            .build();
        Self {
            cache,
            default_ttl: config.default_ttl,
        }
    }
}

impl Default for MokaUrlCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UrlCache for MokaUrlCache {
    async fn get(&self, code: &ShortCode) -> Result<Option<String>> {
        let found = self.cache.get(code.as_str()).await;
        trace!(code = %code, hit = found.is_some(), "local cache lookup");
        Ok(found.map(|entry| entry.original_url))
    }

    async fn set(&self, code: &ShortCode, original_url: &str, ttl: Option<Duration>) -> Result<()> {
        let ttl = ttl.unwrap_or(self.default_ttl);
        let entry = Entry {
            original_url: original_url.to_owned(),
            ttl,
        };
        self.cache.insert(code.as_str().to_owned(), entry).await;
        debug!(code = %code, ttl_secs = ttl.as_secs(), "cached url locally");
        Ok(())
    }

    async fn del(&self, code: &ShortCode) -> Result<()> {
        self.cache.invalidate(code.as_str()).await;
        trace!(code = %code, "evicted url from local cache");
        Ok(())
    }

    /// Always healthy; the cache lives in this process.
    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

/// Sizing and expiry for a [`MokaUrlCache`].
#[derive(Debug, Clone, TypedBuilder)]
pub struct CacheConfig {
    /// Maximum number of entries the cache can hold.
    #[builder(default = 10_000)]
    pub max_capacity: u64,

    /// TTL applied when a write does not carry its own.
    #[builder(default = DEFAULT_CACHE_TTL)]
    pub default_ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code(s: &str) -> ShortCode {
        ShortCode::new_unchecked(s)
    }

    #[tokio::test]
    async fn set_then_get_returns_url() {
        let cache = MokaUrlCache::new();
        let c = code("abc123");

        cache.set(&c, "https://example.com/page", None).await.unwrap();

        assert_eq!(
            cache.get(&c).await.unwrap().as_deref(),
            Some("https://example.com/page")
        );
    }

    #[tokio::test]
    async fn get_missing_is_none() {
        let cache = MokaUrlCache::new();
        assert!(cache.get(&code("nothere")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn set_overwrites_previous_value() {
        let cache = MokaUrlCache::new();
        let c = code("abc123");

        cache.set(&c, "https://example.com/one", None).await.unwrap();
        cache.set(&c, "https://example.com/two", None).await.unwrap();

        assert_eq!(
            cache.get(&c).await.unwrap().as_deref(),
            Some("https://example.com/two")
        );
    }

    #[tokio::test]
    async fn del_removes_entry_and_is_idempotent() {
        let cache = MokaUrlCache::new();
        let c = code("abc123");

        cache.set(&c, "https://example.com/page", None).await.unwrap();
        cache.del(&c).await.unwrap();
        cache.del(&c).await.unwrap();

        assert!(cache.get(&c).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn entries_expire_after_explicit_ttl() {
        let cache = MokaUrlCache::new();
        let c = code("short1");

        cache
            .set(&c, "https://example.com/page", Some(Duration::from_millis(50)))
            .await
            .unwrap();
        assert!(cache.get(&c).await.unwrap().is_some());

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(cache.get(&c).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn entries_expire_after_default_ttl() {
        let cache = MokaUrlCache::with_ttl(100, Duration::from_millis(50));
        let short = code("short1");
        let long = code("long1");

        cache.set(&short, "https://example.com/a", None).await.unwrap();
        cache
            .set(&long, "https://example.com/b", Some(Duration::from_secs(60)))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(cache.get(&short).await.unwrap().is_none());
        assert!(cache.get(&long).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn ping_always_succeeds() {
        assert!(MokaUrlCache::new().ping().await.is_ok());
    }

    #[test]
    fn config_defaults() {
        let config = CacheConfig::default();
        assert_eq!(config.max_capacity, 10_000);
        assert_eq!(config.default_ttl, DEFAULT_CACHE_TTL);
    }
}
