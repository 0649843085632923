use crate::error::CacheError;
use crate::shortcode::ShortCode;
use async_trait::async_trait;
use std::time::Duration;

pub type Result<T> = std::result::Result<T, CacheError>;

/// Lifetime of a cache entry when the caller does not override it.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Prefix applied to every cache key at the adapter boundary.
pub const CACHE_KEY_PREFIX: &str = "url:";

/// A volatile cache of `short code -> original URL` projections.
///
/// The cache is never the source of truth. A miss is a normal outcome and is
/// reported as `Ok(None)`; callers are expected to fall back to the
/// authoritative store on a miss *or* an error.
#[async_trait]
pub trait UrlCache: Send + Sync + 'static {
    /// Get the cached URL for `code`.
    ///
    /// Returns `Ok(None)` if the key is not in the cache.
    async fn get(&self, code: &ShortCode) -> Result<Option<String>>;

    /// Store the URL for `code` with an optional TTL.
    ///
    /// If `ttl` is `None`, the instance's default TTL applies.
    async fn set(&self, code: &ShortCode, original_url: &str, ttl: Option<Duration>)
        -> Result<()>;

    /// Remove the entry for `code`.
    ///
    /// It is not an error if the key does not exist.
    async fn del(&self, code: &ShortCode) -> Result<()>;

    /// Checks that the backend is reachable.
    async fn ping(&self) -> Result<()>;
}
