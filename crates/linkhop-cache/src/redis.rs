use async_trait::async_trait;
use linkhop_core::cache::Result;
use linkhop_core::{CacheError, ShortCode, UrlCache, CACHE_KEY_PREFIX, DEFAULT_CACHE_TTL};
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, RedisError};
use std::time::Duration;
use tracing::{debug, trace, warn};

/// [`UrlCache`] backed by a shared Redis instance.
///
/// Each URL is a plain string under `<prefix><code>` written with `SETEX`, so
/// entries can be inspected and expired from `redis-cli` as usual.
#[derive(Debug, Clone)]
pub struct RedisUrlCache {
    conn: MultiplexedConnection,
    key_prefix: String,
    default_ttl: Duration,
}

fn classify(context: &'static str, err: RedisError) -> CacheError {
    let message = format!("{context}: {err}");
    if err.is_timeout() {
        CacheError::Timeout(message)
    } else if err.is_connection_dropped() || err.is_connection_refusal() {
        CacheError::Unavailable(message)
    } else {
        CacheError::Operation(message)
    }
}

impl RedisUrlCache {
    /// Wraps an open connection, using the `url:` key prefix.
    pub fn new(conn: MultiplexedConnection) -> Self {
        Self::with_prefix(conn, CACHE_KEY_PREFIX)
    }

    pub fn with_prefix(conn: MultiplexedConnection, key_prefix: impl Into<String>) -> Self {
        Self {
            conn,
            key_prefix: key_prefix.into(),
            default_ttl: DEFAULT_CACHE_TTL,
        }
    }

    /// Opens a multiplexed connection to `url` and wraps it.
    pub async fn connect(url: &str) -> Result<Self> {
        let client = redis::Client::open(url)
            .map_err(|e| CacheError::Initialization(format!("invalid redis url: {e}")))?;
        let conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| classify("connect", e))?;
        debug!("connected to redis cache");
        Ok(Self::new(conn))
    }

    /// TTL applied when a write does not carry one.
    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    fn key(&self, code: &ShortCode) -> String {
        [self.key_prefix.as_str(), code.as_str()].concat()
    }
}

#[async_trait]
impl UrlCache for RedisUrlCache {
    async fn get(&self, code: &ShortCode) -> Result<Option<String>> {
        let found: Option<String> = self
            .conn
            .clone()
            .get(self.key(code))
            .await
            .inspect_err(|e| warn!(code = %code, error = %e, "redis GET failed"))
            .map_err(|e| classify("get", e))?;

        trace!(code = %code, hit = found.is_some(), "redis lookup");
        Ok(found)
    }

    async fn set(&self, code: &ShortCode, original_url: &str, ttl: Option<Duration>) -> Result<()> {
        // SETEX rejects a zero expiry.
        let seconds = ttl.unwrap_or(self.default_ttl).as_secs().max(1);

        self.conn
            .clone()
            .set_ex::<_, _, ()>(self.key(code), original_url, seconds)
            .await
            .inspect_err(|e| warn!(code = %code, error = %e, "redis SETEX failed"))
            .map_err(|e| classify("set", e))?;

        trace!(code = %code, ttl_secs = seconds, "cached url in redis");
        Ok(())
    }

    async fn del(&self, code: &ShortCode) -> Result<()> {
        let removed: u64 = self
            .conn
            .clone()
            .del(self.key(code))
            .await
            .inspect_err(|e| warn!(code = %code, error = %e, "redis DEL failed"))
            .map_err(|e| classify("del", e))?;

        trace!(code = %code, removed, "evicted url from redis");
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        redis::cmd("PING")
            .query_async::<String>(&mut self.conn.clone())
            .await
            .map(drop)
            .map_err(|e| classify("ping", e))
    }
}
