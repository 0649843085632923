//! Test doubles for the ports.

use async_trait::async_trait;
use linkhop_cache::MokaUrlCache;
use linkhop_core::cache::Result as CacheResult;
use linkhop_core::repository::Result as StoreResult;
use linkhop_core::{
    CacheError, Link, LinkRepository, ShortCode, Stats, StatsRepository, StorageError, UrlCache,
};
use linkhop_generator::{Generator, GeneratorError};
use linkhop_storage::{InMemoryLinkRepository, InMemoryStatsRepository};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Thread-safe call counter.
#[derive(Debug, Default)]
pub(crate) struct Calls(AtomicUsize);

impl Calls {
    pub(crate) fn hit(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

/// Hands out the queued codes, then repeats the last one forever.
pub(crate) struct ScriptedGenerator {
    codes: Mutex<VecDeque<&'static str>>,
    last: Mutex<&'static str>,
    pub(crate) calls: Calls,
}

impl ScriptedGenerator {
    pub(crate) fn new(codes: &[&'static str]) -> Self {
        Self {
            codes: Mutex::new(codes.iter().copied().collect()),
            last: Mutex::new(codes.last().copied().unwrap_or("fallback")),
            calls: Calls::default(),
        }
    }

    pub(crate) fn always(code: &'static str) -> Self {
        Self::new(&[code])
    }
}

impl Generator for ScriptedGenerator {
    fn generate(&self) -> Result<ShortCode, GeneratorError> {
        self.calls.hit();
        let next = self.codes.lock().unwrap().pop_front();
        let code = match next {
            Some(code) => {
                *self.last.lock().unwrap() = code;
                code
            }
            None => *self.last.lock().unwrap(),
        };
        Ok(ShortCode::new_unchecked(code))
    }
}

pub(crate) struct BrokenGenerator;

impl Generator for BrokenGenerator {
    fn generate(&self) -> Result<ShortCode, GeneratorError> {
        Err(GeneratorError::Entropy("no entropy".to_string()))
    }
}

/// Moka-backed cache that counts writes and can be switched to fail or hang.
#[derive(Default)]
pub(crate) struct SpyCache {
    inner: MokaUrlCache,
    pub(crate) sets: Calls,
    pub(crate) dels: Calls,
    mode: Mutex<CacheMode>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub(crate) enum CacheMode {
    #[default]
    Healthy,
    Failing,
    Hanging,
}

impl SpyCache {
    pub(crate) fn with_mode(mode: CacheMode) -> Self {
        let cache = Self::default();
        cache.set_mode(mode);
        cache
    }

    pub(crate) fn set_mode(&self, mode: CacheMode) {
        *self.mode.lock().unwrap() = mode;
    }

    async fn gate(&self) -> CacheResult<()> {
        let mode = *self.mode.lock().unwrap();
        match mode {
            CacheMode::Healthy => Ok(()),
            CacheMode::Failing => Err(CacheError::Unavailable("connection refused".to_string())),
            CacheMode::Hanging => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(())
            }
        }
    }

    /// Reads the backing cache directly, bypassing the failure mode.
    pub(crate) async fn peek(&self, code: &ShortCode) -> Option<String> {
        self.inner.get(code).await.ok().flatten()
    }
}

#[async_trait]
impl UrlCache for SpyCache {
    async fn get(&self, code: &ShortCode) -> CacheResult<Option<String>> {
        self.gate().await?;
        self.inner.get(code).await
    }

    async fn set(&self, code: &ShortCode, original_url: &str, ttl: Option<Duration>) -> CacheResult<()> {
        self.sets.hit();
        self.gate().await?;
        self.inner.set(code, original_url, ttl).await
    }

    async fn del(&self, code: &ShortCode) -> CacheResult<()> {
        self.dels.hit();
        self.gate().await?;
        self.inner.del(code).await
    }

    async fn ping(&self) -> CacheResult<()> {
        self.gate().await
    }
}

/// In-memory link store that counts reads and can be told to fail.
#[derive(Default)]
pub(crate) struct SpyLinkStore {
    inner: InMemoryLinkRepository,
    pub(crate) gets: Calls,
    pub(crate) inserts: Calls,
    fail_with: Mutex<Option<StorageError>>,
}

impl SpyLinkStore {
    pub(crate) fn failing(err: StorageError) -> Self {
        let store = Self::default();
        *store.fail_with.lock().unwrap() = Some(err);
        store
    }

    fn check(&self) -> StoreResult<()> {
        match self.fail_with.lock().unwrap().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl LinkRepository for SpyLinkStore {
    async fn list(&self) -> StoreResult<Vec<Link>> {
        self.check()?;
        self.inner.list().await
    }

    async fn get(&self, code: &ShortCode) -> StoreResult<Option<Link>> {
        self.gets.hit();
        self.check()?;
        self.inner.get(code).await
    }

    async fn insert(&self, link: &Link) -> StoreResult<()> {
        self.inserts.hit();
        self.check()?;
        self.inner.insert(link).await
    }

    async fn delete(&self, code: &ShortCode) -> StoreResult<bool> {
        self.check()?;
        self.inner.delete(code).await
    }
}

/// Stats store whose lookups fail for one chosen link id.
#[derive(Default)]
pub(crate) struct FlakyStatsStore {
    inner: InMemoryStatsRepository,
    broken_link: Option<&'static str>,
    slow_link: Option<&'static str>,
    fail_deletes: bool,
}

impl FlakyStatsStore {
    pub(crate) fn failing_for(link_id: &'static str) -> Self {
        Self {
            broken_link: Some(link_id),
            ..Self::default()
        }
    }

    pub(crate) fn hanging_for(link_id: &'static str) -> Self {
        Self {
            slow_link: Some(link_id),
            ..Self::default()
        }
    }

    pub(crate) fn failing_deletes() -> Self {
        Self {
            fail_deletes: true,
            ..Self::default()
        }
    }
}

#[async_trait]
impl StatsRepository for FlakyStatsStore {
    async fn insert(&self, stats: &Stats) -> StoreResult<()> {
        self.inner.insert(stats).await
    }

    async fn list_by_link(&self, link_id: &ShortCode) -> StoreResult<Vec<Stats>> {
        if self.broken_link == Some(link_id.as_str()) {
            return Err(StorageError::Unavailable("stats table offline".to_string()));
        }
        if self.slow_link == Some(link_id.as_str()) {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        self.inner.list_by_link(link_id).await
    }

    async fn delete_by_link(&self, link_id: &ShortCode) -> StoreResult<u64> {
        if self.fail_deletes {
            return Err(StorageError::Unavailable("stats table offline".to_string()));
        }
        self.inner.delete_by_link(link_id).await
    }
}
