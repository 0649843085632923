use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use linkhop_core::repository::Result;
use linkhop_core::{Link, LinkRepository, ShortCode, Stats, StatsRepository, StorageError};

/// In-memory implementation of [`LinkRepository`] using DashMap.
///
/// DashMap provides better concurrency than RwLock<HashMap> because it
/// uses sharded locks, allowing concurrent reads and writes to different
/// buckets without blocking.
#[derive(Debug, Default)]
pub struct InMemoryLinkRepository {
    storage: DashMap<String, Link>,
}

impl InMemoryLinkRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.storage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }
}

#[async_trait]
impl LinkRepository for InMemoryLinkRepository {
    async fn list(&self) -> Result<Vec<Link>> {
        let mut links: Vec<Link> = self.storage.iter().map(|e| e.value().clone()).collect();
        links.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(links)
    }

    async fn get(&self, code: &ShortCode) -> Result<Option<Link>> {
        Ok(self.storage.get(code.as_str()).map(|e| e.value().clone()))
    }

    async fn insert(&self, link: &Link) -> Result<()> {
        // The entry guard holds the shard lock, so check-and-insert is atomic.
        match self.storage.entry(link.id.as_str().to_owned()) {
            Entry::Occupied(_) => Err(StorageError::Conflict(link.id.to_string())),
            Entry::Vacant(slot) => {
                let mut stored = link.clone();
                stored.stats.clear();
                slot.insert(stored);
                Ok(())
            }
        }
    }

    async fn delete(&self, code: &ShortCode) -> Result<bool> {
        Ok(self.storage.remove(code.as_str()).is_some())
    }
}

/// In-memory implementation of [`StatsRepository`], grouped by link id.
#[derive(Debug, Default)]
pub struct InMemoryStatsRepository {
    storage: DashMap<String, Vec<Stats>>,
}

impl InMemoryStatsRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StatsRepository for InMemoryStatsRepository {
    async fn insert(&self, stats: &Stats) -> Result<()> {
        let mut events = self
            .storage
            .entry(stats.link_id.as_str().to_owned())
            .or_default();

        if events.iter().any(|existing| existing.id == stats.id) {
            return Err(StorageError::Conflict(stats.id.to_string()));
        }
        events.push(stats.clone());
        Ok(())
    }

    async fn list_by_link(&self, link_id: &ShortCode) -> Result<Vec<Stats>> {
        Ok(self
            .storage
            .get(link_id.as_str())
            .map(|events| events.value().clone())
            .unwrap_or_default())
    }

    async fn delete_by_link(&self, link_id: &ShortCode) -> Result<u64> {
        Ok(self
            .storage
            .remove(link_id.as_str())
            .map_or(0, |(_, events)| events.len() as u64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use linkhop_core::Platform;
    use std::sync::Arc;

    fn code(value: &str) -> ShortCode {
        ShortCode::new_unchecked(value)
    }

    #[tokio::test]
    async fn insert_and_get() {
        let repo = InMemoryLinkRepository::new();
        let link = Link::new(code("abc12345"), "https://example.com/page");

        repo.insert(&link).await.unwrap();

        let got = repo.get(&link.id).await.unwrap().unwrap();
        assert_eq!(got.original_url, "https://example.com/page");
        assert_eq!(got.created_at, link.created_at);
    }

    #[tokio::test]
    async fn get_missing_is_none() {
        let repo = InMemoryLinkRepository::new();
        assert!(repo.get(&code("missing1")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn insert_conflicts_on_existing_id() {
        let repo = InMemoryLinkRepository::new();
        let id = code("abc12345");

        repo.insert(&Link::new(id.clone(), "https://one.example/a"))
            .await
            .unwrap();
        let err = repo
            .insert(&Link::new(id.clone(), "https://two.example/b"))
            .await
            .unwrap_err();

        assert!(matches!(err, StorageError::Conflict(_)));
        assert_eq!(
            repo.get(&id).await.unwrap().unwrap().original_url,
            "https://one.example/a"
        );
    }

    #[tokio::test]
    async fn concurrent_inserts_of_one_id_admit_exactly_one() {
        let repo = Arc::new(InMemoryLinkRepository::new());
        let mut handles = Vec::new();
        for i in 0..16 {
            let repo = Arc::clone(&repo);
            handles.push(tokio::spawn(async move {
                repo.insert(&Link::new(
                    code("samecode"),
                    format!("https://example.com/{i}"),
                ))
                .await
            }));
        }

        let mut successes = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                successes += 1;
            }
        }
        assert_eq!(successes, 1);
        assert_eq!(repo.len(), 1);
    }

    #[tokio::test]
    async fn stats_are_never_persisted_with_links() {
        let repo = InMemoryLinkRepository::new();
        let mut link = Link::new(code("abc12345"), "https://example.com/page");
        link.stats.push(Stats::new(link.id.clone(), Platform::Twitter));

        repo.insert(&link).await.unwrap();

        assert!(repo.get(&link.id).await.unwrap().unwrap().stats.is_empty());
    }

    #[tokio::test]
    async fn delete_reports_existence() {
        let repo = InMemoryLinkRepository::new();
        let id = code("abc12345");
        repo.insert(&Link::new(id.clone(), "https://example.com/page"))
            .await
            .unwrap();

        assert!(repo.delete(&id).await.unwrap());
        assert!(!repo.delete(&id).await.unwrap());
        assert!(repo.get(&id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn list_returns_every_link() {
        let repo = InMemoryLinkRepository::new();
        for id in ["ccc11111", "aaa11111", "bbb11111"] {
            repo.insert(&Link::new(code(id), "https://example.com/page"))
                .await
                .unwrap();
        }

        let ids: Vec<_> = repo
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|link| link.id.to_string())
            .collect();
        assert_eq!(ids, ["aaa11111", "bbb11111", "ccc11111"]);
    }

    #[tokio::test]
    async fn stats_insert_list_and_delete() {
        let repo = InMemoryStatsRepository::new();
        let a = code("linkaaaa");
        let b = code("linkbbbb");

        repo.insert(&Stats::new(a.clone(), Platform::Instagram))
            .await
            .unwrap();
        repo.insert(&Stats::new(a.clone(), Platform::Unknown))
            .await
            .unwrap();
        repo.insert(&Stats::new(b.clone(), Platform::YouTube))
            .await
            .unwrap();

        assert_eq!(repo.list_by_link(&a).await.unwrap().len(), 2);
        assert_eq!(repo.list_by_link(&b).await.unwrap().len(), 1);

        assert_eq!(repo.delete_by_link(&a).await.unwrap(), 2);
        assert!(repo.list_by_link(&a).await.unwrap().is_empty());
        assert_eq!(repo.delete_by_link(&a).await.unwrap(), 0);
        assert_eq!(repo.list_by_link(&b).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn stats_insert_rejects_duplicate_event_id() {
        let repo = InMemoryStatsRepository::new();
        let event = Stats::new(code("linkaaaa"), Platform::Twitter);

        repo.insert(&event).await.unwrap();
        let err = repo.insert(&event).await.unwrap_err();

        assert!(matches!(err, StorageError::Conflict(_)));
    }
}
