use crate::deadline::store_call;
use crate::settings::StatsSettings;
use crate::LinkError;
use linkhop_core::{Link, Platform, ShortCode, Stats, StatsRepository, TaskDispatcher};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, trace, warn};

/// Click totals for one link.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkStats {
    pub link_id: ShortCode,
    pub total_clicks: u64,
    pub platform_counts: BTreeMap<Platform, u64>,
    pub details: Vec<Stats>,
}

impl LinkStats {
    fn from_events(link_id: ShortCode, details: Vec<Stats>) -> Self {
        let mut platform_counts = BTreeMap::new();
        for event in &details {
            *platform_counts.entry(event.platform).or_insert(0) += 1;
        }

        Self {
            link_id,
            total_clicks: details.len() as u64,
            platform_counts,
            details,
        }
    }
}

/// Records redirect events and aggregates them per link.
#[derive(Clone)]
pub struct StatsService {
    stats: Arc<dyn StatsRepository>,
    dispatcher: TaskDispatcher,
    settings: StatsSettings,
}

impl std::fmt::Debug for StatsService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatsService")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl StatsService {
    pub fn new(
        stats: Arc<dyn StatsRepository>,
        dispatcher: TaskDispatcher,
        settings: StatsSettings,
    ) -> Self {
        Self {
            stats,
            dispatcher,
            settings,
        }
    }

    /// Queues a redirect event for `link_id`. Never waits on the store.
    pub fn record(&self, link_id: &ShortCode, platform: Platform) {
        let event = Stats::new(link_id.clone(), platform);
        let stats = Arc::clone(&self.stats);

        self.dispatcher.dispatch("stats.record", async move {
            stats.insert(&event).await?;
            trace!(code = %event.link_id, platform = %event.platform, "Recorded redirect");
            Ok(())
        });
    }

    /// Stores one event while the caller waits.
    pub async fn create(&self, event: &Stats) -> Result<(), LinkError> {
        Ok(store_call(
            self.settings.request_timeout,
            "stats insert",
            self.stats.insert(event),
        )
        .await?)
    }

    pub async fn aggregate_by_link(&self, link_id: &ShortCode) -> Result<LinkStats, LinkError> {
        let details = store_call(
            self.settings.request_timeout,
            "stats list",
            self.stats.list_by_link(link_id),
        )
        .await?;

        Ok(LinkStats::from_events(link_id.clone(), details))
    }

    /// Fills `stats` on every link, fetching at most `max_concurrency` at a
    /// time.
    ///
    /// A link whose lookup fails or times out keeps empty stats; the rest of
    /// the listing is unaffected. Output order matches input order.
    pub async fn join_stats_onto_links(&self, mut links: Vec<Link>) -> Vec<Link> {
        let permits = Arc::new(Semaphore::new(self.settings.max_concurrency.max(1)));
        let mut lookups = JoinSet::new();

        for (index, link) in links.iter_mut().enumerate() {
            link.stats.clear();

            let permits = Arc::clone(&permits);
            let stats = Arc::clone(&self.stats);
            let link_id = link.id.clone();
            let limit = self.settings.request_timeout;

            lookups.spawn(async move {
                let _permit = permits.acquire_owned().await;
                let fetched = store_call(limit, "stats list", stats.list_by_link(&link_id)).await;
                (index, link_id, fetched)
            });
        }

        while let Some(joined) = lookups.join_next().await {
            match joined {
                Ok((index, _, Ok(events))) => links[index].stats = events,
                Ok((_, link_id, Err(e))) => {
                    warn!(code = %link_id, error = %e, "Failed to fetch stats for link");
                }
                Err(e) => warn!(error = %e, "Stats lookup task failed"),
            }
        }

        debug!(count = links.len(), "Joined stats onto links");
        links
    }

    /// Removes every event recorded for `link_id`.
    pub async fn delete_for_link(&self, link_id: &ShortCode) -> Result<u64, LinkError> {
        let removed = store_call(
            self.settings.request_timeout,
            "stats delete",
            self.stats.delete_by_link(link_id),
        )
        .await?;
        debug!(code = %link_id, removed, "Deleted stats for link");
        Ok(removed)
    }
}
