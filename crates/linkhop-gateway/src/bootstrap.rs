//! Wires adapters and services together from an [`AppConfig`].

use crate::config::{AppConfig, CacheConfig, StorageConfig};
use crate::state::AppState;
use anyhow::Context;
use linkhop_cache::{MokaUrlCache, RedisUrlCache};
use linkhop_core::{LinkRepository, StatsRepository, TaskDispatcher, UrlCache};
use linkhop_generator::RandomGenerator;
use linkhop_shortener::{LinkService, StatsService};
use linkhop_storage::{InMemoryLinkRepository, InMemoryStatsRepository, MySqlRepository};
use std::sync::Arc;
use tracing::info;

/// Connects the configured backends and starts the task dispatcher.
///
/// The returned dispatcher is the one the services submit to; shut it down
/// after the server stops so queued cache and stats writes are not lost.
pub async fn build_state(config: &AppConfig) -> anyhow::Result<(AppState, TaskDispatcher)> {
    let (links, stats) = match &config.storage {
        StorageConfig::InMemory => {
            let links: Arc<dyn LinkRepository> = Arc::new(InMemoryLinkRepository::new());
            let stats: Arc<dyn StatsRepository> = Arc::new(InMemoryStatsRepository::new());
            (links, stats)
        }
        StorageConfig::MySql { dsn } => {
            let repository = MySqlRepository::connect(dsn)
                .await
                .context("failed to connect to MySQL")?;
            repository.migrate().await.context("failed to migrate MySQL schema")?;

            let repository = Arc::new(repository);
            let links: Arc<dyn LinkRepository> = repository.clone();
            let stats: Arc<dyn StatsRepository> = repository;
            (links, stats)
        }
    };

    let cache: Arc<dyn UrlCache> = match &config.cache {
        CacheConfig::InMemory { capacity } => Arc::new(MokaUrlCache::with_ttl(*capacity, config.link.cache_ttl)),
        CacheConfig::Redis { url } => Arc::new(
            RedisUrlCache::connect(url)
                .await
                .context("failed to connect to Redis")?
                .with_default_ttl(config.link.cache_ttl),
        ),
    };

    info!(
        storage = config.storage_kind(),
        cache = config.cache_kind(),
        "Backends ready"
    );

    let dispatcher = TaskDispatcher::start(config.dispatcher);
    let link_service = LinkService::new(
        links,
        cache,
        Arc::new(RandomGenerator::new(config.id_length)),
        dispatcher.clone(),
        config.link.clone(),
    );
    let stats_service = StatsService::new(stats, dispatcher.clone(), config.stats);

    Ok((AppState::new(link_service, stats_service), dispatcher))
}
