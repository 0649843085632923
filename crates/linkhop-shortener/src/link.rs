use crate::deadline::{cache_call, store_call};
use crate::settings::LinkServiceSettings;
use crate::validate::validate_url;
use crate::LinkError;
use linkhop_core::{Link, LinkRepository, ShortCode, StorageError, TaskDispatcher, UrlCache};
use linkhop_generator::Generator;
use std::sync::Arc;
use tracing::{debug, info, trace, warn};

/// Orchestrates links between the authoritative store and the cache.
///
/// The store is always written first and is the only source of truth. Cache
/// writes and invalidations run on the [`TaskDispatcher`] after the store
/// call has succeeded, so a cache outage can slow nothing down and fail
/// nothing.
#[derive(Clone)]
pub struct LinkService {
    links: Arc<dyn LinkRepository>,
    cache: Arc<dyn UrlCache>,
    generator: Arc<dyn Generator>,
    dispatcher: TaskDispatcher,
    settings: LinkServiceSettings,
}

impl std::fmt::Debug for LinkService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkService")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl LinkService {
    pub fn new(
        links: Arc<dyn LinkRepository>,
        cache: Arc<dyn UrlCache>,
        generator: Arc<dyn Generator>,
        dispatcher: TaskDispatcher,
        settings: LinkServiceSettings,
    ) -> Self {
        Self {
            links,
            cache,
            generator,
            dispatcher,
            settings,
        }
    }

    pub fn settings(&self) -> &LinkServiceSettings {
        &self.settings
    }

    /// Validates `original_url` and stores it under a freshly generated id.
    ///
    /// A store conflict means the id was taken, so another id is drawn, up to
    /// `max_retries` times. Any other store error ends the attempt at once.
    pub async fn create(&self, original_url: &str) -> Result<Link, LinkError> {
        validate_url(original_url, self.settings.public_host.as_deref())?;

        let max_retries = self.settings.max_retries;
        for attempt in 1..=max_retries {
            let link = Link::new(self.generator.generate()?, original_url);

            let inserted = store_call(
                self.settings.request_timeout,
                "link insert",
                self.links.insert(&link),
            )
            .await;

            match inserted {
                Ok(()) => {
                    info!(code = %link.id, attempt, "Created link");
                    self.populate_cache(&link.id, &link.original_url);
                    return Ok(link);
                }
                Err(StorageError::Conflict(_)) => {
                    debug!(code = %link.id, attempt, max_retries, "Id already taken, drawing another");
                }
                Err(e) => {
                    warn!(code = %link.id, attempt, error = %e, "Failed to store link");
                    return Err(e.into());
                }
            }
        }

        warn!(attempts = max_retries, "Gave up creating link after repeated id collisions");
        Err(LinkError::CollisionExhausted {
            attempts: max_retries,
        })
    }

    /// Returns the original URL for `code`.
    ///
    /// The cache is consulted first. A miss, a cache error, or a cache
    /// timeout all fall through to the store; on a store hit the cache is
    /// repopulated in the background.
    pub async fn resolve(&self, code: &ShortCode) -> Result<String, LinkError> {
        match cache_call(self.settings.request_timeout, "cache get", self.cache.get(code)).await {
            Ok(Some(url)) if !url.is_empty() => {
                debug!(code = %code, "Resolved from cache");
                return Ok(url);
            }
            Ok(_) => trace!(code = %code, "Cache miss"),
            Err(e) => warn!(code = %code, error = %e, "Cache read failed, falling back to store"),
        }

        let link = store_call(self.settings.request_timeout, "link get", self.links.get(code))
            .await?
            .filter(|link| !link.original_url.is_empty())
            .ok_or_else(|| LinkError::NotFound(code.to_string()))?;

        debug!(code = %code, "Resolved from store");
        self.populate_cache(code, &link.original_url);
        Ok(link.original_url)
    }

    /// Deletes the link from the store, then invalidates the cache entry in
    /// the background.
    ///
    /// Returns whether the link existed. Deleting an unknown id is not an
    /// error.
    pub async fn delete(&self, code: &ShortCode) -> Result<bool, LinkError> {
        let existed =
            store_call(self.settings.request_timeout, "link delete", self.links.delete(code)).await?;
        info!(code = %code, existed, "Deleted link");

        let cache = Arc::clone(&self.cache);
        let code = code.clone();
        self.dispatcher.dispatch("cache.invalidate", async move {
            cache.del(&code).await?;
            trace!(code = %code, "Invalidated cache entry");
            Ok(())
        });

        Ok(existed)
    }

    /// Every stored link, without stats.
    pub async fn list(&self) -> Result<Vec<Link>, LinkError> {
        Ok(store_call(self.settings.request_timeout, "link list", self.links.list()).await?)
    }

    /// Reports whether the cache answers within the request timeout.
    pub async fn cache_healthy(&self) -> bool {
        match cache_call(self.settings.request_timeout, "cache ping", self.cache.ping()).await {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "Cache health check failed");
                false
            }
        }
    }

    fn populate_cache(&self, code: &ShortCode, original_url: &str) {
        let cache = Arc::clone(&self.cache);
        let code = code.clone();
        let original_url = original_url.to_owned();
        let ttl = self.settings.cache_ttl;

        self.dispatcher.dispatch("cache.populate", async move {
            cache.set(&code, &original_url, Some(ttl)).await?;
            trace!(code = %code, "Populated cache entry");
            Ok(())
        });
    }
}
