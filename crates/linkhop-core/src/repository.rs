use crate::error::StorageError;
use crate::shortcode::ShortCode;
use crate::stats::Stats;
use async_trait::async_trait;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// A shortened link as held by the authoritative store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    /// The short identifier. Unique and immutable once created.
    pub id: ShortCode,
    /// The original URL that was shortened.
    pub original_url: String,
    /// When the link was created.
    pub created_at: Timestamp,
    /// Redirect analytics joined onto the link for listings.
    ///
    /// Never persisted with the link; stores always return it empty.
    #[serde(default)]
    pub stats: Vec<Stats>,
}

impl Link {
    /// Creates a link stamped with the current time and no stats.
    pub fn new(id: ShortCode, original_url: impl Into<String>) -> Self {
        Self {
            id,
            original_url: original_url.into(),
            created_at: Timestamp::now(),
            stats: Vec::new(),
        }
    }
}

/// The authoritative store for links.
#[async_trait]
pub trait LinkRepository: Send + Sync + 'static {
    /// Returns every stored link, fully materialized.
    ///
    /// Implementations that page through their backend do so internally.
    async fn list(&self) -> Result<Vec<Link>>;

    /// Retrieves the link for a given short code.
    /// Returns `None` if the code does not exist.
    async fn get(&self, code: &ShortCode) -> Result<Option<Link>>;

    /// Inserts a new link only if its id is free.
    ///
    /// Returns `Err(StorageError::Conflict)` if the id already exists, so
    /// callers can tell a collision apart from a backend failure.
    async fn insert(&self, link: &Link) -> Result<()>;

    /// Deletes the link for a given short code.
    /// Returns `true` if the record existed and was removed.
    async fn delete(&self, code: &ShortCode) -> Result<bool>;
}
