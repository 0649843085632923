//! Core types and traits for the linkhop URL shortener.
//!
//! This crate holds the domain model shared by every other crate, the port
//! traits the orchestration layer is written against, and the
//! [`TaskDispatcher`] used to run detached background work.

pub mod cache;
pub mod dispatcher;
pub mod error;
pub mod repository;
pub mod shortcode;
pub mod stats;

pub use cache::{UrlCache, CACHE_KEY_PREFIX, DEFAULT_CACHE_TTL};
pub use dispatcher::{DispatchError, DispatcherSettings, TaskDispatcher};
pub use error::{CacheError, CoreError, StorageError};
pub use repository::{Link, LinkRepository};
pub use shortcode::ShortCode;
pub use stats::{Platform, Stats, StatsRepository};
