use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    #[error("short code has {len} characters, expected {min} to {max}")]
    ShortCodeLength { len: usize, min: usize, max: usize },
    #[error("short code contains {found:?}, only [A-Za-z0-9_-] is allowed")]
    ShortCodeCharacter { found: char },
}

#[derive(Debug, Clone, Error)]
pub enum CacheError {
    #[error("cache backend unavailable: {0}")]
    Unavailable(String),
    #[error("cache operation timed out: {0}")]
    Timeout(String),
    #[error("cache serialization failed: {0}")]
    Serialization(String),
    #[error("cache value is invalid: {0}")]
    InvalidData(String),
    #[error("cache initialization failed: {0}")]
    Initialization(String),
    #[error("cache operation failed: {0}")]
    Operation(String),
}

/// Errors reported by the authoritative stores.
///
/// [`StorageError::Conflict`] is the only variant the link orchestrator
/// treats as retryable: it signals that a conditional create hit an id that
/// is already taken.
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    #[error("id already exists: {0}")]
    Conflict(String),
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
    #[error("storage operation timed out: {0}")]
    Timeout(String),
    #[error("storage query failed: {0}")]
    Query(String),
    #[error("stored data is invalid: {0}")]
    InvalidData(String),
    #[error("storage operation failed: {0}")]
    Operation(String),
}
