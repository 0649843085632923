use linkhop_core::{CacheError, StorageError};
use std::future::Future;
use std::time::Duration;

/// Bounds a store call on the caller's path.
pub(crate) async fn store_call<T, F>(limit: Duration, operation: &str, call: F) -> Result<T, StorageError>
where
    F: Future<Output = Result<T, StorageError>>,
{
    tokio::time::timeout(limit, call).await.unwrap_or_else(|_| {
        Err(StorageError::Timeout(format!(
            "{operation} exceeded {}ms",
            limit.as_millis()
        )))
    })
}

/// Bounds a cache call on the caller's path.
pub(crate) async fn cache_call<T, F>(limit: Duration, operation: &str, call: F) -> Result<T, CacheError>
where
    F: Future<Output = Result<T, CacheError>>,
{
    tokio::time::timeout(limit, call).await.unwrap_or_else(|_| {
        Err(CacheError::Timeout(format!(
            "{operation} exceeded {}ms",
            limit.as_millis()
        )))
    })
}
