//! [`UrlCache`](linkhop_core::UrlCache) adapters.
//!
//! [`MokaUrlCache`] keeps entries in process memory and suits single-node
//! deployments and tests. [`RedisUrlCache`] shares entries between replicas.

pub mod moka;
pub mod redis;

pub use linkhop_core::cache::Result;
pub use linkhop_core::{CacheError, UrlCache};
pub use self::moka::{CacheConfig, MokaUrlCache};
pub use self::redis::RedisUrlCache;
