//! Store adapters for links and redirect stats.

pub mod memory;
pub mod mysql;

pub use linkhop_core::{LinkRepository, StatsRepository, StorageError};
pub use memory::{InMemoryLinkRepository, InMemoryStatsRepository};
pub use mysql::{MySqlRepository, LIST_PAGE_SIZE};
