//! Link orchestration and redirect analytics.
//!
//! [`LinkService`] owns the create / resolve / delete protocol between the
//! authoritative store and the cache. [`StatsService`] records redirect
//! events and joins them onto link listings.

pub mod error;
pub mod link;
pub mod settings;
pub mod stats;
pub mod validate;

mod deadline;
#[cfg(test)]
mod testing;

pub use error::LinkError;
pub use link::LinkService;
pub use settings::{LinkServiceSettings, StatsSettings, DEFAULT_REQUEST_TIMEOUT};
pub use stats::{LinkStats, StatsService};
pub use validate::{public_host, MIN_URL_LENGTH};
