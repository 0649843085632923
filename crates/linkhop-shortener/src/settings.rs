use linkhop_core::DEFAULT_CACHE_TTL;
use std::time::Duration;
use typed_builder::TypedBuilder;

/// Upper bound for every synchronous store or cache call made while a client
/// is waiting. Kept well below the 29s budget of typical API gateways.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(4);

#[derive(Debug, Clone, TypedBuilder)]
pub struct LinkServiceSettings {
    /// Generate-and-insert attempts before giving up on a create.
    #[builder(default = 3)]
    pub max_retries: u32,

    #[builder(default = DEFAULT_REQUEST_TIMEOUT)]
    pub request_timeout: Duration,

    /// TTL written with every cache population.
    #[builder(default = DEFAULT_CACHE_TTL)]
    pub cache_ttl: Duration,

    /// Lowercased host this deployment is served under, as returned by
    /// [`public_host`](crate::validate::public_host). URLs pointing at it are
    /// rejected so a short link can never redirect to another short link.
    #[builder(default, setter(strip_option, into))]
    pub public_host: Option<String>,
}

impl Default for LinkServiceSettings {
    fn default() -> Self {
        Self::builder().build()
    }
}

#[derive(Debug, Clone, Copy, TypedBuilder)]
pub struct StatsSettings {
    /// Maximum in-flight stats lookups while joining stats onto links.
    #[builder(default = 16)]
    pub max_concurrency: usize,

    #[builder(default = DEFAULT_REQUEST_TIMEOUT)]
    pub request_timeout: Duration,
}

impl Default for StatsSettings {
    fn default() -> Self {
        Self::builder().build()
    }
}
