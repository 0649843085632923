use clap::{Parser, ValueEnum};
use linkhop_core::DispatcherSettings;
use linkhop_generator::DEFAULT_ID_LENGTH;
use linkhop_shortener::{public_host, LinkServiceSettings, StatsSettings};
use linkhop_telemetry::{LogFormat, TelemetryConfig};
use std::fmt::{Display, Formatter};
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;

pub const LISTEN_ADDR_ENV: &str = "LINKHOP_LISTEN_ADDR";
pub const STORAGE_BACKEND_ENV: &str = "LINKHOP_STORAGE_BACKEND";
pub const MYSQL_DSN_ENV: &str = "LINKHOP_MYSQL_DSN";
pub const CACHE_BACKEND_ENV: &str = "LINKHOP_CACHE_BACKEND";
pub const REDIS_URL_ENV: &str = "LINKHOP_REDIS_URL";
pub const CACHE_CAPACITY_ENV: &str = "LINKHOP_CACHE_CAPACITY";
pub const CACHE_TTL_SECS_ENV: &str = "LINKHOP_CACHE_TTL_SECS";
pub const REQUEST_TIMEOUT_MS_ENV: &str = "LINKHOP_REQUEST_TIMEOUT_MS";
pub const ID_LENGTH_ENV: &str = "LINKHOP_ID_LENGTH";
pub const MAX_RETRIES_ENV: &str = "LINKHOP_MAX_RETRIES";
pub const STATS_CONCURRENCY_ENV: &str = "LINKHOP_STATS_CONCURRENCY";
pub const DISPATCH_QUEUE_ENV: &str = "LINKHOP_DISPATCH_QUEUE";
pub const DISPATCH_CONCURRENCY_ENV: &str = "LINKHOP_DISPATCH_CONCURRENCY";
pub const DISPATCH_TIMEOUT_MS_ENV: &str = "LINKHOP_DISPATCH_TIMEOUT_MS";
pub const PUBLIC_BASE_URL_ENV: &str = "LINKHOP_PUBLIC_BASE_URL";
pub const LOG_FORMAT_ENV: &str = "LINKHOP_LOG_FORMAT";
pub const OTLP_ENDPOINT_ENV: &str = "LINKHOP_OTLP_ENDPOINT";

pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8080";

/// Request deadlines must stay below the 29s budget of the API gateway in
/// front of the service.
const MAX_REQUEST_TIMEOUT_MS: u64 = 28_999;
const MAX_DISPATCH_TIMEOUT_MS: u64 = 300_000;
const MAX_CACHE_TTL_SECS: u64 = 365 * 86_400;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StorageBackendArg {
    #[value(name = "in-memory")]
    InMemory,
    #[value(name = "mysql")]
    Mysql,
}

impl Display for StorageBackendArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageBackendArg::InMemory => write!(f, "in-memory"),
            StorageBackendArg::Mysql => write!(f, "mysql"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CacheBackendArg {
    #[value(name = "in-memory")]
    InMemory,
    #[value(name = "redis")]
    Redis,
}

impl Display for CacheBackendArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheBackendArg::InMemory => write!(f, "in-memory"),
            CacheBackendArg::Redis => write!(f, "redis"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormatArg {
    Text,
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(value: LogFormatArg) -> Self {
        match value {
            LogFormatArg::Text => LogFormat::Text,
            LogFormatArg::Json => LogFormat::Json,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "linkhop", about = "URL shortener with redirect analytics")]
pub struct Cli {
    #[arg(long, env = LISTEN_ADDR_ENV, default_value = DEFAULT_LISTEN_ADDR)]
    pub listen_addr: SocketAddr,

    #[arg(
        long,
        env = STORAGE_BACKEND_ENV,
        value_enum,
        default_value_t = StorageBackendArg::InMemory
    )]
    pub storage: StorageBackendArg,

    #[arg(long, env = MYSQL_DSN_ENV, required_if_eq("storage", "mysql"))]
    pub mysql_dsn: Option<String>,

    #[arg(
        long,
        env = CACHE_BACKEND_ENV,
        value_enum,
        default_value_t = CacheBackendArg::InMemory
    )]
    pub cache: CacheBackendArg,

    #[arg(long, env = REDIS_URL_ENV, required_if_eq("cache", "redis"))]
    pub redis_url: Option<String>,

    /// Entries held by the in-memory cache.
    #[arg(long, env = CACHE_CAPACITY_ENV, default_value_t = 10_000)]
    pub cache_capacity: u64,

    #[arg(long, env = CACHE_TTL_SECS_ENV, default_value_t = 86_400)]
    pub cache_ttl_secs: u64,

    /// Bound on each store or cache call made while a client waits.
    #[arg(long, env = REQUEST_TIMEOUT_MS_ENV, default_value_t = 4_000)]
    pub request_timeout_ms: u64,

    #[arg(long, env = ID_LENGTH_ENV, default_value_t = DEFAULT_ID_LENGTH)]
    pub id_length: usize,

    #[arg(long, env = MAX_RETRIES_ENV, default_value_t = 3)]
    pub max_retries: u32,

    #[arg(long, env = STATS_CONCURRENCY_ENV, default_value_t = 16)]
    pub stats_concurrency: usize,

    #[arg(long, env = DISPATCH_QUEUE_ENV, default_value_t = 1024)]
    pub dispatch_queue: usize,

    #[arg(long, env = DISPATCH_CONCURRENCY_ENV, default_value_t = 32)]
    pub dispatch_concurrency: usize,

    #[arg(long, env = DISPATCH_TIMEOUT_MS_ENV, default_value_t = 5_000)]
    pub dispatch_timeout_ms: u64,

    /// Public URL this deployment is served under; links to it are refused.
    #[arg(long, env = PUBLIC_BASE_URL_ENV)]
    pub public_base_url: Option<String>,

    #[arg(long, env = LOG_FORMAT_ENV, value_enum, default_value_t = LogFormatArg::Text)]
    pub log_format: LogFormatArg,

    #[arg(long, env = OTLP_ENDPOINT_ENV)]
    pub otlp_endpoint: Option<String>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("--mysql-dsn is required when the storage backend is mysql")]
    MissingMysqlDsn,
    #[error("--redis-url is required when the cache backend is redis")]
    MissingRedisUrl,
    #[error("--public-base-url has no usable host: {0:?}")]
    InvalidPublicBaseUrl(String),
    #[error("{name} must be between {min} and {max}, got {value}")]
    OutOfRange {
        name: &'static str,
        value: u64,
        min: u64,
        max: u64,
    },
}

fn in_range(name: &'static str, value: u64, min: u64, max: u64) -> Result<(), ConfigError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            name,
            value,
            min,
            max,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageConfig {
    InMemory,
    MySql { dsn: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheConfig {
    InMemory { capacity: u64 },
    Redis { url: String },
}

/// Everything the process needs, resolved once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub listen_addr: SocketAddr,
    pub storage: StorageConfig,
    pub cache: CacheConfig,
    pub id_length: usize,
    pub link: LinkServiceSettings,
    pub stats: StatsSettings,
    pub dispatcher: DispatcherSettings,
    pub telemetry: TelemetryConfig,
}

impl Default for AppConfig {
    /// In-memory store and cache with every other setting at its default.
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            storage: StorageConfig::InMemory,
            cache: CacheConfig::InMemory { capacity: 10_000 },
            id_length: DEFAULT_ID_LENGTH,
            link: LinkServiceSettings::default(),
            stats: StatsSettings::default(),
            dispatcher: DispatcherSettings::default(),
            telemetry: TelemetryConfig::default(),
        }
    }
}

impl AppConfig {
    /// Backend names for logging, without credentials.
    pub fn storage_kind(&self) -> &'static str {
        match self.storage {
            StorageConfig::InMemory => "in-memory",
            StorageConfig::MySql { .. } => "mysql",
        }
    }

    pub fn cache_kind(&self) -> &'static str {
        match self.cache {
            CacheConfig::InMemory { .. } => "in-memory",
            CacheConfig::Redis { .. } => "redis",
        }
    }
}

impl Cli {
    pub fn into_config(self) -> Result<AppConfig, ConfigError> {
        in_range("id length", self.id_length as u64, 3, 32)?;
        in_range("max retries", self.max_retries.into(), 1, 100)?;
        in_range("stats concurrency", self.stats_concurrency as u64, 1, 1024)?;
        in_range("dispatch queue", self.dispatch_queue as u64, 1, 1 << 20)?;
        in_range("dispatch concurrency", self.dispatch_concurrency as u64, 1, 4096)?;
        in_range("request timeout ms", self.request_timeout_ms, 1, MAX_REQUEST_TIMEOUT_MS)?;
        in_range("dispatch timeout ms", self.dispatch_timeout_ms, 1, MAX_DISPATCH_TIMEOUT_MS)?;
        in_range("cache ttl secs", self.cache_ttl_secs, 1, MAX_CACHE_TTL_SECS)?;

        let public_host = self
            .public_base_url
            .map(|base| public_host(&base).ok_or(ConfigError::InvalidPublicBaseUrl(base)))
            .transpose()?;

        let storage = match self.storage {
            StorageBackendArg::InMemory => StorageConfig::InMemory,
            StorageBackendArg::Mysql => StorageConfig::MySql {
                dsn: self.mysql_dsn.ok_or(ConfigError::MissingMysqlDsn)?,
            },
        };

        let cache = match self.cache {
            CacheBackendArg::InMemory => CacheConfig::InMemory {
                capacity: self.cache_capacity,
            },
            CacheBackendArg::Redis => CacheConfig::Redis {
                url: self.redis_url.ok_or(ConfigError::MissingRedisUrl)?,
            },
        };

        let request_timeout = Duration::from_millis(self.request_timeout_ms);

        let link = LinkServiceSettings {
            max_retries: self.max_retries,
            request_timeout,
            cache_ttl: Duration::from_secs(self.cache_ttl_secs),
            public_host,
        };

        let stats = StatsSettings::builder()
            .max_concurrency(self.stats_concurrency)
            .request_timeout(request_timeout)
            .build();

        let dispatcher = DispatcherSettings::builder()
            .queue_capacity(self.dispatch_queue)
            .max_concurrency(self.dispatch_concurrency)
            .task_timeout(Duration::from_millis(self.dispatch_timeout_ms))
            .build();

        let telemetry = TelemetryConfig {
            format: self.log_format.into(),
            otlp_endpoint: self.otlp_endpoint,
            ..TelemetryConfig::default()
        };

        Ok(AppConfig {
            listen_addr: self.listen_addr,
            storage,
            cache,
            id_length: self.id_length,
            link,
            stats,
            dispatcher,
            telemetry,
        })
    }
}
