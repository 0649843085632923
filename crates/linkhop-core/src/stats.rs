use crate::error::StorageError;
use crate::shortcode::ShortCode;
use async_trait::async_trait;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use uuid::Uuid;

pub type Result<T> = std::result::Result<T, StorageError>;

/// The platform a redirect was triggered from.
///
/// Derived from request metadata, never supplied by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Platform {
    Instagram,
    Twitter,
    YouTube,
    Unknown,
}

const PLATFORM_MARKERS: [(Platform, &str, &str); 3] = [
    (Platform::Instagram, "instagram", "instagram.com"),
    (Platform::Twitter, "twitter", "twitter.com"),
    (Platform::YouTube, "youtube", "youtube.com"),
];

impl Platform {
    /// Detects the platform from the `User-Agent` and `Referer` headers.
    ///
    /// The user agent is checked first for every platform; the referer is
    /// only consulted when no user agent marker matched.
    pub fn detect(user_agent: Option<&str>, referer: Option<&str>) -> Self {
        let user_agent = user_agent.unwrap_or_default().to_ascii_lowercase();
        if let Some((platform, _, _)) = PLATFORM_MARKERS
            .iter()
            .find(|(_, marker, _)| user_agent.contains(*marker))
        {
            return *platform;
        }

        let referer = referer.unwrap_or_default().to_ascii_lowercase();
        PLATFORM_MARKERS
            .iter()
            .find(|(_, _, host)| referer.contains(*host))
            .map(|(platform, _, _)| *platform)
            .unwrap_or(Platform::Unknown)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Instagram => "Instagram",
            Platform::Twitter => "Twitter",
            Platform::YouTube => "YouTube",
            Platform::Unknown => "Unknown",
        }
    }
}

impl Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Platform {
    type Err = StorageError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "Instagram" => Ok(Platform::Instagram),
            "Twitter" => Ok(Platform::Twitter),
            "YouTube" => Ok(Platform::YouTube),
            "Unknown" => Ok(Platform::Unknown),
            other => Err(StorageError::InvalidData(format!(
                "unknown platform '{other}'"
            ))),
        }
    }
}

/// One redirect event.
///
/// A stats record may outlive or precede its link; there is no referential
/// integrity between the two.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    pub id: Uuid,
    pub link_id: ShortCode,
    pub created_at: Timestamp,
    pub platform: Platform,
}

impl Stats {
    /// Creates a fresh record with a random id and the current time.
    pub fn new(link_id: ShortCode, platform: Platform) -> Self {
        Self {
            id: Uuid::new_v4(),
            link_id,
            created_at: Timestamp::now(),
            platform,
        }
    }
}

/// The authoritative store for redirect analytics.
#[async_trait]
pub trait StatsRepository: Send + Sync + 'static {
    /// Appends one stats record.
    async fn insert(&self, stats: &Stats) -> Result<()>;

    /// Returns every record for a link, oldest first.
    async fn list_by_link(&self, link_id: &ShortCode) -> Result<Vec<Stats>>;

    /// Deletes every record for a link and returns how many were removed.
    async fn delete_by_link(&self, link_id: &ShortCode) -> Result<u64>;
}
