use async_trait::async_trait;
use jiff::Timestamp;
use linkhop_core::repository::Result;
use linkhop_core::{Link, LinkRepository, ShortCode, Stats, StatsRepository, StorageError};
use sqlx::migrate::Migrator;
use sqlx::mysql::MySqlRow;
use sqlx::{MySqlPool, Row};
use tracing::{debug, trace};
use uuid::Uuid;

/// Number of links fetched per round trip by [`LinkRepository::list`].
pub const LIST_PAGE_SIZE: u32 = 20;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// MySQL implementation of both store ports.
///
/// Links live in `links` and redirect events in `stats`. Timestamps are
/// stored as unix milliseconds.
#[derive(Debug, Clone)]
pub struct MySqlRepository {
    pool: MySqlPool,
}

impl MySqlRepository {
    /// Creates a repository from an existing MySQL connection pool.
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Creates a repository by opening a new MySQL connection pool.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = MySqlPool::connect(database_url)
            .await
            .map_err(map_sqlx_error)?;
        Ok(Self::new(pool))
    }

    /// Applies the bundled schema migrations.
    pub async fn migrate(&self) -> Result<()> {
        MIGRATOR
            .run(&self.pool)
            .await
            .map_err(|e| StorageError::Operation(format!("migration failed: {e}")))
    }

    async fn list_page(&self, after: Option<&str>) -> Result<Vec<Link>> {
        let rows = sqlx::query(
            r#"
            SELECT id, original_url, created_at
            FROM links
            WHERE (? IS NULL OR id > ?)
            ORDER BY id
            LIMIT ?
            "#,
        )
        .bind(after)
        .bind(after)
        .bind(LIST_PAGE_SIZE)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        rows.iter().map(link_from_row).collect()
    }
}

fn parse_timestamp(millis: i64) -> Result<Timestamp> {
    Timestamp::from_millisecond(millis).map_err(|e| {
        StorageError::InvalidData(format!("invalid timestamp '{millis}': {e}"))
    })
}

fn link_from_row(row: &MySqlRow) -> Result<Link> {
    let id: String = row.try_get("id").map_err(map_sqlx_error)?;
    let original_url: String = row.try_get("original_url").map_err(map_sqlx_error)?;
    let created_at: i64 = row.try_get("created_at").map_err(map_sqlx_error)?;

    Ok(Link {
        id: ShortCode::new_unchecked(id),
        original_url,
        created_at: parse_timestamp(created_at)?,
        stats: Vec::new(),
    })
}

fn stats_from_row(row: &MySqlRow) -> Result<Stats> {
    let id: String = row.try_get("id").map_err(map_sqlx_error)?;
    let link_id: String = row.try_get("link_id").map_err(map_sqlx_error)?;
    let created_at: i64 = row.try_get("created_at").map_err(map_sqlx_error)?;
    let platform: String = row.try_get("platform").map_err(map_sqlx_error)?;

    Ok(Stats {
        id: Uuid::parse_str(&id)
            .map_err(|e| StorageError::InvalidData(format!("invalid stats id '{id}': {e}")))?,
        link_id: ShortCode::new_unchecked(link_id),
        created_at: parse_timestamp(created_at)?,
        platform: platform.parse()?,
    })
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(sqlx::error::DatabaseError::is_unique_violation)
}

fn map_sqlx_error(err: sqlx::Error) -> StorageError {
    let message = err.to_string();

    match err {
        sqlx::Error::PoolTimedOut => StorageError::Timeout(message),
        sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_) => StorageError::Unavailable(message),
        sqlx::Error::ColumnIndexOutOfBounds { .. }
        | sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::TypeNotFound { .. }
        | sqlx::Error::Decode(_)
        | sqlx::Error::RowNotFound => StorageError::InvalidData(message),
        _ => StorageError::Query(message),
    }
}

#[async_trait]
impl LinkRepository for MySqlRepository {
    async fn list(&self) -> Result<Vec<Link>> {
        let mut links = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let page = self.list_page(cursor.as_deref()).await?;
            let exhausted = page.len() < LIST_PAGE_SIZE as usize;
            trace!(fetched = page.len(), "Fetched page of links");

            cursor = page.last().map(|link| link.id.to_string());
            links.extend(page);

            if exhausted || cursor.is_none() {
                break;
            }
        }

        debug!(count = links.len(), "Listed links");
        Ok(links)
    }

    async fn get(&self, code: &ShortCode) -> Result<Option<Link>> {
        let row = sqlx::query(
            r#"
            SELECT id, original_url, created_at
            FROM links
            WHERE id = ?
            LIMIT 1
            "#,
        )
        .bind(code.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.as_ref().map(link_from_row).transpose()
    }

    async fn insert(&self, link: &Link) -> Result<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO links (id, original_url, created_at)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(link.id.as_str())
        .bind(link.original_url.as_str())
        .bind(link.created_at.as_millisecond())
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(err) if is_unique_violation(&err) => Err(StorageError::Conflict(link.id.to_string())),
            Err(err) => Err(map_sqlx_error(err)),
        }
    }

    async fn delete(&self, code: &ShortCode) -> Result<bool> {
        let result = sqlx::query("DELETE FROM links WHERE id = ?")
            .bind(code.as_str())
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl StatsRepository for MySqlRepository {
    async fn insert(&self, stats: &Stats) -> Result<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO stats (id, link_id, created_at, platform)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(stats.id.to_string())
        .bind(stats.link_id.as_str())
        .bind(stats.created_at.as_millisecond())
        .bind(stats.platform.as_str())
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(err) if is_unique_violation(&err) => Err(StorageError::Conflict(stats.id.to_string())),
            Err(err) => Err(map_sqlx_error(err)),
        }
    }

    async fn list_by_link(&self, link_id: &ShortCode) -> Result<Vec<Stats>> {
        let rows = sqlx::query(
            r#"
            SELECT id, link_id, created_at, platform
            FROM stats
            WHERE link_id = ?
            ORDER BY created_at
            "#,
        )
        .bind(link_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        rows.iter().map(stats_from_row).collect()
    }

    async fn delete_by_link(&self, link_id: &ShortCode) -> Result<u64> {
        let result = sqlx::query("DELETE FROM stats WHERE link_id = ?")
            .bind(link_id.as_str())
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected())
    }
}
