use crate::discover::types::DiscoveryResult;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{FromRow, SqlitePool};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),
}

/// A feed row as persisted, for inspection and tests.
#[derive(Debug, Clone, FromRow)]
pub struct StoredFeed {
    pub id: i64,
    pub host_id: i64,
    pub url: String,
    pub format: String,
    pub title: Option<String>,
    pub strategy: String,
    pub hub_url: Option<String>,
}

// ============================================================================
// Database
// ============================================================================

#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open a database connection and run migrations
    pub async fn open(path: &str) -> Result<Self, StorageError> {
        let url = format!("sqlite:{}?mode=rwc", path);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&url)
            .await?;
        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    /// Run database migrations
    async fn migrate(&self) -> Result<(), StorageError> {
        sqlx::query("PRAGMA foreign_keys = ON")
            .execute(&self.pool)
            .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS hosts (
                id INTEGER PRIMARY KEY,
                site_url TEXT UNIQUE NOT NULL,
                status TEXT NOT NULL,
                error TEXT,
                checked_at INTEGER NOT NULL
            )
        "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS feeds (
                id INTEGER PRIMARY KEY,
                host_id INTEGER NOT NULL REFERENCES hosts(id) ON DELETE CASCADE,
                url TEXT NOT NULL,
                format TEXT NOT NULL,
                title TEXT,
                strategy TEXT NOT NULL,
                hub_url TEXT,
                UNIQUE(host_id, url)
            )
        "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Persists one discovery result in a single transaction.
    ///
    /// The host row always updates (status, error, timestamp). Feed rows
    /// follow a most-feeds-wins rule: a re-run that validated fewer feeds
    /// than are already stored keeps the stored set, so a flaky crawl
    /// never shrinks good data.
    pub async fn save_result(&self, result: &DiscoveryResult) -> Result<(), StorageError> {
        let mut tx = self.pool.begin().await?;
        let now = chrono::Utc::now().timestamp();

        let host_id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO hosts (site_url, status, error, checked_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(site_url) DO UPDATE SET
                status = excluded.status,
                error = excluded.error,
                checked_at = excluded.checked_at
            RETURNING id
        "#,
        )
        .bind(&result.site)
        .bind(result.status.as_str())
        .bind(&result.error)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM feeds WHERE host_id = ?1")
            .bind(host_id)
            .fetch_one(&mut *tx)
            .await?;

        if existing > 0 && (result.feeds.len() as i64) <= existing {
            tracing::debug!(
                site = %result.site,
                stored = existing,
                found = result.feeds.len(),
                "keeping stored feeds (run found no more than already stored)"
            );
            tx.commit().await?;
            return Ok(());
        }

        sqlx::query("DELETE FROM feeds WHERE host_id = ?1")
            .bind(host_id)
            .execute(&mut *tx)
            .await?;

        for feed in &result.feeds {
            let hub_url = result
                .hubs
                .iter()
                .find(|h| h.feed_url == feed.url)
                .map(|h| h.hub_url.as_str());

            sqlx::query(
                r#"
                INSERT INTO feeds (host_id, url, format, title, strategy, hub_url)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                ON CONFLICT(host_id, url) DO UPDATE SET
                    format = excluded.format,
                    title = excluded.title,
                    strategy = excluded.strategy,
                    hub_url = excluded.hub_url
            "#,
            )
            .bind(host_id)
            .bind(&feed.url)
            .bind(feed.format.as_str())
            .bind(&feed.title)
            .bind(feed.strategy.as_str())
            .bind(hub_url)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Persists a whole batch, one transaction per site.
    pub async fn save_all(&self, results: &[DiscoveryResult]) -> Result<(), StorageError> {
        for result in results {
            self.save_result(result).await?;
        }
        Ok(())
    }

    /// Feeds stored for a site, ordered by URL.
    pub async fn feeds_for_site(&self, site_url: &str) -> Result<Vec<StoredFeed>, StorageError> {
        let feeds = sqlx::query_as::<_, StoredFeed>(
            r#"
            SELECT f.id, f.host_id, f.url, f.format, f.title, f.strategy, f.hub_url
            FROM feeds f
            JOIN hosts h ON h.id = f.host_id
            WHERE h.site_url = ?1
            ORDER BY f.url
        "#,
        )
        .bind(site_url)
        .fetch_all(&self.pool)
        .await?;
        Ok(feeds)
    }

    /// (status, error) for a site, if it has been crawled.
    pub async fn host_status(
        &self,
        site_url: &str,
    ) -> Result<Option<(String, Option<String>)>, StorageError> {
        let row = sqlx::query_as::<_, (String, Option<String>)>(
            "SELECT status, error FROM hosts WHERE site_url = ?1",
        )
        .bind(site_url)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }
}
