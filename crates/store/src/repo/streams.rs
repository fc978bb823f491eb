use crate::Database;
use crate::error::{Result, SqlxResultExt};
use crate::models::{StreamCacheEntry, StreamRow, to_timestamp};
use sqlx::SqlitePool;
use time::{Duration, UtcDateTime};
use tracing::instrument;

/// Time-bounded memoization of resolved audio URLs, keyed by video id.
///
/// Two windows apply to every row:
/// - the *freshness* window bounds what [`lookup`](Self::lookup) returns, and
/// - the longer *retention* window bounds what [`purge_stale`](Self::purge_stale)
///   keeps.
///
/// Rows between the two are known-stale: they still exist but are never served.
#[derive(Debug, Clone)]
pub struct StreamCache {
    pool: SqlitePool,
}
impl From<&Database> for StreamCache {
    fn from(db: &Database) -> Self {
        Self { pool: db.pool().clone() }
    }
}
impl StreamCache {
    pub async fn lookup(&self, video_id: impl AsRef<str>, freshness: Duration) -> Result<Option<String>> {
        self.lookup_at(video_id, freshness, UtcDateTime::now()).await
    }

    /// Return the cached URL only if it was stored strictly within `freshness` of `now`.
    #[instrument(skip(self, video_id), fields(video_id = video_id.as_ref()))]
    pub async fn lookup_at(
        &self,
        video_id: impl AsRef<str>,
        freshness: Duration,
        now: UtcDateTime,
    ) -> Result<Option<String>> {
        sqlx::query_scalar(include_str!("../../queries/get_fresh_stream.sql"))
            .bind(video_id.as_ref())
            .bind(to_timestamp(now - freshness))
            .fetch_optional(&self.pool)
            .await
            .or_store()
    }

    pub async fn store(&self, video_id: impl AsRef<str>, audio_url: impl AsRef<str>) -> Result<()> {
        self.store_at(video_id, audio_url, UtcDateTime::now()).await
    }

    /// Insert or overwrite the URL for `video_id`, refreshing its cache date.
    ///
    /// Concurrent writers for the same id never fail on the primary key; the
    /// last write wins.
    #[instrument(skip(self, video_id, audio_url), fields(video_id = video_id.as_ref()))]
    pub async fn store_at(
        &self,
        video_id: impl AsRef<str>,
        audio_url: impl AsRef<str>,
        now: UtcDateTime,
    ) -> Result<()> {
        sqlx::query(include_str!("../../queries/upsert_stream.sql"))
            .bind(video_id.as_ref())
            .bind(audio_url.as_ref())
            .bind(to_timestamp(now))
            .execute(&self.pool)
            .await
            .or_store()?;
        Ok(())
    }

    /// Fetch the raw row regardless of age.
    pub async fn get(&self, video_id: impl AsRef<str>) -> Result<Option<StreamCacheEntry>> {
        let row: Option<StreamRow> = sqlx::query_as(include_str!("../../queries/get_stream.sql"))
            .bind(video_id.as_ref())
            .fetch_optional(&self.pool)
            .await
            .or_store()?;
        row.map(StreamCacheEntry::try_from).transpose()
    }

    pub async fn purge_stale(&self, retention: Duration) -> Result<u64> {
        self.purge_stale_at(retention, UtcDateTime::now()).await
    }

    /// Delete rows older than `retention`, returning how many were removed.
    #[instrument(skip(self))]
    pub async fn purge_stale_at(&self, retention: Duration, now: UtcDateTime) -> Result<u64> {
        let result = sqlx::query(include_str!("../../queries/purge_streams.sql"))
            .bind(to_timestamp(now - retention))
            .execute(&self.pool)
            .await
            .or_store()?;
        Ok(result.rows_affected())
    }
}
