use crate::Database;
use crate::error::{ErrorKind, Result, SqlxResultExt};
use crate::models::{HistoryEntry, HistoryRow, UserId, to_timestamp};
use exn::ResultExt;
use sqlx::SqlitePool;
use tracing::instrument;

/// Repository for per-user listening history. Entries are append-only.
#[derive(Debug, Clone)]
pub struct History {
    pool: SqlitePool,
}
impl From<&Database> for History {
    fn from(db: &Database) -> Self {
        Self { pool: db.pool().clone() }
    }
}
impl History {
    #[instrument(skip(self, entry), fields(video_id = %entry.video_id))]
    pub async fn append(&self, user_id: UserId, entry: &HistoryEntry) -> Result<()> {
        sqlx::query(include_str!("../../queries/insert_history.sql"))
            .bind(user_id)
            .bind(&entry.video_id)
            .bind(&entry.title)
            .bind(&entry.channel)
            .bind(i64::from(entry.duration))
            .bind(to_timestamp(entry.viewed_at))
            .execute(&self.pool)
            .await
            .or_store()?;
        Ok(())
    }

    /// Most recent entries first; entries viewed within the same second are
    /// returned newest-inserted first.
    pub async fn list(&self, user_id: UserId, limit: usize) -> Result<Vec<HistoryEntry>> {
        let limit = i64::try_from(limit).or_raise(|| ErrorKind::InvalidData("limit"))?;
        let rows: Vec<HistoryRow> = sqlx::query_as(include_str!("../../queries/list_history.sql"))
            .bind(user_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .or_store()?;
        rows.into_iter().map(HistoryEntry::try_from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::{Duration, UtcDateTime};

    fn entry(video_id: &str, viewed_at: UtcDateTime) -> HistoryEntry {
        HistoryEntry {
            video_id: video_id.to_string(),
            title: format!("Title of {video_id}"),
            channel: "Channel".to_string(),
            duration: 215,
            viewed_at: viewed_at.replace_nanosecond(0).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_latest_entry_comes_first() {
        let db = Database::connect_in_memory().await.unwrap();
        let user = db.users().get_or_create("a@b.com").await.unwrap();
        let history = db.history();
        let now = UtcDateTime::now();
        history.append(user.id, &entry("older", now - Duration::hours(2))).await.unwrap();
        history.append(user.id, &entry("old", now - Duration::hours(1))).await.unwrap();
        history.append(user.id, &entry("abc123", now)).await.unwrap();
        let listed = history.list(user.id, 50).await.unwrap();
        assert_eq!(listed.len(), 3);
        assert_eq!(listed[0], entry("abc123", now));
        assert_eq!(listed[2].video_id, "older");
    }

    #[tokio::test]
    async fn test_same_second_ties_break_by_insertion() {
        let db = Database::connect_in_memory().await.unwrap();
        let user = db.users().get_or_create("a@b.com").await.unwrap();
        let history = db.history();
        let now = UtcDateTime::now();
        history.append(user.id, &entry("first", now)).await.unwrap();
        history.append(user.id, &entry("second", now)).await.unwrap();
        let listed = history.list(user.id, 50).await.unwrap();
        assert_eq!(listed[0].video_id, "second");
        assert_eq!(listed[1].video_id, "first");
    }

    #[tokio::test]
    async fn test_limit_and_isolation_between_users() {
        let db = Database::connect_in_memory().await.unwrap();
        let alice = db.users().get_or_create("alice@example.com").await.unwrap();
        let bob = db.users().get_or_create("bob@example.com").await.unwrap();
        let history = db.history();
        let now = UtcDateTime::now();
        for i in 0..5 {
            history.append(alice.id, &entry(&format!("a{i}"), now + Duration::seconds(i))).await.unwrap();
        }
        history.append(bob.id, &entry("b0", now)).await.unwrap();
        let listed = history.list(alice.id, 3).await.unwrap();
        assert_eq!(listed.iter().map(|e| e.video_id.as_str()).collect::<Vec<_>>(), vec!["a4", "a3", "a2"]);
        assert_eq!(history.list(bob.id, 50).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_history_requires_existing_user() {
        let db = Database::connect_in_memory().await.unwrap();
        let err = db.history().append(42, &entry("abc123", UtcDateTime::now())).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Database));
    }

    #[tokio::test]
    async fn test_history_cascades_with_user() {
        let db = Database::connect_in_memory().await.unwrap();
        let user = db.users().get_or_create("a@b.com").await.unwrap();
        db.history().append(user.id, &entry("abc123", UtcDateTime::now())).await.unwrap();
        sqlx::query("DELETE FROM users WHERE id = ?").bind(user.id).execute(db.pool()).await.unwrap();
        let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM view_history").fetch_one(db.pool()).await.unwrap();
        assert_eq!(remaining, 0);
    }
}
