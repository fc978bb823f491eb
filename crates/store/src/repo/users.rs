use crate::Database;
use crate::error::{ErrorKind, Result, SqlxResultExt};
use crate::models::{User, UserId, UserRow, to_timestamp};
use crate::repo::to_u64;
use exn::OptionExt;
use sqlx::SqlitePool;
use time::UtcDateTime;
use tracing::instrument;

/// Repository for user accounts.
///
/// Emails are expected to be normalized by the caller; the column is also
/// declared `COLLATE NOCASE` so differently-cased duplicates cannot exist.
#[derive(Debug, Clone)]
pub struct Users {
    pool: SqlitePool,
}
impl From<&Database> for Users {
    fn from(db: &Database) -> Self {
        Self { pool: db.pool().clone() }
    }
}
impl Users {
    /// Return the user with this email, creating it first if necessary.
    pub async fn get_or_create(&self, email: impl AsRef<str>) -> Result<User> {
        self.get_or_create_at(email, UtcDateTime::now()).await
    }

    #[instrument(skip(self, email))]
    pub async fn get_or_create_at(&self, email: impl AsRef<str>, now: UtcDateTime) -> Result<User> {
        let email = email.as_ref();
        let mut tx = self.pool.begin().await.or_store()?;
        let inserted = sqlx::query(include_str!("../../queries/insert_user.sql"))
            .bind(email)
            .bind(to_timestamp(now))
            .execute(&mut *tx)
            .await
            .or_store()?
            .rows_affected();
        let row: Option<UserRow> = sqlx::query_as(include_str!("../../queries/get_user_by_email.sql"))
            .bind(email)
            .fetch_optional(&mut *tx)
            .await
            .or_store()?;
        tx.commit().await.or_store()?;
        let user = User::try_from(row.ok_or_raise(|| ErrorKind::Database)?)?;
        if inserted > 0 {
            tracing::info!(user_id = user.id, "Created new user");
        }
        Ok(user)
    }

    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as(include_str!("../../queries/get_user_by_id.sql"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .or_store()?;
        row.map(User::try_from).transpose()
    }

    pub async fn count(&self) -> Result<u64> {
        let count: i64 =
            sqlx::query_scalar(include_str!("../../queries/count_users.sql")).fetch_one(&self.pool).await.or_store()?;
        to_u64(count, "user count")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_or_create_is_stable() {
        let db = Database::connect_in_memory().await.unwrap();
        let users = db.users();
        let first = users.get_or_create("a@b.com").await.unwrap();
        let second = users.get_or_create("a@b.com").await.unwrap();
        assert_eq!(first, second);
        assert_eq!(users.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_email_uniqueness_ignores_case() {
        let db = Database::connect_in_memory().await.unwrap();
        let users = db.users();
        let lower = users.get_or_create("a@b.com").await.unwrap();
        let upper = users.get_or_create("A@B.COM").await.unwrap();
        assert_eq!(lower.id, upper.id);
        assert_eq!(upper.email, "a@b.com");
    }

    #[tokio::test]
    async fn test_get_by_id() {
        let db = Database::connect_in_memory().await.unwrap();
        let users = db.users();
        let created = users.get_or_create("a@b.com").await.unwrap();
        assert_eq!(users.get_by_id(created.id).await.unwrap(), Some(created));
        assert_eq!(users.get_by_id(9999).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_count() {
        let db = Database::connect_in_memory().await.unwrap();
        let users = db.users();
        assert_eq!(users.count().await.unwrap(), 0);
        users.get_or_create("a@b.com").await.unwrap();
        users.get_or_create("c@d.com").await.unwrap();
        assert_eq!(users.count().await.unwrap(), 2);
    }
}
