use crate::Database;
use crate::error::{Result, SqlxResultExt};
use crate::models::{AuthToken, TokenRow, to_timestamp};
use sqlx::SqlitePool;
use time::UtcDateTime;
use tracing::instrument;

/// Repository for magic-link tokens.
#[derive(Debug, Clone)]
pub struct AuthTokens {
    pool: SqlitePool,
}
impl From<&Database> for AuthTokens {
    fn from(db: &Database) -> Self {
        Self { pool: db.pool().clone() }
    }
}
impl AuthTokens {
    /// Store a freshly issued, unused token.
    ///
    /// Returns [`ErrorKind::Conflict`](crate::error::ErrorKind::Conflict) if the
    /// token value already exists; an existing token is never overwritten.
    #[instrument(skip_all, fields(expires_at = expires_at.unix_timestamp()))]
    pub async fn insert(
        &self,
        email: impl AsRef<str>,
        token: impl AsRef<str>,
        expires_at: UtcDateTime,
        now: UtcDateTime,
    ) -> Result<()> {
        sqlx::query(include_str!("../../queries/insert_token.sql"))
            .bind(email.as_ref())
            .bind(token.as_ref())
            .bind(to_timestamp(expires_at))
            .bind(to_timestamp(now))
            .execute(&self.pool)
            .await
            .or_store()?;
        Ok(())
    }

    /// Atomically mark the token used, provided it is unused and unexpired at `now`.
    ///
    /// Returns the email the token was issued for, or `None` if the token does
    /// not exist, has expired, or was already used. The check and the update
    /// are one conditional statement, so of several concurrent callers
    /// presenting the same token at most one receives `Some`.
    #[instrument(skip_all)]
    pub async fn consume(&self, token: impl AsRef<str>, now: UtcDateTime) -> Result<Option<String>> {
        sqlx::query_scalar(include_str!("../../queries/consume_token.sql"))
            .bind(token.as_ref())
            .bind(to_timestamp(now))
            .fetch_optional(&self.pool)
            .await
            .or_store()
    }

    /// Look a token up without consuming it.
    pub async fn get(&self, token: impl AsRef<str>) -> Result<Option<AuthToken>> {
        let row: Option<TokenRow> = sqlx::query_as(include_str!("../../queries/get_token.sql"))
            .bind(token.as_ref())
            .fetch_optional(&self.pool)
            .await
            .or_store()?;
        row.map(AuthToken::try_from).transpose()
    }

    /// Delete every token that is used or expired at `now`, returning how many were removed.
    #[instrument(skip(self))]
    pub async fn purge(&self, now: UtcDateTime) -> Result<u64> {
        let result = sqlx::query(include_str!("../../queries/purge_tokens.sql"))
            .bind(to_timestamp(now))
            .execute(&self.pool)
            .await
            .or_store()?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use time::Duration;

    async fn setup() -> (Database, AuthTokens, UtcDateTime) {
        let db = Database::connect_in_memory().await.unwrap();
        let tokens = db.tokens();
        (db, tokens, UtcDateTime::now())
    }

    #[tokio::test]
    async fn test_consume_exactly_once() {
        let (_db, tokens, now) = setup().await;
        tokens.insert("a@b.com", "t0k3n", now + Duration::minutes(15), now).await.unwrap();
        assert_eq!(tokens.consume("t0k3n", now).await.unwrap().as_deref(), Some("a@b.com"));
        assert_eq!(tokens.consume("t0k3n", now).await.unwrap(), None);
        assert!(tokens.get("t0k3n").await.unwrap().unwrap().used);
    }

    #[tokio::test]
    async fn test_expired_token_is_not_consumed() {
        let (_db, tokens, now) = setup().await;
        tokens.insert("a@b.com", "t0k3n", now + Duration::minutes(15), now).await.unwrap();
        assert_eq!(tokens.consume("t0k3n", now + Duration::minutes(16)).await.unwrap(), None);
        // Exactly at expiry is already too late.
        assert_eq!(tokens.consume("t0k3n", now + Duration::minutes(15)).await.unwrap(), None);
        // The failed attempts did not mark it used.
        assert!(!tokens.get("t0k3n").await.unwrap().unwrap().used);
    }

    #[tokio::test]
    async fn test_unknown_token() {
        let (_db, tokens, now) = setup().await;
        assert_eq!(tokens.consume("missing", now).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_duplicate_token_conflicts() {
        let (_db, tokens, now) = setup().await;
        tokens.insert("a@b.com", "t0k3n", now + Duration::minutes(15), now).await.unwrap();
        let err = tokens.insert("c@d.com", "t0k3n", now + Duration::minutes(15), now).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Conflict));
        // The original owner is untouched.
        assert_eq!(tokens.get("t0k3n").await.unwrap().unwrap().email, "a@b.com");
    }

    #[tokio::test]
    async fn test_concurrent_consumers_single_winner() {
        let (_db, tokens, now) = setup().await;
        tokens.insert("a@b.com", "t0k3n", now + Duration::minutes(15), now).await.unwrap();
        let (a, b, c) = tokio::join!(tokens.consume("t0k3n", now), tokens.consume("t0k3n", now), tokens.consume("t0k3n", now));
        let winners = [a.unwrap(), b.unwrap(), c.unwrap()].into_iter().flatten().count();
        assert_eq!(winners, 1);
    }

    #[tokio::test]
    async fn test_purge_removes_used_and_expired() {
        let (_db, tokens, now) = setup().await;
        tokens.insert("a@b.com", "used", now + Duration::minutes(15), now).await.unwrap();
        tokens.insert("a@b.com", "expired", now - Duration::minutes(1), now - Duration::minutes(16)).await.unwrap();
        tokens.insert("a@b.com", "live", now + Duration::minutes(15), now).await.unwrap();
        tokens.consume("used", now).await.unwrap();
        assert_eq!(tokens.purge(now).await.unwrap(), 2);
        assert!(tokens.get("used").await.unwrap().is_none());
        assert!(tokens.get("expired").await.unwrap().is_none());
        assert!(tokens.get("live").await.unwrap().is_some());
    }
}
