//! Magic-link token lifecycle.

use crate::email::Email;
use crate::error::{ErrorKind, Result};
use crate::token::generate_token;
use audiotube_store::AuthTokens;
use time::{Duration, UtcDateTime};
use tracing::instrument;

pub const DEFAULT_TTL: Duration = Duration::minutes(15);

/// A token that has been stored and may now be sent to its owner.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: UtcDateTime,
}

/// Issues, verifies and cleans up single-use login tokens.
///
/// A token moves from *issued* to either *consumed* (by a successful
/// [`verify_and_consume`](Self::verify_and_consume)) or *expired* (detected
/// lazily when it is presented). Both are terminal.
#[derive(Debug, Clone)]
pub struct MagicLinks {
    tokens: AuthTokens,
    ttl: Duration,
}
impl MagicLinks {
    pub fn new(tokens: AuthTokens, ttl: Duration) -> Self {
        Self { tokens, ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub async fn issue(&self, email: &Email) -> Result<IssuedToken> {
        self.issue_at(email, UtcDateTime::now()).await
    }

    /// Generate and store a new token for `email`, valid until `now + ttl`.
    ///
    /// A collision with an existing token fails with [`ErrorKind::Conflict`]
    /// instead of replacing it.
    #[instrument(skip_all)]
    pub async fn issue_at(&self, email: &Email, now: UtcDateTime) -> Result<IssuedToken> {
        let token = generate_token();
        let expires_at = now + self.ttl;
        self.tokens.insert(email, &token, expires_at, now).await.map_err(ErrorKind::store)?;
        tracing::debug!(expires_at = expires_at.unix_timestamp(), "Issued magic link token");
        Ok(IssuedToken { token, expires_at })
    }

    pub async fn verify_and_consume(&self, token: impl AsRef<str>) -> Result<Email> {
        self.verify_and_consume_at(token, UtcDateTime::now()).await
    }

    /// Consume the token and return the email it was issued for.
    ///
    /// Unknown, expired and already-used tokens all fail with the same
    /// [`ErrorKind::Unauthenticated`].
    #[instrument(skip_all)]
    pub async fn verify_and_consume_at(&self, token: impl AsRef<str>, now: UtcDateTime) -> Result<Email> {
        let token = token.as_ref();
        if token.is_empty() {
            exn::bail!(ErrorKind::Unauthenticated);
        }
        match self.tokens.consume(token, now).await.map_err(ErrorKind::store)? {
            // Stored emails were normalized on the way in.
            Some(email) => Email::parse(email),
            None => exn::bail!(ErrorKind::Unauthenticated),
        }
    }

    pub async fn purge_expired(&self) -> Result<u64> {
        self.purge_expired_at(UtcDateTime::now()).await
    }

    /// Delete every used or expired token.
    pub async fn purge_expired_at(&self, now: UtcDateTime) -> Result<u64> {
        let purged = self.tokens.purge(now).await.map_err(ErrorKind::store)?;
        if purged > 0 {
            tracing::debug!(purged, "Purged used and expired magic link tokens");
        }
        Ok(purged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use audiotube_store::Database;

    async fn setup() -> (Database, MagicLinks, Email) {
        let db = Database::connect_in_memory().await.unwrap();
        let links = MagicLinks::new(db.tokens(), DEFAULT_TTL);
        (db, links, Email::parse("a@b.com").unwrap())
    }

    #[tokio::test]
    async fn test_issue_stores_unused_token() {
        let (db, links, email) = setup().await;
        let t0 = UtcDateTime::now();
        let issued = links.issue_at(&email, t0).await.unwrap();
        assert_eq!(issued.expires_at, t0 + Duration::minutes(15));
        let stored = db.tokens().get(&issued.token).await.unwrap().unwrap();
        assert_eq!(stored.email, "a@b.com");
        assert!(!stored.used);
    }

    #[tokio::test]
    async fn test_token_lifecycle_scenario() {
        let (_db, links, email) = setup().await;
        let t0 = UtcDateTime::now();
        let issued = links.issue_at(&email, t0).await.unwrap();

        let at_14 = t0 + Duration::minutes(14);
        let verified = links.verify_and_consume_at(&issued.token, at_14).await.unwrap();
        assert_eq!(verified, email);

        let err = links.verify_and_consume_at(&issued.token, at_14 + Duration::seconds(1)).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Unauthenticated));
    }

    #[tokio::test]
    async fn test_expired_token_fails() {
        let (_db, links, email) = setup().await;
        let t0 = UtcDateTime::now();
        let issued = links.issue_at(&email, t0).await.unwrap();
        let err = links.verify_and_consume_at(&issued.token, t0 + Duration::minutes(16)).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Unauthenticated));
    }

    #[tokio::test]
    async fn test_failures_are_indistinguishable() {
        let (_db, links, email) = setup().await;
        let t0 = UtcDateTime::now();
        let used = links.issue_at(&email, t0).await.unwrap();
        links.verify_and_consume_at(&used.token, t0).await.unwrap();
        let expired = links.issue_at(&email, t0 - Duration::hours(1)).await.unwrap();

        let outcomes = [
            links.verify_and_consume_at(&used.token, t0).await.unwrap_err(),
            links.verify_and_consume_at(&expired.token, t0).await.unwrap_err(),
            links.verify_and_consume_at("does-not-exist", t0).await.unwrap_err(),
            links.verify_and_consume_at("", t0).await.unwrap_err(),
        ];
        for err in outcomes {
            assert!(matches!(&*err, ErrorKind::Unauthenticated));
            assert_eq!((*err).to_string(), "not authenticated");
        }
    }

    #[tokio::test]
    async fn test_concurrent_verification_has_one_winner() {
        let (_db, links, email) = setup().await;
        let t0 = UtcDateTime::now();
        let issued = links.issue_at(&email, t0).await.unwrap();
        let (a, b) = tokio::join!(
            links.verify_and_consume_at(&issued.token, t0),
            links.verify_and_consume_at(&issued.token, t0)
        );
        assert_eq!(usize::from(a.is_ok()) + usize::from(b.is_ok()), 1);
    }

    #[tokio::test]
    async fn test_purge_expired() {
        let (db, links, email) = setup().await;
        let t0 = UtcDateTime::now();
        let consumed = links.issue_at(&email, t0).await.unwrap();
        links.verify_and_consume_at(&consumed.token, t0).await.unwrap();
        links.issue_at(&email, t0 - Duration::hours(1)).await.unwrap();
        let live = links.issue_at(&email, t0).await.unwrap();
        assert_eq!(links.purge_expired_at(t0).await.unwrap(), 2);
        assert!(db.tokens().get(&live.token).await.unwrap().is_some());
    }
}
