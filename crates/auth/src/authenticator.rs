use crate::email::Email;
use crate::error::{ErrorKind, Result};
use crate::magic::MagicLinks;
use crate::mailer::{self, Mailer};
use crate::session::{Session, Sessions};
use audiotube_config::Config;
use audiotube_store::{Database, User, UserId, Users};
use exn::OptionExt;
use std::sync::Arc;
use time::UtcDateTime;
use tracing::instrument;

/// The result of a completed login.
#[derive(Debug, Clone)]
pub struct Login {
    pub user: User,
    /// Signed session credential to hand back to the client.
    pub credential: String,
}

/// Composes magic links, user records, sessions and mail delivery into the
/// passwordless login flow.
#[derive(Clone)]
pub struct Authenticator {
    links: MagicLinks,
    sessions: Sessions,
    users: Users,
    mailer: Arc<dyn Mailer>,
    app_url: String,
}
impl std::fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authenticator").field("app_url", &self.app_url).finish_non_exhaustive()
    }
}
impl Authenticator {
    pub fn new(links: MagicLinks, sessions: Sessions, users: Users, mailer: Arc<dyn Mailer>, app_url: impl Into<String>) -> Self {
        let app_url = app_url.into().trim_end_matches('/').to_string();
        Self { links, sessions, users, mailer, app_url }
    }

    pub fn from_config(config: &Config, db: &Database) -> Result<Self> {
        let ttl = config.auth.magic_link_ttl();
        Ok(Self::new(
            MagicLinks::new(db.tokens(), ttl),
            Sessions::new(&config.auth.secret_key, config.auth.session_ttl()),
            db.users(),
            mailer::from_config(&config.email, ttl)?,
            &config.server.app_url,
        ))
    }

    pub fn links(&self) -> &MagicLinks {
        &self.links
    }

    pub fn sessions(&self) -> &Sessions {
        &self.sessions
    }

    /// The link a recipient follows to complete their login.
    pub fn verify_link(&self, token: &str) -> String {
        format!("{}/auth/verify?token={token}", self.app_url)
    }

    /// Issue a magic link for `raw_email` and deliver it.
    ///
    /// The token is stored before delivery is attempted; if delivery fails
    /// the token simply expires unused.
    #[instrument(skip_all)]
    pub async fn request_login(&self, raw_email: impl AsRef<str>) -> Result<Email> {
        let email = Email::parse(raw_email)?;
        let issued = self.links.issue(&email).await?;
        self.mailer.send_magic_link(&email, &self.verify_link(&issued.token)).await?;
        tracing::info!("Magic link requested");
        Ok(email)
    }

    pub async fn complete_login(&self, token: impl AsRef<str>) -> Result<Login> {
        self.complete_login_at(token, UtcDateTime::now()).await
    }

    /// Consume a magic-link token and start a session for its owner, creating
    /// the user on their first login.
    #[instrument(skip_all)]
    pub async fn complete_login_at(&self, token: impl AsRef<str>, now: UtcDateTime) -> Result<Login> {
        let email = self.links.verify_and_consume_at(token, now).await?;
        let user = self.users.get_or_create_at(&email, now).await.map_err(ErrorKind::store)?;
        if let Err(err) = self.links.purge_expired_at(now).await {
            tracing::warn!(error = ?err, "Failed to purge expired magic link tokens");
        }
        let credential = self.sessions.sign_at(user.id, now)?;
        tracing::info!(user_id = user.id, "User logged in");
        Ok(Login { user, credential })
    }

    /// Check a session credential without touching the store.
    pub fn authenticate(&self, credential: impl AsRef<str>) -> Result<Session> {
        self.sessions.verify(credential)
    }

    /// Resolve a session credential to the user it belongs to.
    ///
    /// A valid credential for a user that no longer exists is
    /// [`ErrorKind::Unauthenticated`].
    pub async fn current_user(&self, credential: impl AsRef<str>) -> Result<User> {
        let session = self.authenticate(credential)?;
        self.user(session.user_id).await?.ok_or_raise(|| ErrorKind::Unauthenticated)
    }

    pub async fn user(&self, user_id: UserId) -> Result<Option<User>> {
        self.users.get_by_id(user_id).await.map_err(ErrorKind::store)
    }

    pub async fn user_count(&self) -> Result<u64> {
        self.users.count().await.map_err(ErrorKind::store)
    }
}
