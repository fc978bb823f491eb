use crate::error::{ErrorKind, Result};
use crate::streams::StreamService;
use audiotube_auth::Authenticator;
use audiotube_config::Config;
use audiotube_resolver::{Resolver, YtDlp};
use audiotube_store::{Database, History};
use exn::ResultExt;
use std::sync::Arc;

/// Everything a request handler may need.
///
/// Holds only immutable configuration and cheaply cloneable handles; all
/// mutable state lives in the database.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub auth: Authenticator,
    pub resolver: Arc<dyn Resolver>,
    pub streams: StreamService,
    pub history: History,
}
impl AppState {
    pub fn new(config: Config, db: &Database, auth: Authenticator, resolver: Arc<dyn Resolver>) -> Self {
        let streams = StreamService::new(db.streams(), resolver.clone(), config.cache.freshness());
        Self { config: Arc::new(config), auth, resolver, streams, history: db.history() }
    }

    /// Wire up the production collaborators described by `config`.
    pub fn from_config(config: Config, db: &Database) -> Result<Self> {
        let auth = Authenticator::from_config(&config, db).or_raise(|| ErrorKind::Auth)?;
        let resolver = YtDlp::discover(&config.resolver).or_raise(|| ErrorKind::Resolver)?;
        Ok(Self::new(config, db, auth, Arc::new(resolver)))
    }
}
