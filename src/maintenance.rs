//! Periodic cleanup of expired tokens and stale stream-cache rows.

use crate::error::{ErrorKind, Result};
use audiotube_auth::MagicLinks;
use audiotube_config::Config;
use audiotube_store::{Database, StreamCache};
use exn::ResultExt;
use std::future::Future;
use time::{Duration, UtcDateTime};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::instrument;

#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub struct PurgeReport {
    pub tokens: u64,
    pub streams: u64,
}

#[derive(Debug, Clone)]
pub struct Maintenance {
    links: MagicLinks,
    streams: StreamCache,
    retention: Duration,
}
impl Maintenance {
    pub fn new(links: MagicLinks, streams: StreamCache, retention: Duration) -> Self {
        Self { links, streams, retention }
    }

    pub fn from_config(config: &Config, db: &Database) -> Self {
        Self::new(MagicLinks::new(db.tokens(), config.auth.magic_link_ttl()), db.streams(), config.cache.retention())
    }

    pub async fn run_once(&self) -> Result<PurgeReport> {
        self.run_once_at(UtcDateTime::now()).await
    }

    /// Purge used/expired tokens and cache rows past retention.
    ///
    /// Both purges are attempted even if the first fails.
    #[instrument("maintenance", skip_all)]
    pub async fn run_once_at(&self, now: UtcDateTime) -> Result<PurgeReport> {
        let tokens = self.links.purge_expired_at(now).await.or_raise(|| ErrorKind::Maintenance);
        let streams = self.streams.purge_stale_at(self.retention, now).await.or_raise(|| ErrorKind::Maintenance);
        let report = PurgeReport { tokens: tokens?, streams: streams? };
        tracing::info!(tokens = report.tokens, streams = report.streams, "Maintenance complete");
        Ok(report)
    }

    /// Run [`run_once`](Self::run_once) every `interval` until `shutdown`
    /// resolves. Failures are logged and the schedule continues.
    pub fn spawn(
        self,
        interval: std::time::Duration,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately; skip it so start-up isn't
            // slowed by a purge.
            ticker.tick().await;
            tokio::pin!(shutdown);
            loop {
                tokio::select! {
                    _ = &mut shutdown => break,
                    _ = ticker.tick() => {
                        if let Err(err) = self.run_once().await {
                            tracing::warn!(error = ?err, "Scheduled maintenance failed");
                        }
                    },
                }
            }
            tracing::debug!("Maintenance task stopped");
        })
    }
}
