//! AudioTube backend: magic-link login, yt-dlp backed search and streaming,
//! and per-user listening history.

pub mod api;
pub mod error;
pub mod logging;
pub mod maintenance;
mod state;
pub mod streams;

use crate::error::{ErrorKind, Result};
use crate::maintenance::{Maintenance, PurgeReport};
use audiotube_config::Config;
use audiotube_store::{Database, PoolOptions};
use exn::ResultExt;
use tokio::net::TcpListener;

pub use crate::state::AppState;

/// Open (creating if needed) the database described by `config`.
pub async fn open_database(config: &Config) -> Result<Database> {
    let path = &config.database.path;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).or_raise(|| ErrorKind::Database)?;
    }
    let options = PoolOptions {
        max_connections: config.database.max_connections,
        acquire_timeout: config.database.acquire_timeout(),
    };
    Database::connect(path, options).await.or_raise(|| ErrorKind::Database)
}

/// Serve the API until interrupted, running maintenance in the background.
pub async fn serve(config: Config) -> Result<()> {
    let db = open_database(&config).await?;
    let bind = config.server.bind;
    let interval = config.server.maintenance_interval();
    let maintenance = Maintenance::from_config(&config, &db);
    let state = AppState::from_config(config, &db)?;

    let (stop_maintenance, stopped) = tokio::sync::oneshot::channel::<()>();
    let task = maintenance.spawn(interval, async move {
        _ = stopped.await;
    });

    let listener = TcpListener::bind(bind).await.or_raise(|| ErrorKind::Bind(bind))?;
    tracing::info!(%bind, "Listening");
    let served = axum::serve(listener, api::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .or_raise(|| ErrorKind::Serve);

    _ = stop_maintenance.send(());
    _ = task.await;
    db.close().await;
    tracing::info!("Shut down");
    served
}

/// Run a single maintenance pass against the configured database.
pub async fn purge(config: &Config) -> Result<PurgeReport> {
    let db = open_database(config).await?;
    let report = Maintenance::from_config(config, &db).run_once().await;
    db.close().await;
    report
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown requested");
}
