//! SQLite pool setup shared by every repository.

use exn::ResultExt;
use sqlx::SqliteConnection;
use sqlx::pool::PoolConnectionMetadata;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteSynchronous};
use std::path::Path;
use std::time::Duration;
use tracing::instrument;

use crate::error::{ErrorKind, Result};
use crate::repo::{AuthTokens, History, StreamCache, Users};

/// Schema migrations, compiled into the binary.
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// Sizing and timeouts for the connection pool.
#[derive(Debug, Clone, Copy)]
pub struct PoolOptions {
    pub max_connections: u32,
    /// How long an operation may wait for a free connection before failing
    /// with [`ErrorKind::Timeout`].
    pub acquire_timeout: Duration,
}
impl Default for PoolOptions {
    fn default() -> Self {
        Self { max_connections: 5, acquire_timeout: Duration::from_secs(5) }
    }
}

/// Handle to the store. Cheap to clone; repositories are created from it and
/// each call holds a pooled connection for one statement only.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    async fn new(options: SqliteConnectOptions, pool_options: PoolOptions) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            // Connection-scoped PRAGMAs must run on every new connection.
            .after_connect(|conn, meta| Box::pin(async move { Self::apply_pragmas(conn, meta).await }))
            .max_connections(pool_options.max_connections)
            .acquire_timeout(pool_options.acquire_timeout)
            .connect_with(options)
            .await
            .or_raise(|| ErrorKind::Database)?;
        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    /// Open (creating the file when missing) and migrate the database at
    /// `path`. The parent directory must already exist.
    pub async fn connect(path: impl AsRef<Path>, pool_options: PoolOptions) -> Result<Self> {
        let path = path.as_ref();
        tracing::debug!(path = %path.display(), "Connecting to database");
        let options = Self::base_options().filename(path).create_if_missing(true);
        Self::new(options, pool_options).await
    }

    /// Fresh, migrated in-memory database. Left public (not `cfg(test)`) so
    /// dependent crates can build fixtures on it.
    pub async fn connect_in_memory() -> Result<Self> {
        let options = Self::base_options().filename(":memory:");
        // Without a shared cache, every pooled connection would see its own
        // empty database; a single connection keeps them all consistent.
        Self::new(options, PoolOptions { max_connections: 1, ..PoolOptions::default() }).await
    }

    fn base_options() -> SqliteConnectOptions {
        SqliteConnectOptions::new()
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            // history rows cascade with their user
            .foreign_keys(true)
            .synchronous(SqliteSynchronous::Normal)
            // Writers queue behind the single WAL writer; anything longer
            // surfaces as a retryable timeout.
            .busy_timeout(Duration::from_millis(1500))
    }

    /// PRAGMAs with no `SqliteConnectOptions` setter.
    async fn apply_pragmas(conn: &mut SqliteConnection, _meta: PoolConnectionMetadata) -> sqlx::Result<()> {
        sqlx::query(
            r#"
                PRAGMA wal_autocheckpoint = 800;
                PRAGMA cache_size = -8192;
                PRAGMA temp_store = MEMORY;
            "#,
        )
        .execute(conn)
        .await?;
        Ok(())
    }

    #[instrument("migrate", skip(self))]
    async fn migrate(&self) -> Result<()> {
        MIGRATOR.run(&self.pool).await.or_raise(|| ErrorKind::Migration)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn users(&self) -> Users {
        Users::from(self)
    }

    pub fn tokens(&self) -> AuthTokens {
        AuthTokens::from(self)
    }

    pub fn history(&self) -> History {
        History::from(self)
    }

    pub fn streams(&self) -> StreamCache {
        StreamCache::from(self)
    }

    /// Refresh planner statistics, then wait for checked-out connections and
    /// close the pool. Later calls on any clone fail.
    pub async fn close(&self) {
        _ = sqlx::query("PRAGMA optimize").execute(&self.pool).await;
        self.pool.close().await;
    }
}
