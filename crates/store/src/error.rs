//! Store Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};
use exn::ResultExt;

/// A store error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    #[display("database error")]
    Database,
    #[display("database migration error")]
    Migration,
    /// No connection became available (or the database stayed locked) in time.
    #[display("timed out waiting for the database")]
    Timeout,
    /// A unique constraint rejected the write.
    #[display("record already exists")]
    Conflict,
    /// A stored value could not be converted to or from its model type.
    #[display("invalid stored data: {_0}")]
    InvalidData(#[error(not(source))] &'static str),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout)
    }
}

/// Classifies [`sqlx::Error`]s into the matching [`ErrorKind`] while keeping
/// the original error as the child of the raised one.
pub(crate) trait SqlxResultExt<T> {
    fn or_store(self) -> Result<T>;
}
impl<T> SqlxResultExt<T> for std::result::Result<T, sqlx::Error> {
    #[track_caller]
    fn or_store(self) -> Result<T> {
        let kind = match &self {
            Err(sqlx::Error::PoolTimedOut) => ErrorKind::Timeout,
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => ErrorKind::Conflict,
            // SQLITE_BUSY / SQLITE_LOCKED after the busy timeout elapsed.
            Err(sqlx::Error::Database(db)) if matches!(db.code().as_deref(), Some("5" | "6")) => ErrorKind::Timeout,
            _ => ErrorKind::Database,
        };
        self.or_raise(move || kind)
    }
}
