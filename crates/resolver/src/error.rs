//! Resolver Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// A resolver error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for resolver operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    #[display("yt-dlp not detected on your system")]
    NotFound,
    /// Rejected before any process was spawned.
    #[display("invalid video id")]
    InvalidVideoId,
    #[display("unknown date filter")]
    InvalidDateFilter,
    /// The process was killed after running past its deadline.
    #[display("yt-dlp timed out")]
    Timeout,
    /// yt-dlp exited with a non-zero exit code (`-1` when killed by a signal).
    #[display("yt-dlp exited with code: {_0}")]
    Failed(#[error(not(source))] i32),
    /// The executable could not be started at all.
    #[display("could not start yt-dlp")]
    Spawn,
    /// yt-dlp succeeded but printed something unusable.
    #[display("unexpected yt-dlp output")]
    Malformed,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout)
    }
}
