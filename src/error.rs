//! Application Error Types
//!
//! Start-up, maintenance and CLI failures. Request failures are translated to
//! HTTP responses by [`crate::api::ApiError`] instead.

use derive_more::{Display, Error};

/// An application error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for application operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    #[display("invalid configuration")]
    Config,
    #[display("could not install log subscriber")]
    Logging,
    #[display("could not open database")]
    Database,
    #[display("could not set up authentication")]
    Auth,
    #[display("could not set up media resolver")]
    Resolver,
    #[display("could not listen on {_0}")]
    Bind(#[error(not(source))] std::net::SocketAddr),
    #[display("server terminated unexpectedly")]
    Serve,
    /// A maintenance pass failed; the next scheduled pass may succeed.
    #[display("maintenance failed")]
    Maintenance,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Maintenance)
    }
}
