//! Auth Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use audiotube_store::error::{Error as StoreError, ErrorKind as StoreErrorKind};
use derive_more::{Display, Error};

/// An auth error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for auth operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
///
/// ### Client Errors
/// - [`ErrorKind::InvalidEmail`]
/// - [`ErrorKind::Unauthenticated`] - deliberately says nothing about *why*: an
///   unknown, expired, already-used or forged credential all look the same.
///
/// ### Dependency Errors
/// - [`ErrorKind::Store`], [`ErrorKind::Unavailable`], [`ErrorKind::Conflict`]
/// - [`ErrorKind::Delivery`]
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    #[display("valid email required")]
    InvalidEmail,
    #[display("not authenticated")]
    Unauthenticated,
    /// A freshly generated token collided with an existing one.
    #[display("token collision")]
    Conflict,
    #[display("storage failure")]
    Store,
    /// The store timed out; the same request may succeed later.
    #[display("storage temporarily unavailable")]
    Unavailable,
    /// The login email could not be handed to the mail provider.
    #[display("failed to send email")]
    Delivery,
    /// Encoding a session credential failed.
    #[display("could not issue session")]
    Session,
    /// The mail template could not be compiled or rendered.
    #[display("invalid email template")]
    Template,
}
impl ErrorKind {
    /// Re-raise a store error, preserving its error tree, under the matching auth kind.
    #[track_caller]
    pub fn store(err: StoreError) -> Error {
        let kind = match &*err {
            StoreErrorKind::Timeout => Self::Unavailable,
            StoreErrorKind::Conflict => Self::Conflict,
            _ => Self::Store,
        };
        err.raise(kind)
    }

    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable | Self::Delivery)
    }
}
