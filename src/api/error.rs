//! Translation of domain errors into HTTP responses.
//!
//! Handlers return `Result<_, ApiError>` and use `?` on any domain result;
//! the `From` impls below decide the status code and the client-facing
//! message. Server-side failures are logged here with their full error tree,
//! and the client only sees a generic message.

use audiotube_auth::error::{Error as AuthError, ErrorKind as AuthErrorKind};
use audiotube_resolver::error::{Error as ResolverError, ErrorKind as ResolverErrorKind};
use audiotube_store::error::{Error as StoreError, ErrorKind as StoreErrorKind};
use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use std::fmt::Debug;

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}
impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self { status, message: message.into() }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "Not logged in")
    }

    /// A failure that is the server's fault: log it, say little.
    pub fn internal(err: impl Debug) -> Self {
        Self::server(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error", err)
    }

    fn server(status: StatusCode, message: &str, err: impl Debug) -> Self {
        tracing::error!(status = status.as_u16(), error = ?err, "{message}");
        Self::new(status, message)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match &*err {
            AuthErrorKind::InvalidEmail => Self::bad_request("Valid email required"),
            AuthErrorKind::Unauthenticated => Self::unauthorized(),
            AuthErrorKind::Delivery => Self::server(StatusCode::BAD_GATEWAY, "Failed to send email", err),
            AuthErrorKind::Unavailable => {
                Self::server(StatusCode::SERVICE_UNAVAILABLE, "Service temporarily unavailable", err)
            },
            AuthErrorKind::Conflict | AuthErrorKind::Store | AuthErrorKind::Session | AuthErrorKind::Template => {
                Self::internal(err)
            },
        }
    }
}

impl From<ResolverError> for ApiError {
    fn from(err: ResolverError) -> Self {
        match &*err {
            ResolverErrorKind::InvalidVideoId => Self::bad_request("Invalid video id"),
            ResolverErrorKind::InvalidDateFilter => Self::bad_request("Unknown date filter"),
            ResolverErrorKind::Timeout => Self::server(StatusCode::GATEWAY_TIMEOUT, "Timed out waiting for yt-dlp", err),
            ResolverErrorKind::Failed(_) | ResolverErrorKind::Malformed => {
                Self::server(StatusCode::BAD_GATEWAY, "yt-dlp could not resolve the request", err)
            },
            ResolverErrorKind::NotFound | ResolverErrorKind::Spawn => Self::internal(err),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match &*err {
            StoreErrorKind::Timeout => {
                Self::server(StatusCode::SERVICE_UNAVAILABLE, "Service temporarily unavailable", err)
            },
            _ => Self::internal(err),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::new(rejection.status(), rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::new(rejection.status(), rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(AuthErrorKind::InvalidEmail, StatusCode::BAD_REQUEST)]
    #[case(AuthErrorKind::Unauthenticated, StatusCode::UNAUTHORIZED)]
    #[case(AuthErrorKind::Delivery, StatusCode::BAD_GATEWAY)]
    #[case(AuthErrorKind::Unavailable, StatusCode::SERVICE_UNAVAILABLE)]
    #[case(AuthErrorKind::Store, StatusCode::INTERNAL_SERVER_ERROR)]
    fn test_auth_status(#[case] kind: AuthErrorKind, #[case] status: StatusCode) {
        assert_eq!(ApiError::from(exn::Exn::from(kind)).status(), status);
    }

    #[rstest]
    #[case(ResolverErrorKind::InvalidVideoId, StatusCode::BAD_REQUEST)]
    #[case(ResolverErrorKind::Timeout, StatusCode::GATEWAY_TIMEOUT)]
    #[case(ResolverErrorKind::Failed(1), StatusCode::BAD_GATEWAY)]
    #[case(ResolverErrorKind::Spawn, StatusCode::INTERNAL_SERVER_ERROR)]
    fn test_resolver_status(#[case] kind: ResolverErrorKind, #[case] status: StatusCode) {
        assert_eq!(ApiError::from(exn::Exn::from(kind)).status(), status);
    }

    #[test]
    fn test_store_timeout_is_unavailable() {
        let err = ApiError::from(exn::Exn::from(StoreErrorKind::Timeout));
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_unauthenticated_reveals_nothing() {
        let err = ApiError::from(exn::Exn::from(AuthErrorKind::Unauthenticated));
        assert_eq!(err.message(), "Not logged in");
    }
}
