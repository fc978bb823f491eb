//! The `session` cookie and the extractors that gate handlers on it.

use crate::api::error::ApiError;
use crate::state::AppState;
use audiotube_auth::Session;
use axum::extract::FromRequestParts;
use axum::http::header::{COOKIE, HeaderMap};
use axum::http::request::Parts;
use time::Duration;

pub const SESSION_COOKIE: &str = "session";

/// Find a cookie by name in the request's `Cookie` headers.
pub fn read_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|header| header.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find_map(|(key, value)| (key == name).then_some(value))
}

/// `Set-Cookie` value carrying a session credential.
pub fn session_cookie(credential: &str, max_age: Duration, secure: bool) -> String {
    let secure = if secure { "; Secure" } else { "" };
    format!(
        "{SESSION_COOKIE}={credential}; Path=/; Max-Age={}; HttpOnly; SameSite=Lax{secure}",
        max_age.whole_seconds()
    )
}

/// `Set-Cookie` value that removes the session cookie.
pub fn clear_session_cookie(secure: bool) -> String {
    session_cookie("", Duration::ZERO, secure)
}

fn session_from(parts: &Parts, state: &AppState) -> Option<Session> {
    let credential = read_cookie(&parts.headers, SESSION_COOKIE).filter(|c| !c.is_empty())?;
    state.auth.authenticate(credential).ok()
}

/// The signed-in user. Rejects the request with 401 otherwise.
#[derive(Debug, Clone, Copy)]
pub struct CurrentUser(pub Session);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        session_from(parts, state).map(Self).ok_or_else(ApiError::unauthorized)
    }
}

/// The signed-in user, if any.
#[derive(Debug, Clone, Copy)]
pub struct MaybeUser(pub Option<Session>);

impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        Ok(Self(session_from(parts, state)))
    }
}
