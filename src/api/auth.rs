use crate::api::error::ApiError;
use crate::api::session::{MaybeUser, clear_session_cookie, session_cookie};
use crate::state::AppState;
use audiotube_auth::error::ErrorKind;
use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::header::SET_COOKIE;
use axum::response::{IntoResponse, Redirect, Response};
use serde::Deserialize;
use serde_json::{Value, json};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    email: String,
}

pub async fn request(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(payload) = payload?;
    state.auth.request_login(&payload.email).await?;
    Ok(Json(json!({ "ok": true, "message": "Check your email for login link" })))
}

#[derive(Debug, Deserialize)]
pub struct VerifyParams {
    token: Option<String>,
}

/// Landing page of the emailed link. Always answers with a redirect to the
/// front page, setting the session cookie on success.
pub async fn verify(State(state): State<AppState>, Query(params): Query<VerifyParams>) -> Result<Response, ApiError> {
    let Some(token) = params.token.filter(|t| !t.is_empty()) else {
        return Ok(Redirect::to("/?error=invalid_link").into_response());
    };
    let login = match state.auth.complete_login(&token).await {
        Ok(login) => login,
        Err(err) if matches!(&*err, ErrorKind::Unauthenticated) => {
            return Ok(Redirect::to("/?error=expired_link").into_response());
        },
        Err(err) => return Err(err.into()),
    };
    let cookie = session_cookie(&login.credential, state.auth.sessions().ttl(), state.config.server.secure_cookies);
    Ok(([(SET_COOKIE, cookie)], Redirect::to("/?logged_in=true")).into_response())
}

pub async fn me(State(state): State<AppState>, MaybeUser(session): MaybeUser) -> Result<Json<Value>, ApiError> {
    let Some(session) = session else {
        return Ok(Json(json!({ "logged_in": false })));
    };
    Ok(Json(match state.auth.user(session.user_id).await? {
        Some(user) => json!({ "logged_in": true, "email": user.email, "user_id": user.id }),
        None => json!({ "logged_in": false }),
    }))
}

pub async fn logout(State(state): State<AppState>) -> impl IntoResponse {
    ([(SET_COOKIE, clear_session_cookie(state.config.server.secure_cookies))], Json(json!({ "ok": true })))
}
