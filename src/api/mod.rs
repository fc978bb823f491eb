//! HTTP routes.
//!
//! | Method     | Path                      | Auth     |
//! |------------|---------------------------|----------|
//! | GET        | `/health`                 |          |
//! | GET        | `/api/stats`              |          |
//! | POST       | `/api/auth/request`       |          |
//! | GET        | `/auth/verify`            |          |
//! | GET        | `/api/auth/me`            | optional |
//! | POST       | `/api/auth/logout`        |          |
//! | GET        | `/api/search`             |          |
//! | GET        | `/api/metadata/{video_id}`|          |
//! | GET        | `/api/stream/{video_id}`  |          |
//! | GET, POST  | `/api/history`            | required |

mod auth;
mod error;
mod history;
mod media;
pub mod session;
mod system;

use crate::state::AppState;
use axum::Router;
use axum::routing::{get, post};

pub use crate::api::error::ApiError;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(system::health))
        .route("/api/stats", get(system::stats))
        .route("/api/auth/request", post(auth::request))
        .route("/auth/verify", get(auth::verify))
        .route("/api/auth/me", get(auth::me))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/search", get(media::search))
        .route("/api/metadata/{video_id}", get(media::metadata))
        .route("/api/stream/{video_id}", get(media::stream))
        .route("/api/history", get(history::list).post(history::add))
        .with_state(state)
}
