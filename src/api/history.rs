use crate::api::error::ApiError;
use crate::api::session::CurrentUser;
use crate::state::AppState;
use audiotube_resolver::VideoId;
use audiotube_store::HistoryEntry;
use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use time::UtcDateTime;
use time::format_description::well_known::Rfc3339;

#[derive(Debug, Serialize)]
pub struct HistoryItem {
    video_id: String,
    title: String,
    channel: String,
    duration: u32,
    viewed_at: String,
}
impl TryFrom<HistoryEntry> for HistoryItem {
    type Error = time::error::Format;
    fn try_from(entry: HistoryEntry) -> Result<Self, Self::Error> {
        Ok(Self {
            viewed_at: entry.viewed_at.format(&Rfc3339)?,
            video_id: entry.video_id,
            title: entry.title,
            channel: entry.channel,
            duration: entry.duration,
        })
    }
}

pub async fn list(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
) -> Result<Json<Vec<HistoryItem>>, ApiError> {
    let limit = usize::try_from(state.config.history.limit).map_err(ApiError::internal)?;
    let entries = state.history.list(session.user_id, limit).await?;
    let items = entries.into_iter().map(HistoryItem::try_from).collect::<Result<_, _>>().map_err(ApiError::internal)?;
    Ok(Json(items))
}

#[derive(Debug, Deserialize)]
pub struct NewHistoryEntry {
    video_id: Option<String>,
    title: Option<String>,
    channel: Option<String>,
    /// Seconds; fractional values from the player are rounded.
    duration: Option<f64>,
}

pub async fn add(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    payload: Result<Json<NewHistoryEntry>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(payload) = payload?;
    let Some(video_id) = payload.video_id.filter(|id| !id.is_empty()) else {
        return Err(ApiError::bad_request("video_id required"));
    };
    let video_id = VideoId::parse(video_id)?;
    let entry = HistoryEntry {
        video_id: video_id.as_str().to_string(),
        title: payload.title.unwrap_or_default(),
        channel: payload.channel.unwrap_or_default(),
        duration: payload.duration.map_or(0, |d| d.clamp(0.0, f64::from(u32::MAX)).round() as u32),
        viewed_at: UtcDateTime::now(),
    };
    state.history.append(session.user_id, &entry).await?;
    Ok(Json(json!({ "ok": true })))
}
