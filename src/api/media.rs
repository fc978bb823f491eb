use crate::api::error::ApiError;
use crate::state::AppState;
use crate::streams::ResolvedStream;
use audiotube_resolver::{DateFilter, SearchResult, VideoId};
use axum::Json;
use axum::extract::{Path, Query, State};
use serde::Deserialize;
use serde_json::{Value, json};

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    q: String,
    #[serde(default)]
    date: String,
}

/// Unknown date filters are ignored rather than rejected.
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<SearchResult>>, ApiError> {
    if params.q.trim().is_empty() {
        return Ok(Json(Vec::new()));
    }
    let filter = params.date.parse::<DateFilter>().ok();
    Ok(Json(state.resolver.search(&params.q, filter).await?))
}

/// Metadata is a best-effort enrichment of search results: any failure is
/// reported in-band as `{"id": ..., "error": true}`.
pub async fn metadata(State(state): State<AppState>, Path(video_id): Path<String>) -> Json<Value> {
    let failed = || Json(json!({ "id": video_id, "error": true }));
    let Ok(id) = VideoId::parse(&video_id) else {
        return failed();
    };
    match state.resolver.metadata(&id).await {
        Ok(metadata) => Json(json!(metadata)),
        Err(err) => {
            tracing::warn!(video_id = %id, error = ?err, "Metadata lookup failed");
            failed()
        },
    }
}

pub async fn stream(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
) -> Result<Json<ResolvedStream>, ApiError> {
    let id = VideoId::parse(&video_id)?;
    Ok(Json(state.streams.resolve(&id).await?))
}
