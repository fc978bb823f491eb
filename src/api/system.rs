use crate::state::AppState;
use axum::Json;
use axum::extract::State;
use serde_json::{Value, json};

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// User count and pricing. An unreachable store reports zero users instead
/// of failing the landing page.
pub async fn stats(State(state): State<AppState>) -> Json<Value> {
    let count = state.auth.user_count().await.unwrap_or_else(|err| {
        tracing::warn!(error = ?err, "Failed to count users");
        0
    });
    let signup = &state.config.signup;
    Json(json!({
        "user_count": count,
        "free_slots": signup.free_tier.saturating_sub(count),
        "pricing": {
            "free_tier": signup.free_tier,
            "paid_tier": signup.paid_tier,
            "price": signup.price,
        },
    }))
}
