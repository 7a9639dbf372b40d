// handlers/health.rs - GET /health

use axum::{extract::State, http::StatusCode, response::Json};
use chrono::Utc;
use serde_json::{json, Value};

use crate::app::AppState;

/// Liveness plus a reachability probe of the family API. Any HTTP answer from
/// the backend counts as reachable.
pub async fn get(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let now = Utc::now();
    let backend = state.backend.client().base_url().to_string();

    match state.backend.client().probe().await {
        Ok(status) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "timestamp": now,
                "backend": {"url": backend, "reachable": true, "status": status.as_u16()}
            })),
        ),
        Err(e) => {
            tracing::warn!("Health probe of {} failed: {}", backend, e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "degraded",
                    "timestamp": now,
                    "backend": {"url": backend, "reachable": false, "error": e.to_string()}
                })),
            )
        }
    }
}
