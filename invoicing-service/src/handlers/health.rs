use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use crate::AppState;

pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "invoicing-service",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Ready once the backing store answers; the memory store always does.
pub async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    match &state.db {
        Some(db) => match db.health_check().await {
            Ok(()) => (StatusCode::OK, Json(json!({ "status": "ready" }))),
            Err(_) => (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "unavailable" })),
            ),
        },
        None => (StatusCode::OK, Json(json!({ "status": "ready" }))),
    }
}

pub async fn metrics() -> impl IntoResponse {
    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        crate::services::metrics::get_metrics(),
    )
}
