//! Health check endpoint.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::api::state::AppState;
use crate::api::utils::error_response;

pub async fn health_handler(State(state): State<AppState>) -> Response {
    let engagement = &state.engagement;
    let version = match engagement.schema_version().await {
        Ok(v) => v,
        Err(e) => return error_response(e),
    };
    let stats = match engagement.stats().await {
        Ok(s) => s,
        Err(e) => return error_response(e),
    };

    let body = serde_json::json!({
        "status": "ok",
        "schemaVersion": version,
        "stats": stats,
    });
    (StatusCode::OK, axum::Json(body)).into_response()
}
