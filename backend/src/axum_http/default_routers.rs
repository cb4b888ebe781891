use axum::{Json, response::IntoResponse};
use serde_json::json;
use tracing::debug;

use crate::axum_http::error_responses::AppError;

pub async fn not_found() -> impl IntoResponse {
    debug!("router: no route matched");
    AppError::NotFound("Route not found".to_string())
}

pub async fn health_check() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}
