use axum::{Json, Router, http::StatusCode, middleware, response::IntoResponse, routing::get};
use serde_json::json;

use crate::{metrics, progress, recipe, session, state::ApiState};

/// API routes with request metrics. `/metrics` is mounted by the binary.
pub fn router() -> Router<ApiState> {
    Router::new()
        .route("/health", get(health))
        .merge(progress::routes())
        .merge(recipe::routes())
        .merge(session::routes())
        .fallback(handler_404)
        .layer(middleware::from_fn(metrics::track_metrics))
}

async fn health() -> StatusCode {
    StatusCode::OK
}

async fn handler_404() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": "The requested resource was not found" })),
    )
}
