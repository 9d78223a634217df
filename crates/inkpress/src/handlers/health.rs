//! Liveness and readiness endpoints for the orchestrator.
//!
//! - `/livez` - Liveness (immediate 200, no checks)
//! - `/readyz` - Readiness (one-row article query against storage)

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use inkpress_core::article::ArticleCriteria;
use inkpress_core::storage::repository_error_to_status_code;

use crate::state::AppState;

/// GET /livez - Liveness check.
///
/// Returns 200 immediately. Used to check if the server is accepting connections.
#[axum::debug_handler]
pub async fn livez() -> StatusCode {
    StatusCode::OK
}

/// GET /readyz - Readiness check.
///
/// Runs a one-row article listing through the configured repository.
/// Returns 200 when storage answers, 503 otherwise. The body carries the
/// status the failure would map to on a regular request.
#[axum::debug_handler]
pub async fn readyz(State(state): State<AppState>) -> Response {
    let criteria = ArticleCriteria::new().with_limit(1);

    match state.articles.find_articles(&criteria).await {
        Ok((_, total)) => (
            StatusCode::OK,
            Json(json!({ "ready": true, "articles": total })),
        )
            .into_response(),
        Err(err) => {
            tracing::warn!(error = %err, "Readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "ready": false,
                    "error": err.to_string(),
                    "status": repository_error_to_status_code(&err),
                })),
            )
                .into_response()
        }
    }
}
