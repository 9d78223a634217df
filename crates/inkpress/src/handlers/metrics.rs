use axum::{extract::State, http::header, response::IntoResponse};

use crate::state::AppState;

/// GET /metrics - Prometheus text exposition.
#[axum::debug_handler]
pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}
