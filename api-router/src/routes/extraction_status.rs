use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use crate::api_state::ApiState;

#[derive(Serialize)]
struct ExtractionStatusResponse {
    active: usize,
    queued: usize,
    completed: u64,
    failed: u64,
    max_concurrent: usize,
    slots_available: usize,
    status: &'static str,
}

/// `GET /api/v1/extraction/status` (§6): live metrics off the unified
/// extractor's concurrency gate (§4.3/§5).
pub async fn extraction_status(State(state): State<ApiState>) -> impl IntoResponse {
    let status = state.orchestrator.extractor().gate().status();
    Json(ExtractionStatusResponse {
        active: status.active,
        queued: status.queued,
        completed: status.completed,
        failed: status.failed,
        max_concurrent: status.max_concurrent,
        slots_available: status.slots_available,
        status: if status.at_capacity { "at_capacity" } else { "healthy" },
    })
}
