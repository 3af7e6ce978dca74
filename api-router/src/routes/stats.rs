use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::api_state::ApiState;

#[derive(Serialize)]
struct StatsResponse {
    documents_processed: u64,
    entities_total: u64,
    relationships_total: u64,
    mean_processing_ms: f64,
    failed_count: u64,
    last_processed_at: Option<DateTime<Utc>>,
}

/// `GET /stats` (§6): counters accumulated by the pipeline orchestrator
/// since process start. Not persisted — restarting the service resets
/// these, same as the reference implementation's in-memory counters.
pub async fn stats(State(state): State<ApiState>) -> impl IntoResponse {
    let snapshot = state.orchestrator.stats();
    Json(StatsResponse {
        documents_processed: snapshot.documents_processed,
        entities_total: snapshot.entities_total,
        relationships_total: snapshot.relationships_total,
        mean_processing_ms: snapshot.mean_processing_ms,
        failed_count: snapshot.failed_count,
        last_processed_at: snapshot.last_processed_at,
    })
}
