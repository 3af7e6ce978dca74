use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::api_state::ApiState;

pub async fn root(State(_state): State<ApiState>) -> impl IntoResponse {
    Json(json!({
        "service": "kg-extraction-service",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
