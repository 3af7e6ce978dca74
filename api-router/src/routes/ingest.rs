use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;

use common::domain::IngestRequest;
use common::utils::ingest_limits::{validate_ingest_request, IngestValidationError};

use crate::api_state::ApiState;
use crate::error::ApiError;

/// `POST /api/v1/ingest` (§6): validates the request against the external
/// interfaces contract, then hands it to the pipeline orchestrator (§4.7).
/// Validation failures never touch the graph or the LLM, per §7.
pub async fn ingest(
    State(state): State<ApiState>,
    Json(request): Json<IngestRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_ingest_request(&request).map_err(|IngestValidationError::InvalidField(msg)| ApiError::Validation(msg))?;

    let response = state
        .orchestrator
        .process_document(
            request.content_id,
            &request.url,
            &request.title,
            &request.markdown,
            &request.chunks,
        )
        .await?;

    Ok(Json(response))
}
