use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use common::domain::EnhancedSearchRequest;
use common::utils::search_limits::validate_enhanced_search_request;
use retrieval_pipeline::run_enhanced_search;

use crate::api_state::ApiState;
use crate::error::ApiError;

#[derive(Serialize)]
pub struct EnhancedSearchResponse {
    chunks: Vec<retrieval_pipeline::ScoredChunk>,
    stats: retrieval_pipeline::EnhancedSearchStats,
}

/// `POST /api/v1/search/enhanced` (§4.9/§6): one graph traversal,
/// tiered scoring, dedup, and truncation to `max_chunks`.
pub async fn search_enhanced(
    State(state): State<ApiState>,
    Json(request): Json<EnhancedSearchRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_enhanced_search_request(&request)?;

    let result = run_enhanced_search(
        state.graph.as_ref(),
        &request.search_term_entities,
        request.max_chunks,
    )
    .await?;

    Ok(Json(EnhancedSearchResponse {
        chunks: result.chunks,
        stats: result.stats,
    }))
}
