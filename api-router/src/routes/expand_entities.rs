use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use common::domain::ExpandEntitiesRequest;
use common::utils::search_limits::validate_expand_entities_request;

use crate::api_state::ApiState;
use crate::error::ApiError;

#[derive(Serialize)]
struct ExpandedEntityRow {
    text: String,
    normalized: String,
    type_full: String,
    shared_chunk_count: i64,
    confidence: f32,
    relationship_predicates: Vec<String>,
}

#[derive(Serialize)]
pub struct ExpandEntitiesResponse {
    entities: Vec<ExpandedEntityRow>,
}

/// Confidence bucket for `/api/v1/expand/entities` (§6, §9): independent
/// of the §4.9 scoring tiers — do not conflate the two.
fn confidence_bucket(shared_chunk_count: i64) -> f32 {
    if shared_chunk_count >= 5 {
        0.9
    } else if shared_chunk_count >= 3 {
        0.7
    } else {
        0.5
    }
}

/// `POST /api/v1/expand/entities` (§6): entities co-occurring with
/// `entity_names`, bucketed by shared-chunk-count confidence and filtered
/// to `min_confidence`.
pub async fn expand_entities(
    State(state): State<ApiState>,
    Json(request): Json<ExpandEntitiesRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_expand_entities_request(&request)?;

    let rows = state
        .graph
        .expand_entities(&request.entity_names, request.max_expansions, request.expansion_depth)
        .await?;

    let entities = rows
        .into_iter()
        .map(|row| ExpandedEntityRow {
            confidence: confidence_bucket(row.shared_chunk_count),
            text: row.text,
            normalized: row.normalized,
            type_full: row.type_full,
            shared_chunk_count: row.shared_chunk_count,
            relationship_predicates: row.relationship_predicates,
        })
        .filter(|row| row.confidence >= request.min_confidence)
        .take(request.max_expansions)
        .collect();

    Ok(Json(ExpandEntitiesResponse { entities }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buckets_by_shared_chunk_count() {
        assert_eq!(confidence_bucket(5), 0.9);
        assert_eq!(confidence_bucket(7), 0.9);
        assert_eq!(confidence_bucket(3), 0.7);
        assert_eq!(confidence_bucket(4), 0.7);
        assert_eq!(confidence_bucket(2), 0.5);
        assert_eq!(confidence_bucket(0), 0.5);
    }
}
