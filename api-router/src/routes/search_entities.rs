use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use common::domain::EntitySearchRequest;
use common::utils::search_limits::validate_entity_search_request;

use crate::api_state::ApiState;
use crate::error::ApiError;

#[derive(Serialize)]
struct EntitySearchRow {
    text: String,
    normalized: String,
    type_full: String,
    mention_count: i64,
    avg_confidence: f32,
}

#[derive(Serialize)]
pub struct EntitySearchResponse {
    entities: Vec<EntitySearchRow>,
}

/// `POST /api/v1/search/entities` (§6): case-insensitive substring match
/// of any `entity_terms` against `Entity.text` or `Entity.normalized`,
/// deduplicated, ordered by `mention_count` descending.
pub async fn search_entities(
    State(state): State<ApiState>,
    Json(request): Json<EntitySearchRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_entity_search_request(&request)?;

    let rows = state
        .graph
        .search_entities(&request.entity_terms, request.limit, request.min_mentions)
        .await?;

    let entities = rows
        .into_iter()
        .map(|row| EntitySearchRow {
            text: row.text,
            normalized: row.normalized,
            type_full: row.type_full,
            mention_count: row.mention_count,
            avg_confidence: row.avg_confidence,
        })
        .collect();

    Ok(Json(EntitySearchResponse { entities }))
}
