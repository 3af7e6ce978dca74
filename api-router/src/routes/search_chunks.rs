use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use common::domain::ChunkSearchRequest;
use common::utils::search_limits::validate_chunk_search_request;
use graph_store::EntityLookup;

use crate::api_state::ApiState;
use crate::error::ApiError;

#[derive(Serialize)]
struct ChunkSearchRow {
    vector_rowid: i64,
    chunk_index: i64,
    text_preview: String,
    matched_entity_count: i64,
    document_url: Option<String>,
    document_title: Option<String>,
}

#[derive(Serialize)]
pub struct ChunkSearchResponse {
    chunks: Vec<ChunkSearchRow>,
}

/// `POST /api/v1/search/chunks` (§6): chunks mentioning any entity
/// resolved by `entity_ids` or `entity_names`, ordered by matched-entity
/// count descending then `chunk_index` ascending.
pub async fn search_chunks(
    State(state): State<ApiState>,
    Json(request): Json<ChunkSearchRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_chunk_search_request(&request)?;

    let lookup = if !request.entity_ids.is_empty() {
        EntityLookup::Ids(&request.entity_ids)
    } else {
        EntityLookup::Names(&request.entity_names)
    };

    let rows = state.graph.search_chunks(lookup).await?;

    let chunks = rows
        .into_iter()
        .map(|row| ChunkSearchRow {
            vector_rowid: row.vector_rowid,
            chunk_index: row.chunk_index,
            text_preview: row.text_preview,
            matched_entity_count: row.matched_entity_count,
            document_url: request.include_document_info.then_some(row.document_url).flatten(),
            document_title: request.include_document_info.then_some(row.document_title).flatten(),
        })
        .collect();

    Ok(Json(ChunkSearchResponse { chunks }))
}
