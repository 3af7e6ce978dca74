use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use serde_json::Value;

use crate::api_state::ApiState;

#[derive(Serialize)]
struct LlmInfo {
    model: Option<String>,
    available: bool,
}

#[derive(Serialize)]
struct NerInfo {
    available: bool,
    entity_type_count: usize,
    type_hierarchy: Value,
}

#[derive(Serialize)]
struct ModelInfoResponse {
    llm: LlmInfo,
    ner: Option<NerInfo>,
}

/// `GET /api/v1/model-info` (§6): the LLM's auto-discovered model
/// identifier (§4.1) plus the NER taxonomy's type hierarchy (§4.2), so
/// clients can render the entity-type vocabulary without bundling their
/// own copy of the taxonomy file.
pub async fn model_info(State(state): State<ApiState>) -> impl IntoResponse {
    let (model, available) = state.llm.model_info().await;

    let ner = match &state.ner {
        Some(ner) => Some(NerInfo {
            available: ner.health_check().await,
            entity_type_count: ner.taxonomy().entity_types().len(),
            type_hierarchy: ner.taxonomy().type_hierarchy_tree(),
        }),
        None => None,
    };

    Json(ModelInfoResponse {
        llm: LlmInfo { model, available },
        ner,
    })
}
