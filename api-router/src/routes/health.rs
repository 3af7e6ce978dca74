use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use crate::api_state::ApiState;

#[derive(Serialize)]
struct ServiceStatuses {
    graph_store: &'static str,
    llm: &'static str,
    ner: &'static str,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    services: ServiceStatuses,
    version: &'static str,
    uptime_seconds: u64,
}

/// `GET /health` (§6): `healthy` iff every dependent service reports
/// connected/loaded, `unhealthy` if any errors out, `degraded` otherwise
/// (e.g. NER simply not configured).
pub async fn health(State(state): State<ApiState>) -> impl IntoResponse {
    let graph_ok = state.graph.health_check().await;
    let llm_ok = state.llm.health_check().await;
    let ner_status = match &state.ner {
        Some(ner) => {
            if ner.health_check().await {
                "connected"
            } else {
                "error"
            }
        }
        None => "not_configured",
    };

    let graph_store = if graph_ok { "connected" } else { "error" };
    let llm = if llm_ok { "connected" } else { "error" };

    let any_error = graph_store == "error" || llm == "error" || ner_status == "error";
    let all_connected = graph_store == "connected" && llm == "connected" && ner_status == "connected";

    let status = if all_connected {
        "healthy"
    } else if any_error {
        "unhealthy"
    } else {
        "degraded"
    };

    Json(HealthResponse {
        status,
        services: ServiceStatuses { graph_store, llm, ner: ner_status },
        version: env!("CARGO_PKG_VERSION"),
        uptime_seconds: state.uptime_seconds(),
    })
}
