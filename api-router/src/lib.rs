//! HTTP surface (C8): the service's JSON API, wired as an [`axum::Router`]
//! over [`ApiState`] (§6).

pub mod api_state;
pub mod error;
pub mod routes;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;

pub use api_state::ApiState;

/// Builds the full router: `/`, `/health`, and `/stats` at the root, the
/// rest of the external interfaces contract under `/api/v1`.
pub fn api_routes(state: &ApiState) -> Router<()> {
    Router::new()
        .route("/", get(routes::root::root))
        .route("/health", get(routes::health::health))
        .route("/stats", get(routes::stats::stats))
        .nest("/api/v1", api_routes_v1(state))
        .with_state(state.clone())
}

/// Just the `/api/v1/*` subtree, exposed separately so a caller that
/// already owns its own top-level router (and mounts other services
/// alongside this one) can `.nest("/api/v1", api_routes_v1(state))` without
/// picking up this crate's root/health/stats routes too.
pub fn api_routes_v1(state: &ApiState) -> Router<ApiState> {
    Router::new()
        .route("/extraction/status", get(routes::extraction_status::extraction_status))
        .route("/model-info", get(routes::model_info::model_info))
        .route(
            "/ingest",
            post(routes::ingest::ingest)
                .layer(DefaultBodyLimit::max(state.config.ingest_max_body_bytes)),
        )
        .route("/search/entities", post(routes::search_entities::search_entities))
        .route("/search/chunks", post(routes::search_chunks::search_chunks))
        .route("/expand/entities", post(routes::expand_entities::expand_entities))
        .route("/search/enhanced", post(routes::search_enhanced::search_enhanced))
}
