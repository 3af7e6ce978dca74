//! Process entry point: wires every component (§2) into one
//! [`api_router::ApiState`] and serves the HTTP surface (C8).
//!
//! There is no module-level global state (§9 "Global mutable state"):
//! every dependency is constructed here, once, and threaded explicitly
//! into the router via `axum::extract::State`.

use std::sync::Arc;
use std::time::Duration;

use api_router::ApiState;
use async_trait::async_trait;
use axum::Router;
use common::utils::config::get_config;
use graph_store::{GraphClient, GraphStore, SchemaManager};
use ingestion_pipeline::{PipelineOrchestrator, SchemaInitializer};
use kg_extractor::{ExtractorConfig, UnifiedExtractor};
use llm_client::LlmClient;
use ner_client::{NerClient, Taxonomy};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Bridges the borrowed-lifetime [`SchemaManager`] to the `'static`,
/// object-safe [`SchemaInitializer`] the orchestrator depends on (§4.7
/// step 1): the manager itself is nearly free to construct, so it is
/// built fresh from the long-lived [`GraphClient`] on every call rather
/// than held across an await point.
struct Neo4jSchemaInitializer {
    client: Arc<GraphClient>,
}

#[async_trait]
impl SchemaInitializer for Neo4jSchemaInitializer {
    async fn ensure_initialized(&self) {
        let result = SchemaManager::new(self.client.graph()).initialize_schema().await;
        info!(
            constraints_created = result.constraints_created,
            indexes_created = result.indexes_created,
            "schema initialization complete"
        );
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .try_init()
        .ok();

    let config = get_config()?;

    let graph_client = Arc::new(
        GraphClient::connect(
            &config.neo4j_uri,
            &config.neo4j_user,
            &config.neo4j_password,
            &config.neo4j_database,
            config.neo4j_max_connection_pool_size,
            config.neo4j_max_connection_lifetime,
            config.neo4j_connection_timeout,
        )
        .await?,
    );
    let graph: Arc<dyn GraphStore> = graph_client.clone();

    let llm = Arc::new(LlmClient::new(
        config.llm_base_url.clone(),
        Duration::from_secs(config.llm_timeout),
        Duration::from_secs(config.llm_retry_interval),
    ));

    let ner = match &config.ner_base_url {
        Some(base_url) => {
            let taxonomy = Taxonomy::load_bundled()?;
            Some(Arc::new(NerClient::new(base_url.clone(), taxonomy, Some(config.entity_min_confidence))))
        }
        None => {
            info!("NER_BASE_URL not configured, unified extraction path only");
            None
        }
    };

    let extractor = Arc::new(UnifiedExtractor::new(
        llm.clone(),
        config.max_concurrent_extractions,
        ExtractorConfig {
            min_entity_confidence: config.entity_min_confidence,
            min_relation_confidence: config.relation_min_confidence,
            max_tokens: config.llm_max_tokens,
            temperature: config.llm_temperature,
        },
    ));

    let schema = Arc::new(Neo4jSchemaInitializer { client: graph_client.clone() });

    let orchestrator = Arc::new(PipelineOrchestrator::new(
        graph.clone(),
        schema,
        extractor,
        ner.clone(),
        config.use_ner_entities,
        config.entity_min_confidence,
    ));

    let api_state = ApiState::new(config.clone(), graph, llm, ner, orchestrator);

    let app: Router<()> = api_router::api_routes(&api_state).layer(TraceLayer::new_for_http());

    let serve_address = format!("{}:{}", config.api_host, config.api_port);
    info!(address = %serve_address, "starting knowledge-graph extraction service");
    let listener = tokio::net::TcpListener::bind(&serve_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
