use std::sync::Arc;
use std::time::Instant;

use common::utils::config::AppConfig;
use graph_store::GraphStore;
use ingestion_pipeline::PipelineOrchestrator;
use llm_client::LlmClient;
use ner_client::NerClient;

/// Shared application state, cloned cheaply (every field is an `Arc` or
/// `Copy`/small value) into every handler via `axum::extract::State`.
#[derive(Clone)]
pub struct ApiState {
    pub config: AppConfig,
    pub graph: Arc<dyn GraphStore>,
    pub llm: Arc<LlmClient>,
    pub ner: Option<Arc<NerClient>>,
    pub orchestrator: Arc<PipelineOrchestrator>,
    pub started_at: Instant,
}

impl ApiState {
    pub fn new(
        config: AppConfig,
        graph: Arc<dyn GraphStore>,
        llm: Arc<LlmClient>,
        ner: Option<Arc<NerClient>>,
        orchestrator: Arc<PipelineOrchestrator>,
    ) -> Self {
        Self { config, graph, llm, ner, orchestrator, started_at: Instant::now() }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
