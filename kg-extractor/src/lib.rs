//! Unified knowledge-graph extractor (C3): a single LLM call that
//! produces both entities and relationships for a document, gated by a
//! process-wide concurrency semaphore and hardened against truncated or
//! malformed model output.
//!
//! Failure semantics (§4.3): any transport error or unparseable output
//! after healing returns an empty `(entities, relationships)` pair rather
//! than propagating, so the orchestrator still persists the
//! Document/Chunk nodes for a document the model failed to understand.

mod gate;
mod postprocess;
mod prompt;

pub use gate::{ExtractionGate, ExtractionStatus, GateGuard};
pub use postprocess::RejectionCounts;

use std::sync::Arc;
use std::time::Duration;

use common::domain::{ExtractedEntity, ExtractedRelationship};
use llm_client::{CompletionParams, LlmClient};

#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    pub min_entity_confidence: f32,
    pub min_relation_confidence: f32,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            min_entity_confidence: 0.45,
            min_relation_confidence: 0.45,
            max_tokens: 65536,
            temperature: 0.6,
        }
    }
}

/// The single-pass extractor described in §4.3, sharing one
/// [`ExtractionGate`] across every call so the orchestrator's NER-only
/// relationship pass and the fully unified pass both count against the
/// same concurrency budget.
pub struct UnifiedExtractor {
    llm: Arc<LlmClient>,
    gate: Arc<ExtractionGate>,
    config: ExtractorConfig,
}

impl UnifiedExtractor {
    pub fn new(llm: Arc<LlmClient>, max_concurrent_extractions: usize, config: ExtractorConfig) -> Self {
        Self {
            llm,
            gate: Arc::new(ExtractionGate::new(max_concurrent_extractions)),
            config,
        }
    }

    pub fn gate(&self) -> &Arc<ExtractionGate> {
        &self.gate
    }

    /// Extracts both entities and relationships for `text` in one
    /// completion call. Never returns an `Err`; any failure degrades to
    /// `(vec![], vec![])` per §4.3's failure semantics.
    pub async fn extract_kg(&self, text: &str) -> (Vec<ExtractedEntity>, Vec<ExtractedRelationship>) {
        let mut guard = self.gate.acquire().await;
        tracing::debug!(chars = text.chars().count(), "acquired extraction slot for unified pass");

        let prompt = prompt::unified_extraction_prompt(text);
        let completion = self
            .llm
            .complete(
                &prompt,
                CompletionParams {
                    max_tokens: Some(self.config.max_tokens),
                    temperature: Some(self.config.temperature),
                    stop: None,
                    repetition_penalty: None,
                },
            )
            .await;

        let raw = match completion {
            Ok(raw) => raw,
            Err(err) => {
                tracing::warn!(error = %err, "unified extraction call failed, returning empty KG");
                return (Vec::new(), Vec::new());
            }
        };

        let healed = json_stream_parser::heal(&raw);
        let raw_entities = healed.get("entities").and_then(|v| v.as_array()).cloned().unwrap_or_default();
        let raw_relationships = healed.get("relationships").and_then(|v| v.as_array()).cloned().unwrap_or_default();

        let mut rejections = RejectionCounts::default();
        let entities = postprocess::postprocess_entities(&raw_entities, text, self.config.min_entity_confidence, &mut rejections);
        let relationships = postprocess::postprocess_relationships(&raw_relationships, &entities, self.config.min_relation_confidence, &mut rejections);

        guard.mark_succeeded();
        tracing::info!(
            entities = entities.len(),
            relationships = relationships.len(),
            "unified extraction complete"
        );
        (entities, relationships)
    }

    /// The relationship-only pass used when the orchestrator is
    /// configured to source entities from the NER path (§4.7): entities
    /// are already known, so the prompt only asks the model to connect
    /// them. Shares the same concurrency gate and failure semantics as
    /// [`Self::extract_kg`].
    pub async fn extract_relationships(&self, text: &str, entities: &[ExtractedEntity]) -> Vec<ExtractedRelationship> {
        if entities.is_empty() {
            return Vec::new();
        }

        let mut guard = self.gate.acquire().await;
        tracing::debug!(entities = entities.len(), "acquired extraction slot for relationship-only pass");

        let entity_texts: Vec<String> = entities.iter().map(|e| e.text.clone()).collect();
        let prompt = prompt::relationship_only_prompt(text, &entity_texts);

        let completion = self
            .llm
            .complete(
                &prompt,
                CompletionParams {
                    max_tokens: Some(self.config.max_tokens),
                    temperature: Some(self.config.temperature),
                    stop: None,
                    repetition_penalty: None,
                },
            )
            .await;

        let raw = match completion {
            Ok(raw) => raw,
            Err(err) => {
                tracing::warn!(error = %err, "relationship-only extraction call failed, returning no relationships");
                return Vec::new();
            }
        };

        let healed = json_stream_parser::heal(&raw);
        let raw_relationships = healed.get("relationships").and_then(|v| v.as_array()).cloned().unwrap_or_default();

        let mut rejections = RejectionCounts::default();
        let relationships = postprocess::postprocess_relationships(&raw_relationships, entities, self.config.min_relation_confidence, &mut rejections);

        guard.mark_succeeded();
        relationships
    }
}

pub fn default_retry_interval() -> Duration {
    Duration::from_secs(30)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn extract_kg_returns_empty_kg_when_llm_is_unreachable() {
        let llm = Arc::new(LlmClient::new("http://127.0.0.1:1", Duration::from_millis(200), Duration::from_secs(30)));
        let extractor = UnifiedExtractor::new(llm, 4, ExtractorConfig::default());
        let (entities, relationships) = extractor.extract_kg("Neo4j is a graph database.").await;
        assert!(entities.is_empty());
        assert!(relationships.is_empty());
        assert_eq!(extractor.gate().status().failed, 1);
    }

    #[tokio::test]
    async fn extract_relationships_short_circuits_on_empty_entity_list() {
        let llm = Arc::new(LlmClient::new("http://127.0.0.1:1", Duration::from_millis(200), Duration::from_secs(30)));
        let extractor = UnifiedExtractor::new(llm, 4, ExtractorConfig::default());
        let relationships = extractor.extract_relationships("text", &[]).await;
        assert!(relationships.is_empty());
        assert_eq!(extractor.gate().status().active, 0);
    }
}
