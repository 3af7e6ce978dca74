//! NER extractor client (C2): HTTP client against an external named-entity
//! recognition service, plus the pure chunking/offset-shift/dedup logic
//! that lets callers feed arbitrarily long documents through a model with
//! a short input-token limit.

use std::collections::{HashMap, HashSet};

use common::domain::{compute_context, ExtractedEntity, HierarchicalType};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const MAX_CHARS_BEFORE_CHUNKING: usize = 1500;
const CHUNK_MAX_CHARS: usize = 1000;
const DEFAULT_THRESHOLD: f32 = 0.4;

static TAXONOMY_YAML: &str = include_str!("../taxonomy/entities.yaml");

#[derive(Debug, Error)]
pub enum NerError {
    #[error("request to NER service failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("failed to load entity taxonomy: {0}")]
    Taxonomy(#[from] serde_yaml::Error),
}

#[derive(Deserialize)]
struct TaxonomyFile {
    entity_categories: HashMap<String, Vec<String>>,
}

/// The hierarchical entity-type vocabulary, loaded once at startup from a
/// bundled taxonomy file and shared (read-only, so no locking is needed)
/// across every extraction call.
pub struct Taxonomy {
    entity_types: Vec<String>,
}

impl Taxonomy {
    pub fn load_bundled() -> Result<Self, NerError> {
        Self::from_yaml(TAXONOMY_YAML)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, NerError> {
        let parsed: TaxonomyFile = serde_yaml::from_str(yaml)?;
        let mut entity_types: Vec<String> = parsed.entity_categories.into_values().flatten().collect();
        entity_types.sort();
        Ok(Self { entity_types })
    }

    pub fn entity_types(&self) -> &[String] {
        &self.entity_types
    }

    /// Entity-type labels under one top-level category, e.g. `"Framework"`.
    pub fn entity_types_in(&self, category: &str) -> Vec<&str> {
        let prefix = format!("{category}::");
        self.entity_types
            .iter()
            .filter(|label| label.starts_with(&prefix))
            .map(String::as_str)
            .collect()
    }

    /// Builds a nested tree keyed by each `::`-separated segment, with
    /// `_full_type` marking leaf nodes. Backs `/api/v1/model-info`.
    pub fn type_hierarchy_tree(&self) -> serde_json::Value {
        let mut tree = serde_json::Map::new();
        for entity_type in &self.entity_types {
            let parts: Vec<&str> = entity_type.split("::").collect();
            let mut current = &mut tree;
            for (i, part) in parts.iter().enumerate() {
                let entry = current
                    .entry((*part).to_string())
                    .or_insert_with(|| serde_json::Value::Object(serde_json::Map::new()));
                if i == parts.len() - 1 {
                    if let serde_json::Value::Object(obj) = entry {
                        obj.insert("_full_type".to_string(), serde_json::Value::String((*entity_type).clone()));
                    }
                }
                current = entry.as_object_mut().expect("entry is always an object");
            }
        }
        serde_json::Value::Object(tree)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct TextChunk {
    text: String,
    char_start: usize,
}

/// Splits `text` into segments of at most `CHUNK_MAX_CHARS` characters on
/// word boundaries, recording each segment's starting offset in `text` so
/// predictions can be shifted back into document coordinates.
fn chunk_text(text: &str) -> Vec<TextChunk> {
    let mut chunks = Vec::new();
    let mut current_words: Vec<&str> = Vec::new();
    let mut current_len = 0usize;
    let mut char_position = 0usize;

    for word in text.split_whitespace() {
        let word_len = word.chars().count() + 1;
        if current_len + word_len > CHUNK_MAX_CHARS && !current_words.is_empty() {
            let chunk_text = current_words.join(" ");
            let chunk_len = chunk_text.chars().count();
            chunks.push(TextChunk {
                text: chunk_text,
                char_start: char_position,
            });
            char_position += chunk_len + 1;
            current_words = vec![word];
            current_len = word_len;
        } else {
            current_words.push(word);
            current_len += word_len;
        }
    }

    if !current_words.is_empty() {
        chunks.push(TextChunk {
            text: current_words.join(" "),
            char_start: char_position,
        });
    }

    chunks
}

#[derive(Debug, Serialize)]
struct NerRequest<'a> {
    text: &'a str,
    labels: &'a [String],
    threshold: f32,
}

#[derive(Debug, Deserialize)]
struct NerSpan {
    text: String,
    label: String,
    start: usize,
    end: usize,
    score: f32,
}

#[derive(Debug, Deserialize)]
struct NerResponse {
    entities: Vec<NerSpan>,
}

pub struct NerClient {
    http: reqwest::Client,
    base_url: String,
    taxonomy: Taxonomy,
    default_threshold: f32,
}

impl NerClient {
    pub fn new(base_url: impl Into<String>, taxonomy: Taxonomy, default_threshold: Option<f32>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            taxonomy,
            default_threshold: default_threshold.unwrap_or(DEFAULT_THRESHOLD),
        }
    }

    pub fn taxonomy(&self) -> &Taxonomy {
        &self.taxonomy
    }

    async fn predict(&self, text: &str, threshold: f32) -> Result<Vec<NerSpan>, NerError> {
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }
        let body = NerRequest {
            text,
            labels: self.taxonomy.entity_types(),
            threshold,
        };
        let url = format!("{}/predict", self.base_url);
        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;
        let parsed: NerResponse = response.json().await?;
        Ok(parsed.entities)
    }

    /// Extracts entities from `text`, transparently chunking documents
    /// longer than [`MAX_CHARS_BEFORE_CHUNKING`] so the model's input-token
    /// limit is never exceeded, then deduplicating mentions that a chunk
    /// boundary might otherwise split into duplicates.
    pub async fn extract(&self, text: &str, threshold: Option<f32>) -> Result<Vec<ExtractedEntity>, NerError> {
        let threshold = threshold.unwrap_or(self.default_threshold);
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }

        let predictions = if text.chars().count() > MAX_CHARS_BEFORE_CHUNKING {
            let chunks = chunk_text(text);
            tracing::info!(chunk_count = chunks.len(), "splitting text for NER extraction");
            let mut all = Vec::new();
            for chunk in chunks {
                let mut spans = self.predict(&chunk.text, threshold).await?;
                for span in &mut spans {
                    span.start += chunk.char_start;
                    span.end += chunk.char_start;
                }
                all.extend(spans);
            }
            all
        } else {
            self.predict(text, threshold).await?
        };

        let mut seen: HashSet<(String, usize, usize)> = HashSet::new();
        let mut entities = Vec::with_capacity(predictions.len());

        for pred in predictions {
            let normalized = ExtractedEntity::normalize(&pred.text);
            let key = (normalized.clone(), pred.start, pred.end);
            if !seen.insert(key) {
                continue;
            }

            let context = compute_context(text, pred.start, pred.end);
            entities.push(ExtractedEntity {
                text: pred.text,
                normalized,
                entity_type: HierarchicalType::parse(&pred.label),
                confidence: pred.score,
                start: pred.start,
                end: pred.end,
                context_before: context.context_before,
                context_after: context.context_after,
                sentence: context.sentence,
            });
        }

        Ok(entities)
    }

    pub async fn health_check(&self) -> bool {
        let url = format!("{}/health", self.base_url);
        self.http
            .get(&url)
            .send()
            .await
            .is_ok_and(|response| response.status().is_success())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_taxonomy_loads_and_is_non_empty() {
        let taxonomy = Taxonomy::load_bundled().expect("bundled taxonomy parses");
        assert!(!taxonomy.entity_types().is_empty());
        assert!(taxonomy.entity_types().iter().all(|t| t.contains("::")));
    }

    #[test]
    fn entity_types_in_filters_by_top_level_category() {
        let taxonomy = Taxonomy::load_bundled().expect("bundled taxonomy parses");
        let framework_types = taxonomy.entity_types_in("Framework");
        assert!(!framework_types.is_empty());
        assert!(framework_types.iter().all(|t| t.starts_with("Framework::")));
    }

    #[test]
    fn type_hierarchy_tree_has_full_type_leaves() {
        let taxonomy = Taxonomy::load_bundled().expect("bundled taxonomy parses");
        let tree = taxonomy.type_hierarchy_tree();
        assert!(tree.is_object());
    }

    #[test]
    fn chunk_text_splits_long_text_on_word_boundaries_with_offsets() {
        let text = "word ".repeat(400);
        let chunks = chunk_text(&text);
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.text.chars().count() <= CHUNK_MAX_CHARS + 10);
        }
        assert_eq!(chunks[0].char_start, 0);
    }

    #[test]
    fn chunk_text_keeps_short_text_as_one_chunk() {
        let chunks = chunk_text("a short sentence");
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].char_start, 0);
    }
}
