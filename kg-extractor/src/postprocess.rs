//! Turns the healed JSON value from [`json_stream_parser::heal`] into the
//! shared [`ExtractedEntity`]/[`ExtractedRelationship`] records, applying
//! every validation and recovery rule in §4.3: confidence thresholds,
//! normalization, dedup, span recovery, and case-insensitive entity
//! resolution for relationships.

use std::collections::HashMap;

use common::domain::{compute_context, normalize_predicate, ExtractedEntity, ExtractedRelationship, HierarchicalType};
use serde_json::Value;

#[derive(Debug, Default, Clone, Copy)]
pub struct RejectionCounts {
    pub entities_missing_fields: usize,
    pub entities_below_confidence: usize,
    pub entities_duplicate: usize,
    pub relationships_missing_fields: usize,
    pub relationships_below_confidence: usize,
    pub relationships_unresolved: usize,
    pub relationships_self: usize,
}

/// Recovers the character span of `entity_text` in `document`: trusts the
/// model-provided `start`/`end` if they land on the expected substring,
/// otherwise falls back to the first substring match. Multiple
/// occurrences of the same text therefore collapse onto the first hit —
/// the known weakness recorded in §9's open questions.
fn recover_span(document: &str, entity_text: &str, claimed_start: Option<usize>, claimed_end: Option<usize>) -> Option<(usize, usize)> {
    let chars: Vec<char> = document.chars().collect();

    if let (Some(start), Some(end)) = (claimed_start, claimed_end) {
        if end > start && end <= chars.len() {
            let claimed: String = chars[start..end].iter().collect();
            if claimed.eq_ignore_ascii_case(entity_text.trim()) {
                return Some((start, end));
            }
        }
    }

    let lower_doc = document.to_lowercase();
    let lower_entity = entity_text.trim().to_lowercase();
    if lower_entity.is_empty() {
        return None;
    }
    let byte_pos = lower_doc.find(&lower_entity)?;
    let char_start = document[..byte_pos].chars().count();
    let char_end = char_start + lower_entity.chars().count();
    Some((char_start, char_end))
}

/// Entity post-processing (§4.3): validates required fields, drops below
/// `min_confidence`, lowercase-normalizes, dedupes by `normalized` keeping
/// the first occurrence, recovers the character span, and splits the
/// hierarchical type.
pub fn postprocess_entities(raw: &[Value], document: &str, min_confidence: f32, rejections: &mut RejectionCounts) -> Vec<ExtractedEntity> {
    let mut seen = std::collections::HashSet::new();
    let mut entities = Vec::new();

    for item in raw {
        let (Some(text), Some(type_label), Some(confidence)) = (
            item.get("text").and_then(Value::as_str),
            item.get("type").and_then(Value::as_str),
            item.get("confidence").and_then(Value::as_f64),
        ) else {
            rejections.entities_missing_fields += 1;
            continue;
        };

        let confidence = confidence as f32;
        if confidence < min_confidence {
            rejections.entities_below_confidence += 1;
            continue;
        }

        let normalized = ExtractedEntity::normalize(text);
        if !seen.insert(normalized.clone()) {
            rejections.entities_duplicate += 1;
            continue;
        }

        let claimed_start = item.get("start").and_then(Value::as_u64).map(|v| v as usize);
        let claimed_end = item.get("end").and_then(Value::as_u64).map(|v| v as usize);
        let Some((start, end)) = recover_span(document, text, claimed_start, claimed_end) else {
            rejections.entities_missing_fields += 1;
            continue;
        };

        let context = compute_context(document, start, end);
        entities.push(ExtractedEntity {
            text: text.to_string(),
            normalized,
            entity_type: HierarchicalType::parse(type_label),
            confidence,
            start,
            end,
            context_before: context.context_before,
            context_after: context.context_after,
            sentence: context.sentence,
        });
    }

    entities
}

/// Relationship post-processing (§4.3): builds a case-insensitive lookup
/// from every entity's `text` and `normalized`, validates required
/// fields, drops below `min_confidence`, resolves subject/object, drops
/// self-relationships, and normalizes the predicate.
pub fn postprocess_relationships(raw: &[Value], entities: &[ExtractedEntity], min_confidence: f32, rejections: &mut RejectionCounts) -> Vec<ExtractedRelationship> {
    let mut lookup: HashMap<String, &ExtractedEntity> = HashMap::new();
    for entity in entities {
        lookup.insert(entity.text.to_lowercase(), entity);
        lookup.insert(entity.normalized.to_lowercase(), entity);
    }

    let mut relationships = Vec::new();

    for item in raw {
        let (Some(subject), Some(predicate), Some(object), Some(confidence)) = (
            item.get("subject").and_then(Value::as_str),
            item.get("predicate").and_then(Value::as_str),
            item.get("object").and_then(Value::as_str),
            item.get("confidence").and_then(Value::as_f64),
        ) else {
            rejections.relationships_missing_fields += 1;
            continue;
        };

        let confidence = confidence as f32;
        if confidence < min_confidence {
            rejections.relationships_below_confidence += 1;
            continue;
        }

        let Some(subject_entity) = lookup.get(&subject.to_lowercase()) else {
            rejections.relationships_unresolved += 1;
            continue;
        };
        let Some(object_entity) = lookup.get(&object.to_lowercase()) else {
            rejections.relationships_unresolved += 1;
            continue;
        };

        if subject_entity.normalized == object_entity.normalized {
            rejections.relationships_self += 1;
            continue;
        }

        let context = item.get("context").and_then(Value::as_str).unwrap_or_default();

        relationships.push(ExtractedRelationship {
            subject_text: subject_entity.text.clone(),
            subject_normalized: subject_entity.normalized.clone(),
            subject_type: subject_entity.entity_type.clone(),
            predicate: normalize_predicate(predicate),
            object_text: object_entity.text.clone(),
            object_normalized: object_entity.normalized.clone(),
            object_type: object_entity.entity_type.clone(),
            confidence,
            context: context.to_string(),
        });
    }

    if rejections.entities_missing_fields
        + rejections.entities_below_confidence
        + rejections.relationships_missing_fields
        + rejections.relationships_below_confidence
        + rejections.relationships_unresolved
        + rejections.relationships_self
        > 0
    {
        tracing::debug!(?rejections, "unified extractor rejected some raw records");
    }

    relationships
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drops_entity_below_confidence_threshold() {
        let raw = vec![serde_json::json!({"text": "Neo4j", "type": "Database::Graph", "confidence": 0.2, "start": 0, "end": 5})];
        let mut rejections = RejectionCounts::default();
        let entities = postprocess_entities(&raw, "Neo4j stores graphs.", 0.45, &mut rejections);
        assert!(entities.is_empty());
        assert_eq!(rejections.entities_below_confidence, 1);
    }

    #[test]
    fn recovers_span_by_substring_when_claimed_offsets_are_wrong() {
        let raw = vec![serde_json::json!({"text": "Neo4j", "type": "Database::Graph", "confidence": 0.9, "start": 99, "end": 104})];
        let mut rejections = RejectionCounts::default();
        let entities = postprocess_entities(&raw, "Intro. Neo4j stores graphs.", 0.45, &mut rejections);
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].start, "Intro. ".len());
    }

    #[test]
    fn dedupes_entities_by_normalized_keeping_first() {
        let raw = vec![
            serde_json::json!({"text": "Neo4j", "type": "Database::Graph", "confidence": 0.9, "start": 0, "end": 5}),
            serde_json::json!({"text": "neo4j", "type": "Database::Graph", "confidence": 0.5, "start": 0, "end": 5}),
        ];
        let mut rejections = RejectionCounts::default();
        let entities = postprocess_entities(&raw, "Neo4j stores graphs.", 0.1, &mut rejections);
        assert_eq!(entities.len(), 1);
        assert_eq!(rejections.entities_duplicate, 1);
    }

    fn sample_entities() -> Vec<ExtractedEntity> {
        let mut rejections = RejectionCounts::default();
        postprocess_entities(
            &[
                serde_json::json!({"text": "Neo4j", "type": "Database::Graph", "confidence": 0.9, "start": 0, "end": 5}),
                serde_json::json!({"text": "Python", "type": "Language::Programming::Python", "confidence": 0.9, "start": 20, "end": 26}),
            ],
            "Neo4j is queried from Python scripts.",
            0.1,
            &mut rejections,
        )
    }

    #[test]
    fn resolves_relationship_case_insensitively_and_normalizes_predicate() {
        let entities = sample_entities();
        let raw = vec![serde_json::json!({"subject": "neo4j", "predicate": "Queried From", "object": "PYTHON", "confidence": 0.8, "context": "ctx"})];
        let mut rejections = RejectionCounts::default();
        let relationships = postprocess_relationships(&raw, &entities, 0.45, &mut rejections);
        assert_eq!(relationships.len(), 1);
        assert_eq!(relationships[0].predicate, "queried_from");
        assert_eq!(relationships[0].subject_normalized, "neo4j");
    }

    #[test]
    fn drops_self_relationship() {
        let entities = sample_entities();
        let raw = vec![serde_json::json!({"subject": "Neo4j", "predicate": "uses", "object": "Neo4j", "confidence": 0.8, "context": ""})];
        let mut rejections = RejectionCounts::default();
        let relationships = postprocess_relationships(&raw, &entities, 0.1, &mut rejections);
        assert!(relationships.is_empty());
        assert_eq!(rejections.relationships_self, 1);
    }

    #[test]
    fn drops_relationship_with_unresolvable_object() {
        let entities = sample_entities();
        let raw = vec![serde_json::json!({"subject": "Neo4j", "predicate": "uses", "object": "Rust", "confidence": 0.8, "context": ""})];
        let mut rejections = RejectionCounts::default();
        let relationships = postprocess_relationships(&raw, &entities, 0.1, &mut rejections);
        assert!(relationships.is_empty());
        assert_eq!(rejections.relationships_unresolved, 1);
    }
}
