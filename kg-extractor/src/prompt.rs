//! Prompt construction for the unified single-pass extractor (§4.3).

/// The closed relationship predicate vocabulary from §6, grouped by
/// category purely for prompt readability — any snake_case predicate the
/// model emits is still accepted (the vocabulary is open at the storage
/// layer).
const RELATIONSHIP_CATEGORIES: &[(&str, &[&str])] = &[
    (
        "technical",
        &[
            "uses",
            "implements",
            "extends",
            "depends_on",
            "requires",
            "provides",
            "supports",
            "integrates_with",
            "based_on",
            "built_with",
            "powered_by",
            "runs_on",
            "compatible_with",
        ],
    ),
    ("comparison", &["similar_to", "alternative_to", "competes_with", "outperforms"]),
    ("hierarchical", &["part_of", "contains", "belongs_to", "category_of"]),
    ("functional", &["processes", "generates", "validates", "transforms", "stores"]),
    ("development", &["maintained_by", "created_by", "contributed_by", "forked_from"]),
    ("documentation", &["documented_in", "references", "explains", "tutorials_for"]),
    ("configuration", &["configures", "deploys_with", "packaged_as"]),
    ("performance", &["benchmarked_against", "scales_with", "optimized_for"]),
];

fn relationship_vocabulary_block() -> String {
    RELATIONSHIP_CATEGORIES
        .iter()
        .map(|(category, predicates)| format!("- {category}: {}", predicates.join(", ")))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Builds the prompt for a single-pass entity+relationship extraction
/// call. Instructs the model to return exactly one bare JSON object with
/// no Markdown fencing or prose, per the prompt contract in §4.3.
pub fn unified_extraction_prompt(text: &str) -> String {
    format!(
        "Extract all named entities and the relationships between them from the \
document below.\n\n\
Return a single JSON object with this exact shape, and nothing else — no \
Markdown code fences, no explanation before or after:\n\
{{\"entities\": [{{\"text\": string, \"type\": string, \"confidence\": number, \
\"start\": number, \"end\": number}}], \"relationships\": [{{\"subject\": string, \
\"predicate\": string, \"object\": string, \"confidence\": number, \"context\": \
string}}]}}\n\n\
`type` is a hierarchical label joined by \"::\", most specific last, e.g. \
\"Framework::Backend::Python\" or \"Database::Graph\". `start`/`end` are \
character offsets of the entity's first mention into the document text \
below. `subject` and `object` must exactly match the `text` of an entity in \
the `entities` array.\n\n\
Use only these relationship predicates (snake_case), grouped here by \
category for reference:\n{}\n\n\
Document:\n{text}",
        relationship_vocabulary_block()
    )
}

/// Builds the prompt for the relationship-only pass that follows NER
/// extraction when the orchestrator is configured to use the NER path
/// (§4.7 step 2): entities are already known, so the model only has to
/// find relationships between the given names.
pub fn relationship_only_prompt(text: &str, entity_texts: &[String]) -> String {
    format!(
        "Given the document below and this list of already-identified entities, \
find the relationships between them.\n\n\
Entities: {}\n\n\
Return a single JSON object with this exact shape, and nothing else — no \
Markdown code fences, no explanation before or after:\n\
{{\"relationships\": [{{\"subject\": string, \"predicate\": string, \"object\": \
string, \"confidence\": number, \"context\": string}}]}}\n\n\
`subject` and `object` must exactly match one of the entities listed above. \
Use only these relationship predicates (snake_case), grouped here by \
category for reference:\n{}\n\n\
Document:\n{text}",
        entity_texts.join(", "),
        relationship_vocabulary_block()
    )
}
