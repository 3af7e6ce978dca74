use serde::{Deserialize, Serialize};

/// One chunk as submitted in an `IngestRequest`: a contiguous character
/// range of the document's markdown, identified externally by
/// `vector_rowid`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkInput {
    pub vector_rowid: u64,
    pub chunk_index: u64,
    pub char_start: usize,
    pub char_end: usize,
    pub text: String,
}

impl ChunkInput {
    pub fn text_preview(&self) -> String {
        self.text.chars().take(200).collect()
    }

    pub fn len(&self) -> usize {
        self.char_end.saturating_sub(self.char_start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One place an entity (or relationship) appears: the chunk it was found
/// in, plus chunk-local character offsets.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChunkAppearance {
    pub vector_rowid: u64,
    pub chunk_index: u64,
    pub offset_start: usize,
    pub offset_end: usize,
}
