use crate::domain::IngestRequest;

/// Reasons an `IngestRequest` fails validation before any extraction or
/// graph-store work begins. Every variant maps to HTTP 422 at the API
/// boundary; none of these ever touch the graph or the LLM.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestValidationError {
    InvalidField(String),
}

impl std::fmt::Display for IngestValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidField(msg) => write!(f, "{msg}"),
        }
    }
}

const MARKDOWN_MIN: usize = 50;
const MARKDOWN_MAX: usize = 1_000_000;
const URL_MAX: usize = 2048;
const TITLE_MAX: usize = 500;
const CHUNKS_MIN: usize = 1;
const CHUNKS_MAX: usize = 1000;
const CHUNK_TEXT_MIN: usize = 10;
const CHUNK_TEXT_MAX: usize = 10_000;

/// Validates an `IngestRequest` against every constraint in the external
/// interfaces contract: field bounds, URL scheme, and the strictly
/// increasing/non-overlapping chunk-ordering invariant from the data model.
pub fn validate_ingest_request(request: &IngestRequest) -> Result<(), IngestValidationError> {
    if request.content_id == 0 {
        return Err(IngestValidationError::InvalidField(
            "content_id must be greater than 0".to_string(),
        ));
    }

    if request.url.len() > URL_MAX
        || !(request.url.starts_with("http://") || request.url.starts_with("https://"))
    {
        return Err(IngestValidationError::InvalidField(format!(
            "url must be an http(s) URL of at most {URL_MAX} characters"
        )));
    }

    if request.title.len() > TITLE_MAX {
        return Err(IngestValidationError::InvalidField(format!(
            "title must be at most {TITLE_MAX} characters"
        )));
    }

    if request.markdown.len() < MARKDOWN_MIN || request.markdown.len() > MARKDOWN_MAX {
        return Err(IngestValidationError::InvalidField(format!(
            "markdown must be between {MARKDOWN_MIN} and {MARKDOWN_MAX} characters"
        )));
    }

    if request.chunks.len() < CHUNKS_MIN || request.chunks.len() > CHUNKS_MAX {
        return Err(IngestValidationError::InvalidField(format!(
            "chunks must contain between {CHUNKS_MIN} and {CHUNKS_MAX} items"
        )));
    }

    let mut previous_index: Option<u64> = None;
    for chunk in &request.chunks {
        if chunk.text.len() < CHUNK_TEXT_MIN || chunk.text.len() > CHUNK_TEXT_MAX {
            return Err(IngestValidationError::InvalidField(format!(
                "chunk text must be between {CHUNK_TEXT_MIN} and {CHUNK_TEXT_MAX} characters"
            )));
        }

        if chunk.char_end <= chunk.char_start {
            return Err(IngestValidationError::InvalidField(
                "chunk char_end must be greater than char_start".to_string(),
            ));
        }

        if let Some(previous) = previous_index {
            if chunk.chunk_index <= previous {
                return Err(IngestValidationError::InvalidField(
                    "chunk_index must be strictly increasing across chunks".to_string(),
                ));
            }
        }
        previous_index = Some(chunk.chunk_index);
    }

    Ok(())
}
