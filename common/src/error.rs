use thiserror::Error;
use tokio::task::JoinError;

/// Internal error type threaded through every fallible operation via `?`.
///
/// The HTTP boundary (`api-router::error::ApiError`) maps each variant onto
/// the taxonomy in the error-handling design: `Neo4j`/`ServiceUnavailable`
/// become 503, `Validation` becomes 422, `UpstreamTimeout` and the rest
/// become 500. `ExtractionFailure` has no variant here because the unified
/// extractor swallows its own failures and returns an empty KG instead of
/// raising (see `kg-extractor`).
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Graph store error: {0}")]
    Neo4j(#[from] neo4rs::Error),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),
    #[error("Upstream timeout: {0}")]
    UpstreamTimeout(String),
    #[error("LLM parsing error: {0}")]
    LLMParsing(String),
    #[error("Task join error: {0}")]
    Join(#[from] JoinError),
    #[error("Chunk mapper error: {0}")]
    ChunkMapper(String),
    #[error("IoError: {0}")]
    Io(#[from] std::io::Error),
    #[error("Reqwest error: {0}")]
    Reqwest(#[from] reqwest::Error),
    #[error("Anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
    #[error("Processing error: {0}")]
    Processing(String),
    #[error("Internal service error: {0}")]
    InternalError(String),
}
