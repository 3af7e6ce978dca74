use thiserror::Error;

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("graph database error: {0}")]
    Driver(#[from] neo4rs::Error),
    #[error("relationship predicate {0:?} contains characters unsafe to use as a Cypher relationship type")]
    InvalidPredicate(String),
    #[error("expected a row from the graph database but got none")]
    MissingRow,
}
