//! Graph store adapter (C5) and schema manager (C6): idempotent Neo4j
//! persistence behind the [`GraphStore`] trait, plus constraint/index
//! management and a [`FakeGraphStore`] test double.

mod client;
mod error;
mod fake;
mod model;
mod schema;
mod store;

pub use client::GraphClient;
pub use error::GraphError;
pub use fake::FakeGraphStore;
pub use model::{
    ChunkSearchResult, CoOccurringEntity, DocumentStats, EnhancedSearchTraversal, EntityInput,
    EntitySearchResult, ExpansionChunkRow, ResolvedChunkRow,
};
pub use schema::{SchemaInitResult, SchemaManager, SchemaValidation};
pub use store::{EntityLookup, GraphStore};
