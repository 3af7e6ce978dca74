pub mod chunk;
pub mod context;
pub mod entity;
pub mod hierarchical_type;
pub mod relationship;
pub mod request;
pub mod search;

pub use chunk::{ChunkAppearance, ChunkInput};
pub use context::{compute_context, ContextWindow};
pub use entity::ExtractedEntity;
pub use hierarchical_type::HierarchicalType;
pub use relationship::{normalize_predicate, ExtractedRelationship};
pub use request::{
    EntityRef, EntityResult, IngestRequest, IngestResponse, IngestSummary, RelationshipResult,
};
pub use search::{
    ChunkSearchRequest, EnhancedSearchRequest, EntitySearchRequest, ExpandEntitiesRequest,
};
