//! fundgraph: document-to-graph upsert engine
//!
//! Converts heterogeneous, partially-populated business-entity documents
//! (companies, people, financial organizations) into a deduplicated labeled
//! property graph: one node per resolved identity, typed and classified
//! edges, bounded write batches. Ingestion is idempotent at the node level
//! under repeated and overlapping runs; the document store remains the
//! system of record and the graph is always re-derivable from it.

// Core modules
pub mod data;
pub mod services;
pub mod storage;
pub mod traits;

// Implementation adapters (optional, can be provided externally)
#[cfg(feature = "adapters")]
pub mod adapters;

// Testing utilities - make this available during testing
pub mod test_utils;

// Re-export key types for convenient usage
pub use data::entities::{
    CounterpartyRef, EdgeKind, GraphEdge, GraphNode, NodeRef, RoleKind, KEY_PROPERTY,
    STUB_PROPERTY, VISITED_PROPERTY,
};
pub use data::errors::{DocumentStoreError, GraphStoreError, IngestError};
pub use data::identity::{
    resolve_identity, IdentityKey, IdentitySource, IDENTITY_FIELD, PROFILE_URL_FIELD,
};
pub use data::types::{IngestionSummary, NodeLabel, PropertyMap, PropertyValue};

// Re-export core traits
pub use traits::{DocumentStore, DocumentStream, GraphStore, GraphWritePatch};

// Re-export core services
pub use services::{
    classify_role, normalize_record, GraphIngestionService, IngestOptions, IngestionConfig,
    NodeDisposition, WriteBatch,
};

// Re-export store implementations
pub use storage::{InMemoryDocumentStore, InMemoryGraphStore, JsonLinesDocumentStore};
#[cfg(feature = "adapters")]
pub use adapters::{Neo4jConfig, Neo4jGraphStore};

/// Initialize tracing for the ingestion engine
pub fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(true)
        .init();
}
