//! Data model: scalar property types, graph entities, identity resolution,
//! and the error taxonomy.

pub mod entities;
pub mod errors;
pub mod identity;
pub mod types;

pub use entities::{
    CounterpartyRef, EdgeKind, GraphEdge, GraphNode, NodeRef, RoleKind, KEY_PROPERTY,
    STUB_PROPERTY, VISITED_PROPERTY,
};
pub use errors::{DocumentStoreError, GraphStoreError, IngestError};
pub use identity::{
    resolve_identity, IdentityKey, IdentitySource, IDENTITY_FIELD, PROFILE_URL_FIELD,
};
pub use types::{IngestionSummary, NodeLabel, PropertyMap, PropertyValue};
