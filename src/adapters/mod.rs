//! Adapter implementations for external store services.

pub mod neo4j_store;

pub use neo4j_store::{Neo4jConfig, Neo4jGraphStore};
