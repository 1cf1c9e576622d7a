//! Error types for the document-to-graph engine

use thiserror::Error;

/// Base error type for ingestion operations.
///
/// Malformed records and unresolved counterparties are local and
/// recoverable: the pass skips the offending record or edge and continues.
/// Store failures are fatal to the current operation and surfaced without
/// local retry (retries belong to the store clients).
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    #[error("Unresolved counterparty: {0}")]
    UnresolvedCounterparty(String),

    #[error("Graph store error: {0}")]
    GraphStore(#[from] GraphStoreError),

    #[error("Document store error: {0}")]
    DocumentStore(#[from] DocumentStoreError),
}

/// Specific error type for the graph store collaborator.
#[derive(Error, Debug)]
pub enum GraphStoreError {
    #[error("Graph database connection error: {0}")]
    ConnectionError(String),
    #[error("Graph query execution error: {0}")]
    QueryError(String),
    #[error("Data mapping error from graph result: {0}")]
    MappingError(String),
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),
    #[error("Unknown graph store error: {0}")]
    Unknown(String),
}

/// Convert a String into a GraphStoreError::Unknown
impl From<String> for GraphStoreError {
    fn from(error: String) -> Self {
        GraphStoreError::Unknown(error)
    }
}

/// Specific error type for the document store collaborator.
#[derive(Error, Debug)]
pub enum DocumentStoreError {
    #[error("Document store connection error: {0}")]
    ConnectionError(String),
    #[error("Document cursor error: {0}")]
    CursorError(String),
    #[error("Document decode error: {0}")]
    DecodeError(String),
}
