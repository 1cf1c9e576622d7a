//! DocumentStore trait definition for the source document collaborator

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::data::errors::DocumentStoreError;

/// A cursor over one collection's documents, read sequentially. Item errors
/// carry per-document problems (e.g. a line that fails to decode); a
/// connectivity failure surfaces from `stream_collection` itself.
pub type DocumentStream<'a> = BoxStream<'a, Result<serde_json::Value, DocumentStoreError>>;

/// Interface to the document store holding harvested source documents.
/// Documents are schema-free mappings; the store is the system of record,
/// and graph state is always re-derivable by re-running ingestion over it.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Opens a cursor over a named collection, optionally bounded to the
    /// first `limit` documents.
    async fn stream_collection(
        &self,
        collection: &str,
        limit: Option<usize>,
    ) -> Result<DocumentStream<'static>, DocumentStoreError>;
}
