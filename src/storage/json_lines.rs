//! File-backed document store over JSON Lines dumps.
//!
//! The external fetcher writes each harvested collection as
//! `<root>/<collection>.jsonl`, one document per line. This store gives
//! those dumps the same cursor interface as a live document database, so a
//! full graph rebuild needs nothing but the files. A line that fails to
//! decode surfaces as a per-document error item in the stream; the
//! ingestion pass counts and skips it.

use std::path::PathBuf;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use tracing::debug;

use crate::data::errors::DocumentStoreError;
use crate::traits::document_store::{DocumentStore, DocumentStream};

/// Document store reading `<root>/<collection>.jsonl`.
#[derive(Debug, Clone)]
pub struct JsonLinesDocumentStore {
    root: PathBuf,
}

impl JsonLinesDocumentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn collection_path(&self, collection: &str) -> PathBuf {
        self.root.join(format!("{collection}.jsonl"))
    }
}

#[async_trait]
impl DocumentStore for JsonLinesDocumentStore {
    async fn stream_collection(
        &self,
        collection: &str,
        limit: Option<usize>,
    ) -> Result<DocumentStream<'static>, DocumentStoreError> {
        let path = self.collection_path(collection);
        let contents = tokio::fs::read_to_string(&path).await.map_err(|e| {
            DocumentStoreError::ConnectionError(format!(
                "failed to open {}: {}",
                path.display(),
                e
            ))
        })?;

        let mut items = Vec::new();
        for (line_no, line) in contents.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<serde_json::Value>(line) {
                Ok(document) => items.push(Ok(document)),
                Err(e) => items.push(Err(DocumentStoreError::DecodeError(format!(
                    "{} line {}: {}",
                    path.display(),
                    line_no + 1,
                    e
                )))),
            }
            if let Some(limit) = limit {
                if items.len() >= limit {
                    break;
                }
            }
        }
        debug!(
            collection,
            documents = items.len(),
            path = %path.display(),
            "opened collection dump"
        );
        Ok(stream::iter(items).boxed())
    }
}
