//! In-memory store implementations: the reference `GraphStore` used by
//! tests and local runs, and a seedable `DocumentStore`.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use tokio::sync::RwLock;

use crate::data::{
    entities::{GraphEdge, GraphNode, NodeRef, KEY_PROPERTY, STUB_PROPERTY, VISITED_PROPERTY},
    errors::{DocumentStoreError, GraphStoreError},
    types::{NodeLabel, PropertyMap, PropertyValue},
};
use crate::traits::document_store::{DocumentStore, DocumentStream};
use crate::traits::graph_store::{GraphStore, GraphWritePatch};

/// In-memory graph store. Nodes are keyed by `(label, key)`; edges
/// get-or-create on the full edge identity, so re-applying an unchanged
/// patch is a no-op.
#[derive(Debug, Default)]
pub struct InMemoryGraphStore {
    nodes: RwLock<HashMap<(NodeLabel, String), GraphNode>>,
    edges: RwLock<Vec<GraphEdge>>,
    batches: RwLock<Vec<usize>>,
}

impl InMemoryGraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn node_count(&self) -> usize {
        self.nodes.read().await.len()
    }

    pub async fn edge_count(&self) -> usize {
        self.edges.read().await.len()
    }

    pub async fn get_node(&self, label: NodeLabel, key: &str) -> Option<GraphNode> {
        self.nodes
            .read()
            .await
            .get(&(label, key.to_string()))
            .cloned()
    }

    pub async fn edges(&self) -> Vec<GraphEdge> {
        self.edges.read().await.clone()
    }

    /// Number of batches applied over the store's lifetime.
    pub async fn batches_applied(&self) -> usize {
        self.batches.read().await.len()
    }

    /// Clear all data in the store.
    pub async fn clear(&self) {
        self.nodes.write().await.clear();
        self.edges.write().await.clear();
        self.batches.write().await.clear();
    }

    fn ensure_key_property(key: &str, properties: &mut PropertyMap) {
        properties
            .entry(KEY_PROPERTY.to_string())
            .or_insert_with(|| PropertyValue::String(key.to_string()));
    }

    fn insert_edge_deduped(edges: &mut Vec<GraphEdge>, edge: GraphEdge) {
        // Edge identity = (type, from, to, property map).
        if !edges.contains(&edge) {
            edges.push(edge);
        }
    }
}

#[async_trait]
impl GraphStore for InMemoryGraphStore {
    async fn find_node(
        &self,
        label: NodeLabel,
        key: &str,
    ) -> Result<Option<NodeRef>, GraphStoreError> {
        let nodes = self.nodes.read().await;
        Ok(nodes
            .get(&(label, key.to_string()))
            .map(|node| node.node_ref()))
    }

    async fn get_or_create_node(
        &self,
        label: NodeLabel,
        key: &str,
        mut properties: PropertyMap,
    ) -> Result<NodeRef, GraphStoreError> {
        let mut nodes = self.nodes.write().await;
        let entry = nodes.entry((label, key.to_string())).or_insert_with(|| {
            Self::ensure_key_property(key, &mut properties);
            GraphNode {
                label,
                key: key.to_string(),
                properties: std::mem::take(&mut properties),
            }
        });
        Ok(entry.node_ref())
    }

    async fn merge_node_properties(
        &self,
        node: &NodeRef,
        properties: PropertyMap,
    ) -> Result<(), GraphStoreError> {
        let mut nodes = self.nodes.write().await;
        let existing = nodes
            .get_mut(&(node.label, node.key.clone()))
            .ok_or_else(|| {
                GraphStoreError::ConstraintViolation(format!("no such node: {}", node))
            })?;
        // Last-write-wins merge.
        existing.properties.extend(properties);
        Ok(())
    }

    async fn create_edge(&self, edge: GraphEdge) -> Result<(), GraphStoreError> {
        let mut edges = self.edges.write().await;
        Self::insert_edge_deduped(&mut edges, edge);
        Ok(())
    }

    async fn apply_batch(&self, patch: GraphWritePatch) -> Result<(), GraphStoreError> {
        let operations = patch.len();
        {
            // Nodes first, so edges queued alongside their stub endpoints
            // resolve within the same patch.
            let mut nodes = self.nodes.write().await;
            for mut node in patch.nodes {
                Self::ensure_key_property(&node.key, &mut node.properties);
                match nodes.get_mut(&(node.label, node.key.clone())) {
                    Some(existing) => {
                        // The lifecycle flags are create-only: a queued
                        // stub must not downgrade a node upserted
                        // authoritatively since it was queued.
                        node.properties.remove(STUB_PROPERTY);
                        node.properties.remove(VISITED_PROPERTY);
                        existing.properties.extend(node.properties);
                    }
                    None => {
                        nodes.insert((node.label, node.key.clone()), node);
                    }
                }
            }
        }
        {
            let mut edges = self.edges.write().await;
            for edge in patch.edges {
                Self::insert_edge_deduped(&mut edges, edge);
            }
        }
        self.batches.write().await.push(operations);
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Seedable in-memory document store for tests and examples. An unknown
/// collection streams as empty, which is what a cursor over a missing
/// collection does.
#[derive(Debug, Default)]
pub struct InMemoryDocumentStore {
    collections: Mutex<HashMap<String, Vec<serde_json::Value>>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, collection: &str, document: serde_json::Value) {
        let mut collections = self.collections.lock().unwrap();
        collections
            .entry(collection.to_string())
            .or_default()
            .push(document);
    }

    pub fn insert_many(
        &self,
        collection: &str,
        documents: impl IntoIterator<Item = serde_json::Value>,
    ) {
        let mut collections = self.collections.lock().unwrap();
        collections
            .entry(collection.to_string())
            .or_default()
            .extend(documents);
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn stream_collection(
        &self,
        collection: &str,
        limit: Option<usize>,
    ) -> Result<DocumentStream<'static>, DocumentStoreError> {
        let mut documents = {
            let collections = self.collections.lock().map_err(|_| {
                DocumentStoreError::ConnectionError("document store lock poisoned".to_string())
            })?;
            collections.get(collection).cloned().unwrap_or_default()
        };
        if let Some(limit) = limit {
            documents.truncate(limit);
        }
        Ok(stream::iter(documents.into_iter().map(Ok)).boxed())
    }
}
