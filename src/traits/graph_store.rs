//! GraphStore trait definition for graph database interaction

use std::any::Any;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::data::{
    entities::{GraphEdge, GraphNode, NodeRef},
    errors::GraphStoreError,
    types::{NodeLabel, PropertyMap},
};

/// A bounded set of node and edge mutations submitted together to the graph
/// store. A patch is atomic as a unit: implementations apply nodes before
/// edges so that edges queued alongside their stub endpoints resolve within
/// the same patch. A patch is not a transaction across patches.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphWritePatch {
    /// Nodes to create. Applying a node that already exists merges its
    /// non-lifecycle properties; the `stub`/`visited` flags are set on
    /// create only, so a queued stub can never downgrade a node that was
    /// upserted authoritatively in the meantime.
    pub nodes: Vec<GraphNode>,

    /// Edges to get-or-create by edge identity
    /// `(type, from, to, property map)`.
    pub edges: Vec<GraphEdge>,
}

impl GraphWritePatch {
    pub fn len(&self) -> usize {
        self.nodes.len() + self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }
}

/// Interface to the graph database collaborator.
///
/// This abstracts the underlying database technology; the engine depends
/// only on this repository-style interface and never on a process-wide
/// cache, so concurrent ingestion passes compose safely. Find-or-create by
/// `(label, key)` must be atomic per call on the implementation side to
/// prevent duplicate-node races between passes.
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Looks up a node by its `(label, key)` identity.
    async fn find_node(
        &self,
        label: NodeLabel,
        key: &str,
    ) -> Result<Option<NodeRef>, GraphStoreError>;

    /// Finds or creates a node by `(label, key)`, setting the initial
    /// properties only on create. The label is half of the node identity,
    /// so label application happens here. Implementations record the key
    /// under the `permalink` property.
    async fn get_or_create_node(
        &self,
        label: NodeLabel,
        key: &str,
        properties: PropertyMap,
    ) -> Result<NodeRef, GraphStoreError>;

    /// Merges properties onto an existing node. New values overwrite old on
    /// key collision (last-write-wins).
    async fn merge_node_properties(
        &self,
        node: &NodeRef,
        properties: PropertyMap,
    ) -> Result<(), GraphStoreError>;

    /// Gets or creates a typed edge between two node references, keyed by
    /// the edge identity `(type, from, to, property map)`.
    async fn create_edge(&self, edge: GraphEdge) -> Result<(), GraphStoreError>;

    /// Applies a write patch as a unit: nodes first, then edges. A failure
    /// fails the whole patch.
    async fn apply_batch(&self, patch: GraphWritePatch) -> Result<(), GraphStoreError>;

    /// Returns `self` as an `&dyn Any` for downcasting to concrete type.
    ///
    /// This lets test code reach implementation-specific inspection
    /// helpers when needed.
    fn as_any(&self) -> &dyn Any;
}
