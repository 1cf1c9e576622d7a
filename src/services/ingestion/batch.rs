//! Write batching: accumulating node/edge mutations and submitting them in
//! bounded units.

use std::sync::Arc;

use tracing::{debug, error};

use crate::data::entities::{GraphEdge, GraphNode};
use crate::traits::graph_store::{GraphStore, GraphWritePatch};

/// An accumulating set of node/edge mutations. Filled by the upsert engine
/// and the edge materializer, drained by the coordinator on submission.
#[derive(Debug, Default)]
pub struct WriteBatch {
    nodes: Vec<GraphNode>,
    edges: Vec<GraphEdge>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue_node(&mut self, node: GraphNode) {
        self.nodes.push(node);
    }

    pub fn queue_edge(&mut self, edge: GraphEdge) {
        self.edges.push(edge);
    }

    pub fn len(&self) -> usize {
        self.nodes.len() + self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    /// Drains the batch into a patch, leaving it empty for reuse.
    pub fn take(&mut self) -> GraphWritePatch {
        GraphWritePatch {
            nodes: std::mem::take(&mut self.nodes),
            edges: std::mem::take(&mut self.edges),
        }
    }
}

/// Submits accumulated mutations to the graph store at a record-count
/// threshold and at cursor exhaustion.
///
/// A submission failure fails the batch's operations as a unit (there is
/// no partial-batch retry) and is counted; the pass then continues with a
/// fresh batch for subsequent records, since node/edge upserts are
/// re-derivable by re-running ingestion from the document store.
pub struct BatchCoordinator {
    store: Arc<dyn GraphStore>,
    batch_size: usize,
    batch: WriteBatch,
    records_since_submit: usize,
    submitted: usize,
    failed: usize,
}

impl BatchCoordinator {
    pub fn new(store: Arc<dyn GraphStore>, batch_size: usize) -> Self {
        Self {
            store,
            batch_size: batch_size.max(1),
            batch: WriteBatch::new(),
            records_since_submit: 0,
            submitted: 0,
            failed: 0,
        }
    }

    /// The batch currently being filled.
    pub fn batch_mut(&mut self) -> &mut WriteBatch {
        &mut self.batch
    }

    /// Marks one source record processed; submits the current batch when
    /// the threshold is reached.
    pub async fn record_processed(&mut self) {
        self.records_since_submit += 1;
        if self.records_since_submit >= self.batch_size {
            self.submit().await;
        }
    }

    /// Submits whatever remains after the cursor is exhausted.
    pub async fn finish(&mut self) {
        if self.records_since_submit > 0 || !self.batch.is_empty() {
            self.submit().await;
        }
    }

    /// Batches submitted so far, including failed ones.
    pub fn batches_submitted(&self) -> usize {
        self.submitted
    }

    /// Batches whose submission failed as a unit.
    pub fn batches_failed(&self) -> usize {
        self.failed
    }

    async fn submit(&mut self) {
        let patch = self.batch.take();
        let operations = patch.len();
        self.records_since_submit = 0;
        self.submitted += 1;
        match self.store.apply_batch(patch).await {
            Ok(()) => {
                debug!(operations, "write batch applied");
            }
            Err(e) => {
                self.failed += 1;
                error!(
                    operations,
                    error = %e,
                    "write batch failed as a unit; continuing with a fresh batch"
                );
            }
        }
    }
}
