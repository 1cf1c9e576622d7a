//! Fakes and fixture builders for testing without external services.

use std::any::Any;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::data::{
    entities::{GraphEdge, NodeRef},
    errors::GraphStoreError,
    types::{NodeLabel, PropertyMap},
};
use crate::traits::graph_store::{GraphStore, GraphWritePatch};

/// Graph store wrapper that fails scripted batch submissions while
/// delegating everything else to the wrapped store. Lets tests exercise
/// the failed-as-a-unit batch contract without a real outage.
pub struct FlakyGraphStore {
    inner: Arc<dyn GraphStore>,
    fail_on_batches: Mutex<HashSet<usize>>,
    batch_calls: AtomicUsize,
}

impl FlakyGraphStore {
    /// `fail_on_batches` holds 1-based ordinals of `apply_batch` calls that
    /// should fail.
    pub fn new(inner: Arc<dyn GraphStore>, fail_on_batches: impl IntoIterator<Item = usize>) -> Self {
        Self {
            inner,
            fail_on_batches: Mutex::new(fail_on_batches.into_iter().collect()),
            batch_calls: AtomicUsize::new(0),
        }
    }

    /// Number of `apply_batch` calls seen, including failed ones.
    pub fn batch_calls(&self) -> usize {
        self.batch_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GraphStore for FlakyGraphStore {
    async fn find_node(
        &self,
        label: NodeLabel,
        key: &str,
    ) -> Result<Option<NodeRef>, GraphStoreError> {
        self.inner.find_node(label, key).await
    }

    async fn get_or_create_node(
        &self,
        label: NodeLabel,
        key: &str,
        properties: PropertyMap,
    ) -> Result<NodeRef, GraphStoreError> {
        self.inner.get_or_create_node(label, key, properties).await
    }

    async fn merge_node_properties(
        &self,
        node: &NodeRef,
        properties: PropertyMap,
    ) -> Result<(), GraphStoreError> {
        self.inner.merge_node_properties(node, properties).await
    }

    async fn create_edge(&self, edge: GraphEdge) -> Result<(), GraphStoreError> {
        self.inner.create_edge(edge).await
    }

    async fn apply_batch(&self, patch: GraphWritePatch) -> Result<(), GraphStoreError> {
        let call = self.batch_calls.fetch_add(1, Ordering::SeqCst) + 1;
        let should_fail = self.fail_on_batches.lock().unwrap().contains(&call);
        if should_fail {
            return Err(GraphStoreError::ConnectionError(format!(
                "injected failure on batch {}",
                call
            )));
        }
        self.inner.apply_batch(patch).await
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A funder document with the given investments embedded.
pub fn funder_document(key: &str, name: &str, investments: Vec<Value>) -> Value {
    json!({
        "_id": format!("doc-{key}"),
        "permalink": key,
        "name": name,
        "description": "Venture capital",
        "investments": investments,
    })
}

/// A wrapped funding-round record the way investment lists embed them.
pub fn investment(
    company_key: &str,
    company_name: &str,
    year: i64,
    month: i64,
    day: i64,
    round_code: &str,
    raised_amount: i64,
) -> Value {
    json!({
        "funding_round": {
            "company": { "permalink": company_key, "name": company_name },
            "funded_year": year,
            "funded_month": month,
            "funded_day": day,
            "round_code": round_code,
            "raised_amount": raised_amount,
            "raised_currency_code": "USD",
        }
    })
}

/// A person document with the given relationships embedded.
pub fn person_document(key: &str, first_name: &str, last_name: &str, relationships: Vec<Value>) -> Value {
    json!({
        "_id": format!("doc-{key}"),
        "permalink": key,
        "first_name": first_name,
        "last_name": last_name,
        "relationships": relationships,
    })
}

/// A firm relationship record (person works at / advises a company).
pub fn firm_relationship(firm_key: &str, firm_name: &str, title: &str, is_past: bool) -> Value {
    json!({
        "firm": {
            "permalink": firm_key,
            "name": firm_name,
            "type_of_entity": "company",
        },
        "title": title,
        "is_past": if is_past { "true" } else { "false" },
    })
}

/// A company document without embedded collections.
pub fn company_document(key: &str, name: &str) -> Value {
    json!({
        "_id": format!("doc-{key}"),
        "permalink": key,
        "name": name,
        "description": "A company",
        "founded_year": 2010,
    })
}
