//! Basic types for the document-to-graph engine

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A scalar graph property value. Graph node and edge properties are
/// restricted to scalars; embedded lists and sub-documents are consumed
/// during ingestion and never stored as properties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
}

impl PropertyValue {
    /// Converts a JSON value to a scalar property value, if it is one.
    /// Nulls, arrays and objects have no scalar representation and yield
    /// `None`; callers drop them.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Bool(b) => Some(PropertyValue::Bool(*b)),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Some(PropertyValue::Integer(i))
                } else {
                    n.as_f64().map(PropertyValue::Float)
                }
            }
            serde_json::Value::String(s) => Some(PropertyValue::String(s.clone())),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            PropertyValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropertyValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            PropertyValue::Bool(b) => serde_json::Value::Bool(*b),
            PropertyValue::Integer(i) => serde_json::json!(i),
            PropertyValue::Float(f) => serde_json::json!(f),
            PropertyValue::String(s) => serde_json::Value::String(s.clone()),
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        PropertyValue::String(s.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        PropertyValue::String(s)
    }
}

impl From<bool> for PropertyValue {
    fn from(b: bool) -> Self {
        PropertyValue::Bool(b)
    }
}

impl From<i64> for PropertyValue {
    fn from(i: i64) -> Self {
        PropertyValue::Integer(i)
    }
}

/// Flat mapping of field name to scalar value, suitable for storage as
/// node or edge properties.
pub type PropertyMap = HashMap<String, PropertyValue>;

/// Node labels of the materialized graph. A node identity is the pair
/// `(label, key)`: keys are unique within a label's namespace, not across
/// labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeLabel {
    Company,
    Person,
    Funder,
}

impl NodeLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeLabel::Company => "company",
            NodeLabel::Person => "person",
            NodeLabel::Funder => "funder",
        }
    }
}

impl fmt::Display for NodeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-pass ingestion accounting. Every skip is counted under its reason so
/// data quality can be audited from the summary alone.
#[derive(Debug, Clone, Serialize)]
pub struct IngestionSummary {
    pub collection: String,
    pub label: NodeLabel,
    pub records_processed: usize,
    /// Records skipped because they were malformed or (in a fan-out pass)
    /// carried no reproducible identity.
    pub records_skipped: usize,
    pub nodes_upserted: usize,
    /// Stub counterparty nodes queued for batched creation.
    pub stub_nodes_queued: usize,
    pub edges_created: usize,
    pub edges_skipped_unresolved: usize,
    pub edges_skipped_unclassified: usize,
    /// Tier-3 identity fallbacks: a generated key breaks cross-run
    /// idempotence for that record.
    pub generated_identities: usize,
    /// Text fields observed carrying U+FFFD replacement characters,
    /// evidence of lossy decoding upstream of the document store.
    pub encoding_artifacts: usize,
    pub batches_submitted: usize,
    pub batches_failed: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl IngestionSummary {
    pub fn new(collection: impl Into<String>, label: NodeLabel) -> Self {
        Self {
            collection: collection.into(),
            label,
            records_processed: 0,
            records_skipped: 0,
            nodes_upserted: 0,
            stub_nodes_queued: 0,
            edges_created: 0,
            edges_skipped_unresolved: 0,
            edges_skipped_unclassified: 0,
            generated_identities: 0,
            encoding_artifacts: 0,
            batches_submitted: 0,
            batches_failed: 0,
            started_at: Utc::now(),
            finished_at: None,
        }
    }
}
