//! Graph-bound entities: nodes, edges, and the counterparty variant
//! resolved from embedded relationship records.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::data::types::{NodeLabel, PropertyMap, PropertyValue};

/// Node property holding the identity key, so external tools can join on it.
pub const KEY_PROPERTY: &str = "permalink";
/// Node property marking a node created only as a relationship endpoint.
pub const STUB_PROPERTY: &str = "stub";
/// Node property marking a node populated from its own authoritative
/// document.
pub const VISITED_PROPERTY: &str = "visited";

/// A lightweight reference to a node: its identity `(label, key)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeRef {
    pub label: NodeLabel,
    pub key: String,
}

impl NodeRef {
    pub fn new(label: NodeLabel, key: impl Into<String>) -> Self {
        Self {
            label,
            key: key.into(),
        }
    }
}

impl fmt::Display for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.label, self.key)
    }
}

/// A labeled node with its scalar properties. The `stub`/`visited`
/// lifecycle flags live in the property map like any other property; the
/// accessors below read them out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub label: NodeLabel,
    pub key: String,
    pub properties: PropertyMap,
}

impl GraphNode {
    pub fn node_ref(&self) -> NodeRef {
        NodeRef::new(self.label, self.key.clone())
    }

    /// True if the node was created only as a relationship endpoint,
    /// without its own full document.
    pub fn is_stub(&self) -> bool {
        self.properties
            .get(STUB_PROPERTY)
            .and_then(PropertyValue::as_bool)
            .unwrap_or(false)
    }

    /// True once the node has been populated from its own authoritative
    /// document.
    pub fn is_visited(&self) -> bool {
        self.properties
            .get(VISITED_PROPERTY)
            .and_then(PropertyValue::as_bool)
            .unwrap_or(false)
    }
}

/// Relationship kinds a free-text role title classifies into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoleKind {
    Founder,
    Ceo,
    Vp,
    Adviser,
}

impl RoleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoleKind::Founder => "Founder",
            RoleKind::Ceo => "CEO",
            RoleKind::Vp => "VP",
            RoleKind::Adviser => "Adviser",
        }
    }
}

impl fmt::Display for RoleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Edge types of the materialized graph: investment edges plus the
/// classified person-role kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EdgeKind {
    Funded,
    Role(RoleKind),
}

impl EdgeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeKind::Funded => "funded",
            EdgeKind::Role(role) => role.as_str(),
        }
    }
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed edge between exactly two nodes, with edge-scoped scalar
/// properties. Consumed sub-records (`company`, `firm`, `person`) are never
/// present in `properties`; they are resolved into the `to` endpoint and
/// dropped before the edge is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub kind: EdgeKind,
    pub from: NodeRef,
    pub to: NodeRef,
    pub properties: PropertyMap,
}

/// The counterparty named by an embedded relationship record, resolved once
/// at the record boundary. A record is a firm relationship or a person
/// relationship depending on which sub-record it embeds; downstream code
/// dispatches on this variant instead of re-sniffing the record shape.
#[derive(Debug, Clone, Copy)]
pub enum CounterpartyRef<'a> {
    Firm(&'a Map<String, Value>),
    Person(&'a Map<String, Value>),
}

impl<'a> CounterpartyRef<'a> {
    /// Reads the counterparty out of a relationship record. `None` when the
    /// record embeds neither a `firm` nor a `person` sub-record.
    pub fn from_record(record: &'a Map<String, Value>) -> Option<Self> {
        if let Some(firm) = record.get("firm").and_then(Value::as_object) {
            return Some(CounterpartyRef::Firm(firm));
        }
        if let Some(person) = record.get("person").and_then(Value::as_object) {
            return Some(CounterpartyRef::Person(person));
        }
        None
    }

    /// The node label the counterparty resolves under.
    pub fn label(&self) -> NodeLabel {
        match self {
            CounterpartyRef::Firm(_) => NodeLabel::Company,
            CounterpartyRef::Person(_) => NodeLabel::Person,
        }
    }

    pub fn record(&self) -> &'a Map<String, Value> {
        match self {
            CounterpartyRef::Firm(record) | CounterpartyRef::Person(record) => record,
        }
    }
}
