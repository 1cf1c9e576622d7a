//! Ingestion service: the document-to-graph upsert engine.
//!
//! One service instance owns handles to the two store collaborators and
//! exposes a single entry point per `(collection, label)` pair. A pass
//! iterates the collection cursor sequentially, upserting one node per
//! resolved identity and, when fan-out is enabled, materializing funding
//! and person-role edges from the embedded collections. Writes are grouped
//! into bounded batches; per-record problems are logged, counted, and
//! skipped, while store connectivity failures abort the pass.

use std::sync::Arc;

use chrono::Utc;
use futures::StreamExt;
use serde_json::{Map, Value};
use tracing::{debug, info, instrument, warn};

use crate::data::{
    entities::{
        CounterpartyRef, EdgeKind, GraphEdge, GraphNode, NodeRef, STUB_PROPERTY, VISITED_PROPERTY,
    },
    errors::IngestError,
    identity::resolve_identity,
    types::{IngestionSummary, NodeLabel, PropertyValue},
};
use crate::services::classify::classify_role;
use crate::services::ingestion::batch::{BatchCoordinator, WriteBatch};
use crate::services::normalize::normalize_record;
use crate::traits::{DocumentStore, GraphStore};

/// How an upserted node relates to the record it came from.
///
/// An authoritative record is the entity's own document: the node is
/// created (or upgraded) immediately with `visited=true, stub=false`. A
/// stub is a counterparty discovered through another record's embedded
/// reference: creation is deferred into the write batch with `stub=true,
/// visited=false`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeDisposition {
    Authoritative,
    Stub,
}

/// Tuning knobs for an ingestion pass.
#[derive(Debug, Clone)]
pub struct IngestionConfig {
    /// Record-count threshold at which the accumulated batch is submitted.
    pub batch_size: usize,
    /// Progress-log cadence in records. `None` picks a per-label default:
    /// person collections run far larger than the others, so they report
    /// more sparsely.
    pub progress_interval: Option<usize>,
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            batch_size: 100,
            progress_interval: None,
        }
    }
}

impl IngestionConfig {
    fn progress_cadence(&self, label: NodeLabel) -> usize {
        self.progress_interval.unwrap_or(match label {
            NodeLabel::Person => 2000,
            _ => 100,
        })
    }
}

/// Per-pass options.
#[derive(Debug, Clone, Default)]
pub struct IngestOptions {
    /// Bound on documents read from the collection; `None` streams it all.
    pub limit: Option<usize>,
    /// When set, embedded investments (all labels) and relationships
    /// (person label) fan out into edges.
    pub fan_out: bool,
}

/// Service converting source documents into deduplicated graph nodes and
/// classified edges.
pub struct GraphIngestionService {
    graph_store: Arc<dyn GraphStore>,
    document_store: Arc<dyn DocumentStore>,
    config: IngestionConfig,
}

impl GraphIngestionService {
    pub fn new(graph_store: Arc<dyn GraphStore>, document_store: Arc<dyn DocumentStore>) -> Self {
        Self::with_config(graph_store, document_store, IngestionConfig::default())
    }

    pub fn with_config(
        graph_store: Arc<dyn GraphStore>,
        document_store: Arc<dyn DocumentStore>,
        config: IngestionConfig,
    ) -> Self {
        Self {
            graph_store,
            document_store,
            config,
        }
    }

    /// Ingests every document of `collection` as a node of `label`,
    /// optionally fanning embedded investment/relationship records out into
    /// edges. Safe to re-run: repeated passes merge into existing nodes and
    /// never duplicate them.
    #[instrument(skip(self, options), fields(collection = collection, label = %label))]
    pub async fn ingest_collection(
        &self,
        collection: &str,
        label: NodeLabel,
        options: &IngestOptions,
    ) -> Result<IngestionSummary, IngestError> {
        let mut summary = IngestionSummary::new(collection, label);
        let mut coordinator =
            BatchCoordinator::new(Arc::clone(&self.graph_store), self.config.batch_size);
        let cadence = self.config.progress_cadence(label);

        let mut cursor = self
            .document_store
            .stream_collection(collection, options.limit)
            .await?;

        while let Some(item) = cursor.next().await {
            let document = match item {
                Ok(document) => document,
                Err(e) => {
                    // A per-document decode problem is a skip; anything
                    // else from the cursor is fatal to the pass.
                    if matches!(e, crate::data::errors::DocumentStoreError::DecodeError(_)) {
                        warn!(error = %e, "undecodable document; skipping");
                        summary.records_processed += 1;
                        summary.records_skipped += 1;
                        continue;
                    }
                    return Err(e.into());
                }
            };
            summary.records_processed += 1;

            match self
                .ingest_document(&document, label, options, &mut coordinator, &mut summary)
                .await
            {
                Ok(()) => {}
                Err(IngestError::InvalidRecord(reason)) => {
                    warn!(%reason, "skipping invalid record");
                    summary.records_skipped += 1;
                }
                Err(other) => return Err(other),
            }

            coordinator.record_processed().await;
            if summary.records_processed % cadence == 0 {
                info!(
                    records = summary.records_processed,
                    nodes = summary.nodes_upserted,
                    edges = summary.edges_created,
                    "ingestion progress"
                );
            }
        }

        coordinator.finish().await;
        summary.batches_submitted = coordinator.batches_submitted();
        summary.batches_failed = coordinator.batches_failed();
        summary.finished_at = Some(Utc::now());

        info!(
            records = summary.records_processed,
            skipped = summary.records_skipped,
            nodes = summary.nodes_upserted,
            stubs = summary.stub_nodes_queued,
            edges = summary.edges_created,
            edges_unresolved = summary.edges_skipped_unresolved,
            edges_unclassified = summary.edges_skipped_unclassified,
            generated_identities = summary.generated_identities,
            encoding_artifacts = summary.encoding_artifacts,
            batches = summary.batches_submitted,
            batches_failed = summary.batches_failed,
            "collection ingested"
        );
        Ok(summary)
    }

    async fn ingest_document(
        &self,
        document: &Value,
        label: NodeLabel,
        options: &IngestOptions,
        coordinator: &mut BatchCoordinator,
        summary: &mut IngestionSummary,
    ) -> Result<(), IngestError> {
        if options.fan_out {
            // Edges must anchor to a reproducible key; a record that would
            // need a generated identity cannot carry fan-out.
            let identity = resolve_identity(document)?;
            if identity.is_generated() {
                debug!("record has no reproducible identity; skipping fan-out");
                summary.records_skipped += 1;
                return Ok(());
            }
        }

        let source = self
            .upsert_node(
                label,
                document,
                NodeDisposition::Authoritative,
                coordinator.batch_mut(),
                summary,
            )
            .await?;

        if !options.fan_out {
            return Ok(());
        }

        if let Some(investments) = document.get("investments").and_then(Value::as_array) {
            for entry in investments {
                // Investment entries arrive wrapped as {"funding_round": ...};
                // bare round records are accepted too.
                let round = entry.get("funding_round").unwrap_or(entry);
                self.add_funding_edge(&source, round, coordinator.batch_mut(), summary)
                    .await?;
            }
        }

        if label == NodeLabel::Person {
            if let Some(relationships) = document.get("relationships").and_then(Value::as_array) {
                for relationship in relationships {
                    self.add_role_edge(&source, relationship, coordinator.batch_mut(), summary)
                        .await?;
                }
            }
        }

        Ok(())
    }

    /// Finds-or-creates the node for a record's resolved identity, merging
    /// normalized properties into an existing node (last-write-wins).
    ///
    /// Exactly one node per `(label, key)` persists after the call, however
    /// many times the identity has been seen. An authoritative upsert also
    /// upgrades the lifecycle flags (`visited=true, stub=false`), so a node
    /// first seen as a stub becomes authoritative once its own document is
    /// processed.
    pub async fn upsert_node(
        &self,
        label: NodeLabel,
        record: &Value,
        disposition: NodeDisposition,
        batch: &mut WriteBatch,
        summary: &mut IngestionSummary,
    ) -> Result<NodeRef, IngestError> {
        let map = record
            .as_object()
            .ok_or_else(|| IngestError::InvalidRecord("expected a JSON object".to_string()))?;
        let identity = resolve_identity(record)?;
        if identity.is_generated() {
            summary.generated_identities += 1;
        }

        let normalized = normalize_record(map);
        summary.encoding_artifacts += normalized.encoding_artifacts;
        let mut properties = normalized.properties;

        let existing = self.graph_store.find_node(label, identity.as_str()).await?;
        match existing {
            Some(node_ref) => {
                if disposition == NodeDisposition::Authoritative {
                    properties.insert(STUB_PROPERTY.to_string(), PropertyValue::Bool(false));
                    properties.insert(VISITED_PROPERTY.to_string(), PropertyValue::Bool(true));
                }
                self.graph_store
                    .merge_node_properties(&node_ref, properties)
                    .await?;
                summary.nodes_upserted += 1;
                Ok(node_ref)
            }
            None => match disposition {
                NodeDisposition::Authoritative => {
                    properties.insert(STUB_PROPERTY.to_string(), PropertyValue::Bool(false));
                    properties.insert(VISITED_PROPERTY.to_string(), PropertyValue::Bool(true));
                    let node_ref = self
                        .graph_store
                        .get_or_create_node(label, identity.as_str(), properties)
                        .await?;
                    summary.nodes_upserted += 1;
                    Ok(node_ref)
                }
                NodeDisposition::Stub => {
                    properties.insert(STUB_PROPERTY.to_string(), PropertyValue::Bool(true));
                    properties.insert(VISITED_PROPERTY.to_string(), PropertyValue::Bool(false));
                    let node_ref = NodeRef::new(label, identity.as_str());
                    batch.queue_node(GraphNode {
                        label,
                        key: identity.as_str().to_string(),
                        properties,
                    });
                    summary.stub_nodes_queued += 1;
                    Ok(node_ref)
                }
            },
        }
    }

    /// Resolves an embedded counterparty sub-record into a stub node. A
    /// sub-record that cannot resolve to an identity fails with
    /// `UnresolvedCounterparty`, which skips the specific edge, never the
    /// whole record.
    async fn resolve_counterparty(
        &self,
        label: NodeLabel,
        record: &Value,
        batch: &mut WriteBatch,
        summary: &mut IngestionSummary,
    ) -> Result<NodeRef, IngestError> {
        match self
            .upsert_node(label, record, NodeDisposition::Stub, batch, summary)
            .await
        {
            Ok(node_ref) => Ok(node_ref),
            Err(IngestError::InvalidRecord(reason)) => {
                Err(IngestError::UnresolvedCounterparty(reason))
            }
            Err(other) => Err(other),
        }
    }

    /// Materializes one `funded` edge from an embedded funding-round
    /// record: resolves the nested company sub-record into a stub node,
    /// derives `funded_date`, and queues funder→company with the remaining
    /// scalar properties. An unresolvable company skips the edge, never the
    /// record.
    async fn add_funding_edge(
        &self,
        funder: &NodeRef,
        round: &Value,
        batch: &mut WriteBatch,
        summary: &mut IngestionSummary,
    ) -> Result<(), IngestError> {
        let round_map = match round.as_object() {
            Some(map) => map,
            None => {
                warn!("funding-round record is not a mapping; skipping edge");
                summary.edges_skipped_unresolved += 1;
                return Ok(());
            }
        };
        let company = match round_map.get("company") {
            Some(company) => company,
            None => {
                debug!("funding round names no company; skipping edge");
                summary.edges_skipped_unresolved += 1;
                return Ok(());
            }
        };

        let target = match self
            .resolve_counterparty(NodeLabel::Company, company, batch, summary)
            .await
        {
            Ok(node_ref) => node_ref,
            Err(IngestError::UnresolvedCounterparty(reason)) => {
                warn!(%reason, "unresolvable funding counterparty; skipping edge");
                summary.edges_skipped_unresolved += 1;
                return Ok(());
            }
            Err(other) => return Err(other),
        };

        let normalized = normalize_record(round_map);
        summary.encoding_artifacts += normalized.encoding_artifacts;
        let mut properties = normalized.properties;
        // The date components collapse into one property; the nested
        // company sub-record was consumed to locate the target node and
        // never travels on the edge.
        if let Some(date) = derive_funded_date(round_map) {
            properties.insert("funded_date".to_string(), PropertyValue::String(date));
        }
        properties.remove("funded_month");
        properties.remove("funded_day");

        batch.queue_edge(GraphEdge {
            kind: EdgeKind::Funded,
            from: funder.clone(),
            to: target,
            properties,
        });
        summary.edges_created += 1;
        Ok(())
    }

    /// Materializes one person-role edge from an embedded relationship
    /// record: resolves the firm/person counterparty into a stub node,
    /// classifies the free-text title, and only when both succeed
    /// queues an edge of the classified kind carrying the remaining
    /// properties (including the original title for auditability).
    async fn add_role_edge(
        &self,
        source: &NodeRef,
        relationship: &Value,
        batch: &mut WriteBatch,
        summary: &mut IngestionSummary,
    ) -> Result<(), IngestError> {
        let rel_map = match relationship.as_object() {
            Some(map) => map,
            None => {
                warn!("relationship record is not a mapping; skipping edge");
                summary.edges_skipped_unresolved += 1;
                return Ok(());
            }
        };

        let counterparty = match CounterpartyRef::from_record(rel_map) {
            Some(counterparty) => counterparty,
            None => {
                debug!("relationship record names no counterparty; skipping edge");
                summary.edges_skipped_unresolved += 1;
                return Ok(());
            }
        };

        let target = {
            let mut counterparty_record = counterparty.record().clone();
            if matches!(counterparty, CounterpartyRef::Firm(_)) {
                // The firm sub-record carries an entity-type discriminator
                // that is noise on a company node.
                counterparty_record.remove("type_of_entity");
            }
            match self
                .resolve_counterparty(
                    counterparty.label(),
                    &Value::Object(counterparty_record),
                    batch,
                    summary,
                )
                .await
            {
                Ok(node_ref) => node_ref,
                Err(IngestError::UnresolvedCounterparty(reason)) => {
                    warn!(%reason, "unresolvable relationship counterparty; skipping edge");
                    summary.edges_skipped_unresolved += 1;
                    return Ok(());
                }
                Err(other) => return Err(other),
            }
        };

        let title = rel_map.get("title").and_then(Value::as_str).unwrap_or("");
        let role = match classify_role(title) {
            Some(role) => role,
            None => {
                debug!(title, "unclassified role title; skipping edge");
                summary.edges_skipped_unclassified += 1;
                return Ok(());
            }
        };

        let normalized = normalize_record(rel_map);
        summary.encoding_artifacts += normalized.encoding_artifacts;
        let mut properties = normalized.properties;
        properties.insert(
            "current".to_string(),
            PropertyValue::Bool(!is_truthy(rel_map.get("is_past"))),
        );

        batch.queue_edge(GraphEdge {
            kind: EdgeKind::Role(role),
            from: source.clone(),
            to: target,
            properties,
        });
        summary.edges_created += 1;
        Ok(())
    }
}

/// Derives the funding date as `"YYYY-M-D"` from the round's
/// year/month/day components. Deliberately not zero-padded: downstream
/// consumers of previously built graphs expect the bare form.
fn derive_funded_date(round: &Map<String, Value>) -> Option<String> {
    let year = round.get("funded_year")?.as_i64()?;
    let month = round.get("funded_month")?.as_i64()?;
    let day = round.get("funded_day")?.as_i64()?;
    Some(format!("{year}-{month}-{day}"))
}

/// The source `is_past` field is a loosely-typed truthy string; booleans
/// are accepted too. Anything else reads as false.
fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => s.eq_ignore_ascii_case("true"),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn funded_date_has_no_zero_padding() {
        let round = json!({
            "funded_year": 2012,
            "funded_month": 3,
            "funded_day": 1,
        });
        assert_eq!(
            derive_funded_date(round.as_object().unwrap()),
            Some("2012-3-1".to_string())
        );
    }

    #[test]
    fn funded_date_requires_all_components() {
        let round = json!({ "funded_year": 2012, "funded_month": 3 });
        assert_eq!(derive_funded_date(round.as_object().unwrap()), None);
    }

    #[test]
    fn is_past_strings_and_bools_are_truthy() {
        assert!(is_truthy(Some(&json!("true"))));
        assert!(is_truthy(Some(&json!("TRUE"))));
        assert!(is_truthy(Some(&json!(true))));
        assert!(!is_truthy(Some(&json!("false"))));
        assert!(!is_truthy(Some(&json!(1))));
        assert!(!is_truthy(None));
    }
}
