//! Run driver: materializes harvested collection dumps as a Neo4j graph.
//!
//! Reads env configuration (a `.env` file is honored):
//! - `FUNDGRAPH_DATA_DIR`: directory of `<collection>.jsonl` dumps
//!   (default `./data`)
//! - `FUNDGRAPH_LIMIT`: optional per-collection document limit
//! - `FUNDGRAPH_FRESH`: set to `1` to clear the graph before ingesting
//! - `NEO4J_URI` / `NEO4J_USERNAME` / `NEO4J_PASSWORD` / `NEO4J_DATABASE`
//!
//! Runs a node pass per collection first, then a fan-out pass, the order
//! that lets relationship endpoints resolve against authoritative nodes.

use std::sync::Arc;

use anyhow::Context;
use dotenv::dotenv;

use fundgraph::{
    adapters::{Neo4jConfig, Neo4jGraphStore},
    storage::JsonLinesDocumentStore,
    GraphIngestionService, IngestOptions, NodeLabel,
};

const COLLECTIONS: &[(&str, NodeLabel)] = &[
    ("financial_organizations", NodeLabel::Funder),
    ("people", NodeLabel::Person),
    ("companies", NodeLabel::Company),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    fundgraph::init_tracing();

    let data_dir =
        std::env::var("FUNDGRAPH_DATA_DIR").unwrap_or_else(|_| "./data".to_string());
    let limit = std::env::var("FUNDGRAPH_LIMIT")
        .ok()
        .map(|v| v.parse::<usize>())
        .transpose()
        .context("FUNDGRAPH_LIMIT must be a number")?;
    let fresh = std::env::var("FUNDGRAPH_FRESH").map(|v| v == "1").unwrap_or(false);

    let config = Neo4jConfig::from_env().context("Neo4j configuration")?;
    let graph_store = Arc::new(
        Neo4jGraphStore::new(config)
            .await
            .context("connecting to Neo4j")?,
    );
    if fresh {
        println!("Clearing graph before ingestion");
        graph_store.clear().await.context("clearing graph")?;
    }

    let document_store = Arc::new(JsonLinesDocumentStore::new(&data_dir));
    let service = GraphIngestionService::new(graph_store, document_store);

    // Node passes: every entity gets its authoritative node first.
    for (collection, label) in COLLECTIONS {
        let summary = service
            .ingest_collection(collection, *label, &IngestOptions { limit, fan_out: false })
            .await
            .with_context(|| format!("node pass over {collection}"))?;
        println!(
            "{collection}: {} records, {} nodes ({} skipped)",
            summary.records_processed, summary.nodes_upserted, summary.records_skipped
        );
    }

    // Fan-out passes: funding rounds and person roles become edges.
    for (collection, label) in COLLECTIONS {
        let summary = service
            .ingest_collection(collection, *label, &IngestOptions { limit, fan_out: true })
            .await
            .with_context(|| format!("fan-out pass over {collection}"))?;
        println!(
            "{collection}: {} edges ({} unresolved, {} unclassified), {} batches ({} failed)",
            summary.edges_created,
            summary.edges_skipped_unresolved,
            summary.edges_skipped_unclassified,
            summary.batches_submitted,
            summary.batches_failed
        );
    }

    Ok(())
}
