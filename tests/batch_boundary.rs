//! Batch coordinator behavior across a full ingestion pass: thresholds,
//! final flush, and failure isolation.

use std::sync::Arc;

use fundgraph::{
    test_utils::{funder_document, investment, FlakyGraphStore},
    GraphIngestionService, IngestOptions, IngestionConfig, InMemoryDocumentStore,
    InMemoryGraphStore, NodeLabel,
};

fn seed_funders(documents: &InMemoryDocumentStore, count: usize) {
    documents.insert_many(
        "financial_organizations",
        (0..count).map(|i| {
            funder_document(
                &format!("funder-{i}"),
                &format!("Funder {i}"),
                vec![investment(
                    &format!("company-{i}"),
                    &format!("Company {i}"),
                    2012,
                    3,
                    1,
                    "a",
                    1_000_000,
                )],
            )
        }),
    );
}

#[tokio::test]
async fn two_hundred_fifty_records_make_three_batches() {
    let graph = Arc::new(InMemoryGraphStore::new());
    let documents = Arc::new(InMemoryDocumentStore::new());
    seed_funders(&documents, 250);

    let service = GraphIngestionService::with_config(
        graph.clone(),
        documents.clone(),
        IngestionConfig {
            batch_size: 100,
            progress_interval: Some(100),
        },
    );

    let summary = service
        .ingest_collection(
            "financial_organizations",
            NodeLabel::Funder,
            &IngestOptions {
                limit: None,
                fan_out: true,
            },
        )
        .await
        .unwrap();

    // 100 + 100 + 50.
    assert_eq!(summary.batches_submitted, 3);
    assert_eq!(summary.batches_failed, 0);
    assert_eq!(graph.batches_applied().await, 3);
    assert_eq!(summary.edges_created, 250);
    assert_eq!(graph.edge_count().await, 250);
    // 250 authoritative funders + 250 stub companies.
    assert_eq!(graph.node_count().await, 500);
}

#[tokio::test]
async fn a_failed_batch_does_not_stop_later_batches() {
    let inner = Arc::new(InMemoryGraphStore::new());
    let flaky = Arc::new(FlakyGraphStore::new(inner.clone(), [2]));
    let documents = Arc::new(InMemoryDocumentStore::new());
    seed_funders(&documents, 250);

    let service = GraphIngestionService::with_config(
        flaky.clone(),
        documents.clone(),
        IngestionConfig {
            batch_size: 100,
            progress_interval: Some(100),
        },
    );

    let summary = service
        .ingest_collection(
            "financial_organizations",
            NodeLabel::Funder,
            &IngestOptions {
                limit: None,
                fan_out: true,
            },
        )
        .await
        .unwrap();

    // All three submissions were attempted; the second failed as a unit.
    assert_eq!(flaky.batch_calls(), 3);
    assert_eq!(summary.batches_submitted, 3);
    assert_eq!(summary.batches_failed, 1);

    // The first and third batches landed; the second's hundred edges and
    // stubs are gone as a unit (re-derivable by re-running the pass).
    assert_eq!(inner.batches_applied().await, 2);
    assert_eq!(inner.edge_count().await, 150);
}

#[tokio::test]
async fn limit_bounds_the_pass() {
    let graph = Arc::new(InMemoryGraphStore::new());
    let documents = Arc::new(InMemoryDocumentStore::new());
    seed_funders(&documents, 50);

    let service = GraphIngestionService::new(graph.clone(), documents.clone());
    let summary = service
        .ingest_collection(
            "financial_organizations",
            NodeLabel::Funder,
            &IngestOptions {
                limit: Some(10),
                fan_out: false,
            },
        )
        .await
        .unwrap();

    assert_eq!(summary.records_processed, 10);
    assert_eq!(graph.node_count().await, 10);
}
