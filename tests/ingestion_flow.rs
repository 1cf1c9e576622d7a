//! End-to-end ingestion tests over the in-memory stores.

use std::sync::Arc;

use pretty_assertions::assert_eq;
use serde_json::json;

use fundgraph::{
    test_utils::{company_document, firm_relationship, funder_document, investment, person_document},
    EdgeKind, GraphIngestionService, IngestOptions, InMemoryDocumentStore, InMemoryGraphStore,
    NodeLabel, PropertyValue, RoleKind,
};

fn service_over(
    graph: &Arc<InMemoryGraphStore>,
    documents: &Arc<InMemoryDocumentStore>,
) -> GraphIngestionService {
    GraphIngestionService::new(graph.clone(), documents.clone())
}

fn node_pass() -> IngestOptions {
    IngestOptions {
        limit: None,
        fan_out: false,
    }
}

fn fan_out_pass() -> IngestOptions {
    IngestOptions {
        limit: None,
        fan_out: true,
    }
}

#[test_log::test(tokio::test)]
async fn ingesting_the_same_document_twice_yields_one_node() {
    let graph = Arc::new(InMemoryGraphStore::new());
    let documents = Arc::new(InMemoryDocumentStore::new());
    documents.insert("companies", company_document("acme-corp", "Acme"));
    let service = service_over(&graph, &documents);

    service
        .ingest_collection("companies", NodeLabel::Company, &node_pass())
        .await
        .unwrap();
    service
        .ingest_collection("companies", NodeLabel::Company, &node_pass())
        .await
        .unwrap();

    assert_eq!(graph.node_count().await, 1);
    let node = graph
        .get_node(NodeLabel::Company, "acme-corp")
        .await
        .expect("node exists");
    assert_eq!(node.properties.get("name").unwrap().as_str(), Some("Acme"));
    assert!(node.is_visited());
    assert!(!node.is_stub());
}

#[test_log::test(tokio::test)]
async fn two_funders_into_one_company_make_one_node_and_two_edges() {
    let graph = Arc::new(InMemoryGraphStore::new());
    let documents = Arc::new(InMemoryDocumentStore::new());
    documents.insert_many(
        "financial_organizations",
        [
            funder_document(
                "sequoia",
                "Sequoia",
                vec![investment("acme-corp", "Acme", 2012, 3, 1, "a", 5_000_000)],
            ),
            funder_document(
                "kleiner",
                "Kleiner",
                vec![investment("acme-corp", "Acme", 2013, 6, 15, "b", 9_000_000)],
            ),
        ],
    );
    let service = service_over(&graph, &documents);

    let summary = service
        .ingest_collection("financial_organizations", NodeLabel::Funder, &fan_out_pass())
        .await
        .unwrap();

    assert_eq!(summary.edges_created, 2);
    // One company node despite two independent references.
    assert!(graph.get_node(NodeLabel::Company, "acme-corp").await.is_some());
    assert_eq!(graph.node_count().await, 3);

    let edges = graph.edges().await;
    assert_eq!(edges.len(), 2);
    let from_keys: Vec<&str> = edges.iter().map(|e| e.from.key.as_str()).collect();
    assert!(from_keys.contains(&"sequoia"));
    assert!(from_keys.contains(&"kleiner"));
    for edge in &edges {
        assert_eq!(edge.kind, EdgeKind::Funded);
        assert_eq!(edge.to.key, "acme-corp");
        // The company sub-record never travels on the edge.
        assert!(!edge.properties.contains_key("company"));
        assert!(!edge.properties.contains_key("funded_month"));
        assert!(!edge.properties.contains_key("funded_day"));
        assert!(edge.properties.contains_key("funded_year"));
    }
    let sequoia_edge = edges.iter().find(|e| e.from.key == "sequoia").unwrap();
    assert_eq!(
        sequoia_edge.properties.get("funded_date").unwrap().as_str(),
        Some("2012-3-1")
    );
}

#[test_log::test(tokio::test)]
async fn funding_counterparty_starts_as_stub_and_upgrades_on_its_own_document() {
    let graph = Arc::new(InMemoryGraphStore::new());
    let documents = Arc::new(InMemoryDocumentStore::new());
    documents.insert(
        "financial_organizations",
        funder_document(
            "sequoia",
            "Sequoia",
            vec![investment("acme-corp", "Acme", 2012, 3, 1, "a", 5_000_000)],
        ),
    );
    documents.insert("companies", company_document("acme-corp", "Acme Corporation"));
    let service = service_over(&graph, &documents);

    service
        .ingest_collection("financial_organizations", NodeLabel::Funder, &fan_out_pass())
        .await
        .unwrap();

    let stub = graph
        .get_node(NodeLabel::Company, "acme-corp")
        .await
        .expect("stub exists after fan-out");
    assert!(stub.is_stub());
    assert!(!stub.is_visited());

    service
        .ingest_collection("companies", NodeLabel::Company, &node_pass())
        .await
        .unwrap();

    let upgraded = graph
        .get_node(NodeLabel::Company, "acme-corp")
        .await
        .unwrap();
    assert!(!upgraded.is_stub());
    assert!(upgraded.is_visited());
    assert_eq!(
        upgraded.properties.get("name").unwrap().as_str(),
        Some("Acme Corporation")
    );
}

#[test_log::test(tokio::test)]
async fn role_edges_classify_scrub_and_derive_current() {
    let graph = Arc::new(InMemoryGraphStore::new());
    let documents = Arc::new(InMemoryDocumentStore::new());
    documents.insert(
        "people",
        person_document(
            "jane-doe",
            "Jane",
            "Doe",
            vec![
                firm_relationship("acme-corp", "Acme", "Founder and CEO", false),
                firm_relationship("globex", "Globex", "VP of Engineering", true),
                firm_relationship("initech", "Initech", "Marketing Manager", false),
            ],
        ),
    );
    let service = service_over(&graph, &documents);

    let summary = service
        .ingest_collection("people", NodeLabel::Person, &fan_out_pass())
        .await
        .unwrap();

    assert_eq!(summary.edges_created, 2);
    assert_eq!(summary.edges_skipped_unclassified, 1);

    let edges = graph.edges().await;
    assert_eq!(edges.len(), 2);

    let founder = edges
        .iter()
        .find(|e| e.to.key == "acme-corp")
        .expect("founder edge");
    // Founder outranks CEO in the composite title.
    assert_eq!(founder.kind, EdgeKind::Role(RoleKind::Founder));
    assert_eq!(founder.from.key, "jane-doe");
    assert_eq!(
        founder.properties.get("current"),
        Some(&PropertyValue::Bool(true))
    );
    assert_eq!(
        founder.properties.get("title").unwrap().as_str(),
        Some("Founder and CEO")
    );
    assert!(!founder.properties.contains_key("firm"));
    assert!(!founder.properties.contains_key("person"));

    let vp = edges.iter().find(|e| e.to.key == "globex").expect("vp edge");
    assert_eq!(vp.kind, EdgeKind::Role(RoleKind::Vp));
    assert_eq!(vp.properties.get("current"), Some(&PropertyValue::Bool(false)));

    // Counterparty stubs were created, minus the entity-type discriminator.
    let stub = graph.get_node(NodeLabel::Company, "acme-corp").await.unwrap();
    assert!(stub.is_stub());
    assert!(!stub.properties.contains_key("type_of_entity"));
    // The unclassified relationship still produced its stub, just no edge.
    assert!(graph.get_node(NodeLabel::Company, "initech").await.is_some());
}

#[test_log::test(tokio::test)]
async fn re_ingesting_a_fan_out_pass_does_not_duplicate_edges() {
    let graph = Arc::new(InMemoryGraphStore::new());
    let documents = Arc::new(InMemoryDocumentStore::new());
    documents.insert(
        "financial_organizations",
        funder_document(
            "sequoia",
            "Sequoia",
            vec![investment("acme-corp", "Acme", 2012, 3, 1, "a", 5_000_000)],
        ),
    );
    let service = service_over(&graph, &documents);

    service
        .ingest_collection("financial_organizations", NodeLabel::Funder, &fan_out_pass())
        .await
        .unwrap();
    service
        .ingest_collection("financial_organizations", NodeLabel::Funder, &fan_out_pass())
        .await
        .unwrap();

    assert_eq!(graph.edge_count().await, 1);
    assert_eq!(graph.node_count().await, 2);
}

#[test_log::test(tokio::test)]
async fn fan_out_skips_records_without_a_reproducible_identity() {
    let graph = Arc::new(InMemoryGraphStore::new());
    let documents = Arc::new(InMemoryDocumentStore::new());
    documents.insert("people", json!({ "first_name": "Ghost" }));
    documents.insert(
        "people",
        person_document(
            "jane-doe",
            "Jane",
            "Doe",
            vec![firm_relationship("acme-corp", "Acme", "Adviser", false)],
        ),
    );
    let service = service_over(&graph, &documents);

    let summary = service
        .ingest_collection("people", NodeLabel::Person, &fan_out_pass())
        .await
        .unwrap();

    assert_eq!(summary.records_processed, 2);
    assert_eq!(summary.records_skipped, 1);
    assert_eq!(summary.edges_created, 1);
    // The identity-less record produced no node at all in this pass.
    assert!(graph.get_node(NodeLabel::Person, "jane-doe").await.is_some());
    assert_eq!(graph.node_count().await, 2);
}

#[test_log::test(tokio::test)]
async fn node_pass_falls_back_to_generated_identity_and_counts_it() {
    let graph = Arc::new(InMemoryGraphStore::new());
    let documents = Arc::new(InMemoryDocumentStore::new());
    documents.insert("companies", json!({ "name": "Mystery Startup" }));
    let service = service_over(&graph, &documents);

    let summary = service
        .ingest_collection("companies", NodeLabel::Company, &node_pass())
        .await
        .unwrap();

    assert_eq!(summary.generated_identities, 1);
    assert_eq!(summary.records_skipped, 0);
    assert_eq!(graph.node_count().await, 1);
}

#[test_log::test(tokio::test)]
async fn unresolvable_funding_company_skips_the_edge_not_the_record() {
    let graph = Arc::new(InMemoryGraphStore::new());
    let documents = Arc::new(InMemoryDocumentStore::new());
    documents.insert(
        "financial_organizations",
        funder_document(
            "sequoia",
            "Sequoia",
            vec![
                json!({ "funding_round": { "funded_year": 2012 } }),
                json!({ "funding_round": { "company": 42, "funded_year": 2012 } }),
                investment("acme-corp", "Acme", 2012, 3, 1, "a", 5_000_000),
            ],
        ),
    );
    let service = service_over(&graph, &documents);

    let summary = service
        .ingest_collection("financial_organizations", NodeLabel::Funder, &fan_out_pass())
        .await
        .unwrap();

    assert_eq!(summary.edges_skipped_unresolved, 2);
    assert_eq!(summary.edges_created, 1);
    assert_eq!(summary.records_skipped, 0);
    assert_eq!(graph.edge_count().await, 1);
}

#[test_log::test(tokio::test)]
async fn identity_precedence_profile_url_over_generated() {
    let graph = Arc::new(InMemoryGraphStore::new());
    let documents = Arc::new(InMemoryDocumentStore::new());
    documents.insert(
        "companies",
        json!({
            "name": "Acme",
            "profile_url": "http://example.com/company/acme-corp",
        }),
    );
    let service = service_over(&graph, &documents);

    service
        .ingest_collection("companies", NodeLabel::Company, &node_pass())
        .await
        .unwrap();

    // The trailing URL segment became the node key.
    assert!(graph.get_node(NodeLabel::Company, "acme-corp").await.is_some());
}

#[test_log::test(tokio::test)]
async fn malformed_documents_are_skipped_and_counted() {
    let graph = Arc::new(InMemoryGraphStore::new());
    let documents = Arc::new(InMemoryDocumentStore::new());
    documents.insert("companies", json!(["not", "a", "mapping"]));
    documents.insert("companies", company_document("acme-corp", "Acme"));
    let service = service_over(&graph, &documents);

    let summary = service
        .ingest_collection("companies", NodeLabel::Company, &node_pass())
        .await
        .unwrap();

    assert_eq!(summary.records_processed, 2);
    assert_eq!(summary.records_skipped, 1);
    assert_eq!(graph.node_count().await, 1);
}
