//! Neo4j implementation of the `GraphStore` trait

use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use neo4rs::{ConfigBuilder, Graph, Query};
use tracing::{debug, error, info, instrument};

use crate::data::{
    entities::{GraphEdge, NodeRef, KEY_PROPERTY, STUB_PROPERTY, VISITED_PROPERTY},
    errors::GraphStoreError,
    types::{NodeLabel, PropertyMap, PropertyValue},
};
use crate::traits::graph_store::{GraphStore, GraphWritePatch};

/// Configuration for Neo4j connection
#[derive(Debug, Clone)]
pub struct Neo4jConfig {
    pub uri: String,
    pub username: String,
    pub password: String,
    pub database: Option<String>,
    pub pool_size: usize,
    pub connection_retry_count: u32,
    pub connection_retry_delay: Duration,
}

impl Default for Neo4jConfig {
    fn default() -> Self {
        Self {
            uri: "neo4j://localhost:7687".to_string(),
            username: "neo4j".to_string(),
            password: "password".to_string(),
            database: None,
            pool_size: 10,
            connection_retry_count: 3,
            connection_retry_delay: Duration::from_secs(2),
        }
    }
}

impl Neo4jConfig {
    /// Builds a config from `NEO4J_URI`, `NEO4J_USERNAME`, `NEO4J_PASSWORD`
    /// and `NEO4J_DATABASE`. The password has no default and must be set.
    pub fn from_env() -> Result<Self, GraphStoreError> {
        let password = std::env::var("NEO4J_PASSWORD").map_err(|_| {
            GraphStoreError::ConnectionError("NEO4J_PASSWORD is not set".to_string())
        })?;
        Ok(Self {
            uri: std::env::var("NEO4J_URI")
                .unwrap_or_else(|_| "neo4j://localhost:7687".to_string()),
            username: std::env::var("NEO4J_USERNAME").unwrap_or_else(|_| "neo4j".to_string()),
            password,
            database: std::env::var("NEO4J_DATABASE").ok(),
            ..Self::default()
        })
    }
}

/// Neo4j implementation of the `GraphStore` trait
pub struct Neo4jGraphStore {
    pub graph: Arc<Graph>,
    config: Neo4jConfig,
}

impl Neo4jGraphStore {
    /// Returns the configuration used for this store
    pub fn get_config(&self) -> &Neo4jConfig {
        &self.config
    }

    /// Create a new Neo4jGraphStore instance with retries
    pub async fn new(config: Neo4jConfig) -> Result<Self, GraphStoreError> {
        let mut config_builder = ConfigBuilder::default()
            .uri(&config.uri)
            .user(&config.username)
            .password(&config.password)
            .max_connections(config.pool_size);

        if let Some(db) = &config.database {
            config_builder = config_builder.db(db.as_str());
        }

        let neo4j_config = config_builder.build().map_err(|e| {
            GraphStoreError::ConnectionError(format!("Failed to build Neo4j config: {}", e))
        })?;

        let mut last_error = None;
        for attempt in 1..=config.connection_retry_count {
            match Graph::connect(neo4j_config.clone()).await {
                Ok(graph) => {
                    info!("Connected to Neo4j at {} (attempt {})", config.uri, attempt);

                    // Test the connection with a simple query
                    let test_query = Query::new("RETURN 1 as test".to_string());
                    match graph.execute(test_query).await {
                        Ok(_) => {
                            return Ok(Self {
                                graph: Arc::new(graph),
                                config: config.clone(),
                            });
                        }
                        Err(e) => {
                            error!("Connection test failed: {}", e);
                            last_error = Some(e);
                        }
                    }
                }
                Err(e) => {
                    error!("Failed to connect to Neo4j (attempt {}): {}", attempt, e);
                    last_error = Some(e);
                    if attempt < config.connection_retry_count {
                        tokio::time::sleep(config.connection_retry_delay).await;
                    }
                }
            }
        }

        Err(GraphStoreError::ConnectionError(format!(
            "Failed to connect to Neo4j after {} attempts. Last error: {:?}",
            config.connection_retry_count, last_error
        )))
    }

    /// Deletes every node and relationship. Used for fresh-start rebuilds;
    /// the document store remains the system of record.
    pub async fn clear(&self) -> Result<(), GraphStoreError> {
        let query = Query::new("MATCH (n) DETACH DELETE n".to_string());
        self.graph
            .execute(query)
            .await
            .map_err(|e| GraphStoreError::QueryError(format!("Failed to clear graph: {}", e)))?;
        Ok(())
    }

    /// Escape a string for inlining into a Cypher literal
    fn escape(value: &str) -> String {
        value.replace('\\', "\\\\").replace('\'', "\\'")
    }

    fn cypher_literal(value: &PropertyValue) -> String {
        match value {
            PropertyValue::Bool(b) => b.to_string(),
            PropertyValue::Integer(i) => i.to_string(),
            PropertyValue::Float(f) => f.to_string(),
            PropertyValue::String(s) => format!("'{}'", Self::escape(s)),
        }
    }

    /// Build `alias.`field` = literal` SET clauses for a property map.
    fn set_clauses(alias: &str, properties: &PropertyMap) -> Vec<String> {
        properties
            .iter()
            .map(|(key, value)| {
                format!("{}.`{}` = {}", alias, key, Self::cypher_literal(value))
            })
            .collect()
    }

    /// Build an inline Cypher map literal for edge properties; the map is
    /// part of the MERGE pattern so the edge identity includes it.
    fn map_literal(properties: &PropertyMap) -> String {
        let entries: Vec<String> = properties
            .iter()
            .map(|(key, value)| format!("`{}`: {}", key, Self::cypher_literal(value)))
            .collect();
        format!("{{{}}}", entries.join(", "))
    }

    async fn run_returning_row(&self, query: Query) -> Result<bool, GraphStoreError> {
        let mut result = self
            .graph
            .execute(query)
            .await
            .map_err(|e| GraphStoreError::QueryError(format!("Failed to execute query: {}", e)))?;
        match result.next().await {
            Ok(Some(_)) => Ok(true),
            Ok(None) => Ok(false),
            Err(e) => Err(GraphStoreError::QueryError(format!(
                "Error reading query result: {}",
                e
            ))),
        }
    }

    async fn merge_edge(&self, edge: &GraphEdge) -> Result<(), GraphStoreError> {
        let cypher = format!(
            "MATCH (a:{} {{{}: $from_key}})\n\
             MATCH (b:{} {{{}: $to_key}})\n\
             MERGE (a)-[r:{} {}]->(b)\n\
             RETURN type(r) as kind",
            edge.from.label.as_str(),
            KEY_PROPERTY,
            edge.to.label.as_str(),
            KEY_PROPERTY,
            edge.kind.as_str(),
            Self::map_literal(&edge.properties),
        );
        let query = Query::new(cypher)
            .param("from_key", edge.from.key.as_str())
            .param("to_key", edge.to.key.as_str());
        let found = self.run_returning_row(query).await?;
        if !found {
            // One endpoint is missing; the MERGE matched nothing.
            return Err(GraphStoreError::ConstraintViolation(format!(
                "edge endpoints not found: {} -> {}",
                edge.from, edge.to
            )));
        }
        debug!(kind = edge.kind.as_str(), from = %edge.from, to = %edge.to, "edge merged");
        Ok(())
    }
}

#[async_trait]
impl GraphStore for Neo4jGraphStore {
    #[instrument(skip(self))]
    async fn find_node(
        &self,
        label: NodeLabel,
        key: &str,
    ) -> Result<Option<NodeRef>, GraphStoreError> {
        let cypher = format!(
            "MATCH (n:{} {{{}: $key}}) RETURN n.{} as key LIMIT 1",
            label.as_str(),
            KEY_PROPERTY,
            KEY_PROPERTY
        );
        let query = Query::new(cypher).param("key", key);
        let found = self.run_returning_row(query).await?;
        Ok(found.then(|| NodeRef::new(label, key)))
    }

    #[instrument(skip(self, properties))]
    async fn get_or_create_node(
        &self,
        label: NodeLabel,
        key: &str,
        mut properties: PropertyMap,
    ) -> Result<NodeRef, GraphStoreError> {
        properties
            .entry(KEY_PROPERTY.to_string())
            .or_insert_with(|| PropertyValue::String(key.to_string()));

        let mut cypher = format!(
            "MERGE (n:{} {{{}: $key}})\n",
            label.as_str(),
            KEY_PROPERTY
        );
        let clauses = Self::set_clauses("n", &properties);
        if !clauses.is_empty() {
            cypher.push_str(&format!("ON CREATE SET {}\n", clauses.join(", ")));
        }
        cypher.push_str(&format!("RETURN n.{} as key", KEY_PROPERTY));

        let query = Query::new(cypher).param("key", key);
        self.run_returning_row(query).await?;
        Ok(NodeRef::new(label, key))
    }

    #[instrument(skip(self, properties))]
    async fn merge_node_properties(
        &self,
        node: &NodeRef,
        properties: PropertyMap,
    ) -> Result<(), GraphStoreError> {
        if properties.is_empty() {
            return Ok(());
        }
        let cypher = format!(
            "MATCH (n:{} {{{}: $key}})\nSET {}\nRETURN n.{} as key",
            node.label.as_str(),
            KEY_PROPERTY,
            Self::set_clauses("n", &properties).join(", "),
            KEY_PROPERTY
        );
        let query = Query::new(cypher).param("key", node.key.as_str());
        let found = self.run_returning_row(query).await?;
        if !found {
            return Err(GraphStoreError::ConstraintViolation(format!(
                "no such node: {}",
                node
            )));
        }
        Ok(())
    }

    #[instrument(skip(self, edge))]
    async fn create_edge(&self, edge: GraphEdge) -> Result<(), GraphStoreError> {
        self.merge_edge(&edge).await
    }

    #[instrument(skip(self, patch), fields(nodes = patch.nodes.len(), edges = patch.edges.len()))]
    async fn apply_batch(&self, patch: GraphWritePatch) -> Result<(), GraphStoreError> {
        debug!(
            "Applying write patch: {} nodes, {} edges",
            patch.nodes.len(),
            patch.edges.len()
        );

        // Nodes first, so edges queued with their stub endpoints resolve
        // within the same patch.
        for mut node in patch.nodes {
            node.properties
                .entry(KEY_PROPERTY.to_string())
                .or_insert_with(|| PropertyValue::String(node.key.clone()));

            // Lifecycle flags are set on create only; everything else
            // merges last-write-wins.
            let mut create_only = PropertyMap::new();
            for flag in [STUB_PROPERTY, VISITED_PROPERTY] {
                if let Some(value) = node.properties.remove(flag) {
                    create_only.insert(flag.to_string(), value);
                }
            }

            let mut cypher = format!(
                "MERGE (n:{} {{{}: $key}})\n",
                node.label.as_str(),
                KEY_PROPERTY
            );
            let create_clauses = Self::set_clauses("n", &create_only);
            if !create_clauses.is_empty() {
                cypher.push_str(&format!("ON CREATE SET {}\n", create_clauses.join(", ")));
            }
            let merge_clauses = Self::set_clauses("n", &node.properties);
            if !merge_clauses.is_empty() {
                cypher.push_str(&format!("SET {}\n", merge_clauses.join(", ")));
            }
            cypher.push_str(&format!("RETURN n.{} as key", KEY_PROPERTY));

            let query = Query::new(cypher).param("key", node.key.as_str());
            self.run_returning_row(query).await?;
        }

        for edge in &patch.edges {
            self.merge_edge(edge).await?;
        }

        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cypher_literals_escape_quotes_and_backslashes() {
        assert_eq!(
            Neo4jGraphStore::cypher_literal(&PropertyValue::String("O'Brien \\ Co".into())),
            "'O\\'Brien \\\\ Co'"
        );
        assert_eq!(
            Neo4jGraphStore::cypher_literal(&PropertyValue::Integer(2012)),
            "2012"
        );
        assert_eq!(
            Neo4jGraphStore::cypher_literal(&PropertyValue::Bool(true)),
            "true"
        );
    }

    #[test]
    fn map_literal_wraps_entries() {
        let mut properties = PropertyMap::new();
        properties.insert("round_code".into(), PropertyValue::String("a".into()));
        assert_eq!(
            Neo4jGraphStore::map_literal(&properties),
            "{`round_code`: 'a'}"
        );
    }
}
