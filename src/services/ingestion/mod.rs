//! The ingestion pipeline: upsert engine, edge materialization, and write
//! batching.

pub mod batch;
pub mod service;

pub use batch::{BatchCoordinator, WriteBatch};
pub use service::{GraphIngestionService, IngestOptions, IngestionConfig, NodeDisposition};
