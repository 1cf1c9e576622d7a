//! Services: normalization, classification, and the ingestion pipeline.

pub mod classify;
pub mod ingestion;
pub mod normalize;

pub use classify::classify_role;
pub use ingestion::{
    BatchCoordinator, GraphIngestionService, IngestOptions, IngestionConfig, NodeDisposition,
    WriteBatch,
};
pub use normalize::{normalize_record, sanitize_text, Normalized};
