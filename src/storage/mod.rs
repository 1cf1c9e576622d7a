//! Store implementations that need no external services.

pub mod json_lines;
pub mod memory;

pub use json_lines::JsonLinesDocumentStore;
pub use memory::{InMemoryDocumentStore, InMemoryGraphStore};
