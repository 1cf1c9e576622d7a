//! Store collaborator interfaces

pub mod document_store;
pub mod graph_store;

pub use document_store::{DocumentStore, DocumentStream};
pub use graph_store::{GraphStore, GraphWritePatch};
