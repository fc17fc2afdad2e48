//! Utility modules
//!
//! This module contains utilities and helpers:
//! - Error types and result types
//! - Artifact and annotation storage
//! - Image directory catalog

pub mod catalog;
pub mod error;
pub mod store;

// Re-export commonly used items
pub use catalog::{CatalogStatus, FileCatalog, FileEntry, FilePage};
pub use error::{EditorError, EditorResult, StoreError};
pub use store::{AnnotationStore, Artifact, DirStore, MemoryStore, Revision};
