//! Schema snapshot ingestion and the read-only schema index.
//!
//! - [`snapshot`] - serde value objects in the introspection dump format
//! - [`index`] - the immutable [`SchemaIndex`] built once per schema version
//! - [`tags`] - the closed semantic tag set and tag inference
//! - [`glossary`] - business vocabulary linked to tables and columns
//! - [`handle`] - atomically swappable published schema

pub mod glossary;
pub mod handle;
pub mod index;
pub mod snapshot;
pub mod tags;

use std::path::PathBuf;

pub use glossary::{BusinessGlossary, BusinessTerm};
pub use handle::{SchemaHandle, SchemaVersion};
pub use index::{ColumnEntry, ForeignKeyRelation, SchemaIndex, TableEntry};
pub use snapshot::{ColumnSnapshot, ForeignKeySnapshot, GlossaryEntry, SchemaSnapshot, TableSnapshot};
pub use tags::{infer_tags, SemanticTag, TagSet};

/// Errors raised while loading or indexing a schema snapshot.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("Failed to read schema file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse schema snapshot: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid column reference '{0}', expected table.column")]
    InvalidReference(String),
}
