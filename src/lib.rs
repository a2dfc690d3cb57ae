//! # nl2sql
//!
//! A deterministic compiler from natural-language questions (Russian, Kazakh,
//! English) to SQL for several dialects.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                  Question (free text)                    │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [normalizer]
//! ┌─────────────────────────────────────────────────────────┐
//! │   NormalizedQuery (language, dates, numbers, intent)     │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [retrieval + joins]
//! ┌─────────────────────────────────────────────────────────┐
//! │   SchemaIndex search results + JoinGraph paths           │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [planner]
//! ┌─────────────────────────────────────────────────────────┐
//! │                 QueryPlan (validated)                    │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [generator]
//! ┌─────────────────────────────────────────────────────────┐
//! │            GeneratedSql (one dialect per call)           │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! The core does no I/O beyond optional snapshot and settings loading, and
//! the same plan always renders to the same SQL.

pub mod compile;
pub mod config;
pub mod fingerprint;
pub mod generator;
pub mod joins;
pub mod normalizer;
pub mod planner;
pub mod retrieval;
pub mod schema;
pub mod sql;

// Re-export SQL submodules at crate level
pub use sql::dialect;
pub use sql::expr;
pub use sql::query;
pub use sql::token;

/// The types most callers of the pipeline need.
pub mod prelude {
    pub use crate::compile::{compile, CompileError, CompileOutput, Pipeline};
    pub use crate::config::Settings;
    pub use crate::generator::{GeneratedSql, GeneratorOptions, SqlGenerator};
    pub use crate::joins::{JoinGraph, JoinPath, JoinSpec};
    pub use crate::normalizer::{Intent, Language, NormalizedQuery, Normalizer};
    pub use crate::planner::{PlanError, PlanOutcome, Planner, QueryPlan};
    pub use crate::retrieval::{Retriever, SearchResult, SearchScope};
    pub use crate::schema::{
        BusinessGlossary, ColumnSnapshot, SchemaHandle, SchemaIndex, SchemaSnapshot, TableSnapshot,
    };
    pub use crate::sql::{Dialect, SqlDialect};
}

pub use compile::{compile, CompileError, CompileOutput, Pipeline};
pub use dialect::Dialect;
pub use schema::SchemaSnapshot;
