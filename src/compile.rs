//! End-to-end compilation from a question to SQL.
//!
//! ```text
//! Question → Normalize → Retrieve → Plan → Generate → SQL
//! ```
//!
//! # Example
//!
//! ```ignore
//! use nl2sql::compile::compile;
//! use nl2sql::schema::{ColumnSnapshot, SchemaSnapshot, TableSnapshot};
//! use nl2sql::sql::Dialect;
//!
//! let schema = SchemaSnapshot::new().table(
//!     "orders",
//!     TableSnapshot::new().column(ColumnSnapshot::new("id", "integer").primary_key()),
//! );
//!
//! let generated = compile("количество заказов", &schema, Dialect::Postgres)?;
//! assert_eq!(generated.sql, "SELECT COUNT(orders.id) AS count FROM orders LIMIT 100");
//! ```

use std::sync::Arc;

use serde::Serialize;

use crate::config::{Settings, SettingsError};
use crate::fingerprint::request_fingerprint;
use crate::generator::{GenerateError, GeneratedSql, GeneratorOptions, SqlGenerator};
use crate::normalizer::{NormalizedQuery, Normalizer};
use crate::planner::{PlanError, PlanOutcome, PlanWarning, Planner, QueryPlan};
use crate::retrieval::{Retriever, SearchResult, SearchScope};
use crate::schema::{BusinessGlossary, SchemaError, SchemaHandle, SchemaSnapshot, SchemaVersion};
use crate::sql::Dialect;

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur during compilation.
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("Planning error: {0}")]
    Plan(#[from] PlanError),

    #[error("Generation error: {0}")]
    Generate(#[from] GenerateError),

    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),
}

impl CompileError {
    /// The partial plan, when the failure happened during or after planning.
    pub fn plan(&self) -> Option<&QueryPlan> {
        match self {
            CompileError::Plan(err) => Some(err.plan()),
            CompileError::Generate(err) => Some(err.plan()),
            CompileError::Schema(_) | CompileError::Settings(_) => None,
        }
    }
}

pub type CompileResult<T> = Result<T, CompileError>;

// ============================================================================
// Result Types
// ============================================================================

/// Result of compiling one question.
#[derive(Debug, Clone, Serialize)]
pub struct CompileOutput {
    pub generated: GeneratedSql,
    pub plan: QueryPlan,
    pub warnings: Vec<PlanWarning>,
    /// Stable key over the question, schema version and dialect.
    pub fingerprint: String,
}

// ============================================================================
// Pipeline
// ============================================================================

/// Compiles questions against the schema currently published in a [`SchemaHandle`].
///
/// Each call pins one schema version for its whole run, so a concurrent
/// [`SchemaHandle::replace`] never mixes two schemas in one request.
#[derive(Debug, Clone)]
pub struct Pipeline {
    settings: Settings,
    schema: SchemaHandle,
    planner: Planner,
    generator_options: GeneratorOptions,
}

impl Pipeline {
    pub fn new(settings: Settings, schema: SchemaHandle) -> Self {
        let planner = Planner::new(&settings);
        let generator_options = GeneratorOptions::from(&settings.sql);
        Self {
            settings,
            schema,
            planner,
            generator_options,
        }
    }

    /// Index `snapshot` with the default glossary and wrap it in a pipeline.
    pub fn from_snapshot(settings: Settings, snapshot: &SchemaSnapshot) -> CompileResult<Self> {
        let schema = SchemaHandle::from_snapshot(snapshot, BusinessGlossary::with_defaults())?;
        Ok(Self::new(settings, schema))
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn schema(&self) -> &SchemaHandle {
        &self.schema
    }

    /// Normalize with the glossary of the current schema version.
    pub fn normalize(&self, text: &str) -> NormalizedQuery {
        self.normalize_with(&self.schema.current(), text)
    }

    /// Ranked schema elements for the question.
    pub fn retrieve(&self, text: &str) -> Vec<SearchResult> {
        let version = self.schema.current();
        let query = self.normalize_with(&version, text);
        let retriever = Retriever::new(&version.index, &self.settings.retrieval);
        let results = retriever.search(
            &query.search_text(),
            SearchScope::Unified,
            self.settings.retrieval.column_limit,
        );
        tracing::debug!(count = results.len(), "retrieved schema elements");
        results
    }

    /// Plan without generating SQL.
    pub fn plan(&self, text: &str) -> CompileResult<PlanOutcome> {
        let version = self.schema.current();
        let query = self.normalize_with(&version, text);
        Ok(self.plan_with(&version, &query)?)
    }

    /// Compile a question for `dialect`.
    pub fn compile(&self, text: &str, dialect: Dialect) -> CompileResult<CompileOutput> {
        let version = self.schema.current();
        let query = self.normalize_with(&version, text);
        let PlanOutcome { plan, warnings } = self.plan_with(&version, &query)?;

        let generated = SqlGenerator::new(self.generator_options.clone())
            .with_join_graph(&version.join_graph)
            .generate(&plan, dialect)?;

        Ok(CompileOutput {
            fingerprint: request_fingerprint(text, &version.fingerprint, dialect),
            generated,
            plan,
            warnings,
        })
    }

    /// Compile for the dialect configured in `[sql]`.
    pub fn compile_default(&self, text: &str) -> CompileResult<CompileOutput> {
        self.compile(text, self.settings.sql.dialect)
    }

    fn normalize_with(&self, version: &Arc<SchemaVersion>, text: &str) -> NormalizedQuery {
        let normalizer = Normalizer::new(version.index.glossary().clone(), &self.settings.normalizer);
        let query = normalizer.normalize(text);
        tracing::debug!(
            normalized = %query.normalized,
            intent = ?query.intent,
            confidence = query.confidence,
            "normalized question"
        );
        query
    }

    fn plan_with(&self, version: &SchemaVersion, query: &NormalizedQuery) -> Result<PlanOutcome, PlanError> {
        let retriever = Retriever::new(&version.index, &self.settings.retrieval);
        self.planner.plan(query, &retriever, &version.join_graph)
    }
}

// ============================================================================
// Compilation Functions
// ============================================================================

/// Compile one question against a schema snapshot with default settings.
pub fn compile(text: &str, schema: &SchemaSnapshot, dialect: Dialect) -> CompileResult<GeneratedSql> {
    let pipeline = Pipeline::from_snapshot(Settings::default(), schema)?;
    Ok(pipeline.compile(text, dialect)?.generated)
}

/// Normalize a question with the default glossary.
pub fn normalize(text: &str) -> NormalizedQuery {
    Normalizer::default().normalize(text)
}

/// Rank schema elements for a question with default settings.
pub fn retrieve(text: &str, schema: &SchemaSnapshot) -> CompileResult<Vec<SearchResult>> {
    Ok(Pipeline::from_snapshot(Settings::default(), schema)?.retrieve(text))
}

/// Plan a question against a schema snapshot with default settings.
pub fn plan(text: &str, schema: &SchemaSnapshot) -> CompileResult<PlanOutcome> {
    Pipeline::from_snapshot(Settings::default(), schema)?.plan(text)
}
