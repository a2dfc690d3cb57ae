//! Query planner - turns a normalized question into a validated [`QueryPlan`].
//!
//! Planning runs in four steps:
//! 1. Relevance: pick tables and columns through the [`Retriever`] and glossary
//! 2. Skeleton: base table plus the joins connecting the other tables
//! 3. Strategy: one per [`Intent`], filling select list, aggregates and ordering
//! 4. Passes: date filters and top limits, then validation against the schema

mod strategies;
mod types;

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::config::Settings;
use crate::joins::{optimize_join_order, JoinGraph};
use crate::normalizer::{Intent, NormalizedQuery};
use crate::retrieval::{EntryRef, Retriever, SearchScope};
use crate::schema::{ColumnEntry, SchemaIndex};

pub use types::{
    AggregationFunction, AggregationSpec, ColumnReference, FilterCondition, FilterError,
    FilterOperator, FilterValue, LogicalOp, QueryPlan, SortDirection, SortSpec, Value,
};

/// Errors that end planning. Each carries the partial plan built so far.
#[derive(Debug, Error)]
pub enum PlanError {
    #[error("Schema mismatch: {reason}")]
    SchemaMismatch { plan: Box<QueryPlan>, reason: String },

    #[error("Inconsistent plan: {reason}")]
    PlanInconsistency { plan: Box<QueryPlan>, reason: String },
}

impl PlanError {
    pub fn plan(&self) -> &QueryPlan {
        match self {
            PlanError::SchemaMismatch { plan, .. } | PlanError::PlanInconsistency { plan, .. } => plan,
        }
    }

    pub fn reason(&self) -> &str {
        match self {
            PlanError::SchemaMismatch { reason, .. } | PlanError::PlanInconsistency { reason, .. } => {
                reason
            }
        }
    }
}

pub type PlanResult<T> = Result<T, PlanError>;

/// Non-fatal findings recorded while planning.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PlanWarning {
    /// Intent confidence was below the floor; the default strategy was used.
    NormalizationAmbiguity { confidence: f64, floor: f64 },
    /// Relevant tables with no join path to the base table.
    UnreachableTables(Vec<String>),
    /// No column matched the question; the base table's columns were used.
    NoRelevantColumns,
}

impl fmt::Display for PlanWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanWarning::NormalizationAmbiguity { confidence, floor } => write!(
                f,
                "intent confidence {confidence:.2} is below {floor:.2}, using the default plan"
            ),
            PlanWarning::UnreachableTables(tables) => {
                write!(f, "no join path to: {}", tables.join(", "))
            }
            PlanWarning::NoRelevantColumns => write!(f, "no column matched the question"),
        }
    }
}

/// A validated plan and the warnings raised on the way.
#[derive(Debug, Clone, Serialize)]
pub struct PlanOutcome {
    pub plan: QueryPlan,
    pub warnings: Vec<PlanWarning>,
}

/// Query planner configured from [`Settings`].
#[derive(Debug, Clone)]
pub struct Planner {
    max_tables: usize,
    select_columns: usize,
    top_columns: usize,
    default_columns: usize,
    limit_ceiling: u64,
    max_joins: usize,
    table_limit: usize,
    column_limit: usize,
    confidence_floor: f64,
}

impl Default for Planner {
    fn default() -> Self {
        Self::new(&Settings::default())
    }
}

/// Inputs shared by every strategy.
pub(crate) struct Context<'q, 'a> {
    pub query: &'q NormalizedQuery,
    pub index: &'a SchemaIndex,
    /// Relevant columns in relevance order.
    pub columns: Vec<&'a ColumnEntry>,
}

impl<'q, 'a> Context<'q, 'a> {
    /// Base table's columns, in declaration order.
    pub fn from_table_columns(&self, plan: &QueryPlan) -> Vec<&'a ColumnEntry> {
        self.index
            .table(&plan.from_table)
            .map(|t| t.columns.iter().collect())
            .unwrap_or_default()
    }
}

impl Planner {
    pub fn new(settings: &Settings) -> Self {
        let planner = &settings.planner;
        Self {
            max_tables: planner.max_tables,
            select_columns: planner.select_columns,
            top_columns: planner.top_columns,
            default_columns: planner.default_columns,
            limit_ceiling: planner.limit_ceiling,
            max_joins: planner.max_joins,
            table_limit: settings.retrieval.table_limit,
            column_limit: settings.retrieval.column_limit,
            confidence_floor: settings.normalizer.confidence_floor,
        }
    }

    /// Plan a normalized question against one schema version.
    pub fn plan(
        &self,
        query: &NormalizedQuery,
        retriever: &Retriever<'_>,
        graph: &JoinGraph,
    ) -> PlanResult<PlanOutcome> {
        let index = retriever.index();
        let search_text = query.search_text();
        let mut warnings = Vec::new();

        let mut tables = self.relevant_tables(query, &search_text, retriever);
        tracing::debug!(tables = ?tables, "relevant tables");

        let Some(from_table) = tables.first().cloned() else {
            let plan = self.skeleton(query, String::new(), Intent::Default);
            return Err(PlanError::SchemaMismatch {
                plan: Box::new(plan),
                reason: "no table in the schema matches the question".to_string(),
            });
        };

        let intent = if query.confidence < self.confidence_floor {
            tracing::warn!(
                confidence = query.confidence,
                floor = self.confidence_floor,
                "low intent confidence, falling back to the default plan"
            );
            warnings.push(PlanWarning::NormalizationAmbiguity {
                confidence: query.confidence,
                floor: self.confidence_floor,
            });
            Intent::Default
        } else {
            query.intent.unwrap_or(Intent::Default)
        };

        let mut plan = self.skeleton(query, from_table, intent);

        if tables.len() > 1 {
            let resolved = graph.resolve_multi_table(&tables);
            if !resolved.unreachable.is_empty() {
                tracing::warn!(tables = ?resolved.unreachable, "dropping unreachable tables");
                tables.retain(|t| !resolved.unreachable.contains(t));
                warnings.push(PlanWarning::UnreachableTables(resolved.unreachable.clone()));
            }
            plan.joins = optimize_join_order(&resolved.joins);
        }

        let columns = self.relevant_columns(query, &search_text, retriever, &tables);
        if columns.is_empty() {
            warnings.push(PlanWarning::NoRelevantColumns);
        }
        tracing::debug!(
            columns = ?columns.iter().map(|c| c.qualified_name()).collect::<Vec<_>>(),
            "relevant columns"
        );

        let ctx = Context {
            query,
            index,
            columns,
        };

        match intent {
            Intent::Select => self.plan_select(&mut plan, &ctx),
            Intent::Count => self.plan_count(&mut plan, &ctx)?,
            Intent::Aggregate => self.plan_aggregate(&mut plan, &ctx),
            Intent::Filter => self.plan_filter(&mut plan, &ctx),
            Intent::Top => self.plan_top(&mut plan, &ctx),
            Intent::Trend => self.plan_trend(&mut plan, &ctx),
            Intent::Compare => self.plan_compare(&mut plan, &ctx),
            Intent::Default => self.plan_default(&mut plan, &ctx),
        }

        self.add_date_filters(&mut plan, &ctx);
        self.add_top_limit(&mut plan, &ctx);

        plan.validate(index, self.max_joins)?;
        tracing::debug!(
            intent = %plan.intent,
            complexity = plan.complexity_score(),
            joins = plan.joins.len(),
            "planned query"
        );

        Ok(PlanOutcome { plan, warnings })
    }

    fn skeleton(&self, query: &NormalizedQuery, from_table: String, intent: Intent) -> QueryPlan {
        let mut plan = QueryPlan::new(from_table);
        plan.original_text = query.original.clone();
        plan.normalized_text = query.normalized.clone();
        plan.language = query.language;
        plan.intent = intent;
        plan.confidence = query.confidence;
        plan
    }

    /// Table search hits, then glossary tables, then searches on each term.
    fn relevant_tables(
        &self,
        query: &NormalizedQuery,
        search_text: &str,
        retriever: &Retriever<'_>,
    ) -> Vec<String> {
        let index = retriever.index();
        let mut tables: Vec<String> = Vec::new();
        let mut push = |tables: &mut Vec<String>, name: &str| {
            if !tables.iter().any(|t| t == name) {
                tables.push(name.to_string());
            }
        };

        for name in retriever.table_names(search_text, self.table_limit) {
            push(&mut tables, &name);
        }

        for term in &query.business_terms {
            let Some(entry) = index.glossary().lookup(&term.replace('_', " ")) else {
                continue;
            };
            for table in &entry.related_tables {
                if index.has_table(table) {
                    push(&mut tables, table);
                }
            }
        }

        for term in &query.business_terms {
            for name in retriever.table_names(term, self.table_limit) {
                push(&mut tables, &name);
            }
        }

        tables.truncate(self.max_tables);
        tables
    }

    /// Column search hits in relevant tables, then glossary columns.
    fn relevant_columns<'a>(
        &self,
        query: &NormalizedQuery,
        search_text: &str,
        retriever: &Retriever<'a>,
        tables: &[String],
    ) -> Vec<&'a ColumnEntry> {
        let index = retriever.index();
        let mut columns: Vec<&'a ColumnEntry> = Vec::new();
        let mut push = |columns: &mut Vec<&'a ColumnEntry>, entry: &'a ColumnEntry| {
            if !columns
                .iter()
                .any(|c| c.table == entry.table && c.name == entry.name)
            {
                columns.push(entry);
            }
        };

        for hit in retriever.search(search_text, SearchScope::Columns, self.column_limit) {
            let EntryRef::Column { table, column } = hit.entry else {
                continue;
            };
            if !tables.contains(&table) {
                continue;
            }
            if let Some(entry) = index.column(&table, &column) {
                push(&mut columns, entry);
            }
        }

        for term in &query.business_terms {
            let Some(entry) = index.glossary().lookup(&term.replace('_', " ")) else {
                continue;
            };
            for name in &entry.related_columns {
                for table in tables {
                    if let Some(column) = index.column(table, name) {
                        push(&mut columns, column);
                    }
                }
            }
        }

        columns
    }
}
