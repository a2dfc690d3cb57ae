//! SQL generation from a validated [`QueryPlan`].
//!
//! The generator lowers a plan into the [`Query`] builder and renders it for
//! one [`Dialect`]. Output is deterministic: aliases are assigned in
//! first-reference order and clauses always appear in the same order.

mod aliases;

use serde::Serialize;
use thiserror::Error;

pub use aliases::AliasMap;

use crate::config::SqlSettings;
use crate::joins::{JoinGraph, JoinKind};
use crate::planner::{
    AggregationFunction, AggregationSpec, ColumnReference, FilterCondition, FilterOperator,
    FilterValue, LogicalOp, QueryPlan, SortDirection, Value,
};
use crate::sql::{
    self, Dialect, Expr, ExprExt, IdentQuoting, JoinType, OrderByExpr, Query, SelectExpr, TableRef,
};

/// Errors raised while turning a plan into SQL.
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("Unresolvable join: {reason}")]
    UnresolvableJoin { plan: Box<QueryPlan>, reason: String },

    #[error("Unsupported for this dialect: {reason}")]
    UnsupportedDialectConstruct { plan: Box<QueryPlan>, reason: String },
}

impl GenerateError {
    pub fn plan(&self) -> &QueryPlan {
        match self {
            GenerateError::UnresolvableJoin { plan, .. }
            | GenerateError::UnsupportedDialectConstruct { plan, .. } => plan,
        }
    }
}

pub type GenerateResult<T> = Result<T, GenerateError>;

/// Rendering switches, taken from the `[sql]` settings section.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorOptions {
    pub use_table_aliases: bool,
    pub quote_identifiers: bool,
    pub default_limit: u64,
    pub max_limit: u64,
    pub include_comments: bool,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self::from(&SqlSettings::default())
    }
}

impl From<&SqlSettings> for GeneratorOptions {
    fn from(settings: &SqlSettings) -> Self {
        Self {
            use_table_aliases: settings.use_table_aliases,
            quote_identifiers: settings.quote_identifiers,
            default_limit: settings.default_limit,
            max_limit: settings.max_limit,
            include_comments: settings.include_comments,
        }
    }
}

/// Rough execution cost, bucketed from the plan's complexity score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PerformanceBucket {
    Fast,
    Medium,
    Slow,
    VerySlow,
}

impl PerformanceBucket {
    pub fn from_score(score: u32) -> Self {
        match score {
            0..=5 => PerformanceBucket::Fast,
            6..=15 => PerformanceBucket::Medium,
            16..=25 => PerformanceBucket::Slow,
            _ => PerformanceBucket::VerySlow,
        }
    }
}

/// Element counts of the generated query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SqlStats {
    pub table_count: usize,
    pub column_count: usize,
    pub join_count: usize,
    pub filter_count: usize,
    pub aggregation_count: usize,
}

/// Generated SQL and what downstream guardrails need to vet it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneratedSql {
    pub sql: String,
    pub dialect: Dialect,
    pub complexity_score: u32,
    pub performance: PerformanceBucket,
    /// `(table, alias)` in assignment order.
    pub table_aliases: Vec<(String, String)>,
    pub referenced_tables: Vec<String>,
    pub referenced_columns: Vec<String>,
    pub stats: SqlStats,
}

/// Renders query plans as SQL text.
#[derive(Debug, Clone, Default)]
pub struct SqlGenerator<'g> {
    options: GeneratorOptions,
    join_graph: Option<&'g JoinGraph>,
}

impl<'g> SqlGenerator<'g> {
    pub fn new(options: GeneratorOptions) -> Self {
        Self {
            options,
            join_graph: None,
        }
    }

    /// Check plan joins against foreign keys before rendering.
    pub fn with_join_graph(mut self, graph: &'g JoinGraph) -> Self {
        self.join_graph = Some(graph);
        self
    }

    pub fn options(&self) -> &GeneratorOptions {
        &self.options
    }

    /// Render `plan` for `dialect`.
    pub fn generate(&self, plan: &QueryPlan, dialect: Dialect) -> GenerateResult<GeneratedSql> {
        if let Some(graph) = self.join_graph {
            revalidate_joins(plan, graph)?;
        }

        let aliases = AliasMap::for_plan(plan);
        let query = self.build_query(plan, &aliases)?;
        let quoting = if self.options.quote_identifiers {
            IdentQuoting::Always
        } else {
            IdentQuoting::AsNeeded
        };
        let sql = query
            .to_sql(dialect, quoting)
            .map_err(|err| unsupported(plan, err.to_string()))?;

        let complexity_score = plan.complexity_score();
        let referenced_tables = plan.all_tables();
        let referenced_columns = plan.referenced_columns();
        let stats = SqlStats {
            table_count: referenced_tables.len(),
            column_count: referenced_columns.len(),
            join_count: plan.joins.len(),
            filter_count: plan.filters.len() + plan.having.len(),
            aggregation_count: plan.aggregations.len(),
        };

        tracing::debug!(%dialect, complexity = complexity_score, sql = %sql, "generated sql");

        Ok(GeneratedSql {
            sql,
            dialect,
            complexity_score,
            performance: PerformanceBucket::from_score(complexity_score),
            table_aliases: aliases.into_entries(),
            referenced_tables,
            referenced_columns,
            stats,
        })
    }

    fn build_query(&self, plan: &QueryPlan, aliases: &AliasMap) -> GenerateResult<Query> {
        let scope = Scope {
            aliases,
            use_aliases: self.options.use_table_aliases,
        };

        let mut select: Vec<SelectExpr> = plan
            .select_columns
            .iter()
            .map(|c| {
                let item = SelectExpr::new(scope.column(c));
                match &c.alias {
                    Some(alias) => item.with_alias(alias),
                    None => item,
                }
            })
            .collect();
        select.extend(
            plan.aggregations
                .iter()
                .map(|a| SelectExpr::new(scope.aggregate(a)).with_alias(&a.alias)),
        );
        if select.is_empty() {
            select.push(SelectExpr::new(sql::star()));
        }

        let mut query = Query::new().select(select).from(scope.table(&plan.from_table));

        if self.options.include_comments {
            query = query.comment(&format!("intent: {}", plan.intent));
        }

        for join in &plan.joins {
            let on = scope
                .qualified(&join.left_table, &join.left_column)
                .eq(scope.qualified(&join.right_table, &join.right_column));
            query = query.join(join_type(join.kind), scope.table(&join.right_table), on);
        }

        for filter in &plan.filters {
            let condition = scope
                .condition(filter)
                .map_err(|reason| unsupported(plan, reason))?;
            query = match filter.logical_op {
                LogicalOp::And => query.filter(condition),
                LogicalOp::Or => query.or_filter(condition),
            };
        }

        if !plan.group_by.is_empty() {
            query = query.group_by(plan.group_by.iter().map(|c| scope.column(c)).collect());
        }

        for condition in &plan.having {
            let expr = scope
                .condition(condition)
                .map_err(|reason| unsupported(plan, reason))?;
            query = query.having(expr, condition.logical_op == LogicalOp::Or);
        }

        if !plan.order_by.is_empty() {
            query = query.order_by(
                plan.order_by
                    .iter()
                    .map(|s| match s.direction {
                        SortDirection::Asc => OrderByExpr::asc(scope.column(&s.column)),
                        SortDirection::Desc => OrderByExpr::desc(scope.column(&s.column)),
                    })
                    .collect(),
            );
        }

        Ok(query.limit(self.effective_limit(plan)))
    }

    /// Plan limit or the default, clamped to the configured maximum.
    fn effective_limit(&self, plan: &QueryPlan) -> u64 {
        let requested = plan.limit.unwrap_or(self.options.default_limit);
        if requested > self.options.max_limit {
            tracing::warn!(
                requested,
                max = self.options.max_limit,
                "clamping limit to the configured maximum"
            );
            self.options.max_limit
        } else {
            requested
        }
    }
}

/// Name resolution for one query: table names or their aliases.
struct Scope<'a> {
    aliases: &'a AliasMap,
    use_aliases: bool,
}

impl Scope<'_> {
    fn qualifier<'t>(&'t self, table: &'t str) -> &'t str {
        if self.use_aliases {
            self.aliases.get(table).unwrap_or(table)
        } else {
            table
        }
    }

    fn qualified(&self, table: &str, column: &str) -> Expr {
        sql::table_col(self.qualifier(table), column)
    }

    fn column(&self, column: &ColumnReference) -> Expr {
        self.qualified(&column.table, &column.column)
    }

    fn table(&self, table: &str) -> TableRef {
        let table_ref = TableRef::new(table);
        match self.aliases.get(table).filter(|_| self.use_aliases) {
            Some(alias) => table_ref.with_alias(alias),
            None => table_ref,
        }
    }

    fn aggregate(&self, spec: &AggregationSpec) -> Expr {
        aggregate_expr(spec.function, self.column(&spec.column), spec.distinct)
    }

    /// A filter as a boolean expression, or why its value does not fit the operator.
    fn condition(&self, filter: &FilterCondition) -> Result<Expr, String> {
        let column = match filter.aggregate {
            Some(function) => aggregate_expr(
                function,
                self.column(&filter.column),
                function == AggregationFunction::CountDistinct,
            ),
            None => self.column(&filter.column),
        };

        let op = filter.operator;
        let shape_error = || format!("operator {op} cannot take value {:?}", filter.value);

        let expr = match (op, &filter.value) {
            (FilterOperator::IsNull, FilterValue::None)
            | (FilterOperator::Eq, FilterValue::Scalar(Value::Null)) => column.is_null(),
            (FilterOperator::IsNotNull, FilterValue::None)
            | (FilterOperator::NotEq, FilterValue::Scalar(Value::Null)) => column.is_not_null(),
            (FilterOperator::Eq, FilterValue::Scalar(v)) => column.eq(value_expr(v)),
            (FilterOperator::NotEq, FilterValue::Scalar(v)) => column.ne(value_expr(v)),
            (FilterOperator::Gt, FilterValue::Scalar(v)) => column.gt(value_expr(v)),
            (FilterOperator::GtEq, FilterValue::Scalar(v)) => column.gte(value_expr(v)),
            (FilterOperator::Lt, FilterValue::Scalar(v)) => column.lt(value_expr(v)),
            (FilterOperator::LtEq, FilterValue::Scalar(v)) => column.lte(value_expr(v)),
            (FilterOperator::Like, FilterValue::Scalar(v)) => column.like(value_expr(v)),
            (FilterOperator::NotLike, FilterValue::Scalar(v)) => column.not_like(value_expr(v)),
            (FilterOperator::In, FilterValue::List(values)) => {
                column.in_list(values.iter().map(value_expr).collect())
            }
            (FilterOperator::NotIn, FilterValue::List(values)) => {
                column.not_in_list(values.iter().map(value_expr).collect())
            }
            (FilterOperator::Between, FilterValue::List(values)) => match values.as_slice() {
                [low, high] => column.between(value_expr(low), value_expr(high)),
                _ => return Err(shape_error()),
            },
            _ => return Err(shape_error()),
        };
        Ok(expr)
    }
}

fn aggregate_expr(function: AggregationFunction, column: Expr, distinct: bool) -> Expr {
    let distinct = distinct || function == AggregationFunction::CountDistinct;
    sql::func(function.sql_name(), vec![column], distinct)
}

fn value_expr(value: &Value) -> Expr {
    match value {
        Value::Int(n) => sql::lit_int(*n),
        Value::Float(f) => sql::lit_float(*f),
        Value::Text(s) => sql::lit_str(s),
        Value::Bool(b) => sql::lit_bool(*b),
        Value::Null => sql::lit_null(),
        Value::Date(date) => sql::lit_date(*date),
    }
}

fn join_type(kind: JoinKind) -> JoinType {
    match kind {
        JoinKind::Inner => JoinType::Inner,
        JoinKind::Left => JoinType::Left,
        JoinKind::Right => JoinType::Right,
        JoinKind::Full => JoinType::Full,
    }
}

fn unsupported(plan: &QueryPlan, reason: String) -> GenerateError {
    GenerateError::UnsupportedDialectConstruct {
        plan: Box::new(plan.clone()),
        reason,
    }
}

/// Every join must follow a foreign key and start from a table already in the query.
fn revalidate_joins(plan: &QueryPlan, graph: &JoinGraph) -> GenerateResult<()> {
    let unresolvable = |reason: String| GenerateError::UnresolvableJoin {
        plan: Box::new(plan.clone()),
        reason,
    };

    if let Err(issues) = graph.validate_joins(&plan.joins, Some(&plan.from_table)) {
        let reasons: Vec<String> = issues.iter().map(ToString::to_string).collect();
        return Err(unresolvable(reasons.join("; ")));
    }

    for join in &plan.joins {
        if !graph.has_edge(
            &join.left_table,
            &join.left_column,
            &join.right_table,
            &join.right_column,
        ) {
            return Err(unresolvable(format!(
                "no foreign key matches {}",
                join.condition()
            )));
        }
    }
    Ok(())
}
