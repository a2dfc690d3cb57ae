//! The validated intermediate query plan.

use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

use super::PlanError;
use crate::joins::JoinSpec;
use crate::normalizer::{DateExpr, Intent, Language};
use crate::schema::SchemaIndex;

/// A column of a table in the plan.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ColumnReference {
    pub table: String,
    pub column: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
}

impl ColumnReference {
    pub fn new(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            column: column.into(),
            alias: None,
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// `table.column`
    pub fn full_name(&self) -> String {
        format!("{}.{}", self.table, self.column)
    }
}

impl fmt::Display for ColumnReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.table, self.column)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AggregationFunction {
    Count,
    Sum,
    Avg,
    Min,
    Max,
    CountDistinct,
}

impl AggregationFunction {
    /// SQL function name; `CountDistinct` renders as `COUNT(DISTINCT ..)`.
    pub fn sql_name(self) -> &'static str {
        match self {
            AggregationFunction::Count | AggregationFunction::CountDistinct => "COUNT",
            AggregationFunction::Sum => "SUM",
            AggregationFunction::Avg => "AVG",
            AggregationFunction::Min => "MIN",
            AggregationFunction::Max => "MAX",
        }
    }

    /// Lowercase name used in default aliases.
    pub fn name(self) -> &'static str {
        match self {
            AggregationFunction::Count => "count",
            AggregationFunction::Sum => "sum",
            AggregationFunction::Avg => "avg",
            AggregationFunction::Min => "min",
            AggregationFunction::Max => "max",
            AggregationFunction::CountDistinct => "count_distinct",
        }
    }
}

/// An aggregate in the SELECT list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregationSpec {
    pub function: AggregationFunction,
    pub column: ColumnReference,
    pub alias: String,
    pub distinct: bool,
}

impl AggregationSpec {
    /// Aggregate with the default alias `{func}_{column}`.
    pub fn new(function: AggregationFunction, column: ColumnReference) -> Self {
        let alias = format!("{}_{}", function.name(), column.column);
        Self {
            function,
            column,
            alias,
            distinct: function == AggregationFunction::CountDistinct,
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = alias.into();
        self
    }

    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum FilterOperator {
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = "!=")]
    NotEq,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    GtEq,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    LtEq,
    #[serde(rename = "IN")]
    In,
    #[serde(rename = "NOT IN")]
    NotIn,
    #[serde(rename = "LIKE")]
    Like,
    #[serde(rename = "NOT LIKE")]
    NotLike,
    #[serde(rename = "IS NULL")]
    IsNull,
    #[serde(rename = "IS NOT NULL")]
    IsNotNull,
    #[serde(rename = "BETWEEN")]
    Between,
}

impl FilterOperator {
    pub fn as_sql(self) -> &'static str {
        match self {
            FilterOperator::Eq => "=",
            FilterOperator::NotEq => "!=",
            FilterOperator::Gt => ">",
            FilterOperator::GtEq => ">=",
            FilterOperator::Lt => "<",
            FilterOperator::LtEq => "<=",
            FilterOperator::In => "IN",
            FilterOperator::NotIn => "NOT IN",
            FilterOperator::Like => "LIKE",
            FilterOperator::NotLike => "NOT LIKE",
            FilterOperator::IsNull => "IS NULL",
            FilterOperator::IsNotNull => "IS NOT NULL",
            FilterOperator::Between => "BETWEEN",
        }
    }
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// A literal value in a filter.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Int(i64),
    Float(f64),
    Text(String),
    Bool(bool),
    Null,
    Date(DateExpr),
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<DateExpr> for Value {
    fn from(v: DateExpr) -> Self {
        Value::Date(v)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FilterValue {
    None,
    Scalar(Value),
    List(Vec<Value>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogicalOp {
    #[default]
    And,
    Or,
}

impl LogicalOp {
    pub fn as_sql(self) -> &'static str {
        match self {
            LogicalOp::And => "AND",
            LogicalOp::Or => "OR",
        }
    }
}

/// Operator and value do not fit together.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FilterError {
    #[error("Operator {0} requires a non-empty list value")]
    ExpectedList(FilterOperator),

    #[error("Operator BETWEEN requires exactly two values, got {0}")]
    ExpectedPair(usize),

    #[error("Operator {0} takes no value")]
    UnexpectedValue(FilterOperator),

    #[error("Operator {0} requires a single value")]
    ExpectedScalar(FilterOperator),
}

/// One WHERE or HAVING condition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterCondition {
    pub column: ColumnReference,
    pub operator: FilterOperator,
    pub value: FilterValue,
    /// How this condition joins the previous one.
    pub logical_op: LogicalOp,
    /// Aggregate applied to the column, for HAVING conditions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aggregate: Option<AggregationFunction>,
}

impl FilterCondition {
    /// Build a condition, checking the value shape against the operator.
    pub fn new(
        column: ColumnReference,
        operator: FilterOperator,
        value: FilterValue,
    ) -> Result<Self, FilterError> {
        match (operator, &value) {
            (FilterOperator::In | FilterOperator::NotIn, FilterValue::List(items)) if !items.is_empty() => {}
            (FilterOperator::In | FilterOperator::NotIn, _) => {
                return Err(FilterError::ExpectedList(operator))
            }
            (FilterOperator::Between, FilterValue::List(items)) if items.len() == 2 => {}
            (FilterOperator::Between, FilterValue::List(items)) => {
                return Err(FilterError::ExpectedPair(items.len()))
            }
            (FilterOperator::Between, FilterValue::Scalar(_)) => return Err(FilterError::ExpectedPair(1)),
            (FilterOperator::Between, FilterValue::None) => return Err(FilterError::ExpectedPair(0)),
            (FilterOperator::IsNull | FilterOperator::IsNotNull, FilterValue::None) => {}
            (FilterOperator::IsNull | FilterOperator::IsNotNull, _) => {
                return Err(FilterError::UnexpectedValue(operator))
            }
            (_, FilterValue::Scalar(_)) => {}
            (_, _) => return Err(FilterError::ExpectedScalar(operator)),
        }

        Ok(Self {
            column,
            operator,
            value,
            logical_op: LogicalOp::And,
            aggregate: None,
        })
    }

    /// `column <op> value` with a single value.
    pub fn compare(
        column: ColumnReference,
        operator: FilterOperator,
        value: impl Into<Value>,
    ) -> Result<Self, FilterError> {
        Self::new(column, operator, FilterValue::Scalar(value.into()))
    }

    pub fn or(mut self) -> Self {
        self.logical_op = LogicalOp::Or;
        self
    }

    pub fn aggregated(mut self, function: AggregationFunction) -> Self {
        self.aggregate = Some(function);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_sql(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SortSpec {
    pub column: ColumnReference,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn asc(column: ColumnReference) -> Self {
        Self {
            column,
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(column: ColumnReference) -> Self {
        Self {
            column,
            direction: SortDirection::Desc,
        }
    }
}

/// Structured plan between normalized text and SQL.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryPlan {
    pub select_columns: Vec<ColumnReference>,
    pub aggregations: Vec<AggregationSpec>,
    pub from_table: String,
    pub joins: Vec<JoinSpec>,
    pub filters: Vec<FilterCondition>,
    pub group_by: Vec<ColumnReference>,
    pub having: Vec<FilterCondition>,
    pub order_by: Vec<SortSpec>,
    pub limit: Option<u64>,

    // Provenance
    pub original_text: String,
    pub normalized_text: String,
    pub language: Language,
    pub intent: Intent,
    pub confidence: f64,
}

impl QueryPlan {
    pub fn new(from_table: impl Into<String>) -> Self {
        Self {
            select_columns: Vec::new(),
            aggregations: Vec::new(),
            from_table: from_table.into(),
            joins: Vec::new(),
            filters: Vec::new(),
            group_by: Vec::new(),
            having: Vec::new(),
            order_by: Vec::new(),
            limit: None,
            original_text: String::new(),
            normalized_text: String::new(),
            language: Language::default(),
            intent: Intent::Default,
            confidence: 1.0,
        }
    }

    /// Weighted count of plan elements.
    pub fn complexity_score(&self) -> u32 {
        let score = self.select_columns.len()
            + self.aggregations.len() * 2
            + self.joins.len() * 3
            + self.filters.len()
            + self.group_by.len()
            + self.having.len() * 2
            + self.order_by.len()
            + usize::from(self.limit.is_some());
        u32::try_from(score).unwrap_or(u32::MAX)
    }

    /// `from_table` followed by every join table, without duplicates.
    pub fn all_tables(&self) -> Vec<String> {
        let mut tables = vec![self.from_table.clone()];
        for join in &self.joins {
            for table in [&join.left_table, &join.right_table] {
                if !tables.contains(table) {
                    tables.push(table.clone());
                }
            }
        }
        tables
    }

    /// Every column reference in clause order.
    pub fn all_columns(&self) -> Vec<&ColumnReference> {
        let mut columns: Vec<&ColumnReference> = Vec::new();
        columns.extend(self.select_columns.iter());
        columns.extend(self.aggregations.iter().map(|a| &a.column));
        columns.extend(self.filters.iter().map(|f| &f.column));
        columns.extend(self.group_by.iter());
        columns.extend(self.having.iter().map(|h| &h.column));
        columns.extend(self.order_by.iter().map(|o| &o.column));
        columns
    }

    /// Distinct `table.column` names referenced anywhere, including join keys.
    pub fn referenced_columns(&self) -> Vec<String> {
        let mut seen = BTreeSet::new();
        let mut names = Vec::new();
        let join_keys = self.joins.iter().flat_map(|j| {
            [
                format!("{}.{}", j.left_table, j.left_column),
                format!("{}.{}", j.right_table, j.right_column),
            ]
        });
        for name in self
            .all_columns()
            .into_iter()
            .map(ColumnReference::full_name)
            .chain(join_keys)
        {
            if seen.insert(name.clone()) {
                names.push(name);
            }
        }
        names
    }

    /// Check the plan against the schema.
    ///
    /// Unknown tables and columns are [`PlanError::SchemaMismatch`] with a
    /// closest-name hint; structural problems are
    /// [`PlanError::PlanInconsistency`].
    pub fn validate(&self, index: &SchemaIndex, max_joins: usize) -> Result<(), PlanError> {
        if !index.has_table(&self.from_table) {
            return Err(self.mismatch(format!(
                "table '{}' does not exist{}",
                self.from_table,
                hint(index.closest_table(&self.from_table))
            )));
        }

        if self.joins.len() > max_joins {
            return Err(self.inconsistency(format!(
                "{} joins exceed the limit of {max_joins}",
                self.joins.len()
            )));
        }

        let mut introduced: Vec<&str> = vec![self.from_table.as_str()];
        for join in &self.joins {
            for (table, column) in [
                (&join.left_table, &join.left_column),
                (&join.right_table, &join.right_column),
            ] {
                if !index.has_table(table) {
                    return Err(self.mismatch(format!(
                        "join table '{table}' does not exist{}",
                        hint(index.closest_table(table))
                    )));
                }
                if !index.has_column(table, column) {
                    return Err(self.mismatch(format!(
                        "join column '{table}.{column}' does not exist{}",
                        hint(index.closest_column(table, column).as_deref())
                    )));
                }
            }
            if !introduced.contains(&join.left_table.as_str()) {
                return Err(self.inconsistency(format!(
                    "join to '{}' starts from '{}', which is not joined yet",
                    join.right_table, join.left_table
                )));
            }
            if introduced.contains(&join.right_table.as_str()) {
                return Err(self.inconsistency(format!(
                    "table '{}' is joined more than once, forming a cycle",
                    join.right_table
                )));
            }
            introduced.push(join.right_table.as_str());
        }

        for column in self.all_columns() {
            if !introduced.contains(&column.table.as_str()) {
                return Err(self.inconsistency(format!(
                    "column {column} references table '{}', which is not in FROM or JOIN",
                    column.table
                )));
            }
            if !index.has_column(&column.table, &column.column) {
                return Err(self.mismatch(format!(
                    "column {column} does not exist{}",
                    hint(index.closest_column(&column.table, &column.column).as_deref())
                )));
            }
        }

        if !self.aggregations.is_empty() && !self.select_columns.is_empty() && self.group_by.is_empty() {
            return Err(self.inconsistency(
                "GROUP BY is required when mixing aggregations with plain columns".to_string(),
            ));
        }

        Ok(())
    }

    fn mismatch(&self, reason: String) -> PlanError {
        PlanError::SchemaMismatch {
            plan: Box::new(self.clone()),
            reason,
        }
    }

    fn inconsistency(&self, reason: String) -> PlanError {
        PlanError::PlanInconsistency {
            plan: Box::new(self.clone()),
            reason,
        }
    }
}

fn hint(suggestion: Option<&str>) -> String {
    match suggestion {
        Some(name) => format!(" (did you mean '{name}'?)"),
        None => String::new(),
    }
}
