//! Per-intent planning strategies and the passes that run after them.

use super::types::{
    AggregationFunction, AggregationSpec, ColumnReference, FilterCondition, FilterOperator, QueryPlan,
    SortSpec, Value,
};
use super::{Context, PlanError, PlanResult, Planner};
use crate::normalizer::DateKind;
use crate::schema::{ColumnEntry, SemanticTag};

const SUM_CUES: &[&str] = &["сумма", "итого", "всего", "sum", "total"];
const AVG_CUES: &[&str] = &["среднее", "средний", "avg", "average"];
const MAX_CUES: &[&str] = &["максимум", "max", "maximum"];
const MIN_CUES: &[&str] = &["минимум", "min", "minimum"];

const GREATER_CUES: &[&str] = &["больше", "свыше", "более", "greater", "more", "above"];
const LESS_CUES: &[&str] = &["меньше", "менее", "less", "below"];

const TOP_CUES: &[&str] = &["топ", "лучшие", "первые", "top", "best"];

fn reference(column: &ColumnEntry) -> ColumnReference {
    ColumnReference::new(&column.table, &column.name)
}

/// Money or Number columns that are not keys.
fn is_measure(column: &ColumnEntry) -> bool {
    column.tags.is_measure() && !column.tags.contains(SemanticTag::Identifier)
}

fn is_id_like(column: &ColumnEntry) -> bool {
    let name = column.name.to_lowercase();
    name == "id" || name.ends_with("_id")
}

impl Planner {
    /// Relevant columns, or the base table's when nothing matched.
    fn columns_or_base<'a>(&self, plan: &QueryPlan, ctx: &Context<'_, 'a>) -> Vec<&'a ColumnEntry> {
        if ctx.columns.is_empty() {
            ctx.from_table_columns(plan)
        } else {
            ctx.columns.clone()
        }
    }

    pub(super) fn plan_select(&self, plan: &mut QueryPlan, ctx: &Context<'_, '_>) {
        plan.select_columns = self
            .columns_or_base(plan, ctx)
            .into_iter()
            .take(self.select_columns)
            .map(reference)
            .collect();
    }

    pub(super) fn plan_default(&self, plan: &mut QueryPlan, ctx: &Context<'_, '_>) {
        plan.select_columns = self
            .columns_or_base(plan, ctx)
            .into_iter()
            .take(self.default_columns)
            .map(reference)
            .collect();
    }

    pub(super) fn plan_count(&self, plan: &mut QueryPlan, ctx: &Context<'_, '_>) -> PlanResult<()> {
        let base = ctx.from_table_columns(plan);
        let target = ctx
            .columns
            .iter()
            .find(|c| is_id_like(c))
            .or_else(|| ctx.columns.first())
            .copied()
            .or_else(|| base.iter().find(|c| c.primary_key).copied())
            .or_else(|| base.iter().find(|c| is_id_like(c)).copied())
            .or_else(|| base.first().copied());

        let Some(column) = target else {
            return Err(PlanError::SchemaMismatch {
                reason: format!("table '{}' has no columns to count", plan.from_table),
                plan: Box::new(plan.clone()),
            });
        };

        plan.aggregations
            .push(AggregationSpec::new(AggregationFunction::Count, reference(column)).with_alias("count"));
        Ok(())
    }

    pub(super) fn plan_aggregate(&self, plan: &mut QueryPlan, ctx: &Context<'_, '_>) {
        let query = ctx.query;
        let function = if query.mentions_any(SUM_CUES) {
            AggregationFunction::Sum
        } else if query.mentions_any(AVG_CUES) {
            AggregationFunction::Avg
        } else if query.mentions_any(MAX_CUES) {
            AggregationFunction::Max
        } else if query.mentions_any(MIN_CUES) {
            AggregationFunction::Min
        } else {
            AggregationFunction::Sum
        };

        let needs_measure = matches!(function, AggregationFunction::Sum | AggregationFunction::Avg);
        plan.aggregations = ctx
            .columns
            .iter()
            .filter(|c| !needs_measure || is_measure(c))
            .map(|c| AggregationSpec::new(function, reference(c)))
            .collect();

        if plan.aggregations.is_empty() {
            tracing::debug!(function = function.name(), "no column to aggregate, selecting instead");
            self.plan_select(plan, ctx);
        }
    }

    pub(super) fn plan_top(&self, plan: &mut QueryPlan, ctx: &Context<'_, '_>) {
        let columns = self.columns_or_base(plan, ctx);
        plan.select_columns = columns.iter().take(self.top_columns).map(|c| reference(c)).collect();
        plan.limit = ctx.query.first_whole_number(self.limit_ceiling);

        let sort = columns
            .iter()
            .find(|c| is_measure(c))
            .or_else(|| columns.first());
        if let Some(column) = sort {
            plan.order_by.push(SortSpec::desc(reference(column)));
        }
    }

    pub(super) fn plan_filter(&self, plan: &mut QueryPlan, ctx: &Context<'_, '_>) {
        let query = ctx.query;
        plan.select_columns = self.columns_or_base(plan, ctx).into_iter().map(reference).collect();

        let operator = if query.mentions_any(GREATER_CUES) {
            FilterOperator::Gt
        } else if query.mentions_any(LESS_CUES) {
            FilterOperator::Lt
        } else {
            return;
        };
        let Some(number) = query.numbers.first() else {
            return;
        };
        let value = match number.as_whole() {
            Some(whole) => Value::Int(whole),
            None => Value::Float(number.value),
        };

        for column in ctx.columns.iter().filter(|c| is_measure(c)) {
            match FilterCondition::compare(reference(column), operator, value.clone()) {
                Ok(filter) => plan.filters.push(filter),
                Err(err) => tracing::warn!(error = %err, "skipping numeric filter"),
            }
        }
    }

    pub(super) fn plan_trend(&self, plan: &mut QueryPlan, ctx: &Context<'_, '_>) {
        let date = ctx
            .columns
            .iter()
            .find(|c| c.tags.contains(SemanticTag::Date));
        let measures: Vec<&ColumnEntry> = ctx.columns.iter().copied().filter(|c| is_measure(c)).take(2).collect();

        let Some(date) = date.filter(|_| !measures.is_empty()) else {
            tracing::debug!("trend needs a date and a measure column, using the default plan");
            return self.plan_default(plan, ctx);
        };

        plan.select_columns = vec![reference(date)];
        plan.group_by = vec![reference(date)];
        plan.aggregations = measures
            .into_iter()
            .map(|m| AggregationSpec::new(AggregationFunction::Sum, reference(m)))
            .collect();
        plan.order_by.push(SortSpec::asc(reference(date)));
    }

    pub(super) fn plan_compare(&self, plan: &mut QueryPlan, ctx: &Context<'_, '_>) {
        let categories: Vec<ColumnReference> = ctx
            .columns
            .iter()
            .filter(|c| c.tags.contains(SemanticTag::Category))
            .take(2)
            .map(|c| reference(c))
            .collect();
        let measures: Vec<&ColumnEntry> = ctx.columns.iter().copied().filter(|c| is_measure(c)).take(2).collect();

        if categories.is_empty() || measures.is_empty() {
            tracing::debug!("compare needs a category and a measure column, using the default plan");
            return self.plan_default(plan, ctx);
        }

        plan.select_columns = categories.clone();
        plan.group_by = categories;
        plan.aggregations = measures
            .into_iter()
            .map(|m| AggregationSpec::new(AggregationFunction::Sum, reference(m)))
            .collect();
    }

    /// One filter per extracted date on the best date column.
    pub(super) fn add_date_filters(&self, plan: &mut QueryPlan, ctx: &Context<'_, '_>) {
        if ctx.query.dates.is_empty() {
            return;
        }

        let is_date = |c: &&ColumnEntry| c.tags.contains(SemanticTag::Date);
        let referenced = plan
            .all_columns()
            .into_iter()
            .filter_map(|r| ctx.index.column(&r.table, &r.column))
            .find(is_date);
        let column = referenced
            .or_else(|| ctx.columns.iter().copied().find(is_date))
            .or_else(|| ctx.from_table_columns(plan).into_iter().find(is_date));

        let Some(column) = column else {
            tracing::debug!("question has dates but no date column is available");
            return;
        };

        for date in &ctx.query.dates {
            let operator = match date.kind {
                DateKind::Relative | DateKind::RelativeWithNumber => FilterOperator::GtEq,
                DateKind::Absolute => FilterOperator::Eq,
            };
            match FilterCondition::compare(reference(column), operator, date.resolved) {
                Ok(filter) => plan.filters.push(filter),
                Err(err) => tracing::warn!(error = %err, "skipping date filter"),
            }
        }
    }

    /// `LIMIT n` for "top n" questions planned by another strategy.
    pub(super) fn add_top_limit(&self, plan: &mut QueryPlan, ctx: &Context<'_, '_>) {
        if plan.limit.is_some() || !ctx.query.mentions_any(TOP_CUES) {
            return;
        }
        plan.limit = ctx.query.first_whole_number(self.limit_ceiling);
    }
}
