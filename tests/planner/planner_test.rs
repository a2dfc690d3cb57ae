//! Integration tests for intent-driven query planning.

#[path = "../common/mod.rs"]
mod common;

use nl2sql::config::Settings;
use nl2sql::normalizer::{DateExpr, DateUnit, Intent, Language};
use nl2sql::planner::{
    AggregationFunction, FilterOperator, FilterValue, PlanError, PlanWarning, SortDirection, Value,
};
use nl2sql::schema::SchemaSnapshot;

fn orders() -> SchemaSnapshot {
    common::single_table(
        "orders",
        &[
            ("id", "integer"),
            ("amount", "numeric(12,2)"),
            ("created_at", "timestamp"),
        ],
    )
}

fn customers() -> SchemaSnapshot {
    common::single_table(
        "customers",
        &[
            ("id", "integer"),
            ("name", "varchar(100)"),
            ("revenue", "numeric(12,2)"),
        ],
    )
}

// ============================================================================
// Strategies
// ============================================================================

#[test]
fn test_count_targets_primary_key() {
    let outcome = common::pipeline(&orders()).plan("количество заказов").unwrap();
    let plan = outcome.plan;
    assert_eq!(plan.intent, Intent::Count);
    assert_eq!(plan.from_table, "orders");
    assert_eq!(plan.aggregations.len(), 1);
    assert_eq!(plan.aggregations[0].function, AggregationFunction::Count);
    assert_eq!(plan.aggregations[0].column.full_name(), "orders.id");
    assert_eq!(plan.aggregations[0].alias, "count");
    assert!(plan.select_columns.is_empty());
}

#[test]
fn test_top_orders_by_money_descending() {
    let plan = common::pipeline(&customers())
        .plan("топ 3 клиента по выручке")
        .unwrap()
        .plan;
    assert_eq!(plan.intent, Intent::Top);
    assert_eq!(plan.limit, Some(3));
    assert_eq!(plan.order_by.len(), 1);
    assert_eq!(plan.order_by[0].column.full_name(), "customers.revenue");
    assert_eq!(plan.order_by[0].direction, SortDirection::Desc);
}

#[test]
fn test_top_limit_respects_ceiling() {
    let plan = common::pipeline(&customers())
        .plan("топ 500 клиентов по выручке")
        .unwrap()
        .plan;
    assert_eq!(plan.limit, None);
}

#[test]
fn test_numeric_filter() {
    let plan = common::pipeline(&orders())
        .plan("orders where amount greater 500")
        .unwrap()
        .plan;
    assert_eq!(plan.intent, Intent::Filter);
    assert_eq!(plan.filters.len(), 1);
    assert_eq!(plan.filters[0].column.full_name(), "orders.amount");
    assert_eq!(plan.filters[0].operator, FilterOperator::Gt);
    assert_eq!(plan.filters[0].value, FilterValue::Scalar(Value::Int(500)));
}

#[test]
fn test_trend_groups_by_date_column() {
    let plan = common::pipeline(&orders())
        .plan("orders amount trend by created_at")
        .unwrap()
        .plan;
    assert_eq!(plan.intent, Intent::Trend);
    assert_eq!(plan.group_by.len(), 1);
    assert_eq!(plan.group_by[0].column, "created_at");
    assert_eq!(plan.aggregations[0].function, AggregationFunction::Sum);
    assert_eq!(plan.aggregations[0].alias, "sum_amount");
    assert_eq!(plan.order_by[0].direction, SortDirection::Asc);
}

#[test]
fn test_relative_date_becomes_filter() {
    let outcome = common::pipeline(&orders())
        .plan("заказы за последние 7 дней")
        .unwrap();
    let filter = outcome
        .plan
        .filters
        .iter()
        .find(|f| f.column.column == "created_at")
        .expect("date filter");
    assert_eq!(filter.operator, FilterOperator::GtEq);
    assert_eq!(
        filter.value,
        FilterValue::Scalar(Value::Date(DateExpr::past(7, DateUnit::Day)))
    );
}

// ============================================================================
// Fallbacks and Warnings
// ============================================================================

#[test]
fn test_low_confidence_falls_back_to_default() {
    let outcome = common::pipeline(&orders()).plan("заказы").unwrap();
    assert_eq!(outcome.plan.intent, Intent::Default);
    assert!(outcome
        .warnings
        .iter()
        .any(|w| matches!(w, PlanWarning::NormalizationAmbiguity { .. })));
    assert!(!outcome.plan.select_columns.is_empty());
}

#[test]
fn test_base_columns_when_nothing_matches() {
    let outcome = common::pipeline(&customers()).plan("покажи всех клиентов").unwrap();
    assert!(outcome.warnings.contains(&PlanWarning::NoRelevantColumns));
    let columns: Vec<String> = outcome.plan.select_columns.iter().map(|c| c.full_name()).collect();
    assert_eq!(columns, vec!["customers.id", "customers.name", "customers.revenue"]);
}

#[test]
fn test_no_matching_table_is_schema_mismatch() {
    let err = common::pipeline(&orders()).plan("погода в алматы").unwrap_err();
    let nl2sql::compile::CompileError::Plan(plan_err) = err else {
        panic!("expected a planning error, got {err:?}");
    };
    assert!(matches!(plan_err, PlanError::SchemaMismatch { .. }));
    assert_eq!(plan_err.reason(), "no table in the schema matches the question");
    assert_eq!(plan_err.plan().original_text, "погода в алматы");
}

// ============================================================================
// Multi-table Plans
// ============================================================================

#[test]
fn test_two_entities_are_joined() {
    let plan = common::pipeline(&common::shop_snapshot())
        .plan("покажи клиентов и заказы")
        .unwrap()
        .plan;
    assert_eq!(plan.joins.len(), 1);
    let tables = plan.all_tables();
    assert!(tables.contains(&"customers".to_string()));
    assert!(tables.contains(&"orders".to_string()));
}

#[test]
fn test_unreachable_table_is_dropped_with_warning() {
    let outcome = common::pipeline(&common::shop_snapshot())
        .plan("show orders and audit_log")
        .unwrap();
    assert!(outcome.plan.joins.is_empty());
    assert!(outcome
        .warnings
        .iter()
        .any(|w| matches!(w, PlanWarning::UnreachableTables(t) if t.len() == 1)));
    assert_eq!(outcome.plan.all_tables().len(), 1);
}

#[test]
fn test_max_tables_setting() {
    let mut settings = Settings::default();
    settings.planner.max_tables = 1;
    let plan = common::pipeline_with(settings, &common::shop_snapshot())
        .plan("покажи клиентов и заказы")
        .unwrap()
        .plan;
    assert!(plan.joins.is_empty());
}

#[test]
fn test_max_joins_setting() {
    let mut settings = Settings::default();
    settings.planner.max_joins = 0;
    let err = common::pipeline_with(settings, &common::shop_snapshot())
        .plan("покажи клиентов и заказы")
        .unwrap_err();
    assert!(matches!(
        err,
        nl2sql::compile::CompileError::Plan(PlanError::PlanInconsistency { .. })
    ));
}

// ============================================================================
// Provenance
// ============================================================================

#[test]
fn test_plan_keeps_provenance() {
    let plan = common::pipeline(&orders())
        .plan("Количество заказов")
        .unwrap()
        .plan;
    assert_eq!(plan.original_text, "Количество заказов");
    assert_eq!(plan.normalized_text, "количество заказы");
    assert_eq!(plan.language, Language::Russian);
    assert_eq!(plan.confidence, 0.5);
}

#[test]
fn test_planning_is_deterministic() {
    let pipeline = common::pipeline(&common::shop_snapshot());
    let a = pipeline.plan("топ 5 клиентов по выручке").unwrap();
    let b = pipeline.plan("топ 5 клиентов по выручке").unwrap();
    assert_eq!(a.plan, b.plan);
}
