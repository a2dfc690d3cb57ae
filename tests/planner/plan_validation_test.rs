//! Integration tests for checking hand-built plans against a schema.

#[path = "../common/mod.rs"]
mod common;

use nl2sql::joins::{Cardinality, JoinSpec};
use nl2sql::planner::{
    AggregationFunction, AggregationSpec, ColumnReference, FilterCondition, FilterOperator,
    PlanError, QueryPlan, SortSpec,
};
use nl2sql::schema::SchemaIndex;

fn index() -> SchemaIndex {
    common::shop_version().index
}

fn orders(column: &str) -> ColumnReference {
    ColumnReference::new("orders", column)
}

fn orders_to_customers() -> JoinSpec {
    JoinSpec::new("orders", "customer_id", "customers", "id", Cardinality::ManyToOne)
}

fn expect_mismatch(plan: &QueryPlan) -> String {
    match plan.validate(&index(), 5) {
        Err(PlanError::SchemaMismatch { reason, .. }) => reason,
        other => panic!("expected a schema mismatch, got {other:?}"),
    }
}

fn expect_inconsistency(plan: &QueryPlan, max_joins: usize) -> String {
    match plan.validate(&index(), max_joins) {
        Err(PlanError::PlanInconsistency { reason, .. }) => reason,
        other => panic!("expected an inconsistent plan, got {other:?}"),
    }
}

#[test]
fn test_valid_grouped_plan() {
    let mut plan = QueryPlan::new("orders");
    plan.joins.push(orders_to_customers());
    plan.select_columns.push(ColumnReference::new("customers", "name"));
    plan.aggregations
        .push(AggregationSpec::new(AggregationFunction::Sum, orders("amount")));
    plan.group_by.push(ColumnReference::new("customers", "name"));
    plan.filters.push(
        FilterCondition::compare(orders("status"), FilterOperator::Eq, "paid").unwrap(),
    );
    plan.order_by.push(SortSpec::desc(orders("amount")));

    assert!(plan.validate(&index(), 5).is_ok());
    assert_eq!(
        plan.referenced_columns(),
        vec![
            "customers.name",
            "orders.amount",
            "orders.status",
            "orders.customer_id",
            "customers.id",
        ]
    );
}

#[test]
fn test_unknown_from_table_has_hint() {
    let plan = QueryPlan::new("ordrs");
    assert_eq!(
        expect_mismatch(&plan),
        "table 'ordrs' does not exist (did you mean 'orders'?)"
    );
}

#[test]
fn test_unknown_column_has_hint() {
    let mut plan = QueryPlan::new("orders");
    plan.select_columns.push(orders("ammount"));
    let reason = expect_mismatch(&plan);
    assert!(reason.contains("orders.ammount"), "{reason}");
    assert!(reason.ends_with("(did you mean 'orders.amount'?)"), "{reason}");
}

#[test]
fn test_unknown_join_column() {
    let mut plan = QueryPlan::new("orders");
    plan.joins.push(JoinSpec::new(
        "orders",
        "client_id",
        "customers",
        "id",
        Cardinality::ManyToOne,
    ));
    let reason = expect_mismatch(&plan);
    assert!(reason.starts_with("join column 'orders.client_id' does not exist"), "{reason}");
}

#[test]
fn test_join_limit() {
    let mut plan = QueryPlan::new("orders");
    plan.joins.push(orders_to_customers());
    assert_eq!(expect_inconsistency(&plan, 0), "1 joins exceed the limit of 0");
}

#[test]
fn test_dangling_join() {
    let mut plan = QueryPlan::new("products");
    plan.joins.push(orders_to_customers());
    let reason = expect_inconsistency(&plan, 5);
    assert!(reason.contains("not joined yet"), "{reason}");
}

#[test]
fn test_table_joined_twice() {
    let mut plan = QueryPlan::new("orders");
    plan.joins.push(orders_to_customers());
    plan.joins.push(JoinSpec::new(
        "customers",
        "id",
        "orders",
        "customer_id",
        Cardinality::OneToMany,
    ));
    let reason = expect_inconsistency(&plan, 5);
    assert!(reason.contains("'orders' is joined more than once"), "{reason}");
}

#[test]
fn test_column_outside_from_and_joins() {
    let mut plan = QueryPlan::new("orders");
    plan.select_columns.push(ColumnReference::new("customers", "name"));
    let reason = expect_inconsistency(&plan, 5);
    assert!(reason.contains("not in FROM or JOIN"), "{reason}");
}

#[test]
fn test_mixed_aggregation_needs_group_by() {
    let mut plan = QueryPlan::new("orders");
    plan.select_columns.push(orders("status"));
    plan.aggregations
        .push(AggregationSpec::new(AggregationFunction::Count, orders("id")));
    let reason = expect_inconsistency(&plan, 5);
    assert!(reason.starts_with("GROUP BY is required"), "{reason}");

    plan.group_by.push(orders("status"));
    assert!(plan.validate(&index(), 5).is_ok());
}

#[test]
fn test_error_keeps_partial_plan() {
    let mut plan = QueryPlan::new("orders");
    plan.select_columns.push(orders("nope"));
    let err = plan.validate(&index(), 5).unwrap_err();
    assert_eq!(err.plan(), &plan);
}
