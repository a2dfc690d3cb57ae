//! Integration tests for rendering query plans as SQL.

#[path = "../common/mod.rs"]
mod common;

use insta::assert_snapshot;
use nl2sql::generator::{GenerateError, GeneratorOptions, SqlGenerator};
use nl2sql::joins::{Cardinality, JoinSpec};
use nl2sql::normalizer::{DateExpr, DateUnit};
use nl2sql::planner::{
    AggregationFunction, AggregationSpec, ColumnReference, FilterCondition, FilterOperator,
    QueryPlan, SortSpec,
};
use nl2sql::sql::Dialect;
use sqlparser::dialect::{MsSqlDialect, MySqlDialect, PostgreSqlDialect, SnowflakeDialect};
use sqlparser::parser::Parser;

/// Revenue per customer over the last 30 days.
fn revenue_by_customer() -> QueryPlan {
    let mut plan = QueryPlan::new("orders");
    plan.joins.push(JoinSpec::new(
        "orders",
        "customer_id",
        "customers",
        "id",
        Cardinality::ManyToOne,
    ));
    plan.select_columns.push(ColumnReference::new("customers", "name"));
    plan.aggregations.push(AggregationSpec::new(
        AggregationFunction::Sum,
        ColumnReference::new("orders", "amount"),
    ));
    plan.filters.push(
        FilterCondition::compare(
            ColumnReference::new("orders", "created_at"),
            FilterOperator::GtEq,
            DateExpr::past(30, DateUnit::Day),
        )
        .unwrap(),
    );
    plan.group_by.push(ColumnReference::new("customers", "name"));
    plan.order_by.push(SortSpec::asc(ColumnReference::new("customers", "name")));
    plan.limit = Some(10);
    plan
}

fn render(plan: &QueryPlan, dialect: Dialect) -> String {
    SqlGenerator::default().generate(plan, dialect).unwrap().sql
}

fn parses(sql: &str, dialect: Dialect) -> bool {
    let result = match dialect {
        Dialect::MySql => Parser::parse_sql(&MySqlDialect {}, sql),
        Dialect::Snowflake => Parser::parse_sql(&SnowflakeDialect {}, sql),
        Dialect::TSql => Parser::parse_sql(&MsSqlDialect {}, sql),
        _ => Parser::parse_sql(&PostgreSqlDialect {}, sql),
    };
    result.is_ok()
}

// ============================================================================
// Dialect Rendering
// ============================================================================

#[test]
fn test_postgres() {
    let sql = render(&revenue_by_customer(), Dialect::Postgres);
    assert_snapshot!(sql, @"SELECT customers.name, SUM(orders.amount) AS sum_amount FROM orders INNER JOIN customers ON orders.customer_id = customers.id WHERE orders.created_at >= CURRENT_DATE - INTERVAL '30 days' GROUP BY customers.name ORDER BY customers.name ASC LIMIT 10");
    assert!(parses(&sql, Dialect::Postgres));
}

#[test]
fn test_mysql() {
    let sql = render(&revenue_by_customer(), Dialect::MySql);
    assert_snapshot!(sql, @"SELECT customers.name, SUM(orders.amount) AS sum_amount FROM orders INNER JOIN customers ON orders.customer_id = customers.id WHERE orders.created_at >= DATE_SUB(CURDATE(), INTERVAL 30 DAY) GROUP BY customers.name ORDER BY customers.name ASC LIMIT 10");
    assert!(parses(&sql, Dialect::MySql));
}

#[test]
fn test_snowflake() {
    let sql = render(&revenue_by_customer(), Dialect::Snowflake);
    assert_snapshot!(sql, @"SELECT customers.name, SUM(orders.amount) AS sum_amount FROM orders INNER JOIN customers ON orders.customer_id = customers.id WHERE orders.created_at >= DATEADD(day, -30, CURRENT_DATE()) GROUP BY customers.name ORDER BY customers.name ASC LIMIT 10");
    assert!(parses(&sql, Dialect::Snowflake));
}

#[test]
fn test_tsql() {
    let sql = render(&revenue_by_customer(), Dialect::TSql);
    assert_snapshot!(sql, @"SELECT customers.name, SUM(orders.amount) AS sum_amount FROM orders INNER JOIN customers ON orders.customer_id = customers.id WHERE orders.created_at >= DATEADD(day, -30, CAST(GETDATE() AS DATE)) GROUP BY customers.name ORDER BY customers.name ASC OFFSET 0 ROWS FETCH NEXT 10 ROWS ONLY");
    assert!(parses(&sql, Dialect::TSql));
}

#[test]
fn test_table_aliases() {
    let options = GeneratorOptions {
        use_table_aliases: true,
        ..GeneratorOptions::default()
    };
    let generated = SqlGenerator::new(options)
        .generate(&revenue_by_customer(), Dialect::Postgres)
        .unwrap();
    assert_snapshot!(generated.sql, @"SELECT c.name, SUM(o.amount) AS sum_amount FROM orders AS o INNER JOIN customers AS c ON o.customer_id = c.id WHERE o.created_at >= CURRENT_DATE - INTERVAL '30 days' GROUP BY c.name ORDER BY c.name ASC LIMIT 10");
    assert_eq!(
        generated.table_aliases,
        vec![
            ("orders".to_string(), "o".to_string()),
            ("customers".to_string(), "c".to_string()),
        ]
    );
}

// ============================================================================
// Metadata
// ============================================================================

#[test]
fn test_generated_metadata() {
    let generated = SqlGenerator::default()
        .generate(&revenue_by_customer(), Dialect::Postgres)
        .unwrap();
    assert_eq!(generated.dialect, Dialect::Postgres);
    assert_eq!(generated.referenced_tables, vec!["orders", "customers"]);
    assert_eq!(
        generated.referenced_columns,
        vec![
            "customers.name",
            "orders.amount",
            "orders.created_at",
            "orders.customer_id",
            "customers.id",
        ]
    );
    assert_eq!(generated.stats.join_count, 1);
    assert_eq!(generated.stats.filter_count, 1);
    assert_eq!(generated.stats.aggregation_count, 1);
    // select 1 + aggregation 2 + join 3 + filter 1 + group 1 + order 1 + limit 1
    assert_eq!(generated.complexity_score, 10);
}

// ============================================================================
// Join Re-validation
// ============================================================================

#[test]
fn test_joins_checked_against_foreign_keys() {
    let version = common::shop_version();
    let generator = SqlGenerator::default().with_join_graph(&version.join_graph);
    assert!(generator
        .generate(&revenue_by_customer(), Dialect::Postgres)
        .is_ok());

    let mut plan = QueryPlan::new("orders");
    plan.select_columns.push(ColumnReference::new("orders", "id"));
    plan.joins.push(JoinSpec::new(
        "orders",
        "id",
        "customers",
        "id",
        Cardinality::OneToOne,
    ));
    let err = generator.generate(&plan, Dialect::Postgres).unwrap_err();
    let GenerateError::UnresolvableJoin { reason, .. } = &err else {
        panic!("expected an unresolvable join, got {err:?}");
    };
    assert_eq!(reason, "no foreign key matches orders.id = customers.id");
}

#[test]
fn test_output_is_stable_across_runs() {
    let plan = revenue_by_customer();
    for dialect in Dialect::ALL {
        assert_eq!(render(&plan, dialect), render(&plan, dialect));
    }
}
