//! End-to-end compilation from question text to SQL.

#[path = "../common/mod.rs"]
mod common;

use nl2sql::compile::{self, CompileError};
use nl2sql::config::Settings;
use nl2sql::normalizer::Intent;
use nl2sql::planner::PlanWarning;
use nl2sql::schema::{BusinessGlossary, SchemaSnapshot};
use nl2sql::sql::Dialect;

fn customers() -> SchemaSnapshot {
    common::single_table(
        "customers",
        &[("id", "integer"), ("name", "varchar(100)"), ("email", "varchar(255)")],
    )
}

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

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn test_show_all_customers() {
    let output = common::pipeline(&customers())
        .compile("покажи всех клиентов", Dialect::Postgres)
        .unwrap();
    assert_eq!(output.plan.from_table, "customers");
    assert!(output.plan.aggregations.is_empty());
    assert_eq!(
        output.generated.sql,
        "SELECT customers.id, customers.name, customers.email FROM customers LIMIT 100"
    );
}

#[test]
fn test_count_orders() {
    let output = common::pipeline(&orders())
        .compile("количество заказов", Dialect::Postgres)
        .unwrap();
    assert_eq!(output.plan.intent, Intent::Count);
    assert_eq!(
        output.generated.sql,
        "SELECT COUNT(orders.id) AS count FROM orders LIMIT 100"
    );
}

#[test]
fn test_top_customers_by_revenue() {
    let snapshot = common::single_table(
        "customers",
        &[
            ("id", "integer"),
            ("name", "varchar(100)"),
            ("revenue", "numeric(12,2)"),
        ],
    );
    let output = common::pipeline(&snapshot)
        .compile("топ 3 клиента по выручке", Dialect::Postgres)
        .unwrap();
    assert_eq!(output.plan.limit, Some(3));
    assert!(
        output.generated.sql.ends_with("ORDER BY customers.revenue DESC LIMIT 3"),
        "{}",
        output.generated.sql
    );
}

#[test]
fn test_customers_to_orders_join() {
    let path = common::shop_version()
        .join_graph
        .find_join_path("customers", "orders")
        .unwrap();
    assert_eq!(path.joins.len(), 1);
    assert_eq!(path.joins[0].condition(), "customers.id = orders.customer_id");
}

#[test]
fn test_last_seven_days_per_dialect() {
    let pipeline = common::pipeline(&orders());

    let pg = pipeline
        .compile("заказы за последние 7 дней", Dialect::Postgres)
        .unwrap();
    assert_eq!(
        pg.generated.sql,
        "SELECT orders.id, orders.amount, orders.created_at FROM orders \
         WHERE orders.created_at >= CURRENT_DATE - INTERVAL '7 days' LIMIT 100"
    );
    assert!(pg
        .warnings
        .iter()
        .any(|w| matches!(w, PlanWarning::NormalizationAmbiguity { .. })));

    let my = pipeline
        .compile("заказы за последние 7 дней", Dialect::MySql)
        .unwrap();
    assert!(
        my.generated
            .sql
            .contains("orders.created_at >= DATE_SUB(CURDATE(), INTERVAL 7 DAY)"),
        "{}",
        my.generated.sql
    );
    assert_eq!(pg.plan, my.plan);
}

// ============================================================================
// Pipeline Behaviour
// ============================================================================

#[test]
fn test_join_question_end_to_end() {
    let output = common::pipeline(&common::shop_snapshot())
        .compile("покажи клиентов и заказы", Dialect::Postgres)
        .unwrap();
    assert!(output.generated.sql.contains(" INNER JOIN "), "{}", output.generated.sql);
    assert_eq!(output.generated.stats.join_count, 1);
}

#[test]
fn test_failure_carries_partial_plan() {
    let err = common::pipeline(&orders())
        .compile("погода в алматы", Dialect::Postgres)
        .unwrap_err();
    assert!(matches!(err, CompileError::Plan(_)));
    let plan = err.plan().expect("planning errors carry the plan");
    assert_eq!(plan.original_text, "погода в алматы");
}

#[test]
fn test_compile_default_uses_configured_dialect() {
    let mut settings = Settings::default();
    settings.sql.dialect = Dialect::MySql;
    let output = common::pipeline_with(settings, &orders())
        .compile_default("заказы за последние 7 дней")
        .unwrap();
    assert_eq!(output.generated.dialect, Dialect::MySql);
}

#[test]
fn test_fingerprint_depends_on_dialect_and_schema() {
    let pipeline = common::pipeline(&orders());
    let a = pipeline.compile("количество заказов", Dialect::Postgres).unwrap();
    let b = pipeline.compile("количество заказов", Dialect::Postgres).unwrap();
    let c = pipeline.compile("количество заказов", Dialect::MySql).unwrap();
    assert_eq!(a.fingerprint, b.fingerprint);
    assert_ne!(a.fingerprint, c.fingerprint);

    pipeline
        .schema()
        .reload(&common::shop_snapshot(), BusinessGlossary::with_defaults())
        .unwrap();
    let d = pipeline.compile("количество заказов", Dialect::Postgres).unwrap();
    assert_ne!(a.fingerprint, d.fingerprint);
}

#[test]
fn test_free_functions() {
    let generated = compile::compile("количество заказов", &orders(), Dialect::DuckDb).unwrap();
    assert_eq!(generated.dialect, Dialect::DuckDb);

    let results = compile::retrieve("orders amount", &orders()).unwrap();
    assert!(!results.is_empty());

    let outcome = compile::plan("количество заказов", &orders()).unwrap();
    assert_eq!(outcome.plan.intent, Intent::Count);

    assert_eq!(compile::normalize("Количество заказов").normalized, "количество заказы");
}

#[test]
fn test_compilation_is_deterministic() {
    let pipeline = common::pipeline(&common::shop_snapshot());
    for dialect in Dialect::ALL {
        let a = pipeline.compile("топ 5 клиентов по выручке", dialect);
        let b = pipeline.compile("топ 5 клиентов по выручке", dialect);
        match (a, b) {
            (Ok(a), Ok(b)) => assert_eq!(a.generated.sql, b.generated.sql),
            (Err(a), Err(b)) => assert_eq!(a.to_string(), b.to_string()),
            _ => panic!("{dialect} gave different outcomes"),
        }
    }
}
