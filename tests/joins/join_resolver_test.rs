//! Integration tests for join path resolution over the foreign-key graph.

#[path = "../common/mod.rs"]
mod common;

use nl2sql::joins::{optimize_join_order, Cardinality, JoinGraph, JoinIssue, JoinKind, JoinSpec};
use nl2sql::schema::{BusinessGlossary, SchemaIndex};

fn graph() -> JoinGraph {
    common::shop_version().join_graph
}

#[test]
fn test_direct_join_customers_orders() {
    let path = graph().find_join_path("customers", "orders").unwrap();
    assert_eq!(path.from_table, "customers");
    assert_eq!(path.to_table, "orders");
    assert_eq!(path.cost(), 1);
    assert_eq!(path.joins.len(), 1);

    let join = &path.joins[0];
    assert_eq!(join.kind, JoinKind::Inner);
    assert_eq!(join.condition(), "customers.id = orders.customer_id");
    assert_eq!(join.cardinality, Cardinality::OneToMany);
}

#[test]
fn test_forward_hop_keeps_fk_direction() {
    let path = graph().find_join_path("orders", "customers").unwrap();
    assert_eq!(path.joins[0].condition(), "orders.customer_id = customers.id");
    assert_eq!(path.joins[0].cardinality, Cardinality::ManyToOne);
}

#[test]
fn test_multi_hop_path_and_confidence() {
    let path = graph().find_join_path("customers", "products").unwrap();
    assert_eq!(path.tables(), vec!["customers", "orders", "order_items", "products"]);
    assert_eq!(path.cost(), path.joins.len());
    assert!((path.confidence - 1.0 / 1.3).abs() < 1e-9);
}

#[test]
fn test_unreachable_and_unknown_tables() {
    let g = graph();
    assert!(g.find_join_path("orders", "audit_log").is_none());
    assert!(g.find_join_path("orders", "nope").is_none());

    let same = g.find_join_path("orders", "orders").unwrap();
    assert!(same.is_empty());
    assert_eq!(same.confidence, 1.0);
}

#[test]
fn test_every_hop_follows_a_declared_key() {
    let g = graph();
    let path = g.find_join_path("products", "customers").unwrap();
    for join in &path.joins {
        assert!(
            g.has_edge(&join.left_table, &join.left_column, &join.right_table, &join.right_column),
            "no edge for {}",
            join.condition()
        );
    }
}

#[test]
fn test_resolve_multi_table_reports_unreachable() {
    let tables = vec![
        "customers".to_string(),
        "products".to_string(),
        "audit_log".to_string(),
    ];
    let multi = graph().resolve_multi_table(&tables);
    assert_eq!(multi.unreachable, vec!["audit_log".to_string()]);
    assert!(!multi.is_complete());
    assert_eq!(multi.joins.len(), 3);
    assert_eq!(multi.connected, vec!["customers", "orders", "order_items", "products"]);
}

#[test]
fn test_resolved_joins_validate() {
    let g = graph();
    let tables = vec!["orders".to_string(), "customers".to_string(), "products".to_string()];
    let multi = g.resolve_multi_table(&tables);
    assert!(multi.is_complete());
    assert!(g.validate_joins(&multi.joins, Some("orders")).is_ok());
}

#[test]
fn test_validate_flags_unknown_column() {
    let joins = vec![JoinSpec::new(
        "orders",
        "client_id",
        "customers",
        "id",
        Cardinality::ManyToOne,
    )];
    let issues = graph().validate_joins(&joins, Some("orders")).unwrap_err();
    assert_eq!(
        issues,
        vec![JoinIssue::UnknownColumn {
            table: "orders".into(),
            column: "client_id".into()
        }]
    );
}

#[test]
fn test_validate_flags_cycle() {
    let joins = vec![
        JoinSpec::new("orders", "customer_id", "customers", "id", Cardinality::ManyToOne),
        JoinSpec::new("customers", "id", "orders", "customer_id", Cardinality::OneToMany),
    ];
    let issues = graph().validate_joins(&joins, Some("orders")).unwrap_err();
    assert!(issues.iter().any(|i| matches!(i, JoinIssue::Cycle { .. })));
}

#[test]
fn test_optimize_join_order_puts_many_to_one_first() {
    let joins = vec![
        JoinSpec::new("orders", "id", "order_items", "order_id", Cardinality::OneToMany),
        JoinSpec::new("orders", "customer_id", "customers", "id", Cardinality::ManyToOne),
    ];
    let ordered = optimize_join_order(&joins);
    assert_eq!(ordered[0].right_table, "customers");
    assert_eq!(ordered[1].right_table, "order_items");
}

#[test]
fn test_graph_from_index_counts() {
    let index = SchemaIndex::build(&common::shop_snapshot(), BusinessGlossary::new()).unwrap();
    let g = JoinGraph::from_index(&index);
    assert_eq!(g.table_count(), 5);
    assert_eq!(g.edge_count(), 3);
    assert!(g.has_table("audit_log"));
    assert!(g.has_column("orders", "customer_id"));
}
