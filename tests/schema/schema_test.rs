//! Integration tests for snapshot ingestion, indexing and schema swaps.

#[path = "../common/mod.rs"]
mod common;

use std::io::Write;

use nl2sql::joins::Cardinality;
use nl2sql::schema::{
    BusinessGlossary, ColumnSnapshot, GlossaryEntry, SchemaError, SchemaHandle, SchemaIndex,
    SchemaSnapshot, SchemaVersion, SemanticTag, TableSnapshot,
};

// ============================================================================
// Snapshot Ingestion
// ============================================================================

#[test]
fn test_snapshot_from_json_file() {
    let json = r#"{
        "tables": {
            "customers": {
                "columns": [
                    {"name": "id", "type": "integer", "pk": true, "nullable": false},
                    {"name": "email", "type": "varchar(255)"}
                ]
            },
            "orders": {
                "columns": [
                    {"name": "id", "type": "integer", "pk": true},
                    {"name": "customer_id", "type": "integer"},
                    {"name": "total", "type": "numeric", "tags": ["money"]}
                ]
            }
        },
        "fks": [{"from": "orders.customer_id", "to": "customers.id"}]
    }"#;

    let dir = std::env::temp_dir().join(format!("nl2sql-schema-test-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("snapshot.json");
    std::fs::File::create(&path)
        .unwrap()
        .write_all(json.as_bytes())
        .unwrap();

    let snapshot = SchemaSnapshot::from_path(&path).unwrap();
    let index = SchemaIndex::build(&snapshot, BusinessGlossary::new()).unwrap();

    assert!(index.has_table("customers"));
    assert!(index.has_column("orders", "total"));
    assert_eq!(index.foreign_keys().len(), 1);
    assert_eq!(index.foreign_keys()[0].cardinality, Cardinality::ManyToOne);

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_missing_snapshot_file_is_io_error() {
    let err = SchemaSnapshot::from_path("/definitely/not/here/schema.json").unwrap_err();
    assert!(matches!(err, SchemaError::Io { .. }));
}

#[test]
fn test_malformed_fk_reference() {
    let snapshot = common::single_table("orders", &[("id", "integer")]).foreign_key("orders", "x.id");
    let err = SchemaIndex::build(&snapshot, BusinessGlossary::new()).unwrap_err();
    assert!(matches!(err, SchemaError::InvalidReference(r) if r == "orders"));
}

// ============================================================================
// Index Build
// ============================================================================

#[test]
fn test_tables_are_sorted_by_name() {
    let index = common::shop_version().index;
    let names: Vec<&str> = index.table_names().collect();
    assert_eq!(names, vec!["audit_log", "customers", "order_items", "orders", "products"]);
}

#[test]
fn test_inferred_tags() {
    let index = common::shop_version().index;

    let tags = |table: &str, column: &str| index.column(table, column).unwrap().tags;
    assert!(tags("customers", "id").contains(SemanticTag::Identifier));
    assert!(tags("customers", "email").contains(SemanticTag::Contact));
    assert!(tags("orders", "amount").contains(SemanticTag::Money));
    assert!(tags("orders", "created_at").contains(SemanticTag::Date));
    assert!(tags("orders", "status").contains(SemanticTag::Category));
    assert!(tags("orders", "customer_id").contains(SemanticTag::Identifier));
}

#[test]
fn test_explicit_tags_replace_inference() {
    let snapshot = SchemaSnapshot::new().table(
        "payments",
        TableSnapshot::new()
            .column(ColumnSnapshot::new("id", "integer").primary_key())
            .column(ColumnSnapshot::new("value", "integer").tags(&["money"])),
    );
    let index = SchemaIndex::build(&snapshot, BusinessGlossary::new()).unwrap();
    let value = index.column("payments", "value").unwrap();
    assert!(value.tags.contains(SemanticTag::Money));
    assert!(!value.tags.contains(SemanticTag::Number));
}

#[test]
fn test_unknown_fk_targets_are_skipped() {
    let snapshot = common::shop_snapshot().foreign_key("orders.coupon_id", "coupons.id");
    let index = SchemaIndex::build(&snapshot, BusinessGlossary::new()).unwrap();
    assert_eq!(index.foreign_keys().len(), 3);
    assert_eq!(index.skipped_foreign_keys(), ["orders.coupon_id -> coupons.id"]);
}

#[test]
fn test_snapshot_glossary_merges_over_defaults() {
    let snapshot = common::shop_snapshot().glossary_entry(
        "выручка",
        GlossaryEntry {
            definition: "SUM(orders.amount)".to_string(),
            related_columns: vec!["amount".to_string()],
            ..GlossaryEntry::default()
        },
    );
    let version = SchemaVersion::build(&snapshot, BusinessGlossary::with_defaults()).unwrap();
    let term = version.index.glossary().get("выручка").unwrap();
    assert_eq!(term.definition, "SUM(orders.amount)");
    assert_eq!(version.index.glossary().len(), 8);
}

#[test]
fn test_closest_name_hints() {
    let index = common::shop_version().index;
    assert_eq!(index.closest_table("ordrs"), Some("orders"));
    assert_eq!(
        index.closest_column("orders", "ammount"),
        Some("orders.amount".to_string())
    );
}

// ============================================================================
// Schema Handle
// ============================================================================

#[test]
fn test_fingerprint_is_stable_and_content_based() {
    let a = common::shop_version();
    let b = common::shop_version();
    assert_eq!(a.fingerprint, b.fingerprint);

    let other = SchemaVersion::build(
        &common::single_table("orders", &[("id", "integer")]),
        BusinessGlossary::with_defaults(),
    )
    .unwrap();
    assert_ne!(a.fingerprint, other.fingerprint);
}

#[test]
fn test_swap_keeps_in_flight_version() {
    let handle = SchemaHandle::new(common::shop_version());
    let before = handle.current();

    handle
        .reload(
            &common::single_table("invoices", &[("id", "integer")]),
            BusinessGlossary::new(),
        )
        .unwrap();

    assert!(before.index.has_table("orders"));
    assert!(handle.current().index.has_table("invoices"));
    assert!(!handle.current().index.has_table("orders"));
}

#[test]
fn test_concurrent_readers_see_whole_versions() {
    let handle = SchemaHandle::new(common::shop_version());
    let readers: Vec<_> = (0..4)
        .map(|_| {
            let handle = handle.clone();
            std::thread::spawn(move || {
                for _ in 0..50 {
                    let version = handle.current();
                    let tables = version.index.table_names().count();
                    assert!(tables == 5 || tables == 1, "saw {tables} tables");
                }
            })
        })
        .collect();

    handle
        .reload(
            &common::single_table("invoices", &[("id", "integer")]),
            BusinessGlossary::new(),
        )
        .unwrap();

    for reader in readers {
        reader.join().unwrap();
    }
}
