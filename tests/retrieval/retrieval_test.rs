//! Integration tests for scoped schema retrieval.

#[path = "../common/mod.rs"]
mod common;

use nl2sql::config::RetrievalSettings;
use nl2sql::retrieval::{EntryRef, IndexKind, ResultKind, Retriever, SearchScope};
use nl2sql::schema::SchemaVersion;

fn column(table: &str, column: &str) -> EntryRef {
    EntryRef::Column {
        table: table.to_string(),
        column: column.to_string(),
    }
}

fn with_retriever<R>(settings: RetrievalSettings, f: impl FnOnce(&Retriever<'_>) -> R) -> R {
    let version: SchemaVersion = common::shop_version();
    let retriever = Retriever::new(&version.index, &settings);
    f(&retriever)
}

// ============================================================================
// Table Scope
// ============================================================================

#[test]
fn test_exact_table_name_ranks_first() {
    with_retriever(RetrievalSettings::default(), |r| {
        let results = r.search("orders", SearchScope::Tables, 5);
        assert_eq!(results[0].entry, EntryRef::Table("orders".into()));
        assert_eq!(results[0].kind, ResultKind::Table);
        assert_eq!(results[0].score, 1.0);
    });
}

#[test]
fn test_singular_matches_plural_table() {
    with_retriever(RetrievalSettings::default(), |r| {
        let results = r.search("customer", SearchScope::Tables, 5);
        assert_eq!(results[0].entry, EntryRef::Table("customers".into()));
    });
}

#[test]
fn test_table_names_helper() {
    with_retriever(RetrievalSettings::default(), |r| {
        let names = r.table_names("products", 1);
        assert_eq!(names, vec!["products".to_string()]);
    });
}

// ============================================================================
// Column Scope
// ============================================================================

#[test]
fn test_column_name_hit() {
    with_retriever(RetrievalSettings::default(), |r| {
        let results = r.search("amount", SearchScope::Columns, 10);
        assert_eq!(results[0].entry, column("orders", "amount"));
        assert_eq!(results[0].content, "Column: orders.amount (numeric(12,2))");
    });
}

#[test]
fn test_column_type_hit() {
    with_retriever(RetrievalSettings::default(), |r| {
        let results = r.search("timestamp", SearchScope::Columns, 10);
        assert_eq!(results[0].entry, column("orders", "created_at"));
    });
}

#[test]
fn test_column_tag_hit() {
    with_retriever(RetrievalSettings::default(), |r| {
        let results = r.search("money", SearchScope::Columns, 10);
        let entries: Vec<&EntryRef> = results.iter().map(|h| &h.entry).collect();
        assert!(entries.contains(&&column("orders", "amount")));
        assert!(entries.contains(&&column("customers", "revenue")));
        assert!(!entries.contains(&&column("customers", "email")));
    });
}

// ============================================================================
// Relationships, Terms and Unified
// ============================================================================

#[test]
fn test_relationship_by_key_column() {
    with_retriever(RetrievalSettings::default(), |r| {
        let results = r.search("customer_id", SearchScope::Relationships, 5);
        assert_eq!(results[0].entry, EntryRef::Relationship(0));
        assert_eq!(results[0].content, "Relationship: orders.customer_id -> customers.id");
    });
}

#[test]
fn test_relationship_by_partial_name() {
    with_retriever(RetrievalSettings::default(), |r| {
        let results = r.search("item", SearchScope::Relationships, 5);
        let mut entries: Vec<_> = results.iter().map(|h| h.entry.clone()).collect();
        entries.sort_by_key(|e| format!("{e:?}"));
        assert_eq!(
            entries,
            vec![EntryRef::Relationship(1), EntryRef::Relationship(2)]
        );

        let results = r.search("cust", SearchScope::Relationships, 5);
        assert_eq!(results[0].content, "Relationship: orders.customer_id -> customers.id");
        assert_eq!(results.len(), 1);
    });
}

#[test]
fn test_relationship_exact_name_outranks_fragment() {
    with_retriever(RetrievalSettings::default(), |r| {
        let exact = r.search("order_items", SearchScope::Relationships, 1);
        let partial = r.search("item", SearchScope::Relationships, 1);
        assert_eq!(exact[0].entry, EntryRef::Relationship(1));
        assert_eq!(partial[0].entry, EntryRef::Relationship(1));
        assert!(exact[0].score > partial[0].score);
    });
}

#[test]
fn test_business_term_exact() {
    with_retriever(RetrievalSettings::default(), |r| {
        let results = r.search("выручка", SearchScope::BusinessTerms, 3);
        assert_eq!(results[0].entry, EntryRef::BusinessTerm("выручка".into()));
        assert_eq!(results[0].score, 1.0);
    });
}

#[test]
fn test_unified_respects_min_score() {
    let settings = RetrievalSettings::default();
    let min_score = settings.min_score;
    with_retriever(settings, |r| {
        let results = r.search("orders amount", SearchScope::Unified, 20);
        assert!(!results.is_empty());
        assert!(results.iter().all(|h| h.score >= min_score && h.score <= 1.0));
    });
}

// ============================================================================
// Ranking Properties
// ============================================================================

#[test]
fn test_results_sorted_and_limited() {
    with_retriever(RetrievalSettings::default(), |r| {
        for scope in [
            SearchScope::Tables,
            SearchScope::Columns,
            SearchScope::Relationships,
            SearchScope::BusinessTerms,
            SearchScope::Unified,
        ] {
            let results = r.search("orders customers amount id", scope, 3);
            assert!(results.len() <= 3, "{scope:?} returned {}", results.len());
            assert!(results.windows(2).all(|w| w[0].score >= w[1].score));
            assert!(results.iter().all(|h| h.score > 0.0));
        }
    });
}

#[test]
fn test_no_hits_for_unrelated_text() {
    with_retriever(RetrievalSettings::default(), |r| {
        assert!(r.search("", SearchScope::Tables, 5).is_empty());
        assert!(r.search("погода", SearchScope::Columns, 5).is_empty());
    });
}

#[test]
fn test_search_is_deterministic() {
    with_retriever(RetrievalSettings::default(), |r| {
        let a = r.search("orders amount created_at", SearchScope::Unified, 10);
        let b = r.search("orders amount created_at", SearchScope::Unified, 10);
        assert_eq!(a, b);
    });
}

#[test]
fn test_keyword_index_strategy() {
    let settings = RetrievalSettings {
        index: IndexKind::Keyword,
        ..RetrievalSettings::default()
    };
    with_retriever(settings, |r| {
        let results = r.search("orders", SearchScope::Tables, 5);
        assert_eq!(results[0].entry, EntryRef::Table("orders".into()));
    });
}

// ============================================================================
// Table Context
// ============================================================================

#[test]
fn test_table_context() {
    with_retriever(RetrievalSettings::default(), |r| {
        let context = r.table_context("orders").unwrap();
        assert_eq!(context.table.name, "orders");
        assert!(context.related_tables.contains(&"customers"));
        assert!(context.related_tables.contains(&"order_items"));
        assert!(context.terms.iter().any(|t| t.term == "заказы"));
        assert!(context.terms.iter().any(|t| t.term == "выручка"));

        assert!(r.table_context("missing").is_none());
    });
}

#[test]
fn test_suggest_joins_between_direct_neighbours() {
    with_retriever(RetrievalSettings::default(), |r| {
        let joins = r.suggest_joins(&["customers".to_string(), "orders".to_string()]);
        assert_eq!(joins.len(), 1);
        assert_eq!(joins[0].condition(), "customers.id = orders.customer_id");

        let none = r.suggest_joins(&["customers".to_string(), "products".to_string()]);
        assert!(none.is_empty());
    });
}
