//! Read-only schema index built from a snapshot.

use std::collections::BTreeMap;

use serde::Serialize;

use super::glossary::BusinessGlossary;
use super::snapshot::{ForeignKeySnapshot, SchemaSnapshot};
use super::tags::{infer_tags, TagSet};
use super::SchemaError;
use crate::joins::Cardinality;

/// A table with its columns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableEntry {
    pub name: String,
    pub schema: Option<String>,
    pub description: String,
    pub columns: Vec<ColumnEntry>,
    pub row_count: Option<u64>,
}

impl TableEntry {
    pub fn column(&self, name: &str) -> Option<&ColumnEntry> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    pub fn primary_key(&self) -> Option<&ColumnEntry> {
        self.columns.iter().find(|c| c.primary_key)
    }

    /// Text used to index this table for retrieval.
    pub fn document(&self) -> String {
        let columns: Vec<&str> = self.column_names().collect();
        format!(
            "table {} {} columns: {}",
            self.name,
            self.description,
            columns.join(" ")
        )
    }
}

/// A column with its semantic tags.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnEntry {
    pub table: String,
    pub name: String,
    pub data_type: String,
    pub tags: TagSet,
    pub nullable: bool,
    pub primary_key: bool,
    pub default: Option<String>,
    pub description: String,
}

impl ColumnEntry {
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.table, self.name)
    }

    /// Text used to index this column for retrieval.
    pub fn document(&self) -> String {
        format!(
            "column {} {} {} tags: {}",
            self.name, self.data_type, self.description, self.tags
        )
    }
}

/// A foreign key between two indexed columns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForeignKeyRelation {
    pub from_table: String,
    pub from_column: String,
    pub to_table: String,
    pub to_column: String,
    pub constraint_name: String,
    pub cardinality: Cardinality,
}

impl ForeignKeyRelation {
    pub fn from_full(&self) -> String {
        format!("{}.{}", self.from_table, self.from_column)
    }

    pub fn to_full(&self) -> String {
        format!("{}.{}", self.to_table, self.to_column)
    }

    /// Text used to index this relationship for retrieval.
    pub fn document(&self) -> String {
        format!(
            "relationship {} {} {} {}",
            self.from_table, self.from_column, self.to_table, self.to_column
        )
    }
}

/// Immutable index over tables, columns, foreign keys and the glossary.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SchemaIndex {
    tables: BTreeMap<String, TableEntry>,
    foreign_keys: Vec<ForeignKeyRelation>,
    glossary: BusinessGlossary,
    skipped_foreign_keys: Vec<String>,
}

impl SchemaIndex {
    /// Build an index from a snapshot and a glossary.
    ///
    /// Glossary entries shipped in the snapshot override `glossary` by term.
    /// Foreign keys that reference unknown tables or columns are skipped and
    /// recorded in [`SchemaIndex::skipped_foreign_keys`].
    pub fn build(
        snapshot: &SchemaSnapshot,
        mut glossary: BusinessGlossary,
    ) -> Result<Self, SchemaError> {
        let mut tables = BTreeMap::new();

        for (name, table) in &snapshot.tables {
            let columns = table
                .columns
                .iter()
                .map(|col| {
                    let (mut tags, unknown) =
                        TagSet::from_strings(col.tags.iter().map(String::as_str));
                    for tag in unknown {
                        tracing::debug!(table = %name, column = %col.name, tag, "ignoring unknown column tag");
                    }
                    if tags.is_empty() {
                        tags = infer_tags(&col.name, &col.data_type, col.primary_key);
                    }
                    ColumnEntry {
                        table: name.clone(),
                        name: col.name.clone(),
                        data_type: col.data_type.clone(),
                        tags,
                        nullable: col.nullable,
                        primary_key: col.primary_key,
                        default: col.default.clone(),
                        description: col.description.clone(),
                    }
                })
                .collect();

            tables.insert(
                name.clone(),
                TableEntry {
                    name: name.clone(),
                    schema: table.schema.clone(),
                    description: table.description.clone(),
                    columns,
                    row_count: table.row_count,
                },
            );
        }

        let mut foreign_keys = Vec::new();
        let mut skipped = Vec::new();
        for fk in &snapshot.foreign_keys {
            match resolve_foreign_key(&tables, fk)? {
                Some(relation) => foreign_keys.push(relation),
                None => {
                    tracing::warn!(from = %fk.from, to = %fk.to, "skipping foreign key to unknown table or column");
                    skipped.push(format!("{} -> {}", fk.from, fk.to));
                }
            }
        }

        let shipped: BusinessGlossary = snapshot
            .glossary
            .iter()
            .map(|(term, entry)| entry.to_term(term))
            .collect();
        glossary.merge(shipped);

        tracing::info!(
            tables = tables.len(),
            foreign_keys = foreign_keys.len(),
            glossary_terms = glossary.len(),
            "built schema index"
        );

        Ok(Self {
            tables,
            foreign_keys,
            glossary,
            skipped_foreign_keys: skipped,
        })
    }

    pub fn table(&self, name: &str) -> Option<&TableEntry> {
        self.tables.get(name)
    }

    pub fn has_table(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    pub fn column(&self, table: &str, column: &str) -> Option<&ColumnEntry> {
        self.table(table).and_then(|t| t.column(column))
    }

    pub fn has_column(&self, table: &str, column: &str) -> bool {
        self.column(table, column).is_some()
    }

    /// Tables in name order.
    pub fn tables(&self) -> impl Iterator<Item = &TableEntry> {
        self.tables.values()
    }

    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    /// Columns of all tables, table by table in name order.
    pub fn columns(&self) -> impl Iterator<Item = &ColumnEntry> {
        self.tables.values().flat_map(|t| t.columns.iter())
    }

    pub fn foreign_keys(&self) -> &[ForeignKeyRelation] {
        &self.foreign_keys
    }

    pub fn glossary(&self) -> &BusinessGlossary {
        &self.glossary
    }

    /// Foreign keys dropped during build, as `from -> to` strings.
    pub fn skipped_foreign_keys(&self) -> &[String] {
        &self.skipped_foreign_keys
    }

    /// Closest known table name by edit distance.
    pub fn closest_table(&self, name: &str) -> Option<&str> {
        closest(name, self.table_names())
    }

    /// Closest column name within `table`, or across all tables when the table is unknown.
    pub fn closest_column(&self, table: &str, column: &str) -> Option<String> {
        match self.table(table) {
            Some(entry) => closest(column, entry.column_names()).map(|c| format!("{table}.{c}")),
            None => {
                let names: Vec<String> = self.columns().map(ColumnEntry::qualified_name).collect();
                let target = format!("{table}.{column}");
                closest(&target, names.iter().map(String::as_str)).map(str::to_string)
            }
        }
    }
}

fn split_reference(reference: &str) -> Result<(&str, &str), SchemaError> {
    match reference.rsplit_once('.') {
        Some((table, column)) if !table.is_empty() && !column.is_empty() => Ok((table, column)),
        _ => Err(SchemaError::InvalidReference(reference.to_string())),
    }
}

fn resolve_foreign_key(
    tables: &BTreeMap<String, TableEntry>,
    fk: &ForeignKeySnapshot,
) -> Result<Option<ForeignKeyRelation>, SchemaError> {
    let (from_table, from_column) = split_reference(&fk.from)?;
    let (to_table, to_column) = split_reference(&fk.to)?;

    let source = tables.get(from_table).and_then(|t| t.column(from_column));
    let target = tables.get(to_table).and_then(|t| t.column(to_column));
    let (Some(source), Some(target)) = (source, target) else {
        return Ok(None);
    };

    let cardinality = fk.cardinality.unwrap_or({
        if target.primary_key && source.primary_key {
            Cardinality::OneToOne
        } else {
            Cardinality::ManyToOne
        }
    });

    Ok(Some(ForeignKeyRelation {
        from_table: from_table.to_string(),
        from_column: from_column.to_string(),
        to_table: to_table.to_string(),
        to_column: to_column.to_string(),
        constraint_name: fk.constraint_name.clone(),
        cardinality,
    }))
}

/// Pick the candidate with the smallest edit distance, if it is reasonably close.
fn closest<'a>(target: &str, candidates: impl Iterator<Item = &'a str>) -> Option<&'a str> {
    let target = target.to_lowercase();
    candidates
        .map(|c| (c, levenshtein(&target, &c.to_lowercase())))
        .filter(|(c, d)| *d <= (c.chars().count().max(target.chars().count()) / 2).max(1))
        .min_by_key(|(_, d)| *d)
        .map(|(c, _)| c)
}

fn levenshtein(a: &str, b: &str) -> usize {
    let b: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    for (i, ca) in a.chars().enumerate() {
        let mut curr = vec![i + 1; b.len() + 1];
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != *cb);
            curr[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        prev = curr;
    }
    prev[b.len()]
}
