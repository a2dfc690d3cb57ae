//! Rank-based retrieval over the schema index.
//!
//! Every scoped search combines a literal boost (name, type, tag and
//! description hits) with `0.7 ×` the [`TextIndex`] similarity of the scope's
//! documents, clamped to `[0, 1]`. Results are sorted by descending score;
//! equal scores keep document order.

mod text_index;

use std::fmt;
use std::str::FromStr;

use inflector::Inflector;
use serde::Serialize;

use crate::config::RetrievalSettings;
use crate::joins::JoinSpec;
use crate::schema::{BusinessTerm, ColumnEntry, ForeignKeyRelation, SchemaIndex, TableEntry};

pub use text_index::{tokenize, IndexKind, KeywordIndex, TextIndex, TfIdfIndex};

const SIMILARITY_WEIGHT: f64 = 0.7;

/// Which part of the index to search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchScope {
    Tables,
    Columns,
    Relationships,
    BusinessTerms,
    /// Text similarity over every document.
    Unified,
}

impl FromStr for SearchScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "tables" | "table" => Ok(SearchScope::Tables),
            "columns" | "column" => Ok(SearchScope::Columns),
            "relationships" | "relationship" => Ok(SearchScope::Relationships),
            "terms" | "business_terms" => Ok(SearchScope::BusinessTerms),
            "unified" | "all" => Ok(SearchScope::Unified),
            other => Err(format!("unknown search scope '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultKind {
    Table,
    Column,
    Relationship,
    BusinessTerm,
}

impl fmt::Display for ResultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResultKind::Table => write!(f, "table"),
            ResultKind::Column => write!(f, "column"),
            ResultKind::Relationship => write!(f, "relationship"),
            ResultKind::BusinessTerm => write!(f, "business_term"),
        }
    }
}

/// Reference back into the schema index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryRef {
    Table(String),
    Column { table: String, column: String },
    /// Position in [`SchemaIndex::foreign_keys`].
    Relationship(usize),
    BusinessTerm(String),
}

/// One ranked hit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    pub content: String,
    pub score: f64,
    pub kind: ResultKind,
    pub entry: EntryRef,
}

/// Everything known about one table.
#[derive(Debug, Clone, Serialize)]
pub struct TableContext<'a> {
    pub table: &'a TableEntry,
    pub related_tables: Vec<&'a str>,
    pub terms: Vec<&'a BusinessTerm>,
}

/// Schema retriever for one schema version.
///
/// The text index strategy is chosen once, when the retriever is built.
#[derive(Debug)]
pub struct Retriever<'a> {
    index: &'a SchemaIndex,
    min_score: f64,
    tables: Box<dyn TextIndex>,
    columns: Box<dyn TextIndex>,
    relationships: Box<dyn TextIndex>,
    terms: Box<dyn TextIndex>,
    unified: Box<dyn TextIndex>,
}

impl<'a> Retriever<'a> {
    pub fn new(index: &'a SchemaIndex, settings: &RetrievalSettings) -> Self {
        let table_docs: Vec<String> = index.tables().map(TableEntry::document).collect();
        let column_docs: Vec<String> = index.columns().map(ColumnEntry::document).collect();
        let relationship_docs: Vec<String> = index
            .foreign_keys()
            .iter()
            .map(ForeignKeyRelation::document)
            .collect();
        let term_docs: Vec<String> = index.glossary().iter().map(BusinessTerm::document).collect();

        let mut all = table_docs.clone();
        all.extend(column_docs.iter().cloned());
        all.extend(relationship_docs.iter().cloned());
        all.extend(term_docs.iter().cloned());

        let kind = settings.index;
        let max = settings.max_features;
        tracing::debug!(%kind, documents = all.len(), "building retriever");

        Self {
            index,
            min_score: settings.min_score,
            tables: kind.build(&table_docs, max),
            columns: kind.build(&column_docs, max),
            relationships: kind.build(&relationship_docs, max),
            terms: kind.build(&term_docs, max),
            unified: kind.build(&all, max),
        }
    }

    pub fn index(&self) -> &'a SchemaIndex {
        self.index
    }

    /// Search one scope, returning at most `limit` results.
    pub fn search(&self, text: &str, scope: SearchScope, limit: usize) -> Vec<SearchResult> {
        let mut results = match scope {
            SearchScope::Tables => self.search_tables(text),
            SearchScope::Columns => self.search_columns(text),
            SearchScope::Relationships => self.search_relationships(text),
            SearchScope::BusinessTerms => self.search_terms(text),
            SearchScope::Unified => self.search_unified(text),
        };
        results.retain(|r| r.score > 0.0);
        results.sort_by(|a, b| b.score.total_cmp(&a.score));
        results.truncate(limit);
        results
    }

    fn search_tables(&self, text: &str) -> Vec<SearchResult> {
        let tokens = tokenize(text);
        let similarity = self.tables.score(text);

        self.index
            .tables()
            .zip(similarity)
            .map(|(table, sim)| {
                let name = table.name.to_lowercase();
                let mut boost = 0.0;
                if tokens.iter().any(|t| same_word(t, &name)) {
                    boost += 1.0;
                } else if tokens.iter().any(|t| t.contains(name.as_str())) {
                    boost += 0.8;
                }
                if mentions(&tokens, &table.description) {
                    boost += 0.5;
                }
                if !table.columns.is_empty() {
                    let matched = table
                        .columns
                        .iter()
                        .filter(|c| tokens.iter().any(|t| same_word(t, &c.name.to_lowercase())))
                        .count();
                    boost += 0.3 * matched as f64 / table.columns.len() as f64;
                }
                SearchResult {
                    content: format!("Table: {}", table.name),
                    score: combine(boost, sim),
                    kind: ResultKind::Table,
                    entry: EntryRef::Table(table.name.clone()),
                }
            })
            .collect()
    }

    fn search_columns(&self, text: &str) -> Vec<SearchResult> {
        let tokens = tokenize(text);
        let similarity = self.columns.score(text);

        self.index
            .columns()
            .zip(similarity)
            .map(|(column, sim)| {
                let mut boost = 0.0;
                if tokens.iter().any(|t| *t == column.name.to_lowercase()) {
                    boost += 1.0;
                }
                let data_type = column.data_type.to_lowercase();
                if tokens.iter().any(|t| data_type == *t || data_type.starts_with(&format!("{t}("))) {
                    boost += 0.7;
                }
                if !column.tags.is_empty() {
                    let matched = column
                        .tags
                        .iter()
                        .filter(|tag| tokens.iter().any(|t| t == tag.as_str()))
                        .count();
                    boost += 0.8 * matched as f64 / column.tags.len() as f64;
                }
                if mentions(&tokens, &column.description) {
                    boost += 0.6;
                }
                SearchResult {
                    content: format!("Column: {} ({})", column.qualified_name(), column.data_type),
                    score: combine(boost, sim),
                    kind: ResultKind::Column,
                    entry: EntryRef::Column {
                        table: column.table.clone(),
                        column: column.name.clone(),
                    },
                }
            })
            .collect()
    }

    fn search_relationships(&self, text: &str) -> Vec<SearchResult> {
        let tokens = tokenize(text);
        let similarity = self.relationships.score(text);

        self.index
            .foreign_keys()
            .iter()
            .zip(similarity)
            .enumerate()
            .map(|(i, (fk, sim))| {
                let tables = [fk.from_table.to_lowercase(), fk.to_table.to_lowercase()];
                let columns = [fk.from_column.to_lowercase(), fk.to_column.to_lowercase()];

                let mut boost = 0.0;
                if tokens.iter().any(|t| tables.iter().any(|name| same_word(t, name))) {
                    boost += 1.0;
                } else if tokens.iter().any(|t| tables.iter().any(|name| part_of(t, name))) {
                    boost += 0.6;
                }
                for column in &columns {
                    if tokens.iter().any(|t| t == column) {
                        boost += 0.8;
                    } else if tokens.iter().any(|t| part_of(t, column)) {
                        boost += 0.4;
                    }
                }
                SearchResult {
                    content: format!("Relationship: {} -> {}", fk.from_full(), fk.to_full()),
                    score: combine(boost, sim),
                    kind: ResultKind::Relationship,
                    entry: EntryRef::Relationship(i),
                }
            })
            .collect()
    }

    fn search_terms(&self, text: &str) -> Vec<SearchResult> {
        let similarity = self.terms.score(text);
        let literal = self.index.glossary().search(text, 0.0);

        self.index
            .glossary()
            .iter()
            .zip(similarity)
            .map(|(term, sim)| {
                let boost = literal
                    .iter()
                    .find(|(hit, _)| hit.term == term.term)
                    .map(|(_, score)| *score)
                    .unwrap_or(0.0);
                SearchResult {
                    content: format!("Business term: {}", term.term),
                    score: combine(boost, sim),
                    kind: ResultKind::BusinessTerm,
                    entry: EntryRef::BusinessTerm(term.term.clone()),
                }
            })
            .collect()
    }

    fn search_unified(&self, text: &str) -> Vec<SearchResult> {
        let similarity = self.unified.score(text);
        let entries = self
            .index
            .tables()
            .map(|t| {
                (
                    format!("Table: {}", t.name),
                    ResultKind::Table,
                    EntryRef::Table(t.name.clone()),
                )
            })
            .chain(self.index.columns().map(|c| {
                (
                    format!("Column: {} ({})", c.qualified_name(), c.data_type),
                    ResultKind::Column,
                    EntryRef::Column {
                        table: c.table.clone(),
                        column: c.name.clone(),
                    },
                )
            }))
            .chain(self.index.foreign_keys().iter().enumerate().map(|(i, fk)| {
                (
                    format!("Relationship: {} -> {}", fk.from_full(), fk.to_full()),
                    ResultKind::Relationship,
                    EntryRef::Relationship(i),
                )
            }))
            .chain(self.index.glossary().iter().map(|term| {
                (
                    format!("Business term: {}", term.term),
                    ResultKind::BusinessTerm,
                    EntryRef::BusinessTerm(term.term.clone()),
                )
            }));

        entries
            .zip(similarity)
            .filter(|(_, score)| *score >= self.min_score)
            .map(|((content, kind, entry), score)| SearchResult {
                content,
                score: score.clamp(0.0, 1.0),
                kind,
                entry,
            })
            .collect()
    }

    /// A table with its FK neighbours and the glossary terms that mention it.
    pub fn table_context(&self, name: &str) -> Option<TableContext<'a>> {
        let table = self.index.table(name)?;

        let mut related_tables: Vec<&'a str> = Vec::new();
        for fk in self.index.foreign_keys() {
            let other = if fk.from_table == name {
                fk.to_table.as_str()
            } else if fk.to_table == name {
                fk.from_table.as_str()
            } else {
                continue;
            };
            if other != name && !related_tables.contains(&other) {
                related_tables.push(other);
            }
        }

        let terms = self
            .index
            .glossary()
            .iter()
            .filter(|term| {
                term.related_tables.iter().any(|t| t == name)
                    || term
                        .related_columns
                        .iter()
                        .any(|c| table.column(c).is_some())
            })
            .collect();

        Some(TableContext {
            table,
            related_tables,
            terms,
        })
    }

    /// Direct foreign-key joins between each pair of `tables`, oriented from the earlier table.
    pub fn suggest_joins(&self, tables: &[String]) -> Vec<JoinSpec> {
        let mut joins = Vec::new();
        for (i, left) in tables.iter().enumerate() {
            for right in &tables[i + 1..] {
                for fk in self.index.foreign_keys() {
                    if fk.from_table == *left && fk.to_table == *right {
                        joins.push(JoinSpec::new(
                            left,
                            &fk.from_column,
                            right,
                            &fk.to_column,
                            fk.cardinality,
                        ));
                    } else if fk.to_table == *left && fk.from_table == *right {
                        joins.push(JoinSpec::new(
                            left,
                            &fk.to_column,
                            right,
                            &fk.from_column,
                            fk.cardinality.reverse(),
                        ));
                    }
                }
            }
        }
        joins
    }

    /// Table names likely meant by `text`, for diagnostics.
    pub fn table_names(&self, text: &str, limit: usize) -> Vec<String> {
        self.search(text, SearchScope::Tables, limit)
            .into_iter()
            .filter_map(|r| match r.entry {
                EntryRef::Table(name) => Some(name),
                _ => None,
            })
            .collect()
    }
}

fn combine(boost: f64, similarity: f64) -> f64 {
    (boost + SIMILARITY_WEIGHT * similarity).clamp(0.0, 1.0)
}

/// `token` is a fragment of `name`. Very short fragments are ignored.
fn part_of(token: &str, name: &str) -> bool {
    token.chars().count() >= 3 && name.contains(token)
}

/// Exact match, treating singular and plural English forms as equal.
fn same_word(token: &str, name: &str) -> bool {
    if token == name {
        return true;
    }
    if token.len() < 3 || !token.is_ascii() || !name.is_ascii() {
        return false;
    }
    token.to_singular() == name.to_singular() || token.to_plural() == name
}

/// Whether any meaningful query token appears as a word of `text`.
fn mentions(tokens: &[String], text: &str) -> bool {
    if text.is_empty() {
        return false;
    }
    let words = tokenize(text);
    tokens
        .iter()
        .filter(|t| t.chars().count() >= 3)
        .any(|t| words.contains(t))
}

/// Compact one-line rendering of results for logs.
pub fn describe(results: &[SearchResult]) -> String {
    results
        .iter()
        .map(|r| format!("{} ({:.2})", r.content, r.score))
        .collect::<Vec<_>>()
        .join(", ")
}
