//! Schema snapshot: the ingestion format produced by an external introspection tool.
//!
//! The snapshot is a plain value object. It is deserialized from JSON or
//! assembled with the builder methods, then turned into a
//! [`SchemaIndex`](super::SchemaIndex).
//!
//! ```json
//! {
//!   "tables": {
//!     "orders": {
//!       "description": "Customer orders",
//!       "row_count": 1200,
//!       "columns": [
//!         {"name": "id", "type": "integer", "pk": true, "nullable": false},
//!         {"name": "amount", "type": "numeric", "tags": ["money"]}
//!       ]
//!     }
//!   },
//!   "fks": [{"from": "orders.customer_id", "to": "customers.id", "constraint": "fk_orders_customer"}]
//! }
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::glossary::BusinessTerm;
use super::SchemaError;
use crate::joins::Cardinality;

/// Complete schema snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaSnapshot {
    #[serde(default)]
    pub tables: BTreeMap<String, TableSnapshot>,
    #[serde(default, rename = "fks")]
    pub foreign_keys: Vec<ForeignKeySnapshot>,
    #[serde(default)]
    pub glossary: BTreeMap<String, GlossaryEntry>,
}

/// One table in a snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableSnapshot {
    #[serde(default)]
    pub schema: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub row_count: Option<u64>,
    #[serde(default)]
    pub columns: Vec<ColumnSnapshot>,
}

/// One column in a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSnapshot {
    pub name: String,
    #[serde(rename = "type", default = "default_type")]
    pub data_type: String,
    #[serde(default = "default_nullable")]
    pub nullable: bool,
    #[serde(default)]
    pub default: Option<String>,
    #[serde(default, rename = "pk")]
    pub primary_key: bool,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub description: String,
}

fn default_type() -> String {
    "text".to_string()
}

fn default_nullable() -> bool {
    true
}

/// A foreign key in `table.column` notation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForeignKeySnapshot {
    pub from: String,
    pub to: String,
    #[serde(default, rename = "constraint")]
    pub constraint_name: String,
    #[serde(default)]
    pub cardinality: Option<Cardinality>,
}

/// A glossary entry shipped with the snapshot; the map key is the term.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GlossaryEntry {
    #[serde(default)]
    pub definition: String,
    #[serde(default)]
    pub synonyms: Vec<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub examples: Vec<String>,
    #[serde(default)]
    pub related_tables: Vec<String>,
    #[serde(default)]
    pub related_columns: Vec<String>,
}

impl GlossaryEntry {
    pub fn to_term(&self, term: &str) -> BusinessTerm {
        BusinessTerm {
            term: term.to_string(),
            definition: self.definition.clone(),
            synonyms: self.synonyms.clone(),
            category: self.category.clone().unwrap_or_else(|| "general".to_string()),
            examples: self.examples.clone(),
            related_tables: self.related_tables.clone(),
            related_columns: self.related_columns.clone(),
        }
    }
}

impl SchemaSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a snapshot from JSON text.
    pub fn from_json_str(json: &str) -> Result<Self, SchemaError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a snapshot file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, SchemaError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| SchemaError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&content)
    }

    /// Add a table (builder style).
    pub fn table(mut self, name: impl Into<String>, table: TableSnapshot) -> Self {
        self.tables.insert(name.into(), table);
        self
    }

    /// Add a foreign key `from` -> `to`, both in `table.column` form.
    pub fn foreign_key(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.foreign_keys.push(ForeignKeySnapshot {
            from: from.into(),
            to: to.into(),
            constraint_name: String::new(),
            cardinality: None,
        });
        self
    }

    /// Add a glossary entry.
    pub fn glossary_entry(mut self, term: impl Into<String>, entry: GlossaryEntry) -> Self {
        self.glossary.insert(term.into(), entry);
        self
    }
}

impl TableSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    pub fn row_count(mut self, rows: u64) -> Self {
        self.row_count = Some(rows);
        self
    }

    pub fn column(mut self, column: ColumnSnapshot) -> Self {
        self.columns.push(column);
        self
    }
}

impl ColumnSnapshot {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            nullable: true,
            default: None,
            primary_key: false,
            tags: Vec::new(),
            description: String::new(),
        }
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.nullable = false;
        self
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn tags(mut self, tags: &[&str]) -> Self {
        self.tags = tags.iter().map(|t| t.to_string()).collect();
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}
