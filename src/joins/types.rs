//! Join types shared by the resolver, planner and generator.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Cardinality of a relationship, read left to right.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cardinality {
    OneToOne,
    OneToMany,
    ManyToOne,
    ManyToMany,
}

impl Cardinality {
    /// Whether each side, left then right, is the "many" side.
    fn sides(self) -> (bool, bool) {
        match self {
            Cardinality::OneToOne => (false, false),
            Cardinality::OneToMany => (false, true),
            Cardinality::ManyToOne => (true, false),
            Cardinality::ManyToMany => (true, true),
        }
    }

    fn from_sides(left_many: bool, right_many: bool) -> Self {
        match (left_many, right_many) {
            (false, false) => Cardinality::OneToOne,
            (false, true) => Cardinality::OneToMany,
            (true, false) => Cardinality::ManyToOne,
            (true, true) => Cardinality::ManyToMany,
        }
    }

    /// The same relationship read right to left.
    pub fn reverse(self) -> Self {
        let (left, right) = self.sides();
        Self::from_sides(right, left)
    }
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let side = |many: bool| if many { 'N' } else { '1' };
        let (left, right) = self.sides();
        write!(f, "{}:{}", side(left), side(right))
    }
}

/// SQL join kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum JoinKind {
    #[default]
    Inner,
    Left,
    Right,
    Full,
}

impl fmt::Display for JoinKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            JoinKind::Inner => "INNER",
            JoinKind::Left => "LEFT",
            JoinKind::Right => "RIGHT",
            JoinKind::Full => "FULL",
        })
    }
}

/// One join between two tables: `left_table.left_column = right_table.right_column`.
///
/// `left_table` is already part of the query when this join is applied;
/// `right_table` is the table it introduces.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JoinSpec {
    pub left_table: String,
    pub right_table: String,
    pub left_column: String,
    pub right_column: String,
    #[serde(default)]
    pub kind: JoinKind,
    pub cardinality: Cardinality,
}

impl JoinSpec {
    pub fn new(
        left_table: impl Into<String>,
        left_column: impl Into<String>,
        right_table: impl Into<String>,
        right_column: impl Into<String>,
        cardinality: Cardinality,
    ) -> Self {
        Self {
            left_table: left_table.into(),
            right_table: right_table.into(),
            left_column: left_column.into(),
            right_column: right_column.into(),
            kind: JoinKind::Inner,
            cardinality,
        }
    }

    pub fn with_kind(mut self, kind: JoinKind) -> Self {
        self.kind = kind;
        self
    }

    /// `left.col = right.col` using unaliased names.
    pub fn condition(&self) -> String {
        format!(
            "{}.{} = {}.{}",
            self.left_table, self.left_column, self.right_table, self.right_column
        )
    }
}

/// A shortest join path between two tables.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JoinPath {
    pub from_table: String,
    pub to_table: String,
    pub joins: Vec<JoinSpec>,
    pub confidence: f64,
}

impl JoinPath {
    /// Path cost: the number of joins.
    pub fn cost(&self) -> usize {
        self.joins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.joins.is_empty()
    }

    /// Tables along the path, starting at `from_table`.
    pub fn tables(&self) -> Vec<&str> {
        let mut tables = vec![self.from_table.as_str()];
        tables.extend(self.joins.iter().map(|j| j.right_table.as_str()));
        tables
    }
}

/// Path confidence: `1 / (1 + 0.1 * hops)`, minus 0.2 per many-to-many hop, floored at 0.1.
pub fn path_confidence(joins: &[JoinSpec]) -> f64 {
    if joins.is_empty() {
        return 1.0;
    }
    let base = 1.0 / (1.0 + joins.len() as f64 * 0.1);
    let penalty = joins
        .iter()
        .filter(|j| j.cardinality == Cardinality::ManyToMany)
        .count() as f64
        * 0.2;
    (base - penalty).max(0.1)
}

/// Result of connecting a set of tables.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MultiJoin {
    /// Joins in application order.
    pub joins: Vec<JoinSpec>,
    /// Tables connected by `joins`, including intermediate hops, in connection order.
    pub connected: Vec<String>,
    /// Requested tables with no path to the rest.
    pub unreachable: Vec<String>,
    pub warnings: Vec<String>,
}

impl MultiJoin {
    pub fn is_complete(&self) -> bool {
        self.unreachable.is_empty()
    }
}

/// Direction of a foreign key relative to a given table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipDirection {
    /// The table holds the foreign key column.
    Outgoing,
    /// Another table references this one.
    Incoming,
}

/// A foreign key seen from one table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableRelationship {
    pub direction: RelationshipDirection,
    pub other_table: String,
    pub local_column: String,
    pub other_column: String,
    /// Read from the local table to the other table.
    pub cardinality: Cardinality,
    pub constraint_name: String,
}
