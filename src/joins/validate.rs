//! Join set validation.

use std::collections::BTreeMap;

use super::graph::JoinGraph;
use super::types::JoinSpec;

/// A problem found in a join set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum JoinIssue {
    #[error("Unknown table '{0}'")]
    UnknownTable(String),

    #[error("Unknown column '{table}.{column}'")]
    UnknownColumn { table: String, column: String },

    #[error("Join cycle through tables: {}", tables.join(" -> "))]
    Cycle { tables: Vec<String> },

    #[error("Join to '{right_table}' starts from '{left_table}', which is not introduced before it")]
    DanglingJoin {
        left_table: String,
        right_table: String,
    },
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Color {
    White,
    Gray,
    Black,
}

impl JoinGraph {
    /// Check that a join set is acyclic, connected in order and names known columns.
    ///
    /// `base` is the table the joins hang off; when omitted the first join's
    /// left table is used.
    pub fn validate_joins(&self, joins: &[JoinSpec], base: Option<&str>) -> Result<(), Vec<JoinIssue>> {
        let mut issues = Vec::new();

        for join in joins {
            for (table, column) in [
                (&join.left_table, &join.left_column),
                (&join.right_table, &join.right_column),
            ] {
                if !self.has_table(table) {
                    let issue = JoinIssue::UnknownTable(table.clone());
                    if !issues.contains(&issue) {
                        issues.push(issue);
                    }
                } else if !self.has_column(table, column) {
                    issues.push(JoinIssue::UnknownColumn {
                        table: table.clone(),
                        column: column.clone(),
                    });
                }
            }
        }

        let base = base.or_else(|| joins.first().map(|j| j.left_table.as_str()));
        let mut introduced: Vec<&str> = base.into_iter().collect();
        for join in joins {
            if !introduced.contains(&join.left_table.as_str()) {
                issues.push(JoinIssue::DanglingJoin {
                    left_table: join.left_table.clone(),
                    right_table: join.right_table.clone(),
                });
            }
            introduced.push(join.right_table.as_str());
        }

        if let Some(cycle) = find_cycle(joins) {
            issues.push(JoinIssue::Cycle { tables: cycle });
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(issues)
        }
    }
}

/// Three-colour DFS over the join multigraph.
///
/// Each node remembers the edge it was entered through, so walking back over
/// that same edge is not a cycle while a second edge to the same pair is.
fn find_cycle(joins: &[JoinSpec]) -> Option<Vec<String>> {
    let mut adjacency: BTreeMap<&str, Vec<(&str, usize)>> = BTreeMap::new();
    for (id, join) in joins.iter().enumerate() {
        adjacency
            .entry(join.left_table.as_str())
            .or_default()
            .push((join.right_table.as_str(), id));
        adjacency
            .entry(join.right_table.as_str())
            .or_default()
            .push((join.left_table.as_str(), id));
    }

    let mut color: BTreeMap<&str, Color> = adjacency.keys().map(|k| (*k, Color::White)).collect();
    let nodes: Vec<&str> = adjacency.keys().copied().collect();

    for start in nodes {
        if color.get(start) != Some(&Color::White) {
            continue;
        }
        let mut stack: Vec<&str> = Vec::new();
        if let Some(cycle) = visit(start, None, &adjacency, &mut color, &mut stack) {
            return Some(cycle);
        }
    }
    None
}

fn visit<'a>(
    node: &'a str,
    entered_by: Option<usize>,
    adjacency: &BTreeMap<&'a str, Vec<(&'a str, usize)>>,
    color: &mut BTreeMap<&'a str, Color>,
    stack: &mut Vec<&'a str>,
) -> Option<Vec<String>> {
    color.insert(node, Color::Gray);
    stack.push(node);

    for &(next, edge) in adjacency.get(node).map(Vec::as_slice).unwrap_or_default() {
        if Some(edge) == entered_by {
            continue;
        }
        match color.get(next).copied().unwrap_or(Color::White) {
            Color::Gray => {
                let start = stack.iter().position(|t| *t == next).unwrap_or(0);
                let mut cycle: Vec<String> = stack[start..].iter().map(|t| t.to_string()).collect();
                cycle.push(next.to_string());
                return Some(cycle);
            }
            Color::White => {
                if let Some(cycle) = visit(next, Some(edge), adjacency, color, stack) {
                    return Some(cycle);
                }
            }
            Color::Black => {}
        }
    }

    stack.pop();
    color.insert(node, Color::Black);
    None
}
