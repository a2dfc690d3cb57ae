//! Deterministic table aliases.

use crate::planner::QueryPlan;
use crate::sql::dialect::helpers;

/// Table to alias map, kept in assignment order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AliasMap {
    entries: Vec<(String, String)>,
}

impl AliasMap {
    /// Assign aliases in first-reference order: base table, join tables, then column tables.
    pub fn for_plan(plan: &QueryPlan) -> Self {
        let mut map = Self::default();
        map.assign(&plan.from_table);
        for join in &plan.joins {
            map.assign(&join.left_table);
            map.assign(&join.right_table);
        }
        for column in plan.all_columns() {
            map.assign(&column.table);
        }
        map
    }

    /// Alias for `table`, assigning a new one on first sight.
    pub fn assign(&mut self, table: &str) -> &str {
        let index = match self.entries.iter().position(|(t, _)| t == table) {
            Some(index) => index,
            None => {
                let alias = self.unique(base_alias(table));
                self.entries.push((table.to_string(), alias));
                self.entries.len() - 1
            }
        };
        &self.entries[index].1
    }

    pub fn get(&self, table: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(t, _)| t == table)
            .map(|(_, a)| a.as_str())
    }

    pub fn entries(&self) -> &[(String, String)] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<(String, String)> {
        self.entries
    }

    fn taken(&self, alias: &str) -> bool {
        self.entries.iter().any(|(_, a)| a == alias)
    }

    fn unique(&self, base: String) -> String {
        if !self.taken(&base) && !helpers::is_reserved(&base) {
            return base;
        }
        (1..)
            .map(|n| format!("{base}{n}"))
            .find(|candidate| !self.taken(candidate))
            .unwrap_or(base)
    }
}

/// First letter of each dotted part, lowercased: `orders` is `o`, `sales.orders` is `so`.
fn base_alias(table: &str) -> String {
    let alias: String = table
        .split('.')
        .filter_map(|part| part.chars().find(char::is_ascii_alphabetic))
        .map(|c| c.to_ascii_lowercase())
        .collect();
    if alias.is_empty() {
        "t".to_string()
    } else {
        alias
    }
}
