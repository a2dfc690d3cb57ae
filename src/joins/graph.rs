//! Foreign-key graph and join path discovery.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};

use petgraph::graph::{EdgeIndex, NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;

use super::types::{
    path_confidence, Cardinality, JoinPath, JoinSpec, MultiJoin, RelationshipDirection,
    TableRelationship,
};
use crate::schema::{ForeignKeyRelation, SchemaIndex};

/// Undirected graph of tables connected by foreign keys.
///
/// Edge weights keep the declared direction of the foreign key, so a join
/// read from `to_table` back to `from_table` swaps columns and reverses
/// the cardinality. Edge indices follow declaration order.
#[derive(Debug, Clone, Default)]
pub struct JoinGraph {
    graph: UnGraph<String, ForeignKeyRelation>,
    nodes: BTreeMap<String, NodeIndex>,
    columns: BTreeMap<String, BTreeSet<String>>,
}

impl JoinGraph {
    /// Build the graph from every table and foreign key in the index.
    pub fn from_index(index: &SchemaIndex) -> Self {
        let mut graph = UnGraph::new_undirected();
        let mut nodes = BTreeMap::new();
        let mut columns = BTreeMap::new();

        for table in index.tables() {
            let node = graph.add_node(table.name.clone());
            nodes.insert(table.name.clone(), node);
            columns.insert(
                table.name.clone(),
                table.column_names().map(str::to_string).collect(),
            );
        }

        for fk in index.foreign_keys() {
            if let (Some(&from), Some(&to)) = (nodes.get(&fk.from_table), nodes.get(&fk.to_table)) {
                graph.add_edge(from, to, fk.clone());
            }
        }

        tracing::debug!(
            tables = graph.node_count(),
            edges = graph.edge_count(),
            "built join graph"
        );

        Self {
            graph,
            nodes,
            columns,
        }
    }

    pub fn has_table(&self, table: &str) -> bool {
        self.nodes.contains_key(table)
    }

    pub fn has_column(&self, table: &str, column: &str) -> bool {
        self.columns
            .get(table)
            .is_some_and(|cols| cols.contains(column))
    }

    pub fn table_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Whether a foreign key joins `a.a_col` with `b.b_col`, in either direction.
    pub fn has_edge(&self, a: &str, a_col: &str, b: &str, b_col: &str) -> bool {
        let Some(&node) = self.nodes.get(a) else {
            return false;
        };
        self.graph.edges(node).any(|edge| {
            let fk = edge.weight();
            (fk.from_table == a && fk.from_column == a_col && fk.to_table == b && fk.to_column == b_col)
                || (fk.to_table == a && fk.to_column == a_col && fk.from_table == b && fk.from_column == b_col)
        })
    }

    /// Find the shortest join path from `from` to `to`.
    ///
    /// Neighbours are visited in ascending table-name order, so the first
    /// shortest path in that order wins. Between parallel foreign keys the
    /// first declared one is used. Returns `None` for unknown tables or when
    /// no path exists.
    pub fn find_join_path(&self, from: &str, to: &str) -> Option<JoinPath> {
        let start = *self.nodes.get(from)?;
        let target = *self.nodes.get(to)?;

        if start == target {
            return Some(JoinPath {
                from_table: from.to_string(),
                to_table: to.to_string(),
                joins: Vec::new(),
                confidence: 1.0,
            });
        }

        let mut queue = VecDeque::new();
        let mut visited = HashSet::new();
        let mut parent: HashMap<NodeIndex, (NodeIndex, EdgeIndex)> = HashMap::new();

        queue.push_back(start);
        visited.insert(start);

        while let Some(current) = queue.pop_front() {
            if current == target {
                let joins = self.reconstruct(&parent, start, target);
                let confidence = path_confidence(&joins);
                return Some(JoinPath {
                    from_table: from.to_string(),
                    to_table: to.to_string(),
                    joins,
                    confidence,
                });
            }

            for (neighbor, edge) in self.sorted_neighbors(current) {
                if visited.insert(neighbor) {
                    parent.insert(neighbor, (current, edge));
                    queue.push_back(neighbor);
                }
            }
        }

        None
    }

    /// Neighbours of `node` ordered by table name, then by declaration order.
    fn sorted_neighbors(&self, node: NodeIndex) -> Vec<(NodeIndex, EdgeIndex)> {
        let mut neighbors: Vec<(&str, EdgeIndex, NodeIndex)> = self
            .graph
            .edges(node)
            .filter_map(|edge| {
                let other = if edge.source() == node {
                    edge.target()
                } else {
                    edge.source()
                };
                // Self-referencing keys never help reach another table.
                (other != node).then(|| (self.graph[other].as_str(), edge.id(), other))
            })
            .collect();
        neighbors.sort_by(|a, b| a.0.cmp(b.0).then(a.1.cmp(&b.1)));
        neighbors
            .into_iter()
            .map(|(_, edge, other)| (other, edge))
            .collect()
    }

    fn reconstruct(
        &self,
        parent: &HashMap<NodeIndex, (NodeIndex, EdgeIndex)>,
        start: NodeIndex,
        target: NodeIndex,
    ) -> Vec<JoinSpec> {
        let mut joins = Vec::new();
        let mut current = target;

        while current != start {
            let Some(&(prev, edge)) = parent.get(&current) else {
                break;
            };
            let fk = &self.graph[edge];
            joins.push(orient(fk, &self.graph[prev]));
            current = prev;
        }

        joins.reverse();
        joins
    }

    /// Connect `tables` greedily, starting from the first one.
    ///
    /// Each step adds the remaining table with the cheapest path from any
    /// already connected table. Tables with no path are reported in
    /// [`MultiJoin::unreachable`]; this never fails.
    pub fn resolve_multi_table(&self, tables: &[String]) -> MultiJoin {
        let mut result = MultiJoin::default();
        let Some(first) = tables.first() else {
            return result;
        };

        if !self.has_table(first) {
            tracing::warn!(table = %first, "base table is not in the schema");
            result.unreachable.push(first.clone());
            result
                .warnings
                .push(format!("table '{first}' is not in the schema"));
        }
        result.connected.push(first.clone());

        let mut remaining: Vec<&String> = Vec::new();
        for table in &tables[1..] {
            if table != first && !remaining.contains(&table) {
                remaining.push(table);
            }
        }

        while !remaining.is_empty() {
            let mut best: Option<(usize, JoinPath)> = None;

            for (pos, candidate) in remaining.iter().enumerate() {
                for source in &result.connected {
                    let Some(path) = self.find_join_path(source, candidate) else {
                        continue;
                    };
                    let cheaper = match &best {
                        Some((_, current)) => path.cost() < current.cost(),
                        None => true,
                    };
                    if cheaper {
                        best = Some((pos, path));
                    }
                }
            }

            let Some((pos, path)) = best else {
                break;
            };
            remaining.remove(pos);

            for join in path.joins {
                if result.connected.contains(&join.right_table) {
                    continue;
                }
                result.connected.push(join.right_table.clone());
                result.joins.push(join);
            }
        }

        for table in remaining {
            if result.connected.contains(table) {
                continue;
            }
            tracing::warn!(table = %table, "no join path to table");
            result
                .warnings
                .push(format!("no join path connects table '{table}'"));
            result.unreachable.push(table.clone());
        }

        result
    }

    /// Foreign keys touching `table`, read from that table's side.
    pub fn table_relationships(&self, table: &str) -> Vec<TableRelationship> {
        let Some(&node) = self.nodes.get(table) else {
            return Vec::new();
        };

        let mut edges: Vec<_> = self.graph.edges(node).collect();
        edges.sort_by_key(|edge| edge.id());

        let mut relationships = Vec::new();
        for edge in edges {
            let fk = edge.weight();
            if fk.from_table == table {
                relationships.push(TableRelationship {
                    direction: RelationshipDirection::Outgoing,
                    other_table: fk.to_table.clone(),
                    local_column: fk.from_column.clone(),
                    other_column: fk.to_column.clone(),
                    cardinality: fk.cardinality,
                    constraint_name: fk.constraint_name.clone(),
                });
            }
            if fk.to_table == table {
                relationships.push(TableRelationship {
                    direction: RelationshipDirection::Incoming,
                    other_table: fk.from_table.clone(),
                    local_column: fk.to_column.clone(),
                    other_column: fk.from_column.clone(),
                    cardinality: fk.cardinality.reverse(),
                    constraint_name: fk.constraint_name.clone(),
                });
            }
        }
        relationships
    }
}

/// Build the join for one hop, reading `fk` from `left` to the other side.
fn orient(fk: &ForeignKeyRelation, left: &str) -> JoinSpec {
    if fk.from_table == left {
        JoinSpec::new(
            &fk.from_table,
            &fk.from_column,
            &fk.to_table,
            &fk.to_column,
            fk.cardinality,
        )
    } else {
        JoinSpec::new(
            &fk.to_table,
            &fk.to_column,
            &fk.from_table,
            &fk.from_column,
            fk.cardinality.reverse(),
        )
    }
}

/// Move many-to-one joins ahead of the rest without breaking dependencies.
///
/// The partition is stable, and no join is moved ahead of the join that
/// introduces its left table.
pub fn optimize_join_order(joins: &[JoinSpec]) -> Vec<JoinSpec> {
    let introduced_by: HashMap<&str, usize> = joins
        .iter()
        .enumerate()
        .map(|(i, j)| (j.right_table.as_str(), i))
        .collect();

    let mut placed = vec![false; joins.len()];
    let mut ordered = Vec::with_capacity(joins.len());

    let ready = |i: usize, placed: &[bool]| -> bool {
        match introduced_by.get(joins[i].left_table.as_str()) {
            Some(&dep) if dep != i => placed[dep],
            _ => true,
        }
    };

    // Many-to-one joins first, then the rest; repeat until everything is placed.
    while ordered.len() < joins.len() {
        let before = ordered.len();
        for pass_many_to_one in [true, false] {
            for i in 0..joins.len() {
                if placed[i] || (joins[i].cardinality == Cardinality::ManyToOne) != pass_many_to_one {
                    continue;
                }
                if ready(i, &placed) {
                    placed[i] = true;
                    ordered.push(joins[i].clone());
                }
            }
            if pass_many_to_one && ordered.len() > before {
                break;
            }
        }
        if ordered.len() == before {
            // Circular dependencies: keep the remaining joins in input order.
            for i in 0..joins.len() {
                if !placed[i] {
                    placed[i] = true;
                    ordered.push(joins[i].clone());
                }
            }
        }
    }

    ordered
}
