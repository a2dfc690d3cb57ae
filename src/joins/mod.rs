//! Join resolution over the foreign-key graph.
//!
//! The [`JoinGraph`] is built once per schema version. It answers:
//! - shortest join paths between two tables ([`JoinGraph::find_join_path`])
//! - greedy join sets connecting many tables ([`JoinGraph::resolve_multi_table`])
//! - validation of a join set ([`JoinGraph::validate_joins`])

mod graph;
mod types;
mod validate;

pub use graph::{optimize_join_order, JoinGraph};
pub use types::{
    path_confidence, Cardinality, JoinKind, JoinPath, JoinSpec, MultiJoin, RelationshipDirection,
    TableRelationship,
};
pub use validate::JoinIssue;
