//! SQL generation module.
//!
//! This module provides a type-safe SQL builder that renders one query shape
//! for every supported dialect. It includes:
//!
//! - [`query`] - SELECT query builder
//! - [`expr`] - Expression AST and builder DSL
//! - [`token`] - Token types for SQL generation
//! - [`dialect`] - SQL dialect implementations

pub mod dialect;
pub mod expr;
pub mod query;
pub mod token;

#[cfg(test)]
pub mod test_utils;

// Re-export commonly used types at the sql module level
pub use dialect::{Dialect, SqlDialect};
pub use expr::{
    col, count, func, lit_bool, lit_date, lit_float, lit_int, lit_null, lit_str, star, sum,
    table_col, CompareOp, Connective, Expr, ExprExt, Literal,
};
pub use query::{Join, JoinType, OrderByExpr, Query, SelectExpr, SortDir, TableRef};
pub use token::{IdentQuoting, Keyword, RenderError, Token, TokenStream};
