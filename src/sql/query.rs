//! SELECT statement builder.
//!
//! A [`Query`] is assembled clause by clause and rendered on one line, the
//! clauses joined by single spaces in canonical order.

use super::dialect::{Dialect, SqlDialect};
use super::expr::{Connective, Expr};
use super::token::{IdentQuoting, Keyword, RenderError, Token, TokenStream};

/// Write ` AS alias` when an alias is set.
fn push_alias(ts: &mut TokenStream, alias: Option<&str>) {
    if let Some(alias) = alias {
        ts.space().push(Keyword::As).space().push(Token::Ident(alias.to_string()));
    }
}

// =============================================================================
// Clause items
// =============================================================================

/// One item of the SELECT list.
#[derive(Debug, Clone, PartialEq)]
#[must_use = "builders have no effect until used"]
pub struct SelectExpr {
    pub expr: Expr,
    pub alias: Option<String>,
}

impl SelectExpr {
    pub fn new(expr: Expr) -> Self {
        Self { expr, alias: None }
    }

    pub fn with_alias(self, alias: &str) -> Self {
        Self {
            alias: Some(alias.to_string()),
            ..self
        }
    }

    pub fn to_tokens(&self) -> TokenStream {
        let mut ts = self.expr.to_tokens();
        push_alias(&mut ts, self.alias.as_deref());
        ts
    }
}

impl From<Expr> for SelectExpr {
    fn from(expr: Expr) -> Self {
        SelectExpr::new(expr)
    }
}

/// `table [AS alias]` in FROM or JOIN.
#[derive(Debug, Clone, PartialEq)]
#[must_use = "builders have no effect until used"]
pub struct TableRef {
    pub table: String,
    pub alias: Option<String>,
}

impl TableRef {
    pub fn new(table: &str) -> Self {
        Self {
            table: table.to_string(),
            alias: None,
        }
    }

    pub fn with_alias(self, alias: &str) -> Self {
        Self {
            alias: Some(alias.to_string()),
            ..self
        }
    }

    pub fn to_tokens(&self) -> TokenStream {
        let mut ts = TokenStream::new();
        ts.push(Token::Ident(self.table.clone()));
        push_alias(&mut ts, self.alias.as_deref());
        ts
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    Inner,
    Left,
    Right,
    Full,
}

/// `<kind> JOIN table ON condition`
#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    pub join_type: JoinType,
    pub table: TableRef,
    pub on: Expr,
}

impl Join {
    pub fn to_tokens_for_dialect(&self, dialect: Dialect) -> Result<TokenStream, RenderError> {
        let kind = match self.join_type {
            JoinType::Inner => Keyword::Inner,
            JoinType::Left => Keyword::Left,
            JoinType::Right => Keyword::Right,
            JoinType::Full if dialect.supports_full_outer_join() => Keyword::FullOuter,
            JoinType::Full => {
                return Err(RenderError::Unsupported {
                    construct: "FULL OUTER JOIN",
                    dialect: dialect.name(),
                })
            }
        };

        let mut ts = TokenStream::new();
        ts.keywords(&[kind, Keyword::Join]).space();
        ts.append(&self.table.to_tokens());
        ts.space().push(Keyword::On).space();
        ts.append(&self.on.to_tokens());
        Ok(ts)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDir {
    #[default]
    Asc,
    Desc,
}

/// ORDER BY item. The direction is always written out.
#[derive(Debug, Clone, PartialEq)]
#[must_use = "builders have no effect until used"]
pub struct OrderByExpr {
    pub expr: Expr,
    pub dir: SortDir,
}

impl OrderByExpr {
    pub fn asc(expr: Expr) -> Self {
        Self { expr, dir: SortDir::Asc }
    }

    pub fn desc(expr: Expr) -> Self {
        Self { expr, dir: SortDir::Desc }
    }

    pub fn to_tokens(&self) -> TokenStream {
        let mut ts = self.expr.to_tokens();
        ts.space().push(match self.dir {
            SortDir::Asc => Keyword::Asc,
            SortDir::Desc => Keyword::Desc,
        });
        ts
    }
}

// =============================================================================
// Query
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq)]
#[must_use = "a query does nothing until rendered with to_sql()"]
pub struct Query {
    /// Leading `-- comment` line.
    pub comment: Option<String>,
    pub select: Vec<SelectExpr>,
    pub distinct: bool,
    pub from: Option<TableRef>,
    pub joins: Vec<Join>,
    pub where_clause: Option<Expr>,
    pub group_by: Vec<Expr>,
    pub having: Option<Expr>,
    pub order_by: Vec<OrderByExpr>,
    pub limit: Option<u64>,
}

/// Attach `condition` to an optional existing condition.
fn combine(existing: Option<Expr>, connective: Connective, condition: Expr) -> Expr {
    match existing {
        Some(existing) => existing.connect(connective, condition),
        None => condition,
    }
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn comment(mut self, text: &str) -> Self {
        self.comment = Some(text.to_string());
        self
    }

    pub fn select(mut self, exprs: Vec<impl Into<SelectExpr>>) -> Self {
        self.select = exprs.into_iter().map(Into::into).collect();
        self
    }

    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    pub fn from(mut self, table: TableRef) -> Self {
        self.from = Some(table);
        self
    }

    pub fn join(mut self, join_type: JoinType, table: TableRef, on: Expr) -> Self {
        self.joins.push(Join { join_type, table, on });
        self
    }

    pub fn inner_join(self, table: TableRef, on: Expr) -> Self {
        self.join(JoinType::Inner, table, on)
    }

    /// AND a condition onto WHERE.
    pub fn filter(mut self, condition: Expr) -> Self {
        self.where_clause = Some(combine(self.where_clause.take(), Connective::And, condition));
        self
    }

    /// OR a condition onto WHERE.
    pub fn or_filter(mut self, condition: Expr) -> Self {
        self.where_clause = Some(combine(self.where_clause.take(), Connective::Or, condition));
        self
    }

    pub fn group_by(mut self, exprs: Vec<Expr>) -> Self {
        self.group_by = exprs;
        self
    }

    /// Add a HAVING condition, ORed onto the previous one when `or` is set.
    pub fn having(mut self, condition: Expr, or: bool) -> Self {
        let connective = if or { Connective::Or } else { Connective::And };
        self.having = Some(combine(self.having.take(), connective, condition));
        self
    }

    pub fn order_by(mut self, exprs: Vec<OrderByExpr>) -> Self {
        self.order_by = exprs;
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// `SELECT TOP n` is only used when nothing is ordered.
    fn top(&self, dialect: Dialect) -> Option<u64> {
        self.limit
            .filter(|_| self.order_by.is_empty() && dialect.supports_top())
    }

    fn select_clause(&self, dialect: Dialect) -> TokenStream {
        let mut ts = TokenStream::new();
        ts.push(Keyword::Select);
        if self.distinct {
            ts.space().push(Keyword::Distinct);
        }
        if let Some(n) = self.top(dialect) {
            ts.space().push(Keyword::Top).space().push(Token::Count(n));
        }
        if !self.select.is_empty() {
            ts.space().comma_separated(&self.select, SelectExpr::to_tokens);
        }
        ts
    }

    fn limit_clause(&self, dialect: Dialect) -> Result<Option<TokenStream>, RenderError> {
        if self.limit.is_none() || self.top(dialect).is_some() {
            return Ok(None);
        }
        if dialect.requires_order_by_for_offset() && self.order_by.is_empty() {
            return Err(RenderError::Unsupported {
                construct: "LIMIT without ORDER BY",
                dialect: dialect.name(),
            });
        }
        Ok(Some(dialect.emit_limit_offset(self.limit, None)))
    }

    /// Tokens for `dialect`, clauses in canonical order.
    pub fn to_tokens_for_dialect(&self, dialect: Dialect) -> Result<TokenStream, RenderError> {
        let mut clauses = vec![self.select_clause(dialect)];

        if let Some(from) = &self.from {
            let mut ts = TokenStream::new();
            ts.push(Keyword::From).space().append(&from.to_tokens());
            clauses.push(ts);
        }
        for join in &self.joins {
            clauses.push(join.to_tokens_for_dialect(dialect)?);
        }
        if let Some(condition) = &self.where_clause {
            clauses.push(keyword_clause(Keyword::Where, &condition.to_tokens()));
        }
        if !self.group_by.is_empty() {
            let mut list = TokenStream::new();
            list.comma_separated(&self.group_by, Expr::to_tokens);
            clauses.push(keyword_clause(Keyword::GroupBy, &list));
        }
        if let Some(condition) = &self.having {
            clauses.push(keyword_clause(Keyword::Having, &condition.to_tokens()));
        }
        if !self.order_by.is_empty() {
            let mut list = TokenStream::new();
            list.comma_separated(&self.order_by, OrderByExpr::to_tokens);
            clauses.push(keyword_clause(Keyword::OrderBy, &list));
        }
        clauses.extend(self.limit_clause(dialect)?);

        let mut ts = TokenStream::new();
        if let Some(comment) = &self.comment {
            ts.push(Token::Comment(comment.clone()));
        }
        for (i, clause) in clauses.iter().enumerate() {
            if i > 0 {
                ts.space();
            }
            ts.append(clause);
        }
        Ok(ts)
    }

    pub fn to_sql(&self, dialect: Dialect, quoting: IdentQuoting) -> Result<String, RenderError> {
        self.to_tokens_for_dialect(dialect)?.serialize(dialect, quoting)
    }
}

fn keyword_clause(keyword: Keyword, body: &TokenStream) -> TokenStream {
    let mut ts = TokenStream::new();
    ts.push(keyword).space().append(body);
    ts
}
