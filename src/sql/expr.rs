//! Expression tree for SELECT items, join conditions and filters.
//!
//! Conditions combined with AND/OR are kept as a flat [`Expr::Chain`] and
//! rendered left to right without parentheses, so a plan's filter list reads
//! back in the order it was written.

use super::token::{Keyword, Token, TokenStream};
use crate::normalizer::DateExpr;

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
}

impl CompareOp {
    pub fn as_sql(self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::NotEq => "!=",
            CompareOp::Lt => "<",
            CompareOp::LtEq => "<=",
            CompareOp::Gt => ">",
            CompareOp::GtEq => ">=",
        }
    }
}

/// How a condition attaches to the one before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connective {
    And,
    Or,
}

impl Connective {
    fn keyword(self) -> Keyword {
        match self {
            Connective::And => Keyword::And,
            Connective::Or => Keyword::Or,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Int(i64),
    Float(f64),
    Text(String),
    Bool(bool),
    Null,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// `name` or `qualifier.name`
    Column {
        qualifier: Option<String>,
        name: String,
    },
    Literal(Literal),
    /// Rendered by the dialect at serialization.
    Date(DateExpr),
    Compare {
        left: Box<Expr>,
        op: CompareOp,
        right: Box<Expr>,
    },
    /// `head c1 t1 c2 t2 ...` with no grouping.
    Chain {
        head: Box<Expr>,
        tail: Vec<(Connective, Expr)>,
    },
    Call {
        name: String,
        args: Vec<Expr>,
        distinct: bool,
    },
    InList {
        expr: Box<Expr>,
        values: Vec<Expr>,
        negated: bool,
    },
    Between {
        expr: Box<Expr>,
        low: Box<Expr>,
        high: Box<Expr>,
    },
    NullCheck {
        expr: Box<Expr>,
        negated: bool,
    },
    Like {
        expr: Box<Expr>,
        pattern: Box<Expr>,
        negated: bool,
    },
    Star,
}

impl Expr {
    /// Tokens for this expression; dialect choices are deferred to serialization.
    pub fn to_tokens(&self) -> TokenStream {
        let mut ts = TokenStream::new();
        self.write(&mut ts);
        ts
    }

    fn write(&self, ts: &mut TokenStream) {
        match self {
            Expr::Column { qualifier, name } => {
                if let Some(qualifier) = qualifier {
                    ts.push(Token::Ident(qualifier.clone())).push(Token::Dot);
                }
                ts.push(Token::Ident(name.clone()));
            }
            Expr::Literal(literal) => {
                ts.push(match literal {
                    Literal::Int(n) => Token::Int(*n),
                    Literal::Float(f) => Token::Float(*f),
                    Literal::Text(s) => Token::Str(s.clone()),
                    Literal::Bool(b) => Token::Bool(*b),
                    Literal::Null => Token::Null,
                });
            }
            Expr::Date(date) => {
                ts.push(Token::Date(*date));
            }
            Expr::Compare { left, op, right } => {
                left.write(ts);
                ts.space().push(Token::Op(*op)).space();
                right.write(ts);
            }
            Expr::Chain { head, tail } => {
                head.write(ts);
                for (connective, expr) in tail {
                    ts.space().push(connective.keyword()).space();
                    expr.write(ts);
                }
            }
            Expr::Call {
                name,
                args,
                distinct,
            } => {
                ts.push(Token::Function(name.clone())).lparen();
                if *distinct {
                    ts.push(Keyword::Distinct).space();
                }
                ts.comma_separated(args, Expr::to_tokens).rparen();
            }
            // An empty IN list is not valid SQL; it is always false, NOT IN always true.
            Expr::InList { values, negated, .. } if values.is_empty() => {
                ts.push(if *negated { Keyword::True } else { Keyword::False });
            }
            Expr::InList {
                expr,
                values,
                negated,
            } => {
                expr.write(ts);
                if *negated {
                    ts.space().push(Keyword::Not);
                }
                ts.space().push(Keyword::In).space().lparen();
                ts.comma_separated(values, Expr::to_tokens).rparen();
            }
            Expr::Between { expr, low, high } => {
                expr.write(ts);
                ts.space().push(Keyword::Between).space();
                low.write(ts);
                ts.space().push(Keyword::And).space();
                high.write(ts);
            }
            Expr::NullCheck { expr, negated } => {
                expr.write(ts);
                ts.space()
                    .push(if *negated { Keyword::IsNotNull } else { Keyword::IsNull });
            }
            Expr::Like {
                expr,
                pattern,
                negated,
            } => {
                expr.write(ts);
                if *negated {
                    ts.space().push(Keyword::Not);
                }
                ts.space().push(Keyword::Like).space();
                pattern.write(ts);
            }
            Expr::Star => {
                ts.push(Token::Star);
            }
        }
    }

    /// Attach `other` to this condition, extending an existing chain.
    pub fn connect(self, connective: Connective, other: Expr) -> Expr {
        match self {
            Expr::Chain { head, mut tail } => {
                tail.push((connective, other));
                Expr::Chain { head, tail }
            }
            head => Expr::Chain {
                head: Box::new(head),
                tail: vec![(connective, other)],
            },
        }
    }
}

// =============================================================================
// Constructors
// =============================================================================

pub fn col(name: &str) -> Expr {
    Expr::Column {
        qualifier: None,
        name: name.to_string(),
    }
}

pub fn table_col(table: &str, column: &str) -> Expr {
    Expr::Column {
        qualifier: Some(table.to_string()),
        name: column.to_string(),
    }
}

pub fn lit_int(n: i64) -> Expr {
    Expr::Literal(Literal::Int(n))
}

pub fn lit_float(f: f64) -> Expr {
    Expr::Literal(Literal::Float(f))
}

pub fn lit_str(s: &str) -> Expr {
    Expr::Literal(Literal::Text(s.to_string()))
}

pub fn lit_bool(b: bool) -> Expr {
    Expr::Literal(Literal::Bool(b))
}

pub fn lit_null() -> Expr {
    Expr::Literal(Literal::Null)
}

pub fn lit_date(date: DateExpr) -> Expr {
    Expr::Date(date)
}

pub fn star() -> Expr {
    Expr::Star
}

/// `NAME(args)`, optionally `NAME(DISTINCT args)`.
pub fn func(name: &str, args: Vec<Expr>, distinct: bool) -> Expr {
    Expr::Call {
        name: name.to_string(),
        args,
        distinct,
    }
}

pub fn count(expr: Expr) -> Expr {
    func("COUNT", vec![expr], false)
}

pub fn sum(expr: Expr) -> Expr {
    func("SUM", vec![expr], false)
}

// =============================================================================
// Fluent operators
// =============================================================================

/// Builder methods shared by every expression.
pub trait ExprExt: Sized {
    fn into_expr(self) -> Expr;

    fn compare(self, op: CompareOp, other: impl Into<Expr>) -> Expr {
        Expr::Compare {
            left: Box::new(self.into_expr()),
            op,
            right: Box::new(other.into()),
        }
    }

    fn eq(self, other: impl Into<Expr>) -> Expr {
        self.compare(CompareOp::Eq, other)
    }

    fn ne(self, other: impl Into<Expr>) -> Expr {
        self.compare(CompareOp::NotEq, other)
    }

    fn gt(self, other: impl Into<Expr>) -> Expr {
        self.compare(CompareOp::Gt, other)
    }

    fn gte(self, other: impl Into<Expr>) -> Expr {
        self.compare(CompareOp::GtEq, other)
    }

    fn lt(self, other: impl Into<Expr>) -> Expr {
        self.compare(CompareOp::Lt, other)
    }

    fn lte(self, other: impl Into<Expr>) -> Expr {
        self.compare(CompareOp::LtEq, other)
    }

    fn and(self, other: Expr) -> Expr {
        self.into_expr().connect(Connective::And, other)
    }

    fn or(self, other: Expr) -> Expr {
        self.into_expr().connect(Connective::Or, other)
    }

    fn like(self, pattern: impl Into<Expr>) -> Expr {
        Expr::Like {
            expr: Box::new(self.into_expr()),
            pattern: Box::new(pattern.into()),
            negated: false,
        }
    }

    fn not_like(self, pattern: impl Into<Expr>) -> Expr {
        Expr::Like {
            expr: Box::new(self.into_expr()),
            pattern: Box::new(pattern.into()),
            negated: true,
        }
    }

    fn is_null(self) -> Expr {
        Expr::NullCheck {
            expr: Box::new(self.into_expr()),
            negated: false,
        }
    }

    fn is_not_null(self) -> Expr {
        Expr::NullCheck {
            expr: Box::new(self.into_expr()),
            negated: true,
        }
    }

    fn in_list(self, values: Vec<Expr>) -> Expr {
        Expr::InList {
            expr: Box::new(self.into_expr()),
            values,
            negated: false,
        }
    }

    fn not_in_list(self, values: Vec<Expr>) -> Expr {
        Expr::InList {
            expr: Box::new(self.into_expr()),
            values,
            negated: true,
        }
    }

    fn between(self, low: impl Into<Expr>, high: impl Into<Expr>) -> Expr {
        Expr::Between {
            expr: Box::new(self.into_expr()),
            low: Box::new(low.into()),
            high: Box::new(high.into()),
        }
    }
}

impl ExprExt for Expr {
    fn into_expr(self) -> Expr {
        self
    }
}

impl From<i64> for Expr {
    fn from(n: i64) -> Self {
        lit_int(n)
    }
}

impl From<f64> for Expr {
    fn from(f: f64) -> Self {
        lit_float(f)
    }
}

impl From<&str> for Expr {
    fn from(s: &str) -> Self {
        lit_str(s)
    }
}

impl From<bool> for Expr {
    fn from(b: bool) -> Self {
        lit_bool(b)
    }
}

impl From<DateExpr> for Expr {
    fn from(date: DateExpr) -> Self {
        lit_date(date)
    }
}
