//! Tokens: the atomic pieces of generated SQL.
//!
//! Builders emit dialect-agnostic tokens; the [`Dialect`] is consulted only
//! when a [`TokenStream`] is serialized, for quoting, literals and dates.

use super::dialect::{helpers, Dialect, SqlDialect};
use super::expr::CompareOp;
use crate::normalizer::DateExpr;

/// How identifiers are quoted on output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IdentQuoting {
    /// Bare when the name is a plain lowercase word, quoted otherwise.
    #[default]
    AsNeeded,
    /// Always quoted with the dialect's quote character.
    Always,
}

/// Errors raised while turning tokens into text.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RenderError {
    #[error("cannot render non-finite number {0} as SQL")]
    NonFiniteFloat(f64),

    #[error("{construct} is not supported by {dialect}")]
    Unsupported {
        construct: &'static str,
        dialect: &'static str,
    },
}

/// Reserved words the generator writes. Multi-word clauses are one keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Select,
    Distinct,
    Top,
    From,
    Inner,
    Left,
    Right,
    FullOuter,
    Join,
    On,
    Where,
    GroupBy,
    Having,
    OrderBy,
    Asc,
    Desc,
    Limit,
    Offset,
    Rows,
    FetchNext,
    RowsOnly,
    As,
    And,
    Or,
    Not,
    In,
    Between,
    Like,
    IsNull,
    IsNotNull,
    True,
    False,
}

impl Keyword {
    pub fn as_str(self) -> &'static str {
        match self {
            Keyword::Select => "SELECT",
            Keyword::Distinct => "DISTINCT",
            Keyword::Top => "TOP",
            Keyword::From => "FROM",
            Keyword::Inner => "INNER",
            Keyword::Left => "LEFT",
            Keyword::Right => "RIGHT",
            Keyword::FullOuter => "FULL OUTER",
            Keyword::Join => "JOIN",
            Keyword::On => "ON",
            Keyword::Where => "WHERE",
            Keyword::GroupBy => "GROUP BY",
            Keyword::Having => "HAVING",
            Keyword::OrderBy => "ORDER BY",
            Keyword::Asc => "ASC",
            Keyword::Desc => "DESC",
            Keyword::Limit => "LIMIT",
            Keyword::Offset => "OFFSET",
            Keyword::Rows => "ROWS",
            Keyword::FetchNext => "FETCH NEXT",
            Keyword::RowsOnly => "ROWS ONLY",
            Keyword::As => "AS",
            Keyword::And => "AND",
            Keyword::Or => "OR",
            Keyword::Not => "NOT",
            Keyword::In => "IN",
            Keyword::Between => "BETWEEN",
            Keyword::Like => "LIKE",
            Keyword::IsNull => "IS NULL",
            Keyword::IsNotNull => "IS NOT NULL",
            Keyword::True => "TRUE",
            Keyword::False => "FALSE",
        }
    }
}

/// One element of generated SQL.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Keyword(Keyword),
    Op(CompareOp),

    Space,
    Comma,
    Dot,
    Star,
    LParen,
    RParen,

    /// Table, column or alias name.
    Ident(String),
    /// Function name, rendered upper-case.
    Function(String),
    Int(i64),
    /// Row count for LIMIT, TOP and FETCH.
    Count(u64),
    Float(f64),
    Str(String),
    Bool(bool),
    Null,
    /// Resolved date, rendered with the dialect's date arithmetic.
    Date(DateExpr),
    /// `-- text` line comment, terminated by a newline.
    Comment(String),
}

impl From<Keyword> for Token {
    fn from(keyword: Keyword) -> Self {
        Token::Keyword(keyword)
    }
}

impl Token {
    /// Text of this token for `dialect`.
    pub fn serialize(&self, dialect: Dialect, quoting: IdentQuoting) -> Result<String, RenderError> {
        let text = match self {
            Token::Keyword(keyword) => keyword.as_str().to_string(),
            Token::Op(op) => op.as_sql().to_string(),

            Token::Space => " ".to_string(),
            Token::Comma => ",".to_string(),
            Token::Dot => ".".to_string(),
            Token::Star => "*".to_string(),
            Token::LParen => "(".to_string(),
            Token::RParen => ")".to_string(),

            Token::Ident(name) => {
                let quote = match quoting {
                    IdentQuoting::Always => true,
                    IdentQuoting::AsNeeded => helpers::needs_quoting(name),
                };
                if quote {
                    dialect.quote_identifier(name)
                } else {
                    name.clone()
                }
            }
            Token::Function(name) => name.to_uppercase(),
            Token::Int(n) => n.to_string(),
            Token::Count(n) => n.to_string(),
            Token::Float(f) if !f.is_finite() => return Err(RenderError::NonFiniteFloat(*f)),
            Token::Float(f) => ryu::Buffer::new().format_finite(*f).to_string(),
            Token::Str(s) => dialect.quote_string(s),
            Token::Bool(b) => dialect.format_bool(*b).to_string(),
            Token::Null => dialect.format_null().to_string(),
            Token::Date(date) => dialect.format_date(date),
            Token::Comment(text) => format!("-- {}\n", text.replace(['\r', '\n'], " ")),
        };
        Ok(text)
    }
}

/// Ordered tokens with builder helpers for spacing and punctuation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TokenStream {
    tokens: Vec<Token>,
}

impl TokenStream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, token: impl Into<Token>) -> &mut Self {
        self.tokens.push(token.into());
        self
    }

    /// Keywords separated by single spaces.
    pub fn keywords(&mut self, keywords: &[Keyword]) -> &mut Self {
        for (i, keyword) in keywords.iter().enumerate() {
            if i > 0 {
                self.space();
            }
            self.push(*keyword);
        }
        self
    }

    pub fn append(&mut self, other: &TokenStream) -> &mut Self {
        self.tokens.extend(other.tokens.iter().cloned());
        self
    }

    /// Append `items` separated by `", "`.
    pub fn comma_separated<'a, T: 'a>(
        &mut self,
        items: impl IntoIterator<Item = &'a T>,
        to_tokens: impl Fn(&T) -> TokenStream,
    ) -> &mut Self {
        for (i, item) in items.into_iter().enumerate() {
            if i > 0 {
                self.comma().space();
            }
            self.append(&to_tokens(item));
        }
        self
    }

    pub fn space(&mut self) -> &mut Self {
        self.push(Token::Space)
    }

    pub fn comma(&mut self) -> &mut Self {
        self.push(Token::Comma)
    }

    pub fn lparen(&mut self) -> &mut Self {
        self.push(Token::LParen)
    }

    pub fn rparen(&mut self) -> &mut Self {
        self.push(Token::RParen)
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn serialize(&self, dialect: Dialect, quoting: IdentQuoting) -> Result<String, RenderError> {
        self.tokens
            .iter()
            .map(|t| t.serialize(dialect, quoting))
            .collect()
    }
}
