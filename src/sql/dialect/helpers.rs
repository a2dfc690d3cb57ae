//! Building blocks shared by the dialect implementations.

use crate::normalizer::DateUnit;
use crate::sql::token::{Keyword, Token, TokenStream};

// =============================================================================
// Quoting
// =============================================================================

/// Closing quote for an opening quote character.
pub fn closing_quote(open: char) -> char {
    match open {
        '[' => ']',
        other => other,
    }
}

/// Wrap `ident` in quotes, doubling any embedded closing quote.
pub fn quote_with(open: char, ident: &str) -> String {
    let close = closing_quote(open);
    let mut out = String::with_capacity(ident.len() + 2);
    out.push(open);
    for c in ident.chars() {
        if c == close {
            out.push(c);
        }
        out.push(c);
    }
    out.push(close);
    out
}

/// Words that are never emitted as bare identifiers or aliases.
const RESERVED: &[&str] = &[
    "all", "and", "as", "asc", "between", "by", "case", "check", "column", "create", "cross",
    "current_date", "date", "default", "delete", "desc", "distinct", "drop", "else", "end",
    "except", "exists", "false", "fetch", "for", "from", "full", "group", "having", "if", "in",
    "index", "inner", "insert", "intersect", "interval", "into", "is", "join", "key", "left",
    "like", "limit", "not", "null", "of", "offset", "on", "only", "or", "order", "outer",
    "primary", "right", "rows", "select", "set", "table", "then", "time", "timestamp", "to",
    "top", "true", "union", "update", "user", "using", "values", "when", "where", "with",
];

/// Case-insensitive keyword check.
pub fn is_reserved(word: &str) -> bool {
    let lower = word.to_ascii_lowercase();
    RESERVED.binary_search(&lower.as_str()).is_ok()
}

/// Anything but `[a-z_][a-z0-9_]*`, and every keyword, must be quoted.
pub fn needs_quoting(ident: &str) -> bool {
    let mut chars = ident.chars();
    let plain_start = chars
        .next()
        .is_some_and(|c| c.is_ascii_lowercase() || c == '_');
    let plain_rest = chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
    !(plain_start && plain_rest) || is_reserved(ident)
}

/// `'text'` with `''` escaping, optionally `N'text'`.
pub fn string_literal(s: &str, national: bool) -> String {
    let prefix = if national { "N" } else { "" };
    format!("{prefix}'{}'", s.replace('\'', "''"))
}

// =============================================================================
// Pagination
// =============================================================================

/// `LIMIT n [OFFSET m]`.
pub fn emit_limit_offset_standard(limit: Option<u64>, offset: Option<u64>) -> TokenStream {
    let parts = [(Keyword::Limit, limit), (Keyword::Offset, offset)];
    let mut ts = TokenStream::new();
    for (keyword, value) in parts.into_iter().filter_map(|(k, v)| Some((k, v?))) {
        if !ts.is_empty() {
            ts.space();
        }
        ts.push(keyword).space().push(Token::Count(value));
    }
    ts
}

/// `OFFSET m ROWS [FETCH NEXT n ROWS ONLY]`. T-SQL only accepts this after ORDER BY.
pub fn emit_limit_offset_tsql(limit: Option<u64>, offset: Option<u64>) -> TokenStream {
    let mut ts = TokenStream::new();
    ts.push(Keyword::Offset)
        .space()
        .push(Token::Count(offset.unwrap_or(0)))
        .space()
        .push(Keyword::Rows);
    if let Some(n) = limit {
        ts.space()
            .push(Keyword::FetchNext)
            .space()
            .push(Token::Count(n))
            .space()
            .push(Keyword::RowsOnly);
    }
    ts
}

// =============================================================================
// Date arithmetic
// =============================================================================
//
// `offset` is signed: negative moves into the past.

/// `base - INTERVAL 'n units'`. Quarters become months.
pub fn interval_arithmetic(base: &str, offset: i64, unit: DateUnit) -> String {
    let sign = if offset < 0 { '-' } else { '+' };
    let (amount, unit) = match unit {
        DateUnit::Quarter => (offset.unsigned_abs().saturating_mul(3), DateUnit::Month),
        other => (offset.unsigned_abs(), other),
    };
    let plural = if amount == 1 { "" } else { "s" };
    format!("{base} {sign} INTERVAL '{amount} {}{plural}'", unit.as_str())
}

/// `DATE_SUB(base, INTERVAL n UNIT)` or `DATE_ADD(...)`.
pub fn interval_function(base: &str, offset: i64, unit: DateUnit) -> String {
    let function = if offset < 0 { "DATE_SUB" } else { "DATE_ADD" };
    format!(
        "{function}({base}, INTERVAL {} {})",
        offset.unsigned_abs(),
        unit.as_str().to_ascii_uppercase()
    )
}

/// `DATEADD(unit, offset, base)`.
pub fn dateadd(base: &str, offset: i64, unit: DateUnit) -> String {
    format!("DATEADD({}, {offset}, {base})", unit.as_str())
}
