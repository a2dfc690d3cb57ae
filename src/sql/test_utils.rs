//! Checks on generated SQL shared by unit tests.
//!
//! [`validate_sql`] runs the text through sqlparser for the matching dialect;
//! [`top_level_clauses`] lists clause keywords outside literals and parentheses
//! so tests can assert canonical clause order.

use sqlparser::dialect::{
    BigQueryDialect, DuckDbDialect, MsSqlDialect, MySqlDialect, PostgreSqlDialect,
    SnowflakeDialect,
};
use sqlparser::parser::Parser;

use super::dialect::Dialect;

/// Canonical clause order of a generated query.
pub const CLAUSE_ORDER: [&str; 8] = [
    "SELECT", "FROM", "JOIN", "WHERE", "GROUP BY", "HAVING", "ORDER BY", "LIMIT",
];

/// Parse `sql` with the sqlparser dialect matching `dialect`.
pub fn validate_sql(sql: &str, dialect: Dialect) -> Result<(), String> {
    let parser: Box<dyn sqlparser::dialect::Dialect> = match dialect {
        Dialect::Postgres => Box::new(PostgreSqlDialect {}),
        Dialect::MySql => Box::new(MySqlDialect {}),
        Dialect::DuckDb => Box::new(DuckDbDialect {}),
        Dialect::Snowflake => Box::new(SnowflakeDialect {}),
        Dialect::BigQuery => Box::new(BigQueryDialect {}),
        Dialect::TSql => Box::new(MsSqlDialect {}),
    };

    Parser::parse_sql(&*parser, sql)
        .map(|_| ())
        .map_err(|e| format!("{dialect} rejected generated SQL: {e}\n{sql}"))
}

/// Clause keywords at nesting depth zero, in the order they appear.
///
/// `INNER JOIN`, `LEFT JOIN` and friends are reported as `JOIN`.
pub fn top_level_clauses(sql: &str) -> Vec<&'static str> {
    let mut words: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    let mut in_string = false;

    let flush = |current: &mut String, words: &mut Vec<String>| {
        if !current.is_empty() {
            words.push(current.to_uppercase());
            current.clear();
        }
    };

    for c in sql.chars() {
        match c {
            '\'' => {
                in_string = !in_string;
                flush(&mut current, &mut words);
            }
            _ if in_string => {}
            '(' => {
                depth += 1;
                flush(&mut current, &mut words);
            }
            ')' => {
                depth = depth.saturating_sub(1);
                flush(&mut current, &mut words);
            }
            c if depth == 0 && (c.is_alphanumeric() || c == '_') => current.push(c),
            _ => flush(&mut current, &mut words),
        }
    }
    flush(&mut current, &mut words);

    let mut clauses = Vec::new();
    let mut iter = words.iter().peekable();
    while let Some(word) = iter.next() {
        let clause = match word.as_str() {
            "SELECT" => "SELECT",
            "FROM" => "FROM",
            "JOIN" => "JOIN",
            "WHERE" => "WHERE",
            "HAVING" => "HAVING",
            "LIMIT" | "FETCH" | "TOP" => "LIMIT",
            "GROUP" | "ORDER" if iter.peek().is_some_and(|next| *next == "BY") => {
                iter.next();
                if word == "GROUP" {
                    "GROUP BY"
                } else {
                    "ORDER BY"
                }
            }
            _ => continue,
        };
        clauses.push(clause);
    }
    clauses
}

/// Whether `clauses` follow [`CLAUSE_ORDER`], allowing repeated joins.
pub fn in_canonical_order(clauses: &[&str]) -> bool {
    let rank = |clause: &str| CLAUSE_ORDER.iter().position(|c| *c == clause);
    clauses
        .iter()
        .map(|&c| rank(c))
        .collect::<Option<Vec<_>>>()
        .is_some_and(|ranks| ranks.windows(2).all(|w| w[0] <= w[1]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_dialect_parses_a_plain_select() {
        for dialect in Dialect::ALL {
            validate_sql("SELECT orders.id FROM orders", dialect).unwrap();
        }
        assert!(validate_sql("SELEC id FORM orders", Dialect::Postgres).is_err());
    }

    #[test]
    fn test_clauses_skip_literals_and_subexpressions() {
        let sql = "SELECT COUNT(orders.id) AS count FROM orders \
                   INNER JOIN customers ON orders.customer_id = customers.id \
                   WHERE orders.status = 'order by me' GROUP BY customers.name LIMIT 10";
        assert_eq!(
            top_level_clauses(sql),
            vec!["SELECT", "FROM", "JOIN", "WHERE", "GROUP BY", "LIMIT"]
        );
    }

    #[test]
    fn test_canonical_order() {
        assert!(in_canonical_order(&["SELECT", "FROM", "JOIN", "JOIN", "WHERE"]));
        assert!(!in_canonical_order(&["SELECT", "WHERE", "FROM"]));
    }
}
