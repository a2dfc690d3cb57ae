//! Dialect differences for generated SQL.
//!
//! Each dialect implements [`SqlDialect`]; the [`Dialect`] enum selects one
//! and is what configuration and callers pass around.
//!
//! | Dialect | Quote | Booleans | Seven days ago |
//! |---------|-------|----------|----------------|
//! | Postgres | `"` | TRUE/FALSE | `CURRENT_DATE - INTERVAL '7 days'` |
//! | MySQL | `` ` `` | 1/0 | `DATE_SUB(CURDATE(), INTERVAL 7 DAY)` |
//! | DuckDB | `"` | TRUE/FALSE | `CURRENT_DATE - INTERVAL '7 days'` |
//! | Snowflake | `"` | TRUE/FALSE | `DATEADD(day, -7, CURRENT_DATE())` |
//! | BigQuery | `` ` `` | TRUE/FALSE | `DATE_SUB(CURRENT_DATE(), INTERVAL 7 DAY)` |
//! | T-SQL | `[]` | 1/0 | `DATEADD(day, -7, CAST(GETDATE() AS DATE))` |
//!
//! T-SQL writes an unordered limit as `SELECT TOP n` and an ordered one as
//! `OFFSET 0 ROWS FETCH NEXT n ROWS ONLY`.

mod bigquery;
mod duckdb;
pub mod helpers;
mod mysql;
mod postgres;
mod snowflake;
mod tsql;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use bigquery::BigQuery;
pub use duckdb::DuckDb;
pub use mysql::MySql;
pub use postgres::Postgres;
pub use snowflake::Snowflake;
pub use tsql::TSql;

use super::token::TokenStream;
use crate::normalizer::{DateExpr, DateUnit, Direction};

/// Rendering rules of one SQL dialect. Defaults follow ANSI SQL.
pub trait SqlDialect: fmt::Debug + Send + Sync {
    fn name(&self) -> &'static str;

    // =========================================================================
    // Literals and identifiers
    // =========================================================================

    /// Opening identifier quote.
    fn quote_char(&self) -> char;

    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_with(self.quote_char(), ident)
    }

    fn quote_string(&self, s: &str) -> String {
        helpers::string_literal(s, false)
    }

    /// Booleans written as `1`/`0` instead of `TRUE`/`FALSE`.
    fn numeric_booleans(&self) -> bool {
        false
    }

    fn format_bool(&self, b: bool) -> &'static str {
        match (self.numeric_booleans(), b) {
            (true, true) => "1",
            (true, false) => "0",
            (false, true) => "TRUE",
            (false, false) => "FALSE",
        }
    }

    fn format_null(&self) -> &'static str {
        "NULL"
    }

    // =========================================================================
    // Row limits and joins
    // =========================================================================

    fn emit_limit_offset(&self, limit: Option<u64>, offset: Option<u64>) -> TokenStream {
        helpers::emit_limit_offset_standard(limit, offset)
    }

    fn requires_order_by_for_offset(&self) -> bool {
        false
    }

    /// Whether an unordered limit is written as `SELECT TOP n`.
    fn supports_top(&self) -> bool {
        false
    }

    fn supports_full_outer_join(&self) -> bool {
        true
    }

    // =========================================================================
    // Dates
    // =========================================================================

    /// Literal for an ISO `YYYY-MM-DD` date.
    fn format_date_literal(&self, date: &str) -> String {
        format!("'{date}'")
    }

    fn current_date(&self) -> &'static str;

    /// `base` moved `amount` units into the future.
    fn date_add(&self, base: &str, amount: u32, unit: DateUnit) -> String;

    /// `base` moved `amount` units into the past.
    fn date_sub(&self, base: &str, amount: u32, unit: DateUnit) -> String;

    fn format_date(&self, date: &DateExpr) -> String {
        let today = self.current_date();
        match *date {
            DateExpr::Today => today.to_string(),
            DateExpr::Offset {
                direction: Direction::Past,
                amount,
                unit,
            } => self.date_sub(today, amount, unit),
            DateExpr::Offset {
                direction: Direction::Future,
                amount,
                unit,
            } => self.date_add(today, amount, unit),
            DateExpr::Absolute(day) => self.format_date_literal(&day.to_string()),
        }
    }
}

/// Supported SQL dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[default]
    Postgres,
    MySql,
    DuckDb,
    Snowflake,
    BigQuery,
    TSql,
}

impl Dialect {
    pub const ALL: [Dialect; 6] = [
        Dialect::Postgres,
        Dialect::MySql,
        Dialect::DuckDb,
        Dialect::Snowflake,
        Dialect::BigQuery,
        Dialect::TSql,
    ];

    pub fn rules(self) -> &'static dyn SqlDialect {
        match self {
            Dialect::Postgres => &Postgres,
            Dialect::MySql => &MySql,
            Dialect::DuckDb => &DuckDb,
            Dialect::Snowflake => &Snowflake,
            Dialect::BigQuery => &BigQuery,
            Dialect::TSql => &TSql,
        }
    }
}

impl SqlDialect for Dialect {
    fn name(&self) -> &'static str {
        self.rules().name()
    }

    fn quote_char(&self) -> char {
        self.rules().quote_char()
    }

    fn quote_identifier(&self, ident: &str) -> String {
        self.rules().quote_identifier(ident)
    }

    fn quote_string(&self, s: &str) -> String {
        self.rules().quote_string(s)
    }

    fn numeric_booleans(&self) -> bool {
        self.rules().numeric_booleans()
    }

    fn emit_limit_offset(&self, limit: Option<u64>, offset: Option<u64>) -> TokenStream {
        self.rules().emit_limit_offset(limit, offset)
    }

    fn requires_order_by_for_offset(&self) -> bool {
        self.rules().requires_order_by_for_offset()
    }

    fn supports_top(&self) -> bool {
        self.rules().supports_top()
    }

    fn supports_full_outer_join(&self) -> bool {
        self.rules().supports_full_outer_join()
    }

    fn format_date_literal(&self, date: &str) -> String {
        self.rules().format_date_literal(date)
    }

    fn current_date(&self) -> &'static str {
        self.rules().current_date()
    }

    fn date_add(&self, base: &str, amount: u32, unit: DateUnit) -> String {
        self.rules().date_add(base, amount, unit)
    }

    fn date_sub(&self, base: &str, amount: u32, unit: DateUnit) -> String {
        self.rules().date_sub(base, amount, unit)
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Dialect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_ascii_lowercase();
        if let Some(dialect) = Dialect::ALL.into_iter().find(|d| d.name() == lower) {
            return Ok(dialect);
        }
        match lower.as_str() {
            "postgresql" | "pg" => Ok(Dialect::Postgres),
            "mssql" | "sqlserver" => Ok(Dialect::TSql),
            _ => Err(format!("unknown dialect '{s}'")),
        }
    }
}
