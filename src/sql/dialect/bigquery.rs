//! BigQuery: backtick quoting and typed `DATE '...'` literals.

use super::{helpers, SqlDialect};
use crate::normalizer::DateUnit;

#[derive(Debug, Clone, Copy)]
pub struct BigQuery;

impl SqlDialect for BigQuery {
    fn name(&self) -> &'static str {
        "bigquery"
    }

    fn quote_char(&self) -> char {
        '`'
    }

    fn format_date_literal(&self, date: &str) -> String {
        format!("DATE '{date}'")
    }

    fn current_date(&self) -> &'static str {
        "CURRENT_DATE()"
    }

    fn date_add(&self, base: &str, amount: u32, unit: DateUnit) -> String {
        helpers::interval_function(base, i64::from(amount), unit)
    }

    fn date_sub(&self, base: &str, amount: u32, unit: DateUnit) -> String {
        helpers::interval_function(base, -i64::from(amount), unit)
    }
}
