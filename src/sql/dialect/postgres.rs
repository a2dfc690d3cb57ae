//! PostgreSQL: ANSI quoting, native booleans, interval arithmetic.

use super::{helpers, SqlDialect};
use crate::normalizer::DateUnit;

#[derive(Debug, Clone, Copy)]
pub struct Postgres;

impl SqlDialect for Postgres {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn quote_char(&self) -> char {
        '"'
    }

    fn current_date(&self) -> &'static str {
        "CURRENT_DATE"
    }

    fn date_add(&self, base: &str, amount: u32, unit: DateUnit) -> String {
        helpers::interval_arithmetic(base, i64::from(amount), unit)
    }

    fn date_sub(&self, base: &str, amount: u32, unit: DateUnit) -> String {
        helpers::interval_arithmetic(base, -i64::from(amount), unit)
    }
}
