//! Snowflake: ANSI quoting, `DATEADD(unit, n, date)` arithmetic.

use super::{helpers, SqlDialect};
use crate::normalizer::DateUnit;

#[derive(Debug, Clone, Copy)]
pub struct Snowflake;

impl SqlDialect for Snowflake {
    fn name(&self) -> &'static str {
        "snowflake"
    }

    fn quote_char(&self) -> char {
        '"'
    }

    fn current_date(&self) -> &'static str {
        "CURRENT_DATE()"
    }

    fn date_add(&self, base: &str, amount: u32, unit: DateUnit) -> String {
        helpers::dateadd(base, i64::from(amount), unit)
    }

    fn date_sub(&self, base: &str, amount: u32, unit: DateUnit) -> String {
        helpers::dateadd(base, -i64::from(amount), unit)
    }
}
