//! MySQL: backtick quoting, TINYINT booleans, no FULL OUTER JOIN.

use super::{helpers, SqlDialect};
use crate::normalizer::DateUnit;

#[derive(Debug, Clone, Copy)]
pub struct MySql;

impl SqlDialect for MySql {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn quote_char(&self) -> char {
        '`'
    }

    fn numeric_booleans(&self) -> bool {
        true
    }

    fn supports_full_outer_join(&self) -> bool {
        false
    }

    fn current_date(&self) -> &'static str {
        "CURDATE()"
    }

    fn date_add(&self, base: &str, amount: u32, unit: DateUnit) -> String {
        helpers::interval_function(base, i64::from(amount), unit)
    }

    fn date_sub(&self, base: &str, amount: u32, unit: DateUnit) -> String {
        helpers::interval_function(base, -i64::from(amount), unit)
    }
}
