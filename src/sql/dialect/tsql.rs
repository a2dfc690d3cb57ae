//! T-SQL (SQL Server).
//!
//! Bracket quoting, 1/0 booleans, `TOP n` for unordered limits and
//! `OFFSET ... FETCH` after ORDER BY. Non-ASCII strings take the `N` prefix.
//! There is no CURRENT_DATE; today is `CAST(GETDATE() AS DATE)`.

use super::{helpers, SqlDialect};
use crate::normalizer::DateUnit;
use crate::sql::token::TokenStream;

#[derive(Debug, Clone, Copy)]
pub struct TSql;

impl SqlDialect for TSql {
    fn name(&self) -> &'static str {
        "tsql"
    }

    fn quote_char(&self) -> char {
        '['
    }

    fn quote_string(&self, s: &str) -> String {
        // Cyrillic values need the N prefix to survive non-Unicode collations
        helpers::string_literal(s, !s.is_ascii())
    }

    fn numeric_booleans(&self) -> bool {
        true
    }

    fn emit_limit_offset(&self, limit: Option<u64>, offset: Option<u64>) -> TokenStream {
        helpers::emit_limit_offset_tsql(limit, offset)
    }

    fn requires_order_by_for_offset(&self) -> bool {
        true
    }

    fn supports_top(&self) -> bool {
        true
    }

    fn current_date(&self) -> &'static str {
        "CAST(GETDATE() AS DATE)"
    }

    fn date_add(&self, base: &str, amount: u32, unit: DateUnit) -> String {
        helpers::dateadd(base, i64::from(amount), unit)
    }

    fn date_sub(&self, base: &str, amount: u32, unit: DateUnit) -> String {
        helpers::dateadd(base, -i64::from(amount), unit)
    }
}
