//! Date expression extraction.
//!
//! Dates resolve to a dialect-neutral [`DateExpr`]; only the SQL generator
//! turns them into date arithmetic.

use std::fmt;

use chrono::{Datelike, NaiveDate};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Serialize, Serializer};

use super::compile;
use super::language::Language;
use DateUnit::{Day, Month, Quarter, Week, Year};
use Direction::{Future, Past};

/// Calendar unit of a relative date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DateUnit {
    Day,
    Week,
    Month,
    Quarter,
    Year,
}

impl DateUnit {
    pub fn as_str(self) -> &'static str {
        match self {
            DateUnit::Day => "day",
            DateUnit::Week => "week",
            DateUnit::Month => "month",
            DateUnit::Quarter => "quarter",
            DateUnit::Year => "year",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Past,
    Future,
}

/// A validated Gregorian date, serialized as `YYYY-MM-DD`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CalendarDate(NaiveDate);

impl CalendarDate {
    /// Returns `None` for dates that do not exist.
    pub fn new(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    pub fn month(&self) -> u32 {
        self.0.month()
    }

    pub fn day(&self) -> u32 {
        self.0.day()
    }
}

impl fmt::Display for CalendarDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

impl Serialize for CalendarDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A resolved date, relative to the current date or absolute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DateExpr {
    Today,
    Offset {
        direction: Direction,
        amount: u32,
        unit: DateUnit,
    },
    Absolute(CalendarDate),
}

impl DateExpr {
    pub fn past(amount: u32, unit: DateUnit) -> Self {
        DateExpr::Offset {
            direction: Direction::Past,
            amount,
            unit,
        }
    }

    pub fn future(amount: u32, unit: DateUnit) -> Self {
        DateExpr::Offset {
            direction: Direction::Future,
            amount,
            unit,
        }
    }

    pub fn is_relative(&self) -> bool {
        !matches!(self, DateExpr::Absolute(_))
    }
}

impl fmt::Display for DateExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DateExpr::Today => write!(f, "today"),
            DateExpr::Offset {
                direction,
                amount,
                unit,
            } => {
                let sign = match direction {
                    Direction::Past => '-',
                    Direction::Future => '+',
                };
                write!(f, "today {sign} {amount} {}", unit.as_str())
            }
            DateExpr::Absolute(date) => write!(f, "{date}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DateKind {
    Relative,
    RelativeWithNumber,
    Absolute,
}

/// One date found in the text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DateExpression {
    pub original: String,
    pub resolved: DateExpr,
    pub kind: DateKind,
}

/// A date match with its byte span in the scanned text.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct DateMatch {
    pub start: usize,
    pub end: usize,
    pub expression: DateExpression,
}

#[derive(Clone, Copy)]
enum Resolve {
    Fixed(DateExpr),
    Counted(Direction, DateUnit),
}

struct DatePattern {
    regex: Regex,
    resolve: Resolve,
}

fn patterns(defs: &[(&str, Resolve)]) -> Vec<DatePattern> {
    defs.iter()
        .filter_map(|(src, resolve)| {
            compile(src).map(|regex| DatePattern {
                regex,
                resolve: *resolve,
            })
        })
        .collect()
}

static RUSSIAN: Lazy<Vec<DatePattern>> = Lazy::new(|| {
    patterns(&[
        (r"\bсегодня\b", Resolve::Fixed(DateExpr::Today)),
        (r"\bвчера\b", Resolve::Fixed(DateExpr::past(1, Day))),
        (r"\bзавтра\b", Resolve::Fixed(DateExpr::future(1, Day))),
        (r"\bза\s+(?:последнюю\s+)?неделю\b", Resolve::Fixed(DateExpr::past(1, Week))),
        (r"\bза\s+(?:последний\s+)?месяц\b", Resolve::Fixed(DateExpr::past(1, Month))),
        (r"\bза\s+(?:последний\s+)?квартал\b", Resolve::Fixed(DateExpr::past(1, Quarter))),
        (r"\bза\s+(?:последний\s+)?год\b", Resolve::Fixed(DateExpr::past(1, Year))),
        (
            r"\b(?:за\s+)?последни[ей]\s+(\d+)\s+(?:дней|дня|день)\b",
            Resolve::Counted(Past, Day),
        ),
        (
            r"\b(?:за\s+)?последни[ей]\s+(\d+)\s+(?:недель|недели|неделю)\b",
            Resolve::Counted(Past, Week),
        ),
        (
            r"\b(?:за\s+)?последни[ей]\s+(\d+)\s+(?:месяцев|месяца|месяц)\b",
            Resolve::Counted(Past, Month),
        ),
        (
            r"\b(?:за\s+)?последни[ей]\s+(\d+)\s+(?:кварталов|квартала|квартал)\b",
            Resolve::Counted(Past, Quarter),
        ),
        (
            r"\b(?:за\s+)?последни[ей]\s+(\d+)\s+(?:лет|года|год)\b",
            Resolve::Counted(Past, Year),
        ),
    ])
});

static ENGLISH: Lazy<Vec<DatePattern>> = Lazy::new(|| {
    patterns(&[
        (r"\btoday\b", Resolve::Fixed(DateExpr::Today)),
        (r"\byesterday\b", Resolve::Fixed(DateExpr::past(1, Day))),
        (r"\btomorrow\b", Resolve::Fixed(DateExpr::future(1, Day))),
        (r"\blast\s+week\b", Resolve::Fixed(DateExpr::past(1, Week))),
        (r"\blast\s+month\b", Resolve::Fixed(DateExpr::past(1, Month))),
        (r"\blast\s+quarter\b", Resolve::Fixed(DateExpr::past(1, Quarter))),
        (r"\blast\s+year\b", Resolve::Fixed(DateExpr::past(1, Year))),
        (r"\b(?:last|past)\s+(\d+)\s+days?\b", Resolve::Counted(Past, Day)),
        (r"\b(?:last|past)\s+(\d+)\s+weeks?\b", Resolve::Counted(Past, Week)),
        (r"\b(?:last|past)\s+(\d+)\s+months?\b", Resolve::Counted(Past, Month)),
        (r"\b(?:last|past)\s+(\d+)\s+quarters?\b", Resolve::Counted(Past, Quarter)),
        (r"\b(?:last|past)\s+(\d+)\s+years?\b", Resolve::Counted(Past, Year)),
    ])
});

static KAZAKH: Lazy<Vec<DatePattern>> = Lazy::new(|| {
    patterns(&[
        (r"\bбүгін\b", Resolve::Fixed(DateExpr::Today)),
        (r"\bкеше\b", Resolve::Fixed(DateExpr::past(1, Day))),
        (r"\bертең\b", Resolve::Fixed(DateExpr::future(1, Day))),
        (r"\bапта(?:да)?\b", Resolve::Fixed(DateExpr::past(1, Week))),
        (r"\bай(?:да)?\b", Resolve::Fixed(DateExpr::past(1, Month))),
    ])
});

enum Order {
    DayMonthYear,
    YearMonthDay,
}

static ABSOLUTE: Lazy<Vec<(Regex, Order)>> = Lazy::new(|| {
    let defs = [
        (r"\b(\d{1,2})\.(\d{1,2})\.(\d{4})\b", Order::DayMonthYear),
        (r"\b(\d{4})-(\d{1,2})-(\d{1,2})\b", Order::YearMonthDay),
        (r"\b(\d{1,2})/(\d{1,2})/(\d{4})\b", Order::DayMonthYear),
    ];
    defs.into_iter()
        .filter_map(|(src, order)| compile(src).map(|re| (re, order)))
        .collect()
});

fn table(language: Language) -> &'static [DatePattern] {
    match language {
        Language::Russian => &RUSSIAN,
        Language::Kazakh => &KAZAKH,
        Language::English => &ENGLISH,
    }
}

/// Largest count accepted in "last N units".
pub const MAX_DATE_COUNT: u32 = 10_000;

fn resolve(pattern: &DatePattern, caps: &Captures<'_>) -> Option<(DateExpr, DateKind)> {
    match pattern.resolve {
        Resolve::Fixed(expr) => Some((expr, DateKind::Relative)),
        Resolve::Counted(direction, unit) => {
            let digits = caps.get(1)?.as_str();
            let amount = match digits.parse::<u32>() {
                Ok(amount) if amount <= MAX_DATE_COUNT => amount,
                _ => {
                    tracing::warn!(count = digits, max = MAX_DATE_COUNT, "date count too large, clamping");
                    MAX_DATE_COUNT
                }
            };
            Some((
                DateExpr::Offset {
                    direction,
                    amount,
                    unit,
                },
                DateKind::RelativeWithNumber,
            ))
        }
    }
}

fn absolute(caps: &Captures<'_>, order: &Order) -> Option<CalendarDate> {
    let part = |i: usize| caps.get(i).map(|m| m.as_str());
    let (y, m, d) = match order {
        Order::DayMonthYear => (part(3)?, part(2)?, part(1)?),
        Order::YearMonthDay => (part(1)?, part(2)?, part(3)?),
    };
    CalendarDate::new(y.parse().ok()?, m.parse().ok()?, d.parse().ok()?)
}

/// Find dates in lowercased `text`.
///
/// Longer matches win over shorter ones and spans never overlap. The result
/// is ordered by position in the text.
pub(crate) fn find_dates(text: &str, language: Language) -> Vec<DateMatch> {
    let mut candidates: Vec<DateMatch> = Vec::new();

    for pattern in table(language) {
        for caps in pattern.regex.captures_iter(text) {
            let Some(whole) = caps.get(0) else { continue };
            if let Some((resolved, kind)) = resolve(pattern, &caps) {
                candidates.push(DateMatch {
                    start: whole.start(),
                    end: whole.end(),
                    expression: DateExpression {
                        original: whole.as_str().to_string(),
                        resolved,
                        kind,
                    },
                });
            }
        }
    }

    for (regex, order) in ABSOLUTE.iter() {
        for caps in regex.captures_iter(text) {
            let Some(whole) = caps.get(0) else { continue };
            match absolute(&caps, order) {
                Some(date) => candidates.push(DateMatch {
                    start: whole.start(),
                    end: whole.end(),
                    expression: DateExpression {
                        original: whole.as_str().to_string(),
                        resolved: DateExpr::Absolute(date),
                        kind: DateKind::Absolute,
                    },
                }),
                None => tracing::debug!(date = whole.as_str(), "skipping impossible date"),
            }
        }
    }

    candidates.sort_by(|a, b| {
        (b.end - b.start)
            .cmp(&(a.end - a.start))
            .then(a.start.cmp(&b.start))
    });

    let mut accepted: Vec<DateMatch> = Vec::new();
    for candidate in candidates {
        let overlaps = accepted
            .iter()
            .any(|m| candidate.start < m.end && m.start < candidate.end);
        if !overlaps {
            accepted.push(candidate);
        }
    }

    accepted.sort_by_key(|m| m.start);
    accepted
}

/// Extract dates from text without normalizing it first.
pub fn extract_dates(text: &str, language: Language) -> Vec<DateExpression> {
    find_dates(&text.to_lowercase(), language)
        .into_iter()
        .map(|m| m.expression)
        .collect()
}
