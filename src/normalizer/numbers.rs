//! Number extraction: digit runs with unit suffixes and number words.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use super::compile;
use super::language::Language;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NumberKind {
    Numeric,
    Word,
}

/// One number found in the text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumericExpression {
    pub original: String,
    pub value: f64,
    pub kind: NumberKind,
}

impl NumericExpression {
    /// The value as an integer when it has no fractional part.
    pub fn as_whole(&self) -> Option<i64> {
        (self.value.is_finite() && self.value.fract() == 0.0 && self.value.abs() < i64::MAX as f64)
            .then_some(self.value as i64)
    }
}

static DIGITS: Lazy<Option<Regex>> = Lazy::new(|| {
    compile(
        r"\b(\d+(?:[.,]\d+)?)(?:\s*(тыс|тысяч[аи]?|thousand|k|млн|миллион(?:а|ов)?|million|m|млрд|миллиард(?:а|ов)?|billion|b))?\b",
    )
});

fn multiplier(unit: &str) -> f64 {
    match unit {
        "тыс" | "тысяч" | "тысяча" | "тысячи" | "thousand" | "k" => 1e3,
        "млн" | "миллион" | "миллиона" | "миллионов" | "million" | "m" => 1e6,
        "млрд" | "миллиард" | "миллиарда" | "миллиардов" | "billion" | "b" => 1e9,
        _ => 1.0,
    }
}

const RUSSIAN_WORDS: &[(&str, f64)] = &[
    ("один", 1.0),
    ("одна", 1.0),
    ("два", 2.0),
    ("две", 2.0),
    ("три", 3.0),
    ("четыре", 4.0),
    ("пять", 5.0),
    ("шесть", 6.0),
    ("семь", 7.0),
    ("восемь", 8.0),
    ("девять", 9.0),
    ("десять", 10.0),
    ("одиннадцать", 11.0),
    ("двенадцать", 12.0),
    ("тринадцать", 13.0),
    ("четырнадцать", 14.0),
    ("пятнадцать", 15.0),
    ("двадцать", 20.0),
    ("тридцать", 30.0),
    ("сорок", 40.0),
    ("пятьдесят", 50.0),
    ("сто", 100.0),
    ("тысяча", 1e3),
    ("миллион", 1e6),
];

const ENGLISH_WORDS: &[(&str, f64)] = &[
    ("one", 1.0),
    ("two", 2.0),
    ("three", 3.0),
    ("four", 4.0),
    ("five", 5.0),
    ("six", 6.0),
    ("seven", 7.0),
    ("eight", 8.0),
    ("nine", 9.0),
    ("ten", 10.0),
    ("eleven", 11.0),
    ("twelve", 12.0),
    ("thirteen", 13.0),
    ("fourteen", 14.0),
    ("fifteen", 15.0),
    ("twenty", 20.0),
    ("thirty", 30.0),
    ("forty", 40.0),
    ("fifty", 50.0),
    ("hundred", 100.0),
    ("thousand", 1e3),
    ("million", 1e6),
];

fn word_table(language: Language) -> &'static [(&'static str, f64)] {
    match language {
        Language::Russian => RUSSIAN_WORDS,
        Language::English => ENGLISH_WORDS,
        Language::Kazakh => &[],
    }
}

static WORDS: Lazy<Option<Regex>> = Lazy::new(|| {
    let words: Vec<&str> = RUSSIAN_WORDS
        .iter()
        .chain(ENGLISH_WORDS)
        .map(|(w, _)| *w)
        .collect();
    compile(&format!(r"\b(?:{})\b", words.join("|")))
});

/// Extract numbers from lowercased `text`, skipping the byte ranges in `excluded`.
///
/// Results are ordered by position in the text.
pub(crate) fn find_numbers(
    text: &str,
    language: Language,
    excluded: &[(usize, usize)],
) -> Vec<NumericExpression> {
    let inside = |start: usize, end: usize| excluded.iter().any(|&(s, e)| start < e && s < end);
    let mut found: Vec<(usize, NumericExpression)> = Vec::new();

    if let Some(digits) = DIGITS.as_ref() {
        for caps in digits.captures_iter(text) {
            let (Some(whole), Some(number)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            if inside(whole.start(), whole.end()) {
                continue;
            }
            let Ok(base) = number.as_str().replace(',', ".").parse::<f64>() else {
                continue;
            };
            let factor = caps.get(2).map(|u| multiplier(u.as_str())).unwrap_or(1.0);
            found.push((
                whole.start(),
                NumericExpression {
                    original: whole.as_str().to_string(),
                    value: base * factor,
                    kind: NumberKind::Numeric,
                },
            ));
        }
    }

    let table = word_table(language);
    if let (Some(words), false) = (WORDS.as_ref(), table.is_empty()) {
        for m in words.find_iter(text) {
            if inside(m.start(), m.end()) {
                continue;
            }
            // A unit word right after a digit run was already folded into it.
            if found
                .iter()
                .any(|(start, n)| *start <= m.start() && m.end() <= start + n.original.len())
            {
                continue;
            }
            if let Some((_, value)) = table.iter().find(|(w, _)| *w == m.as_str()) {
                found.push((
                    m.start(),
                    NumericExpression {
                        original: m.as_str().to_string(),
                        value: *value,
                        kind: NumberKind::Word,
                    },
                ));
            }
        }
    }

    found.sort_by_key(|(start, _)| *start);
    found.into_iter().map(|(_, n)| n).collect()
}

/// Extract numbers from text.
pub fn extract_numbers(text: &str, language: Language) -> Vec<NumericExpression> {
    find_numbers(&text.to_lowercase(), language, &[])
}
