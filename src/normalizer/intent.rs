//! Keyword-based intent classification.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use super::compile;

/// What the question asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Select,
    Count,
    Aggregate,
    Filter,
    Top,
    Trend,
    Compare,
    /// Used when the question is too ambiguous to classify.
    Default,
}

impl Intent {
    /// Classifiable intents in tie-break order.
    pub const CLASSIFIED: [Intent; 7] = [
        Intent::Select,
        Intent::Count,
        Intent::Aggregate,
        Intent::Filter,
        Intent::Top,
        Intent::Trend,
        Intent::Compare,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Intent::Select => "select",
            Intent::Count => "count",
            Intent::Aggregate => "aggregate",
            Intent::Filter => "filter",
            Intent::Top => "top",
            Intent::Trend => "trend",
            Intent::Compare => "compare",
            Intent::Default => "default",
        }
    }

    fn keywords(self) -> Option<&'static str> {
        let pattern = match self {
            Intent::Select => {
                r"\b(покажи|показать|вывести|найди|получи|дай|выбери|көрсет|list|show|get|select|find|display)\b"
            }
            Intent::Count => r"\b(количество|число|кол-во|сколько|саны|count|number of|how many)\b",
            Intent::Aggregate => {
                r"\b(сумма|итого|всего|среднее|средний|максимум|минимум|sum|total|average|avg|max|min|maximum|minimum)\b"
            }
            Intent::Filter => {
                r"\b(где|с условием|при условии|больше|меньше|свыше|менее|более|равно|where|with|having|greater|less|above|below|equal)\b"
            }
            Intent::Top => r"\b(топ|лучшие|первые|top|best|highest|largest)\b",
            Intent::Trend => {
                r"\b(динамика|тренд|изменение|рост|снижение|trend|growth|change|over time)\b"
            }
            Intent::Compare => r"\b(сравни|сравнение|против|vs|compare|comparison|versus)\b",
            Intent::Default => return None,
        };
        Some(pattern)
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

static PATTERNS: Lazy<Vec<(Intent, Regex)>> = Lazy::new(|| {
    Intent::CLASSIFIED
        .iter()
        .filter_map(|intent| intent.keywords().and_then(compile).map(|re| (*intent, re)))
        .collect()
});

/// Classify lowercased `text`.
///
/// Each intent scores its keyword matches divided by the whitespace token
/// count; the best score wins and earlier intents win ties. Returns `None`
/// with confidence 0 when no keyword matches.
pub fn classify_intent(text: &str) -> (Option<Intent>, f64) {
    let tokens = text.split_whitespace().count();
    if tokens == 0 {
        return (None, 0.0);
    }

    let mut best: Option<(Intent, usize)> = None;
    for (intent, regex) in PATTERNS.iter() {
        let hits = regex.find_iter(text).count();
        if hits > 0 && best.map_or(true, |(_, top)| hits > top) {
            best = Some((*intent, hits));
        }
    }

    match best {
        Some((intent, hits)) => (Some(intent), (hits as f64 / tokens as f64).min(1.0)),
        None => (None, 0.0),
    }
}
