//! Multilingual text normalization.
//!
//! Turns a free-text question into a [`NormalizedQuery`]:
//!
//! 1. detect the language (ru, kz, en)
//! 2. lowercase and canonicalize synonyms
//! 3. extract dates, replacing each span with a `[DATE:n]` placeholder
//! 4. extract numbers outside the date spans
//! 5. classify the intent
//! 6. collect business terms from the language list and the glossary
//!
//! Normalization never fails; unknown input simply produces fewer signals.

mod dates;
mod intent;
mod language;
mod lexicon;
mod numbers;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::config::NormalizerSettings;
use crate::schema::BusinessGlossary;

pub use dates::{extract_dates, CalendarDate, DateExpr, DateExpression, DateKind, DateUnit, Direction};
pub use intent::{classify_intent, Intent};
pub use language::{detect_language, Language};
pub use lexicon::{canonical_terms, normalize_synonyms};
pub use numbers::{extract_numbers, NumberKind, NumericExpression};

/// Compile a built-in pattern, logging instead of panicking on a bad one.
pub(crate) fn compile(source: &str) -> Option<Regex> {
    match Regex::new(source) {
        Ok(regex) => Some(regex),
        Err(err) => {
            tracing::error!(pattern = source, error = %err, "invalid built-in pattern");
            None
        }
    }
}

pub(crate) fn compile_all(sources: &[&str]) -> Vec<Regex> {
    sources.iter().filter_map(|s| compile(s)).collect()
}

static PLACEHOLDER: Lazy<Option<Regex>> = Lazy::new(|| compile(r"\[DATE:\d+\]"));

/// The normalized form of one question.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedQuery {
    pub original: String,
    /// Lowercased, synonym-canonical text with `[DATE:n]` placeholders.
    pub normalized: String,
    pub language: Language,
    pub dates: Vec<DateExpression>,
    pub numbers: Vec<NumericExpression>,
    pub business_terms: Vec<String>,
    pub intent: Option<Intent>,
    pub confidence: f64,
}

impl NormalizedQuery {
    /// First number that is a whole value in `1..=ceiling`.
    pub fn first_whole_number(&self, ceiling: u64) -> Option<u64> {
        self.numbers.iter().find_map(|n| {
            let value = n.as_whole()?;
            (value >= 1 && value as u64 <= ceiling).then_some(value as u64)
        })
    }

    /// Normalized text with the date placeholders removed, for retrieval.
    pub fn search_text(&self) -> String {
        let stripped = match PLACEHOLDER.as_ref() {
            Some(re) => re.replace_all(&self.normalized, " ").into_owned(),
            None => self.normalized.clone(),
        };
        stripped.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    /// Whether any of `words` appears as a whole word in the normalized text.
    pub fn mentions_any(&self, words: &[&str]) -> bool {
        words.iter().any(|w| contains_word(&self.normalized, w))
    }
}

/// Question normalizer. Cheap to share; holds only the glossary and settings.
#[derive(Debug, Clone)]
pub struct Normalizer {
    glossary: BusinessGlossary,
    fallback_language: Language,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(BusinessGlossary::with_defaults(), &NormalizerSettings::default())
    }
}

impl Normalizer {
    pub fn new(glossary: BusinessGlossary, settings: &NormalizerSettings) -> Self {
        Self {
            glossary,
            fallback_language: settings.fallback_language,
        }
    }

    pub fn glossary(&self) -> &BusinessGlossary {
        &self.glossary
    }

    pub fn normalize(&self, text: &str) -> NormalizedQuery {
        let language = detect_language(text, self.fallback_language);
        tracing::debug!(%language, "detected language");

        let canonical = normalize_synonyms(text, language);

        let found = dates::find_dates(&canonical, language);
        let mut normalized = String::with_capacity(canonical.len());
        let mut cursor = 0;
        for (i, m) in found.iter().enumerate() {
            normalized.push_str(&canonical[cursor..m.start]);
            normalized.push_str(&format!("[DATE:{i}]"));
            cursor = m.end;
        }
        normalized.push_str(&canonical[cursor..]);
        let dates: Vec<DateExpression> = found.into_iter().map(|m| m.expression).collect();

        let placeholders: Vec<(usize, usize)> = PLACEHOLDER
            .as_ref()
            .map(|re| re.find_iter(&normalized).map(|m| (m.start(), m.end())).collect())
            .unwrap_or_default();
        let numbers = numbers::find_numbers(&normalized, language, &placeholders);

        let (intent, confidence) = classify_intent(&normalized);
        let business_terms = self.business_terms(&normalized, language);

        tracing::debug!(
            normalized = %normalized,
            intent = intent.map(Intent::as_str).unwrap_or("none"),
            confidence,
            dates = dates.len(),
            numbers = numbers.len(),
            "normalized question"
        );

        NormalizedQuery {
            original: text.to_string(),
            normalized,
            language,
            dates,
            numbers,
            business_terms,
            intent,
            confidence,
        }
    }

    fn business_terms(&self, normalized: &str, language: Language) -> Vec<String> {
        let mut terms: Vec<String> = Vec::new();
        let mut push = |term: &str| {
            if !terms.iter().any(|t| t == term) {
                terms.push(term.to_string());
            }
        };

        for term in canonical_terms(language) {
            if contains_word(normalized, term) {
                push(term);
            }
        }

        for entry in self.glossary.iter() {
            let hit = entry.surface_forms().any(|form| {
                contains_word(normalized, &form) || contains_word(normalized, &form.replace(' ', "_"))
            });
            if hit {
                push(&entry.term);
            }
        }

        terms
    }
}

/// Whole-word containment using Unicode word characters.
pub(crate) fn contains_word(text: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return false;
    }
    let is_word = |c: char| c.is_alphanumeric() || c == '_';
    text.match_indices(needle).any(|(start, _)| {
        let before = text[..start].chars().next_back();
        let after = text[start + needle.len()..].chars().next();
        !before.is_some_and(is_word) && !after.is_some_and(is_word)
    })
}
