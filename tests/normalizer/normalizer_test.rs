//! Integration tests for question normalization.

use nl2sql::config::NormalizerSettings;
use nl2sql::normalizer::{
    extract_dates, DateExpr, DateKind, DateUnit, Intent, Language, Normalizer,
};
use nl2sql::schema::{BusinessGlossary, BusinessTerm};

fn normalize(text: &str) -> nl2sql::normalizer::NormalizedQuery {
    Normalizer::default().normalize(text)
}

// ============================================================================
// Language and Synonyms
// ============================================================================

#[test]
fn test_russian_question_is_canonicalized() {
    let q = normalize("Количество заказов");
    assert_eq!(q.language, Language::Russian);
    assert_eq!(q.normalized, "количество заказы");
    assert_eq!(q.original, "Количество заказов");
}

#[test]
fn test_english_question() {
    let q = normalize("Show customers by region");
    assert_eq!(q.language, Language::English);
    assert_eq!(q.intent, Some(Intent::Select));
}

#[test]
fn test_kazakh_question() {
    let q = normalize("тапсырыстар бойынша көрсет");
    assert_eq!(q.language, Language::Kazakh);
}

#[test]
fn test_fallback_language_from_settings() {
    let settings = NormalizerSettings {
        fallback_language: Language::English,
        ..NormalizerSettings::default()
    };
    let normalizer = Normalizer::new(BusinessGlossary::with_defaults(), &settings);
    assert_eq!(normalizer.normalize("12345").language, Language::English);
}

// ============================================================================
// Dates and Numbers
// ============================================================================

#[test]
fn test_dates_become_placeholders() {
    let q = normalize("выручка за последние 7 дней больше 100");
    assert_eq!(q.normalized, "выручка [DATE:0] больше 100");
    assert_eq!(q.dates.len(), 1);
    assert_eq!(q.dates[0].resolved, DateExpr::past(7, DateUnit::Day));
    assert_eq!(q.dates[0].kind, DateKind::RelativeWithNumber);

    // The day count inside the date span is not a number.
    assert_eq!(q.numbers.len(), 1);
    assert_eq!(q.numbers[0].value, 100.0);
}

#[test]
fn test_search_text_drops_placeholders() {
    let q = normalize("заказы за последние 7 дней");
    assert_eq!(q.search_text(), "заказы");
}

#[test]
fn test_several_dates_keep_text_order() {
    let q = normalize("заказы с 01.02.2024 по 2024-03-15");
    assert_eq!(q.dates.len(), 2);
    assert_eq!(q.dates[0].resolved.to_string(), "2024-02-01");
    assert_eq!(q.dates[1].resolved.to_string(), "2024-03-15");
    assert!(q.normalized.contains("[DATE:0]"));
    assert!(q.normalized.contains("[DATE:1]"));
}

#[test]
fn test_english_relative_dates() {
    let dates = extract_dates("orders last 3 months and yesterday", Language::English);
    assert_eq!(dates.len(), 2);
    assert_eq!(dates[0].resolved, DateExpr::past(3, DateUnit::Month));
    assert_eq!(dates[1].resolved, DateExpr::past(1, DateUnit::Day));
}

#[test]
fn test_impossible_date_is_ignored() {
    assert!(extract_dates("заказы 31/02/2024", Language::Russian).is_empty());
}

#[test]
fn test_top_number_within_ceiling() {
    let q = normalize("топ 2.5 и 500 и 7");
    assert_eq!(q.first_whole_number(100), Some(7));
}

// ============================================================================
// Intent and Business Terms
// ============================================================================

#[test]
fn test_intents() {
    let cases = [
        ("количество заказов", Intent::Count),
        ("топ 3 клиента по выручке", Intent::Top),
        ("compare sales by region", Intent::Compare),
        ("revenue over time", Intent::Trend),
        ("sum of amount", Intent::Aggregate),
    ];
    for (text, expected) in cases {
        assert_eq!(normalize(text).intent, Some(expected), "intent of {text:?}");
    }
}

#[test]
fn test_no_intent_means_zero_confidence() {
    let q = normalize("клиенты");
    assert_eq!(q.intent, None);
    assert_eq!(q.confidence, 0.0);
}

#[test]
fn test_confidence_is_hits_over_tokens() {
    let q = normalize("количество заказов");
    assert_eq!(q.confidence, 0.5);
}

#[test]
fn test_glossary_terms_found() {
    let q = normalize("средний чек по месяцам");
    assert!(q.business_terms.contains(&"средний чек".to_string()));
}

#[test]
fn test_custom_glossary_term() {
    let glossary: BusinessGlossary = [BusinessTerm::new("churn", "lost customers")
        .synonyms(&["отток"])
        .related_tables(&["customers"])]
    .into_iter()
    .collect();
    let normalizer = Normalizer::new(glossary, &NormalizerSettings::default());
    let q = normalizer.normalize("отток за месяц");
    assert!(q.business_terms.contains(&"churn".to_string()));
}

#[test]
fn test_normalization_is_deterministic() {
    let text = "топ 5 клиентов по выручке за последний квартал";
    assert_eq!(normalize(text), normalize(text));
}

#[test]
fn test_empty_question() {
    let q = normalize("");
    assert!(q.normalized.is_empty());
    assert!(q.dates.is_empty());
    assert!(q.numbers.is_empty());
    assert_eq!(q.intent, None);
}
