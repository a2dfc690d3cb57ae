//! Language detection by keyword-family scoring.

use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::compile_all;

/// Supported input languages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Language {
    #[default]
    #[serde(rename = "ru")]
    Russian,
    #[serde(rename = "kz")]
    Kazakh,
    #[serde(rename = "en")]
    English,
}

impl Language {
    /// Detection order; earlier languages win ties.
    pub const ALL: [Language; 3] = [Language::Russian, Language::Kazakh, Language::English];

    pub fn code(self) -> &'static str {
        match self {
            Language::Russian => "ru",
            Language::Kazakh => "kz",
            Language::English => "en",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ru" | "russian" => Ok(Language::Russian),
            "kz" | "kk" | "kazakh" => Ok(Language::Kazakh),
            "en" | "english" => Ok(Language::English),
            other => Err(format!("unknown language '{other}', expected ru, kz or en")),
        }
    }
}

// Action verbs, domain nouns, prepositions, time words.
static RUSSIAN: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile_all(&[
        r"\b(покажи|показать|вывести|найти|получить|дай|дайте)\b",
        r"\b(клиенты|заказы|продажи|товары|прибыль|выручка)\b",
        r"\b(за|по|для|с|в|на|от|до)\b",
        r"\b(сегодня|вчера|неделя|месяц|год)\b",
    ])
});

static KAZAKH: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile_all(&[
        r"\b(көрсет|көрсетіңіз|табу|алу|беру)\b",
        r"\b(клиенттер|тапсырыстар|сатулар|тауарлар)\b",
        r"\b(үшін|бойынша|дейін|кейін)\b",
        r"\b(бүгін|кеше|апта|ай)\b",
    ])
});

static ENGLISH: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile_all(&[
        r"\b(show|get|find|display|list|select)\b",
        r"\b(customers|orders|sales|products|revenue|profit)\b",
        r"\b(for|by|from|to|with|in|on)\b",
        r"\b(today|yesterday|week|month|year)\b",
    ])
});

fn families(language: Language) -> &'static [Regex] {
    match language {
        Language::Russian => &RUSSIAN,
        Language::Kazakh => &KAZAKH,
        Language::English => &ENGLISH,
    }
}

/// Total keyword matches for `language` in already lowercased text.
pub fn language_score(text: &str, language: Language) -> usize {
    families(language)
        .iter()
        .map(|re| re.find_iter(text).count())
        .sum()
}

/// Detect the language of `text`, falling back when nothing matches.
pub fn detect_language(text: &str, fallback: Language) -> Language {
    let lower = text.to_lowercase();
    let mut best = (fallback, 0);
    for language in Language::ALL {
        let score = language_score(&lower, language);
        if score > best.1 {
            best = (language, score);
        }
    }
    best.0
}
