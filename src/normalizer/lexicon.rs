//! Synonym tables and canonical business terms per language.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use super::compile;
use super::language::Language;

type Table = &'static [(&'static str, &'static [&'static str])];

const RUSSIAN: Table = &[
    // actions
    ("покажи", &["показать", "вывести", "отобрази", "дай", "дайте", "выведи"]),
    ("найди", &["найти", "отыщи", "ищи", "поиск"]),
    ("получи", &["получить", "взять", "извлечь"]),
    ("выбери", &["выбрать", "отбери", "отобрать", "фильтруй"]),
    // entities, including common inflections
    (
        "клиенты",
        &[
            "клиентов", "клиента", "клиентам", "клиентами", "клиентах", "клиенту", "клиент",
            "покупатели", "покупателей", "заказчики", "потребители", "пользователи", "юзеры",
        ],
    ),
    (
        "заказы",
        &["заказов", "заказа", "заказам", "заказами", "заказ", "покупки", "сделки", "транзакции", "ордера"],
    ),
    (
        "товары",
        &["товаров", "товара", "товарам", "товар", "продукты", "продуктов", "изделия", "номенклатура", "продукция"],
    ),
    ("продажи", &["продаж", "продажам", "продажах", "реализация", "сбыт"]),
    ("остатки", &["остатков", "остаток", "склад", "запасы", "инвентарь"]),
    // metrics
    ("выручка", &["выручки", "выручке", "выручку", "выручкой", "оборот", "доходы", "поступления"]),
    ("прибыль", &["прибыли", "доход", "профит", "чистая прибыль"]),
    ("маржа", &["маржи", "маржинальность", "рентабельность", "доходность"]),
    ("средний_чек", &["средний чек", "среднего чека", "средний заказ", "aov", "average order value"]),
    // aggregates
    ("количество", &["число", "кол-во", "штук"]),
    ("сумма", &["суммы", "сумму", "итого", "всего"]),
    ("среднее", &["средняя", "среднего"]),
    ("максимум", &["макс", "наибольший", "максимальный"]),
    ("минимум", &["мин", "наименьший", "минимальный"]),
    // comparisons and ordering
    ("где", &["с условием", "при условии"]),
    ("больше", &["выше"]),
    ("меньше", &["ниже"]),
    ("равно", &["равен", "равна"]),
    ("топ", &["лучшие", "первые"]),
    ("сортировка", &["сортировать", "упорядочить"]),
];

const ENGLISH: Table = &[
    ("show", &["display", "list", "fetch", "retrieve"]),
    ("find", &["search", "look for", "locate"]),
    ("select", &["choose", "pick"]),
    ("customers", &["clients", "buyers", "customer", "client"]),
    ("orders", &["purchases", "order"]),
    ("products", &["goods", "merchandise", "product"]),
    ("inventory", &["stock", "warehouse"]),
    ("revenue", &["income", "turnover"]),
    ("profit", &["earnings", "net income"]),
    ("margin", &["profitability"]),
    ("average_order", &["average order value", "average order", "aov"]),
    ("count", &["total number", "number of"]),
    ("average", &["avg", "mean"]),
    ("maximum", &["max", "highest"]),
    ("minimum", &["min", "lowest"]),
    ("greater", &["more than", "greater than"]),
    ("less", &["less than", "fewer than", "under"]),
];

const KAZAKH: Table = &[
    ("көрсет", &["көрсетіңіз", "шығар"]),
    ("тап", &["табу", "іздеу"]),
    ("клиенттер", &["сатып алушылар"]),
    ("тапсырыстар", &["сатып алулар"]),
    ("тауарлар", &["өнімдер"]),
];

/// Canonical business terms recognised without a glossary.
pub fn canonical_terms(language: Language) -> &'static [&'static str] {
    match language {
        Language::Russian => &[
            "клиенты", "заказы", "товары", "продажи", "остатки", "выручка", "прибыль", "маржа",
            "средний_чек", "количество", "сумма", "среднее", "максимум", "минимум",
        ],
        Language::English => &[
            "customers", "orders", "products", "sales", "inventory", "revenue", "profit", "margin",
            "average_order", "count", "sum", "average", "maximum", "minimum",
        ],
        Language::Kazakh => &["клиенттер", "тапсырыстар", "тауарлар"],
    }
}

struct SynonymTable {
    regex: Regex,
    canonical: HashMap<String, &'static str>,
}

fn build(table: Table) -> Option<SynonymTable> {
    let mut canonical: HashMap<String, &'static str> = HashMap::new();
    for (term, synonyms) in table {
        for synonym in synonyms.iter() {
            canonical.entry(synonym.to_lowercase()).or_insert(*term);
        }
    }
    if canonical.is_empty() {
        return None;
    }

    // Longest first so phrases win over their single words.
    let mut surfaces: Vec<&String> = canonical.keys().collect();
    surfaces.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()).then(a.cmp(b)));
    let alternation: Vec<String> = surfaces.iter().map(|s| regex::escape(s)).collect();
    let regex = compile(&format!(r"(?i)\b(?:{})\b", alternation.join("|")))?;

    Some(SynonymTable { regex, canonical })
}

static TABLES: Lazy<HashMap<Language, SynonymTable>> = Lazy::new(|| {
    [
        (Language::Russian, RUSSIAN),
        (Language::Kazakh, KAZAKH),
        (Language::English, ENGLISH),
    ]
    .into_iter()
    .filter_map(|(lang, table)| build(table).map(|t| (lang, t)))
    .collect()
});

/// Lowercase `text` and replace every synonym with its canonical term.
pub fn normalize_synonyms(text: &str, language: Language) -> String {
    let lower = text.to_lowercase();
    let Some(table) = TABLES.get(&language) else {
        return lower;
    };
    table
        .regex
        .replace_all(&lower, |caps: &Captures<'_>| {
            let surface = &caps[0];
            table
                .canonical
                .get(surface)
                .map(|c| c.to_string())
                .unwrap_or_else(|| surface.to_string())
        })
        .into_owned()
}
