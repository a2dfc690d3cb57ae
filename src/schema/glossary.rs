//! Business glossary: domain vocabulary mapped onto schema objects.
//!
//! The glossary is an explicit value built once at pipeline start (defaults
//! merged with whatever the schema snapshot ships) and handed to the
//! normalizer and retriever. There is no process-wide dictionary.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A business term with its definition and links into the schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessTerm {
    pub term: String,
    #[serde(default)]
    pub definition: String,
    #[serde(default)]
    pub synonyms: Vec<String>,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default)]
    pub examples: Vec<String>,
    #[serde(default)]
    pub related_tables: Vec<String>,
    #[serde(default)]
    pub related_columns: Vec<String>,
}

fn default_category() -> String {
    "general".to_string()
}

impl BusinessTerm {
    pub fn new(term: impl Into<String>, definition: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            definition: definition.into(),
            synonyms: Vec::new(),
            category: default_category(),
            examples: Vec::new(),
            related_tables: Vec::new(),
            related_columns: Vec::new(),
        }
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn synonyms(mut self, synonyms: &[&str]) -> Self {
        self.synonyms = synonyms.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn examples(mut self, examples: &[&str]) -> Self {
        self.examples = examples.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn related_tables(mut self, tables: &[&str]) -> Self {
        self.related_tables = tables.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn related_columns(mut self, columns: &[&str]) -> Self {
        self.related_columns = columns.iter().map(|s| s.to_string()).collect();
        self
    }

    /// The term followed by its synonyms, lowercased.
    pub fn surface_forms(&self) -> impl Iterator<Item = String> + '_ {
        std::iter::once(&self.term)
            .chain(self.synonyms.iter())
            .map(|s| s.to_lowercase())
    }

    /// Text used to index this term for retrieval.
    pub fn document(&self) -> String {
        format!(
            "business term {} {} {} {} category: {}",
            self.term,
            self.definition,
            self.synonyms.join(" "),
            self.examples.join(" "),
            self.category
        )
    }
}

/// Collection of business terms keyed by lowercased term.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BusinessGlossary {
    terms: BTreeMap<String, BusinessTerm>,
}

impl BusinessGlossary {
    /// An empty glossary.
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in retail/finance vocabulary.
    pub fn with_defaults() -> Self {
        let mut glossary = Self::new();
        for term in default_terms() {
            glossary.insert(term);
        }
        glossary
    }

    /// Insert or replace a term.
    pub fn insert(&mut self, term: BusinessTerm) {
        self.terms.insert(term.term.to_lowercase(), term);
    }

    /// Overlay another glossary; its terms replace ours on conflict.
    pub fn merge(&mut self, other: BusinessGlossary) {
        for (key, term) in other.terms {
            self.terms.insert(key, term);
        }
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Terms in key order.
    pub fn iter(&self) -> impl Iterator<Item = &BusinessTerm> {
        self.terms.values()
    }

    pub fn get(&self, term: &str) -> Option<&BusinessTerm> {
        self.terms.get(&term.to_lowercase())
    }

    /// Find a term by its name or any synonym.
    pub fn lookup(&self, surface: &str) -> Option<&BusinessTerm> {
        let needle = surface.trim().to_lowercase();
        self.get(&needle)
            .or_else(|| self.iter().find(|t| t.surface_forms().any(|s| s == needle)))
    }

    /// Fuzzy term search.
    ///
    /// Scores: surface form contained in the query 1.0, any word of a surface
    /// form in the query 0.7, query found in the definition 0.5, query found
    /// in an example 0.4. Results below `threshold` are dropped.
    pub fn search(&self, query: &str, threshold: f64) -> Vec<(&BusinessTerm, f64)> {
        let query = query.to_lowercase();
        let mut results: Vec<(&BusinessTerm, f64)> = Vec::new();

        for term in self.iter() {
            let forms: Vec<String> = term.surface_forms().collect();
            let score = if forms.iter().any(|f| query.contains(f.as_str())) {
                1.0
            } else if forms
                .iter()
                .any(|f| f.split_whitespace().any(|w| query.contains(w)))
            {
                0.7
            } else if !query.is_empty() && term.definition.to_lowercase().contains(&query) {
                0.5
            } else if !query.is_empty()
                && term.examples.iter().any(|e| e.to_lowercase().contains(&query))
            {
                0.4
            } else {
                0.0
            };
            if score >= threshold && score > 0.0 {
                results.push((term, score));
            }
        }

        results.sort_by(|a, b| b.1.total_cmp(&a.1));
        results
    }
}

impl FromIterator<BusinessTerm> for BusinessGlossary {
    fn from_iter<I: IntoIterator<Item = BusinessTerm>>(iter: I) -> Self {
        let mut glossary = BusinessGlossary::new();
        for term in iter {
            glossary.insert(term);
        }
        glossary
    }
}

fn default_terms() -> Vec<BusinessTerm> {
    vec![
        BusinessTerm::new("прибыль", "revenue - costs")
            .synonyms(&["доход", "профит", "выгода", "доходность"])
            .category("финансы")
            .examples(&["прибыль за месяц", "общая прибыль"])
            .related_columns(&["revenue", "costs", "profit"]),
        BusinessTerm::new("маржинальность", "(revenue - costs) / revenue * 100")
            .synonyms(&["маржа", "рентабельность"])
            .category("финансы")
            .examples(&["маржинальность по категориям", "средняя маржа"])
            .related_columns(&["revenue", "costs"]),
        BusinessTerm::new("средний чек", "AVG(order_amount)")
            .synonyms(&["средний заказ", "aov", "average order value"])
            .category("продажи")
            .examples(&["средний чек клиентов", "aov по сегментам"])
            .related_tables(&["orders"])
            .related_columns(&["amount", "order_amount"]),
        BusinessTerm::new("выручка", "SUM(revenue)")
            .synonyms(&["оборот", "доходы", "revenue"])
            .category("финансы")
            .examples(&["общая выручка", "выручка за период"])
            .related_columns(&["revenue", "amount", "sales"]),
        BusinessTerm::new("остатки", "current_stock")
            .synonyms(&["склад", "запасы", "инвентарь", "stock"])
            .category("логистика")
            .examples(&["остатки товаров", "остатки на складе"])
            .related_tables(&["inventory"])
            .related_columns(&["current_stock", "stock", "quantity"]),
        BusinessTerm::new("клиенты", "customers")
            .synonyms(&["покупатели", "заказчики", "пользователи"])
            .category("CRM")
            .examples(&["активные клиенты", "новые клиенты"])
            .related_tables(&["customers", "users"]),
        BusinessTerm::new("заказы", "orders")
            .synonyms(&["покупки", "сделки", "транзакции"])
            .category("продажи")
            .examples(&["новые заказы", "выполненные заказы"])
            .related_tables(&["orders", "sales"]),
        BusinessTerm::new("товары", "products")
            .synonyms(&["продукты", "номенклатура"])
            .category("каталог")
            .examples(&["популярные товары", "новые товары"])
            .related_tables(&["products", "items"]),
    ]
}
