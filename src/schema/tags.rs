//! Semantic column tags.
//!
//! Tags are a closed set stored as a small bitset so that planner branches on
//! column meaning are exhaustive. Snapshot producers emit free-form strings;
//! [`SemanticTag::parse`] maps the known aliases onto the closed set and
//! [`infer_tags`] fills in tags for columns that arrive without any.

use std::fmt;

use serde::{Serialize, Serializer};

/// A semantic classification of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SemanticTag {
    Number,
    Text,
    Date,
    Money,
    Identifier,
    Category,
    Contact,
    Flag,
}

impl SemanticTag {
    /// All tags in bit order.
    pub const ALL: [SemanticTag; 8] = [
        SemanticTag::Number,
        SemanticTag::Text,
        SemanticTag::Date,
        SemanticTag::Money,
        SemanticTag::Identifier,
        SemanticTag::Category,
        SemanticTag::Contact,
        SemanticTag::Flag,
    ];

    fn bit(self) -> u8 {
        1 << (self as u8)
    }

    /// Lowercase name used in documents and serialized output.
    pub fn as_str(self) -> &'static str {
        match self {
            SemanticTag::Number => "number",
            SemanticTag::Text => "text",
            SemanticTag::Date => "date",
            SemanticTag::Money => "money",
            SemanticTag::Identifier => "identifier",
            SemanticTag::Category => "category",
            SemanticTag::Contact => "contact",
            SemanticTag::Flag => "flag",
        }
    }

    /// Parse a free-form tag string, accepting the aliases schema dumpers emit.
    ///
    /// Returns `None` for tags outside the closed set (e.g. `required`).
    pub fn parse(raw: &str) -> Option<Self> {
        let tag = match raw.trim().to_lowercase().as_str() {
            "number" | "numeric" | "measure" | "integer" | "decimal" => SemanticTag::Number,
            "text" | "string" | "name" => SemanticTag::Text,
            "date" | "time" | "temporal" | "timestamp" | "datetime" => SemanticTag::Date,
            "money" | "monetary" | "currency" | "amount" => SemanticTag::Money,
            "identifier" | "id" | "primary_key" | "key" => SemanticTag::Identifier,
            "category" | "status" | "categorical" | "enum" => SemanticTag::Category,
            "contact" | "pii" | "email" | "phone" => SemanticTag::Contact,
            "flag" | "boolean" | "bool" => SemanticTag::Flag,
            _ => return None,
        };
        Some(tag)
    }
}

impl fmt::Display for SemanticTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A set of [`SemanticTag`]s.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct TagSet(u8);

impl TagSet {
    pub const fn empty() -> Self {
        TagSet(0)
    }

    pub fn insert(&mut self, tag: SemanticTag) {
        self.0 |= tag.bit();
    }

    pub fn with(mut self, tag: SemanticTag) -> Self {
        self.insert(tag);
        self
    }

    pub fn contains(&self, tag: SemanticTag) -> bool {
        self.0 & tag.bit() != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    /// Money or Number: columns that can be summed and ordered by magnitude.
    pub fn is_measure(&self) -> bool {
        self.contains(SemanticTag::Money) || self.contains(SemanticTag::Number)
    }

    /// Iterate tags in bit order.
    pub fn iter(&self) -> impl Iterator<Item = SemanticTag> + '_ {
        SemanticTag::ALL.into_iter().filter(|t| self.contains(*t))
    }

    /// Build a set from free-form strings, returning the set and the strings
    /// that did not map to a known tag.
    pub fn from_strings<'a>(raw: impl IntoIterator<Item = &'a str>) -> (Self, Vec<&'a str>) {
        let mut set = TagSet::empty();
        let mut unknown = Vec::new();
        for s in raw {
            match SemanticTag::parse(s) {
                Some(tag) => set.insert(tag),
                None => unknown.push(s),
            }
        }
        (set, unknown)
    }
}

impl FromIterator<SemanticTag> for TagSet {
    fn from_iter<I: IntoIterator<Item = SemanticTag>>(iter: I) -> Self {
        let mut set = TagSet::empty();
        for tag in iter {
            set.insert(tag);
        }
        set
    }
}

impl fmt::Display for TagSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.iter().map(SemanticTag::as_str).collect();
        f.write_str(&names.join(" "))
    }
}

impl Serialize for TagSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter().map(SemanticTag::as_str))
    }
}

// ============================================================================
// Inference
// ============================================================================

const MONEY_HINTS: &[&str] = &[
    "amount", "price", "cost", "revenue", "total", "sum", "salary", "balance", "profit", "fee",
];
const CONTACT_HINTS: &[&str] = &["email", "phone", "mobile", "address"];
const CATEGORY_HINTS: &[&str] = &["status", "type", "category", "segment", "kind", "region", "state"];
const DATE_HINTS: &[&str] = &["date", "time", "_at", "_on"];

/// Infer tags for a column from its declared type and name.
pub fn infer_tags(name: &str, data_type: &str, primary_key: bool) -> TagSet {
    let name = name.to_lowercase();
    let ty = data_type.to_lowercase();
    let mut tags = TagSet::empty();

    let numeric = ["int", "numeric", "decimal", "float", "double", "real", "money", "serial"]
        .iter()
        .any(|t| ty.contains(t));
    if numeric {
        tags.insert(SemanticTag::Number);
    }
    if ["char", "text", "string"].iter().any(|t| ty.contains(t)) {
        tags.insert(SemanticTag::Text);
    }
    if ty.contains("date") || ty.contains("time") {
        tags.insert(SemanticTag::Date);
    }
    if ty.contains("bool") {
        tags.insert(SemanticTag::Flag);
    }

    if primary_key || name == "id" || name.ends_with("_id") {
        tags.insert(SemanticTag::Identifier);
    }
    if (numeric || ty.contains("money")) && MONEY_HINTS.iter().any(|h| name.contains(h)) {
        tags.insert(SemanticTag::Money);
    }
    if CONTACT_HINTS.iter().any(|h| name.contains(h)) {
        tags.insert(SemanticTag::Contact);
    }
    if !tags.contains(SemanticTag::Identifier) && CATEGORY_HINTS.iter().any(|h| name.contains(h)) {
        tags.insert(SemanticTag::Category);
    }
    if tags.is_empty() && DATE_HINTS.iter().any(|h| name.contains(h)) {
        tags.insert(SemanticTag::Date);
    }
    tags
}
