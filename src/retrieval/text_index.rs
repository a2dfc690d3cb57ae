//! Pluggable text similarity over a fixed document set.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Split text into lowercased runs of word characters.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Scores a query against every indexed document.
pub trait TextIndex: Send + Sync + fmt::Debug {
    /// One similarity in `[0, 1]` per document, in document order.
    fn score(&self, query: &str) -> Vec<f64>;

    /// Number of indexed documents.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Which [`TextIndex`] implementation to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexKind {
    #[default]
    TfIdf,
    Keyword,
}

impl IndexKind {
    pub fn build(self, documents: &[String], max_features: usize) -> Box<dyn TextIndex> {
        match self {
            IndexKind::TfIdf => Box::new(TfIdfIndex::new(documents, max_features)),
            IndexKind::Keyword => Box::new(KeywordIndex::new(documents)),
        }
    }
}

impl fmt::Display for IndexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexKind::TfIdf => write!(f, "tfidf"),
            IndexKind::Keyword => write!(f, "keyword"),
        }
    }
}

impl FromStr for IndexKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "tfidf" | "tf-idf" => Ok(IndexKind::TfIdf),
            "keyword" => Ok(IndexKind::Keyword),
            other => Err(format!("unknown index kind '{other}', expected tfidf or keyword")),
        }
    }
}

// ============================================================================
// TF-IDF
// ============================================================================

/// TF-IDF vectors with cosine similarity.
///
/// The vocabulary keeps the `max_features` most frequent tokens across the
/// corpus (ties broken lexically). `idf = ln(n / (1 + df))`, `tf = count / len`.
#[derive(Debug, Clone)]
pub struct TfIdfIndex {
    vocabulary: HashMap<String, usize>,
    idf: Vec<f64>,
    vectors: Vec<Vec<f64>>,
    norms: Vec<f64>,
}

impl TfIdfIndex {
    pub fn new(documents: &[String], max_features: usize) -> Self {
        let tokenized: Vec<Vec<String>> = documents.iter().map(|d| tokenize(d)).collect();

        let mut frequency: BTreeMap<&str, usize> = BTreeMap::new();
        for tokens in &tokenized {
            for token in tokens {
                *frequency.entry(token.as_str()).or_default() += 1;
            }
        }

        let mut ranked: Vec<(&str, usize)> = frequency.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
        ranked.truncate(max_features);

        let vocabulary: HashMap<String, usize> = ranked
            .iter()
            .enumerate()
            .map(|(i, (token, _))| (token.to_string(), i))
            .collect();

        let n = documents.len() as f64;
        let mut df = vec![0usize; vocabulary.len()];
        for tokens in &tokenized {
            let unique: HashSet<&String> = tokens.iter().collect();
            for token in unique {
                if let Some(&i) = vocabulary.get(token) {
                    df[i] += 1;
                }
            }
        }
        let idf: Vec<f64> = df.iter().map(|&d| (n / (1.0 + d as f64)).ln()).collect();

        let mut index = Self {
            vocabulary,
            idf,
            vectors: Vec::with_capacity(tokenized.len()),
            norms: Vec::with_capacity(tokenized.len()),
        };
        for tokens in &tokenized {
            let vector = index.vectorize(tokens);
            index.norms.push(norm(&vector));
            index.vectors.push(vector);
        }
        index
    }

    fn vectorize(&self, tokens: &[String]) -> Vec<f64> {
        let mut vector = vec![0.0; self.vocabulary.len()];
        if tokens.is_empty() {
            return vector;
        }
        let len = tokens.len() as f64;
        for token in tokens {
            if let Some(&i) = self.vocabulary.get(token) {
                vector[i] += 1.0 / len;
            }
        }
        for (value, idf) in vector.iter_mut().zip(&self.idf) {
            *value *= idf;
        }
        vector
    }

    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.len()
    }
}

fn norm(vector: &[f64]) -> f64 {
    vector.iter().map(|v| v * v).sum::<f64>().sqrt()
}

impl TextIndex for TfIdfIndex {
    fn score(&self, query: &str) -> Vec<f64> {
        let query_vector = self.vectorize(&tokenize(query));
        let query_norm = norm(&query_vector);

        self.vectors
            .iter()
            .zip(&self.norms)
            .map(|(doc, &doc_norm)| {
                if query_norm == 0.0 || doc_norm == 0.0 {
                    return 0.0;
                }
                let dot: f64 = doc.iter().zip(&query_vector).map(|(a, b)| a * b).sum();
                (dot / (query_norm * doc_norm)).clamp(0.0, 1.0)
            })
            .collect()
    }

    fn len(&self) -> usize {
        self.vectors.len()
    }
}

// ============================================================================
// Keyword overlap
// ============================================================================

/// Fraction of distinct query tokens present in each document.
#[derive(Debug, Clone)]
pub struct KeywordIndex {
    documents: Vec<HashSet<String>>,
}

impl KeywordIndex {
    pub fn new(documents: &[String]) -> Self {
        Self {
            documents: documents
                .iter()
                .map(|d| tokenize(d).into_iter().collect())
                .collect(),
        }
    }
}

impl TextIndex for KeywordIndex {
    fn score(&self, query: &str) -> Vec<f64> {
        let query: HashSet<String> = tokenize(query).into_iter().collect();
        self.documents
            .iter()
            .map(|doc| {
                if query.is_empty() {
                    return 0.0;
                }
                query.iter().filter(|t| doc.contains(*t)).count() as f64 / query.len() as f64
            })
            .collect()
    }

    fn len(&self) -> usize {
        self.documents.len()
    }
}
