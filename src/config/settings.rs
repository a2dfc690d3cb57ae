//! TOML-based configuration for nl2sql.
//!
//! Supports a config file (nl2sql.toml) with environment variable expansion.
//!
//! Example configuration:
//! ```toml
//! [schema]
//! path = "${NL2SQL_SCHEMA}"
//!
//! [normalizer]
//! fallback_language = "ru"
//! confidence_floor = 0.05
//!
//! [retrieval]
//! index = "tfidf"
//! max_features = 1000
//!
//! [planner]
//! max_tables = 3
//! limit_ceiling = 100
//!
//! [sql]
//! dialect = "postgres"
//! default_limit = 100
//! max_limit = 1000
//! ```

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use crate::normalizer::Language;
use crate::retrieval::IndexKind;
use crate::sql::Dialect;

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("no config file at {0}")]
    FileNotFound(PathBuf),

    #[error("cannot read config file: {0}")]
    Read(#[from] std::io::Error),

    #[error("malformed config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("environment variable {0} is not set")]
    MissingEnvVar(String),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    pub schema: SchemaSettings,
    pub normalizer: NormalizerSettings,
    pub retrieval: RetrievalSettings,
    pub planner: PlannerSettings,
    pub sql: SqlSettings,
}

/// Where the schema snapshot lives.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SchemaSettings {
    /// Snapshot JSON path (supports ${ENV_VAR} expansion).
    pub path: Option<String>,
}

impl SchemaSettings {
    /// The snapshot path with environment variables expanded.
    pub fn resolved_path(&self) -> Result<Option<PathBuf>, SettingsError> {
        self.path
            .as_deref()
            .map(|p| expand_env_vars(p).map(PathBuf::from))
            .transpose()
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct NormalizerSettings {
    /// Language assumed when detection finds no signal.
    pub fallback_language: Language,

    /// Below this intent confidence the default strategy is used.
    pub confidence_floor: f64,
}

impl Default for NormalizerSettings {
    fn default() -> Self {
        Self {
            fallback_language: Language::Russian,
            confidence_floor: 0.05,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RetrievalSettings {
    /// Text similarity strategy: "tfidf" or "keyword".
    pub index: IndexKind,

    /// Vocabulary cap for the TF-IDF index.
    pub max_features: usize,

    /// Minimum similarity for unified search results.
    pub min_score: f64,

    /// Table hits considered per search.
    pub table_limit: usize,

    /// Column hits considered per search.
    pub column_limit: usize,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            index: IndexKind::TfIdf,
            max_features: 1000,
            min_score: 0.1,
            table_limit: 5,
            column_limit: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PlannerSettings {
    pub max_tables: usize,
    pub select_columns: usize,
    pub top_columns: usize,
    pub default_columns: usize,

    /// Largest number accepted as a "top n" limit.
    pub limit_ceiling: u64,

    pub max_joins: usize,
}

impl Default for PlannerSettings {
    fn default() -> Self {
        Self {
            max_tables: 3,
            select_columns: 10,
            top_columns: 5,
            default_columns: 8,
            limit_ceiling: 100,
            max_joins: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SqlSettings {
    /// Dialect used when a caller does not pick one.
    pub dialect: Dialect,
    pub use_table_aliases: bool,
    pub quote_identifiers: bool,
    pub default_limit: u64,
    pub max_limit: u64,

    /// Prefix the SQL with an `-- intent:` comment.
    pub include_comments: bool,
}

impl Default for SqlSettings {
    fn default() -> Self {
        Self {
            dialect: Dialect::Postgres,
            use_table_aliases: false,
            quote_identifiers: false,
            default_limit: 100,
            max_limit: 1000,
            include_comments: false,
        }
    }
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let settings: Settings = toml::from_str(&content)?;
        settings.validate()?;
        tracing::debug!(path = %path.display(), "loaded settings");
        Ok(settings)
    }

    /// First config found among `$NL2SQL_CONFIG`, `./nl2sql.toml` and
    /// `<config dir>/nl2sql/config.toml`, or the defaults when none exists.
    ///
    /// A path named by `NL2SQL_CONFIG` must exist.
    pub fn load() -> Result<Self, SettingsError> {
        if let Ok(path) = env::var("NL2SQL_CONFIG") {
            return Self::from_file(path);
        }

        let candidates = std::iter::once(PathBuf::from("nl2sql.toml"))
            .chain(dirs::config_dir().map(|dir| dir.join("nl2sql").join("config.toml")));
        for candidate in candidates {
            if candidate.is_file() {
                return Self::from_file(&candidate);
            }
        }

        tracing::debug!("no config file found, using defaults");
        Ok(Settings::default())
    }

    /// Reject combinations the pipeline cannot honour.
    pub fn validate(&self) -> Result<(), SettingsError> {
        let sql = &self.sql;
        if sql.default_limit == 0 || sql.max_limit == 0 {
            return Err(SettingsError::Invalid("sql limits must be positive".to_string()));
        }
        if sql.default_limit > sql.max_limit {
            return Err(SettingsError::Invalid(format!(
                "sql.default_limit ({}) exceeds sql.max_limit ({})",
                sql.default_limit, sql.max_limit
            )));
        }
        if self.planner.limit_ceiling == 0 {
            return Err(SettingsError::Invalid(
                "planner.limit_ceiling must be positive".to_string(),
            ));
        }
        if self.planner.max_tables == 0 {
            return Err(SettingsError::Invalid(
                "planner.max_tables must be at least 1".to_string(),
            ));
        }
        let floor = self.normalizer.confidence_floor;
        if !(0.0..=1.0).contains(&floor) {
            return Err(SettingsError::Invalid(format!(
                "normalizer.confidence_floor ({floor}) must be between 0 and 1"
            )));
        }
        Ok(())
    }
}

static ENV_REF: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"\$(?:\{([^}]*)\}|([A-Za-z0-9_]+))").ok());

/// Replace `${VAR}` and `$VAR` with their values. A `$` not followed by a
/// name is kept as is.
pub fn expand_env_vars(s: &str) -> Result<String, SettingsError> {
    let Some(pattern) = ENV_REF.as_ref() else {
        return Ok(s.to_string());
    };

    let mut missing = None;
    let expanded = pattern.replace_all(s, |caps: &Captures| {
        let name = caps.get(1).or_else(|| caps.get(2)).map_or("", |m| m.as_str());
        env::var(name).unwrap_or_else(|_| {
            missing.get_or_insert_with(|| name.to_string());
            String::new()
        })
    });

    match missing {
        Some(name) => Err(SettingsError::MissingEnvVar(name)),
        None => Ok(expanded.into_owned()),
    }
}
