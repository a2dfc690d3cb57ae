//! Configuration module for nl2sql.
//!
//! Handles the TOML settings file and environment variable expansion.

mod settings;

pub use settings::{
    expand_env_vars, NormalizerSettings, PlannerSettings, RetrievalSettings, SchemaSettings, Settings,
    SettingsError, SqlSettings,
};
