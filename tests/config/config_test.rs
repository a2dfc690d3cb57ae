//! Integration tests for loading and validating `nl2sql.toml`.

use std::path::PathBuf;

use nl2sql::config::{Settings, SettingsError};
use nl2sql::normalizer::Language;
use nl2sql::retrieval::IndexKind;
use nl2sql::sql::Dialect;

fn write_config(name: &str, content: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("nl2sql-config-test-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_full_config_file() {
    let path = write_config(
        "full.toml",
        r#"
[schema]
path = "/data/schema.json"

[normalizer]
fallback_language = "en"
confidence_floor = 0.2

[retrieval]
index = "keyword"
max_features = 500
min_score = 0.25

[planner]
max_tables = 2
max_joins = 3

[sql]
dialect = "mysql"
use_table_aliases = true
default_limit = 50
max_limit = 500
"#,
    );

    let settings = Settings::from_file(&path).unwrap();
    assert_eq!(
        settings.schema.resolved_path().unwrap(),
        Some(PathBuf::from("/data/schema.json"))
    );
    assert_eq!(settings.normalizer.fallback_language, Language::English);
    assert_eq!(settings.normalizer.confidence_floor, 0.2);
    assert_eq!(settings.retrieval.index, IndexKind::Keyword);
    assert_eq!(settings.retrieval.max_features, 500);
    assert_eq!(settings.planner.max_tables, 2);
    assert_eq!(settings.planner.max_joins, 3);
    assert_eq!(settings.sql.dialect, Dialect::MySql);
    assert!(settings.sql.use_table_aliases);
    assert_eq!(settings.sql.default_limit, 50);

    // Omitted keys keep their defaults.
    assert_eq!(settings.retrieval.table_limit, 5);
    assert_eq!(settings.planner.limit_ceiling, 100);
    assert!(!settings.sql.quote_identifiers);
}

#[test]
fn test_empty_file_is_default() {
    let path = write_config("empty.toml", "");
    assert_eq!(Settings::from_file(&path).unwrap(), Settings::default());
}

#[test]
fn test_missing_file() {
    let err = Settings::from_file("/no/such/dir/nl2sql.toml").unwrap_err();
    assert!(matches!(err, SettingsError::FileNotFound(_)));
}

#[test]
fn test_parse_error() {
    let path = write_config("broken.toml", "[sql\ndialect = ");
    assert!(matches!(
        Settings::from_file(&path).unwrap_err(),
        SettingsError::Parse(_)
    ));

    let path = write_config("bad-dialect.toml", "[sql]\ndialect = \"oracle\"\n");
    assert!(matches!(
        Settings::from_file(&path).unwrap_err(),
        SettingsError::Parse(_)
    ));
}

#[test]
fn test_invalid_limits_rejected_on_load() {
    let path = write_config(
        "limits.toml",
        "[sql]\ndefault_limit = 2000\nmax_limit = 1000\n",
    );
    let err = Settings::from_file(&path).unwrap_err();
    assert!(
        matches!(&err, SettingsError::Invalid(reason) if reason.contains("exceeds sql.max_limit")),
        "{err}"
    );
}

#[test]
fn test_schema_path_env_expansion() {
    std::env::set_var("NL2SQL_CONFIG_TEST_DIR", "/srv/snapshots");
    let path = write_config(
        "env.toml",
        "[schema]\npath = \"${NL2SQL_CONFIG_TEST_DIR}/shop.json\"\n",
    );
    let settings = Settings::from_file(&path).unwrap();
    assert_eq!(
        settings.schema.resolved_path().unwrap(),
        Some(PathBuf::from("/srv/snapshots/shop.json"))
    );
    std::env::remove_var("NL2SQL_CONFIG_TEST_DIR");

    let path = write_config(
        "env-missing.toml",
        "[schema]\npath = \"${NL2SQL_CONFIG_TEST_UNSET_12345}/shop.json\"\n",
    );
    let settings = Settings::from_file(&path).unwrap();
    assert!(matches!(
        settings.schema.resolved_path(),
        Err(SettingsError::MissingEnvVar(name)) if name == "NL2SQL_CONFIG_TEST_UNSET_12345"
    ));
}

#[test]
fn test_settings_roundtrip_through_toml() {
    let mut settings = Settings::default();
    settings.sql.dialect = Dialect::Snowflake;
    settings.planner.max_joins = 2;
    let text = toml::to_string(&settings).unwrap();
    let parsed: Settings = toml::from_str(&text).unwrap();
    assert_eq!(parsed, settings);
}
