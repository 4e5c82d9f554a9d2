//! Tests for configuration loading from files

use std::io::Write;

use chat_features::config::{AppConfig, DEFAULT_SECTION};
use chat_features::ExtractError;
use tempfile::NamedTempFile;

fn config_file(content: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".toml")
        .tempfile()
        .expect("Failed to create temp config");
    file.write_all(content.as_bytes()).expect("Failed to write config");
    file
}

#[test]
fn test_default_config_values() {
    let config = AppConfig::default();

    assert_eq!(config.database.path, "data/mattermost.db");
    assert_eq!(config.logging.format, "text");
    assert_eq!(config.export.output_path, "mattermost_log_extraction.csv");
    assert!(config.nlp.enable_tagging);
    assert!(config.nlp.enable_sentiment);
    assert!(config.nlp.lexicons.is_empty());
}

#[test]
fn test_load_named_section() {
    let file = config_file(
        r#"
[mattermost]
path = "/srv/mattermost.db"
excluded_bot = "pollbot"

[export]
include_text = true
output_path = "out/features.csv"

[nlp]
sentiment_languages = ["en", "fr"]

[nlp.lexicons]
en = "lexicons/liwc_en.dic"
"#,
    );

    let config = AppConfig::load(Some(file.path()), "mattermost").expect("Failed to load config");
    assert_eq!(config.database.path, "/srv/mattermost.db");
    assert_eq!(config.database.excluded_bot.as_deref(), Some("pollbot"));
    assert!(config.export.include_text);
    assert_eq!(config.export.output_path, "out/features.csv");
    assert_eq!(config.nlp.sentiment_languages, vec!["en", "fr"]);
    assert_eq!(
        config.nlp.lexicons.get("en").map(|p| p.display().to_string()),
        Some("lexicons/liwc_en.dic".to_string())
    );
    // Unset values keep their defaults
    assert_eq!(config.logging.level, "info");
    assert_eq!(config.nlp.tagger_languages, vec!["en", "fr", "de", "it"]);
}

#[test]
fn test_database_section_defaults_fill_missing_keys() {
    let file = config_file("[database]\npath = \"chat.db\"\n");

    let config = AppConfig::load(Some(file.path()), DEFAULT_SECTION).expect("Failed to load config");
    assert_eq!(config.database.path, "chat.db");
    assert_eq!(config.database.excluded_bot.as_deref(), Some("surveybot"));
}

#[test]
fn test_missing_section_is_configuration_error() {
    let file = config_file("[database]\npath = \"chat.db\"\n");

    let err = AppConfig::load(Some(file.path()), "postgresql").unwrap_err();
    assert!(matches!(err, ExtractError::Configuration(_)));
    assert!(err.to_string().contains("postgresql"));
}

#[test]
fn test_missing_file_is_configuration_error() {
    let err = AppConfig::load(Some(std::path::Path::new("/nonexistent/app.toml")), DEFAULT_SECTION).unwrap_err();
    assert!(matches!(err, ExtractError::Configuration(_)));
}

#[test]
fn test_invalid_values_are_rejected() {
    let file = config_file("[database]\npath = \"chat.db\"\n\n[logging]\nlevel = \"verbose\"\n");

    let err = AppConfig::load(Some(file.path()), DEFAULT_SECTION).unwrap_err();
    assert!(matches!(err, ExtractError::Configuration(_)));
}
