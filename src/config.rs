use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use config::{Config, Environment, File};

use crate::error::{ExtractError, Result};

/// Name of the configuration section holding the source database settings
pub const DEFAULT_SECTION: &str = "database";

/// Prefix of environment variables overriding configuration values
pub const ENV_PREFIX: &str = "CHAT_FEATURES";

/// Application configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub nlp: NlpConfig,
    pub export: ExportConfig,
}

/// Source database connection settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Path of the Mattermost SQLite database
    pub path: String,
    /// Username whose channels are excluded from the extraction
    pub excluded_bot: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub file_path: Option<String>,
    pub format: String, // "json" or "text"
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NlpConfig {
    pub enable_tagging: bool,
    pub enable_sentiment: bool,
    /// Use transformer taggers when built with `advanced-nlp`
    pub use_transformer_models: bool,
    /// Languages with a dedicated tagging model
    pub tagger_languages: Vec<String>,
    /// Languages the sentiment scorer answers for
    pub sentiment_languages: Vec<String>,
    /// Restrict language detection to these codes; empty means all
    pub detection_allowlist: Vec<String>,
    /// Lexicon file per ISO 639-1 language code
    pub lexicons: HashMap<String, PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub output_path: String,
    /// Write message text and token texts to the output
    pub include_text: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "data/mattermost.db".to_string(),
            excluded_bot: Some("surveybot".to_string()),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file_path: None,
            format: "text".to_string(),
        }
    }
}

impl Default for NlpConfig {
    fn default() -> Self {
        Self {
            enable_tagging: true,
            enable_sentiment: true,
            use_transformer_models: false,
            tagger_languages: ["en", "fr", "de", "it"].iter().map(ToString::to_string).collect(),
            sentiment_languages: vec!["en".to_string()],
            detection_allowlist: Vec::new(),
            lexicons: HashMap::new(),
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_path: "mattermost_log_extraction.csv".to_string(),
            include_text: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from multiple sources with precedence
    ///
    /// With an explicit file, the file must exist and contain `section`,
    /// which then provides the database settings. Without one, the optional
    /// `config/default` and `config/local` files are read. Environment
    /// variables such as `CHAT_FEATURES__EXPORT__INCLUDE_TEXT` override both.
    pub fn load(path: Option<&Path>, section: &str) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            if !path.is_file() {
                return Err(ExtractError::Configuration(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            builder = builder.add_source(File::from(path));
        } else {
            builder = builder
                .add_source(File::with_name("config/default").required(false))
                .add_source(File::with_name("config/local").required(false));
        }

        let settings = builder
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__").try_parsing(true))
            .build()?;

        let mut app_config: AppConfig = settings.clone().try_deserialize()?;

        if path.is_some() || section != DEFAULT_SECTION {
            app_config.database = settings.get::<DatabaseConfig>(section).map_err(|e| {
                ExtractError::Configuration(format!("Section {section} not found in configuration: {e}"))
            })?;
        }

        // Validate configuration
        app_config.validate()?;

        Ok(app_config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        // Validate database config
        if self.database.path.trim().is_empty() {
            return Err(ExtractError::Configuration("database path must not be empty".to_string()));
        }

        // Validate logging config
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(ExtractError::Configuration(format!(
                "Invalid log level: {}. Must be one of: {:?}",
                self.logging.level, valid_levels
            )));
        }

        let valid_formats = ["text", "json"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            return Err(ExtractError::Configuration(format!(
                "Invalid log format: {}. Must be one of: {:?}",
                self.logging.format, valid_formats
            )));
        }

        // Validate NLP config
        let codes = self
            .nlp
            .tagger_languages
            .iter()
            .chain(&self.nlp.sentiment_languages)
            .chain(&self.nlp.detection_allowlist)
            .chain(self.nlp.lexicons.keys());
        for code in codes {
            if code.len() != 2 || !code.chars().all(|c| c.is_ascii_lowercase()) {
                return Err(ExtractError::Configuration(format!(
                    "Invalid language code: {code}. Expected a two-letter ISO 639-1 code"
                )));
            }
        }

        // Validate export config
        if self.export.output_path.trim().is_empty() {
            return Err(ExtractError::Configuration("output_path must not be empty".to_string()));
        }

        Ok(())
    }
}
