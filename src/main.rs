use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

use chat_features::config::{AppConfig, DEFAULT_SECTION};
use chat_features::features::{ExtractionOptions, FeatureAggregator, NlpModels};
use chat_features::logging::init_logging;
use chat_features::metrics::MetricsCollector;
use chat_features::repository::SqliteRepository;
use chat_features::service::ExtractionService;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file (TOML, YAML or JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Configuration section holding the database settings
    #[arg(short, long, default_value = DEFAULT_SECTION)]
    section: String,

    /// Output CSV file, overrides export.output_path
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load(cli.config.as_deref(), &cli.section).context("Failed to load configuration")?;
    let _guard = init_logging(&config.logging)?;

    if let Err(err) = run(&cli, &config) {
        error!(error = %format!("{err:#}"), "Extraction failed");
        return Err(err);
    }
    Ok(())
}

fn run(cli: &Cli, config: &AppConfig) -> Result<()> {
    let output = cli
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.export.output_path));

    let metrics = Arc::new(MetricsCollector::new());
    let models = NlpModels::from_config(&config.nlp).context("Failed to prepare NLP models")?;
    let options = ExtractionOptions::from_config(&config.nlp, &config.export);
    let aggregator = FeatureAggregator::new(models, options, Arc::clone(&metrics));

    let repository = SqliteRepository::open(&config.database).context("Failed to open source database")?;
    let service = ExtractionService::new(Box::new(repository), aggregator, metrics, options.include_text);

    let summary = service
        .run(&output)
        .with_context(|| format!("Failed to extract features into {}", output.display()))?;

    info!(
        rows = summary.rows_written,
        rows_fetched = summary.metrics.rows_fetched,
        messages = summary.metrics.messages_grouped,
        channels = summary.metrics.channels_detected,
        failures = summary.metrics.enrichment_failures,
        "Done"
    );
    Ok(())
}
