use std::collections::HashMap;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use tracing::info;

use crate::anonymize::{anonymize_row, hash_identity};
use crate::error::Result;
use crate::features::FeatureAggregator;
use crate::file_writer::CsvSink;
use crate::grouping::group_rows;
use crate::logging::OperationTimer;
use crate::metrics::{MetricsCollector, MetricsSnapshot};
use crate::models::Message;
use crate::repository::MessageRepository;

/// Totals of one extraction run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub rows_written: usize,
    pub metrics: MetricsSnapshot,
}

/// Drives fetch, anonymization, grouping, aggregation and output
pub struct ExtractionService {
    repository: Box<dyn MessageRepository>,
    aggregator: FeatureAggregator,
    metrics: Arc<MetricsCollector>,
    include_text: bool,
}

impl ExtractionService {
    #[must_use]
    pub fn new(
        repository: Box<dyn MessageRepository>,
        aggregator: FeatureAggregator,
        metrics: Arc<MetricsCollector>,
        include_text: bool,
    ) -> Self {
        Self {
            repository,
            aggregator,
            metrics,
            include_text,
        }
    }

    /// Extract every message into a CSV file
    ///
    /// The file is only created once the source has been read, so a failing
    /// source leaves any previous output untouched.
    pub fn run(&self, output_path: &Path) -> Result<RunSummary> {
        info!(output = %output_path.display(), "Starting extraction");
        let batch = self.fetch_and_group()?;
        let sink = CsvSink::create(output_path, self.include_text)?;
        let summary = self.write_batch(batch, sink)?;
        info!(
            output = %output_path.display(),
            rows = summary.rows_written,
            failures = summary.metrics.enrichment_failures,
            "Extraction finished"
        );
        Ok(summary)
    }

    /// Extract every message into an already opened sink
    pub fn run_into<W: Write>(&self, sink: CsvSink<W>) -> Result<RunSummary> {
        let batch = self.fetch_and_group()?;
        self.write_batch(batch, sink)
    }

    fn fetch_and_group(&self) -> Result<SourceBatch> {
        let timer = OperationTimer::new("fetch");
        let rows = self.repository.fetch_rows()?;
        let users: HashMap<String, String> = self
            .repository
            .fetch_users()?
            .into_iter()
            .map(|(username, email)| (username, hash_identity(&email)))
            .collect();
        self.metrics.record_stage_duration("fetch", timer.finish());
        self.metrics.record_rows_fetched(rows.len());

        let timer = OperationTimer::new("group");
        let messages = group_rows(rows.into_iter().map(anonymize_row));
        self.metrics.record_stage_duration("group", timer.finish());
        self.metrics.record_messages_grouped(messages.len());

        Ok(SourceBatch { messages, users })
    }

    fn write_batch<W: Write>(&self, batch: SourceBatch, mut sink: CsvSink<W>) -> Result<RunSummary> {
        let timer = OperationTimer::new("aggregate");
        let rows_written = self
            .aggregator
            .extract(batch.messages, &batch.users, |record| sink.write_record(&record))?;
        self.metrics.record_stage_duration("aggregate", timer.finish());

        sink.finish()?;
        Ok(RunSummary {
            rows_written,
            metrics: self.metrics.snapshot(),
        })
    }
}

/// Grouped messages and the username to hashed identity map
struct SourceBatch {
    messages: Vec<Message>,
    users: HashMap<String, String>,
}
