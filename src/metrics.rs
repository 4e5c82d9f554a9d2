use metrics::{counter, gauge, histogram};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Rows read from the source database
pub const ROWS_FETCHED_TOTAL: &str = "chat_features_rows_fetched_total";
/// Messages after grouping
pub const MESSAGES_GROUPED_TOTAL: &str = "chat_features_messages_grouped_total";
/// Messages through the scan pass
pub const MESSAGES_SCANNED_TOTAL: &str = "chat_features_messages_scanned_total";
/// Channels with a detected language
pub const CHANNELS_DETECTED: &str = "chat_features_channels_detected";
/// Feature records written
pub const RECORDS_EMITTED_TOTAL: &str = "chat_features_records_emitted_total";
/// Per-message enrichment failures, labelled by stage
pub const ENRICHMENT_FAILURES_TOTAL: &str = "chat_features_enrichment_failures_total";
/// Stage durations, labelled by stage
pub const STAGE_DURATION_SECONDS: &str = "chat_features_stage_duration_seconds";

/// Metrics collection and management
///
/// Counts are kept locally for the run summary and forwarded to whatever
/// `metrics` recorder the binary installed (none by default).
#[derive(Debug, Default)]
pub struct MetricsCollector {
    rows_fetched: AtomicU64,
    messages_grouped: AtomicU64,
    messages_scanned: AtomicU64,
    channels_detected: AtomicU64,
    records_emitted: AtomicU64,
    enrichment_failures: AtomicU64,
}

/// Counter values at one point in time
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub rows_fetched: u64,
    pub messages_grouped: u64,
    pub messages_scanned: u64,
    pub channels_detected: u64,
    pub records_emitted: u64,
    pub enrichment_failures: u64,
}

impl MetricsCollector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record rows read from the source
    pub fn record_rows_fetched(&self, count: usize) {
        self.rows_fetched.fetch_add(count as u64, Ordering::Relaxed);
        counter!(ROWS_FETCHED_TOTAL).increment(count as u64);
    }

    /// Record messages produced by grouping
    pub fn record_messages_grouped(&self, count: usize) {
        self.messages_grouped.fetch_add(count as u64, Ordering::Relaxed);
        counter!(MESSAGES_GROUPED_TOTAL).increment(count as u64);
    }

    /// Record one scanned message
    pub fn record_message_scanned(&self) {
        self.messages_scanned.fetch_add(1, Ordering::Relaxed);
        counter!(MESSAGES_SCANNED_TOTAL).increment(1);
    }

    /// Record the number of channels whose language was detected
    pub fn record_channels_detected(&self, count: usize) {
        self.channels_detected.store(count as u64, Ordering::Relaxed);
        gauge!(CHANNELS_DETECTED).set(count as f64);
    }

    /// Record one emitted feature record
    pub fn record_emitted(&self) {
        self.records_emitted.fetch_add(1, Ordering::Relaxed);
        counter!(RECORDS_EMITTED_TOTAL).increment(1);
    }

    /// Record a recovered failure of one enrichment stage
    pub fn record_enrichment_failure(&self, stage: &str) {
        self.enrichment_failures.fetch_add(1, Ordering::Relaxed);
        counter!(ENRICHMENT_FAILURES_TOTAL, "stage" => stage.to_owned()).increment(1);
    }

    /// Record the duration of a pipeline stage
    pub fn record_stage_duration(&self, stage: &str, duration: Duration) {
        histogram!(STAGE_DURATION_SECONDS, "stage" => stage.to_owned()).record(duration.as_secs_f64());
    }

    /// Current counter values
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            rows_fetched: self.rows_fetched.load(Ordering::Relaxed),
            messages_grouped: self.messages_grouped.load(Ordering::Relaxed),
            messages_scanned: self.messages_scanned.load(Ordering::Relaxed),
            channels_detected: self.channels_detected.load(Ordering::Relaxed),
            records_emitted: self.records_emitted.load(Ordering::Relaxed),
            enrichment_failures: self.enrichment_failures.load(Ordering::Relaxed),
        }
    }
}
