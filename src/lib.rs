//! Chat Features - Mattermost message extraction and feature derivation
//!
//! A Rust library that reads the messages of a Mattermost database,
//! anonymizes every participant and writes one row of linguistic features
//! per message.
//!
//! # Features
//!
//! - Single-pass scanning of words, emoji shortcodes and mentions
//! - Per-channel language detection
//! - POS tags and named entities per language, with a multilingual fallback
//! - LIWC-style lexicon category counts
//! - English sentiment scores
//! - Fully quoted CSV output with hashed identities

/// Identity hashing
pub mod anonymize;
/// Configuration management
pub mod config;
/// Source database access
pub mod db;
/// Error types
pub mod error;
/// Feature aggregation stages
pub mod features;
/// CSV output
pub mod file_writer;
/// Row grouping
pub mod grouping;
/// Category lexicons
pub mod lexicon;
/// Logging setup and utilities
pub mod logging;
/// Metrics collection
pub mod metrics;
/// Data models and structures
pub mod models;
/// Language detection and tagging
pub mod nlp;
/// Repository pattern for data access
pub mod repository;
/// Message scanning
pub mod scanner;
/// Database schema definitions
pub mod schema;
/// Sentiment scoring
pub mod sentiment;
/// Extraction driver
pub mod service;
/// Transformer-based tagging
#[cfg(feature = "advanced-nlp")]
pub mod transformer;

// Re-export key components for easier access
pub use error::{ExtractError, Result};
pub use features::{FeatureAggregator, NlpModels};
pub use models::{FeatureRecord, Message, RawRow};
pub use scanner::{scan, ScanResult};
pub use service::ExtractionService;
