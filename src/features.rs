//! Per-message feature aggregation
//!
//! Aggregation runs in three explicit stages over a batch of grouped
//! messages:
//!
//! 1. [`FeatureAggregator::scan_messages`] scans every message once and pools
//!    the cleaned texts of each channel.
//! 2. [`FeatureAggregator::detect_channel_languages`] assigns one language per
//!    channel from its pooled text.
//! 3. [`FeatureAggregator::enrich`] builds the final record of one message
//!    from its scan, its channel language and the NLP models.
//!
//! Stage 3 needs the complete output of stage 2, which needs every message
//! of stage 1. Failures of a model on one message are logged and leave the
//! affected fields empty; they never abort the batch.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::anonymize::anonymize_channel;
use crate::config::{ExportConfig, NlpConfig};
use crate::error::Result;
use crate::lexicon::LexiconSet;
use crate::metrics::MetricsCollector;
use crate::models::{FeatureRecord, Message, TaggedText};
use crate::nlp::{LanguageDetector, TaggerRegistry, WhatlangDetector};
use crate::scanner::{scan, ScanResult};
use crate::sentiment::{LexiconSentimentScorer, SentimentScorer};

/// Mentions addressing every receiver of the message
pub const CHANNEL_WIDE_MENTIONS: [&str; 3] = ["all", "channel", "here"];

/// Language models and lexicons used during enrichment
pub struct NlpModels {
    pub detector: Box<dyn LanguageDetector>,
    pub taggers: TaggerRegistry,
    pub sentiment: Box<dyn SentimentScorer>,
    pub lexicons: LexiconSet,
}

impl NlpModels {
    /// Build the configured models and load every lexicon
    pub fn from_config(config: &NlpConfig) -> Result<Self> {
        let detector = WhatlangDetector::with_allowlist(&config.detection_allowlist)?;
        let taggers = build_taggers(config)?;
        let sentiment = LexiconSentimentScorer::new(config.sentiment_languages.clone());
        let lexicons = LexiconSet::load(&config.lexicons)?;
        info!(
            tagger_languages = ?config.tagger_languages,
            lexicons = lexicons.len(),
            "NLP models ready"
        );
        Ok(Self {
            detector: Box::new(detector),
            taggers,
            sentiment: Box::new(sentiment),
            lexicons,
        })
    }
}

#[cfg(feature = "advanced-nlp")]
fn build_taggers(config: &NlpConfig) -> Result<TaggerRegistry> {
    let mut taggers = TaggerRegistry::builtin(&config.tagger_languages);
    if config.use_transformer_models {
        taggers.register("en", Box::new(crate::transformer::TransformerTagger::english()?));
    }
    Ok(taggers)
}

#[cfg(not(feature = "advanced-nlp"))]
#[allow(clippy::unnecessary_wraps)]
fn build_taggers(config: &NlpConfig) -> Result<TaggerRegistry> {
    if config.use_transformer_models {
        warn!("Built without the advanced-nlp feature, using rule-based taggers");
    }
    Ok(TaggerRegistry::builtin(&config.tagger_languages))
}

/// Switches controlling which features are produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractionOptions {
    /// Keep message text and token texts in the records
    pub include_text: bool,
    pub enable_tagging: bool,
    pub enable_sentiment: bool,
}

impl ExtractionOptions {
    #[must_use]
    pub const fn from_config(nlp: &NlpConfig, export: &ExportConfig) -> Self {
        Self {
            include_text: export.include_text,
            enable_tagging: nlp.enable_tagging,
            enable_sentiment: nlp.enable_sentiment,
        }
    }
}

impl Default for ExtractionOptions {
    fn default() -> Self {
        Self {
            include_text: false,
            enable_tagging: true,
            enable_sentiment: true,
        }
    }
}

/// A message with its scan result
#[derive(Debug, Clone)]
pub struct ScannedMessage {
    pub message: Message,
    pub scan: ScanResult,
    /// Channel name as written to the output, also the pooling key
    pub channel: String,
}

/// Output of the scan stage
#[derive(Debug, Clone, Default)]
pub struct ScannedBatch {
    /// Messages in input order
    pub messages: Vec<ScannedMessage>,
    /// Newline-joined cleaned texts per anonymized channel, empty texts skipped
    pub channel_texts: BTreeMap<String, String>,
}

/// Language of each anonymized channel; channels without text map to `None`
pub type ChannelLanguages = HashMap<String, Option<String>>;

/// Resolve scanned mentions to anonymized identities
///
/// Channel-wide mentions expand to every receiver of the message, other
/// names are looked up in `users` (username to anonymized identity). Names
/// that resolve to nothing are dropped.
#[must_use]
pub fn resolve_mentions(
    mentions: &[String],
    users: &HashMap<String, String>,
    receivers: &[String],
) -> BTreeSet<String> {
    let mut resolved = BTreeSet::new();
    for mention in mentions {
        if CHANNEL_WIDE_MENTIONS.contains(&mention.as_str()) {
            resolved.extend(receivers.iter().cloned());
        } else if let Some(identity) = users.get(mention) {
            resolved.insert(identity.clone());
        } else {
            debug!(mention = %mention, "Unresolved mention dropped");
        }
    }
    resolved
}

/// Blank token and entity texts, keeping tags and positions
fn redact(mut tagged: TaggedText) -> TaggedText {
    for token in &mut tagged.tokens {
        token.text.clear();
    }
    for entity in &mut tagged.entities {
        entity.text.clear();
    }
    tagged
}

/// Builds feature records from grouped messages
pub struct FeatureAggregator {
    models: NlpModels,
    options: ExtractionOptions,
    metrics: Arc<MetricsCollector>,
}

impl FeatureAggregator {
    #[must_use]
    pub fn new(models: NlpModels, options: ExtractionOptions, metrics: Arc<MetricsCollector>) -> Self {
        Self {
            models,
            options,
            metrics,
        }
    }

    /// Scan every message and pool cleaned texts per anonymized channel
    #[must_use]
    pub fn scan_messages(&self, messages: Vec<Message>) -> ScannedBatch {
        let mut batch = ScannedBatch::default();
        for message in messages {
            let scan = scan(&message.text);
            let channel = anonymize_channel(&message.channel_id, message.channel_type);
            if !scan.cleaned_text.is_empty() {
                batch
                    .channel_texts
                    .entry(channel.clone())
                    .and_modify(|pooled| {
                        pooled.push('\n');
                        pooled.push_str(&scan.cleaned_text);
                    })
                    .or_insert_with(|| scan.cleaned_text.clone());
            }
            self.metrics.record_message_scanned();
            batch.messages.push(ScannedMessage { message, scan, channel });
        }
        debug!(
            messages = batch.messages.len(),
            channels = batch.channel_texts.len(),
            "Scan pass complete"
        );
        batch
    }

    /// Detect one language per channel from its pooled text
    #[must_use]
    pub fn detect_channel_languages(&self, batch: &ScannedBatch) -> ChannelLanguages {
        let languages: ChannelLanguages = batch
            .channel_texts
            .iter()
            .map(|(channel, text)| {
                let language = self.models.detector.detect(text);
                debug!(channel = %channel, language = ?language, "Channel language detected");
                (channel.clone(), language)
            })
            .collect();
        self.metrics
            .record_channels_detected(languages.values().filter(|l| l.is_some()).count());
        languages
    }

    /// Build the feature record of one message
    #[must_use]
    pub fn enrich(
        &self,
        scanned: &ScannedMessage,
        languages: &ChannelLanguages,
        users: &HashMap<String, String>,
    ) -> FeatureRecord {
        let message = &scanned.message;
        let cleaned = scanned.scan.cleaned_text.as_str();
        let language = languages.get(&scanned.channel).cloned().flatten();

        let tagged = if self.options.enable_tagging && !cleaned.is_empty() {
            self.tag(message, cleaned, language.as_deref())
        } else {
            None
        };

        let categories = self
            .models
            .lexicons
            .for_language(language.as_deref())
            .and_then(|lexicon| lexicon.count_categories(cleaned));

        let sentiment = if self.options.enable_sentiment {
            self.models.sentiment.score(&message.text, language.as_deref())
        } else {
            None
        };

        let (text, text_cleaned) = if self.options.include_text {
            (Some(message.text.clone()), Some(cleaned.to_string()))
        } else {
            (None, None)
        };

        FeatureRecord {
            sender: message.sender_id.clone(),
            message: text,
            message_cleaned: text_cleaned,
            language,
            tagged,
            categories,
            sentiment,
            word_count: scanned.scan.word_count,
            char_count: cleaned.chars().count(),
            emojis: scanned.scan.emojis.clone(),
            mentions: resolve_mentions(&scanned.scan.mentions, users, &message.receiver_ids),
            channel: scanned.channel.clone(),
            channel_type: message.channel_type,
            receivers: message.receiver_ids.clone(),
            timestamp: message.timestamp,
            post_id: message.post_id.clone(),
            parent_post_id: message.parent_post_id.clone(),
            file_extension: message.file_extension.clone(),
        }
    }

    fn tag(&self, message: &Message, cleaned: &str, language: Option<&str>) -> Option<TaggedText> {
        let tagger = self.models.taggers.select(language);
        match tagger.tag(cleaned) {
            Ok(tagged) if self.options.include_text => Some(tagged),
            Ok(tagged) => Some(redact(tagged)),
            Err(err) => {
                warn!(
                    post_id = %message.post_id,
                    model = tagger.name(),
                    error = %err,
                    "Tagging failed, leaving tags empty"
                );
                self.metrics.record_enrichment_failure("tagging");
                None
            },
        }
    }

    /// Run all stages and hand each record to `emit` in message order
    pub fn extract<F>(&self, messages: Vec<Message>, users: &HashMap<String, String>, mut emit: F) -> Result<usize>
    where
        F: FnMut(FeatureRecord) -> Result<()>,
    {
        let batch = self.scan_messages(messages);
        let languages = self.detect_channel_languages(&batch);

        let mut emitted = 0;
        for scanned in &batch.messages {
            emit(self.enrich(scanned, &languages, users))?;
            self.metrics.record_emitted();
            emitted += 1;
        }
        Ok(emitted)
    }
}
