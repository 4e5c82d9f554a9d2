//! Data models for message extraction and feature records
//!
//! This module contains the data structures that flow through the pipeline:
//! raw query rows, grouped messages, NLP results and the final feature record.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Visibility of a channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChannelType {
    /// Open channel, name kept as-is in the output
    Public,
    /// Private channel or group message
    Private,
    /// Direct message between two users
    Direct,
}

impl ChannelType {
    /// Parse a Mattermost channel type code
    ///
    /// Group messages (`G`) are private conversations and map to `Private`.
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "O" => Some(Self::Public),
            "P" | "G" => Some(Self::Private),
            "D" => Some(Self::Direct),
            _ => None,
        }
    }

    /// Code written to the output file
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Public => "O",
            Self::Private => "P",
            Self::Direct => "D",
        }
    }

    /// True for open channels, whose names are written as-is
    #[must_use]
    pub const fn is_public(&self) -> bool {
        matches!(self, Self::Public)
    }
}

impl fmt::Display for ChannelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// One row of the source query, one per (message, receiver) pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    /// Sender identity (email before anonymization)
    pub sender: String,
    /// Raw message text
    pub text: String,
    /// Channel name
    pub channel: String,
    /// Channel visibility
    pub channel_type: ChannelType,
    /// Receiver identity, if the row carries one
    pub receiver: Option<String>,
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
    /// Post identifier
    pub post_id: String,
    /// Parent post identifier for replies
    pub parent_post_id: Option<String>,
    /// Extension of an attached file
    pub file_extension: Option<String>,
}

/// A chat message with all its receivers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Anonymized sender identity
    pub sender_id: String,
    /// Raw message text
    pub text: String,
    /// Channel name (not yet anonymized)
    pub channel_id: String,
    /// Channel visibility
    pub channel_type: ChannelType,
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
    /// Post identifier
    pub post_id: String,
    /// Parent post identifier for replies
    pub parent_post_id: Option<String>,
    /// Extension of an attached file
    pub file_extension: Option<String>,
    /// Anonymized receivers in the order they joined the channel
    pub receiver_ids: Vec<String>,
}

/// A token produced by a tagger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// Token text as it appears in the cleaned message
    pub text: String,
    /// Coarse part-of-speech tag (Universal Dependencies)
    pub pos: String,
    /// Fine-grained, model-specific tag
    pub tag: String,
}

/// A named entity spanning one or more tokens
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedEntity {
    /// The entity text
    pub text: String,
    /// Entity label (PER, ORG, LOC, MISC, ...)
    pub label: String,
    /// Index of the first token of the entity
    pub start_token: usize,
    /// Index one past the last token of the entity
    pub end_token: usize,
}

impl NamedEntity {
    /// Indices of the tokens covered by the entity
    #[must_use]
    pub fn token_indices(&self) -> Vec<usize> {
        (self.start_token..self.end_token).collect()
    }
}

/// Tagger output for one text
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaggedText {
    /// Tokens in order
    pub tokens: Vec<Token>,
    /// Named entities in order of appearance
    pub entities: Vec<NamedEntity>,
}

/// VADER-style sentiment proportions and compound score
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SentimentScores {
    /// Share of negative sentiment
    pub neg: f64,
    /// Share of neutral words
    pub neu: f64,
    /// Share of positive sentiment
    pub pos: f64,
    /// Normalized overall score in [-1, 1]
    pub compound: f64,
}

/// The final output row for one message
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRecord {
    /// Anonymized sender
    pub sender: String,
    /// Raw message text, only kept when text export is enabled
    pub message: Option<String>,
    /// Cleaned message text, only kept when text export is enabled
    pub message_cleaned: Option<String>,
    /// ISO 639-1 language code of the channel
    pub language: Option<String>,
    /// Tagger output; token texts are blanked when text export is disabled
    pub tagged: Option<TaggedText>,
    /// Lexicon category counts aligned with the lexicon's category names
    pub categories: Option<Vec<u32>>,
    /// Sentiment scores, for supported languages only
    pub sentiment: Option<SentimentScores>,
    /// Number of words (mentions and emojis excluded)
    pub word_count: usize,
    /// Number of characters of the cleaned text
    pub char_count: usize,
    /// Emoji shortcodes in order of appearance
    pub emojis: Vec<String>,
    /// Anonymized identities of mentioned users
    pub mentions: BTreeSet<String>,
    /// Channel name, hashed when the channel is not public
    pub channel: String,
    /// Channel visibility
    pub channel_type: ChannelType,
    /// Anonymized receivers
    pub receivers: Vec<String>,
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
    /// Post identifier
    pub post_id: String,
    /// Parent post identifier for replies
    pub parent_post_id: Option<String>,
    /// Extension of an attached file
    pub file_extension: Option<String>,
}
