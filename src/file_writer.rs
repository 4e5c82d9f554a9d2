//! CSV output for feature records.
//!
//! Every field is quoted. List and map fields are written as JSON inside
//! their cell, and absent optional values are written as empty cells.

use crate::error::{ExtractError, Result};
use crate::models::{FeatureRecord, NamedEntity, TaggedText};
use chrono::DateTime;
use csv::{QuoteStyle, Writer, WriterBuilder};
use serde::Serialize;
use serde_json::{json, Value};
use std::fs::{create_dir_all, File};
use std::io::Write;
use std::path::Path;

/// Rendering of the Time column (UTC)
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const LEADING_COLUMNS: [&str; 1] = ["Sender"];
const TEXT_COLUMNS: [&str; 2] = ["Message", "MessageCleaned"];
const FEATURE_COLUMNS: [&str; 16] = [
    "Language",
    "Tags",
    "NamedEntities",
    "LIWCCategories",
    "SentimentScores",
    "NumberWords",
    "NumberChars",
    "Emojis",
    "Mentions",
    "Channel",
    "ChannelType",
    "Receivers",
    "Time",
    "PostId",
    "PostParentId",
    "FileExtension",
];

/// Column names, with the text columns only when text is exported
#[must_use]
pub fn header(include_text: bool) -> Vec<&'static str> {
    let mut columns = LEADING_COLUMNS.to_vec();
    if include_text {
        columns.extend(TEXT_COLUMNS);
    }
    columns.extend(FEATURE_COLUMNS);
    columns
}

/// Streaming CSV writer for feature records
pub struct CsvSink<W: Write> {
    writer: Writer<W>,
    include_text: bool,
}

impl CsvSink<File> {
    /// Create the output file, its parent directories and the header row
    pub fn create(path: &Path, include_text: bool) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            create_dir_all(parent)?;
        }
        Self::from_writer(File::create(path)?, include_text)
    }
}

impl<W: Write> CsvSink<W> {
    /// Wrap a writer and write the header row
    pub fn from_writer(inner: W, include_text: bool) -> Result<Self> {
        let mut writer = WriterBuilder::new().quote_style(QuoteStyle::Always).from_writer(inner);
        writer.write_record(header(include_text))?;
        Ok(Self { writer, include_text })
    }

    /// Append one record
    pub fn write_record(&mut self, record: &FeatureRecord) -> Result<()> {
        let mut cells = vec![record.sender.clone()];
        if self.include_text {
            cells.push(record.message.clone().unwrap_or_default());
            cells.push(record.message_cleaned.clone().unwrap_or_default());
        }
        cells.extend([
            record.language.clone().unwrap_or_default(),
            optional_json(record.tagged.as_ref().map(|t| self.tags_cell(t)))?,
            optional_json(record.tagged.as_ref().map(|t| self.entities_cell(&t.entities)))?,
            optional_json(record.categories.as_ref())?,
            optional_json(record.sentiment.as_ref())?,
            record.word_count.to_string(),
            record.char_count.to_string(),
            json_cell(&record.emojis)?,
            json_cell(&record.mentions)?,
            record.channel.clone(),
            record.channel_type.to_string(),
            json_cell(&record.receivers)?,
            format_time(record.timestamp),
            record.post_id.clone(),
            record.parent_post_id.clone().unwrap_or_default(),
            record.file_extension.clone().unwrap_or_default(),
        ]);
        self.writer.write_record(&cells)?;
        Ok(())
    }

    /// `[text, pos, tag]` per token, or `[pos, tag]` without text
    fn tags_cell(&self, tagged: &TaggedText) -> Value {
        tagged
            .tokens
            .iter()
            .map(|token| {
                if self.include_text {
                    json!([token.text, token.pos, token.tag])
                } else {
                    json!([token.pos, token.tag])
                }
            })
            .collect()
    }

    /// `[text, label]` per entity, or `[[token indices], label]` without text
    fn entities_cell(&self, entities: &[NamedEntity]) -> Value {
        entities
            .iter()
            .map(|entity| {
                if self.include_text {
                    json!([entity.text, entity.label])
                } else {
                    json!([entity.token_indices(), entity.label])
                }
            })
            .collect()
    }

    /// Flush and return the underlying writer
    pub fn finish(self) -> Result<W> {
        self.writer.into_inner().map_err(|e| ExtractError::Io(e.into_error()))
    }
}

fn json_cell<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string(value)?)
}

fn optional_json<T: Serialize>(value: Option<T>) -> Result<String> {
    value.map_or_else(|| Ok(String::new()), |v| json_cell(&v))
}

/// Render a millisecond timestamp as UTC, or the raw number if out of range
#[must_use]
pub fn format_time(timestamp: i64) -> String {
    DateTime::from_timestamp_millis(timestamp)
        .map_or_else(|| timestamp.to_string(), |t| t.format(TIME_FORMAT).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ChannelType, SentimentScores, Token};
    use std::collections::BTreeSet;

    fn record() -> FeatureRecord {
        FeatureRecord {
            sender: "s-hash".to_string(),
            message: Some("Hi @bob, meet Alice :wave:".to_string()),
            message_cleaned: Some("Hi meet Alice".to_string()),
            language: Some("en".to_string()),
            tagged: Some(TaggedText {
                tokens: vec![
                    Token {
                        text: "Hi".to_string(),
                        pos: "NOUN".to_string(),
                        tag: "NN".to_string(),
                    },
                    Token {
                        text: "Alice".to_string(),
                        pos: "PROPN".to_string(),
                        tag: "NNP".to_string(),
                    },
                ],
                entities: vec![NamedEntity {
                    text: "Alice".to_string(),
                    label: "MISC".to_string(),
                    start_token: 1,
                    end_token: 2,
                }],
            }),
            categories: Some(vec![1, 0]),
            sentiment: Some(SentimentScores {
                neg: 0.0,
                neu: 1.0,
                pos: 0.0,
                compound: 0.0,
            }),
            word_count: 3,
            char_count: 13,
            emojis: vec!["wave".to_string()],
            mentions: BTreeSet::from(["b-hash".to_string()]),
            channel: "town-square".to_string(),
            channel_type: ChannelType::Public,
            receivers: vec!["b-hash".to_string()],
            timestamp: 1_600_000_000_000,
            post_id: "p1".to_string(),
            parent_post_id: None,
            file_extension: None,
        }
    }

    fn write(include_text: bool, record: &FeatureRecord) -> Vec<csv::StringRecord> {
        let mut sink = CsvSink::from_writer(Vec::new(), include_text).expect("sink");
        sink.write_record(record).expect("write");
        let bytes = sink.finish().expect("finish");
        csv::Reader::from_reader(bytes.as_slice())
            .records()
            .collect::<std::result::Result<_, _>>()
            .expect("valid csv")
    }

    #[test]
    fn test_header_shapes() {
        assert_eq!(header(false).len(), 17);
        assert_eq!(header(true).len(), 19);
        assert_eq!(&header(true)[..3], ["Sender", "Message", "MessageCleaned"]);
        assert_eq!(header(false)[1], "Language");
    }

    #[test]
    fn test_every_field_is_quoted() {
        let mut sink = CsvSink::from_writer(Vec::new(), false).expect("sink");
        sink.write_record(&record()).expect("write");
        let text = String::from_utf8(sink.finish().expect("finish")).expect("utf8");
        assert!(text.starts_with("\"Sender\",\"Language\","));
        assert!(text.contains("\"s-hash\",\"en\","));
    }

    #[test]
    fn test_row_without_text() {
        let rows = write(false, &record());
        let row = &rows[0];
        assert_eq!(row.len(), 17);
        assert_eq!(&row[0], "s-hash");
        assert_eq!(&row[2], r#"[["NOUN","NN"],["PROPN","NNP"]]"#);
        assert_eq!(&row[3], r#"[[[1],"MISC"]]"#);
        assert_eq!(&row[4], "[1,0]");
        assert_eq!(&row[5], r#"{"neg":0.0,"neu":1.0,"pos":0.0,"compound":0.0}"#);
        assert_eq!(&row[8], r#"["wave"]"#);
        assert_eq!(&row[9], r#"["b-hash"]"#);
        assert_eq!(&row[11], "O");
        assert_eq!(&row[13], "2020-09-13 12:26:40");
        assert_eq!(&row[15], "");
    }

    #[test]
    fn test_row_with_text() {
        let rows = write(true, &record());
        let row = &rows[0];
        assert_eq!(row.len(), 19);
        assert_eq!(&row[1], "Hi @bob, meet Alice :wave:");
        assert_eq!(&row[2], "Hi meet Alice");
        assert_eq!(&row[4], r#"[["Hi","NOUN","NN"],["Alice","PROPN","NNP"]]"#);
        assert_eq!(&row[5], r#"[["Alice","MISC"]]"#);
    }

    #[test]
    fn test_absent_values_are_empty_cells() {
        let mut sparse = record();
        sparse.language = None;
        sparse.tagged = None;
        sparse.categories = None;
        sparse.sentiment = None;
        let rows = write(false, &sparse);
        let row = &rows[0];
        assert!((1..=5).all(|i| row[i].is_empty()));
    }

    #[test]
    fn test_time_rendering() {
        assert_eq!(format_time(0), "1970-01-01 00:00:00");
        assert_eq!(format_time(i64::MAX), i64::MAX.to_string());
    }
}
