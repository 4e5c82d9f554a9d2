//! Transformer-based English tagger (`advanced-nlp` feature)
//!
//! Wraps the `rust-bert` POS and NER pipelines. Model weights are fetched
//! by `rust-bert` on first use.

use rust_bert::pipelines::ner::NERModel;
use rust_bert::pipelines::pos_tagging::POSModel;
use tracing::info;

use crate::error::{ExtractError, Result};
use crate::models::{NamedEntity, TaggedText, Token};
use crate::nlp::Tagger;

/// English tagger backed by BERT token classification models
pub struct TransformerTagger {
    pos: POSModel,
    ner: NERModel,
}

impl TransformerTagger {
    /// Load the default English POS and NER models
    pub fn english() -> Result<Self> {
        let pos = POSModel::new(Default::default()).map_err(|e| ExtractError::ModelUnavailable(format!("en POS model: {e}")))?;
        let ner = NERModel::new(Default::default()).map_err(|e| ExtractError::ModelUnavailable(format!("en NER model: {e}")))?;
        info!("Loaded transformer models for en");
        Ok(Self { pos, ner })
    }
}

/// Universal POS tag for a Penn Treebank tag
fn universal_pos(tag: &str) -> &'static str {
    match tag {
        "NN" | "NNS" => "NOUN",
        "NNP" | "NNPS" => "PROPN",
        "PRP" | "PRP$" | "WP" | "WP$" => "PRON",
        "DT" | "PDT" | "WDT" => "DET",
        "IN" | "TO" => "ADP",
        "CC" => "CCONJ",
        "MD" => "AUX",
        "CD" => "NUM",
        "JJ" | "JJR" | "JJS" => "ADJ",
        "RB" | "RBR" | "RBS" | "WRB" => "ADV",
        "UH" => "INTJ",
        "RP" => "PART",
        t if t.starts_with("VB") => "VERB",
        t if t.chars().all(|c| !c.is_alphanumeric()) => "PUNCT",
        _ => "X",
    }
}

impl Tagger for TransformerTagger {
    fn name(&self) -> &str {
        "bert-en"
    }

    fn tag(&self, text: &str) -> Result<TaggedText> {
        let pos_tags = self
            .pos
            .predict(&[text])
            .into_iter()
            .next()
            .ok_or_else(|| ExtractError::Model("POS model returned no output".to_string()))?;
        let tokens: Vec<Token> = pos_tags
            .into_iter()
            .map(|t| Token {
                pos: universal_pos(&t.label).to_string(),
                tag: t.label,
                text: t.word,
            })
            .collect();

        let mut entities = Vec::new();
        let mut cursor = 0;
        for entity in self.ner.predict_full_entities(&[text]).into_iter().flatten() {
            let words: Vec<&str> = entity.word.split_whitespace().collect();
            let Some(first) = words.first() else {
                continue;
            };
            let Some(offset) = tokens[cursor..].iter().position(|t| t.text == *first) else {
                continue;
            };
            let start = cursor + offset;
            let end = (start + words.len()).min(tokens.len());
            cursor = end;
            entities.push(NamedEntity {
                text: entity.word,
                label: entity.label,
                start_token: start,
                end_token: end,
            });
        }

        Ok(TaggedText { tokens, entities })
    }
}
