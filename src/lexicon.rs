//! LIWC-style category lexicons
//!
//! A lexicon file has one category per line followed by its words:
//!
//! ```text
//! posemo love nice sweet happ*
//! negemo hurt ugly nast*
//! ```
//!
//! Words ending in `*` match any token starting with the remaining prefix.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use tracing::{debug, info};

use crate::error::{ExtractError, Result};

const WILDCARD: char = '*';

#[allow(clippy::expect_used)]
fn non_word_chars() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Letters, digits, apostrophes and whitespace are kept
    RE.get_or_init(|| Regex::new(r"[^\p{L}\p{N}'\s]+").expect("valid non-word pattern"))
}

/// A category dictionary with exact and prefix entries
#[derive(Debug, Clone, Default)]
pub struct Lexicon {
    category_names: Vec<String>,
    /// Exact words per category, indexed like `category_names`
    exact_terms: Vec<HashSet<String>>,
    /// Prefix to the indices of the categories it belongs to
    prefix_terms: HashMap<String, Vec<usize>>,
}

impl Lexicon {
    /// Load a lexicon file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ExtractError::Configuration(format!("Cannot read lexicon file {}: {e}", path.display()))
        })?;
        let lexicon = Self::parse(&content).map_err(|e| match e {
            ExtractError::Configuration(msg) => {
                ExtractError::Configuration(format!("{msg} in {}", path.display()))
            },
            other => other,
        })?;
        info!(
            path = %path.display(),
            categories = lexicon.category_names.len(),
            prefixes = lexicon.prefix_terms.len(),
            "Loaded lexicon"
        );
        Ok(lexicon)
    }

    /// Parse lexicon content
    pub fn parse(content: &str) -> Result<Self> {
        let mut lexicon = Self::default();
        let mut indices: HashMap<String, usize> = HashMap::new();

        for (line_no, line) in content.lines().enumerate() {
            let mut parts = line.split_whitespace();
            let Some(category) = parts.next() else {
                continue;
            };
            if category.starts_with(WILDCARD) {
                return Err(ExtractError::Configuration(format!(
                    "Lexicon line {} has no category token",
                    line_no + 1
                )));
            }

            let index = *indices.entry(category.to_string()).or_insert_with(|| {
                lexicon.category_names.push(category.to_string());
                lexicon.exact_terms.push(HashSet::new());
                lexicon.category_names.len() - 1
            });

            for word in parts {
                let word = word.to_lowercase();
                if let Some(prefix) = word.strip_suffix(WILDCARD) {
                    if prefix.is_empty() {
                        return Err(ExtractError::Configuration(format!(
                            "Lexicon line {} has an empty wildcard entry",
                            line_no + 1
                        )));
                    }
                    lexicon.prefix_terms.entry(prefix.to_string()).or_default().push(index);
                } else {
                    lexicon.exact_terms[index].insert(word);
                }
            }
        }

        Ok(lexicon)
    }

    /// Category names in column order
    #[must_use]
    pub fn category_names(&self) -> &[String] {
        &self.category_names
    }

    /// True if the lexicon defines no category
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.category_names.is_empty()
    }

    /// Count category occurrences in a text
    ///
    /// Returns `None` for an empty lexicon or an empty text. Exact and prefix
    /// matches are independent, and a token matching several prefixes counts
    /// for each of their categories.
    ///
    /// # Examples
    ///
    /// ```
    /// use chat_features::lexicon::Lexicon;
    ///
    /// let lexicon = Lexicon::parse("pronoun i we\nwork present*").unwrap();
    /// let counts = lexicon.count_categories("I present the presentation").unwrap();
    /// assert_eq!(counts, vec![1, 2]);
    /// ```
    #[must_use]
    pub fn count_categories(&self, text: &str) -> Option<Vec<u32>> {
        if self.is_empty() || text.is_empty() {
            return None;
        }

        let lowered = text.to_lowercase();
        let normalized = non_word_chars().replace_all(&lowered, "");
        let mut token_counts: HashMap<&str, u32> = HashMap::new();
        for token in normalized.split_whitespace() {
            *token_counts.entry(token).or_insert(0) += 1;
        }

        let mut counts = vec![0_u32; self.category_names.len()];
        for (index, words) in self.exact_terms.iter().enumerate() {
            counts[index] += token_counts
                .iter()
                .filter(|(token, _)| words.contains(**token))
                .map(|(_, count)| count)
                .sum::<u32>();
        }
        for (token, count) in &token_counts {
            for (prefix, categories) in &self.prefix_terms {
                if token.starts_with(prefix.as_str()) {
                    for &index in categories {
                        counts[index] += count;
                    }
                }
            }
        }

        Some(counts)
    }
}

/// Lexicons keyed by ISO 639-1 language code
#[derive(Debug, Clone, Default)]
pub struct LexiconSet {
    lexicons: HashMap<String, Lexicon>,
}

impl LexiconSet {
    /// Load every configured lexicon; any failure aborts the run
    pub fn load(paths: &HashMap<String, PathBuf>) -> Result<Self> {
        let mut lexicons = HashMap::new();
        for (language, path) in paths {
            debug!(language = %language, path = %path.display(), "Loading lexicon");
            lexicons.insert(language.clone(), Lexicon::load(path)?);
        }
        Ok(Self { lexicons })
    }

    /// Register a lexicon for a language
    pub fn insert(&mut self, language: &str, lexicon: Lexicon) {
        self.lexicons.insert(language.to_string(), lexicon);
    }

    /// Lexicon for a language, if one is configured
    #[must_use]
    pub fn for_language(&self, language: Option<&str>) -> Option<&Lexicon> {
        language.and_then(|lang| self.lexicons.get(lang))
    }

    /// Number of configured languages
    #[must_use]
    pub fn len(&self) -> usize {
        self.lexicons.len()
    }

    /// True if no lexicon is configured
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lexicons.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "pronoun i we you\nposemo love nice happ*\nnegemo hate hurt*\n";

    #[test]
    fn test_parse_orders_categories() {
        let lexicon = Lexicon::parse(SAMPLE).expect("valid lexicon");
        assert_eq!(lexicon.category_names(), ["pronoun", "posemo", "negemo"]);
    }

    #[test]
    fn test_repeated_category_merges_words() {
        let lexicon = Lexicon::parse("social talk\nfamily mom\nsocial chat").expect("valid lexicon");
        assert_eq!(lexicon.category_names(), ["social", "family"]);
        assert_eq!(lexicon.count_categories("talk and chat"), Some(vec![2, 0]));
    }

    #[test]
    fn test_words_are_lowercased() {
        let lexicon = Lexicon::parse("pronoun I We").expect("valid lexicon");
        assert_eq!(lexicon.count_categories("we did it, i think"), Some(vec![2]));
    }

    #[test]
    fn test_exact_and_prefix_counts() {
        let lexicon = Lexicon::parse(SAMPLE).expect("valid lexicon");
        let counts = lexicon
            .count_categories("I love you, happy happiness! We hate hurting")
            .expect("counts");
        assert_eq!(counts, vec![3, 3, 2]);
    }

    #[test]
    fn test_token_matching_several_prefixes() {
        let lexicon = Lexicon::parse("a pre*\nb pres*\nc present").expect("valid lexicon");
        assert_eq!(lexicon.count_categories("present present"), Some(vec![2, 2, 2]));
    }

    #[test]
    fn test_same_prefix_in_two_categories() {
        let lexicon = Lexicon::parse("work job*\nmoney job*").expect("valid lexicon");
        assert_eq!(lexicon.count_categories("jobs"), Some(vec![1, 1]));
    }

    #[test]
    fn test_punctuation_is_stripped_but_apostrophes_kept() {
        let lexicon = Lexicon::parse("neg don't\nother dont").expect("valid lexicon");
        assert_eq!(lexicon.count_categories("Don't! (dont)"), Some(vec![1, 1]));
    }

    #[test]
    fn test_empty_inputs_yield_none() {
        let lexicon = Lexicon::parse(SAMPLE).expect("valid lexicon");
        assert_eq!(lexicon.count_categories(""), None);
        assert_eq!(Lexicon::default().count_categories("hello"), None);
    }

    #[test]
    fn test_text_without_matches_is_all_zero() {
        let lexicon = Lexicon::parse(SAMPLE).expect("valid lexicon");
        assert_eq!(lexicon.count_categories("zzz"), Some(vec![0, 0, 0]));
    }

    #[test]
    fn test_malformed_lines_are_rejected() {
        assert!(matches!(
            Lexicon::parse("*oops word"),
            Err(ExtractError::Configuration(_))
        ));
        assert!(matches!(
            Lexicon::parse("cat word *"),
            Err(ExtractError::Configuration(_))
        ));
    }

    #[test]
    fn test_blank_lines_are_skipped() {
        let lexicon = Lexicon::parse("\n   \npronoun i\n\n").expect("valid lexicon");
        assert_eq!(lexicon.category_names(), ["pronoun"]);
    }

    #[test]
    fn test_missing_file_is_configuration_error() {
        let err = Lexicon::load(Path::new("/nonexistent/lexicon.txt")).unwrap_err();
        assert!(matches!(err, ExtractError::Configuration(_)));
    }
}
