//! Language detection and part-of-speech / entity tagging
//!
//! Both concerns sit behind small traits so the feature aggregator does not
//! depend on a particular model. The built-in implementations are a
//! `whatlang` detector and rule-based taggers for English, French, German and
//! Italian with a multilingual fallback.

use std::collections::HashMap;

use tracing::{debug, warn};
use unicode_normalization::UnicodeNormalization;
use whatlang::{Detector, Lang};

use crate::error::{ExtractError, Result};
use crate::models::{NamedEntity, TaggedText, Token};

/// ISO 639-1 codes for the languages whatlang can detect
const ISO_639_1: &[(Lang, &str)] = &[
    (Lang::Afr, "af"),
    (Lang::Ara, "ar"),
    (Lang::Bul, "bg"),
    (Lang::Cat, "ca"),
    (Lang::Ces, "cs"),
    (Lang::Cmn, "zh"),
    (Lang::Dan, "da"),
    (Lang::Deu, "de"),
    (Lang::Ell, "el"),
    (Lang::Eng, "en"),
    (Lang::Epo, "eo"),
    (Lang::Est, "et"),
    (Lang::Fin, "fi"),
    (Lang::Fra, "fr"),
    (Lang::Heb, "he"),
    (Lang::Hin, "hi"),
    (Lang::Hrv, "hr"),
    (Lang::Hun, "hu"),
    (Lang::Ind, "id"),
    (Lang::Ita, "it"),
    (Lang::Jpn, "ja"),
    (Lang::Kor, "ko"),
    (Lang::Lat, "la"),
    (Lang::Lav, "lv"),
    (Lang::Lit, "lt"),
    (Lang::Nld, "nl"),
    (Lang::Nob, "no"),
    (Lang::Pol, "pl"),
    (Lang::Por, "pt"),
    (Lang::Ron, "ro"),
    (Lang::Rus, "ru"),
    (Lang::Slk, "sk"),
    (Lang::Slv, "sl"),
    (Lang::Spa, "es"),
    (Lang::Swe, "sv"),
    (Lang::Tur, "tr"),
    (Lang::Ukr, "uk"),
    (Lang::Vie, "vi"),
];

/// Two-letter code for a detected language
#[must_use]
pub fn iso_639_1(lang: Lang) -> Option<&'static str> {
    ISO_639_1.iter().find(|(l, _)| *l == lang).map(|(_, code)| *code)
}

/// Detected language for a two-letter code
#[must_use]
pub fn lang_from_iso_639_1(code: &str) -> Option<Lang> {
    ISO_639_1.iter().find(|(_, c)| *c == code).map(|(lang, _)| *lang)
}

/// Detects the language of a text
#[cfg_attr(test, mockall::automock)]
pub trait LanguageDetector {
    /// ISO 639-1 code of the text's language, `None` if it cannot be decided
    fn detect(&self, text: &str) -> Option<String>;
}

/// Language detector backed by `whatlang`
///
/// Detection is a pure function of the text, so repeated runs over the same
/// data assign the same languages.
pub struct WhatlangDetector {
    detector: Detector,
}

impl WhatlangDetector {
    /// Detector over every supported language
    #[must_use]
    pub fn new() -> Self {
        Self {
            detector: Detector::new(),
        }
    }

    /// Detector restricted to the given ISO 639-1 codes
    pub fn with_allowlist(codes: &[String]) -> Result<Self> {
        if codes.is_empty() {
            return Ok(Self::new());
        }
        let langs = codes
            .iter()
            .map(|code| {
                lang_from_iso_639_1(code).ok_or_else(|| {
                    ExtractError::Configuration(format!("Unknown language in detection allowlist: {code}"))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            detector: Detector::with_allowlist(langs),
        })
    }
}

impl Default for WhatlangDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageDetector for WhatlangDetector {
    fn detect(&self, text: &str) -> Option<String> {
        let info = self.detector.detect(text)?;
        let code = iso_639_1(info.lang());
        if code.is_none() {
            debug!(lang = info.lang().code(), "Detected language has no two-letter code");
        }
        code.map(ToString::to_string)
    }
}

/// Produces POS tags and named entities for a text
pub trait Tagger {
    /// Model name, used in logs
    fn name(&self) -> &str;

    /// Tag a cleaned message
    fn tag(&self, text: &str) -> Result<TaggedText>;
}

/// Closed word classes and conventions of one language
struct LanguageProfile {
    code: &'static str,
    determiners: &'static [&'static str],
    pronouns: &'static [&'static str],
    adpositions: &'static [&'static str],
    conjunctions: &'static [&'static str],
    auxiliaries: &'static [&'static str],
    titles: &'static [&'static str],
    /// Common nouns are capitalized (German)
    capitalized_nouns: bool,
}

const ENGLISH: LanguageProfile = LanguageProfile {
    code: "en",
    determiners: &["a", "an", "the", "this", "that", "these", "those", "some", "any", "every", "each", "no"],
    pronouns: &[
        "i", "me", "my", "mine", "you", "your", "yours", "he", "him", "his", "she", "her", "hers", "it", "its",
        "we", "us", "our", "ours", "they", "them", "their", "theirs", "myself", "yourself", "who", "what",
    ],
    adpositions: &[
        "in", "on", "at", "by", "for", "with", "about", "of", "from", "to", "into", "over", "under", "after",
        "before", "between", "through", "during", "without",
    ],
    conjunctions: &["and", "or", "but", "nor", "so", "yet"],
    auxiliaries: &[
        "is", "am", "are", "was", "were", "be", "been", "being", "have", "has", "had", "do", "does", "did",
        "will", "would", "shall", "should", "can", "could", "may", "might", "must",
    ],
    titles: &["mr", "mrs", "ms", "dr", "prof"],
    capitalized_nouns: false,
};

const FRENCH: LanguageProfile = LanguageProfile {
    code: "fr",
    determiners: &["le", "la", "les", "un", "une", "des", "du", "ce", "cet", "cette", "ces", "mon", "ma", "mes"],
    pronouns: &["je", "tu", "il", "elle", "on", "nous", "vous", "ils", "elles", "me", "te", "se", "moi", "toi", "lui", "leur"],
    adpositions: &["à", "de", "en", "dans", "sur", "sous", "avec", "sans", "pour", "par", "chez", "vers", "entre"],
    conjunctions: &["et", "ou", "mais", "donc", "or", "ni", "car"],
    auxiliaries: &["est", "suis", "es", "sont", "sommes", "êtes", "était", "ai", "as", "a", "avons", "avez", "ont"],
    titles: &["m", "mme", "mlle", "dr"],
    capitalized_nouns: false,
};

const GERMAN: LanguageProfile = LanguageProfile {
    code: "de",
    determiners: &["der", "die", "das", "den", "dem", "des", "ein", "eine", "einen", "einem", "einer", "kein", "keine"],
    pronouns: &["ich", "du", "er", "sie", "es", "wir", "ihr", "mich", "dich", "mir", "dir", "uns", "euch", "ihn", "ihm"],
    adpositions: &["in", "an", "auf", "mit", "von", "zu", "für", "bei", "nach", "aus", "über", "unter", "vor", "durch"],
    conjunctions: &["und", "oder", "aber", "denn", "sondern"],
    auxiliaries: &["ist", "bin", "bist", "sind", "seid", "war", "habe", "hast", "hat", "haben", "wird", "werden", "kann"],
    titles: &["herr", "frau", "dr", "prof"],
    capitalized_nouns: true,
};

const ITALIAN: LanguageProfile = LanguageProfile {
    code: "it",
    determiners: &["il", "lo", "la", "i", "gli", "le", "un", "uno", "una", "questo", "questa", "quel", "quella"],
    pronouns: &["io", "tu", "lui", "lei", "noi", "voi", "loro", "mi", "ti", "ci", "vi", "si", "me", "te"],
    adpositions: &["di", "a", "da", "in", "con", "su", "per", "tra", "fra", "del", "della", "nel", "nella", "al"],
    conjunctions: &["e", "o", "ma", "però", "oppure", "quindi"],
    auxiliaries: &["è", "sono", "sei", "siamo", "siete", "era", "ho", "hai", "ha", "abbiamo", "avete", "hanno"],
    titles: &["sig", "sig.ra", "dott", "dr"],
    capitalized_nouns: false,
};

const MULTILINGUAL: LanguageProfile = LanguageProfile {
    code: "xx",
    determiners: &[],
    pronouns: &[],
    adpositions: &[],
    conjunctions: &[],
    auxiliaries: &[],
    titles: &[],
    capitalized_nouns: false,
};

/// Rule-based tagger over closed word classes and capitalization
pub struct RuleTagger {
    name: String,
    profile: &'static LanguageProfile,
}

impl RuleTagger {
    /// Tagger for a two-letter language code
    pub fn for_language(code: &str) -> Result<Self> {
        let profile = match code {
            "en" => &ENGLISH,
            "fr" => &FRENCH,
            "de" => &GERMAN,
            "it" => &ITALIAN,
            other => return Err(ExtractError::ModelUnavailable(other.to_string())),
        };
        Ok(Self {
            name: format!("rule-{code}"),
            profile,
        })
    }

    /// Language-independent tagger used when no specific model exists
    #[must_use]
    pub fn multilingual() -> Self {
        Self {
            name: "rule-xx".to_string(),
            profile: &MULTILINGUAL,
        }
    }

    fn coarse_tag(&self, token: &str, sentence_start: bool) -> &'static str {
        let profile = self.profile;
        let lower = token.to_lowercase();
        let first = token.chars().next().unwrap_or(' ');

        if token.chars().all(|c| c.is_numeric() || c == '.' || c == ',') && first.is_numeric() {
            return "NUM";
        }
        if !first.is_alphanumeric() {
            return if ".,;:!?()[]{}\"'-…".contains(first) { "PUNCT" } else { "SYM" };
        }
        let lower = lower.as_str();
        if profile.determiners.contains(&lower) {
            return "DET";
        }
        if profile.pronouns.contains(&lower) {
            return "PRON";
        }
        if profile.adpositions.contains(&lower) {
            return "ADP";
        }
        if profile.conjunctions.contains(&lower) {
            return "CCONJ";
        }
        if profile.auxiliaries.contains(&lower) {
            return "AUX";
        }

        let all_caps = token.chars().count() > 1 && token.chars().all(|c| !c.is_lowercase());
        if all_caps && token.chars().any(char::is_alphabetic) {
            return "PROPN";
        }
        if first.is_uppercase() && !sentence_start {
            return if profile.capitalized_nouns { "NOUN" } else { "PROPN" };
        }

        match profile.code {
            "en" if lower.ends_with("ly") => "ADV",
            "en" if lower.ends_with("ing") || lower.ends_with("ed") => "VERB",
            "xx" => "X",
            _ => "NOUN",
        }
    }

    fn fine_tag(&self, pos: &'static str, token: &str) -> String {
        if self.profile.code != "en" {
            return pos.to_string();
        }
        let tag = match pos {
            "NUM" => "CD",
            "PUNCT" => ".",
            "DET" => "DT",
            "PRON" => "PRP",
            "ADP" => "IN",
            "CCONJ" => "CC",
            "AUX" => "MD",
            "PROPN" => "NNP",
            "ADV" => "RB",
            "VERB" if token.ends_with("ing") => "VBG",
            "VERB" => "VBD",
            "NOUN" if token.len() > 3 && token.ends_with('s') => "NNS",
            "NOUN" => "NN",
            other => other,
        };
        tag.to_string()
    }

    fn is_title(&self, token: &str) -> bool {
        self.profile.titles.contains(&token.to_lowercase().as_str())
    }

    fn entities(&self, tokens: &[Token]) -> Vec<NamedEntity> {
        let mut entities = Vec::new();
        let mut index = 0;
        while index < tokens.len() {
            if tokens[index].pos != "PROPN" {
                index += 1;
                continue;
            }
            let mut start = index;
            while index < tokens.len() && tokens[index].pos == "PROPN" {
                index += 1;
            }

            // A capitalized title opens the run but is not part of the name
            let titled_run = index - start > 1 && self.is_title(&tokens[start].text);
            if titled_run {
                start += 1;
            }
            let after_title = titled_run || (start > 0 && self.is_title(&tokens[start - 1].text));
            let acronym = index - start == 1 && tokens[start].text.chars().all(|c| !c.is_lowercase());
            let label = if after_title {
                "PER"
            } else if acronym {
                "ORG"
            } else {
                "MISC"
            };

            entities.push(NamedEntity {
                text: tokens[start..index].iter().map(|t| t.text.as_str()).collect::<Vec<_>>().join(" "),
                label: label.to_string(),
                start_token: start,
                end_token: index,
            });
        }
        entities
    }
}

/// Split text into word tokens and single-character punctuation tokens
#[must_use]
pub fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        let joins_word = (ch == '\'' || ch == '-' || ch == '’')
            && !current.is_empty()
            && chars.peek().is_some_and(|next| next.is_alphanumeric());
        if ch.is_alphanumeric() || joins_word {
            current.push(ch);
            continue;
        }
        if !current.is_empty() {
            tokens.push(std::mem::take(&mut current));
        }
        if !ch.is_whitespace() {
            tokens.push(ch.to_string());
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

impl Tagger for RuleTagger {
    fn name(&self) -> &str {
        &self.name
    }

    fn tag(&self, text: &str) -> Result<TaggedText> {
        let normalized = text.nfc().collect::<String>();
        let mut tokens = Vec::new();
        let mut sentence_start = true;

        for word in tokenize(&normalized) {
            let pos = self.coarse_tag(&word, sentence_start);
            sentence_start = matches!(word.as_str(), "." | "!" | "?");
            tokens.push(Token {
                tag: self.fine_tag(pos, &word),
                pos: pos.to_string(),
                text: word,
            });
        }

        let entities = self.entities(&tokens);
        Ok(TaggedText { tokens, entities })
    }
}

/// Language-specific taggers with a multilingual default
pub struct TaggerRegistry {
    models: HashMap<String, Box<dyn Tagger>>,
    default: Box<dyn Tagger>,
}

impl TaggerRegistry {
    /// Registry with only a default model
    #[must_use]
    pub fn new(default: Box<dyn Tagger>) -> Self {
        Self {
            models: HashMap::new(),
            default,
        }
    }

    /// Rule-based taggers for the given languages, multilingual default
    ///
    /// Languages without a built-in model are skipped with a warning and fall
    /// back to the default at tagging time.
    #[must_use]
    pub fn builtin(languages: &[String]) -> Self {
        let mut registry = Self::new(Box::new(RuleTagger::multilingual()));
        for language in languages {
            match RuleTagger::for_language(language) {
                Ok(tagger) => registry.register(language, Box::new(tagger)),
                Err(err) => warn!(error = %err, "Using multilingual model instead"),
            }
        }
        registry
    }

    /// Register or replace the model for a language
    pub fn register(&mut self, language: &str, tagger: Box<dyn Tagger>) {
        debug!(language, model = tagger.name(), "Registered tagger");
        self.models.insert(language.to_string(), tagger);
    }

    /// The model registered for a language
    pub fn model_for(&self, language: Option<&str>) -> Result<&dyn Tagger> {
        let language = language.ok_or_else(|| ExtractError::ModelUnavailable("unknown".to_string()))?;
        self.models
            .get(language)
            .map(|tagger| tagger.as_ref())
            .ok_or_else(|| ExtractError::ModelUnavailable(language.to_string()))
    }

    /// The model for a language, or the default one
    #[must_use]
    pub fn select(&self, language: Option<&str>) -> &dyn Tagger {
        match self.model_for(language) {
            Ok(tagger) => tagger,
            Err(err) => {
                debug!(error = %err, model = self.default.name(), "Falling back to default model");
                self.default.as_ref()
            },
        }
    }
}
