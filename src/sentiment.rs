//! Rule-based sentiment scoring
//!
//! Valence-aware scoring in the VADER manner: word valences are adjusted by
//! preceding boosters, negations, capitalization and a contrastive "but",
//! then summed and normalized into a compound score in `[-1, 1]` alongside
//! positive, negative and neutral proportions.

use std::collections::HashMap;

use crate::models::SentimentScores;

const VALENCE_SCALE: f64 = 1.5;
const BOOSTER_INCREMENT: f64 = 0.293;
const CAPS_INCREMENT: f64 = 0.733;
const NEGATION_SCALAR: f64 = -0.74;
const NORMALIZATION_ALPHA: f64 = 15.0;
const EXCLAMATION_INCREMENT: f64 = 0.292;
const QUESTION_INCREMENT: f64 = 0.18;

const POSITIVE_WORDS: &[(&str, f64)] = &[
    ("good", 1.0),
    ("great", 1.5),
    ("excellent", 2.0),
    ("amazing", 2.0),
    ("wonderful", 1.8),
    ("fantastic", 1.8),
    ("happy", 1.2),
    ("joy", 1.5),
    ("love", 2.0),
    ("like", 1.0),
    ("best", 1.5),
    ("better", 1.2),
    ("awesome", 1.8),
    ("perfect", 2.0),
    ("brilliant", 1.8),
    ("outstanding", 1.8),
    ("superb", 1.8),
    ("delightful", 1.5),
    ("pleased", 1.2),
    ("satisfied", 1.0),
    ("excited", 1.5),
    ("thrilled", 1.8),
    ("grateful", 1.5),
    ("thanks", 1.2),
    ("nice", 1.2),
    ("lucky", 1.0),
    ("successful", 1.5),
    ("win", 1.5),
];

const NEGATIVE_WORDS: &[(&str, f64)] = &[
    ("bad", -1.0),
    ("terrible", -2.0),
    ("awful", -2.0),
    ("horrible", -2.0),
    ("worst", -2.0),
    ("hate", -2.0),
    ("dislike", -1.0),
    ("poor", -1.2),
    ("disappointing", -1.5),
    ("sad", -1.2),
    ("angry", -1.5),
    ("upset", -1.2),
    ("frustrated", -1.5),
    ("annoyed", -1.2),
    ("disgusted", -1.8),
    ("furious", -2.0),
    ("depressed", -1.8),
    ("miserable", -1.8),
    ("hopeless", -1.8),
    ("worried", -1.2),
    ("anxious", -1.2),
    ("scared", -1.5),
    ("afraid", -1.2),
    ("broken", -1.2),
    ("useless", -1.5),
    ("worthless", -1.8),
];

/// Boosters raise (positive) or dampen (negative) the following valence
const BOOSTERS: &[(&str, f64)] = &[
    ("very", BOOSTER_INCREMENT),
    ("extremely", BOOSTER_INCREMENT),
    ("incredibly", BOOSTER_INCREMENT),
    ("absolutely", BOOSTER_INCREMENT),
    ("completely", BOOSTER_INCREMENT),
    ("totally", BOOSTER_INCREMENT),
    ("really", BOOSTER_INCREMENT),
    ("so", BOOSTER_INCREMENT),
    ("quite", BOOSTER_INCREMENT),
    ("somewhat", -BOOSTER_INCREMENT),
    ("slightly", -BOOSTER_INCREMENT),
    ("barely", -BOOSTER_INCREMENT),
    ("hardly", -BOOSTER_INCREMENT),
];

const NEGATIONS: &[&str] = &[
    "not", "no", "never", "none", "nothing", "nobody", "nowhere", "neither", "nor", "cannot", "without",
];

/// Scores the sentiment of a message
pub trait SentimentScorer {
    /// Scores for a raw message, `None` when the language is not supported
    fn score(&self, text: &str, language: Option<&str>) -> Option<SentimentScores>;
}

/// Lexicon-based scorer for English text
pub struct LexiconSentimentScorer {
    languages: Vec<String>,
    valences: HashMap<&'static str, f64>,
    boosters: HashMap<&'static str, f64>,
}

impl LexiconSentimentScorer {
    /// Scorer answering for the given language codes
    #[must_use]
    pub fn new(languages: Vec<String>) -> Self {
        let valences = POSITIVE_WORDS
            .iter()
            .chain(NEGATIVE_WORDS)
            .map(|(word, weight)| (*word, weight * VALENCE_SCALE))
            .collect();
        Self {
            languages,
            valences,
            boosters: BOOSTERS.iter().copied().collect(),
        }
    }

    /// Scores regardless of language
    #[must_use]
    pub fn polarity_scores(&self, text: &str) -> SentimentScores {
        let tokens: Vec<&str> = text
            .split_whitespace()
            .map(|word| word.trim_matches(|c: char| !c.is_alphanumeric() && c != '\''))
            .filter(|word| !word.is_empty())
            .collect();
        if tokens.is_empty() {
            return SentimentScores::default();
        }

        let lowered: Vec<String> = tokens.iter().map(|t| t.to_lowercase()).collect();
        let caps_count = tokens.iter().filter(|t| is_all_caps(t)).count();
        let cap_differential = caps_count > 0 && caps_count < tokens.len();

        let mut valences: Vec<f64> = tokens
            .iter()
            .enumerate()
            .map(|(i, token)| self.token_valence(i, token, &lowered, cap_differential))
            .collect();

        if let Some(pivot) = lowered.iter().position(|w| w == "but") {
            for (i, valence) in valences.iter_mut().enumerate() {
                if i < pivot {
                    *valence *= 0.5;
                } else if i > pivot {
                    *valence *= 1.5;
                }
            }
        }

        let emphasis = punctuation_emphasis(text);
        let mut sum: f64 = valences.iter().sum();
        if sum > 0.0 {
            sum += emphasis;
        } else if sum < 0.0 {
            sum -= emphasis;
        }
        let compound = (sum / (sum * sum + NORMALIZATION_ALPHA).sqrt()).clamp(-1.0, 1.0);

        let mut positive = 0.0;
        let mut negative = 0.0;
        let mut neutral = 0.0;
        for &valence in &valences {
            if valence > 0.0 {
                positive += valence + 1.0;
            } else if valence < 0.0 {
                negative += valence - 1.0;
            } else {
                neutral += 1.0;
            }
        }
        if positive > negative.abs() {
            positive += emphasis;
        } else if positive < negative.abs() {
            negative -= emphasis;
        }

        let total = positive + negative.abs() + neutral;
        SentimentScores {
            neg: round_to(negative.abs() / total, 3),
            neu: round_to(neutral / total, 3),
            pos: round_to(positive / total, 3),
            compound: round_to(compound, 4),
        }
    }

    fn token_valence(&self, i: usize, token: &str, lowered: &[String], cap_differential: bool) -> f64 {
        let word = lowered[i].as_str();
        if self.boosters.contains_key(word) {
            return 0.0;
        }
        let Some(&base) = self.valences.get(word) else {
            return 0.0;
        };

        let mut valence = base;
        if cap_differential && is_all_caps(token) {
            valence += CAPS_INCREMENT.copysign(valence);
        }

        for (distance, damping) in [(1, 1.0), (2, 0.95), (3, 0.9)] {
            if i < distance {
                break;
            }
            if let Some(&scalar) = self.boosters.get(lowered[i - distance].as_str()) {
                valence += scalar * damping * valence.signum();
            }
        }

        let negated = (1..=3)
            .filter(|distance| i >= *distance)
            .map(|distance| lowered[i - distance].as_str())
            .any(|previous| NEGATIONS.contains(&previous) || previous.ends_with("n't"));
        if negated {
            valence *= NEGATION_SCALAR;
        }
        valence
    }
}

impl SentimentScorer for LexiconSentimentScorer {
    fn score(&self, text: &str, language: Option<&str>) -> Option<SentimentScores> {
        let language = language?;
        if !self.languages.iter().any(|l| l == language) {
            return None;
        }
        Some(self.polarity_scores(text))
    }
}

fn is_all_caps(token: &str) -> bool {
    token.chars().any(char::is_alphabetic) && !token.chars().any(char::is_lowercase)
}

fn punctuation_emphasis(text: &str) -> f64 {
    let exclamations = text.chars().filter(|c| *c == '!').count().min(4);
    let questions = text.chars().filter(|c| *c == '?').count();
    let question_emphasis = match questions {
        0 | 1 => 0.0,
        2 | 3 => questions as f64 * QUESTION_INCREMENT,
        _ => 0.96,
    };
    exclamations as f64 * EXCLAMATION_INCREMENT + question_emphasis
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10_f64.powi(places);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scorer() -> LexiconSentimentScorer {
        LexiconSentimentScorer::new(vec!["en".to_string()])
    }

    #[test]
    fn test_positive_message() {
        let scores = scorer().polarity_scores("I love this");
        assert!((scores.compound - 0.6124).abs() < 1e-9);
        assert!((scores.pos - 0.667).abs() < 1e-9);
        assert!((scores.neu - 0.333).abs() < 1e-9);
        assert_eq!(scores.neg, 0.0);
    }

    #[test]
    fn test_negation_flips_polarity() {
        let scores = scorer().polarity_scores("this is not good");
        assert!(scores.compound < 0.0);
        assert!(scores.neg > 0.0);
    }

    #[test]
    fn test_boosters_and_dampeners() {
        let s = scorer();
        let plain = s.polarity_scores("good").compound;
        assert!(s.polarity_scores("very good").compound > plain);
        assert!(s.polarity_scores("slightly good").compound < plain);
    }

    #[test]
    fn test_exclamations_amplify() {
        let s = scorer();
        assert!(s.polarity_scores("good!!!").compound > s.polarity_scores("good").compound);
    }

    #[test]
    fn test_caps_emphasis_needs_mixed_case() {
        let s = scorer();
        assert!(s.polarity_scores("this is GREAT").compound > s.polarity_scores("this is great").compound);
        assert_eq!(
            s.polarity_scores("GREAT").compound,
            s.polarity_scores("great").compound
        );
    }

    #[test]
    fn test_but_shifts_weight_to_second_clause() {
        let scores = scorer().polarity_scores("the food was good but the service was terrible");
        assert!(scores.compound < 0.0);
    }

    #[test]
    fn test_neutral_and_empty_text() {
        let scores = scorer().polarity_scores("the meeting is at noon");
        assert_eq!(scores.compound, 0.0);
        assert_eq!(scores.neu, 1.0);
        assert_eq!(scorer().polarity_scores("  "), SentimentScores::default());
    }

    #[test]
    fn test_proportions_sum_to_one() {
        let scores = scorer().polarity_scores("great work, but the build is broken and I am sad");
        assert!((scores.pos + scores.neg + scores.neu - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_only_configured_languages_are_scored() {
        let s = scorer();
        assert!(s.score("I love this", Some("en")).is_some());
        assert!(s.score("J'adore ça", Some("fr")).is_none());
        assert!(s.score("I love this", None).is_none());
    }
}
