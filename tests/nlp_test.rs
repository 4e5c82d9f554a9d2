use chat_features::config::NlpConfig;
use chat_features::features::NlpModels;
use chat_features::nlp::{LanguageDetector, RuleTagger, Tagger, TaggerRegistry, WhatlangDetector};
use chat_features::sentiment::{LexiconSentimentScorer, SentimentScorer};

#[test]
fn test_detection_with_allowlist() {
    let detector = WhatlangDetector::with_allowlist(&["en".to_string(), "de".to_string()])
        .expect("Failed to create detector");
    assert_eq!(
        detector
            .detect("Ich habe heute keine Zeit, weil ich den ganzen Tag arbeiten muss")
            .as_deref(),
        Some("de")
    );
    assert_eq!(detector.detect(""), None);
}

#[test]
fn test_every_builtin_language_tags() {
    let samples = [
        ("en", "We will meet Sarah in London tomorrow."),
        ("fr", "Nous avons vu Marie à Paris hier."),
        ("de", "Wir haben Anna in Berlin gesehen."),
        ("it", "Abbiamo visto Giulia a Roma ieri."),
    ];
    for (language, text) in samples {
        let tagger = RuleTagger::for_language(language).expect("Failed to create tagger");
        let tagged = tagger.tag(text).expect("Failed to tag text");
        assert!(!tagged.tokens.is_empty(), "no tokens for {language}");
        assert_eq!(tagged.tokens.last().map(|t| t.pos.as_str()), Some("PUNCT"));
        assert!(
            tagged.entities.iter().all(|e| e.end_token <= tagged.tokens.len()),
            "entity out of range for {language}"
        );
    }
}

#[test]
fn test_french_closed_classes() {
    let tagger = RuleTagger::for_language("fr").expect("Failed to create tagger");
    let tagged = tagger.tag("nous avons vu Marie").expect("Failed to tag text");
    let pos: Vec<_> = tagged.tokens.iter().map(|t| t.pos.as_str()).collect();
    assert_eq!(pos, vec!["PRON", "AUX", "NOUN", "PROPN"]);
    // Non-English models use coarse tags as fine tags
    assert_eq!(tagged.tokens[0].tag, "PRON");
    assert_eq!(tagged.entities[0].text, "Marie");
}

#[test]
fn test_multilingual_default_tags_anything() {
    let registry = TaggerRegistry::builtin(&[]);
    let tagger = registry.select(Some("pt"));
    let tagged = tagger.tag("Vamos ao Porto amanhã").expect("Failed to tag text");
    assert_eq!(tagged.tokens.len(), 4);
    assert_eq!(tagged.tokens[2].pos, "PROPN");
    assert_eq!(tagged.tokens[1].pos, "X");
}

#[test]
fn test_text_is_normalized_before_tagging() {
    let tagger = RuleTagger::for_language("fr").expect("Failed to create tagger");
    // "e" followed by a combining acute accent
    let tagged = tagger.tag("cafe\u{301}").expect("Failed to tag text");
    assert_eq!(tagged.tokens[0].text, "café");
}

#[test]
fn test_sentiment_is_english_only() {
    let scorer = LexiconSentimentScorer::new(vec!["en".to_string()]);
    let scores = scorer
        .score("This is absolutely terrible, I hate it", Some("en"))
        .expect("Failed to score");
    assert!(scores.compound < -0.5);
    assert!(scores.neg > scores.pos);
    assert!(scorer.score("C'est terrible", Some("fr")).is_none());
}

#[test]
fn test_models_from_default_config() {
    let models = NlpModels::from_config(&NlpConfig::default()).expect("Failed to build models");
    assert!(models.lexicons.is_empty());
    assert_eq!(models.taggers.select(Some("it")).name(), "rule-it");
    assert_eq!(models.taggers.select(Some("nl")).name(), "rule-xx");
}

#[test]
fn test_missing_lexicon_file_fails_model_setup() {
    let mut config = NlpConfig::default();
    config
        .lexicons
        .insert("en".to_string(), "/nonexistent/liwc.dic".into());
    assert!(NlpModels::from_config(&config).is_err());
}
