use std::collections::HashMap;
use std::io::Write;

use chat_features::lexicon::{Lexicon, LexiconSet};
use chat_features::ExtractError;
use tempfile::NamedTempFile;

fn lexicon_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    file.write_all(content.as_bytes()).expect("Failed to write lexicon");
    file
}

#[test]
fn test_load_lexicon_file() {
    let file = lexicon_file("work job* office boss\nleisure game* party\n\nwork meeting\n");
    let lexicon = Lexicon::load(file.path()).expect("Failed to load lexicon");

    assert_eq!(lexicon.category_names(), ["work", "leisure"]);
    assert_eq!(
        lexicon.count_categories("The boss left the office for a party after the meeting, no more jobs!"),
        Some(vec![4, 1])
    );
}

#[test]
fn test_lexicon_set_per_language() {
    let english = lexicon_file("posemo happy\n");
    let french = lexicon_file("posemo heureux content\n");
    let paths = HashMap::from([
        ("en".to_string(), english.path().to_path_buf()),
        ("fr".to_string(), french.path().to_path_buf()),
    ]);

    let set = LexiconSet::load(&paths).expect("Failed to load lexicons");
    assert_eq!(set.len(), 2);

    let fr = set.for_language(Some("fr")).expect("french lexicon");
    assert_eq!(fr.count_categories("je suis très content"), Some(vec![1]));
    assert!(set.for_language(Some("de")).is_none());
    assert!(set.for_language(None).is_none());
}

#[test]
fn test_malformed_file_names_the_path() {
    let file = lexicon_file("posemo happy\n* broken\n");
    let err = Lexicon::load(file.path()).unwrap_err();
    assert!(matches!(err, ExtractError::Configuration(_)));
    assert!(err.to_string().contains(&file.path().display().to_string()));
}

#[test]
fn test_one_bad_file_fails_the_set() {
    let good = lexicon_file("posemo happy\n");
    let paths = HashMap::from([
        ("en".to_string(), good.path().to_path_buf()),
        ("de".to_string(), "/nonexistent/de.dic".into()),
    ]);
    assert!(LexiconSet::load(&paths).is_err());
}
