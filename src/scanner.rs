//! Single-pass message scanner
//!
//! Walks a raw message once, character by character, and produces the word
//! count, the emoji shortcodes (`:name:`), the `@` mentions and a cleaned copy
//! of the text without markers and with collapsed whitespace.
//!
//! Marker characters are held in a side buffer while the marker is open. A
//! completed marker is recorded and never reaches the cleaned output. An emoji
//! marker still open at whitespace or end of input was not an emoji: its text
//! is written back (times, URLs, `Note:...`), except for symbol-only fragments
//! such as `:)`. This keeps the cleaned builder append-only.

/// Result of scanning one message
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanResult {
    /// Whitespace-delimited tokens with at least one letter or digit outside markers
    pub word_count: usize,
    /// Emoji shortcodes, in order of appearance, duplicates kept
    pub emojis: Vec<String>,
    /// Mentioned names in order of first appearance, without the `@`
    pub mentions: Vec<String>,
    /// Text without markers, without leading/trailing or repeated whitespace
    pub cleaned_text: String,
}

/// Marker currently being accumulated
#[derive(Debug)]
enum Marker {
    None,
    Emoji { name: String, after_mention: bool },
    Mention(String),
}

/// Append-only builder for the cleaned text that collapses whitespace runs
#[derive(Debug)]
struct CleanedBuilder {
    text: String,
    previous_was_space: bool,
}

impl CleanedBuilder {
    const fn new() -> Self {
        // Starting "after a space" drops leading whitespace
        Self {
            text: String::new(),
            previous_was_space: true,
        }
    }

    fn push_char(&mut self, ch: char) {
        self.text.push(ch);
        self.previous_was_space = false;
    }

    fn push_str(&mut self, text: &str) {
        if !text.is_empty() {
            self.text.push_str(text);
            self.previous_was_space = false;
        }
    }

    fn push_separator(&mut self, ch: char) {
        if !self.previous_was_space {
            self.text.push(ch);
            self.previous_was_space = true;
        }
    }

    fn finish(mut self) -> String {
        if self.previous_was_space {
            if let Some(last) = self.text.chars().last() {
                if last.is_whitespace() {
                    self.text.pop();
                }
            }
        }
        self.text
    }
}

/// Scanner state for one message
#[derive(Debug)]
struct Scanner {
    result: ScanResult,
    cleaned: CleanedBuilder,
    marker: Marker,
    in_word: bool,
}

impl Scanner {
    fn new() -> Self {
        Self {
            result: ScanResult::default(),
            cleaned: CleanedBuilder::new(),
            marker: Marker::None,
            in_word: false,
        }
    }

    fn feed(&mut self, ch: char) {
        if ch.is_whitespace() {
            self.end_token();
            self.cleaned.push_separator(ch);
            return;
        }

        match (&mut self.marker, ch) {
            (Marker::Emoji { name, after_mention }, ':') => {
                let name = std::mem::take(name);
                let after_mention = *after_mention;
                self.marker = Marker::None;
                if !name.is_empty() {
                    self.result.emojis.push(name);
                } else if !after_mention {
                    // `::` is not an emoji
                    self.cleaned.push_str("::");
                }
            },
            (Marker::Mention(_), ':') => {
                self.flush_mention();
                self.marker = Marker::Emoji {
                    name: String::new(),
                    after_mention: true,
                };
            },
            (Marker::Emoji { name: buf, .. } | Marker::Mention(buf), other) => buf.push(other),
            (Marker::None, ':') => {
                self.marker = Marker::Emoji {
                    name: String::new(),
                    after_mention: false,
                };
            },
            (Marker::None, '@') if !self.in_word => self.marker = Marker::Mention(String::new()),
            (Marker::None, other) => {
                if other.is_alphanumeric() {
                    self.in_word = true;
                }
                self.cleaned.push_char(other);
            },
        }
    }

    /// Close the current whitespace-delimited token
    fn end_token(&mut self) {
        if self.in_word {
            self.result.word_count += 1;
            self.in_word = false;
        }
        match std::mem::replace(&mut self.marker, Marker::None) {
            Marker::Mention(name) => self.record_mention(name),
            Marker::Emoji { name, after_mention } => self.restore_unclosed(&name, after_mention),
            Marker::None => {},
        }
    }

    /// Write back the text of an emoji marker that was never closed
    fn restore_unclosed(&mut self, name: &str, after_mention: bool) {
        let has_text = name.chars().any(char::is_alphanumeric);
        // Symbol-only fragments are emoticons, and a bare `:` after a mention belongs to it
        if !has_text && (after_mention || !name.is_empty()) {
            return;
        }
        self.cleaned.push_char(':');
        self.cleaned.push_str(name);
    }

    fn flush_mention(&mut self) {
        if let Marker::Mention(name) = std::mem::replace(&mut self.marker, Marker::None) {
            self.record_mention(name);
        }
    }

    fn record_mention(&mut self, name: String) {
        if !name.is_empty() && !self.result.mentions.contains(&name) {
            self.result.mentions.push(name);
        }
    }

    fn finish(mut self) -> ScanResult {
        self.end_token();
        self.result.cleaned_text = self.cleaned.finish();
        self.result
    }
}

/// Scan a raw message
///
/// # Examples
///
/// ```
/// use chat_features::scanner::scan;
///
/// let result = scan("Hello @bob :wave: how are you");
/// assert_eq!(result.word_count, 4);
/// assert_eq!(result.emojis, vec!["wave".to_string()]);
/// assert_eq!(result.mentions, vec!["bob".to_string()]);
/// assert_eq!(result.cleaned_text, "Hello how are you");
/// ```
#[must_use]
pub fn scan(text: &str) -> ScanResult {
    let mut scanner = Scanner::new();
    for ch in text.chars() {
        scanner.feed(ch);
    }
    scanner.finish()
}
