//! Text normalization for extracted labels and cell text.
//!
//! Word tables frequently carry headers with stray line breaks, non-breaking
//! spaces and words split across lines ("Concen tration"). Labels are
//! canonicalized here before they are matched or persisted.

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

fn whitespace_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("valid whitespace regex"))
}

/// Canonicalize whitespace: NFC, exotic spaces to ASCII space, runs collapsed, trimmed.
pub fn normalize_whitespace(text: &str) -> String {
    let nfc: String = text
        .nfc()
        .map(|c| match c {
            '\u{00A0}' | '\u{2007}' | '\u{202F}' | '\u{2002}'..='\u{200A}' => ' ',
            '\u{200B}' | '\u{200C}' | '\u{200D}' | '\u{FEFF}' => ' ',
            _ => c,
        })
        .collect();
    whitespace_regex().replace_all(nfc.trim(), " ").trim().to_string()
}

/// Comparison key: lowercase, only `[a-z0-9 ]`, whitespace collapsed.
pub fn comparison_key(text: &str) -> String {
    let lowered: String = text
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_lowercase() || c.is_ascii_digit() {
                c
            } else if c.is_whitespace() {
                ' '
            } else {
                '\0'
            }
        })
        .filter(|c| *c != '\0')
        .collect();
    lowered.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Key used for custom header and section rule lookups: lowercase, trailing colons removed.
pub fn label_key(text: &str) -> String {
    normalize_whitespace(text)
        .trim_end_matches([':', '：'])
        .trim()
        .to_lowercase()
}

/// Words known to be whole, derived from canonical column names.
#[derive(Debug, Clone, Default)]
pub struct Vocabulary {
    words: HashSet<String>,
}

impl Vocabulary {
    /// Minimum word length admitted into the vocabulary.
    pub const MIN_WORD_LEN: usize = 3;

    /// Build a vocabulary from labels.
    pub fn from_labels<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let words = labels
            .into_iter()
            .flat_map(|label| {
                comparison_key(label.as_ref())
                    .split(' ')
                    .filter(|w| w.len() >= Self::MIN_WORD_LEN)
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            })
            .collect();
        Self { words }
    }

    /// Check whether a token (compared by key) is a known word.
    pub fn contains(&self, token: &str) -> bool {
        let key = comparison_key(token);
        !key.is_empty() && self.words.contains(&key)
    }

    /// Number of known words.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Check if the vocabulary is empty.
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

/// Rejoin tokens that were split by a stray space or line break.
///
/// Two adjacent tokens merge when their concatenation is a vocabulary word
/// and at least one of them alone is not.
pub fn rejoin_split_tokens(text: &str, vocab: &Vocabulary) -> String {
    if vocab.is_empty() {
        return text.to_string();
    }

    let tokens: Vec<&str> = text.split(' ').filter(|t| !t.is_empty()).collect();
    let mut out: Vec<String> = Vec::with_capacity(tokens.len());
    let mut i = 0;
    while i < tokens.len() {
        if i + 1 < tokens.len() {
            let (a, b) = (tokens[i], tokens[i + 1]);
            let joined = format!("{a}{b}");
            let both_words = !comparison_key(a).is_empty() && !comparison_key(b).is_empty();
            if both_words && vocab.contains(&joined) && !(vocab.contains(a) && vocab.contains(b)) {
                out.push(joined);
                i += 2;
                continue;
            }
        }
        out.push(tokens[i].to_string());
        i += 1;
    }
    out.join(" ")
}

/// Header label in the form it is matched and persisted under.
pub fn header_label(text: &str, vocab: &Vocabulary) -> String {
    rejoin_split_tokens(&normalize_whitespace(text), vocab)
}
