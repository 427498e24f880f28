//! Word tokeniser — splits a normalised line of text into [`Token`]s.
//!
//! Pipeline, in order:
//! 1. strip the configured punctuation characters ([`PUNCTUATION`]);
//! 2. fold the typographic apostrophes `‘ ’ ʼ` onto the canonical `'`;
//! 3. replace `-` and `/` with a space, so compounds like `sav-heol` split;
//! 4. split on whitespace;
//! 5. strip a leading **or** a trailing `'` (never both).
//!
//! Empty results are filtered, so no token is ever empty.  The function is
//! total: any input, including `""`, yields a valid (possibly empty) vector.

use once_cell::sync::Lazy;
use regex::Regex;

// ─────────────────────────────────────────────────────────────────────────────
// Character classes
// ─────────────────────────────────────────────────────────────────────────────

/// Punctuation removed before splitting.
/// Characters: , . ; ? ! : « » " ” “ ( ) … –
pub const PUNCTUATION: &[char] = &[
    ',', '.', ';', '?', '!', ':', '«', '»', '"', '\u{201D}', '\u{201C}', '(', ')', '…', '–',
];

/// Prefix a curator puts in front of a word they do not trust.
pub const BLACKLIST_MARKER: char = '*';

/// Canonical apostrophe every variant is folded onto.
pub const APOSTROPHE: char = '\'';

/// Apostrophe look-alikes: ‘ ’ ʼ
const APOSTROPHE_VARIANTS: &[char] = &['\u{2018}', '\u{2019}', '\u{02BC}'];

/// Characters that separate the parts of a compound word.
static RE_COMPOUND: Lazy<Regex> = Lazy::new(|| Regex::new(r"[-/]").unwrap());

// ─────────────────────────────────────────────────────────────────────────────
// Token
// ─────────────────────────────────────────────────────────────────────────────

/// A whitespace-delimited word, case preserved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    surface: String,
}

impl Token {
    pub fn new(surface: impl Into<String>) -> Self {
        Self { surface: surface.into() }
    }

    /// The token as written, blacklist marker included.
    pub fn surface(&self) -> &str {
        &self.surface
    }

    /// `true` when the curator flagged this word with [`BLACKLIST_MARKER`].
    pub fn is_blacklisted(&self) -> bool {
        self.surface.starts_with(BLACKLIST_MARKER)
    }

    /// The word with its blacklist marker removed.
    pub fn word(&self) -> &str {
        self.surface.trim_start_matches(BLACKLIST_MARKER)
    }

    /// Lowercase form of [`word`](Self::word).
    pub fn lowercase(&self) -> String {
        self.word().to_lowercase()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tokenisation helpers
// ─────────────────────────────────────────────────────────────────────────────

/// Remove every character of `symbols` from `text` and collapse runs of
/// whitespace into single spaces.
pub fn filter_out(text: &str, symbols: &[char]) -> String {
    let kept: String = text.chars().filter(|c| !symbols.contains(c)).collect();
    kept.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Fold the typographic apostrophes onto [`APOSTROPHE`].
pub fn normalize_apostrophes(text: &str) -> String {
    text.chars()
        .map(|c| if APOSTROPHE_VARIANTS.contains(&c) { APOSTROPHE } else { c })
        .collect()
}

fn strip_edge_apostrophe(word: &str) -> &str {
    if let Some(rest) = word.strip_prefix(APOSTROPHE) {
        rest
    } else if let Some(rest) = word.strip_suffix(APOSTROPHE) {
        rest
    } else {
        word
    }
}

/// Split `text` into word tokens.
pub fn tokenize(text: &str) -> Vec<Token> {
    let text = filter_out(text, PUNCTUATION);
    let text = normalize_apostrophes(&text);
    let text = RE_COMPOUND.replace_all(&text, " ");

    text.split_whitespace()
        .map(strip_edge_apostrophe)
        .filter(|w| !w.is_empty())
        .map(Token::new)
        .collect()
}

/// Convenience: token surfaces only.
pub fn tokenize_words(text: &str) -> Vec<String> {
    tokenize(text).into_iter().map(|t| t.surface).collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
