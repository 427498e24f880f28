//! Sentence cleaning and spelling review.
//!
//! Both passes walk the tokens of one sentence and classify each with a fixed
//! precedence.  [`TextCleaner::clean`] produces language-model text and a
//! blacklist ratio; [`TextCleaner::correct`] produces an annotated copy for a
//! human reviewer.
//!
//! | #  | `clean`                                | `correct`                      |
//! |----|----------------------------------------|--------------------------------|
//! | 1  | `*word`: counted bad, then classified  | `*word`: left as is            |
//! | 2  | verbal tic (when dropping): omitted    | bare digits: flagged           |
//! | 3  | corrected form: replacement            | corrected form: replacement    |
//! | 4  | capitalized word: re-capitalized       | capitalized word: accepted     |
//! | 5  | acronym: kept, bad when unknown        | acronym: flagged when unknown  |
//! | 6  | anything else: lowercased              | spell check                    |
//!
//! Multi-word corrections are applied to the whole sentence first
//! ([`TextCleaner::pre_process`]).

use std::fmt;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::Deserialize;

use crate::{
    acronym::is_acronym,
    config::Resources,
    dictionary::capitalize,
    tokenize::{tokenize, BLACKLIST_MARKER},
};

// ─────────────────────────────────────────────────────────────────────────────
// Number → words
// ─────────────────────────────────────────────────────────────────────────────

const UNITS: [&str; 20] = [
    "mann", "unan", "daou", "tri", "pevar", "pemp", "c'hwec'h", "seizh", "eizh", "nav",
    "dek", "unnek", "daouzek", "trizek", "pevarzek", "pemzek", "c'hwezek", "seitek", "triwec'h",
    "naontek",
];

/// Largest number [`number_to_words`] spells out.
pub const MAX_SPELLED_NUMBER: u64 = 999_999;

/// Tens in the vigesimal system, with the span of units each one absorbs.
fn tens_base(n: u64) -> (u64, &'static str) {
    match n {
        20..=29 => (20, "ugent"),
        30..=39 => (30, "tregont"),
        40..=49 => (40, "daou-ugent"),
        50..=59 => (50, "hanter-kant"),
        60..=79 => (60, "tri-ugent"),
        _ => (80, "pevar-ugent"),
    }
}

fn below_hundred(n: u64) -> String {
    if n < 20 {
        return UNITS[n as usize].to_string();
    }
    let (base, name) = tens_base(n);
    match n - base {
        0 => name.to_string(),
        rest if base == 20 => format!("{} warn-ugent", UNITS[rest as usize]),
        rest => format!("{} ha {name}", UNITS[rest as usize]),
    }
}

fn below_thousand(n: u64) -> String {
    let hundreds = n / 100;
    let rest = n % 100;
    let mut parts = Vec::new();
    match hundreds {
        0 => {}
        1 => parts.push("kant".to_string()),
        // soft mutation k → c'h
        2 | 3 | 4 | 9 => parts.push(format!("{} c'hant", UNITS[hundreds as usize])),
        _ => parts.push(format!("{} kant", UNITS[hundreds as usize])),
    }
    if rest > 0 || hundreds == 0 {
        parts.push(below_hundred(rest));
    }
    parts.join(" ")
}

/// Breton cardinal for `n`, or `None` above [`MAX_SPELLED_NUMBER`].
///
/// `1935` → `mil nav c'hant pemp ha tregont`.
pub fn number_to_words(n: u64) -> Option<String> {
    if n > MAX_SPELLED_NUMBER {
        return None;
    }
    let thousands = n / 1000;
    let rest = n % 1000;
    let mut parts = Vec::new();
    match thousands {
        0 => {}
        1 => parts.push("mil".to_string()),
        2 => parts.push("daou vil".to_string()),
        t => parts.push(format!("{} mil", below_thousand(t))),
    }
    if rest > 0 || thousands == 0 {
        parts.push(below_thousand(rest));
    }
    Some(parts.join(" "))
}

static RE_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\d+\b").unwrap());

/// Replace every standalone digit run with its Breton words.  Runs glued to
/// letters (`1añ`) or too large are left alone.
pub fn expand_numbers(text: &str) -> String {
    RE_NUMBER
        .replace_all(text, |caps: &Captures| {
            caps[0]
                .parse::<u64>()
                .ok()
                .and_then(number_to_words)
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

// ─────────────────────────────────────────────────────────────────────────────
// Metadata
// ─────────────────────────────────────────────────────────────────────────────

static RE_SPEAKER_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{[^}]*\}").unwrap());

/// Remove `{speaker:gender}` style tags and collapse whitespace.
pub fn strip_speaker_tags(line: &str) -> String {
    let text = RE_SPEAKER_TAG.replace_all(line, " ");
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

// ─────────────────────────────────────────────────────────────────────────────
// Results
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct Cleaned {
    pub text: String,
    /// Share of emitted tokens that are blacklisted or unknown acronyms.
    /// `1.0` when nothing was emitted.
    pub blacklist_ratio: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mark {
    Accepted,
    Corrected,
    Flagged,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotated {
    pub text: String,
    pub mark: Mark,
}

/// How [`Correction::render`] shows the marks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Markup {
    /// Terminal colors: corrected in green, flagged in red.
    Ansi,
    /// `<corrected>` and `[flagged]`.
    Brackets,
    /// No marks.
    Plain,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Correction {
    pub tokens: Vec<Annotated>,
    pub errors: usize,
}

impl Correction {
    pub fn render(&self, markup: Markup) -> String {
        let words: Vec<String> = self
            .tokens
            .iter()
            .map(|t| match (markup, t.mark) {
                (_, Mark::Accepted) | (Markup::Plain, _) => t.text.clone(),
                (Markup::Ansi, Mark::Corrected) => format!("\x1b[32m{}\x1b[0m", t.text),
                (Markup::Ansi, Mark::Flagged) => format!("\x1b[31m{}\x1b[0m", t.text),
                (Markup::Brackets, Mark::Corrected) => format!("<{}>", t.text),
                (Markup::Brackets, Mark::Flagged) => format!("[{}]", t.text),
            })
            .collect();
        words.join(" ")
    }
}

impl fmt::Display for Correction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(Markup::Brackets))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// TextCleaner
// ─────────────────────────────────────────────────────────────────────────────

/// Options of [`TextCleaner::clean`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct CleanOptions {
    /// Emit `*word` as `word`.
    pub strip_blacklist_marker: bool,
    /// Leave verbal tics out of the output.
    pub drop_verbal_tics: bool,
    /// Spell digit runs out as Breton words.
    pub expand_numbers: bool,
}

impl CleanOptions {
    /// Options for language-model text: markers stripped, tics dropped,
    /// numbers spelled out.
    pub fn corpus() -> Self {
        Self { strip_blacklist_marker: true, drop_verbal_tics: true, expand_numbers: true }
    }
}

pub struct TextCleaner<'a> {
    res: &'a Resources,
    pub options: CleanOptions,
}

impl<'a> TextCleaner<'a> {
    pub fn new(res: &'a Resources) -> Self {
        Self { res, options: CleanOptions::default() }
    }

    pub fn with_options(res: &'a Resources, options: CleanOptions) -> Self {
        Self { res, options }
    }

    pub fn resources(&self) -> &'a Resources {
        self.res
    }

    /// Apply the multi-word corrections to the whole sentence.
    pub fn pre_process(&self, sentence: &str) -> String {
        self.res.tables.corrections.apply_phrases(sentence)
    }

    /// Steps 4–6 for a word that is neither blacklisted, a tic nor corrected.
    /// The flag is `true` for an unknown acronym.
    fn normalize(&self, word: &str) -> (String, bool) {
        if self.res.tables.capitalized.contains(word) {
            (capitalize(word), false)
        } else if is_acronym(word) {
            (word.to_string(), !self.res.acronyms.contains(word))
        } else {
            (word.to_lowercase(), false)
        }
    }

    /// Language-model form of `sentence` and its blacklist ratio.
    pub fn clean(&self, sentence: &str) -> Cleaned {
        let mut text = self.pre_process(sentence);
        if self.options.expand_numbers {
            text = expand_numbers(&text);
        }

        let mut words: Vec<String> = Vec::new();
        let mut bad = 0usize;

        for token in tokenize(&text) {
            let word = token.word();
            if word.is_empty() {
                continue;
            }
            // blacklisted tokens count even when nothing is emitted for them
            if token.is_blacklisted() {
                bad += 1;
            }
            if self.options.drop_verbal_tics && self.res.tables.verbal_tics.contains(word) {
                continue;
            }

            let emitted: Vec<(String, bool)> = match self.res.tables.corrections.word(word) {
                Some(replacement) => tokenize(replacement)
                    .iter()
                    .map(|t| self.normalize(t.word()))
                    .collect(),
                None => vec![self.normalize(word)],
            };
            if !token.is_blacklisted() && emitted.iter().any(|(_, unknown)| *unknown) {
                bad += 1;
            }
            let keep_marker = token.is_blacklisted() && !self.options.strip_blacklist_marker;
            for (i, (w, _)) in emitted.into_iter().enumerate() {
                if i == 0 && keep_marker {
                    words.push(format!("{BLACKLIST_MARKER}{w}"));
                } else {
                    words.push(w);
                }
            }
        }

        let blacklist_ratio =
            if words.is_empty() { 1.0 } else { (bad as f64 / words.len() as f64).min(1.0) };
        Cleaned { text: words.join(" "), blacklist_ratio }
    }

    /// Annotated copy of `sentence` and its number of spelling errors.
    pub fn correct(&self, sentence: &str) -> Correction {
        let text = self.pre_process(sentence);
        let tables = &self.res.tables;
        let mut out = Correction::default();

        for token in tokenize(&text) {
            let word = token.word();
            if word.is_empty() {
                continue;
            }
            let annotated = |text: String, mark: Mark| Annotated { text, mark };

            let (item, error) = if token.is_blacklisted() {
                (annotated(token.surface().to_string(), Mark::Accepted), false)
            } else if word.chars().all(|c| c.is_ascii_digit()) {
                (annotated(word.to_string(), Mark::Flagged), true)
            } else if let Some(replacement) = tables.corrections.word(word) {
                (annotated(replacement.to_string(), Mark::Corrected), false)
            } else if tables.capitalized.contains(word) {
                let fixed = capitalize(word);
                let mark = if fixed == word { Mark::Accepted } else { Mark::Corrected };
                (annotated(fixed, mark), false)
            } else if is_acronym(word) {
                if self.res.acronyms.contains(word) {
                    (annotated(word.to_string(), Mark::Accepted), false)
                } else {
                    (annotated(word.to_string(), Mark::Flagged), true)
                }
            } else if tables.verbal_tics.contains(word) || self.res.speller.spell(&token.lowercase()) {
                (annotated(token.lowercase(), Mark::Accepted), false)
            } else {
                (annotated(token.lowercase(), Mark::Flagged), true)
            };

            if error {
                out.errors += 1;
            }
            out.tokens.push(item);
        }
        out
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
