//! Hand-curated override tables.
//!
//! All tables are flat, line-oriented UTF-8 files.  Blank lines and lines
//! starting with `#` are ignored.
//!
//! | Table              | Line format                         | Key case      |
//! |--------------------|-------------------------------------|---------------|
//! | corrections        | `wrong<TAB>right` (multi-word keys) | insensitive   |
//! | capitalized words  | `Name [PH1 PH2 …]`                  | lowercased    |
//! | verbal tics        | `filler PH1 PH2 …`                  | lowercased    |
//! | lexicon overrides  | `word PH1 PH2 …`                    | lowercased    |
//!
//! Pronunciation tables accept either one space-separated pronunciation per
//! line, or tab-separated fields where every field after the key is a full
//! pronunciation variant.  Repeating a key adds variants.
//!
//! Tables are loaded once and never mutated afterwards.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use regex::{NoExpand, Regex, RegexBuilder};
use serde::Deserialize;
use tracing::debug;

use crate::error::{LoadError, Result};

// ─────────────────────────────────────────────────────────────────────────────
// Line parsing
// ─────────────────────────────────────────────────────────────────────────────

/// Read a required table, distinguishing "absent" from "unreadable".
pub(crate) fn read_table(path: &Path) -> Result<String> {
    if !path.exists() {
        return Err(LoadError::Missing(path.to_path_buf()));
    }
    std::fs::read_to_string(path)
        .map_err(|source| LoadError::Read { path: path.to_path_buf(), source })
}

/// Non-empty, non-comment lines with their 1-based line number.
pub(crate) fn content_lines(text: &str) -> impl Iterator<Item = (usize, &str)> {
    text.lines()
        .enumerate()
        .map(|(i, l)| (i + 1, l.trim()))
        .filter(|(_, l)| !l.is_empty() && !l.starts_with('#'))
}

/// Split a pronunciation-table line into its key and pronunciation variants.
///
/// Each variant is normalised to single-space-separated phoneme symbols.
pub(crate) fn parse_pronunciation_line(line: &str) -> (&str, Vec<String>) {
    let normalize = |s: &str| s.split_whitespace().collect::<Vec<_>>().join(" ");

    if line.contains('\t') {
        let mut fields = line.split('\t');
        let key = fields.next().unwrap_or_default().trim();
        let variants = fields.map(normalize).filter(|v| !v.is_empty()).collect();
        (key, variants)
    } else {
        let (key, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let rest = normalize(rest);
        (key, if rest.is_empty() { Vec::new() } else { vec![rest] })
    }
}

/// Uppercase the first character, lowercase the rest.
pub fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Corrections
// ─────────────────────────────────────────────────────────────────────────────

/// A multi-word correction, matched case-insensitively against a whole sentence.
#[derive(Debug, Clone)]
struct PhraseCorrection {
    pattern: Regex,
    replacement: String,
}

/// Corrected forms: `wrong → right`.
///
/// Keys containing a space are *phrase* corrections applied to the whole
/// sentence before tokenisation; the others are matched per token.
#[derive(Debug, Clone, Default)]
pub struct Corrections {
    words: HashMap<String, String>,
    phrases: Vec<PhraseCorrection>,
}

impl Corrections {
    pub fn parse(text: &str, origin: &Path) -> Result<Self> {
        let mut table = Self::default();
        for (n, line) in content_lines(text) {
            let (wrong, right) = line
                .split_once('\t')
                .ok_or_else(|| LoadError::malformed(origin, n, "expected `wrong<TAB>right`"))?;
            table.insert(wrong.trim(), right.trim());
        }
        Ok(table)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let table = Self::parse(&read_table(path)?, path)?;
        debug!(
            words = table.words.len(),
            phrases = table.phrases.len(),
            "loaded corrections from {}",
            path.display()
        );
        Ok(table)
    }

    /// Add one correction.  Later entries win for single words; phrases are
    /// applied in insertion order.
    pub fn insert(&mut self, wrong: &str, right: &str) {
        if wrong.contains(' ') {
            let pattern = RegexBuilder::new(&regex::escape(wrong))
                .case_insensitive(true)
                .build()
                .expect("escaped literal is always a valid pattern");
            self.phrases.push(PhraseCorrection { pattern, replacement: right.to_string() });
        } else {
            self.words.insert(wrong.to_lowercase(), right.to_string());
        }
    }

    /// Replacement for a single token, looked up case-insensitively.
    pub fn word(&self, word: &str) -> Option<&str> {
        self.words.get(&word.to_lowercase()).map(String::as_str)
    }

    /// Apply every phrase correction to `sentence`.
    ///
    /// A key matches if it occurs in the sentence or in its lowercased form;
    /// the replacement is written into the original, case-preserved text.
    pub fn apply_phrases(&self, sentence: &str) -> String {
        let mut out = sentence.to_string();
        for phrase in &self.phrases {
            if phrase.pattern.is_match(&out) {
                out = phrase.pattern.replace_all(&out, NoExpand(&phrase.replacement)).into_owned();
            }
        }
        out
    }

    pub fn len(&self) -> usize {
        self.words.len() + self.phrases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Pronunciation tables
// ─────────────────────────────────────────────────────────────────────────────

/// Lowercase word → pronunciation variants (each a space-separated phoneme
/// string).  Backs the capitalized-words, verbal-tic and lexicon-override
/// tables.
#[derive(Debug, Clone, Default)]
pub struct PronunciationTable {
    entries: HashMap<String, Vec<String>>,
}

impl PronunciationTable {
    pub fn parse(text: &str) -> Self {
        let mut table = Self::default();
        for (_, line) in content_lines(text) {
            let (key, variants) = parse_pronunciation_line(line);
            let slot = table.entries.entry(key.to_lowercase()).or_default();
            for v in variants {
                if !slot.contains(&v) {
                    slot.push(v);
                }
            }
        }
        table
    }

    pub fn load(path: &Path) -> Result<Self> {
        let table = Self::parse(&read_table(path)?);
        debug!(entries = table.len(), "loaded {}", path.display());
        Ok(table)
    }

    pub fn contains(&self, word: &str) -> bool {
        self.entries.contains_key(&word.to_lowercase())
    }

    /// All variants for `word` (case-insensitive); empty when the entry has
    /// no explicit pronunciation.
    pub fn variants(&self, word: &str) -> &[String] {
        self.entries.get(&word.to_lowercase()).map(Vec::as_slice).unwrap_or(&[])
    }

    /// First variant split into phoneme symbols.
    pub fn phonemes(&self, word: &str) -> Option<Vec<String>> {
        self.variants(word)
            .first()
            .map(|v| v.split_whitespace().map(str::to_string).collect())
    }

    /// `(lowercase word, variants)` pairs in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// All override tables
// ─────────────────────────────────────────────────────────────────────────────

/// Paths of the four word-level override tables (acronyms live in
/// [`crate::acronym::AcronymRegistry`]).
#[derive(Debug, Clone, Deserialize)]
pub struct TablePaths {
    pub corrections: PathBuf,
    pub capitalized: PathBuf,
    pub verbal_tics: PathBuf,
    pub lexicon_overrides: PathBuf,
}

/// Read-only snapshot of the curated tables for one run.
#[derive(Debug, Clone, Default)]
pub struct OverrideTables {
    pub corrections: Corrections,
    /// Words that must be written with a capital letter.
    pub capitalized: PronunciationTable,
    /// Disfluencies kept in the lexicon but optionally dropped from text.
    pub verbal_tics: PronunciationTable,
    /// Explicit pronunciations that bypass the rule table.
    pub lexicon_overrides: PronunciationTable,
}

impl OverrideTables {
    pub fn load(paths: &TablePaths) -> Result<Self> {
        Ok(Self {
            corrections: Corrections::load(&paths.corrections)?,
            capitalized: PronunciationTable::load(&paths.capitalized)?,
            verbal_tics: PronunciationTable::load(&paths.verbal_tics)?,
            lexicon_overrides: PronunciationTable::load(&paths.lexicon_overrides)?,
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
