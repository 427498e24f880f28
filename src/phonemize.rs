//! Grapheme-to-phoneme transliteration with a longest-match rewrite table.
//!
//! A word is lowercased, its internal hyphens become the boundary anchor `.`,
//! and it is wrapped as `.word.` so rules can target word edges (`d.` → `T`).
//! The scan then walks left to right:
//!
//! | Step | Action                                                        |
//! |------|---------------------------------------------------------------|
//! | 1    | try every key length from the table maximum (≤ 4) down to 1   |
//! | 2    | on a hit, append the rule's phonemes and skip the key length  |
//! | 3    | on a miss, record a [`Gap`] (unless the char is the anchor)   |
//!
//! A lexicon override always wins over the rules and is returned verbatim.
//!
//! The default Breton table ships inside the crate (`data/rules.tsv`) and can be
//! replaced by any file in the same `key<TAB>PH1 PH2 …` format.

use std::{
    collections::{BTreeSet, HashMap},
    fmt,
    path::Path,
};

use once_cell::sync::Lazy;
use tracing::debug;

use crate::dictionary::{content_lines, parse_pronunciation_line, read_table, PronunciationTable};
use crate::error::{LoadError, Result};

/// Word-boundary anchor.
pub const ANCHOR: char = '.';

/// Longest key a rule may have, in characters.
pub const MAX_RULE_LEN: usize = 4;

const BRETON_RULES: &str = include_str!("../data/rules.tsv");

static BRETON: Lazy<RuleTable> = Lazy::new(|| {
    RuleTable::parse(BRETON_RULES, Path::new("data/rules.tsv"))
        .expect("embedded rule table is well-formed")
});

// ─────────────────────────────────────────────────────────────────────────────
// Rule table
// ─────────────────────────────────────────────────────────────────────────────

/// Orthographic substring → phoneme symbols.
#[derive(Debug, Clone, Default)]
pub struct RuleTable {
    rules: HashMap<String, Vec<String>>,
    max_len: usize,
}

impl RuleTable {
    /// The built-in Breton rule table.
    pub fn breton() -> &'static RuleTable {
        &BRETON
    }

    /// Parse a rule file.  Every line needs a 1–4 character key and at least
    /// one phoneme; anything else is [`LoadError::Malformed`].
    pub fn parse(text: &str, origin: &Path) -> Result<Self> {
        let mut table = Self::default();
        for (n, line) in content_lines(text) {
            let (key, variants) = parse_pronunciation_line(line);
            let Some(phonemes) = variants.first() else {
                return Err(LoadError::malformed(origin, n, format!("rule `{key}` has no phonemes")));
            };
            let len = key.chars().count();
            if len > MAX_RULE_LEN {
                return Err(LoadError::malformed(
                    origin,
                    n,
                    format!("rule key `{key}` is longer than {MAX_RULE_LEN} characters"),
                ));
            }
            table.insert(key, phonemes.split_whitespace());
        }
        Ok(table)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let table = Self::parse(&read_table(path)?, path)?;
        debug!(rules = table.len(), "loaded rule table {}", path.display());
        Ok(table)
    }

    /// Add or replace one rule.  The key is lowercased.
    pub fn insert<I, S>(&mut self, key: &str, phonemes: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let key = key.to_lowercase();
        self.max_len = self.max_len.max(key.chars().count().min(MAX_RULE_LEN));
        self.rules.insert(key, phonemes.into_iter().map(Into::into).collect());
    }

    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.rules.get(key).map(Vec::as_slice)
    }

    /// Every phoneme symbol the table can produce, sorted.
    pub fn inventory(&self) -> BTreeSet<String> {
        self.rules.values().flatten().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Transliteration result
// ─────────────────────────────────────────────────────────────────────────────

/// A character no rule covered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Gap {
    /// Character offset in the lowercased word.
    pub position: usize,
    pub ch: char,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Transliteration {
    pub phonemes: Vec<String>,
    pub gaps: Vec<Gap>,
    /// `true` when the phonemes came from a lexicon override.
    pub from_override: bool,
}

impl Transliteration {
    /// No phoneme at all: the word cannot go into a lexicon.
    pub fn is_empty(&self) -> bool {
        self.phonemes.is_empty()
    }

    /// Phonemes were produced and every character was covered.
    pub fn is_complete(&self) -> bool {
        !self.phonemes.is_empty() && self.gaps.is_empty()
    }
}

impl fmt::Display for Transliteration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.phonemes.join(" "))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Phonemizer
// ─────────────────────────────────────────────────────────────────────────────

/// Rule table plus optional overrides.  Cheap to copy, holds borrows only.
#[derive(Debug, Clone, Copy)]
pub struct Phonemizer<'a> {
    rules: &'a RuleTable,
    overrides: Option<&'a PronunciationTable>,
}

impl<'a> Phonemizer<'a> {
    pub fn new(rules: &'a RuleTable) -> Self {
        Self { rules, overrides: None }
    }

    pub fn with_overrides(mut self, overrides: &'a PronunciationTable) -> Self {
        self.overrides = Some(overrides);
        self
    }

    /// Phonemes for `word`: the override when one exists, otherwise the rules.
    pub fn word_to_phonemes(&self, word: &str) -> Transliteration {
        if let Some(phonemes) = self.overrides.and_then(|o| o.phonemes(word)) {
            return Transliteration { phonemes, gaps: Vec::new(), from_override: true };
        }
        let result = self.transliterate(word);
        if !result.gaps.is_empty() {
            let missing: String = result.gaps.iter().map(|g| g.ch).collect();
            debug!(word, missing = %missing, "uncovered characters");
        }
        result
    }

    /// Rule-based transliteration only, ignoring overrides.
    pub fn transliterate(&self, word: &str) -> Transliteration {
        let chars = anchored(word);
        let mut phonemes = Vec::new();
        let mut gaps = Vec::new();
        let mut head = 0;

        while head < chars.len() {
            let longest = self.rules.max_len.min(chars.len() - head);
            let hit = (1..=longest).rev().find_map(|len| {
                let key: String = chars[head..head + len].iter().collect();
                self.rules.get(&key).map(|ph| (len, ph))
            });
            match hit {
                Some((len, ph)) => {
                    phonemes.extend(ph.iter().cloned());
                    head += len;
                }
                None => {
                    if chars[head] != ANCHOR {
                        gaps.push(Gap { position: head - 1, ch: chars[head] });
                    }
                    head += 1;
                }
            }
        }

        Transliteration { phonemes, gaps, from_override: false }
    }
}

/// `Sav-Heol` → `.sav.heol.`
fn anchored(word: &str) -> Vec<char> {
    let inner = word.trim_matches('-').to_lowercase();
    std::iter::once(ANCHOR)
        .chain(inner.chars().map(|c| if c == '-' { ANCHOR } else { c }))
        .chain(std::iter::once(ANCHOR))
        .collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn breton(word: &str) -> String {
        Phonemizer::new(RuleTable::breton()).word_to_phonemes(word).to_string()
    }

    #[test]
    fn test_embedded_table_parses() {
        let table = RuleTable::breton();
        assert!(!table.is_empty());
        let inv = table.inventory();
        for ph in ["A", "X", "CH", "OU", "AN", "GN", "LH"] {
            assert!(inv.contains(ph), "{ph} missing from inventory");
        }
    }

    #[test]
    fn test_longest_match_wins() {
        // `c'hw` (4) beats `c'h` (3) and `c` (1) at the same offset
        assert_eq!(breton("c'hwec'h"), "X W E X");

        let mut t = RuleTable::default();
        t.insert("a", ["A"]);
        t.insert("b", ["B"]);
        t.insert("abcd", ["Z"]);
        let p = Phonemizer::new(&t);
        let r = p.transliterate("abcda");
        assert_eq!(r.phonemes, vec!["Z", "A"]);
        assert!(r.gaps.is_empty());
    }

    #[test]
    fn test_word_boundary_rules() {
        assert_eq!(breton("mad"), "M A T");
        assert_eq!(breton("brezhoneg"), "B R E Z O N E K");
        assert_eq!(breton("daou"), "D O W");
        assert_eq!(breton("kaer"), "K E R");
    }

    #[test]
    fn test_hyphen_becomes_anchor() {
        assert_eq!(breton("sav-heol"), "S A F H E O L");
        assert_eq!(breton("Sav-Heol"), breton("sav-heol"));
    }

    #[test]
    fn test_apostrophe_rules() {
        assert_eq!(breton("d'ar"), "D A R");
    }

    #[test]
    fn test_gaps_reported() {
        let r = Phonemizer::new(RuleTable::breton()).word_to_phonemes("1añ");
        assert_eq!(r.phonemes, vec!["AN"]);
        assert_eq!(r.gaps, vec![Gap { position: 0, ch: '1' }]);
        assert!(!r.is_complete());

        let r = Phonemizer::new(RuleTable::breton()).word_to_phonemes("2011");
        assert!(r.is_empty());
        assert_eq!(r.gaps.len(), 4);
    }

    #[test]
    fn test_override_round_trip() {
        let overrides = PronunciationTable::parse("wifi W I F I\nKemper\tK E M P E R\n");
        let empty = RuleTable::default();
        let p = Phonemizer::new(&empty).with_overrides(&overrides);
        for (word, variants) in overrides.iter() {
            let r = p.word_to_phonemes(word);
            assert!(r.from_override);
            assert_eq!(r.to_string(), variants[0]);
        }
        assert_eq!(p.word_to_phonemes("WiFi").to_string(), "W I F I");
    }

    #[test]
    fn test_deterministic() {
        let p = Phonemizer::new(RuleTable::breton());
        for w in ["c'hoari", "estajoù", "Gouhere", "skrivagnerien"] {
            assert_eq!(p.word_to_phonemes(w), p.word_to_phonemes(w));
        }
    }

    #[test]
    fn test_malformed_rules() {
        let origin = Path::new("rules.tsv");
        assert!(RuleTable::parse("a\tA\nb\n", origin).is_err());
        assert!(RuleTable::parse("abcde\tA\n", origin).is_err());
        let t = RuleTable::parse("# c\na\tA\nc'h\tX\n", origin).unwrap();
        assert_eq!(t.get("c'h"), Some(&["X".to_string()][..]));
    }
}
