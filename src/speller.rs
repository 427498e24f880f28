//! Spell-check oracle.
//!
//! The classifier treats spelling as a black box behind [`SpellChecker`] and
//! only asks once every override table and the acronym check have failed to
//! classify a token.
//!
//! | Checker             | Backing                                         |
//! |---------------------|-------------------------------------------------|
//! | [`HunspellSpeller`] | `.aff` + `.dic` pair, plus extra word lists     |
//! | [`WordListSpeller`] | plain word lists (`add.txt`), one word per line |
//! | [`AcceptAll`]       | nothing                                         |

use std::{collections::HashSet, path::Path};

use spellbook::Dictionary;
use tracing::debug;

use crate::dictionary::{content_lines, read_table};
use crate::error::{LoadError, Result};

pub trait SpellChecker: Send + Sync {
    /// `true` when `word` is correctly spelled.
    fn spell(&self, word: &str) -> bool;
}

/// Accepts every word; used when no dictionary is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl SpellChecker for AcceptAll {
    fn spell(&self, _word: &str) -> bool {
        true
    }
}

impl<F> SpellChecker for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn spell(&self, word: &str) -> bool {
        self(word)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Word lists
// ─────────────────────────────────────────────────────────────────────────────

/// Word-list speller.  Lookups are exact, then lowercased.
#[derive(Debug, Clone, Default)]
pub struct WordListSpeller {
    words: HashSet<String>,
}

impl WordListSpeller {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the first field of every content line of `text`.
    pub fn add_text(&mut self, text: &str) {
        for (_, line) in content_lines(text) {
            if let Some(word) = line.split_whitespace().next() {
                self.words.insert(word.to_string());
            }
        }
    }

    pub fn add_word(&mut self, word: impl Into<String>) {
        self.words.insert(word.into());
    }

    /// Build from a list of files; every file is required.
    pub fn from_files<P: AsRef<Path>>(paths: &[P]) -> Result<Self> {
        let mut speller = Self::new();
        for path in paths {
            let path = path.as_ref();
            speller.add_text(&read_table(path)?);
            debug!(words = speller.len(), "loaded word list {}", path.display());
        }
        Ok(speller)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

impl SpellChecker for WordListSpeller {
    fn spell(&self, word: &str) -> bool {
        self.words.contains(word) || self.words.contains(&word.to_lowercase())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Hunspell
// ─────────────────────────────────────────────────────────────────────────────

/// Hunspell dictionary (stems expanded through the affix rules) with extra
/// words on the side.
pub struct HunspellSpeller {
    dictionary: Dictionary,
    extra: WordListSpeller,
}

impl HunspellSpeller {
    /// Parse an affix file and a dictionary file held in memory.
    pub fn parse(aff: &str, dic: &str, origin: &Path) -> Result<Self> {
        let dictionary = Dictionary::new(aff, dic).map_err(|e| LoadError::Dictionary {
            path: origin.to_path_buf(),
            reason: e.to_string(),
        })?;
        Ok(Self { dictionary, extra: WordListSpeller::new() })
    }

    pub fn load(aff: &Path, dic: &Path) -> Result<Self> {
        let speller = Self::parse(&read_table(aff)?, &read_table(dic)?, dic)?;
        debug!("loaded hunspell dictionary {}", dic.display());
        Ok(speller)
    }

    /// Words accepted on top of the dictionary.
    pub fn with_words(mut self, extra: WordListSpeller) -> Self {
        self.extra = extra;
        self
    }
}

impl std::fmt::Debug for HunspellSpeller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HunspellSpeller").field("extra", &self.extra.len()).finish_non_exhaustive()
    }
}

impl SpellChecker for HunspellSpeller {
    fn spell(&self, word: &str) -> bool {
        self.dictionary.check(word) || self.extra.spell(word)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const AFF: &str = "SET UTF-8\n\nSFX L Y 1\nSFX L 0 ioù .\n";
    const DIC: &str = "2\nlevr/L\nkador\n";

    #[test]
    fn test_word_list() {
        let mut s = WordListSpeller::new();
        s.add_text("# extra words\nbrezhoneg\nlabour\nKador\n");
        assert_eq!(s.len(), 3);
        assert!(s.spell("brezhoneg"));
        assert!(s.spell("Kador"));
        assert!(!s.spell("brezhonek"));
    }

    #[test]
    fn test_closure_and_accept_all() {
        let only_ya = |w: &str| w == "ya";
        assert!(only_ya.spell("ya"));
        assert!(!only_ya.spell("nann"));
        assert!(AcceptAll.spell("netra"));
    }

    #[test]
    fn test_from_files() {
        let dir = tempfile::tempdir().unwrap();
        let add = dir.path().join("add.txt");
        std::fs::write(&add, "# extra\npodskignañ\nmor\n").unwrap();
        let s = WordListSpeller::from_files(&[add]).unwrap();
        assert!(s.spell("mor") && s.spell("podskignañ"));
        assert!(WordListSpeller::from_files(&[dir.path().join("absent.txt")]).is_err());
    }

    #[test]
    fn test_hunspell_applies_affixes() {
        let s = HunspellSpeller::parse(AFF, DIC, Path::new("br_FR.dic")).unwrap();
        assert!(s.spell("levr"));
        assert!(s.spell("levrioù"));
        assert!(s.spell("kador"));
        assert!(!s.spell("kadorioù"));
        assert!(!s.spell("brezhonek"));
    }

    #[test]
    fn test_hunspell_extra_words() {
        let mut extra = WordListSpeller::new();
        extra.add_word("podskignañ");
        let s = HunspellSpeller::parse(AFF, DIC, Path::new("br_FR.dic")).unwrap().with_words(extra);
        assert!(s.spell("podskignañ"));
        assert!(s.spell("levrioù"));
    }

    #[test]
    fn test_hunspell_load() {
        let dir = tempfile::tempdir().unwrap();
        let aff = dir.path().join("br_FR.aff");
        let dic = dir.path().join("br_FR.dic");
        std::fs::write(&aff, AFF).unwrap();
        std::fs::write(&dic, DIC).unwrap();
        assert!(HunspellSpeller::load(&aff, &dic).unwrap().spell("levrioù"));
        assert!(matches!(
            HunspellSpeller::load(&dir.path().join("absent.aff"), &dic),
            Err(LoadError::Missing(_))
        ));
    }
}
