//! Pronunciation lexicon assembly.
//!
//! Words are collected from cleaned sentences, then [`LexiconBuilder::build`]
//! transliterates each distinct word once and merges the curated
//! pronunciations:
//!
//! | Source             | Line                    |
//! |--------------------|-------------------------|
//! | vocabulary         | `word` + G2P            |
//! | lexicon overrides  | every listed variant    |
//! | acronyms           | every registered variant|
//! | capitalized words  | variants, else G2P      |
//! | verbal tics        | every listed variant    |
//!
//! The dictionary directory written by [`Lexicon::write_dict_dir`] follows the
//! usual Kaldi `dict` layout.

use std::{
    collections::BTreeSet,
    fs,
    io::{self, Write},
    path::Path,
};

use tracing::{info, warn};

use crate::{
    acronym::is_acronym,
    config::Resources,
    dictionary::capitalize,
    phonemize::Transliteration,
    tokenize::BLACKLIST_MARKER,
};

/// Fixed entries at the top of every lexicon.
pub const LEXICON_HEADER: [&str; 3] = ["!SIL SIL", "<SPOKEN_NOISE> SPN", "<UNK> SPN"];

pub const SILENCE_PHONES: [&str; 3] = ["SIL", "oov", "SPN"];

pub const OPTIONAL_SILENCE: &str = "SIL";

// ─────────────────────────────────────────────────────────────────────────────
// Lexicon
// ─────────────────────────────────────────────────────────────────────────────

/// A word whose transliteration was partial or empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub word: String,
    pub result: Transliteration,
}

#[derive(Debug, Clone, Default)]
pub struct Lexicon {
    /// `word PH1 PH2 …` lines, sorted and unique, header excluded.
    pub entries: BTreeSet<String>,
    /// Words that were left out (nothing produced) or transliterated with gaps.
    pub diagnostics: Vec<Diagnostic>,
}

impl Lexicon {
    /// Every non-silence phone used by the entries.
    pub fn nonsilence_phones(&self) -> BTreeSet<String> {
        self.entries
            .iter()
            .flat_map(|e| e.split_whitespace().skip(1))
            .filter(|p| !SILENCE_PHONES.contains(p))
            .map(str::to_string)
            .collect()
    }

    /// Header then entries, one per line.
    pub fn write_to<W: Write>(&self, mut out: W) -> io::Result<()> {
        for line in LEXICON_HEADER.iter().copied().chain(self.entries.iter().map(String::as_str)) {
            writeln!(out, "{line}")?;
        }
        out.flush()
    }

    /// Write `lexicon.txt`, `nonsilence_phones.txt`, `silence_phones.txt` and
    /// `optional_silence.txt` into `dir` (created if needed).
    pub fn write_dict_dir(&self, dir: &Path) -> io::Result<()> {
        fs::create_dir_all(dir)?;
        self.write_to(io::BufWriter::new(fs::File::create(dir.join("lexicon.txt"))?))?;

        let lines = |items: Vec<String>| items.into_iter().map(|i| i + "\n").collect::<String>();
        fs::write(
            dir.join("nonsilence_phones.txt"),
            lines(self.nonsilence_phones().into_iter().collect()),
        )?;
        fs::write(
            dir.join("silence_phones.txt"),
            lines(SILENCE_PHONES.iter().map(|s| s.to_string()).collect()),
        )?;
        fs::write(dir.join("optional_silence.txt"), format!("{OPTIONAL_SILENCE}\n"))?;
        info!(entries = self.entries.len(), "lexicon written to {}", dir.display());
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// LexiconBuilder
// ─────────────────────────────────────────────────────────────────────────────

pub struct LexiconBuilder<'a> {
    res: &'a Resources,
    vocabulary: BTreeSet<String>,
}

impl<'a> LexiconBuilder<'a> {
    pub fn new(res: &'a Resources) -> Self {
        Self { res, vocabulary: BTreeSet::new() }
    }

    /// Collect the words of an already cleaned sentence.  Blacklisted words,
    /// verbal tics, acronyms and capitalized words are left to their tables.
    pub fn add_sentence(&mut self, cleaned: &str) {
        let tables = &self.res.tables;
        for word in cleaned.split_whitespace() {
            if word.starts_with(BLACKLIST_MARKER)
                || tables.verbal_tics.contains(word)
                || is_acronym(word)
                || tables.capitalized.contains(word)
            {
                continue;
            }
            self.vocabulary.insert(word.to_string());
        }
    }

    pub fn vocabulary(&self) -> impl Iterator<Item = &str> {
        self.vocabulary.iter().map(String::as_str)
    }

    pub fn build(&self) -> Lexicon {
        let phonemizer = self.res.phonemizer();
        let tables = &self.res.tables;
        let mut lexicon = Lexicon::default();

        for word in &self.vocabulary {
            let result = phonemizer.word_to_phonemes(word);
            if result.is_empty() {
                warn!(word = %word, "no phoneme produced, left out of the lexicon");
            } else {
                lexicon.entries.insert(format!("{word} {result}"));
            }
            if !result.is_complete() {
                lexicon.diagnostics.push(Diagnostic { word: word.clone(), result });
            }
        }

        for (word, variants) in tables.lexicon_overrides.iter() {
            for v in variants {
                lexicon.entries.insert(format!("{word} {v}"));
            }
        }
        for (acronym, variants) in self.res.acronyms.entries() {
            for v in variants {
                lexicon.entries.insert(format!("{acronym} {v}"));
            }
        }
        for (word, variants) in tables.capitalized.iter() {
            let name = capitalize(word);
            if variants.is_empty() {
                let result = phonemizer.word_to_phonemes(word);
                if result.is_empty() {
                    warn!(word = %name, "no phoneme produced, left out of the lexicon");
                } else {
                    lexicon.entries.insert(format!("{name} {result}"));
                }
            } else {
                for v in variants {
                    lexicon.entries.insert(format!("{name} {v}"));
                }
            }
        }
        for (word, variants) in tables.verbal_tics.iter() {
            for v in variants {
                lexicon.entries.insert(format!("{word} {v}"));
            }
        }

        if !lexicon.diagnostics.is_empty() {
            warn!(count = lexicon.diagnostics.len(), "words with incomplete transliteration");
        }
        lexicon
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dictionary::{OverrideTables, PronunciationTable};

    fn resources() -> Resources {
        let tables = OverrideTables {
            capitalized: PronunciationTable::parse("Gouhere\nBreizh B R E J S\n"),
            verbal_tics: PronunciationTable::parse("euh OE\n"),
            lexicon_overrides: PronunciationTable::parse("wifi W I F I\n"),
            ..OverrideTables::default()
        };
        let res = Resources::with_tables(tables);
        res.acronyms.extend_from_text("USA U E S A\n");
        res
    }

    #[test]
    fn test_vocabulary_filters() {
        let res = resources();
        let mut b = LexiconBuilder::new(&res);
        b.add_sentence("ar *ger euh e Gouhere hag ar USA mad");
        b.add_sentence("mad ar mad");
        assert_eq!(b.vocabulary().collect::<Vec<_>>(), vec!["ar", "e", "hag", "mad"]);
    }

    #[test]
    fn test_build() {
        let res = resources();
        let mut b = LexiconBuilder::new(&res);
        b.add_sentence("ar brezhoneg mad wifi 2011");
        let lex = b.build();

        for line in [
            "ar A R",
            "brezhoneg B R E Z O N E K",
            "mad M A T",
            "wifi W I F I",
            "USA U E S A",
            "B B E",
            "Breizh B R E J S",
            "Gouhere G OU H E R E",
            "euh OE",
        ] {
            assert!(lex.entries.contains(line), "missing {line:?}");
        }
        assert!(!lex.entries.iter().any(|e| e.starts_with("2011")));
        assert_eq!(lex.diagnostics.len(), 1);
        assert_eq!(lex.diagnostics[0].word, "2011");
    }

    #[test]
    fn test_phone_lists() {
        let res = resources();
        let mut b = LexiconBuilder::new(&res);
        b.add_sentence("mad");
        let lex = b.build();
        let phones = lex.nonsilence_phones();
        assert!(phones.contains("OE"));
        assert!(phones.contains("T"));
        assert!(!phones.contains("SIL"));
    }

    #[test]
    fn test_write_dict_dir() {
        let res = resources();
        let mut b = LexiconBuilder::new(&res);
        b.add_sentence("mad");
        let dir = tempfile::tempdir().unwrap();
        let dict = dir.path().join("dict_nosp");
        b.build().write_dict_dir(&dict).unwrap();

        let lexicon = std::fs::read_to_string(dict.join("lexicon.txt")).unwrap();
        assert!(lexicon.starts_with("!SIL SIL\n<SPOKEN_NOISE> SPN\n<UNK> SPN\n"));
        assert!(lexicon.contains("\nmad M A T\n"));
        assert_eq!(std::fs::read_to_string(dict.join("silence_phones.txt")).unwrap(), "SIL\noov\nSPN\n");
        assert_eq!(std::fs::read_to_string(dict.join("optional_silence.txt")).unwrap(), "SIL\n");
        let nonsil = std::fs::read_to_string(dict.join("nonsilence_phones.txt")).unwrap();
        assert!(nonsil.lines().any(|l| l == "M"));
    }
}
