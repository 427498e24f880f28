//! Language-model corpus assembly.
//!
//! Each input line is split into sentences, every sentence is cleaned with
//! [`CleanOptions::corpus`] and kept only when it is long enough and mostly
//! trusted.  The result is a sorted set, so repeated sentences count once.

use std::{collections::BTreeSet, io::Write};

use serde::Deserialize;
use tracing::{debug, trace};

use crate::{
    acronym::is_acronym,
    config::Resources,
    preprocess::{strip_speaker_tags, CleanOptions, TextCleaner},
    segment::{split_line_with, SplitPolicy},
};

/// Acceptance thresholds for corpus sentences.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct CorpusOptions {
    /// Sentences above this blacklist ratio are rejected.
    pub max_blacklist_ratio: f64,
    /// Sentences with fewer words are rejected.
    pub min_words: usize,
}

impl Default for CorpusOptions {
    fn default() -> Self {
        Self { max_blacklist_ratio: 0.2, min_words: 3 }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Text files
// ─────────────────────────────────────────────────────────────────────────────

/// One usable line of an annotated text file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextLine {
    pub text: String,
    /// `false` when the line carries a `{parser:no-lm}` tag.
    pub for_lm: bool,
}

/// Lines of a transcription file: blank lines and `#` comments skipped,
/// `{…}` metadata tags removed.
pub fn text_lines(text: &str) -> Vec<TextLine> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .filter_map(|l| {
            let for_lm = !l.contains("{parser:no-lm}");
            let text = strip_speaker_tags(l);
            (!text.is_empty()).then_some(TextLine { text, for_lm })
        })
        .collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// CorpusBuilder
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CorpusStats {
    pub lines: usize,
    pub sentences: usize,
    pub accepted: usize,
    pub duplicates: usize,
    pub rejected_blacklist: usize,
    pub rejected_short: usize,
}

pub struct CorpusBuilder<'a> {
    cleaner: TextCleaner<'a>,
    split: SplitPolicy,
    options: CorpusOptions,
    sentences: BTreeSet<String>,
    unknown_acronyms: BTreeSet<String>,
    stats: CorpusStats,
}

impl<'a> CorpusBuilder<'a> {
    pub fn new(res: &'a Resources, split: SplitPolicy, options: CorpusOptions) -> Self {
        Self {
            cleaner: TextCleaner::with_options(res, CleanOptions::corpus()),
            split,
            options,
            sentences: BTreeSet::new(),
            unknown_acronyms: BTreeSet::new(),
            stats: CorpusStats::default(),
        }
    }

    /// Clean options other than the corpus defaults.
    pub fn with_clean_options(mut self, options: CleanOptions) -> Self {
        self.cleaner.options = options;
        self
    }

    /// Add every acceptable sentence of `line`.  Returns how many were new.
    pub fn add_line(&mut self, line: &str) -> usize {
        self.stats.lines += 1;
        let mut added = 0;

        for span in split_line_with(line, self.split) {
            self.stats.sentences += 1;
            let cleaned = self.cleaner.clean(&span);

            if cleaned.blacklist_ratio > self.options.max_blacklist_ratio {
                debug!(ratio = cleaned.blacklist_ratio, "rejected: {span}");
                self.stats.rejected_blacklist += 1;
                continue;
            }
            if cleaned.text.split_whitespace().count() < self.options.min_words {
                trace!("too short: {span}");
                self.stats.rejected_short += 1;
                continue;
            }

            for word in cleaned.text.split_whitespace() {
                if is_acronym(word) && !self.cleaner_knows(word) {
                    self.unknown_acronyms.insert(word.to_string());
                }
            }
            if self.sentences.insert(cleaned.text) {
                self.stats.accepted += 1;
                added += 1;
            } else {
                self.stats.duplicates += 1;
            }
        }
        added
    }

    fn cleaner_knows(&self, acronym: &str) -> bool {
        self.cleaner.resources().acronyms.contains(acronym)
    }

    pub fn sentences(&self) -> impl Iterator<Item = &str> {
        self.sentences.iter().map(String::as_str)
    }

    /// Acronyms seen in accepted sentences that the registry does not know.
    pub fn unknown_acronyms(&self) -> impl Iterator<Item = &str> {
        self.unknown_acronyms.iter().map(String::as_str)
    }

    pub fn stats(&self) -> CorpusStats {
        self.stats
    }

    pub fn len(&self) -> usize {
        self.sentences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sentences.is_empty()
    }

    /// One sentence per line, sorted.
    pub fn write_to<W: Write>(&self, mut out: W) -> std::io::Result<()> {
        for s in &self.sentences {
            writeln!(out, "{s}")?;
        }
        out.flush()
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
            verbal_tics: PronunciationTable::parse("euh E\n"),
            capitalized: PronunciationTable::parse("Gouhere\n"),
            ..OverrideTables::default()
        };
        Resources::with_tables(tables)
    }

    #[test]
    fn test_text_lines() {
        let lines = text_lines(
            "# header\n\nOber a reomp ur podskignañ {tornoz:m}\n{parser:no-lm}\n  {parser:no-lm} oh la la\n",
        );
        assert_eq!(
            lines,
            vec![
                TextLine { text: "Ober a reomp ur podskignañ".into(), for_lm: true },
                TextLine { text: "oh la la".into(), for_lm: false },
            ]
        );
    }

    #[test]
    fn test_add_line() {
        let res = resources();
        let mut corpus = CorpusBuilder::new(&res, SplitPolicy::default(), CorpusOptions::default());

        let added = corpus.add_line(
            "Un tan-gwall a voe d'ar 1añ a viz Gouhere 2011 el leti. Ne voe den ebet gloazet pe lazhet. Un nebeud estajoù nemetken a oa bet tizhet.",
        );
        assert_eq!(added, 3);
        assert!(corpus
            .sentences()
            .any(|s| s == "un tan gwall a voe d'ar 1añ a viz Gouhere daou vil unnek el leti"));

        // duplicate
        assert_eq!(corpus.add_line("Ne voe den ebet gloazet pe lazhet."), 0);
        // too short once the tic is dropped
        assert_eq!(corpus.add_line("Euh, ya mat."), 0);
        // too many blacklisted words
        assert_eq!(corpus.add_line("Ur *ger *all ha *c'hoazh unan"), 0);

        let stats = corpus.stats();
        assert_eq!(stats.lines, 4);
        assert_eq!(stats.accepted, 3);
        assert_eq!(stats.duplicates, 1);
        assert_eq!(stats.rejected_short, 1);
        assert_eq!(stats.rejected_blacklist, 1);
        assert_eq!(corpus.len(), 3);
    }

    #[test]
    fn test_custom_clean_options() {
        let res = resources();
        let mut corpus = CorpusBuilder::new(&res, SplitPolicy::default(), CorpusOptions::default())
            .with_clean_options(CleanOptions::default());
        assert_eq!(corpus.add_line("Euh, ya mat."), 1);
        assert_eq!(corpus.sentences().collect::<Vec<_>>(), vec!["euh ya mat"]);
    }

    #[test]
    fn test_unknown_acronyms_collected() {
        let res = resources();
        let options = CorpusOptions { max_blacklist_ratio: 0.5, ..CorpusOptions::default() };
        let mut corpus = CorpusBuilder::new(&res, SplitPolicy::default(), options);
        corpus.add_line("Labourat a ra evit ar SNCF e Naoned.");
        assert_eq!(corpus.unknown_acronyms().collect::<Vec<_>>(), vec!["SNCF"]);
    }

    #[test]
    fn test_write_sorted() {
        let res = resources();
        let mut corpus = CorpusBuilder::new(&res, SplitPolicy::default(), CorpusOptions::default());
        corpus.add_line("Ur frazenn all amañ.");
        corpus.add_line("An hini kentañ eo.");
        let mut out = Vec::new();
        corpus.write_to(&mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "an hini kentañ eo\nur frazenn all amañ\n");
    }
}
