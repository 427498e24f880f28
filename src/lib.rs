//! # anaouder
//!
//! Breton text normalisation and grapheme-to-phoneme tooling for building
//! speech-recognition training data: a language-model corpus of cleaned
//! sentences and a pronunciation lexicon.
//!
//! ## Quick start
//!
//! ```no_run
//! use std::path::Path;
//! use anaouder::{PipelineConfig, Resources, TextCleaner, split_line};
//!
//! let config = PipelineConfig::from_file(Path::new("config.json")).unwrap();
//! let res = Resources::load(&config).unwrap();
//!
//! let cleaner = TextCleaner::with_options(&res, config.clean.unwrap_or_default());
//! for sentence in split_line("Demat deoc'h. Penaos emañ kont ?") {
//!     let cleaned = cleaner.clean(&sentence);
//!     println!("{} ({:.2})", cleaned.text, cleaned.blacklist_ratio);
//! }
//!
//! let g2p = res.phonemizer();
//! println!("{}", g2p.word_to_phonemes("brezhoneg")); // B R E Z O N E K
//! ```
//!
//! Everything except G2P over the built-in rules needs no file at all:
//!
//! ```
//! use anaouder::{Phonemizer, RuleTable, tokenize::tokenize_words};
//!
//! let g2p = Phonemizer::new(RuleTable::breton());
//! let words = tokenize_words("C'hwec'h den, sav-heol !");
//! assert_eq!(words, ["C'hwec'h", "den", "sav", "heol"]);
//! assert_eq!(g2p.word_to_phonemes(&words[0]).to_string(), "X W E X");
//! ```
//!
//! ## Pipeline
//! 1. **Segmentation** — lines split into sentences ([`segment`]).
//! 2. **Tokenisation** — punctuation stripped, apostrophes folded ([`tokenize`]).
//! 3. **Cleaning** — per-token classification against the curated tables,
//!    scored by blacklist ratio ([`preprocess`], [`dictionary`], [`speller`]).
//! 4. **G2P** — longest-match rewrite rules ([`phonemize`]).
//! 5. **Acronyms** — letter-by-letter proposal, validation, persistence
//!    ([`acronym`]).
//! 6. **Outputs** — corpus and lexicon files ([`corpus`], [`lexicon`]).

pub mod acronym;
pub mod config;
pub mod corpus;
pub mod dictionary;
pub mod error;
pub mod lexicon;
pub mod phonemize;
pub mod preprocess;
pub mod segment;
pub mod speller;
pub mod tokenize;

// ─── Re-exports for convenience ─────────────────────────────────────────────

pub use acronym::{is_acronym, AcronymRegistry, AcronymResolver, Resolution};
pub use config::{PipelineConfig, Resources};
pub use corpus::{CorpusBuilder, CorpusOptions};
pub use error::LoadError;
pub use lexicon::{Lexicon, LexiconBuilder};
pub use phonemize::{Phonemizer, RuleTable, Transliteration};
pub use preprocess::{CleanOptions, Cleaned, Correction, Markup, TextCleaner};
pub use segment::{split_line, split_line_with, SplitPolicy};
pub use speller::{HunspellSpeller, SpellChecker, WordListSpeller};
pub use tokenize::{tokenize, Token};
