//! Pipeline configuration and the resources it loads.
//!
//! A run is described by one JSON file:
//!
//! ```json
//! {
//!   "tables": {
//!     "corrections": "dicts/corrected.tsv",
//!     "capitalized": "dicts/capitalized.txt",
//!     "verbal_tics": "dicts/verbal_tics.txt",
//!     "lexicon_overrides": "dicts/lexicon_add.txt"
//!   },
//!   "acronyms": "dicts/acronyms.txt",
//!   "rules": null,
//!   "hunspell": { "aff": "hunspell/br_FR.aff", "dic": "hunspell/br_FR.dic" },
//!   "spell_words": ["dicts/add.txt"],
//!   "split": { "require_capital_after": true },
//!   "clean": { "expand_numbers": true },
//!   "corpus": { "max_blacklist_ratio": 0.2, "min_words": 3 }
//! }
//! ```
//!
//! Relative paths are taken from the directory holding the config file.
//! Without `rules` the built-in Breton rule table is used.  Without `hunspell`
//! the spell check falls back to the `spell_words` lists, and with neither
//! every word passes.

use std::{
    collections::BTreeSet,
    fmt,
    path::{Path, PathBuf},
};

use serde::Deserialize;
use tracing::{info, warn};

use crate::{
    acronym::{letter_inventory, AcronymRegistry},
    corpus::CorpusOptions,
    dictionary::{read_table, OverrideTables, TablePaths},
    error::{LoadError, Result},
    phonemize::{Phonemizer, RuleTable},
    preprocess::CleanOptions,
    segment::SplitPolicy,
    speller::{AcceptAll, HunspellSpeller, SpellChecker, WordListSpeller},
};

// ─────────────────────────────────────────────────────────────────────────────
// Config schema
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    pub tables: TablePaths,

    /// Acronym store; read at startup, appended to on resolution.
    pub acronyms: PathBuf,

    /// Rewrite rule table replacing the built-in one.
    #[serde(default)]
    pub rules: Option<PathBuf>,

    /// Hunspell dictionary for the spell check.
    #[serde(default)]
    pub hunspell: Option<HunspellPaths>,

    /// Plain word lists accepted on top of the Hunspell dictionary.
    #[serde(default)]
    pub spell_words: Vec<PathBuf>,

    #[serde(default)]
    pub split: SplitPolicy,

    /// Cleaner options for `clean` and `corpus` runs.  When absent, plain
    /// cleaning keeps everything and the corpus uses [`CleanOptions::corpus`].
    #[serde(default)]
    pub clean: Option<CleanOptions>,

    #[serde(default)]
    pub corpus: CorpusOptions,
}

/// Affix and dictionary files of a Hunspell dictionary.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HunspellPaths {
    pub aff: PathBuf,
    pub dic: PathBuf,
}

impl PipelineConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = read_table(path)?;
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        Self::from_json(&text, base)
            .map_err(|source| LoadError::Config { path: path.to_path_buf(), source })
    }

    /// Parse `text`, resolving relative paths against `base`.
    pub fn from_json(text: &str, base: &Path) -> serde_json::Result<Self> {
        let mut config: Self = serde_json::from_str(text)?;
        config.resolve_paths(base);
        Ok(config)
    }

    fn resolve_paths(&mut self, base: &Path) {
        let resolve = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        resolve(&mut self.tables.corrections);
        resolve(&mut self.tables.capitalized);
        resolve(&mut self.tables.verbal_tics);
        resolve(&mut self.tables.lexicon_overrides);
        resolve(&mut self.acronyms);
        if let Some(rules) = self.rules.as_mut() {
            resolve(rules);
        }
        if let Some(hunspell) = self.hunspell.as_mut() {
            resolve(&mut hunspell.aff);
            resolve(&mut hunspell.dic);
        }
        self.spell_words.iter_mut().for_each(resolve);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Resources
// ─────────────────────────────────────────────────────────────────────────────

/// Everything a run reads, loaded once.  Only the acronym registry changes
/// afterwards.
pub struct Resources {
    pub tables: OverrideTables,
    pub acronyms: AcronymRegistry,
    pub rules: RuleTable,
    pub speller: Box<dyn SpellChecker>,
}

impl fmt::Debug for Resources {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resources")
            .field("tables", &self.tables)
            .field("acronyms", &self.acronyms.len())
            .field("rules", &self.rules.len())
            .finish_non_exhaustive()
    }
}

impl Resources {
    /// Load every table named by `config`.  Any missing table is fatal.
    pub fn load(config: &PipelineConfig) -> Result<Self> {
        let tables = OverrideTables::load(&config.tables)?;
        let acronyms = AcronymRegistry::load(&config.acronyms)?;
        let rules = match &config.rules {
            Some(path) => RuleTable::load(path)?,
            None => RuleTable::breton().clone(),
        };
        let words = WordListSpeller::from_files(&config.spell_words)?;
        let speller: Box<dyn SpellChecker> = match &config.hunspell {
            Some(paths) => Box::new(HunspellSpeller::load(&paths.aff, &paths.dic)?.with_words(words)),
            None if !words.is_empty() => Box::new(words),
            None => {
                warn!("no spell dictionary configured, every word will be accepted");
                Box::new(AcceptAll)
            }
        };

        info!(
            corrections = tables.corrections.len(),
            capitalized = tables.capitalized.len(),
            verbal_tics = tables.verbal_tics.len(),
            lexicon_overrides = tables.lexicon_overrides.len(),
            acronyms = acronyms.len(),
            rules = rules.len(),
            "resources loaded"
        );
        Ok(Self { tables, acronyms, rules, speller })
    }

    /// Resources built from in-memory tables, with the built-in rules, the
    /// seeded acronym registry and no spell check.
    pub fn with_tables(tables: OverrideTables) -> Self {
        Self {
            tables,
            acronyms: AcronymRegistry::seeded(),
            rules: RuleTable::breton().clone(),
            speller: Box::new(AcceptAll),
        }
    }

    /// G2P with the lexicon overrides applied.
    pub fn phonemizer(&self) -> Phonemizer<'_> {
        Phonemizer::new(&self.rules).with_overrides(&self.tables.lexicon_overrides)
    }

    /// Every phoneme symbol known to this run: rule outputs, letter names and
    /// the symbols used by the curated pronunciations.
    pub fn inventory(&self) -> BTreeSet<String> {
        let mut inv = self.rules.inventory();
        inv.extend(letter_inventory());
        let tables = [
            &self.tables.capitalized,
            &self.tables.verbal_tics,
            &self.tables.lexicon_overrides,
        ];
        for table in tables {
            for (_, variants) in table.iter() {
                inv.extend(variants.iter().flat_map(|v| v.split_whitespace()).map(str::to_string));
            }
        }
        for (_, variants) in self.acronyms.entries() {
            inv.extend(variants.iter().flat_map(|v| v.split_whitespace()).map(str::to_string));
        }
        inv
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"{
        "tables": {
            "corrections": "corrected.tsv",
            "capitalized": "capitalized.txt",
            "verbal_tics": "verbal_tics.txt",
            "lexicon_overrides": "/abs/lexicon_add.txt"
        },
        "acronyms": "acronyms.txt",
        "hunspell": { "aff": "br_FR.aff", "dic": "br_FR.dic" },
        "spell_words": ["add.txt"],
        "split": { "require_capital_after": false },
        "corpus": { "min_words": 5 }
    }"#;

    #[test]
    fn test_relative_paths_resolved() {
        let config = PipelineConfig::from_json(CONFIG, Path::new("/data/br")).unwrap();
        assert_eq!(config.tables.corrections, Path::new("/data/br/corrected.tsv"));
        assert_eq!(config.tables.lexicon_overrides, Path::new("/abs/lexicon_add.txt"));
        assert_eq!(config.acronyms, Path::new("/data/br/acronyms.txt"));
        assert_eq!(config.spell_words, vec![PathBuf::from("/data/br/add.txt")]);
        let hunspell = config.hunspell.unwrap();
        assert_eq!(hunspell.aff, Path::new("/data/br/br_FR.aff"));
        assert_eq!(hunspell.dic, Path::new("/data/br/br_FR.dic"));
        assert!(config.rules.is_none());
    }

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::from_json(CONFIG, Path::new(".")).unwrap();
        assert_eq!(config.split, SplitPolicy::relaxed());
        assert_eq!(config.corpus.min_words, 5);
        assert_eq!(config.corpus.max_blacklist_ratio, CorpusOptions::default().max_blacklist_ratio);
        assert_eq!(config.clean, None);
    }

    #[test]
    fn test_load_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        let write = |name: &str, text: &str| std::fs::write(dir.path().join(name), text).unwrap();
        write("corrected.tsv", "brezhonek\tbrezhoneg\n");
        write("capitalized.txt", "Gouhere\n");
        write("verbal_tics.txt", "euh OE\n");
        write("lexicon_add.txt", "wifi W I F I\n");
        write("acronyms.txt", "USA U E S A\n");
        write("add.txt", "brezhoneg\n");
        write("br_FR.aff", "SET UTF-8\n\nSFX L Y 1\nSFX L 0 ioù .\n");
        write("br_FR.dic", "1\nlevr/L\n");
        write(
            "config.json",
            &CONFIG.replace("/abs/lexicon_add.txt", "lexicon_add.txt"),
        );

        let config = PipelineConfig::from_file(&dir.path().join("config.json")).unwrap();
        let res = Resources::load(&config).unwrap();
        assert_eq!(res.tables.corrections.word("Brezhonek"), Some("brezhoneg"));
        assert!(res.acronyms.contains("USA"));
        assert!(res.speller.spell("brezhoneg"));
        assert!(!res.speller.spell("brezhonek"));
        assert!(res.speller.spell("levrioù"));
        assert_eq!(res.phonemizer().word_to_phonemes("wifi").to_string(), "W I F I");
        assert!(res.inventory().contains("OE"));
    }

    #[test]
    fn test_missing_table_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("config.json"), CONFIG).unwrap();
        let config = PipelineConfig::from_file(&dir.path().join("config.json")).unwrap();
        assert!(matches!(Resources::load(&config), Err(LoadError::Missing(_))));
    }

    #[test]
    fn test_bad_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ \"tables\": 3 }").unwrap();
        assert!(matches!(PipelineConfig::from_file(&path), Err(LoadError::Config { .. })));
    }
}
