//! Acronym detection, registry and resolution.
//!
//! The registry maps an uppercase acronym to one or more pronunciations
//! (homographs like `CD` can be spelled two ways).  It is seeded with the
//! spelled-out name of every letter and grows while a run resolves unknown
//! acronyms; each accepted entry is appended to the backing store as
//! `ACRONYM<TAB>PHONEMES`, never rewritten.
//!
//! Resolution itself is split in two: [`propose`] and [`validate`] are pure,
//! and the question is put to an [`AcronymResolver`] supplied by the caller
//! (the CLI asks on stdin).

use std::{
    collections::{BTreeMap, BTreeSet},
    fs::{File, OpenOptions},
    io::{self, Write},
    path::{Path, PathBuf},
    sync::{Mutex, RwLock},
};

use fs2::FileExt;
use tracing::{debug, info, warn};

use crate::dictionary::{content_lines, parse_pronunciation_line, read_table};
use crate::error::{LoadError, Result};
use crate::phonemize::Phonemizer;
use crate::preprocess::number_to_words;
use crate::tokenize::tokenize;

/// Consonants that count as an acronym on their own (`B`, `K`, …).
pub const SINGLE_LETTER_ACRONYMS: &str = "BCDFGHJKLMNPQRSTVWXZ";

/// Spelled-out name of each letter, `A` to `Z`.
pub const LETTER_NAMES: [(char, &str); 26] = [
    ('A', "A"),
    ('B', "B E"),
    ('C', "S E"),
    ('D', "D E"),
    ('E', "E"),
    ('F', "E F"),
    ('G', "G E"),
    ('H', "A CH"),
    ('I', "I"),
    ('J', "J I"),
    ('K', "K A"),
    ('L', "E L"),
    ('M', "E M"),
    ('N', "E N"),
    ('O', "O"),
    ('P', "P E"),
    ('Q', "K U"),
    ('R', "E R"),
    ('S', "E S"),
    ('T', "T E"),
    ('U', "U"),
    ('V', "V E"),
    ('W', "D U B L V E"),
    ('X', "I K S"),
    ('Y', "I G R E K"),
    ('Z', "Z E D"),
];

/// Invalid answers tolerated before an acronym is skipped.
const MAX_ATTEMPTS: usize = 3;

// ─────────────────────────────────────────────────────────────────────────────
// Predicate
// ─────────────────────────────────────────────────────────────────────────────

/// Acronym shape test.
///
/// A lone consonant from [`SINGLE_LETTER_ACRONYMS`] is an acronym.  Longer
/// tokens are when made only of uppercase letters, digits and hyphens with at
/// least one uppercase letter.
pub fn is_acronym(word: &str) -> bool {
    let mut chars = word.chars();
    match (chars.next(), chars.next()) {
        (None, _) => false,
        (Some(c), None) => SINGLE_LETTER_ACRONYMS.contains(c),
        _ => {
            word.chars().all(|c| c.is_uppercase() || c.is_ascii_digit() || c == '-')
                && word.chars().any(char::is_uppercase)
        }
    }
}

/// Acronym-shaped tokens of `text`, first occurrence order, no duplicates.
pub fn extract_acronyms(text: &str) -> Vec<String> {
    let mut seen = BTreeSet::new();
    tokenize(text)
        .iter()
        .map(|t| t.word().to_string())
        .filter(|w| is_acronym(w) && seen.insert(w.clone()))
        .collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Proposal / validation
// ─────────────────────────────────────────────────────────────────────────────

fn letter_name(c: char) -> Option<&'static str> {
    LETTER_NAMES.iter().find(|(l, _)| *l == c).map(|(_, name)| *name)
}

/// Spell `acronym` out letter by letter: `SNCF` → `E S E N S E E F`.
///
/// Digits are read as words through `phonemizer`; hyphens and unknown
/// characters are silent.
pub fn propose(acronym: &str, phonemizer: &Phonemizer<'_>) -> String {
    let mut parts: Vec<String> = Vec::new();
    for c in acronym.chars() {
        if let Some(d) = c.to_digit(10) {
            if let Some(word) = number_to_words(u64::from(d)) {
                parts.push(phonemizer.transliterate(&word).to_string());
            }
        } else if let Some(name) = c.to_uppercase().next().and_then(letter_name) {
            parts.push(name.to_string());
        }
    }
    parts.retain(|p| !p.is_empty());
    parts.join(" ")
}

/// `true` when `answer` is non-empty and every symbol is in `inventory`.
pub fn validate(answer: &str, inventory: &BTreeSet<String>) -> bool {
    let mut symbols = answer.split_whitespace().peekable();
    symbols.peek().is_some() && symbols.all(|s| inventory.contains(s))
}

/// Letter-name symbols, for building a complete inventory.
pub fn letter_inventory() -> BTreeSet<String> {
    LETTER_NAMES
        .iter()
        .flat_map(|(_, name)| name.split_whitespace())
        .map(str::to_string)
        .collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Resolver
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Pronunciation chosen by the resolver (checked by [`validate`]).
    Accept(String),
    Skip,
}

/// Source of pronunciations for unknown acronyms, typically a human.
pub trait AcronymResolver {
    /// Pronunciation of `acronym`, starting from `proposal`.
    fn resolve(&mut self, acronym: &str, proposal: &str) -> Resolution;

    /// Called when an answer contained unknown phoneme symbols.
    fn rejected(&mut self, _acronym: &str, _answer: &str) {}
}

/// Never answers.  Unknown acronyms stay unknown.
#[derive(Debug, Clone, Copy, Default)]
pub struct SkipAll;

impl AcronymResolver for SkipAll {
    fn resolve(&mut self, _acronym: &str, _proposal: &str) -> Resolution {
        Resolution::Skip
    }
}

/// Accepts the proposal unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptProposal;

impl AcronymResolver for AcceptProposal {
    fn resolve(&mut self, _acronym: &str, proposal: &str) -> Resolution {
        Resolution::Accept(proposal.to_string())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Registry
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct AcronymRegistry {
    entries: RwLock<BTreeMap<String, Vec<String>>>,
    store: Option<PathBuf>,
    handle: Mutex<Option<File>>,
}

impl AcronymRegistry {
    /// Registry holding the letter names only, without a backing store.
    pub fn seeded() -> Self {
        let entries = LETTER_NAMES
            .iter()
            .map(|(l, name)| (l.to_string(), vec![name.to_string()]))
            .collect();
        Self { entries: RwLock::new(entries), ..Self::default() }
    }

    /// Add the entries of `text` (`ACR PH1 PH2 …`, repeatable keys).
    /// Lines without phonemes are ignored.
    pub fn extend_from_text(&self, text: &str) {
        for (n, line) in content_lines(text) {
            let (key, variants) = parse_pronunciation_line(line);
            if variants.is_empty() {
                warn!(line = n, "acronym `{key}` has no pronunciation, ignored");
                continue;
            }
            for v in variants {
                self.insert(&key.to_uppercase(), v);
            }
        }
    }

    /// Seeded registry extended with `path`; new entries are appended to it.
    pub fn load(path: &Path) -> Result<Self> {
        let mut registry = Self::seeded();
        registry.extend_from_text(&read_table(path)?);
        registry.store = Some(path.to_path_buf());
        debug!(acronyms = registry.len(), "loaded acronyms from {}", path.display());
        Ok(registry)
    }

    pub fn contains(&self, acronym: &str) -> bool {
        self.read().contains_key(acronym)
    }

    /// Every known pronunciation of `acronym`, oldest first.
    pub fn variants(&self, acronym: &str) -> Vec<String> {
        self.read().get(acronym).cloned().unwrap_or_default()
    }

    /// `(acronym, variants)` pairs, sorted by acronym.
    pub fn entries(&self) -> Vec<(String, Vec<String>)> {
        self.read().iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Register a pronunciation and append it to the store.
    ///
    /// Returns `false` when the variant was already known (nothing written).
    /// The entry only becomes visible once the store line is written.
    pub fn add(&self, acronym: &str, phonemes: &str) -> Result<bool> {
        let phonemes = phonemes.split_whitespace().collect::<Vec<_>>().join(" ");
        let mut handle = self.handle.lock().unwrap_or_else(|e| e.into_inner());
        if self.read().get(acronym).is_some_and(|v| v.contains(&phonemes)) {
            return Ok(false);
        }
        if let Some(path) = &self.store {
            let store_err = |source| LoadError::Store { path: path.clone(), source };
            if handle.is_none() {
                let file = OpenOptions::new().create(true).append(true).open(path).map_err(store_err)?;
                *handle = Some(file);
            }
            if let Some(file) = handle.as_mut() {
                append_locked(file, &format!("{acronym}\t{phonemes}\n")).map_err(store_err)?;
            }
            info!(acronym, phonemes = %phonemes, "acronym saved to {}", path.display());
        }
        self.insert(acronym, phonemes);
        Ok(true)
    }

    /// Pronunciation of `acronym`.
    ///
    /// Known acronyms answer immediately with their first variant.  Unknown
    /// ones go to `resolver` with a letter-by-letter proposal; an accepted,
    /// valid answer is registered and persisted.  `None` means skipped.
    pub fn resolve(
        &self,
        acronym: &str,
        phonemizer: &Phonemizer<'_>,
        inventory: &BTreeSet<String>,
        resolver: &mut dyn AcronymResolver,
    ) -> Result<Option<String>> {
        if let Some(first) = self.variants(acronym).into_iter().next() {
            return Ok(Some(first));
        }
        let proposal = propose(acronym, phonemizer);
        for _ in 0..MAX_ATTEMPTS {
            match resolver.resolve(acronym, &proposal) {
                Resolution::Skip => return Ok(None),
                Resolution::Accept(answer) if validate(&answer, inventory) => {
                    let answer = answer.split_whitespace().collect::<Vec<_>>().join(" ");
                    self.add(acronym, &answer)?;
                    return Ok(Some(answer));
                }
                Resolution::Accept(answer) => resolver.rejected(acronym, &answer),
            }
        }
        warn!(acronym, "no valid pronunciation after {MAX_ATTEMPTS} attempts, skipped");
        Ok(None)
    }

    fn insert(&self, acronym: &str, phonemes: String) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        let slot = entries.entry(acronym.to_string()).or_default();
        if !slot.contains(&phonemes) {
            slot.push(phonemes);
        }
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, BTreeMap<String, Vec<String>>> {
        self.entries.read().unwrap_or_else(|e| e.into_inner())
    }
}

/// One `write_all` under an exclusive advisory lock, so processes sharing the
/// store never interleave lines.
fn append_locked(file: &mut File, line: &str) -> io::Result<()> {
    file.lock_exclusive()?;
    let written = file.write_all(line.as_bytes()).and_then(|_| file.flush());
    FileExt::unlock(file)?;
    written
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::phonemize::RuleTable;

    fn inventory() -> BTreeSet<String> {
        let mut inv = RuleTable::breton().inventory();
        inv.extend(letter_inventory());
        inv
    }

    /// Replays canned answers, then skips.
    struct Scripted {
        answers: Vec<Resolution>,
        rejected: usize,
    }

    impl AcronymResolver for Scripted {
        fn resolve(&mut self, _acronym: &str, _proposal: &str) -> Resolution {
            if self.answers.is_empty() {
                Resolution::Skip
            } else {
                self.answers.remove(0)
            }
        }

        fn rejected(&mut self, _acronym: &str, _answer: &str) {
            self.rejected += 1;
        }
    }

    #[test]
    fn test_predicate() {
        assert!(is_acronym("B"));
        assert!(!is_acronym("ab"));
        assert!(is_acronym("USA"));
        assert!(is_acronym("A2"));
        assert!(!is_acronym("a2"));
        assert!(!is_acronym("A"));
        assert!(!is_acronym(""));
        assert!(!is_acronym("2011"));
        assert!(!is_acronym("--"));
        assert!(is_acronym("RN-12"));
    }

    #[test]
    fn test_extract_acronyms() {
        let found = extract_acronyms("Ar SNCF hag an *TGV, SNCF c'hoazh, ha 1939 B.");
        assert_eq!(found, vec!["SNCF", "TGV", "B"]);
    }

    #[test]
    fn test_propose() {
        let p = Phonemizer::new(RuleTable::breton());
        assert_eq!(propose("SNCF", &p), "E S E N S E E F");
        assert_eq!(propose("A-2", &p), "A D O W");
    }

    #[test]
    fn test_validate() {
        let inv = inventory();
        assert!(validate("E S E N S E E F", &inv));
        assert!(validate("  T E  J E  ", &inv));
        assert!(!validate("E S Q", &inv));
        assert!(!validate("   ", &inv));
    }

    #[test]
    fn test_seeded_letters_resolve_immediately() {
        let reg = AcronymRegistry::seeded();
        let p = Phonemizer::new(RuleTable::breton());
        let got = reg.resolve("K", &p, &inventory(), &mut SkipAll).unwrap();
        assert_eq!(got.as_deref(), Some("K A"));
    }

    #[test]
    fn test_multimap_variants() {
        let reg = AcronymRegistry::seeded();
        reg.extend_from_text("CD S E D E\nCD\tK E D E\nCD S E D E\nBZH\n");
        assert_eq!(reg.variants("CD"), vec!["S E D E", "K E D E"]);
        assert!(!reg.contains("BZH"));
    }

    #[test]
    fn test_resolution_appends_to_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("acronyms.txt");
        std::fs::write(&path, "# acronymes\nUSA U E S A\n").unwrap();

        let reg = AcronymRegistry::load(&path).unwrap();
        let p = Phonemizer::new(RuleTable::breton());
        let inv = inventory();

        assert_eq!(
            reg.resolve("USA", &p, &inv, &mut SkipAll).unwrap().as_deref(),
            Some("U E S A")
        );
        assert_eq!(reg.resolve("TGV", &p, &inv, &mut SkipAll).unwrap(), None);

        let mut scripted = Scripted {
            answers: vec![
                Resolution::Accept("T E Q".into()),
                Resolution::Accept("T E  J E V E".into()),
            ],
            rejected: 0,
        };
        let got = reg.resolve("TGV", &p, &inv, &mut scripted).unwrap();
        assert_eq!(got.as_deref(), Some("T E J E V E"));
        assert_eq!(scripted.rejected, 1);
        assert!(reg.contains("TGV"));

        let stored = std::fs::read_to_string(&path).unwrap();
        assert!(stored.ends_with("TGV\tT E J E V E\n"), "{stored:?}");

        // a second registry sees the persisted entry
        let reloaded = AcronymRegistry::load(&path).unwrap();
        assert_eq!(reloaded.variants("TGV"), vec!["T E J E V E"]);
    }

    #[test]
    fn test_failed_append_leaves_registry_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        // a directory cannot be opened for appending
        let reg = AcronymRegistry { store: Some(dir.path().to_path_buf()), ..AcronymRegistry::seeded() };
        assert!(matches!(reg.add("TGV", "T E J E V E"), Err(LoadError::Store { .. })));
        assert!(!reg.contains("TGV"));
    }

    #[test]
    fn test_registries_share_one_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("acronyms.txt");
        std::fs::write(&path, "").unwrap();

        let handles: Vec<_> = ["SNCF", "TGV", "RATP", "EDF"]
            .into_iter()
            .map(|acronym| {
                let path = path.clone();
                std::thread::spawn(move || {
                    let reg = AcronymRegistry::load(&path).unwrap();
                    let p = Phonemizer::new(RuleTable::breton());
                    for _ in 0..20 {
                        reg.add(acronym, &propose(acronym, &p)).unwrap();
                    }
                    assert!(!reg.add(acronym, &propose(acronym, &p)).unwrap());
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let stored = std::fs::read_to_string(&path).unwrap();
        assert_eq!(stored.lines().count(), 4);
        let reloaded = AcronymRegistry::load(&path).unwrap();
        assert_eq!(reloaded.variants("SNCF"), vec!["E S E N S E E F"]);
        assert_eq!(reloaded.variants("EDF"), vec!["E D E E F"]);
    }

    #[test]
    fn test_gives_up_after_invalid_answers() {
        let reg = AcronymRegistry::seeded();
        let p = Phonemizer::new(RuleTable::breton());
        let mut scripted = Scripted {
            answers: (0..5).map(|_| Resolution::Accept("?".into())).collect(),
            rejected: 0,
        };
        assert_eq!(reg.resolve("XYZ", &p, &inventory(), &mut scripted).unwrap(), None);
        assert_eq!(scripted.rejected, MAX_ATTEMPTS);
    }

    #[test]
    fn test_accept_proposal() {
        let reg = AcronymRegistry::seeded();
        let p = Phonemizer::new(RuleTable::breton());
        let got = reg.resolve("KB", &p, &inventory(), &mut AcceptProposal).unwrap();
        assert_eq!(got.as_deref(), Some("K A B E"));
        assert_eq!(reg.variants("KB"), vec!["K A B E"]);
    }
}
