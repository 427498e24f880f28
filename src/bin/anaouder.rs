//! anaouder — corpus and lexicon preparation for Breton speech recognition.
//!
//! ```text
//! anaouder split text.txt
//! anaouder -c config.json clean --corpus text.txt
//! anaouder -c config.json correct transcriptions/*.txt
//! anaouder -c config.json phonemize brezhoneg c'hwec'h
//! anaouder -c config.json corpus -o corpus.txt wiki/*.txt
//! anaouder -c config.json lexicon -o data/local/dict_nosp train/*.txt
//! anaouder -c config.json acronyms text.txt
//! ```

use std::{
    fs,
    io::{self, BufRead, BufWriter, Write},
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn, Level};

use anaouder::{
    acronym::extract_acronyms,
    corpus::text_lines,
    AcronymResolver, CleanOptions, CorpusBuilder, LexiconBuilder, Markup, PipelineConfig,
    Resolution, Resources, SplitPolicy, TextCleaner,
};

/// Breton text normalisation and G2P for ASR training data
#[derive(Parser, Debug)]
#[command(name = "anaouder")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Pipeline config (JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only report errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

impl Cli {
    fn log_level(&self) -> Level {
        if self.quiet {
            return Level::ERROR;
        }
        match self.verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            2 => Level::DEBUG,
            _ => Level::TRACE,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Split text lines into sentences
    Split {
        files: Vec<PathBuf>,

        /// Split on every delimiter, whatever follows it
        #[arg(long)]
        relaxed: bool,
    },

    /// Clean sentences and print them with their blacklist ratio
    Clean {
        files: Vec<PathBuf>,

        /// Corpus options: strip markers, drop verbal tics, spell out numbers
        #[arg(long)]
        corpus: bool,
    },

    /// Review spelling of transcription files
    Correct {
        files: Vec<PathBuf>,

        /// Bracket marks instead of terminal colors
        #[arg(long)]
        plain: bool,
    },

    /// Print the phonemes of words
    Phonemize {
        words: Vec<String>,
    },

    /// Build a language-model corpus
    Corpus {
        files: Vec<PathBuf>,

        /// Output file
        #[arg(short, long, default_value = "corpus.txt")]
        output: PathBuf,

        /// Also write the unknown acronyms found in accepted sentences
        #[arg(long)]
        acronyms: Option<PathBuf>,
    },

    /// Build the lexicon and phone lists of a dictionary directory
    Lexicon {
        files: Vec<PathBuf>,

        /// Dictionary directory
        #[arg(short, long, default_value = "dict_nosp")]
        output: PathBuf,
    },

    /// Resolve the unknown acronyms of text files interactively
    Acronyms {
        files: Vec<PathBuf>,
    },
}

// ─────────────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────────────

fn read_text(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Cannot read {}", path.display()))
}

fn load(config: Option<&Path>) -> Result<(PipelineConfig, Resources)> {
    let Some(path) = config else {
        bail!("this command needs a pipeline config (--config)");
    };
    let config = PipelineConfig::from_file(path)
        .with_context(|| format!("Failed to load config {}", path.display()))?;
    let res = Resources::load(&config).context("Failed to load resources")?;
    Ok((config, res))
}

/// Prompts on stderr, reads answers on stdin.
struct StdinResolver;

impl AcronymResolver for StdinResolver {
    fn resolve(&mut self, acronym: &str, proposal: &str) -> Resolution {
        eprint!("{acronym} [{proposal}] (Enter = accept, s = skip): ");
        let _ = io::stderr().flush();
        let mut answer = String::new();
        if io::stdin().lock().read_line(&mut answer).unwrap_or(0) == 0 {
            return Resolution::Skip;
        }
        match answer.trim() {
            "" => Resolution::Accept(proposal.to_string()),
            "s" | "skip" => Resolution::Skip,
            other => Resolution::Accept(other.to_uppercase()),
        }
    }

    fn rejected(&mut self, acronym: &str, answer: &str) {
        eprintln!("unknown phoneme in '{answer}' for {acronym}, try again");
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Commands
// ─────────────────────────────────────────────────────────────────────────────

fn split(files: &[PathBuf], relaxed: bool) -> Result<()> {
    let policy = if relaxed { SplitPolicy::relaxed() } else { SplitPolicy::default() };
    let mut out = BufWriter::new(io::stdout().lock());
    for path in files {
        for line in text_lines(&read_text(path)?) {
            for span in anaouder::split_line_with(&line.text, policy) {
                writeln!(out, "{span}")?;
            }
        }
    }
    Ok(())
}

fn clean(config: Option<&Path>, files: &[PathBuf], corpus: bool) -> Result<()> {
    let (config, res) = load(config)?;
    let options = if corpus { CleanOptions::corpus() } else { config.clean.unwrap_or_default() };
    let cleaner = TextCleaner::with_options(&res, options);
    let mut out = BufWriter::new(io::stdout().lock());
    for path in files {
        for line in text_lines(&read_text(path)?) {
            for span in anaouder::split_line_with(&line.text, config.split) {
                let cleaned = cleaner.clean(&span);
                writeln!(out, "{:.2}\t{}", cleaned.blacklist_ratio, cleaned.text)?;
            }
        }
    }
    Ok(())
}

fn correct(config: Option<&Path>, files: &[PathBuf], plain: bool) -> Result<()> {
    let (_, res) = load(config)?;
    let cleaner = TextCleaner::new(&res);
    let markup = if plain { Markup::Brackets } else { Markup::Ansi };
    let mut total = 0;
    for path in files {
        println!("==== {} ====", path.display());
        let text = read_text(path)?;
        let lines = text.lines().enumerate().filter(|(_, l)| {
            let l = l.trim();
            !l.is_empty() && !l.starts_with('#')
        });
        for (n, line) in lines {
            let line = anaouder::preprocess::strip_speaker_tags(line);
            let correction = cleaner.correct(&line);
            if correction.errors > 0 {
                println!("{:>5}: {}", n + 1, correction.render(markup));
                total += correction.errors;
            }
        }
    }
    println!("{total} error(s)");
    Ok(())
}

fn phonemize(config: Option<&Path>, words: &[String]) -> Result<()> {
    let resources = match config {
        Some(_) => Some(load(config)?.1),
        None => None,
    };
    let fallback = anaouder::Phonemizer::new(anaouder::RuleTable::breton());
    let g2p = resources.as_ref().map_or(fallback, Resources::phonemizer);
    for word in words {
        let result = g2p.word_to_phonemes(word);
        if !result.gaps.is_empty() {
            let missing: String = result.gaps.iter().map(|g| g.ch).collect();
            warn!(word = %word, "no rule for '{missing}'");
        }
        println!("{word} {result}");
    }
    Ok(())
}

fn corpus(config: Option<&Path>, files: &[PathBuf], output: &Path, acronyms: Option<&Path>) -> Result<()> {
    let (config, res) = load(config)?;
    let mut builder = CorpusBuilder::new(&res, config.split, config.corpus)
        .with_clean_options(config.clean.unwrap_or_else(CleanOptions::corpus));
    for path in files {
        for line in text_lines(&read_text(path)?).into_iter().filter(|l| l.for_lm) {
            builder.add_line(&line.text);
        }
        info!(sentences = builder.len(), "parsed {}", path.display());
    }

    let file = fs::File::create(output).with_context(|| format!("Cannot create {}", output.display()))?;
    builder.write_to(BufWriter::new(file))?;

    if let Some(path) = acronyms {
        let list: String = builder.unknown_acronyms().map(|a| format!("{a}\n")).collect();
        fs::write(path, list).with_context(|| format!("Cannot write {}", path.display()))?;
    }

    let stats = builder.stats();
    println!(
        "{} sentences kept ({} duplicates, {} mostly blacklisted, {} too short) out of {} lines",
        stats.accepted, stats.duplicates, stats.rejected_blacklist, stats.rejected_short, stats.lines
    );
    Ok(())
}

fn lexicon(config: Option<&Path>, files: &[PathBuf], output: &Path) -> Result<()> {
    let (config, res) = load(config)?;
    let cleaner = TextCleaner::new(&res);
    let mut builder = LexiconBuilder::new(&res);
    for path in files {
        for line in text_lines(&read_text(path)?) {
            for span in anaouder::split_line_with(&line.text, config.split) {
                builder.add_sentence(&cleaner.clean(&span).text);
            }
        }
    }

    let lexicon = builder.build();
    lexicon
        .write_dict_dir(output)
        .with_context(|| format!("Cannot write dictionary to {}", output.display()))?;

    for d in &lexicon.diagnostics {
        let missing: String = d.result.gaps.iter().map(|g| g.ch).collect();
        eprintln!("{}\t{}\tmissing: {missing}", d.word, d.result);
    }
    println!("{} lexicon entries written to {}", lexicon.entries.len(), output.display());
    Ok(())
}

fn acronyms(config: Option<&Path>, files: &[PathBuf]) -> Result<()> {
    let (_, res) = load(config)?;
    let g2p = res.phonemizer();
    let inventory = res.inventory();
    let mut resolver = StdinResolver;
    let mut added = 0;

    for path in files {
        for line in text_lines(&read_text(path)?) {
            for acronym in extract_acronyms(&line.text) {
                if res.acronyms.contains(&acronym) {
                    continue;
                }
                eprintln!("{}", line.text);
                if res.acronyms.resolve(&acronym, &g2p, &inventory, &mut resolver)?.is_some() {
                    added += 1;
                }
            }
        }
    }
    println!("{added} acronym(s) added");
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// main
// ─────────────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(cli.log_level())
        .with_writer(io::stderr)
        .init();

    let config = cli.config.as_deref();
    match &cli.command {
        Command::Split { files, relaxed } => split(files, *relaxed),
        Command::Clean { files, corpus } => clean(config, files, *corpus),
        Command::Correct { files, plain } => correct(config, files, *plain),
        Command::Phonemize { words } => phonemize(config, words),
        Command::Corpus { files, output, acronyms } => corpus(config, files, output, acronyms.as_deref()),
        Command::Lexicon { files, output } => lexicon(config, files, output),
        Command::Acronyms { files } => self::acronyms(config, files),
    }
}
