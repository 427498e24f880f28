//! Startup failures.
//!
//! Malformed *text* never produces an error anywhere in this crate: it
//! degrades to a score penalty or a recorded diagnostic.  Only the resources a
//! run depends on (override tables, rule table, config, acronym store) can
//! fail, and they fail before any sentence is processed.

use std::{io, path::PathBuf};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoadError {
    /// A required table is absent.
    #[error("required table not found: {}", .0.display())]
    Missing(PathBuf),

    /// A table exists but could not be read.
    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A line that does not follow the table's format.
    #[error("{}:{line}: {reason}", path.display())]
    Malformed {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    /// The pipeline config is not valid JSON for [`crate::config::PipelineConfig`].
    #[error("invalid config {}: {source}", path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A Hunspell affix/dictionary pair that does not parse.
    #[error("invalid spell dictionary {}: {reason}", path.display())]
    Dictionary {
        path: PathBuf,
        reason: String,
    },

    /// Appending a new entry to the acronym store failed.
    #[error("cannot append to acronym store {}: {source}", path.display())]
    Store {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl LoadError {
    pub(crate) fn malformed(path: &std::path::Path, line: usize, reason: impl Into<String>) -> Self {
        LoadError::Malformed { path: path.to_path_buf(), line, reason: reason.into() }
    }
}

pub type Result<T> = std::result::Result<T, LoadError>;
