//! Error types for ruminate.

use std::path::PathBuf;

use crate::output::OutputError;
use crate::rewrite::RewriteError;
use crate::walker::WalkError;

/// Invalid configuration detected before any file is touched.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid prefix {prefix:?}: generated names must be valid CSS identifiers")]
    InvalidPrefix { prefix: String },

    #[error("invalid exclude pattern {pattern:?}: {source}")]
    InvalidExclude {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    #[error("identifier alphabet must not be empty")]
    EmptyAlphabet,

    #[error("identifier alphabet contains {0:?} more than once")]
    DuplicateAlphabetChar(char),

    #[error("identifier alphabet character {ch:?} would generate the invalid name {name:?}")]
    InvalidAlphabetChar { ch: char, name: String },
}

/// Top-level error type for ruminate operations.
#[derive(Debug, thiserror::Error)]
pub enum RuminateError {
    #[error("no css, view, or script files found")]
    NoFilesFound,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("walk error: {0}")]
    Walk(#[from] WalkError),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("{}: {source}", .path.display())]
    Source {
        path: PathBuf,
        #[source]
        source: RewriteError,
    },

    #[error("output error: {0}")]
    Output(#[from] OutputError),
}

impl RuminateError {
    pub(crate) fn source_file(path: impl Into<PathBuf>, source: RewriteError) -> Self {
        RuminateError::Source {
            path: path.into(),
            source,
        }
    }
}

/// Map an error to its exit code.
pub fn exit_code(error: &RuminateError) -> i32 {
    match error {
        RuminateError::NoFilesFound => 5,
        RuminateError::Io(_) => 1,
        RuminateError::Walk(WalkError::PermissionDenied { .. }) => 4,
        RuminateError::Walk(_) => 2,
        RuminateError::Config(_) => 64,
        RuminateError::Source { .. } => 65,
        RuminateError::Output(_) => 1,
    }
}
