// src/error.rs

use std::path::PathBuf;
use std::process::ExitStatus;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TrendError {
    /// The given path is not inside a git repository
    #[error("cannot open repository at {path}: {source}")]
    Repository {
        path: PathBuf,
        source: git2::Error,
    },

    #[error("failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        source: std::io::Error,
    },

    /// git ran but reported failure
    #[error("`{command}` exited with {status}: {stderr}")]
    GitFailed {
        command: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("malformed history line {line_no}: {line:?} ({reason})")]
    MalformedLogLine {
        line_no: usize,
        line: String,
        reason: &'static str,
    },

    #[error("malformed grep line {line_no}: {line:?} ({reason})")]
    MalformedGrepLine {
        line_no: usize,
        line: String,
        reason: &'static str,
    },

    #[error("invalid granularity {0:?}, expected one of: commit, day, week")]
    InvalidGranularity(String),

    #[error("invalid keep policy {0:?}, expected one of: first, last")]
    InvalidKeep(String),

    #[error("invalid pattern syntax {0:?}, expected one of: basic, extended, perl, fixed")]
    InvalidSyntax(String),

    #[error("cannot read config {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Config(String),

    #[error("cannot encode chart: {0}")]
    Image(#[from] image::ImageError),

    #[error("I/O error: {context}: {source}")]
    Io {
        context: String,
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, TrendError>;
