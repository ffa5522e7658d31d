// src/error.rs

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised at the configuration / CLI boundary.
///
/// Extraction itself never fails: malformed tokens fall back to defaults.
#[derive(Debug, Error)]
pub enum Error {
    #[error("could not read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Config(#[from] toml::de::Error),

    #[error("invalid {table} pattern `{pattern}`: {source}")]
    Pattern {
        table: &'static str,
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
