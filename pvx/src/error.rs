//! Error types for PVX operations.

use std::path::PathBuf;

/// A failure while turning command tokens into a command descriptor.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GrammarError {
    /// A keyword expected an argument that was not supplied.
    #[error("missing argument after {0}")]
    Exhausted(String),

    /// A keyword or bound slot was supplied more than once.
    #[error("duplicate {0}")]
    Duplicate(String),

    /// An unrecognized token or a malformed literal.
    #[error("{0}")]
    Syntax(String),
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Grammar error: {0}")]
    Grammar(#[from] GrammarError),

    #[error("Connect failed: {0}")]
    Connect(String),

    #[error("Point '{0}' is unknown")]
    PointNotFound(String),

    #[error("Stream error: {0}")]
    Stream(#[from] std::io::Error),

    #[error("DuckDB error: {0}")]
    Store(#[from] duckdb::Error),

    #[error("Codec error: {0}")]
    Codec(#[from] serde_json::Error),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Store already initialized at {0}")]
    AlreadyInitialized(PathBuf),
}

impl Error {
    /// Whether the tool should answer this failure with its usage text.
    pub fn is_usage(&self) -> bool {
        matches!(self, Error::Grammar(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
