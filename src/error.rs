//! Error handling types and utilities.

use std::path::PathBuf;

/// A specialized Result type for doxsearch-mcp operations.
///
/// This is an alias for `anyhow::Result` with context added via `.context()` and
/// `.with_context()` methods throughout the codebase.
pub type Result<T> = anyhow::Result<T>;

/// A structurally invalid record encountered while building a [`SearchIndex`].
///
/// Positions refer to the order in which records were handed to the builder.
///
/// [`SearchIndex`]: crate::search::SearchIndex
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MalformedDataError {
    #[error("record {position} has an empty search key")]
    EmptyKey { position: usize },

    #[error("record {position} ('{key}') has no entries")]
    NoEntries { position: usize, key: String },

    #[error("search key '{key}' at record {duplicate} duplicates record {first}")]
    DuplicateKey {
        key: String,
        first: usize,
        duplicate: usize,
    },

    #[error("search key '{key}' at record {position} is not in normalized form")]
    UnnormalizedKey { position: usize, key: String },
}

impl MalformedDataError {
    /// Position of the offending record.
    pub const fn position(&self) -> usize {
        match self {
            Self::EmptyKey { position }
            | Self::NoEntries { position, .. }
            | Self::UnnormalizedKey { position, .. } => *position,
            Self::DuplicateKey { duplicate, .. } => *duplicate,
        }
    }
}

/// Error returned when reading generated search data fails.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// The payload is not a well-formed script literal.
    #[error("syntax error at {line}:{column}: {message}")]
    Syntax {
        line: usize,
        column: usize,
        message: String,
    },
    /// The payload parsed, but a record does not have the expected layout.
    #[error("record {record}: {message}")]
    Shape { record: usize, message: String },
}

/// Error returned when loading a section of a documentation corpus fails.
#[derive(Debug, Clone, thiserror::Error)]
pub enum LoadError {
    /// No generated `search/` directory at the expected path.
    #[error("no generated search data found at {}", path.display())]
    CorpusNotFound { path: PathBuf },
    /// The corpus has no section with that name.
    #[error("section '{section}' not found (available: {})", available.join(", "))]
    UnknownSection {
        section: String,
        available: Vec<String>,
    },
    /// A shard file could not be read or parsed.
    #[error("failed to load {}: {error}", path.display())]
    Shard { path: PathBuf, error: String },
    /// Shards parsed, but their records are invalid. `origin` names the shard
    /// file, or the merge step for keys duplicated across shards.
    #[error("section '{section}' is malformed ({origin}): {error}")]
    Malformed {
        section: String,
        origin: String,
        error: MalformedDataError,
    },
}
