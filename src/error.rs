use std::{io, path::PathBuf, result};

use thiserror::Error;

/// Result type alias used by the fallible parts of the crate (row store I/O and configuration).
pub type Result<T> = result::Result<T, Error>;

/// Errors surfaced by the row store and index configuration.
///
/// Looking up an absent key is never an error: every index answers with an empty result.
#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("line {line}: {reason}")]
    Parse { line: usize, reason: String },

    #[error("invalid configuration: {0}")]
    Config(String),
}

/// A broken structural invariant found by `BTree::validate`.
///
/// Correct operation never produces one; tests use it to pinpoint the first broken node.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invariant violated at node {node}: {reason}")]
pub struct InvariantViolation {
    pub node: usize,
    pub reason: String,
}
