//! Error types for the revision index.

use thiserror::Error;

/// Errors raised by the revision index.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IndexError {
    /// A pre-commit hook found a cycle in the revision graph.
    #[error("cycle detected: {0}")]
    CycleDetected(String),

    /// The branch does not exist.
    #[error("branch '{0}' not found")]
    BranchNotFound(String),

    /// A branch with the same path already exists.
    #[error("branch '{0}' already exists")]
    BranchExists(String),

    /// The commit timestamp is not after the branch head.
    #[error("commit timestamp {timestamp} on '{branch}' is not after head {head}")]
    StaleTimestamp {
        /// Branch the commit targeted.
        branch: String,
        /// Timestamp of the rejected commit.
        timestamp: i64,
        /// Current head timestamp of the branch.
        head: i64,
    },

    /// A document kind is not registered in the mappings.
    #[error("document kind '{0}' is not mapped")]
    UnmappedKind(String),

    /// A pre-commit hook rejected the commit.
    #[error("pre-commit hook failed: {0}")]
    Hook(String),

    /// Invalid argument, e.g. an empty branch name.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A thread panicked while holding the index lock.
    #[error("index state is poisoned")]
    Poisoned,
}

/// Result type alias for index operations.
pub type Result<T> = std::result::Result<T, IndexError>;
