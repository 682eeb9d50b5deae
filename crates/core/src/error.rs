//! Unified error types for trailstore.
//!
//! Every fallible operation in the workspace returns [`Result`]. Iteration
//! exhaustion is never an error: cursors report it as `Ok(None)`.

use thiserror::Error;

/// All trailstore errors.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error while creating, writing or reading a store
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Field list is malformed, or a record does not fit the schema
    #[error("schema error: {0}")]
    Schema(String),

    /// Raw entity key does not have exactly 16 bytes
    #[error("entity key must be 16 bytes, got {len}")]
    BadKeyLength {
        /// Length of the rejected key
        len: usize,
    },

    /// Entity key string could not be parsed
    #[error("invalid entity key: {0}")]
    InvalidKey(String),

    /// Write attempted on a builder that was already finalized
    #[error("store builder already finalized")]
    Finalized,

    /// Finalize could not encode the store
    #[error("encoding error: {0}")]
    Encoding(String),

    /// Store file is unreadable, truncated or fails validation
    #[error("corrupt store: {0}")]
    CorruptFormat(String),

    /// Field name is not part of the schema
    #[error("unknown field: {0}")]
    UnknownField(String),

    /// Trail index outside `[0, trail_count)`
    #[error("trail index {index} out of range (trail count {count})")]
    BadIndex {
        /// Requested trail index
        index: u64,
        /// Number of trails in the store
        count: u64,
    },

    /// Store path, entity key or trail does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// Cursor used before being bound to a trail
    #[error("cursor is not bound to a trail")]
    Unbound,

    /// Configuration could not be loaded
    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type for trailstore operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Shorthand for a [`Error::CorruptFormat`] with a formatted message.
    pub fn corrupt(msg: impl Into<String>) -> Self {
        Error::CorruptFormat(msg.into())
    }

    /// Check if this is a not-found error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }

    /// Check if the error reports an invalid store file.
    pub fn is_corruption(&self) -> bool {
        matches!(self, Error::CorruptFormat(_))
    }
}
