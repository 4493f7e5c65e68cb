//! Error types for reference operations.

use thiserror::Error;

/// Errors that can occur during reference operations.
#[derive(Debug, Error)]
pub enum RefError {
    /// A reference with this name already exists. Tags are never moved.
    #[error("ref already exists: {name}")]
    AlreadyExists { name: String },

    /// The ref name is not a valid git-style name.
    #[error("invalid ref name: {name}: {reason}")]
    InvalidName { name: String, reason: String },

    /// A stored ref could not be decoded.
    #[error("corrupt ref {name}: {reason}")]
    Corrupt { name: String, reason: String },

    /// An in-process lock was poisoned by a panicking writer.
    #[error("ref store lock poisoned")]
    Poisoned,

    /// I/O error during file-based ref operations.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for ref operations.
pub type Result<T> = std::result::Result<T, RefError>;
