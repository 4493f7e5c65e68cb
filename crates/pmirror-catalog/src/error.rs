use std::path::PathBuf;

use pmirror_types::ContentRef;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    /// The requested directory does not exist in the snapshot.
    #[error("path not found in {snapshot}: {path}")]
    NotFound { snapshot: String, path: String },

    /// A content ref could not be resolved by the snapshot that issued it.
    #[error("content {content} not available in {snapshot}")]
    ContentMissing { snapshot: String, content: ContentRef },

    /// The upstream repository has no stable release tag.
    #[error("no stable release tag found in {0}")]
    NoStableRelease(PathBuf),

    #[error("not a git repository: {0}")]
    RepoNotFound(PathBuf),

    #[error("failed to run {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{command} failed: {stderr}")]
    Git { command: String, stderr: String },

    #[error("snapshot index lock poisoned")]
    Poisoned,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type CatalogResult<T> = Result<T, CatalogError>;
