use std::path::PathBuf;
use std::time::Duration;

use pmirror_catalog::CatalogError;
use pmirror_refs::RefError;
use pmirror_store::{ObjectKind, StoreError};
use pmirror_types::Version;
use thiserror::Error;

/// Failure of the external generation step.
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("{step} exited with status {status:?}: {stderr}")]
    Failed {
        step: String,
        status: Option<i32>,
        stderr: String,
    },

    #[error("{step} did not finish within {timeout:?}")]
    TimedOut { step: String, timeout: Duration },

    #[error("failed to start {step}: {source}")]
    Spawn {
        step: String,
        #[source]
        source: std::io::Error,
    },

    #[error("generator I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// The idempotency gate could not decide whether a tag exists.
#[derive(Debug, Error)]
#[error("cannot check whether tag {tag} exists: {source}")]
pub struct LedgerError {
    pub tag: String,
    #[source]
    pub source: RefError,
}

/// Failure confined to one version. Other versions keep going.
#[derive(Debug, Error)]
pub enum ReleaseError {
    #[error("cannot read protocol definition: {0}")]
    Source(#[source] CatalogError),

    #[error("staging failed: {0}")]
    Staging(#[source] std::io::Error),

    #[error("generation failed: {0}")]
    Generation(#[from] GenerateError),

    #[error("failed to write {kind} object: {source}")]
    ObjectWrite {
        kind: ObjectKind,
        #[source]
        source: StoreError,
    },

    #[error("failed to create tag {tag}: {source}")]
    TagWrite {
        tag: String,
        #[source]
        source: RefError,
    },
}

impl ReleaseError {
    /// Coarse failure class, for reports.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Source(CatalogError::NotFound { .. } | CatalogError::ContentMissing { .. }) => {
                "not-found"
            }
            Self::Source(_) | Self::Staging(_) => "io",
            Self::Generation(GenerateError::TimedOut { .. }) => "external-tool-timeout",
            Self::Generation(_) => "external-tool",
            Self::ObjectWrite { .. } | Self::TagWrite { .. } => "repository-write",
        }
    }
}

/// Failure that aborts the whole run.
#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error("aborted while processing v{version}: {source}")]
    Ledger {
        version: Version,
        #[source]
        source: LedgerError,
    },
}

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("no pmirror repository at {0} (run `pmirror init` first)")]
    NotInitialized(PathBuf),

    #[error("tag {tag} points at {reason}")]
    Dangling { tag: String, reason: String },

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("ref error: {0}")]
    Ref(#[from] RefError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}
