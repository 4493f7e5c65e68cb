use std::fs;
use std::path::{Path, PathBuf};

use pmirror_refs::{FsRefStore, InMemoryRefStore, RefStore};
use pmirror_store::{Commit, FsObjectStore, InMemoryObjectStore, ObjectStore, Tag};
use pmirror_types::{ObjectId, Signature, Version};
use serde::Serialize;
use tracing::info;

use crate::error::RepositoryError;
use crate::ledger::ReleaseLedger;

/// Directory inside the target that holds objects and refs.
pub const REPO_DIR: &str = ".pmirror";

/// The publication target: an object store plus its tag namespace.
pub struct MirrorRepository {
    root: Option<PathBuf>,
    store: Box<dyn ObjectStore>,
    refs: Box<dyn RefStore>,
}

impl MirrorRepository {
    /// Create (or reopen) a repository at `path`.
    pub fn init(path: &Path) -> Result<Self, RepositoryError> {
        let dir = path.join(REPO_DIR);
        fs::create_dir_all(&dir)?;
        info!(path = %path.display(), "initialized mirror repository");
        Self::open_dir(path, &dir)
    }

    /// Open an existing repository. Fails if `init` was never run there.
    pub fn open(path: &Path) -> Result<Self, RepositoryError> {
        let dir = path.join(REPO_DIR);
        if !dir.is_dir() {
            return Err(RepositoryError::NotInitialized(path.to_path_buf()));
        }
        Self::open_dir(path, &dir)
    }

    fn open_dir(path: &Path, dir: &Path) -> Result<Self, RepositoryError> {
        Ok(Self {
            root: Some(path.to_path_buf()),
            store: Box::new(FsObjectStore::open(dir)?),
            refs: Box::new(FsRefStore::open(dir)?),
        })
    }

    pub fn in_memory() -> Self {
        Self::from_parts(
            Box::new(InMemoryObjectStore::new()),
            Box::new(InMemoryRefStore::new()),
        )
    }

    pub fn from_parts(store: Box<dyn ObjectStore>, refs: Box<dyn RefStore>) -> Self {
        Self {
            root: None,
            store,
            refs,
        }
    }

    /// Working directory path, `None` for in-memory repositories.
    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    pub fn store(&self) -> &dyn ObjectStore {
        self.store.as_ref()
    }

    pub fn refs(&self) -> &dyn RefStore {
        self.refs.as_ref()
    }

    pub fn ledger(&self) -> ReleaseLedger<'_> {
        ReleaseLedger::new(self.refs())
    }

    /// Every published tag, resolved to its commit and tree, sorted by
    /// version (tags that are not versions sort last, by name).
    pub fn releases(&self) -> Result<Vec<PublishedRelease>, RepositoryError> {
        let mut out = Vec::new();
        for (_, tag_ref) in self.refs.tags()? {
            let tag = self.read_tag(&tag_ref.name, &tag_ref.target)?;
            let commit = self.read_commit(&tag_ref.name, &tag.target)?;
            out.push(PublishedRelease {
                version: tag_ref
                    .name
                    .strip_prefix('v')
                    .and_then(|v| Version::parse(v).ok()),
                tag: tag_ref.name,
                tag_id: tag_ref.target,
                commit: tag.target,
                tree: commit.tree,
                tagger: tag.tagger,
                message: tag.message,
            });
        }
        out.sort_by(|a, b| match (&a.version, &b.version) {
            (Some(x), Some(y)) => x.cmp(y),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.tag.cmp(&b.tag),
        });
        Ok(out)
    }

    fn read_tag(&self, name: &str, id: &ObjectId) -> Result<Tag, RepositoryError> {
        let obj = self.store.read(id)?.ok_or_else(|| RepositoryError::Dangling {
            tag: name.to_string(),
            reason: format!("missing tag object {}", id.short_hex()),
        })?;
        Ok(Tag::from_stored_object(&obj)?)
    }

    fn read_commit(&self, name: &str, id: &ObjectId) -> Result<Commit, RepositoryError> {
        let obj = self.store.read(id)?.ok_or_else(|| RepositoryError::Dangling {
            tag: name.to_string(),
            reason: format!("missing commit {}", id.short_hex()),
        })?;
        Ok(Commit::from_stored_object(&obj)?)
    }
}

impl std::fmt::Debug for MirrorRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MirrorRepository")
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}

/// A release as recorded in the repository.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PublishedRelease {
    pub tag: String,
    pub version: Option<Version>,
    pub tag_id: ObjectId,
    pub commit: ObjectId,
    pub tree: ObjectId,
    pub tagger: Signature,
    pub message: String,
}
