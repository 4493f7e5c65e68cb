use pmirror_types::ContentRef;

use crate::error::CatalogResult;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SourceEntryKind {
    File(ContentRef),
    Directory,
}

/// One entry of a directory listing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceEntry {
    pub name: String,
    pub kind: SourceEntryKind,
}

impl SourceEntry {
    pub fn file(name: impl Into<String>, content: ContentRef) -> Self {
        Self {
            name: name.into(),
            kind: SourceEntryKind::File(content),
        }
    }

    pub fn directory(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: SourceEntryKind::Directory,
        }
    }

    pub fn content(&self) -> Option<&ContentRef> {
        match &self.kind {
            SourceEntryKind::File(content) => Some(content),
            SourceEntryKind::Directory => None,
        }
    }
}

/// Read-only view of an upstream tree at one point in history.
pub trait SourceSnapshot: Send + Sync {
    /// List the immediate children of `prefix` (a `/`-separated path relative
    /// to the snapshot root; `""` is the root).
    ///
    /// Fails with [`CatalogError::NotFound`](crate::CatalogError::NotFound)
    /// if `prefix` does not exist.
    fn list_directory(&self, prefix: &str) -> CatalogResult<Vec<SourceEntry>>;

    /// Resolve a content ref issued by this snapshot to its bytes.
    fn read_content(&self, content: &ContentRef) -> CatalogResult<Vec<u8>>;

    /// Short label for logs and errors.
    fn describe(&self) -> String;
}

/// Strip leading/trailing slashes so `"docs/x/"` and `"/docs/x"` agree.
pub(crate) fn normalize_prefix(prefix: &str) -> &str {
    prefix.trim_matches('/')
}
