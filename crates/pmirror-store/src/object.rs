use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use pmirror_types::{ObjectId, Signature};

use crate::error::{StoreError, StoreResult};
use crate::hasher::ContentHasher;

/// The kind of object stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectKind {
    /// Raw file contents.
    Blob,
    /// Directory listing: sorted entries mapping names to object references.
    Tree,
    /// Root tree plus authorship and message.
    Commit,
    /// Annotated tag pointing at a commit.
    Tag,
}

impl ObjectKind {
    fn hasher(self) -> &'static ContentHasher {
        match self {
            Self::Blob => &ContentHasher::BLOB,
            Self::Tree => &ContentHasher::TREE,
            Self::Commit => &ContentHasher::COMMIT,
            Self::Tag => &ContentHasher::TAG,
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Blob => "blob",
            Self::Tree => "tree",
            Self::Commit => "commit",
            Self::Tag => "tag",
        })
    }
}

impl FromStr for ObjectKind {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "blob" => Ok(Self::Blob),
            "tree" => Ok(Self::Tree),
            "commit" => Ok(Self::Commit),
            "tag" => Ok(Self::Tag),
            other => Err(StoreError::Serialization(format!(
                "unknown object kind: {other}"
            ))),
        }
    }
}

/// A stored object: kind tag + serialized data.
///
/// `StoredObject` is the unit of storage. The store never interprets the
/// data; it is a pure key-value store keyed by content hash.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredObject {
    pub kind: ObjectKind,
    pub data: Vec<u8>,
}

impl StoredObject {
    pub fn new(kind: ObjectKind, data: Vec<u8>) -> Self {
        Self { kind, data }
    }

    /// Compute the content-addressed id using the kind's domain hasher.
    pub fn compute_id(&self) -> ObjectId {
        self.kind.hasher().hash(&self.data)
    }

    fn expect_kind(&self, kind: ObjectKind) -> StoreResult<()> {
        if self.kind == kind {
            Ok(())
        } else {
            Err(StoreError::CorruptObject {
                id: self.compute_id(),
                reason: format!("expected {kind}, got {}", self.kind),
            })
        }
    }

    fn encode_json<T: Serialize>(kind: ObjectKind, value: &T) -> StoreResult<Self> {
        let data = serde_json::to_vec(value).map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(Self::new(kind, data))
    }

    fn decode_json<T: DeserializeOwned>(&self, kind: ObjectKind) -> StoreResult<T> {
        self.expect_kind(kind)?;
        serde_json::from_slice(&self.data).map_err(|e| StoreError::CorruptObject {
            id: self.compute_id(),
            reason: e.to_string(),
        })
    }
}

// ---------------------------------------------------------------------------
// Blob
// ---------------------------------------------------------------------------

/// Raw content object (analogous to git blob).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Blob {
    pub data: Vec<u8>,
}

impl Blob {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    pub fn to_stored_object(&self) -> StoredObject {
        StoredObject::new(ObjectKind::Blob, self.data.clone())
    }

    pub fn from_stored_object(obj: &StoredObject) -> StoreResult<Self> {
        obj.expect_kind(ObjectKind::Blob)?;
        Ok(Self {
            data: obj.data.clone(),
        })
    }
}

// ---------------------------------------------------------------------------
// Tree
// ---------------------------------------------------------------------------

/// File mode for a tree entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryMode {
    /// Normal file (0o100644).
    Regular,
    /// Executable file (0o100755).
    Executable,
    /// Symbolic link (0o120000); the blob holds the link target.
    Symlink,
    /// Subtree (0o040000).
    Directory,
}

impl EntryMode {
    pub fn mode_bits(&self) -> u32 {
        match self {
            Self::Regular => 0o100644,
            Self::Executable => 0o100755,
            Self::Symlink => 0o120000,
            Self::Directory => 0o040000,
        }
    }

    /// Map Unix permission bits of a regular file to a blob mode.
    ///
    /// Any owner-execute bit yields [`EntryMode::Executable`]; everything
    /// else falls back to [`EntryMode::Regular`].
    pub fn for_file_permissions(mode: u32) -> Self {
        if mode & 0o100 != 0 {
            Self::Executable
        } else {
            Self::Regular
        }
    }

    pub fn is_tree(&self) -> bool {
        matches!(self, Self::Directory)
    }
}

impl fmt::Display for EntryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:06o}", self.mode_bits())
    }
}

/// A single entry in a tree object.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeEntry {
    pub mode: EntryMode,
    pub name: String,
    pub object_id: ObjectId,
}

impl TreeEntry {
    pub fn new(mode: EntryMode, name: impl Into<String>, object_id: ObjectId) -> Self {
        Self {
            mode,
            name: name.into(),
            object_id,
        }
    }
}

/// Directory listing object (analogous to git tree).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tree {
    /// Entries sorted by name.
    pub entries: Vec<TreeEntry>,
}

impl Tree {
    /// Create a tree; entries are sorted by name so that the encoded bytes,
    /// and therefore the id, never depend on insertion order.
    pub fn new(mut entries: Vec<TreeEntry>) -> Self {
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Self { entries }
    }

    pub fn to_stored_object(&self) -> StoreResult<StoredObject> {
        StoredObject::encode_json(ObjectKind::Tree, self)
    }

    pub fn from_stored_object(obj: &StoredObject) -> StoreResult<Self> {
        obj.decode_json(ObjectKind::Tree)
    }

    pub fn get(&self, name: &str) -> Option<&TreeEntry> {
        self.entries
            .binary_search_by(|e| e.name.as_str().cmp(name))
            .ok()
            .map(|i| &self.entries[i])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Commit
// ---------------------------------------------------------------------------

/// A parentless commit wrapping one release tree.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    pub tree: ObjectId,
    pub author: Signature,
    pub committer: Signature,
    pub message: String,
}

impl Commit {
    pub fn to_stored_object(&self) -> StoreResult<StoredObject> {
        StoredObject::encode_json(ObjectKind::Commit, self)
    }

    pub fn from_stored_object(obj: &StoredObject) -> StoreResult<Self> {
        obj.decode_json(ObjectKind::Commit)
    }
}

// ---------------------------------------------------------------------------
// Tag
// ---------------------------------------------------------------------------

/// Annotated tag object.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    /// The tagged commit.
    pub target: ObjectId,
    pub tagger: Signature,
    pub message: String,
}

impl Tag {
    pub fn to_stored_object(&self) -> StoreResult<StoredObject> {
        StoredObject::encode_json(ObjectKind::Tag, self)
    }

    pub fn from_stored_object(obj: &StoredObject) -> StoreResult<Self> {
        obj.decode_json(ObjectKind::Tag)
    }
}
