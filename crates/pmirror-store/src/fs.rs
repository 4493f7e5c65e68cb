//! Loose-object store on the local filesystem.
//!
//! Layout: `<root>/objects/<hex[0..2]>/<hex[2..]>`. Each file holds a
//! `<kind> <len>\0` header followed by the object data. New objects are
//! written to a temp file next to their final path and renamed into place,
//! so a reader never observes a partially written object.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use pmirror_types::ObjectId;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::object::{ObjectKind, StoredObject};
use crate::traits::ObjectStore;

#[derive(Debug)]
pub struct FsObjectStore {
    objects_dir: PathBuf,
}

impl FsObjectStore {
    /// Open (or create) the object directory under `root`.
    pub fn open(root: &Path) -> StoreResult<Self> {
        let objects_dir = root.join("objects");
        fs::create_dir_all(&objects_dir)?;
        Ok(Self { objects_dir })
    }

    fn object_path(&self, id: &ObjectId) -> PathBuf {
        let hex = id.to_hex();
        self.objects_dir.join(&hex[..2]).join(&hex[2..])
    }

    fn encode(object: &StoredObject) -> Vec<u8> {
        let mut out = format!("{} {}\0", object.kind, object.data.len()).into_bytes();
        out.extend_from_slice(&object.data);
        out
    }

    fn decode(id: &ObjectId, raw: &[u8]) -> StoreResult<StoredObject> {
        let corrupt = |reason: &str| StoreError::CorruptObject {
            id: *id,
            reason: reason.to_string(),
        };
        let nul = raw
            .iter()
            .position(|b| *b == 0)
            .ok_or_else(|| corrupt("missing header terminator"))?;
        let header = std::str::from_utf8(&raw[..nul]).map_err(|_| corrupt("header is not UTF-8"))?;
        let (kind, len) = header
            .split_once(' ')
            .ok_or_else(|| corrupt("malformed header"))?;
        let kind: ObjectKind = kind.parse()?;
        let len: usize = len.parse().map_err(|_| corrupt("malformed length"))?;
        let data = &raw[nul + 1..];
        if data.len() != len {
            return Err(corrupt(&format!(
                "length mismatch: header says {len}, found {}",
                data.len()
            )));
        }
        Ok(StoredObject::new(kind, data.to_vec()))
    }
}

impl ObjectStore for FsObjectStore {
    fn read(&self, id: &ObjectId) -> StoreResult<Option<StoredObject>> {
        let raw = match fs::read(self.object_path(id)) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let object = Self::decode(id, &raw)?;
        let computed = object.compute_id();
        if computed != *id {
            return Err(StoreError::HashMismatch { id: *id, computed });
        }
        Ok(Some(object))
    }

    fn write(&self, object: &StoredObject) -> StoreResult<ObjectId> {
        let id = object.compute_id();
        let path = self.object_path(&id);
        if path.exists() {
            return Ok(id);
        }
        let dir = path
            .parent()
            .ok_or_else(|| StoreError::Serialization(format!("no parent for {}", path.display())))?;
        fs::create_dir_all(dir)?;

        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(&Self::encode(object))?;
        tmp.as_file().sync_all()?;
        tmp.persist(&path).map_err(|e| StoreError::Io(e.error))?;
        debug!(id = %id.short_hex(), kind = %object.kind, "object written");
        Ok(id)
    }

    fn exists(&self, id: &ObjectId) -> StoreResult<bool> {
        Ok(self.object_path(id).exists())
    }
}
