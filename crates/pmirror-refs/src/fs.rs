//! File-backed reference store.
//!
//! Each ref is a file under `<root>/` whose path is the canonical ref name
//! (`<root>/refs/tags/v5.0.0`) and whose content is the hex target id.
//! Creation writes a temp file and links it into place without clobbering,
//! so concurrent creators of one tag race on the filesystem and exactly one
//! wins.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use pmirror_types::ObjectId;
use tempfile::NamedTempFile;
use tracing::debug;
use walkdir::WalkDir;

use crate::error::{RefError, Result};
use crate::names::validate_tag_name;
use crate::traits::RefStore;
use crate::types::{TagRef, TAGS_PREFIX};

#[derive(Debug)]
pub struct FsRefStore {
    root: PathBuf,
}

impl FsRefStore {
    /// Open (or create) the ref namespace under `root`.
    pub fn open(root: &Path) -> Result<Self> {
        fs::create_dir_all(root.join(TAGS_PREFIX))?;
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    fn ref_path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    fn short_name(name: &str) -> &str {
        name.strip_prefix(TAGS_PREFIX).unwrap_or(name)
    }

    fn load(&self, name: &str, path: &Path) -> Result<TagRef> {
        let raw = fs::read_to_string(path)?;
        let target = ObjectId::from_hex(raw.trim()).map_err(|e| RefError::Corrupt {
            name: name.to_string(),
            reason: e.to_string(),
        })?;
        Ok(TagRef::new(Self::short_name(name), target))
    }
}

impl RefStore for FsRefStore {
    fn read_ref(&self, name: &str) -> Result<Option<TagRef>> {
        let path = self.ref_path(name);
        match self.load(name, &path) {
            Ok(tag) => Ok(Some(tag)),
            Err(RefError::Io(e)) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn create_ref(&self, name: &str, reference: &TagRef) -> Result<()> {
        validate_tag_name(&reference.name)?;
        let path = self.ref_path(name);
        let dir = path.parent().ok_or_else(|| RefError::InvalidName {
            name: name.to_string(),
            reason: "ref has no parent directory".into(),
        })?;
        fs::create_dir_all(dir)?;

        let mut tmp = NamedTempFile::new_in(dir)?;
        writeln!(tmp, "{}", reference.target)?;
        tmp.as_file().sync_all()?;
        match tmp.persist_noclobber(&path) {
            Ok(_) => {
                debug!(name, target = %reference.target.short_hex(), "ref created");
                Ok(())
            }
            Err(e) if e.error.kind() == ErrorKind::AlreadyExists => Err(RefError::AlreadyExists {
                name: name.to_string(),
            }),
            Err(e) => Err(RefError::Io(e.error)),
        }
    }

    fn list_refs(&self, prefix: &str) -> Result<Vec<(String, TagRef)>> {
        let refs_root = self.root.join("refs");
        let mut result = Vec::new();
        for entry in WalkDir::new(&refs_root).follow_links(false) {
            let entry = entry.map_err(|e| {
                RefError::Io(e.into_io_error().unwrap_or_else(|| ErrorKind::Other.into()))
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let relative = entry
                .path()
                .strip_prefix(&self.root)
                .map_err(|_| RefError::Corrupt {
                    name: entry.path().display().to_string(),
                    reason: "ref outside store root".into(),
                })?;
            let name = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            // Leftover temp files from an interrupted create are not refs.
            if name.starts_with(prefix) && validate_tag_name(Self::short_name(&name)).is_ok() {
                let tag = self.load(&name, entry.path())?;
                result.push((name, tag));
            }
        }
        result.sort_by(|(a, _), (b, _)| a.cmp(b));
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> (tempfile::TempDir, FsRefStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = FsRefStore::open(dir.path()).unwrap();
        (dir, store)
    }

    fn tag(name: &str, seed: u8) -> TagRef {
        TagRef::new(name, ObjectId::from_hash([seed; 32]))
    }

    #[test]
    fn create_read_and_reopen() {
        let (dir, store) = temp_store();
        let t = tag("v5.0.0", 1);
        store.create_ref(&t.canonical_name(), &t).unwrap();
        drop(store);

        let reopened = FsRefStore::open(dir.path()).unwrap();
        assert_eq!(reopened.read_ref("refs/tags/v5.0.0").unwrap(), Some(t));
    }

    #[test]
    fn absent_ref_is_none_not_error() {
        let (_dir, store) = temp_store();
        assert!(store.read_ref("refs/tags/v1.0.0").unwrap().is_none());
    }

    #[test]
    fn corrupt_ref_is_an_error_not_absence() {
        let (dir, store) = temp_store();
        fs::write(dir.path().join("refs/tags/v5.0.0"), "not-hex\n").unwrap();
        assert!(matches!(
            store.read_ref("refs/tags/v5.0.0"),
            Err(RefError::Corrupt { .. })
        ));
    }

    #[test]
    fn second_create_does_not_clobber() {
        let (_dir, store) = temp_store();
        let first = tag("v5.1.0", 1);
        store.create_ref(&first.canonical_name(), &first).unwrap();
        let err = store
            .create_ref(&first.canonical_name(), &tag("v5.1.0", 2))
            .unwrap_err();
        assert!(matches!(err, RefError::AlreadyExists { .. }));
        assert_eq!(store.read_ref("refs/tags/v5.1.0").unwrap(), Some(first));
    }

    #[test]
    fn lists_nested_tags_sorted() {
        let (_dir, store) = temp_store();
        for (name, seed) in [("v6.0.0", 1), ("unstable/v5.2", 2), ("v5.0.0", 3)] {
            let t = tag(name, seed);
            store.create_ref(&t.canonical_name(), &t).unwrap();
        }
        let tags = store.tags().unwrap();
        let names: Vec<_> = tags.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(
            names,
            [
                "refs/tags/unstable/v5.2",
                "refs/tags/v5.0.0",
                "refs/tags/v6.0.0"
            ]
        );
        assert_eq!(tags[0].1.name, "unstable/v5.2");
    }
}
