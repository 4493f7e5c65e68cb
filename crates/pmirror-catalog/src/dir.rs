use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use pmirror_store::ContentHasher;
use pmirror_types::ContentRef;

use crate::error::{CatalogError, CatalogResult};
use crate::snapshot::{normalize_prefix, SourceEntry, SourceSnapshot};

/// Snapshot over a plain directory, such as an exported upstream checkout.
///
/// Content refs are blob hashes computed while listing. `read_content`
/// re-hashes the file and reports it missing if it changed since listing.
#[derive(Debug)]
pub struct DirectorySnapshot {
    root: PathBuf,
    index: RwLock<HashMap<ContentRef, PathBuf>>,
}

impl DirectorySnapshot {
    pub fn open(root: &Path) -> CatalogResult<Self> {
        if !root.is_dir() {
            return Err(CatalogError::NotFound {
                snapshot: "dir".into(),
                path: root.display().to_string(),
            });
        }
        Ok(Self {
            root: root.to_path_buf(),
            index: RwLock::new(HashMap::new()),
        })
    }

    fn missing(&self, content: &ContentRef) -> CatalogError {
        CatalogError::ContentMissing {
            snapshot: self.describe(),
            content: content.clone(),
        }
    }
}

impl SourceSnapshot for DirectorySnapshot {
    fn list_directory(&self, prefix: &str) -> CatalogResult<Vec<SourceEntry>> {
        let prefix = normalize_prefix(prefix);
        let dir = self.root.join(prefix);
        if !dir.is_dir() {
            return Err(CatalogError::NotFound {
                snapshot: self.describe(),
                path: prefix.to_string(),
            });
        }
        let read_dir = fs::read_dir(&dir)?;

        let mut entries = Vec::new();
        let mut indexed = Vec::new();
        for entry in read_dir {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            let file_type = entry.file_type()?;
            if file_type.is_dir() {
                entries.push(SourceEntry::directory(name));
            } else if file_type.is_file() {
                let data = fs::read(entry.path())?;
                let content = ContentRef::from(ContentHasher::BLOB.hash(&data));
                indexed.push((content.clone(), entry.path()));
                entries.push(SourceEntry::file(name, content));
            }
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));

        self.index
            .write()
            .map_err(|_| CatalogError::Poisoned)?
            .extend(indexed);
        Ok(entries)
    }

    fn read_content(&self, content: &ContentRef) -> CatalogResult<Vec<u8>> {
        let path = self
            .index
            .read()
            .map_err(|_| CatalogError::Poisoned)?
            .get(content)
            .cloned()
            .ok_or_else(|| self.missing(content))?;
        let data = fs::read(&path)?;
        if ContentRef::from(ContentHasher::BLOB.hash(&data)) != *content {
            return Err(self.missing(content));
        }
        Ok(data)
    }

    fn describe(&self) -> String {
        format!("dir:{}", self.root.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_files_and_dirs_sorted() {
        let dir = tempfile::tempdir().unwrap();
        let proto_dir = dir.path().join("docs/plugin-protocol");
        fs::create_dir_all(proto_dir.join("old")).unwrap();
        fs::write(proto_dir.join("tfplugin5.proto"), "five").unwrap();
        fs::write(proto_dir.join("README.md"), "readme").unwrap();

        let snap = DirectorySnapshot::open(dir.path()).unwrap();
        let entries = snap.list_directory("docs/plugin-protocol").unwrap();
        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["README.md", "old", "tfplugin5.proto"]);

        let content = entries[2].content().unwrap();
        assert_eq!(snap.read_content(content).unwrap(), b"five");
    }

    #[test]
    fn missing_prefix_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let snap = DirectorySnapshot::open(dir.path()).unwrap();
        assert!(matches!(
            snap.list_directory("docs/plugin-protocol"),
            Err(CatalogError::NotFound { .. })
        ));
    }

    #[test]
    fn changed_file_is_reported_missing() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("tfplugin6.proto"), "six").unwrap();
        let snap = DirectorySnapshot::open(dir.path()).unwrap();
        let entries = snap.list_directory("").unwrap();
        let content = entries[0].content().unwrap().clone();

        fs::write(dir.path().join("tfplugin6.proto"), "six, edited").unwrap();
        assert!(matches!(
            snap.read_content(&content),
            Err(CatalogError::ContentMissing { .. })
        ));
    }

    #[test]
    fn poisoned_index_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("tfplugin5.proto"), "five").unwrap();
        let snap = std::sync::Arc::new(DirectorySnapshot::open(dir.path()).unwrap());
        let content = snap.list_directory("").unwrap()[0].content().unwrap().clone();

        let holder = std::sync::Arc::clone(&snap);
        let _ = std::thread::spawn(move || {
            let _guard = holder.index.write().unwrap();
            panic!("indexer died holding the lock");
        })
        .join();

        assert!(matches!(snap.read_content(&content), Err(CatalogError::Poisoned)));
        assert!(matches!(snap.list_directory(""), Err(CatalogError::Poisoned)));
    }
}
