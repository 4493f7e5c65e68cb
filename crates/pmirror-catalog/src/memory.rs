use std::collections::{BTreeMap, HashMap};

use pmirror_store::ContentHasher;
use pmirror_types::ContentRef;

use crate::error::{CatalogError, CatalogResult};
use crate::snapshot::{normalize_prefix, SourceEntry, SourceSnapshot};

/// Snapshot backed by an in-memory path -> bytes map.
///
/// Paths are `/`-separated; directories exist implicitly through the files
/// beneath them.
#[derive(Debug, Default, Clone)]
pub struct InMemorySnapshot {
    label: String,
    files: BTreeMap<String, ContentRef>,
    contents: HashMap<ContentRef, Vec<u8>>,
}

impl InMemorySnapshot {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Self::default()
        }
    }

    pub fn with_file(mut self, path: &str, data: impl Into<Vec<u8>>) -> Self {
        self.insert(path, data);
        self
    }

    pub fn insert(&mut self, path: &str, data: impl Into<Vec<u8>>) -> ContentRef {
        let data = data.into();
        let content = ContentRef::from(ContentHasher::BLOB.hash(&data));
        self.files
            .insert(normalize_prefix(path).to_string(), content.clone());
        self.contents.insert(content.clone(), data);
        content
    }
}

impl SourceSnapshot for InMemorySnapshot {
    fn list_directory(&self, prefix: &str) -> CatalogResult<Vec<SourceEntry>> {
        let prefix = normalize_prefix(prefix);
        let mut children: BTreeMap<&str, SourceEntry> = BTreeMap::new();

        for (path, content) in &self.files {
            let rest = if prefix.is_empty() {
                path.as_str()
            } else {
                match path
                    .strip_prefix(prefix)
                    .and_then(|r| r.strip_prefix('/'))
                {
                    Some(rest) => rest,
                    None => continue,
                }
            };
            match rest.split_once('/') {
                Some((dir, _)) => {
                    children
                        .entry(dir)
                        .or_insert_with(|| SourceEntry::directory(dir));
                }
                None => {
                    children.insert(rest, SourceEntry::file(rest, content.clone()));
                }
            }
        }

        if children.is_empty() && !prefix.is_empty() {
            return Err(CatalogError::NotFound {
                snapshot: self.describe(),
                path: prefix.to_string(),
            });
        }
        Ok(children.into_values().collect())
    }

    fn read_content(&self, content: &ContentRef) -> CatalogResult<Vec<u8>> {
        self.contents
            .get(content)
            .cloned()
            .ok_or_else(|| CatalogError::ContentMissing {
                snapshot: self.describe(),
                content: content.clone(),
            })
    }

    fn describe(&self) -> String {
        format!("memory:{}", self.label)
    }
}
