//! Protocol version discovery.

use std::collections::BTreeMap;

use pmirror_types::{ContentRef, Version};
use tracing::{debug, info};

use crate::error::CatalogResult;
use crate::snapshot::{SourceSnapshot, SourceEntryKind};

pub const PROTO_FILE_PREFIX: &str = "tfplugin";
pub const PROTO_FILE_SUFFIX: &str = ".proto";

/// Version defined by a protocol file name, if it follows the
/// `tfplugin<digits>.proto` pattern.
///
/// The numeric suffix is the minor-less protocol major; `.0` is appended
/// before parsing, so `tfplugin5.proto` defines `5.0.0`. Names outside the
/// pattern, or whose suffix does not parse (`tfplugin.proto`,
/// `tfplugin05.proto`), yield `None`.
pub fn protocol_version_for(file_name: &str) -> Option<Version> {
    let digits = file_name
        .strip_prefix(PROTO_FILE_PREFIX)?
        .strip_suffix(PROTO_FILE_SUFFIX)?;
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Version::parse(&format!("{digits}.0")).ok()
}

/// Protocol versions declared by one upstream snapshot.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VersionCatalog {
    entries: BTreeMap<Version, ContentRef>,
}

impl VersionCatalog {
    /// Walk the immediate children of `prefix` and collect protocol files.
    ///
    /// Non-matching entries are skipped. Entries are visited in
    /// (name, content) order, so if two entries map to one version the later
    /// one wins regardless of how the snapshot enumerates them.
    pub fn discover(snapshot: &dyn SourceSnapshot, prefix: &str) -> CatalogResult<Self> {
        let mut listing = snapshot.list_directory(prefix)?;
        listing.sort_by(|a, b| {
            a.name
                .cmp(&b.name)
                .then_with(|| a.content().cmp(&b.content()))
        });

        let mut entries = BTreeMap::new();
        for entry in listing {
            let SourceEntryKind::File(content) = entry.kind else {
                continue;
            };
            match protocol_version_for(&entry.name) {
                Some(version) => {
                    debug!(file = %entry.name, %version, content = %content.short(), "protocol definition found");
                    entries.insert(version, content);
                }
                None => debug!(file = %entry.name, "not a protocol definition; skipped"),
            }
        }

        info!(
            snapshot = %snapshot.describe(),
            prefix,
            versions = entries.len(),
            "catalog discovered"
        );
        Ok(Self { entries })
    }

    pub fn get(&self, version: &Version) -> Option<&ContentRef> {
        self.entries.get(version)
    }

    /// Entries in ascending version order.
    pub fn iter(&self) -> impl Iterator<Item = (&Version, &ContentRef)> {
        self.entries.iter()
    }

    pub fn versions(&self) -> impl Iterator<Item = &Version> {
        self.entries.keys()
    }

    pub fn latest(&self) -> Option<&Version> {
        self.entries.keys().next_back()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(Version, ContentRef)> for VersionCatalog {
    fn from_iter<I: IntoIterator<Item = (Version, ContentRef)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CatalogError, CatalogResult};
    use crate::memory::InMemorySnapshot;
    use crate::snapshot::SourceEntry;

    const DIR: &str = "docs/plugin-protocol";

    #[test]
    fn file_name_pattern() {
        assert_eq!(protocol_version_for("tfplugin5.proto"), Some(Version::new(5, 0, 0)));
        assert_eq!(protocol_version_for("tfplugin12.proto"), Some(Version::new(12, 0, 0)));
        assert_eq!(protocol_version_for("tfplugin.proto"), None);
        assert_eq!(protocol_version_for("tfplugin05.proto"), None);
        assert_eq!(protocol_version_for("tfplugin5.1.proto"), None);
        assert_eq!(protocol_version_for("tfplugin5.proto.orig"), None);
        assert_eq!(protocol_version_for("README.md"), None);
    }

    #[test]
    fn unrelated_files_are_skipped() {
        let snap = InMemorySnapshot::new("upstream")
            .with_file(&format!("{DIR}/tfplugin5.proto"), "five")
            .with_file(&format!("{DIR}/README.md"), "docs")
            .with_file(&format!("{DIR}/tfplugin.proto"), "generic");
        let catalog = VersionCatalog::discover(&snap, DIR).unwrap();

        assert_eq!(catalog.len(), 1);
        let content = catalog.get(&Version::new(5, 0, 0)).unwrap();
        assert_eq!(snap.read_content(content).unwrap(), b"five");
    }

    #[test]
    fn walks_exactly_one_level() {
        let snap = InMemorySnapshot::new("upstream")
            .with_file(&format!("{DIR}/tfplugin5.proto"), "five")
            .with_file(&format!("{DIR}/archive/tfplugin4.proto"), "four");
        let catalog = VersionCatalog::discover(&snap, DIR).unwrap();
        let versions: Vec<_> = catalog.versions().copied().collect();
        assert_eq!(versions, [Version::new(5, 0, 0)]);
    }

    #[test]
    fn missing_prefix_is_not_found() {
        let snap = InMemorySnapshot::new("upstream").with_file("main.go", "package main");
        assert!(matches!(
            VersionCatalog::discover(&snap, DIR),
            Err(CatalogError::NotFound { .. })
        ));
    }

    #[test]
    fn iterates_in_version_order() {
        let snap = InMemorySnapshot::new("upstream")
            .with_file(&format!("{DIR}/tfplugin6.proto"), "six")
            .with_file(&format!("{DIR}/tfplugin10.proto"), "ten")
            .with_file(&format!("{DIR}/tfplugin5.proto"), "five");
        let catalog = VersionCatalog::discover(&snap, DIR).unwrap();
        let majors: Vec<_> = catalog.versions().map(|v| v.major).collect();
        assert_eq!(majors, [5, 6, 10]);
        assert_eq!(catalog.latest(), Some(&Version::new(10, 0, 0)));
    }

    /// Snapshot that hands out its listing in a fixed, caller-chosen order.
    struct OrderedSnapshot(Vec<SourceEntry>);

    impl SourceSnapshot for OrderedSnapshot {
        fn list_directory(&self, _prefix: &str) -> CatalogResult<Vec<SourceEntry>> {
            Ok(self.0.clone())
        }

        fn read_content(&self, content: &ContentRef) -> CatalogResult<Vec<u8>> {
            Ok(content.as_str().as_bytes().to_vec())
        }

        fn describe(&self) -> String {
            "ordered".into()
        }
    }

    #[test]
    fn duplicate_versions_resolve_independent_of_enumeration_order() {
        // Both names pass the prefix/suffix test; only one may define 7.0.
        let a = SourceEntry::file("tfplugin7.proto", ContentRef::new("first"));
        let b = SourceEntry::file("tfplugin7.proto", ContentRef::new("second"));
        let forward = OrderedSnapshot(vec![a.clone(), b.clone()]);
        let backward = OrderedSnapshot(vec![b, a]);

        let one = VersionCatalog::discover(&forward, DIR).unwrap();
        let two = VersionCatalog::discover(&backward, DIR).unwrap();
        assert_eq!(one.len(), 1);
        assert_eq!(one, two);
        assert_eq!(
            one.get(&Version::new(7, 0, 0)),
            Some(&ContentRef::new("second"))
        );
    }

    #[test]
    fn directories_named_like_protocols_are_ignored() {
        let snap = OrderedSnapshot(vec![SourceEntry::directory("tfplugin5.proto")]);
        assert!(VersionCatalog::discover(&snap, DIR).unwrap().is_empty());
    }
}
