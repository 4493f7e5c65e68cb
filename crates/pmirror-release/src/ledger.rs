use pmirror_catalog::VersionCatalog;
use pmirror_refs::{RefStore, TagRef};
use pmirror_types::{ObjectId, Version};
use tracing::debug;

use crate::error::LedgerError;
use crate::naming;

/// Whether a release tag is present in the target repository.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TagStatus {
    Released { target: ObjectId },
    Missing,
}

/// Idempotency gate over the target repository's tags.
///
/// A version counts as released exactly when its tag exists. Lookup failures
/// are errors and never read as "missing".
pub struct ReleaseLedger<'a> {
    refs: &'a dyn RefStore,
}

impl<'a> ReleaseLedger<'a> {
    pub fn new(refs: &'a dyn RefStore) -> Self {
        Self { refs }
    }

    pub fn status(&self, tag: &str) -> Result<TagStatus, LedgerError> {
        let found = self
            .refs
            .read_ref(&TagRef::canonical(tag))
            .map_err(|source| LedgerError {
                tag: tag.to_string(),
                source,
            })?;
        Ok(match found {
            Some(r) => TagStatus::Released { target: r.target },
            None => TagStatus::Missing,
        })
    }

    pub fn has_release(&self, version: &Version) -> Result<bool, LedgerError> {
        Ok(matches!(
            self.status(&naming::tag_name(version))?,
            TagStatus::Released { .. }
        ))
    }

    /// Catalog versions without a tag, ascending.
    pub fn pending(&self, catalog: &VersionCatalog) -> Result<Vec<Version>, LedgerError> {
        let mut pending = Vec::new();
        for version in catalog.versions() {
            if self.has_release(version)? {
                debug!(%version, "already released");
            } else {
                pending.push(*version);
            }
        }
        Ok(pending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pmirror_refs::{InMemoryRefStore, RefError};
    use pmirror_types::ContentRef;

    struct BrokenRefs;

    impl RefStore for BrokenRefs {
        fn read_ref(&self, _name: &str) -> pmirror_refs::Result<Option<TagRef>> {
            Err(RefError::Poisoned)
        }
        fn create_ref(&self, _name: &str, _reference: &TagRef) -> pmirror_refs::Result<()> {
            Err(RefError::Poisoned)
        }
        fn list_refs(&self, _prefix: &str) -> pmirror_refs::Result<Vec<(String, TagRef)>> {
            Err(RefError::Poisoned)
        }
    }

    fn tag(refs: &InMemoryRefStore, name: &str) -> ObjectId {
        let target = ObjectId::from_hash([7; 32]);
        refs.create_ref(&TagRef::canonical(name), &TagRef::new(name, target))
            .unwrap();
        target
    }

    #[test]
    fn status_reflects_existing_tags() {
        let refs = InMemoryRefStore::new();
        let target = tag(&refs, "v5.0.0");
        let ledger = ReleaseLedger::new(&refs);
        assert_eq!(ledger.status("v5.0.0").unwrap(), TagStatus::Released { target });
        assert_eq!(ledger.status("v5.1.0").unwrap(), TagStatus::Missing);
        assert!(ledger.has_release(&Version::new(5, 0, 0)).unwrap());
    }

    #[test]
    fn pending_lists_untagged_versions_in_order() {
        let refs = InMemoryRefStore::new();
        tag(&refs, "v5.0.0");
        let catalog: VersionCatalog = [
            (Version::new(6, 0, 0), ContentRef::new("c")),
            (Version::new(5, 0, 0), ContentRef::new("a")),
            (Version::new(5, 1, 0), ContentRef::new("b")),
        ]
        .into_iter()
        .collect();
        let pending = ReleaseLedger::new(&refs).pending(&catalog).unwrap();
        assert_eq!(pending, [Version::new(5, 1, 0), Version::new(6, 0, 0)]);
    }

    #[test]
    fn lookup_failure_is_not_absence() {
        let ledger = ReleaseLedger::new(&BrokenRefs);
        let err = ledger.status("v5.0.0").unwrap_err();
        assert_eq!(err.tag, "v5.0.0");
        assert!(ledger.has_release(&Version::new(5, 0, 0)).is_err());
    }
}
