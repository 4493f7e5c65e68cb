use pmirror_catalog::VersionCatalog;
use tracing::debug;

use crate::ledger::ReleaseLedger;

/// Hook for publishing pre-release builds from the upstream development
/// branch alongside stable tags.
///
/// No unstable track exists yet: nothing is read and nothing is written.
#[derive(Clone, Copy, Debug, Default)]
pub struct UnstableTrackManager;

impl UnstableTrackManager {
    pub fn new() -> Self {
        Self
    }

    pub fn synthesize_unstable(&self, catalog: &VersionCatalog, _ledger: &ReleaseLedger<'_>) {
        debug!(versions = catalog.len(), "unstable track not enabled; nothing to publish");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MirrorRepository;
    use pmirror_refs::RefStore;
    use pmirror_types::{ContentRef, Version};

    #[test]
    fn writes_nothing() {
        let repo = MirrorRepository::in_memory();
        let catalog: VersionCatalog = [(Version::new(5, 0, 0), ContentRef::new("abc"))]
            .into_iter()
            .collect();
        UnstableTrackManager::new().synthesize_unstable(&catalog, &repo.ledger());
        assert!(repo.refs().tags().unwrap().is_empty());
    }
}
