use pmirror_store::{Blob, EntryMode, ObjectStore, StoreResult, Tree, TreeEntry};
use pmirror_types::ObjectId;
use tracing::trace;

use crate::staging::{StagedEntry, StagedRelease};

/// Writes a staged directory into an object store, bottom-up, and returns
/// the root tree id.
///
/// The id depends only on names, contents and modes. Enumeration order on
/// disk, timestamps and ownership never reach the store.
pub struct ObjectTreeBuilder<'a> {
    store: &'a dyn ObjectStore,
}

impl<'a> ObjectTreeBuilder<'a> {
    pub fn new(store: &'a dyn ObjectStore) -> Self {
        Self { store }
    }

    pub fn build(&self, staged: &StagedRelease) -> StoreResult<ObjectId> {
        let mut entries = Vec::with_capacity(staged.len());
        for (name, entry) in staged.entries() {
            let (mode, id) = match entry {
                StagedEntry::File { data, executable } => {
                    let mode = if *executable {
                        EntryMode::Executable
                    } else {
                        EntryMode::Regular
                    };
                    (mode, self.write_blob(data)?)
                }
                StagedEntry::Symlink { target } => (EntryMode::Symlink, self.write_blob(target)?),
                StagedEntry::Dir(sub) => (EntryMode::Directory, self.build(sub)?),
            };
            entries.push(TreeEntry::new(mode, name, id));
        }
        let tree = Tree::new(entries);
        let id = self.store.write(&tree.to_stored_object()?)?;
        trace!(%id, entries = tree.len(), "wrote tree");
        Ok(id)
    }

    fn write_blob(&self, data: &[u8]) -> StoreResult<ObjectId> {
        self.store.write(&Blob::new(data.to_vec()).to_stored_object())
    }
}
