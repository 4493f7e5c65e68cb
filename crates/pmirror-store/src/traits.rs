use pmirror_types::ObjectId;

use crate::error::StoreResult;
use crate::object::StoredObject;

/// Content-addressed object store.
///
/// All implementations must satisfy these invariants:
/// - Objects are immutable once written; the same data always produces the
///   same id.
/// - `write` returns only after the object is durable for this backend.
/// - Concurrent reads are always safe.
/// - All I/O errors are propagated, never silently ignored.
pub trait ObjectStore: Send + Sync {
    /// Read an object by id. Returns `Ok(None)` if it does not exist.
    fn read(&self, id: &ObjectId) -> StoreResult<Option<StoredObject>>;

    /// Write an object and return its id. Writing existing content is a no-op.
    fn write(&self, object: &StoredObject) -> StoreResult<ObjectId>;

    fn exists(&self, id: &ObjectId) -> StoreResult<bool>;

    /// Write several objects in order, stopping at the first failure.
    fn write_batch(&self, objects: &[StoredObject]) -> StoreResult<Vec<ObjectId>> {
        objects.iter().map(|obj| self.write(obj)).collect()
    }
}
