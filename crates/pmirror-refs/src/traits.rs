//! The [`RefStore`] trait defining the reference storage interface.

use crate::error::Result;
use crate::types::{TagRef, TAGS_PREFIX};

/// Storage backend for named references.
///
/// Implementations must be thread-safe and make `create_ref` atomic with
/// respect to concurrent creators of the same name: exactly one succeeds,
/// every other caller receives `AlreadyExists`.
pub trait RefStore: Send + Sync {
    /// Read a ref by canonical name (e.g. `refs/tags/v5.0.0`).
    ///
    /// Returns `Ok(None)` if the ref does not exist. Any other failure is an
    /// error and must not be reported as absence.
    fn read_ref(&self, name: &str) -> Result<Option<TagRef>>;

    /// Create a ref. Fails with `AlreadyExists` if the name is taken.
    fn create_ref(&self, name: &str, reference: &TagRef) -> Result<()>;

    /// List refs whose canonical name starts with `prefix`, sorted by name.
    fn list_refs(&self, prefix: &str) -> Result<Vec<(String, TagRef)>>;

    fn tags(&self) -> Result<Vec<(String, TagRef)>> {
        self.list_refs(TAGS_PREFIX)
    }
}
