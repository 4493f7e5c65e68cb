use std::fmt;

use serde::{Deserialize, Serialize};

use crate::object::ObjectId;

/// Opaque reference to one immutable upstream byte sequence.
///
/// The value is content-derived: a git blob SHA for git-backed sources, the
/// hex blob [`ObjectId`] for directory and in-memory sources. Two refs from
/// the same source compare equal iff their bytes are equal. Only the source
/// that produced a ref can resolve it back to bytes.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentRef(String);

impl ContentRef {
    pub fn new(digest: impl Into<String>) -> Self {
        Self(digest.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Abbreviated form for log lines.
    pub fn short(&self) -> &str {
        let end = self.0.char_indices().nth(8).map_or(self.0.len(), |(i, _)| i);
        &self.0[..end]
    }
}

impl From<ObjectId> for ContentRef {
    fn from(id: ObjectId) -> Self {
        Self(id.to_hex())
    }
}

impl fmt::Debug for ContentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentRef({})", self.short())
    }
}

impl fmt::Display for ContentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_truncates_long_digests() {
        let r = ContentRef::new("0123456789abcdef");
        assert_eq!(r.short(), "01234567");
        assert_eq!(ContentRef::new("abc").short(), "abc");
    }

    #[test]
    fn from_object_id_uses_hex() {
        let id = ObjectId::from_hash([7u8; 32]);
        assert_eq!(ContentRef::from(id).as_str(), id.to_hex());
    }

    #[test]
    fn equality_is_by_value() {
        assert_eq!(ContentRef::new("aa"), ContentRef::new("aa"));
        assert_ne!(ContentRef::new("aa"), ContentRef::new("ab"));
    }
}
