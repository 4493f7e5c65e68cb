use serde::{Deserialize, Serialize};
use pmirror_types::ObjectId;

/// Namespace holding release tags.
pub const TAGS_PREFIX: &str = "refs/tags/";

/// A named, immutable pointer at an annotated tag object.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagRef {
    /// Short tag name, e.g. `v5.0.0`.
    pub name: String,
    /// Id of the tag object.
    pub target: ObjectId,
}

impl TagRef {
    pub fn new(name: impl Into<String>, target: ObjectId) -> Self {
        Self {
            name: name.into(),
            target,
        }
    }

    /// Canonical name for a short tag name (`v5.0.0` -> `refs/tags/v5.0.0`).
    pub fn canonical(name: &str) -> String {
        format!("{TAGS_PREFIX}{name}")
    }

    pub fn canonical_name(&self) -> String {
        Self::canonical(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_name_uses_tags_namespace() {
        let tag = TagRef::new("v5.1.0", ObjectId::from_hash([0; 32]));
        assert_eq!(tag.canonical_name(), "refs/tags/v5.1.0");
        assert_eq!(TagRef::canonical("v6.0.0"), "refs/tags/v6.0.0");
    }
}
