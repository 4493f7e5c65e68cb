use pmirror_types::ObjectId;

/// Domain-separated BLAKE3 content hasher.
///
/// Each hasher carries a domain tag (e.g. `"pmirror-blob-v1"`) that is
/// prepended to every hash computation, so a blob and a tree with identical
/// bytes produce different ids.
pub struct ContentHasher {
    domain: &'static str,
}

impl ContentHasher {
    pub const BLOB: Self = Self::new("pmirror-blob-v1");
    pub const TREE: Self = Self::new("pmirror-tree-v1");
    pub const COMMIT: Self = Self::new("pmirror-commit-v1");
    pub const TAG: Self = Self::new("pmirror-tag-v1");

    pub const fn new(domain: &'static str) -> Self {
        Self { domain }
    }

    /// Hash raw bytes with domain separation.
    pub fn hash(&self, data: &[u8]) -> ObjectId {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.domain.as_bytes());
        hasher.update(b":");
        hasher.update(data);
        ObjectId::from_hash(*hasher.finalize().as_bytes())
    }

    pub fn domain(&self) -> &str {
        self.domain
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_deterministic() {
        assert_eq!(
            ContentHasher::BLOB.hash(b"syntax = \"proto3\";"),
            ContentHasher::BLOB.hash(b"syntax = \"proto3\";")
        );
    }

    #[test]
    fn domains_separate_identical_bytes() {
        let data = b"same content";
        let ids = [
            ContentHasher::BLOB.hash(data),
            ContentHasher::TREE.hash(data),
            ContentHasher::COMMIT.hash(data),
            ContentHasher::TAG.hash(data),
        ];
        for (i, a) in ids.iter().enumerate() {
            for b in &ids[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn domain_hash_differs_from_raw_blake3() {
        let raw = *blake3::hash(b"x").as_bytes();
        assert_ne!(ContentHasher::BLOB.hash(b"x").as_bytes(), &raw);
    }
}
