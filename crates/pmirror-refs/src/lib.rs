//! Reference management for pmirror.
//!
//! References are the human-readable entry points into the object store,
//! analogous to git refs. pmirror publishes exactly one kind: release tags
//! under `refs/tags/`, each pointing at an annotated tag object.
//!
//! Tags are immutable. Creating a tag that already exists fails with
//! [`RefError::AlreadyExists`]; this is the single serialization point that
//! keeps two concurrent runs from publishing two different releases for the
//! same version.
//!
//! # Modules
//!
//! - [`error`] -- Error types for ref operations
//! - [`types`] -- [`TagRef`]
//! - [`traits`] -- The [`RefStore`] trait defining the storage interface
//! - [`names`] -- Ref name validation
//! - [`memory`] -- In-memory [`InMemoryRefStore`] for tests
//! - [`fs`] -- On-disk [`FsRefStore`]

pub mod error;
pub mod fs;
pub mod memory;
pub mod names;
pub mod traits;
pub mod types;

pub use error::{RefError, Result};
pub use fs::FsRefStore;
pub use memory::InMemoryRefStore;
pub use names::validate_tag_name;
pub use traits::RefStore;
pub use types::{TagRef, TAGS_PREFIX};
