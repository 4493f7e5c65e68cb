//! Content-addressed object storage for pmirror.
//!
//! This crate implements a hash-keyed object store analogous to git's
//! `.git/objects/` directory. Release artifacts are stored as immutable
//! objects identified by their BLAKE3 hash, domain-separated by object kind.
//!
//! # Object Types
//!
//! - [`Blob`] -- raw file contents
//! - [`Tree`] -- directory listing mapping names to object references
//! - [`Commit`] -- a root tree plus authorship and message
//! - [`Tag`] -- an annotated, named pointer at a commit
//!
//! # Storage Backends
//!
//! All backends implement the [`ObjectStore`] trait:
//!
//! - [`InMemoryObjectStore`] -- `HashMap`-based store for tests and embedding
//! - [`FsObjectStore`] -- loose objects under `objects/xx/yyyy...`
//!
//! # Design Rules
//!
//! 1. Objects are immutable once written (content-addressing guarantees this).
//! 2. Writes are idempotent: writing existing content returns the existing id.
//! 3. Callers write children before parents (blob, tree, commit, tag), so a
//!    reachable id never names a missing object.
//! 4. All I/O errors are propagated, never silently ignored.

pub mod error;
pub mod fs;
pub mod hasher;
pub mod memory;
pub mod object;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use fs::FsObjectStore;
pub use hasher::ContentHasher;
pub use memory::InMemoryObjectStore;
pub use object::{Blob, Commit, EntryMode, ObjectKind, StoredObject, Tag, Tree, TreeEntry};
pub use traits::ObjectStore;
