//! Upstream sources and protocol version discovery.
//!
//! An upstream source is any history that can present a read-only snapshot
//! of its tree at one point in time. The catalog walks one directory of such
//! a snapshot and maps every `tfplugin<N>.proto` file to the protocol
//! version it defines.
//!
//! # Snapshots
//!
//! All snapshots implement [`SourceSnapshot`]:
//!
//! - [`InMemorySnapshot`] -- path/bytes map for tests
//! - [`DirectorySnapshot`] -- a checked-out directory on disk
//! - [`GitSnapshot`] -- one commit of a local git repository, obtained from
//!   [`GitSource`]

pub mod catalog;
pub mod dir;
pub mod error;
pub mod git;
pub mod memory;
pub mod snapshot;

pub use catalog::{protocol_version_for, VersionCatalog, PROTO_FILE_PREFIX, PROTO_FILE_SUFFIX};
pub use dir::DirectorySnapshot;
pub use error::{CatalogError, CatalogResult};
pub use git::{GitSnapshot, GitSource, StablePoint};
pub use memory::InMemorySnapshot;
pub use snapshot::{SourceEntry, SourceEntryKind, SourceSnapshot};
