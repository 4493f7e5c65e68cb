//! Foundation types for pmirror.
//!
//! This crate provides the identity and value types shared by every other
//! pmirror crate.
//!
//! # Key Types
//!
//! - [`Version`] -- Protocol version triple (`major.minor.build`)
//! - [`ContentRef`] -- Opaque, content-derived reference to one upstream file
//! - [`ObjectId`] -- Content-addressed identifier (BLAKE3 hash)
//! - [`Signature`] -- Author/committer/tagger identity with a timestamp

pub mod content;
pub mod error;
pub mod object;
pub mod signature;
pub mod version;

pub use content::ContentRef;
pub use error::TypeError;
pub use object::ObjectId;
pub use signature::Signature;
pub use version::Version;
