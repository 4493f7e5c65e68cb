//! Release synthesis for pmirror.
//!
//! Given a [`VersionCatalog`](pmirror_catalog::VersionCatalog) discovered
//! upstream, the [`ReleaseSynthesizer`] publishes one immutable release per
//! protocol version into a [`MirrorRepository`]:
//!
//! 1. [`ReleaseLedger`] skips versions whose tag already exists.
//! 2. The protocol file is staged into a scoped temp directory and handed to
//!    a [`Generator`] that fills in the generated sources.
//! 3. [`ObjectTreeBuilder`] turns the staged output into a content-addressed
//!    tree.
//! 4. A commit and an annotated tag are written, in that order, and the tag
//!    ref is created last.
//!
//! Re-running against unchanged upstream content publishes nothing new.

pub mod config;
pub mod error;
pub mod generator;
pub mod ledger;
pub mod naming;
pub mod repository;
pub mod staging;
pub mod synthesizer;
pub mod tree_builder;
pub mod unstable;

pub use config::{AuthorConfig, CommandStep, GeneratorConfig, MirrorConfig, StepDir};
pub use error::{
    ConfigError, GenerateError, LedgerError, ReleaseError, RepositoryError, SynthesisError,
};
pub use generator::{CommandGenerator, GenerationJob, Generator};
pub use ledger::{ReleaseLedger, TagStatus};
pub use repository::{MirrorRepository, PublishedRelease};
pub use staging::{StagedEntry, StagedRelease, StagingArea};
pub use synthesizer::{Release, ReleaseSynthesizer, SynthesisReport, VersionFailure};
pub use tree_builder::ObjectTreeBuilder;
pub use unstable::UnstableTrackManager;
