//! Idempotent, per-version release publication.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use pmirror_catalog::{SourceSnapshot, VersionCatalog};
use pmirror_refs::{RefError, TagRef};
use pmirror_store::{Commit, ObjectKind, StoreResult, StoredObject, Tag};
use pmirror_types::{ContentRef, ObjectId, Signature, Version};
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::config::{AuthorConfig, MirrorConfig};
use crate::error::{ReleaseError, SynthesisError};
use crate::generator::{GenerationJob, Generator};
use crate::ledger::{ReleaseLedger, TagStatus};
use crate::naming;
use crate::repository::MirrorRepository;
use crate::staging::{StagedRelease, StagingArea};
use crate::tree_builder::ObjectTreeBuilder;

/// A release written by this run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Release {
    pub version: Version,
    pub tag: String,
    pub module_path: String,
    pub tree: ObjectId,
    pub commit: ObjectId,
    pub tag_id: ObjectId,
    pub author: Signature,
    pub message: String,
}

#[derive(Debug)]
pub struct VersionFailure {
    pub version: Version,
    pub error: ReleaseError,
}

/// Outcome of one synthesis pass. Every catalog version ends up in exactly
/// one list unless the run was stopped early.
#[derive(Debug, Default)]
pub struct SynthesisReport {
    pub created: Vec<Release>,
    pub skipped: Vec<Version>,
    pub failed: Vec<VersionFailure>,
    /// Set when a stop was requested before every version was visited.
    pub stopped: bool,
}

impl SynthesisReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

enum Published {
    Created(Release),
    AlreadyTagged,
}

/// Publishes every catalog version that has no tag yet.
///
/// Versions are processed one at a time in ascending order. A failure in one
/// version is recorded and the next version proceeds. Objects are written
/// tree, commit, tag, and the tag ref is created last, so a version either
/// gets a complete release or no ref at all.
pub struct ReleaseSynthesizer<'a> {
    repo: &'a MirrorRepository,
    source: &'a dyn SourceSnapshot,
    generator: &'a dyn Generator,
    staging: StagingArea,
    module_prefix: String,
    author: AuthorConfig,
    stop: Option<Arc<AtomicBool>>,
}

impl<'a> ReleaseSynthesizer<'a> {
    pub fn new(
        repo: &'a MirrorRepository,
        source: &'a dyn SourceSnapshot,
        generator: &'a dyn Generator,
        config: &MirrorConfig,
    ) -> Self {
        Self {
            repo,
            source,
            generator,
            staging: StagingArea::new(config.staging_root.clone()),
            module_prefix: config.module_prefix.clone(),
            author: config.author.clone(),
            stop: None,
        }
    }

    /// Checked between versions; a version already in progress completes.
    pub fn with_stop_signal(mut self, stop: Arc<AtomicBool>) -> Self {
        self.stop = Some(stop);
        self
    }

    fn stop_requested(&self) -> bool {
        self.stop
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::SeqCst))
    }

    pub fn synthesize(
        &self,
        catalog: &VersionCatalog,
        ledger: &ReleaseLedger<'_>,
    ) -> Result<SynthesisReport, SynthesisError> {
        let mut report = SynthesisReport::default();

        for (version, content) in catalog.iter() {
            if self.stop_requested() {
                warn!(next = %version, "stop requested; ending run early");
                report.stopped = true;
                break;
            }

            let tag = naming::tag_name(version);
            let status = ledger
                .status(&tag)
                .map_err(|source| SynthesisError::Ledger {
                    version: *version,
                    source,
                })?;
            if let TagStatus::Released { target } = status {
                debug!(%tag, target = %target.short_hex(), "already released; skipping");
                report.skipped.push(*version);
                continue;
            }

            match self.release_version(version, &tag, content) {
                Ok(Published::Created(release)) => {
                    info!(
                        %tag,
                        module = %release.module_path,
                        commit = %release.commit.short_hex(),
                        "release created"
                    );
                    report.created.push(release);
                }
                Ok(Published::AlreadyTagged) => report.skipped.push(*version),
                Err(err) => {
                    error!(%version, category = err.category(), error = %err, "release failed");
                    report.failed.push(VersionFailure {
                        version: *version,
                        error: err,
                    });
                }
            }
        }

        info!(
            created = report.created.len(),
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            "synthesis finished"
        );
        Ok(report)
    }

    fn release_version(
        &self,
        version: &Version,
        tag: &str,
        content: &ContentRef,
    ) -> Result<Published, ReleaseError> {
        let definition = self
            .source
            .read_content(content)
            .map_err(ReleaseError::Source)?;

        let module_path = naming::module_path(&self.module_prefix, version);
        let package = naming::package_dir_name(version);
        let proto_file = naming::proto_file_name(version);

        let build = self.staging.create(version).map_err(ReleaseError::Staging)?;
        StagedRelease::new()
            .with_file(&format!("{package}/{proto_file}"), definition)
            .write_to(build.path())
            .map_err(ReleaseError::Staging)?;

        let package_dir = build.path().join(&package);
        let job = GenerationJob {
            version: *version,
            root: build.path(),
            package_dir: &package_dir,
            module_path: &module_path,
            proto_file: &proto_file,
        };
        info!(%version, module = %module_path, "generating module");
        self.generator.generate(&job)?;

        let staged = StagedRelease::load(build.path()).map_err(ReleaseError::Staging)?;
        let build_path = build.path().to_path_buf();
        if let Err(err) = build.close() {
            warn!(path = %build_path.display(), error = %err, "failed to remove build directory");
        }

        let tree = ObjectTreeBuilder::new(self.repo.store())
            .build(&staged)
            .map_err(|source| ReleaseError::ObjectWrite {
                kind: ObjectKind::Tree,
                source,
            })?;

        let signature = Signature::now(&self.author.name, &self.author.email);
        let message = naming::commit_message(version);
        let commit = Commit {
            tree,
            author: signature.clone(),
            committer: signature.clone(),
            message: message.clone(),
        };
        let commit_id = self.write_object(ObjectKind::Commit, commit.to_stored_object())?;

        let tag_object = Tag {
            name: tag.to_string(),
            target: commit_id,
            tagger: signature.clone(),
            message: message.clone(),
        };
        let tag_id = self.write_object(ObjectKind::Tag, tag_object.to_stored_object())?;

        match self
            .repo
            .refs()
            .create_ref(&TagRef::canonical(tag), &TagRef::new(tag, tag_id))
        {
            Ok(()) => Ok(Published::Created(Release {
                version: *version,
                tag: tag.to_string(),
                module_path,
                tree,
                commit: commit_id,
                tag_id,
                author: signature,
                message,
            })),
            Err(RefError::AlreadyExists { .. }) => {
                warn!(%tag, "tag was created by a concurrent run; skipping");
                Ok(Published::AlreadyTagged)
            }
            Err(source) => Err(ReleaseError::TagWrite {
                tag: tag.to_string(),
                source,
            }),
        }
    }

    fn write_object(
        &self,
        kind: ObjectKind,
        object: StoreResult<StoredObject>,
    ) -> Result<ObjectId, ReleaseError> {
        object
            .and_then(|obj| self.repo.store().write(&obj))
            .map_err(|source| ReleaseError::ObjectWrite { kind, source })
    }
}
