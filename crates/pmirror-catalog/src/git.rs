//! Upstream history read through the system `git` binary.
//!
//! Every command runs with `-C <repo>`, a cleared environment (only `PATH`
//! and `HOME` survive) and config overrides, so user configuration cannot
//! change what is read. Fetching is left to the caller; this module only
//! reads objects that are already present locally.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use pmirror_types::ContentRef;
use tracing::debug;

use crate::error::{CatalogError, CatalogResult};
use crate::snapshot::{normalize_prefix, SourceEntry, SourceSnapshot};

/// The newest stable release of the upstream repository.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StablePoint {
    pub tag: String,
    pub version: semver::Version,
    pub commit: String,
}

/// Handle on a local upstream repository (bare or with a work tree).
#[derive(Clone, Debug)]
pub struct GitSource {
    repo_path: PathBuf,
}

impl GitSource {
    pub fn open(path: &Path) -> CatalogResult<Self> {
        let source = Self {
            repo_path: path.to_path_buf(),
        };
        let output = source.run(&["rev-parse", "--git-dir"])?;
        if !output.status.success() {
            return Err(CatalogError::RepoNotFound(path.to_path_buf()));
        }
        Ok(source)
    }

    pub fn path(&self) -> &Path {
        &self.repo_path
    }

    /// Resolve the greatest non-prerelease `v<semver>` tag to its commit.
    pub fn latest_stable(&self) -> CatalogResult<StablePoint> {
        let stdout = self.run_checked(&["tag", "--list", "v*"])?;
        let listing = String::from_utf8_lossy(&stdout);
        let (tag, version) = select_latest_stable(listing.lines())
            .ok_or_else(|| CatalogError::NoStableRelease(self.repo_path.clone()))?;
        let commit = self.resolve_commit(&tag)?;
        debug!(%tag, %commit, "resolved latest stable upstream release");
        Ok(StablePoint {
            tag,
            version,
            commit,
        })
    }

    /// Peel any revision (branch, tag, `HEAD`) to a full commit id.
    pub fn resolve_commit(&self, rev: &str) -> CatalogResult<String> {
        let spec = format!("{rev}^{{commit}}");
        let stdout = self.run_checked(&["rev-parse", "--verify", &spec])?;
        Ok(String::from_utf8_lossy(&stdout).trim().to_string())
    }

    pub fn snapshot(&self, commit: &str) -> GitSnapshot {
        GitSnapshot {
            source: self.clone(),
            commit: commit.to_string(),
        }
    }

    fn git_cmd(&self) -> Command {
        let mut cmd = Command::new("git");
        cmd.arg("-C").arg(&self.repo_path);
        cmd.env_clear();
        for key in ["PATH", "HOME"] {
            if let Ok(value) = std::env::var(key) {
                cmd.env(key, value);
            }
        }
        cmd.args(["-c", "core.quotePath=false"]);
        cmd
    }

    fn run(&self, args: &[&str]) -> CatalogResult<Output> {
        self.git_cmd()
            .args(args)
            .output()
            .map_err(|source| CatalogError::Spawn {
                command: format!("git {}", args.join(" ")),
                source,
            })
    }

    fn run_checked(&self, args: &[&str]) -> CatalogResult<Vec<u8>> {
        let output = self.run(args)?;
        if !output.status.success() {
            return Err(CatalogError::Git {
                command: format!("git {}", args.join(" ")),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(output.stdout)
    }
}

/// One commit of a [`GitSource`].
#[derive(Clone, Debug)]
pub struct GitSnapshot {
    source: GitSource,
    commit: String,
}

impl GitSnapshot {
    pub fn commit(&self) -> &str {
        &self.commit
    }
}

impl SourceSnapshot for GitSnapshot {
    fn list_directory(&self, prefix: &str) -> CatalogResult<Vec<SourceEntry>> {
        let prefix = normalize_prefix(prefix);
        let treeish = format!("{}:{}", self.commit, prefix);

        // `rev-parse --verify --quiet` exits 1 without output for a missing
        // path; anything else (bad repo, missing commit) is a real failure.
        let probe = self.source.run(&["rev-parse", "--verify", "--quiet", &treeish])?;
        if !probe.status.success() {
            if probe.status.code() == Some(1) && probe.stderr.is_empty() {
                return Err(CatalogError::NotFound {
                    snapshot: self.describe(),
                    path: prefix.to_string(),
                });
            }
            return Err(CatalogError::Git {
                command: format!("git rev-parse {treeish}"),
                stderr: String::from_utf8_lossy(&probe.stderr).trim().to_string(),
            });
        }

        let stdout = self.source.run_checked(&["ls-tree", "-z", &treeish])?;
        let mut entries = parse_ls_tree(&stdout);
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    fn read_content(&self, content: &ContentRef) -> CatalogResult<Vec<u8>> {
        let output = self.source.run(&["cat-file", "blob", content.as_str()])?;
        if !output.status.success() {
            return Err(CatalogError::ContentMissing {
                snapshot: self.describe(),
                content: content.clone(),
            });
        }
        Ok(output.stdout)
    }

    fn describe(&self) -> String {
        let short = self.commit.get(..12).unwrap_or(&self.commit);
        format!("git:{short}")
    }
}

/// Parse `git ls-tree -z` records: `<mode> <type> <object>\t<name>\0`.
///
/// Submodule (`commit`) entries and malformed records are dropped.
fn parse_ls_tree(raw: &[u8]) -> Vec<SourceEntry> {
    raw.split(|b| *b == 0)
        .filter(|record| !record.is_empty())
        .filter_map(|record| {
            let record = String::from_utf8_lossy(record);
            let (meta, name) = record.split_once('\t')?;
            let mut fields = meta.split(' ');
            let _mode = fields.next()?;
            let kind = fields.next()?;
            let object = fields.next()?;
            match kind {
                "blob" => Some(SourceEntry::file(name, ContentRef::new(object))),
                "tree" => Some(SourceEntry::directory(name)),
                _ => None,
            }
        })
        .collect()
}

/// Pick the greatest `v<semver>` tag, ignoring pre-releases and tags that do
/// not parse.
fn select_latest_stable<'a>(
    tags: impl IntoIterator<Item = &'a str>,
) -> Option<(String, semver::Version)> {
    tags.into_iter()
        .map(str::trim)
        .filter_map(|tag| {
            let version = semver::Version::parse(tag.strip_prefix('v')?).ok()?;
            version.pre.is_empty().then(|| (tag.to_string(), version))
        })
        .max_by(|(_, a), (_, b)| a.cmp(b))
}
