//! Scoped build directories and their in-memory image.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use pmirror_types::Version;
use tempfile::TempDir;

/// Hands out one fresh directory per version build.
///
/// Each directory is a [`TempDir`] and is removed when dropped, whatever the
/// outcome of the build.
#[derive(Clone, Debug, Default)]
pub struct StagingArea {
    root: Option<PathBuf>,
}

impl StagingArea {
    /// Stage under `root`, or under the system temp directory if `None`.
    pub fn new(root: Option<PathBuf>) -> Self {
        Self { root }
    }

    pub fn create(&self, version: &Version) -> io::Result<TempDir> {
        let mut builder = tempfile::Builder::new();
        let prefix = format!("pmirror-v{version}-");
        builder.prefix(&prefix);
        match &self.root {
            Some(root) => {
                fs::create_dir_all(root)?;
                builder.tempdir_in(root)
            }
            None => builder.tempdir(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StagedEntry {
    File { data: Vec<u8>, executable: bool },
    /// Link target, stored verbatim.
    Symlink { target: Vec<u8> },
    Dir(StagedRelease),
}

/// A directory tree held in memory, children keyed by name.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StagedRelease {
    entries: BTreeMap<String, StagedEntry>,
}

impl StagedRelease {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a file at a `/`-separated path, creating parent directories.
    /// A file or link in the way of a parent is replaced by a directory.
    pub fn insert_file(&mut self, path: &str, data: impl Into<Vec<u8>>, executable: bool) {
        let entry = StagedEntry::File {
            data: data.into(),
            executable,
        };
        self.insert(path, entry);
    }

    pub fn with_file(mut self, path: &str, data: impl Into<Vec<u8>>) -> Self {
        self.insert_file(path, data, false);
        self
    }

    pub fn insert(&mut self, path: &str, entry: StagedEntry) {
        let mut parts: Vec<&str> = path.split('/').filter(|p| !p.is_empty()).collect();
        let Some(leaf) = parts.pop() else {
            return;
        };
        let mut dir = self;
        for part in parts {
            let slot = dir
                .entries
                .entry(part.to_string())
                .or_insert_with(|| StagedEntry::Dir(StagedRelease::new()));
            if !matches!(slot, StagedEntry::Dir(_)) {
                *slot = StagedEntry::Dir(StagedRelease::new());
            }
            let StagedEntry::Dir(sub) = slot else {
                return;
            };
            dir = sub;
        }
        dir.entries.insert(leaf.to_string(), entry);
    }

    pub fn get(&self, path: &str) -> Option<&StagedEntry> {
        let mut parts = path.split('/').filter(|p| !p.is_empty()).peekable();
        let mut dir = self;
        while let Some(part) = parts.next() {
            let entry = dir.entries.get(part)?;
            if parts.peek().is_none() {
                return Some(entry);
            }
            match entry {
                StagedEntry::Dir(sub) => dir = sub,
                _ => return None,
            }
        }
        None
    }

    /// Children in name order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &StagedEntry)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Read a directory from disk, recursively. Executable bits and symlink
    /// targets are kept; links are never followed.
    pub fn load(dir: &Path) -> io::Result<Self> {
        let mut staged = Self::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            let path = entry.path();
            let file_type = entry.file_type()?;
            let staged_entry = if file_type.is_symlink() {
                let target = fs::read_link(&path)?;
                StagedEntry::Symlink {
                    target: target.to_string_lossy().into_owned().into_bytes(),
                }
            } else if file_type.is_dir() {
                StagedEntry::Dir(Self::load(&path)?)
            } else {
                let metadata = entry.metadata()?;
                StagedEntry::File {
                    data: fs::read(&path)?,
                    executable: is_executable(&metadata),
                }
            };
            staged.entries.insert(name, staged_entry);
        }
        Ok(staged)
    }

    /// Materialize under `dir`, which must exist.
    pub fn write_to(&self, dir: &Path) -> io::Result<()> {
        for (name, entry) in &self.entries {
            let path = dir.join(name);
            match entry {
                StagedEntry::File { data, executable } => {
                    fs::write(&path, data)?;
                    if *executable {
                        set_executable(&path)?;
                    }
                }
                StagedEntry::Symlink { target } => {
                    write_symlink(&String::from_utf8_lossy(target), &path)?;
                }
                StagedEntry::Dir(sub) => {
                    fs::create_dir_all(&path)?;
                    sub.write_to(&path)?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(unix)]
fn is_executable(metadata: &fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    pmirror_store::EntryMode::for_file_permissions(metadata.permissions().mode())
        == pmirror_store::EntryMode::Executable
}

#[cfg(not(unix))]
fn is_executable(_metadata: &fs::Metadata) -> bool {
    false
}

#[cfg(unix)]
fn set_executable(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let mut perms = fs::metadata(path)?.permissions();
    perms.set_mode(perms.mode() | 0o111);
    fs::set_permissions(path, perms)
}

#[cfg(not(unix))]
fn set_executable(_path: &Path) -> io::Result<()> {
    Ok(())
}

#[cfg(unix)]
fn write_symlink(target: &str, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(not(unix))]
fn write_symlink(target: &str, link: &Path) -> io::Result<()> {
    fs::write(link, target)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_creates_parents() {
        let staged = StagedRelease::new()
            .with_file("tfplugin5/tfplugin5.proto", "syntax = \"proto3\";")
            .with_file("go.mod", "module x");
        assert_eq!(staged.len(), 2);
        assert!(matches!(staged.get("tfplugin5"), Some(StagedEntry::Dir(_))));
        assert_eq!(
            staged.get("tfplugin5/tfplugin5.proto"),
            Some(&StagedEntry::File {
                data: b"syntax = \"proto3\";".to_vec(),
                executable: false
            })
        );
        assert!(staged.get("tfplugin5/missing").is_none());
        assert!(staged.get("go.mod/child").is_none());
    }

    #[test]
    fn entries_come_out_sorted() {
        let staged = StagedRelease::new()
            .with_file("zeta", "")
            .with_file("alpha", "")
            .with_file("mid/x", "");
        let names: Vec<_> = staged.entries().map(|(n, _)| n).collect();
        assert_eq!(names, ["alpha", "mid", "zeta"]);
    }

    #[test]
    fn write_then_load_preserves_tree() {
        let dir = tempfile::tempdir().unwrap();
        let mut staged = StagedRelease::new().with_file("tfplugin6/tfplugin6.proto", "p");
        staged.insert_file("bin/gen.sh", "#!/bin/sh\n", cfg!(unix));
        staged.write_to(dir.path()).unwrap();

        let loaded = StagedRelease::load(dir.path()).unwrap();
        assert_eq!(loaded, staged);
    }

    #[cfg(unix)]
    #[test]
    fn load_keeps_symlinks_without_following() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("real.txt"), "data").unwrap();
        std::os::unix::fs::symlink("real.txt", dir.path().join("link.txt")).unwrap();

        let loaded = StagedRelease::load(dir.path()).unwrap();
        assert_eq!(
            loaded.get("link.txt"),
            Some(&StagedEntry::Symlink {
                target: b"real.txt".to_vec()
            })
        );
    }

    #[test]
    fn staging_dirs_are_removed_on_drop() {
        let root = tempfile::tempdir().unwrap();
        let area = StagingArea::new(Some(root.path().join("builds")));
        let build = area.create(&Version::new(5, 1, 0)).unwrap();
        let path = build.path().to_path_buf();
        assert!(path.starts_with(root.path().join("builds")));
        assert!(path
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("pmirror-v5.1.0-"));
        fs::write(path.join("go.mod"), "module x").unwrap();

        drop(build);
        assert!(!path.exists());
    }
}
