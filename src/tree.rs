//! In-memory source tree
//!
//! `SourceTree` holds a directory's regular files keyed by relative path.
//! The fake source provider in tests materializes one onto disk, and tests
//! read directories and tarballs back into one to compare content.

use std::collections::BTreeMap;
use std::fs;
use std::io::Read;
use std::path::{Component, Path, PathBuf};

use flate2::read::GzDecoder;
use walkdir::WalkDir;

use crate::error::{Error, Result};

/// Name of version-control metadata entries that never belong in an archive.
pub const VCS_DIR: &str = ".git";

/// True if any component of `path` is a `.git` entry.
pub fn is_vcs_path(path: &Path) -> bool {
    path.components()
        .any(|c| matches!(c, Component::Normal(name) if name == VCS_DIR))
}

/// Represents a file with content and metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct File {
    /// File content as bytes
    pub content: Vec<u8>,
    /// Whether any execute bit is set
    pub executable: bool,
}

impl File {
    pub fn new(content: Vec<u8>) -> Self {
        Self {
            content,
            executable: false,
        }
    }

    pub fn from_string(content: &str) -> Self {
        Self::new(content.as_bytes().to_vec())
    }
}

/// Ordered set of files making up a source tree
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceTree {
    files: BTreeMap<PathBuf, File>,
}

impl SourceTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or update a file
    pub fn add_file<P: AsRef<Path>>(&mut self, path: P, file: File) {
        self.files.insert(path.as_ref().to_path_buf(), file);
    }

    /// Add a file with string content
    pub fn add_file_string<P: AsRef<Path>>(&mut self, path: P, content: &str) {
        self.add_file(path, File::from_string(content));
    }

    pub fn get_file<P: AsRef<Path>>(&self, path: P) -> Option<&File> {
        self.files.get(path.as_ref())
    }

    pub fn exists<P: AsRef<Path>>(&self, path: P) -> bool {
        self.files.contains_key(path.as_ref())
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Iterate over all files in path order
    pub fn files(&self) -> impl Iterator<Item = (&PathBuf, &File)> {
        self.files.iter()
    }

    /// Copy of this tree without any `.git` entries.
    pub fn without_vcs(&self) -> Self {
        Self {
            files: self
                .files
                .iter()
                .filter(|(path, _)| !is_vcs_path(path))
                .map(|(path, file)| (path.clone(), file.clone()))
                .collect(),
        }
    }

    /// Write every file under `root`, creating parent directories.
    pub fn write_to(&self, root: &Path) -> Result<()> {
        fs::create_dir_all(root)?;

        for (path, file) in &self.files {
            let full_path = root.join(path);
            if let Some(parent) = full_path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&full_path, &file.content)?;

            #[cfg(unix)]
            if file.executable {
                use std::os::unix::fs::PermissionsExt;
                fs::set_permissions(&full_path, fs::Permissions::from_mode(0o755))?;
            }
        }

        Ok(())
    }

    /// Load the regular files under `root`, skipping `.git` entries.
    pub fn load_from_dir(root: &Path) -> Result<Self> {
        let mut tree = Self::new();

        let walker = WalkDir::new(root)
            .min_depth(1)
            .into_iter()
            .filter_entry(|e| e.file_name() != VCS_DIR);

        for entry in walker {
            let entry = entry.map_err(|e| Error::Io(e.into()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let relative = entry.path().strip_prefix(root).map_err(|e| {
                Error::Io(std::io::Error::other(format!(
                    "{} is outside {}: {e}",
                    entry.path().display(),
                    root.display()
                )))
            })?;
            let content = fs::read(entry.path())?;
            tree.add_file(
                relative,
                File {
                    content,
                    executable: is_executable(&entry.metadata().map_err(|e| Error::Io(e.into()))?),
                },
            );
        }

        Ok(tree)
    }

    /// Read the regular files of a gzipped tarball, removing `strip_prefix`
    /// from each path the way Bazel's `strip_prefix` does. Entries outside
    /// the prefix are ignored.
    pub fn from_tar_gz<R: Read>(reader: R, strip_prefix: &str) -> Result<Self> {
        let mut tree = Self::new();
        let mut archive = tar::Archive::new(GzDecoder::new(reader));

        for entry in archive.entries()? {
            let mut entry = entry?;
            if !entry.header().entry_type().is_file() {
                continue;
            }
            let path = entry.path()?.into_owned();
            let Ok(relative) = path.strip_prefix(strip_prefix) else {
                continue;
            };
            let relative = relative.to_path_buf();
            let executable = entry.header().mode()? & 0o111 != 0;
            let mut content = Vec::new();
            entry.read_to_end(&mut content)?;
            tree.add_file(relative, File { content, executable });
        }

        Ok(tree)
    }
}

#[cfg(unix)]
fn is_executable(metadata: &fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn is_executable(_metadata: &fs::Metadata) -> bool {
    false
}
