//! Value records passed between the scan, package and notes stages.
//!
//! Every record here is produced by exactly one stage and only read by the
//! later ones. They serialize to the JSON files that connect the stages when
//! they run as separate CLI invocations.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// File name of the with-submodules manifest written by the packager.
pub const PACKAGES_FILE: &str = "packages.json";

/// File name of the without-submodules manifest written by the packager.
pub const INTEGRITIES_FILE: &str = "no_submodule_integrities.json";

/// One `git_override` declaration whose remote points at GitHub.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyRef {
    /// Module identifier, unique within one scan.
    pub module_name: String,
    /// Pinned commit.
    pub commit: String,
    /// Remote URL exactly as declared.
    pub remote: String,
    pub owner: String,
    pub repo: String,
}

impl DependencyRef {
    /// Directory name consumers strip on extraction: `{repo}-{commit}`.
    pub fn strip_prefix(&self) -> String {
        format!("{}-{}", self.repo, self.commit)
    }

    /// GitHub's snapshot archive for the pinned commit.
    pub fn archive_url(&self) -> String {
        format!(
            "https://github.com/{}/{}/archive/{}.tar.gz",
            self.owner, self.repo, self.commit
        )
    }

    /// Anonymous HTTPS clone URL, independent of the declared remote's scheme.
    pub fn clone_url(&self) -> String {
        format!("https://github.com/{}/{}.git", self.owner, self.repo)
    }

    /// Browser link to the pinned commit.
    pub fn commit_url(&self) -> String {
        format!(
            "https://github.com/{}/{}/commit/{}",
            self.owner, self.repo, self.commit
        )
    }

    /// First seven characters of the commit, or the whole commit if shorter.
    pub fn short_commit(&self) -> &str {
        match self.commit.char_indices().nth(7) {
            Some((idx, _)) => &self.commit[..idx],
            None => &self.commit,
        }
    }
}

/// A dependency together with the outcome of its submodule probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedDependency {
    #[serde(flatten)]
    pub dependency: DependencyRef,
    pub has_submodules: bool,
}

impl std::ops::Deref for ClassifiedDependency {
    type Target = DependencyRef;

    fn deref(&self) -> &DependencyRef {
        &self.dependency
    }
}

/// Scanner output: two disjoint, manifest-ordered sets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolsInfo {
    pub with_submodules: Vec<ClassifiedDependency>,
    pub without_submodules: Vec<ClassifiedDependency>,
    /// `git_override` blocks seen but not actionable.
    #[serde(default)]
    pub skipped_declarations: usize,
}

impl ToolsInfo {
    /// Total number of classified dependencies.
    pub fn len(&self) -> usize {
        self.with_submodules.len() + self.without_submodules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Result of packaging one dependency that has submodules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageManifestEntry {
    pub module_name: String,
    pub tarball_name: String,
    pub integrity: String,
    pub commit: String,
    pub strip_prefix: String,
}

/// Digest of GitHub's own archive for a dependency without submodules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrityRecord {
    pub module_name: String,
    pub owner: String,
    pub repo: String,
    pub commit: String,
    pub integrity: String,
}

/// Tarball file name for a module in a given release.
pub fn tarball_name(module_name: &str, tag: &str) -> String {
    format!("{}-{}.tar.gz", module_name, tag)
}

/// Read a JSON document written by an earlier stage.
pub fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let file = File::open(path)?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}

/// Write a pretty-printed JSON document.
pub fn save_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let mut content = serde_json::to_string_pretty(value)?;
    content.push('\n');
    std::fs::write(path, content)?;
    Ok(())
}
