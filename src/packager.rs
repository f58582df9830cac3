//! # Archive Packaging
//!
//! Turns classified dependencies into pinned, integrity-checked archives.
//!
//! ## With submodules
//!
//! For each dependency, inside its own [`Workspace`]:
//!
//! 1. Materialize the full tree, submodules included, via [`SourceProvider`].
//! 2. Rename the checkout to `{repo}-{commit}`, the same top-level directory
//!    GitHub's own archives use, so consumers strip the same prefix either way.
//! 3. Write `{module}-{tag}.tar.gz` into the output directory via [`Archiver`].
//! 4. Digest the tarball file exactly as written and store the digest next to
//!    it as `{tarball}.sha256`.
//!
//! ## Without submodules
//!
//! GitHub's snapshot archive is streamed from [`ArchiveFetcher`] straight
//! into the digest; nothing is written locally.
//!
//! ## Batches
//!
//! Items run on a bounded rayon pool. Each failure is logged with its module
//! and dropped from the results; it never stops the batch. Results keep the
//! input order regardless of completion order. Raising the flag returned by
//! [`Packager::cancel_handle`] makes items that have not started yet fail
//! with [`Error::Cancelled`]; items in flight finish and clean up normally.

use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use log::{error, info, warn};
use rayon::prelude::*;

use crate::archive::{Archiver, TarGzArchiver};
use crate::error::{Error, Result};
use crate::integrity;
use crate::model::{
    self, ClassifiedDependency, DependencyRef, IntegrityRecord, PackageManifestEntry, ToolsInfo,
    INTEGRITIES_FILE, PACKAGES_FILE,
};
use crate::source::{ArchiveFetcher, GitSourceProvider, HttpArchiveFetcher, SourceProvider};
use crate::workspace::Workspace;

/// Where and how a packaging run writes its results.
#[derive(Debug, Clone)]
pub struct PackagerConfig {
    /// Directory receiving tarballs, digests and the two manifests.
    pub output_dir: PathBuf,
    /// Release tag baked into tarball names.
    pub tag: String,
    /// Parent directory for per-module workspaces.
    pub work_root: PathBuf,
    /// Worker pool size; at least one.
    pub jobs: usize,
}

/// Successes and failures of one batch, in input order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOutcome<T> {
    pub succeeded: Vec<T>,
    /// `(module_name, error message)` for each failed item.
    pub failed: Vec<(String, String)>,
}

impl<T> Default for BatchOutcome<T> {
    fn default() -> Self {
        Self {
            succeeded: Vec::new(),
            failed: Vec::new(),
        }
    }
}

impl<T> BatchOutcome<T> {
    pub fn attempted(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }
}

/// Results of a full run over both classes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub packages: BatchOutcome<PackageManifestEntry>,
    pub integrities: BatchOutcome<IntegrityRecord>,
}

impl RunSummary {
    /// Human-readable success counts, one line per class.
    pub fn lines(&self) -> [String; 2] {
        [
            format!(
                "Packaged {}/{} tools with submodules",
                self.packages.succeeded.len(),
                self.packages.attempted()
            ),
            format!(
                "Calculated integrity for {}/{} tools without submodules",
                self.integrities.succeeded.len(),
                self.integrities.attempted()
            ),
        ]
    }

    pub fn has_failures(&self) -> bool {
        !self.packages.failed.is_empty() || !self.integrities.failed.is_empty()
    }
}

/// Packages dependencies through pluggable source, archive and fetch
/// capabilities.
pub struct Packager {
    source: Box<dyn SourceProvider>,
    archiver: Box<dyn Archiver>,
    fetcher: Box<dyn ArchiveFetcher>,
    config: PackagerConfig,
    cancelled: Arc<AtomicBool>,
}

impl Packager {
    /// Production packager: system `git`, deterministic tar.gz, HTTPS fetches.
    /// `timeout` bounds each git invocation and each download.
    pub fn new(config: PackagerConfig, timeout: Duration) -> Result<Self> {
        Ok(Self::with_operations(
            Box::new(GitSourceProvider::new(timeout)),
            Box::new(TarGzArchiver),
            Box::new(HttpArchiveFetcher::new(timeout)?),
            config,
        ))
    }

    /// Creates a `Packager` with custom capability implementations.
    pub fn with_operations(
        source: Box<dyn SourceProvider>,
        archiver: Box<dyn Archiver>,
        fetcher: Box<dyn ArchiveFetcher>,
        config: PackagerConfig,
    ) -> Self {
        Self {
            source,
            archiver,
            fetcher,
            config,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Shared flag that stops items which have not started yet.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancelled)
    }

    pub fn config(&self) -> &PackagerConfig {
        &self.config
    }

    fn ensure_not_cancelled(&self, dep: &DependencyRef) -> Result<()> {
        if self.cancelled.load(Ordering::SeqCst) {
            return Err(Error::Cancelled {
                module: dep.module_name.clone(),
            });
        }
        Ok(())
    }

    /// Package one dependency that has submodules.
    pub fn package_with_submodules(&self, dep: &DependencyRef) -> Result<PackageManifestEntry> {
        self.ensure_not_cancelled(dep)?;
        info!("Packaging {}...", dep.module_name);

        let workspace = Workspace::create(&self.config.work_root, &dep.module_name)?;
        let result = self.package_in(dep, &workspace);

        if let Err(e) = workspace.close() {
            warn!("{}", e);
        }
        result
    }

    fn package_in(
        &self,
        dep: &DependencyRef,
        workspace: &Workspace,
    ) -> Result<PackageManifestEntry> {
        let strip_prefix = dep.strip_prefix();
        let tarball_name = model::tarball_name(&dep.module_name, &self.config.tag);
        for name in [dep.repo.as_str(), strip_prefix.as_str(), tarball_name.as_str()] {
            ensure_file_name(dep, name)?;
        }

        let mut source_dir = workspace.join(&dep.repo);
        self.source.materialize(dep, &source_dir)?;

        let target_dir = workspace.join(&strip_prefix);
        if source_dir != target_dir {
            fs::rename(&source_dir, &target_dir).map_err(|e| Error::Workspace {
                module: dep.module_name.clone(),
                message: format!("cannot rename checkout to {}: {e}", strip_prefix),
            })?;
            source_dir = target_dir;
        }

        let tarball_path = self.config.output_dir.join(&tarball_name);
        let digest_path = self.config.output_dir.join(format!("{}.sha256", tarball_name));

        let published = self.archiver.archive(&source_dir, &tarball_path).and_then(|_| {
            let integrity = integrity::of_file(&tarball_path)?;
            fs::write(&digest_path, &integrity)?;
            Ok(integrity)
        });

        let integrity = match published {
            Ok(integrity) => integrity,
            Err(e) => {
                let _ = fs::remove_file(&tarball_path);
                let _ = fs::remove_file(&digest_path);
                return Err(e);
            }
        };

        info!("{}: {}", dep.module_name, integrity);
        Ok(PackageManifestEntry {
            module_name: dep.module_name.clone(),
            tarball_name,
            integrity,
            commit: dep.commit.clone(),
            strip_prefix,
        })
    }

    /// Digest GitHub's archive for one dependency without submodules.
    pub fn integrity_without_submodules(&self, dep: &DependencyRef) -> Result<IntegrityRecord> {
        self.ensure_not_cancelled(dep)?;
        info!("Calculating integrity for {}...", dep.module_name);

        let stream = self.fetcher.fetch(dep)?;
        let integrity = integrity::of_reader(stream).map_err(|e| Error::Network {
            url: dep.archive_url(),
            message: e.to_string(),
        })?;

        info!("{}: {}", dep.module_name, integrity);
        Ok(IntegrityRecord {
            module_name: dep.module_name.clone(),
            owner: dep.owner.clone(),
            repo: dep.repo.clone(),
            commit: dep.commit.clone(),
            integrity,
        })
    }

    /// Run `work` over `tools` on the worker pool, keeping input order.
    fn run_batch<T, F>(&self, tools: &[ClassifiedDependency], work: F) -> Result<BatchOutcome<T>>
    where
        T: Send,
        F: Fn(&DependencyRef) -> Result<T> + Sync,
    {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.jobs.max(1))
            .build()
            .map_err(|e| Error::Io(std::io::Error::other(e.to_string())))?;

        let results: Vec<(&str, Result<T>)> = pool.install(|| {
            tools
                .par_iter()
                .map(|tool| (tool.module_name.as_str(), work(&tool.dependency)))
                .collect()
        });

        let mut outcome = BatchOutcome::default();
        for (module, result) in results {
            match result {
                Ok(value) => outcome.succeeded.push(value),
                Err(e) => {
                    error!("Failed to process {}: {}", module, e);
                    outcome.failed.push((module.to_string(), e.to_string()));
                }
            }
        }
        Ok(outcome)
    }

    /// Package every tool with submodules.
    pub fn package_all(
        &self,
        tools: &[ClassifiedDependency],
    ) -> Result<BatchOutcome<PackageManifestEntry>> {
        self.run_batch(tools, |dep| self.package_with_submodules(dep))
    }

    /// Digest every tool without submodules.
    pub fn integrity_all(
        &self,
        tools: &[ClassifiedDependency],
    ) -> Result<BatchOutcome<IntegrityRecord>> {
        self.run_batch(tools, |dep| self.integrity_without_submodules(dep))
    }

    /// Process both classes and write `packages.json` and
    /// `no_submodule_integrities.json` into the output directory.
    ///
    /// Only setup failures (output directory, manifest writes) are returned
    /// as errors; per-item failures end up in the summary.
    pub fn run(&self, tools: &ToolsInfo) -> Result<RunSummary> {
        fs::create_dir_all(&self.config.output_dir)?;

        let summary = RunSummary {
            packages: self.package_all(&tools.with_submodules)?,
            integrities: self.integrity_all(&tools.without_submodules)?,
        };

        model::save_json(
            &self.config.output_dir.join(PACKAGES_FILE),
            &summary.packages.succeeded,
        )?;
        model::save_json(
            &self.config.output_dir.join(INTEGRITIES_FILE),
            &summary.integrities.succeeded,
        )?;

        for line in summary.lines() {
            info!("{}", line);
        }
        Ok(summary)
    }
}

/// Names joined onto the workspace or output directory must stay inside it.
fn ensure_file_name(dep: &DependencyRef, name: &str) -> Result<()> {
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(()),
        _ => Err(Error::Workspace {
            module: dep.module_name.clone(),
            message: format!("{:?} is not a plain file name", name),
        }),
    }
}
