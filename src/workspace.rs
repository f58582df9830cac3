//! Per-module scratch directories.
//!
//! Each packaging attempt gets its own [`Workspace`], a uniquely named
//! temporary directory whose name starts with `package_<module>_`. The
//! directory is deleted when the handle is dropped, on success, on error and
//! while unwinding from a panic, so concurrent workers never share or leak a
//! checkout.

use std::path::{Path, PathBuf};

use log::{debug, warn};
use tempfile::TempDir;

use crate::error::{Error, Result};

/// Scoped temporary directory owned by one packaging attempt.
#[derive(Debug)]
pub struct Workspace {
    module: String,
    dir: Option<TempDir>,
}

impl Workspace {
    /// Create a fresh workspace for `module` under `root`.
    pub fn create(root: &Path, module: &str) -> Result<Self> {
        std::fs::create_dir_all(root).map_err(|e| Error::Workspace {
            module: module.to_string(),
            message: format!("cannot create {}: {e}", root.display()),
        })?;

        let dir = tempfile::Builder::new()
            .prefix(&format!("package_{}_", sanitize(module)))
            .tempdir_in(root)
            .map_err(|e| Error::Workspace {
                module: module.to_string(),
                message: e.to_string(),
            })?;
        debug!("Workspace for {} at {}", module, dir.path().display());

        Ok(Self {
            module: module.to_string(),
            dir: Some(dir),
        })
    }

    pub fn path(&self) -> &Path {
        match &self.dir {
            Some(dir) => dir.path(),
            None => Path::new(""),
        }
    }

    /// Path of an entry inside the workspace.
    pub fn join<P: AsRef<Path>>(&self, relative: P) -> PathBuf {
        self.path().join(relative)
    }

    /// Delete the workspace now, reporting any failure.
    pub fn close(mut self) -> Result<()> {
        match self.dir.take() {
            Some(dir) => dir.close().map_err(|e| Error::Workspace {
                module: self.module.clone(),
                message: format!("cleanup failed: {e}"),
            }),
            None => Ok(()),
        }
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        if let Some(dir) = self.dir.take() {
            let path = dir.path().to_path_buf();
            if let Err(e) = dir.close() {
                warn!("Failed to remove workspace {}: {}", path.display(), e);
            }
        }
    }
}

/// Keep module names usable as a path component.
fn sanitize(module: &str) -> String {
    module
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
