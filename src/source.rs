//! # Source Capabilities
//!
//! The packager never talks to `git` or HTTP directly. It goes through two
//! traits so packaging logic can be tested with in-memory fakes:
//!
//! - **`SourceProvider`**: materializes a dependency's full tree, including
//!   every nested submodule, at the pinned commit into a given directory.
//!   `GitSourceProvider` does this with `git clone`, `git checkout` and
//!   `git submodule update --init --recursive`.
//!
//! - **`ArchiveFetcher`**: returns a byte stream of GitHub's snapshot archive
//!   for the pinned commit. `HttpArchiveFetcher` streams the response body
//!   without buffering it.

use std::io::Read;
use std::path::Path;
use std::time::Duration;

use log::{debug, info};
use reqwest::blocking::Client;

use crate::error::{Error, Result};
use crate::model::DependencyRef;

/// Trait for materializing source trees - allows mocking in tests
pub trait SourceProvider: Send + Sync {
    /// Produce the dependency's checked-out tree at `dest`. `dest` does not
    /// exist beforehand; its parent does.
    fn materialize(&self, dep: &DependencyRef, dest: &Path) -> Result<()>;
}

/// Trait for downloading snapshot archives - allows mocking in tests
pub trait ArchiveFetcher: Send + Sync {
    fn fetch(&self, dep: &DependencyRef) -> Result<Box<dyn Read + Send>>;
}

/// Materializes sources with the system `git` command.
pub struct GitSourceProvider {
    timeout: Duration,
}

impl GitSourceProvider {
    /// `timeout` bounds each individual git invocation.
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl SourceProvider for GitSourceProvider {
    fn materialize(&self, dep: &DependencyRef, dest: &Path) -> Result<()> {
        let url = dep.clone_url();

        info!("Cloning {} at {}", url, dep.commit);
        let steps = crate::git::clone(&url, dest, self.timeout)
            .and_then(|_| crate::git::checkout(dest, &dep.commit, &url, self.timeout))
            .and_then(|_| {
                debug!("Updating submodules for {}", dep.module_name);
                crate::git::update_submodules(dest, &url, self.timeout)
            });

        steps.map_err(|e| Error::Materialize {
            module: dep.module_name.clone(),
            message: e.to_string(),
        })
    }
}

/// Downloads GitHub snapshot archives over HTTPS.
pub struct HttpArchiveFetcher {
    client: Client,
}

impl HttpArchiveFetcher {
    /// `timeout` bounds each download from connect to the end of the body.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("archive-override/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Network {
                url: "https://github.com".to_string(),
                message: format!("Failed to create HTTP client: {e}"),
            })?;
        Ok(Self { client })
    }
}

impl ArchiveFetcher for HttpArchiveFetcher {
    fn fetch(&self, dep: &DependencyRef) -> Result<Box<dyn Read + Send>> {
        let url = dep.archive_url();
        info!("Downloading {}", url);

        let response = self.client.get(&url).send().map_err(|e| Error::Network {
            url: url.clone(),
            message: e.to_string(),
        })?;

        if !response.status().is_success() {
            return Err(Error::Network {
                url,
                message: format!("HTTP {}", response.status()),
            });
        }

        Ok(Box::new(response))
    }
}
