//! # Submodule Detection
//!
//! Classifies each scanned dependency by whether its tree, at the pinned
//! commit, contains a `.gitmodules` file. The check goes through the
//! [`SubmoduleProbe`] trait so classification can be tested without network
//! access; [`HttpSubmoduleProbe`] is the production implementation and asks
//! `raw.githubusercontent.com` (or another raw-content host) directly.
//!
//! A probe that fails (timeout, DNS, unexpected status) is treated as
//! "no submodules". One unreachable repository never blocks the rest, and
//! such a dependency still gets a usable GitHub archive snippet.

use std::time::Duration;

use log::{debug, info, warn};
use reqwest::blocking::Client;
use reqwest::StatusCode;

use crate::defaults::RAW_CONTENT_BASE;
use crate::error::{Error, Result};
use crate::manifest::ScanResult;
use crate::model::{ClassifiedDependency, DependencyRef, ToolsInfo};

/// Marker file whose presence means the repository has submodules.
pub const MARKER_FILE: &str = ".gitmodules";

/// What a single probe observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    Present,
    Absent,
    Failed(String),
}

/// Trait for submodule probes - allows mocking in tests
pub trait SubmoduleProbe: Send + Sync {
    fn probe(&self, dep: &DependencyRef) -> ProbeOutcome;
}

/// Raw-content URL of the marker file at the pinned commit.
pub fn marker_url(base: &str, dep: &DependencyRef) -> String {
    format!(
        "{}/{}/{}/{}/{}",
        base.trim_end_matches('/'),
        dep.owner,
        dep.repo,
        dep.commit,
        MARKER_FILE
    )
}

/// Probes GitHub over HTTPS with a bounded timeout per request.
pub struct HttpSubmoduleProbe {
    client: Client,
    base: String,
}

impl HttpSubmoduleProbe {
    pub fn new(timeout: Duration) -> Result<Self> {
        Self::with_base(RAW_CONTENT_BASE, timeout)
    }

    /// Probe against another raw-content host, e.g. a mirror.
    pub fn with_base(base: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("archive-override/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Network {
                url: base.to_string(),
                message: format!("Failed to create HTTP client: {e}"),
            })?;
        Ok(Self {
            client,
            base: base.to_string(),
        })
    }
}

impl SubmoduleProbe for HttpSubmoduleProbe {
    fn probe(&self, dep: &DependencyRef) -> ProbeOutcome {
        let url = marker_url(&self.base, dep);
        debug!("Probing {}", url);

        match self.client.head(&url).send() {
            Ok(response) if response.status().is_success() => ProbeOutcome::Present,
            Ok(response) if response.status() == StatusCode::NOT_FOUND => ProbeOutcome::Absent,
            Ok(response) => ProbeOutcome::Failed(format!("HTTP {}", response.status())),
            Err(e) => ProbeOutcome::Failed(e.to_string()),
        }
    }
}

/// Probe every scanned dependency and split them into the two sets,
/// preserving manifest order within each.
pub fn classify(scan: ScanResult, probe: &dyn SubmoduleProbe) -> ToolsInfo {
    let mut info = ToolsInfo {
        skipped_declarations: scan.skipped,
        ..ToolsInfo::default()
    };

    for dependency in scan.dependencies {
        let has_submodules = match probe.probe(&dependency) {
            ProbeOutcome::Present => true,
            ProbeOutcome::Absent => false,
            ProbeOutcome::Failed(reason) => {
                warn!(
                    "Submodule check failed for {} ({}/{}@{}): {}; assuming none",
                    dependency.module_name,
                    dependency.owner,
                    dependency.repo,
                    dependency.commit,
                    reason
                );
                false
            }
        };
        info!(
            "{}: {}",
            dependency.module_name,
            if has_submodules { "has submodules" } else { "no submodules" }
        );

        let tool = ClassifiedDependency {
            dependency,
            has_submodules,
        };
        if has_submodules {
            info.with_submodules.push(tool);
        } else {
            info.without_submodules.push(tool);
        }
    }

    info
}
