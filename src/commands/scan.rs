//! Scan command implementation
//!
//! Reads a module manifest, extracts its GitHub-backed `git_override`
//! declarations, probes each for a `.gitmodules` file and writes the
//! classified tool list as JSON for the `package` and `notes` commands.

use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;

use archive_override::defaults;
use archive_override::manifest::OverrideScanner;
use archive_override::output::{OutputConfig, Status};
use archive_override::probe::{self, HttpSubmoduleProbe};

/// Arguments for the scan command
#[derive(Args, Debug)]
pub struct ScanArgs {
    /// Module manifest to scan (e.g. MODULE.bazel)
    #[arg(value_name = "MODULE_FILE")]
    pub manifest: PathBuf,

    /// Write the tools JSON here instead of stdout
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Seconds to wait for each submodule probe
    #[arg(
        long,
        value_name = "SECS",
        env = "ARCHIVE_OVERRIDE_PROBE_TIMEOUT",
        default_value_t = defaults::PROBE_TIMEOUT_SECS
    )]
    pub timeout: u64,

    /// Raw-content host queried for `.gitmodules`
    #[arg(
        long,
        value_name = "URL",
        env = "ARCHIVE_OVERRIDE_RAW_BASE",
        default_value = defaults::RAW_CONTENT_BASE
    )]
    pub raw_base: String,
}

/// Execute the scan command
pub fn execute(args: ScanArgs, output: &OutputConfig) -> Result<()> {
    if !args.manifest.exists() {
        anyhow::bail!("Manifest file not found: {}", args.manifest.display());
    }

    output.status(
        Status::Scan,
        &format!("Scanning {} for git_override declarations", args.manifest.display()),
    );

    let scanner = OverrideScanner::new()?;
    let scan = scanner.scan_file(&args.manifest)?;
    let timeout = Duration::from_secs(args.timeout);
    let prober = HttpSubmoduleProbe::with_base(&args.raw_base, timeout)?;
    let tools = probe::classify(scan, &prober);

    let mut json = serde_json::to_string_pretty(&tools)?;
    json.push('\n');
    match &args.output {
        Some(path) => std::fs::write(path, &json)
            .with_context(|| format!("Failed to write {}", path.display()))?,
        None => std::io::stdout().write_all(json.as_bytes())?,
    }

    output.status(
        Status::Success,
        &format!(
            "Found {} with submodules, {} without, {} skipped",
            tools.with_submodules.len(),
            tools.without_submodules.len(),
            tools.skipped_declarations
        ),
    );
    Ok(())
}
