//! Package command implementation
//!
//! Reads the scan output and runs the packager over both classes:
//! 1. Tools with submodules are cloned recursively, archived and digested
//! 2. Tools without submodules have GitHub's archive digested in flight
//! 3. `packages.json` and `no_submodule_integrities.json` are written
//!
//! A tool that fails is logged and left out of the manifests; the command
//! still succeeds so the remaining tools can be released.
//!
//! The first Ctrl-C stops tools that have not started yet and lets running
//! ones finish; a second one exits immediately.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Args;
use log::{debug, warn};

use archive_override::defaults;
use archive_override::model::{self, ToolsInfo};
use archive_override::output::{OutputConfig, Status};
use archive_override::packager::{Packager, PackagerConfig};

/// Arguments for the package command
#[derive(Args, Debug)]
pub struct PackageArgs {
    /// Tools JSON written by `scan`
    #[arg(value_name = "TOOLS_INFO_JSON")]
    pub tools_info: PathBuf,

    /// Directory receiving tarballs, digests and manifests
    #[arg(value_name = "OUTPUT_DIR")]
    pub output_dir: PathBuf,

    /// Release tag used in tarball names
    #[arg(value_name = "TAG")]
    pub tag: String,

    /// Number of tools processed in parallel
    #[arg(
        short,
        long,
        value_name = "N",
        env = "ARCHIVE_OVERRIDE_JOBS",
        default_value_t = defaults::JOBS
    )]
    pub jobs: usize,

    /// Seconds allowed for each git invocation or download
    #[arg(
        long,
        value_name = "SECS",
        env = "ARCHIVE_OVERRIDE_FETCH_TIMEOUT",
        default_value_t = defaults::FETCH_TIMEOUT_SECS
    )]
    pub timeout: u64,

    /// Parent directory for per-tool scratch checkouts
    #[arg(long, value_name = "PATH", env = "ARCHIVE_OVERRIDE_WORKDIR")]
    pub workdir: Option<PathBuf>,
}

/// Execute the package command
pub fn execute(args: PackageArgs, output: &OutputConfig) -> Result<()> {
    let start_time = Instant::now();

    if !args.tools_info.exists() {
        anyhow::bail!("Tools info file not found: {}", args.tools_info.display());
    }
    let tools: ToolsInfo = model::load_json(&args.tools_info)
        .with_context(|| format!("Failed to load {}", args.tools_info.display()))?;

    output.status(
        Status::Package,
        &format!(
            "Processing {} tools ({} with submodules) for {}",
            tools.len(),
            tools.with_submodules.len(),
            args.tag
        ),
    );

    let config = PackagerConfig {
        output_dir: args.output_dir.clone(),
        tag: args.tag,
        work_root: args.workdir.unwrap_or_else(defaults::work_root),
        jobs: args.jobs,
    };
    let packager = Packager::new(config, Duration::from_secs(args.timeout))?;
    let cancelled = packager.cancel_handle();
    install_interrupt_handler(Arc::clone(&cancelled));
    let summary = packager.run(&tools)?;

    for (module, message) in summary
        .packages
        .failed
        .iter()
        .chain(summary.integrities.failed.iter())
    {
        output.status(Status::Failure, &format!("{}: {}", module, message));
    }
    for line in summary.lines() {
        output.status(Status::Success, &line);
    }
    output.status(
        Status::Success,
        &format!(
            "Wrote manifests to {} in {:.2}s",
            args.output_dir.display(),
            start_time.elapsed().as_secs_f64()
        ),
    );

    if cancelled.load(Ordering::SeqCst) {
        anyhow::bail!("Interrupted; manifests list only the tools finished before Ctrl-C");
    }
    Ok(())
}

/// Route SIGINT into the packager's cancellation flag.
fn install_interrupt_handler(cancelled: Arc<AtomicBool>) {
    let result = ctrlc::set_handler(move || {
        if request_cancel(&cancelled) {
            warn!("Interrupted; waiting for running tools (Ctrl-C again to abort)");
        } else {
            std::process::exit(130);
        }
    });
    // Only one handler may exist per process
    if let Err(e) = result {
        debug!("Interrupt handler not installed: {}", e);
    }
}

/// Set the flag; true if this is the first request.
fn request_cancel(cancelled: &AtomicBool) -> bool {
    !cancelled.swap(true, Ordering::SeqCst)
}

#[cfg(test)]
mod tests {
    use super::*;
    use archive_override::model::{INTEGRITIES_FILE, PACKAGES_FILE};
    use tempfile::TempDir;

    fn args(tools_info: PathBuf, output_dir: PathBuf) -> PackageArgs {
        PackageArgs {
            tools_info,
            output_dir,
            tag: "v1".to_string(),
            jobs: 2,
            timeout: 5,
            workdir: None,
        }
    }

    #[test]
    fn test_execute_missing_tools_info() {
        let temp_dir = TempDir::new().unwrap();
        let result = execute(
            args(temp_dir.path().join("missing.json"), temp_dir.path().join("out")),
            &OutputConfig::from_env_and_flag("never"),
        );
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Tools info file not found"));
        assert!(!temp_dir.path().join("out").exists());
    }

    #[test]
    fn test_execute_invalid_tools_info() {
        let temp_dir = TempDir::new().unwrap();
        let tools_info = temp_dir.path().join("tools.json");
        std::fs::write(&tools_info, "not json").unwrap();

        let result = execute(
            args(tools_info, temp_dir.path().join("out")),
            &OutputConfig::from_env_and_flag("never"),
        );
        assert!(result.unwrap_err().to_string().contains("Failed to load"));
    }

    #[test]
    fn test_execute_empty_tools_writes_empty_manifests() {
        let temp_dir = TempDir::new().unwrap();
        let tools_info = temp_dir.path().join("tools.json");
        let empty = r#"{"with_submodules": [], "without_submodules": []}"#;
        std::fs::write(&tools_info, empty).unwrap();
        let out = temp_dir.path().join("out");

        execute(args(tools_info, out.clone()), &OutputConfig::from_env_and_flag("never")).unwrap();

        assert!(out.join(PACKAGES_FILE).exists());
        assert!(out.join(INTEGRITIES_FILE).exists());
    }

    #[test]
    fn test_request_cancel_first_then_repeat() {
        let cancelled = AtomicBool::new(false);
        assert!(request_cancel(&cancelled));
        assert!(cancelled.load(Ordering::SeqCst));
        assert!(!request_cancel(&cancelled));
        assert!(cancelled.load(Ordering::SeqCst));
    }

    #[test]
    fn test_interrupt_flag_reaches_packager() {
        let temp_dir = TempDir::new().unwrap();
        let config = PackagerConfig {
            output_dir: temp_dir.path().join("out"),
            tag: "v1".to_string(),
            work_root: temp_dir.path().join("work"),
            jobs: 1,
        };
        let packager = Packager::new(config, Duration::from_secs(1)).unwrap();
        let cancelled = packager.cancel_handle();
        install_interrupt_handler(Arc::clone(&cancelled));
        install_interrupt_handler(Arc::clone(&cancelled));

        assert!(request_cancel(&cancelled));
        assert!(packager.cancel_handle().load(Ordering::SeqCst));
    }
}
