//! Thin wrappers around the system `git` command.
//!
//! Using the system binary picks up whatever SSH keys, credential helpers and
//! `~/.gitconfig` settings the CI runner already has. Every invocation is
//! bounded by a timeout and never prompts for credentials.

use std::fs;
use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::debug;
use wait_timeout::ChildExt;

use crate::error::{Error, Result};

/// Run `git <args>` in `cwd`, killing it if it outlives `timeout`.
fn run_git(args: &[&str], cwd: Option<&Path>, url: &str, timeout: Duration) -> Result<()> {
    run_bounded("git", args, cwd, url, timeout)
}

fn run_bounded(
    program: &str,
    args: &[&str],
    cwd: Option<&Path>,
    url: &str,
    timeout: Duration,
) -> Result<()> {
    let command = args.join(" ");
    debug!("{} {}", program, command);

    let mut cmd = Command::new(program);
    cmd.args(args)
        .env("GIT_TERMINAL_PROMPT", "0")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped());
    if let Some(dir) = cwd {
        cmd.current_dir(dir);
    }

    let mut child = cmd.spawn().map_err(|e| Error::GitCommand {
        command: command.clone(),
        url: url.to_string(),
        stderr: e.to_string(),
    })?;

    // Drained on its own thread so a chatty child never blocks on a full pipe.
    let stderr_reader = child.stderr.take().map(|mut pipe| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = pipe.read_to_end(&mut buf);
            buf
        })
    });

    match child.wait_timeout(timeout)? {
        Some(status) if status.success() => {
            join_stderr(stderr_reader);
            Ok(())
        }
        Some(_) => Err(Error::GitCommand {
            command,
            url: url.to_string(),
            stderr: join_stderr(stderr_reader),
        }),
        None => {
            let _ = child.kill();
            let _ = child.wait();
            // Grandchildren may still hold the pipe open; leave the reader detached.
            Err(Error::GitTimeout {
                command,
                url: url.to_string(),
                seconds: timeout.as_secs(),
            })
        }
    }
}

fn join_stderr(reader: Option<JoinHandle<Vec<u8>>>) -> String {
    reader
        .and_then(|handle| handle.join().ok())
        .map(|bytes| String::from_utf8_lossy(&bytes).trim().to_string())
        .unwrap_or_default()
}

/// Full clone of `url` into `target_dir`.
///
/// A full clone is needed because the pinned commit is usually not the tip
/// of any branch.
pub fn clone(url: &str, target_dir: &Path, timeout: Duration) -> Result<()> {
    if target_dir.exists() {
        fs::remove_dir_all(target_dir)?;
    }
    if let Some(parent) = target_dir.parent() {
        fs::create_dir_all(parent)?;
    }

    let target = target_dir.to_string_lossy();
    run_git(&["clone", "--quiet", url, target.as_ref()], None, url, timeout)
}

/// Detached checkout of `commit` in an existing clone.
pub fn checkout(repo_dir: &Path, commit: &str, url: &str, timeout: Duration) -> Result<()> {
    run_git(
        &["-c", "advice.detachedHead=false", "checkout", "--quiet", commit],
        Some(repo_dir),
        url,
        timeout,
    )
}

/// Initialise and check out every submodule, recursively.
pub fn update_submodules(repo_dir: &Path, url: &str, timeout: Duration) -> Result<()> {
    run_git(
        &["submodule", "update", "--init", "--recursive", "--quiet"],
        Some(repo_dir),
        url,
        timeout,
    )
}
