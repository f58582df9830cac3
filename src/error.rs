//! # Error Handling
//!
//! This module defines the centralized error type for the `archive-override`
//! library. It uses the `thiserror` library to derive an `Error` enum that
//! covers every failure a scan, packaging run or report rendering can hit.
//!
//! ## Key Components
//!
//! - **`Error`**: The main enum. Variants that belong to a single dependency
//!   carry its module identifier, so a failed packaging attempt can be logged
//!   with enough context to act on without aborting the rest of the batch.
//!
//! - **`Result<T>`**: A type alias for `std::result::Result<T, Error>`.
//!
//! Errors fall into two groups:
//!
//! - Setup errors (`ManifestRead`, `Io`, `Json` while loading inputs) abort a
//!   command before any per-item work begins.
//! - Per-item errors (`GitCommand`, `GitTimeout`, `Materialize`, `Network`,
//!   `Archive`, `Workspace`, `Cancelled`) are recovered inside the batch by
//!   the packager and only show up in logs and summary counts.

use thiserror::Error;

/// Main error type for archive-override operations
#[derive(Error, Debug)]
pub enum Error {
    /// The module manifest (e.g. `MODULE.bazel`) could not be read.
    #[error("Failed to read manifest {path}: {message}")]
    ManifestRead { path: String, message: String },

    /// A `git` subprocess exited unsuccessfully or could not be spawned.
    #[error("Git command failed for {url}: {command} - {stderr}")]
    GitCommand {
        command: String,
        url: String,
        stderr: String,
    },

    /// A `git` subprocess did not finish within the configured bound.
    #[error("Git command timed out for {url}: {command} after {seconds}s")]
    GitTimeout {
        command: String,
        url: String,
        seconds: u64,
    },

    /// The source tree of a dependency could not be materialized.
    #[error("Materialization failed for {module}: {message}")]
    Materialize { module: String, message: String },

    /// An HTTP request failed or returned an unexpected status.
    #[error("Network operation error: {url} - {message}")]
    Network { url: String, message: String },

    /// Building the tarball failed.
    #[error("Archive error for {module}: {message}")]
    Archive { module: String, message: String },

    /// A per-module workspace could not be created or prepared.
    #[error("Workspace error for {module}: {message}")]
    Workspace { module: String, message: String },

    /// The batch was cancelled before this item started.
    #[error("Cancelled before processing {module}")]
    Cancelled { module: String },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A JSON (de)serialization error, wrapped from `serde_json::Error`.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A regular expression error, wrapped from `regex::Error`.
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
