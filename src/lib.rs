//! # Archive Override Library
//!
//! This library turns the `git_override` declarations of a Bazel
//! `MODULE.bazel` into pinned, integrity-checked `archive_override`
//! replacements. It backs the `archive-override` command-line tool, which CI
//! runs in three stages: scan, package, notes.
//!
//! ## Quick Example
//!
//! ```
//! use archive_override::integrity;
//! use archive_override::manifest::OverrideScanner;
//!
//! let scanner = OverrideScanner::new().unwrap();
//! let scan = scanner.scan(
//!     r#"git_override(module_name = "foo", commit = "abc123", remote = "https://github.com/acme/foo.git")"#,
//! );
//! let foo = &scan.dependencies[0];
//! assert_eq!(foo.strip_prefix(), "foo-abc123");
//! assert_eq!(foo.archive_url(), "https://github.com/acme/foo/archive/abc123.tar.gz");
//!
//! assert!(integrity::of_bytes(b"archive bytes").starts_with("sha256-"));
//! ```
//!
//! ## Execution Flow
//!
//! 1.  **Scan** (`manifest`, `probe`): extract GitHub-backed overrides and
//!     split them by whether the pinned tree has a `.gitmodules` file.
//! 2.  **Package** (`packager`): for tools with submodules, check out the full
//!     tree in a private `workspace`, build a reproducible tarball (`archive`)
//!     and digest it; for the others, digest GitHub's archive as it streams in.
//! 3.  **Notes** (`report`): render copy-pasteable `archive_override` blocks.
//!
//! `git` and HTTP access sit behind the traits in `source` and `probe`, so
//! everything above can be tested with in-memory fakes (`tree`).

pub mod archive;
pub mod defaults;
pub mod error;
pub mod git;
pub mod integrity;
pub mod manifest;
pub mod model;
pub mod output;
pub mod packager;
pub mod probe;
pub mod report;
pub mod source;
pub mod tree;
pub mod workspace;

#[cfg(test)]
mod manifest_proptest;
