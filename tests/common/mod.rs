//! Shared test utilities for integration and E2E tests.
//!
//! ## Usage
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! let fixture = TestFixture::new().with_file("MODULE.bazel", manifests::SINGLE);
//! fixture.command().arg("scan").arg("MODULE.bazel").assert().success();
//! ```

use assert_fs::prelude::*;
use std::path::Path;

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    #[allow(unused_imports)]
    pub use assert_cmd::cargo::cargo_bin_cmd;
    #[allow(unused_imports)]
    pub use assert_fs::prelude::*;
    #[allow(unused_imports)]
    pub use predicates::prelude::*;

    #[allow(unused_imports)]
    pub use super::manifests;
    #[allow(unused_imports)]
    pub use super::tools_json;
    pub use super::TestFixture;
}

/// Manifest snippets for testing.
#[allow(dead_code)]
pub mod manifests {
    /// A single GitHub-backed override.
    pub const SINGLE: &str = r#"
module(name = "top", version = "0.1.0")

bazel_dep(name = "foo", version = "0.0.0")
git_override(
    module_name = "foo",
    commit = "abc123",
    remote = "https://github.com/acme/foo.git",
)
"#;

    /// Overrides that are all skipped: non-GitHub remote, missing commit.
    pub const NOTHING_ACTIONABLE: &str = r#"
git_override(
    module_name = "lab",
    commit = "abc123",
    remote = "https://gitlab.com/acme/lab.git",
)
git_override(
    module_name = "branchy",
    branch = "main",
    remote = "https://github.com/acme/branchy.git",
)
"#;
}

/// Tools JSON with one tool per class, as `scan` would write it.
#[allow(dead_code)]
pub fn tools_json(with: &[(&str, &str)], without: &[(&str, &str)]) -> String {
    let tool = |(name, commit): &(&str, &str), has: bool| {
        format!(
            r#"{{"module_name": "{name}", "commit": "{commit}", "remote": "https://github.com/acme/{name}.git", "owner": "acme", "repo": "{name}", "has_submodules": {has}}}"#
        )
    };
    let with: Vec<String> = with.iter().map(|t| tool(t, true)).collect();
    let without: Vec<String> = without.iter().map(|t| tool(t, false)).collect();
    format!(
        r#"{{"with_submodules": [{}], "without_submodules": [{}]}}"#,
        with.join(", "),
        without.join(", ")
    )
}

/// A temporary directory to run the CLI in.
pub struct TestFixture {
    temp_dir: assert_fs::TempDir,
}

#[allow(dead_code)]
impl TestFixture {
    pub fn new() -> Self {
        Self {
            temp_dir: assert_fs::TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Add a file with the given path and content.
    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.temp_dir
            .child(path)
            .write_str(content)
            .expect("Failed to write file");
        self
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn child(&self, path: &str) -> assert_fs::fixture::ChildPath {
        self.temp_dir.child(path)
    }

    /// Create a command configured to run in this fixture's directory.
    pub fn command(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("archive-override");
        cmd.current_dir(self.path()).arg("--color").arg("never");
        cmd
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}
