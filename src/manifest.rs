//! # Override Declaration Scanning
//!
//! Extracts `git_override(...)` declarations from a module manifest such as
//! `MODULE.bazel`. A declaration becomes a [`DependencyRef`] when it carries
//! `module_name`, `commit` and `remote` string attributes (in any order, on
//! any number of lines) and its remote points at a GitHub repository.
//!
//! The module name must follow Bazel's module-name grammar and the commit
//! must be a plain ref (`[0-9A-Za-z._-]+`); both end up in file names.
//!
//! Anything else is not an error: the block is simply skipped and counted,
//! since it cannot be turned into a GitHub archive reference downstream.
//!
//! ```
//! use archive_override::manifest::OverrideScanner;
//!
//! let scanner = OverrideScanner::new().unwrap();
//! let scan = scanner.scan(r#"
//! git_override(
//!     module_name = "foo",
//!     remote = "https://github.com/acme/foo.git",
//!     commit = "abc123",
//! )
//! "#);
//! assert_eq!(scan.dependencies.len(), 1);
//! assert_eq!(scan.dependencies[0].repo, "foo");
//! ```

use std::collections::{HashMap, HashSet};
use std::path::Path;

use log::debug;
use regex::Regex;

use crate::error::{Error, Result};
use crate::model::DependencyRef;

/// Dependencies found in a manifest plus the number of dropped blocks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanResult {
    pub dependencies: Vec<DependencyRef>,
    pub skipped: usize,
}

/// Compiled patterns for scanning manifests.
pub struct OverrideScanner {
    opener: Regex,
    attribute: Regex,
    remote: Regex,
    module_name: Regex,
    commit: Regex,
}

impl OverrideScanner {
    pub fn new() -> Result<Self> {
        Ok(Self {
            opener: Regex::new(r"\bgit_override\s*\(")?,
            attribute: Regex::new(r#"\b(\w+)\s*=\s*"((?:[^"\\]|\\.)*)""#)?,
            remote: Regex::new(r"github\.com[:/]([A-Za-z0-9_.-]+)/([A-Za-z0-9_.-]+?)(?:\.git)?/?$")?,
            module_name: Regex::new(r"^[a-z]([a-z0-9._-]*[a-z0-9])?$")?,
            commit: Regex::new(r"^[0-9A-Za-z._-]+$")?,
        })
    }

    /// Read and scan a manifest file.
    pub fn scan_file(&self, path: &Path) -> Result<ScanResult> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::ManifestRead {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Ok(self.scan(&content))
    }

    /// Scan manifest text, keeping manifest order.
    pub fn scan(&self, content: &str) -> ScanResult {
        let content = strip_comments(content);
        let mut result = ScanResult::default();
        let mut seen = HashSet::new();

        for opener in self.opener.find_iter(&content) {
            let body = declaration_body(&content[opener.end()..]);
            match self.parse_declaration(body) {
                Some(dep) if seen.insert(dep.module_name.clone()) => {
                    result.dependencies.push(dep);
                }
                Some(dep) => {
                    debug!("Duplicate git_override for {}, keeping the first", dep.module_name);
                    result.skipped += 1;
                }
                None => result.skipped += 1,
            }
        }

        result
    }

    fn parse_declaration(&self, body: &str) -> Option<DependencyRef> {
        let mut attrs: HashMap<&str, &str> = HashMap::new();
        for caps in self.attribute.captures_iter(body) {
            let (Some(key), Some(value)) = (caps.get(1), caps.get(2)) else {
                continue;
            };
            attrs.entry(key.as_str()).or_insert(value.as_str());
        }

        let module_name = attrs.get("module_name")?;
        let commit = attrs.get("commit")?;
        let remote = attrs.get("remote")?;

        if !self.module_name.is_match(module_name) {
            debug!("Skipping {:?}: not a valid module name", module_name);
            return None;
        }
        if !self.commit.is_match(commit) {
            debug!("Skipping {}: commit {:?} is not a plain ref", module_name, commit);
            return None;
        }

        let Some((owner, repo)) = self.parse_remote(remote) else {
            debug!("Skipping {}: remote {} is not a GitHub URL", module_name, remote);
            return None;
        };

        Some(DependencyRef {
            module_name: module_name.to_string(),
            commit: commit.to_string(),
            remote: remote.to_string(),
            owner,
            repo,
        })
    }

    /// Split a GitHub remote into `(owner, repo)`.
    pub fn parse_remote(&self, remote: &str) -> Option<(String, String)> {
        let caps = self.remote.captures(remote.trim())?;
        let (owner, repo) = (&caps[1], &caps[2]);
        if [owner, repo].iter().any(|part| *part == "." || *part == "..") {
            return None;
        }
        Some((owner.to_string(), repo.to_string()))
    }
}

/// Text between the opening parenthesis and its matching close. An
/// unterminated declaration runs to the end of the input.
fn declaration_body(rest: &str) -> &str {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (idx, ch) in rest.char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '(' => depth += 1,
            ')' if depth == 0 => return &rest[..idx],
            ')' => depth -= 1,
            _ => {}
        }
    }
    rest
}

/// Drop `#` comments that are not inside a string literal.
fn strip_comments(content: &str) -> String {
    let mut out = String::with_capacity(content.len());

    for line in content.lines() {
        let mut in_string = false;
        let mut escaped = false;
        let mut end = line.len();
        for (idx, ch) in line.char_indices() {
            if in_string {
                match ch {
                    _ if escaped => escaped = false,
                    '\\' => escaped = true,
                    '"' => in_string = false,
                    _ => {}
                }
            } else if ch == '"' {
                in_string = true;
            } else if ch == '#' {
                end = idx;
                break;
            }
        }
        out.push_str(&line[..end]);
        out.push('\n');
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scanner() -> OverrideScanner {
        OverrideScanner::new().unwrap()
    }

    #[test]
    fn test_scan_single_line_declaration() {
        let scan = scanner().scan(
            r#"git_override(module_name = "foo", commit = "abc123", remote = "https://github.com/acme/foo.git")"#,
        );
        assert_eq!(scan.skipped, 0);
        assert_eq!(
            scan.dependencies,
            vec![DependencyRef {
                module_name: "foo".to_string(),
                commit: "abc123".to_string(),
                remote: "https://github.com/acme/foo.git".to_string(),
                owner: "acme".to_string(),
                repo: "foo".to_string(),
            }]
        );
    }

    #[test]
    fn test_scan_attribute_order_and_line_breaks() {
        let scan = scanner().scan(
            r#"
bazel_dep(name = "foo", version = "0.0.0")
git_override(
    remote = "https://github.com/acme/foo.git",
    commit =
        "abc123",
    module_name = "foo",
    patches = ["//patches:foo.patch"],
)
"#,
        );
        assert_eq!(scan.dependencies.len(), 1);
        let dep = &scan.dependencies[0];
        assert_eq!(dep.module_name, "foo");
        assert_eq!(dep.commit, "abc123");
        assert_eq!(dep.owner, "acme");
    }

    #[test]
    fn test_scan_preserves_manifest_order() {
        let scan = scanner().scan(
            r#"
git_override(module_name = "b", commit = "2", remote = "https://github.com/o/b.git")
git_override(module_name = "a", commit = "1", remote = "https://github.com/o/a.git")
git_override(module_name = "c", commit = "3", remote = "https://github.com/o/c")
"#,
        );
        let names: Vec<_> = scan.dependencies.iter().map(|d| d.module_name.as_str()).collect();
        assert_eq!(names, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_scan_skips_non_github_remote() {
        let scan = scanner().scan(
            r#"
git_override(module_name = "foo", commit = "1", remote = "https://gitlab.com/acme/foo.git")
git_override(module_name = "bar", commit = "2", remote = "https://github.com/acme/bar.git")
"#,
        );
        assert_eq!(scan.dependencies.len(), 1);
        assert_eq!(scan.dependencies[0].module_name, "bar");
        assert_eq!(scan.skipped, 1);
    }

    #[test]
    fn test_scan_skips_missing_attribute() {
        let scan = scanner().scan(
            r#"git_override(module_name = "foo", remote = "https://github.com/acme/foo.git", branch = "main")"#,
        );
        assert!(scan.dependencies.is_empty());
        assert_eq!(scan.skipped, 1);
    }

    #[test]
    fn test_scan_empty_manifest() {
        let scan =
            scanner().scan("module(name = \"top\")\nbazel_dep(name = \"x\", version = \"1\")\n");
        assert_eq!(scan, ScanResult::default());
    }

    #[test]
    fn test_scan_ignores_commented_declarations() {
        let scan = scanner().scan(
            r#"
# git_override(module_name = "old", commit = "0", remote = "https://github.com/acme/old.git")
git_override(
    module_name = "foo",  # the real one
    commit = "abc123",
    remote = "https://github.com/acme/foo.git",
)
"#,
        );
        assert_eq!(scan.dependencies.len(), 1);
        assert_eq!(scan.dependencies[0].module_name, "foo");
        assert_eq!(scan.skipped, 0);
    }

    #[test]
    fn test_scan_keeps_hash_inside_strings() {
        let scan = scanner().scan(
            r#"git_override(module_name = "foo", patch_cmds = "echo #1", commit = "abc", remote = "https://github.com/acme/foo.git")"#,
        );
        assert_eq!(scan.dependencies.len(), 1);
        assert_eq!(scan.dependencies[0].commit, "abc");
    }

    #[test]
    fn test_scan_skips_module_names_that_are_not_file_safe() {
        let scan = scanner().scan(
            r#"
git_override(module_name = "../elsewhere/foo", commit = "1", remote = "https://github.com/acme/foo.git")
git_override(module_name = "Foo", commit = "1", remote = "https://github.com/acme/foo.git")
git_override(module_name = "foo_", commit = "1", remote = "https://github.com/acme/foo.git")
git_override(module_name = "rules_foo.v2", commit = "1", remote = "https://github.com/acme/foo.git")
"#,
        );
        assert_eq!(scan.dependencies.len(), 1);
        assert_eq!(scan.dependencies[0].module_name, "rules_foo.v2");
        assert_eq!(scan.skipped, 3);
    }

    #[test]
    fn test_scan_skips_commits_with_path_separators() {
        let scan = scanner().scan(
            r#"
git_override(module_name = "a", commit = "../../tmp/x", remote = "https://github.com/acme/a.git")
git_override(module_name = "b", commit = "abc 123", remote = "https://github.com/acme/b.git")
git_override(module_name = "c", commit = "v1.2.3-rc_1", remote = "https://github.com/acme/c.git")
"#,
        );
        assert_eq!(scan.dependencies.len(), 1);
        assert_eq!(scan.dependencies[0].commit, "v1.2.3-rc_1");
        assert_eq!(scan.skipped, 2);
    }

    #[test]
    fn test_scan_duplicate_module_keeps_first() {
        let scan = scanner().scan(
            r#"
git_override(module_name = "foo", commit = "1", remote = "https://github.com/acme/foo.git")
git_override(module_name = "foo", commit = "2", remote = "https://github.com/acme/foo.git")
"#,
        );
        assert_eq!(scan.dependencies.len(), 1);
        assert_eq!(scan.dependencies[0].commit, "1");
        assert_eq!(scan.skipped, 1);
    }

    #[test]
    fn test_scan_does_not_match_similar_names() {
        let scan = scanner().scan(
            r#"new_git_override(module_name = "foo", commit = "1", remote = "https://github.com/acme/foo.git")"#,
        );
        assert!(scan.dependencies.is_empty());
    }

    #[test]
    fn test_parse_remote_shapes() {
        let s = scanner();
        assert_eq!(
            s.parse_remote("https://github.com/acme/foo.git"),
            Some(("acme".to_string(), "foo".to_string()))
        );
        assert_eq!(
            s.parse_remote("https://github.com/acme/foo"),
            Some(("acme".to_string(), "foo".to_string()))
        );
        assert_eq!(
            s.parse_remote("git@github.com:acme/foo.git"),
            Some(("acme".to_string(), "foo".to_string()))
        );
        assert_eq!(
            s.parse_remote("https://github.com/acme/foo.js.git"),
            Some(("acme".to_string(), "foo.js".to_string()))
        );
        assert_eq!(s.parse_remote("https://example.com/acme/foo.git"), None);
        assert_eq!(s.parse_remote("https://github.com/acme"), None);
        assert_eq!(s.parse_remote("https://github.com/acme/.."), None);
        assert_eq!(s.parse_remote("https://github.com/../foo.git"), None);
    }

    #[test]
    fn test_scan_file_missing_is_manifest_read_error() {
        let err = scanner()
            .scan_file(Path::new("/nonexistent/MODULE.bazel"))
            .unwrap_err();
        assert!(matches!(err, Error::ManifestRead { .. }));
    }
}
