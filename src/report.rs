//! # Release Notes
//!
//! Renders the Markdown body of a release that replaces every `git_override`
//! with a copy-pasteable `archive_override`. Rendering is a pure function of
//! the scan output, the two packaging manifests, the release tag and the
//! `owner/name` of the repository publishing the release.
//!
//! Tools with submodules point at the tarball attached to the release. Tools
//! without submodules point at GitHub's own archive and carry the digest the
//! packager computed, or a comment explaining how to compute it when that
//! digest is missing. A tool with submodules that has no manifest entry
//! (its packaging failed) gets no snippet; it is listed after the code block.

use std::collections::HashMap;

use crate::model::{ClassifiedDependency, IntegrityRecord, PackageManifestEntry, ToolsInfo};

/// Version written into every generated `bazel_dep`.
pub const VERSION_PLACEHOLDER: &str = "1.0.0";

/// Everything the release notes are rendered from.
#[derive(Debug, Clone, Copy)]
pub struct ReleaseNotesInput<'a> {
    pub tools: &'a ToolsInfo,
    pub packages: &'a [PackageManifestEntry],
    pub integrities: &'a [IntegrityRecord],
    pub tag: &'a str,
    /// `owner/name` of the repository hosting the release.
    pub repository: &'a str,
}

/// Download URL of a tarball attached to a release.
pub fn release_asset_url(repository: &str, tag: &str, tarball_name: &str) -> String {
    format!(
        "https://github.com/{}/releases/download/{}/{}",
        repository, tag, tarball_name
    )
}

const RULE: &str =
    "# =============================================================================\n";

fn tool_line(tool: &ClassifiedDependency) -> String {
    format!(
        "- **{}** (commit [`{}`]({}))\n",
        tool.module_name,
        tool.short_commit(),
        tool.commit_url()
    )
}

fn override_block(
    module_name: &str,
    url: &str,
    strip_prefix: &str,
    integrity: Option<&str>,
) -> String {
    let mut block = format!(
        "bazel_dep(name = \"{module}\", version = \"{version}\")\n\
         archive_override(\n    \
             module_name = \"{module}\",\n    \
             urls = [\"{url}\"],\n    \
             strip_prefix = \"{strip_prefix}\",\n",
        module = module_name,
        version = VERSION_PLACEHOLDER,
        url = url,
        strip_prefix = strip_prefix,
    );
    match integrity {
        Some(integrity) => {
            block.push_str(&format!("    integrity = \"{}\",\n", integrity));
        }
        None => {
            block.push_str("    # No integrity hash was computed for this archive.\n");
            block.push_str(
                "    # Compute it with: curl -sL <url> | openssl dgst -sha256 -binary | base64\n",
            );
            block.push_str("    # then add: integrity = \"sha256-<output>\",\n");
        }
    }
    block.push_str(")\n\n");
    block
}

/// Render the release notes.
pub fn render_release_notes(input: &ReleaseNotesInput<'_>) -> String {
    let tools = input.tools;
    let packaged: HashMap<&str, &PackageManifestEntry> = input
        .packages
        .iter()
        .map(|p| (p.module_name.as_str(), p))
        .collect();
    let digests: HashMap<&str, &IntegrityRecord> = input
        .integrities
        .iter()
        .map(|r| (r.module_name.as_str(), r))
        .collect();

    let mut notes = String::new();
    notes.push_str(
        "Automated release: `archive_override` replacements for every `git_override`.\n\n",
    );
    notes.push_str("---\n\n");

    notes.push_str("## What's Included\n\n");
    notes.push_str("### Tools with submodules (packaged with submodules included)\n\n");
    if tools.with_submodules.is_empty() {
        notes.push_str("_None._\n");
    }
    for tool in &tools.with_submodules {
        notes.push_str(&tool_line(tool));
    }
    notes.push_str("\n### Tools without submodules (GitHub archive URLs)\n\n");
    if tools.without_submodules.is_empty() {
        notes.push_str("_None._\n");
    }
    for tool in &tools.without_submodules {
        notes.push_str(&tool_line(tool));
    }

    notes.push_str("\n### Summary\n\n");
    notes.push_str(&format!(
        "- {} of {} tools with submodules packaged\n",
        tools
            .with_submodules
            .iter()
            .filter(|t| packaged.contains_key(t.module_name.as_str()))
            .count(),
        tools.with_submodules.len()
    ));
    notes.push_str(&format!(
        "- {} of {} tools without submodules have a precomputed integrity hash\n",
        tools
            .without_submodules
            .iter()
            .filter(|t| digests.contains_key(t.module_name.as_str()))
            .count(),
        tools.without_submodules.len()
    ));
    if tools.skipped_declarations > 0 {
        notes.push_str(&format!(
            "- {} `git_override` declaration(s) skipped (missing attributes or non-GitHub remote)\n",
            tools.skipped_declarations
        ));
    }

    notes.push_str("\n---\n\n## Usage\n\n");
    notes.push_str("Replace `git_override` with `archive_override` in `MODULE.bazel`:\n\n");
    notes.push_str("```bzl\n");

    notes.push_str(RULE);
    notes.push_str("# Tools with submodules - archives attached to this release\n");
    notes.push_str(RULE);
    notes.push('\n');
    let mut not_packaged = Vec::new();
    for tool in &tools.with_submodules {
        match packaged.get(tool.module_name.as_str()) {
            Some(pkg) => {
                let url = release_asset_url(input.repository, input.tag, &pkg.tarball_name);
                notes.push_str(&override_block(
                    &tool.module_name,
                    &url,
                    &pkg.strip_prefix,
                    Some(&pkg.integrity),
                ));
            }
            None => not_packaged.push(tool),
        }
    }

    notes.push_str(RULE);
    notes.push_str("# Tools without submodules - GitHub archives\n");
    notes.push_str(RULE);
    notes.push('\n');
    for tool in &tools.without_submodules {
        let integrity = digests
            .get(tool.module_name.as_str())
            .map(|r| r.integrity.as_str());
        notes.push_str(&override_block(
            &tool.module_name,
            &tool.archive_url(),
            &tool.strip_prefix(),
            integrity,
        ));
    }
    notes.push_str("```\n\n");

    notes.push_str("---\n\n## Notes\n\n");
    notes.push_str("- Packaged archives contain every submodule, checked out recursively, with `.git` metadata removed.\n");
    notes.push_str(
        "- Integrity hashes are `sha256-` followed by the base64 SHA-256 of the exact archive bytes.\n",
    );
    notes.push_str("- `archive_override` needs no git in the build environment; keep `git_override` for active development.\n");
    if !not_packaged.is_empty() {
        notes.push_str("\nThe following tools could not be packaged for this release and keep their `git_override`:\n\n");
        for tool in not_packaged {
            notes.push_str(&tool_line(tool));
        }
    }

    notes.push_str(&format!(
        "\n---\n\n**Generated by** [CI](https://github.com/{}/actions)\n",
        input.repository
    ));
    notes
}
