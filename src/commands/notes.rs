//! Notes command implementation

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use log::warn;

use archive_override::model::{
    self, IntegrityRecord, PackageManifestEntry, ToolsInfo, INTEGRITIES_FILE, PACKAGES_FILE,
};
use archive_override::report::{render_release_notes, ReleaseNotesInput};

/// Arguments for the notes command
#[derive(Args, Debug)]
pub struct NotesArgs {
    /// Directory the package command wrote its manifests to
    #[arg(value_name = "PACKAGES_DIR")]
    pub packages_dir: PathBuf,

    /// Tools JSON written by `scan`
    #[arg(value_name = "TOOLS_INFO_JSON")]
    pub tools_info: PathBuf,

    /// Release tag the tarballs are attached to
    #[arg(value_name = "TAG")]
    pub tag: String,

    /// Repository hosting the release, as owner/name
    #[arg(value_name = "REPOSITORY")]
    pub repository: String,

    /// Write the notes here instead of stdout
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,
}

/// Execute the notes command
pub fn execute(args: NotesArgs) -> Result<()> {
    let tools: ToolsInfo = model::load_json(&args.tools_info)
        .with_context(|| format!("Failed to load {}", args.tools_info.display()))?;

    let packages_path = args.packages_dir.join(PACKAGES_FILE);
    let packages: Vec<PackageManifestEntry> = model::load_json(&packages_path)
        .with_context(|| format!("Failed to load {}", packages_path.display()))?;

    let integrities_path = args.packages_dir.join(INTEGRITIES_FILE);
    let integrities: Vec<IntegrityRecord> = if integrities_path.exists() {
        model::load_json(&integrities_path)
            .with_context(|| format!("Failed to load {}", integrities_path.display()))?
    } else {
        warn!(
            "{} not found; snippets without submodules will have no integrity",
            integrities_path.display()
        );
        Vec::new()
    };

    let notes = render_release_notes(&ReleaseNotesInput {
        tools: &tools,
        packages: &packages,
        integrities: &integrities,
        tag: &args.tag,
        repository: &args.repository,
    });

    match &args.output {
        Some(path) => std::fs::write(path, &notes)
            .with_context(|| format!("Failed to write {}", path.display()))?,
        None => std::io::stdout().write_all(notes.as_bytes())?,
    }
    Ok(())
}
