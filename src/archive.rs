//! # Reproducible Tarballs
//!
//! `TarGzArchiver` writes a `.tar.gz` of a directory whose bytes depend only
//! on the directory's logical content:
//!
//! - entries are emitted in sorted path order
//! - every header uses a fixed mtime, uid/gid 0 and no owner names
//! - modes are normalised to `0755` (directories, executables) or `0644`
//! - the gzip header carries no timestamp or file name
//! - any `.git` entry is left out, whether it is a directory or the `.git`
//!   file a submodule checkout leaves behind
//!
//! The archive root is the source directory's own name, so archiving
//! `/tmp/ws/foo-abc123` yields entries under `foo-abc123/`.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use flate2::write::GzEncoder;
use flate2::Compression;
use log::debug;
use tar::{Builder, EntryType, Header};
use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::tree::VCS_DIR;

/// Timestamp stamped on every entry (2024-01-01T00:00:00Z).
pub const ARCHIVE_MTIME: u64 = 1704067200;

/// Trait for archive creation - allows mocking in tests
pub trait Archiver: Send + Sync {
    /// Archive `source_dir` into a new file at `output`.
    fn archive(&self, source_dir: &Path, output: &Path) -> Result<()>;
}

/// Deterministic gzip-compressed tar writer.
#[derive(Debug, Default, Clone, Copy)]
pub struct TarGzArchiver;

impl Archiver for TarGzArchiver {
    fn archive(&self, source_dir: &Path, output: &Path) -> Result<()> {
        let result = write_tar_gz(source_dir, output);
        if result.is_err() && output.exists() {
            let _ = fs::remove_file(output);
        }
        result
    }
}

fn archive_error(source_dir: &Path, message: impl Into<String>) -> Error {
    Error::Archive {
        module: source_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
        message: message.into(),
    }
}

fn write_tar_gz(source_dir: &Path, output: &Path) -> Result<()> {
    let root_name = source_dir
        .file_name()
        .ok_or_else(|| archive_error(source_dir, "source directory has no name"))?;
    let root_name = PathBuf::from(root_name);

    let file = BufWriter::new(File::create(output)?);
    // GzEncoder::new writes a header with mtime 0 and no file name.
    let encoder = GzEncoder::new(file, Compression::default());
    let mut builder = Builder::new(encoder);
    builder.follow_symlinks(false);

    let walker = WalkDir::new(source_dir)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.file_name() != VCS_DIR);

    let mut count = 0usize;
    for entry in walker {
        let entry = entry.map_err(|e| archive_error(source_dir, e.to_string()))?;
        let relative = entry
            .path()
            .strip_prefix(source_dir)
            .map_err(|e| archive_error(source_dir, e.to_string()))?;
        let archive_path = root_name.join(relative);
        let file_type = entry.file_type();

        let mut header = Header::new_gnu();
        header.set_mtime(ARCHIVE_MTIME);
        header.set_uid(0);
        header.set_gid(0);

        if file_type.is_dir() {
            header.set_entry_type(EntryType::Directory);
            header.set_mode(0o755);
            header.set_size(0);
            builder.append_data(&mut header, &archive_path, std::io::empty())?;
        } else if file_type.is_symlink() {
            let target = fs::read_link(entry.path())?;
            header.set_entry_type(EntryType::Symlink);
            header.set_mode(0o777);
            header.set_size(0);
            builder.append_link(&mut header, &archive_path, &target)?;
        } else if file_type.is_file() {
            let metadata = entry
                .metadata()
                .map_err(|e| archive_error(source_dir, e.to_string()))?;
            header.set_entry_type(EntryType::Regular);
            header.set_mode(if is_executable(&metadata) { 0o755 } else { 0o644 });
            header.set_size(metadata.len());
            builder.append_data(&mut header, &archive_path, File::open(entry.path())?)?;
        } else {
            debug!("Skipping special file {}", entry.path().display());
            continue;
        }
        count += 1;
    }

    let encoder = builder.into_inner()?;
    let mut file = encoder.finish()?;
    file.flush()?;

    debug!("Wrote {} entries to {}", count, output.display());
    Ok(())
}

#[cfg(unix)]
fn is_executable(metadata: &fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn is_executable(_metadata: &fs::Metadata) -> bool {
    false
}
