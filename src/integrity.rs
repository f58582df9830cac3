//! Subresource-integrity digests in the form Bazel's `integrity` attribute
//! expects: `sha256-` followed by the standard base64 of the raw SHA-256.
//!
//! Hex digests or unprefixed base64 are rejected by Bazel, so everything
//! that produces an integrity string goes through this module.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use sha2::{Digest, Sha256};

/// Algorithm tag prepended to every digest.
pub const INTEGRITY_PREFIX: &str = "sha256-";

const BUFFER_SIZE: usize = 8192;

/// Format a raw SHA-256 digest as an integrity string.
pub fn encode(digest: &[u8]) -> String {
    format!("{}{}", INTEGRITY_PREFIX, BASE64.encode(digest))
}

/// Digest an in-memory byte slice.
pub fn of_bytes(bytes: &[u8]) -> String {
    encode(&Sha256::digest(bytes))
}

/// Stream a reader through SHA-256 in fixed-size chunks.
pub fn of_reader<R: Read>(mut reader: R) -> io::Result<String> {
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; BUFFER_SIZE];

    loop {
        let read = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&buffer[..read]);
    }

    Ok(encode(&hasher.finalize()))
}

/// Digest a file on disk.
pub fn of_file(path: &Path) -> io::Result<String> {
    of_reader(File::open(path)?)
}
