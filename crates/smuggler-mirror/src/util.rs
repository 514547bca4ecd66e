//! Shared helpers for the family writers.

use crate::error::{MirrorError, Result};
use flate2::write::GzEncoder;
use flate2::Compression;
use sha2::{Digest, Sha256};
use smuggler_core::{Package, PackageFamily};
use std::io::Write;
use std::path::Path;

/// Gzip a buffer with a zeroed header so repeated runs over the same
/// input stay byte-identical.
pub fn gzip(data: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    // writing to a Vec cannot fail
    let _ = encoder.write_all(data);
    encoder.finish().unwrap_or_default()
}

/// Hex-encoded SHA-256.
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Deterministic ordering for every emitted index: name first, then the
/// family's version order.
pub fn sort_for_output(packages: &mut [Package], family: PackageFamily) {
    packages.sort_by(|a, b| {
        a.name
            .cmp(&b.name)
            .then_with(|| family.compare(&a.full_version(), &b.full_version()))
    });
}

/// Copy a downloaded package file into the mirror tree.
pub fn copy_package_file(files_dir: &Path, dest_dir: &Path, filename: &str) -> Result<u64> {
    let src = files_dir.join(filename);
    if !src.is_file() {
        return Err(MirrorError::MissingPackageFile { path: src });
    }
    std::fs::create_dir_all(dest_dir).map_err(|e| MirrorError::io(dest_dir, e))?;
    let dest = dest_dir.join(filename);
    std::fs::copy(&src, &dest).map_err(|e| MirrorError::io(&dest, e))
}

/// Write a file, creating parent directories.
pub fn write_file(path: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| MirrorError::io(parent, e))?;
    }
    std::fs::write(path, data).map_err(|e| MirrorError::io(path, e))
}

/// Split a composed dependency version `[epoch:]ver[-rel]` back into its
/// EVR attributes for XML emission.
pub fn split_evr(version: &str) -> (Option<&str>, &str, Option<&str>) {
    let (epoch, rest) = match version.split_once(':') {
        Some((e, rest)) if e.chars().all(|c| c.is_ascii_digit()) => (Some(e), rest),
        _ => (None, version),
    };
    match rest.rsplit_once('-') {
        Some((ver, rel)) if !ver.is_empty() => (epoch, ver, Some(rel)),
        _ => (epoch, rest, None),
    }
}
