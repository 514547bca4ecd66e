//! Post-processors for compressed and archived metadata payloads.

use crate::error::{FetchError, Result};
use flate2::read::{GzDecoder, MultiGzDecoder};
use std::io::Read;

/// Decompress a gzip payload.
pub fn gunzip(data: &[u8]) -> Result<Vec<u8>> {
    let mut decoder = GzDecoder::new(data);
    let mut out = Vec::with_capacity(data.len() * 4);
    decoder
        .read_to_end(&mut out)
        .map_err(|e| FetchError::Decode(format!("gzip: {e}")))?;
    Ok(out)
}

/// Extract a single regular-file member from a tar archive.
///
/// Zero blocks between entries are skipped: APK containers concatenate tar
/// segments, and the signature segment may or may not carry end-of-archive
/// markers.
pub fn untar_member(data: &[u8], member: &str) -> Result<Vec<u8>> {
    let mut archive = tar::Archive::new(data);
    archive.set_ignore_zeros(true);
    for entry in archive
        .entries()
        .map_err(|e| FetchError::Decode(format!("tar: {e}")))?
    {
        let mut entry = entry.map_err(|e| FetchError::Decode(format!("tar: {e}")))?;
        if entry.header().entry_type() != tar::EntryType::Regular {
            continue;
        }
        let path = entry
            .path()
            .map_err(|e| FetchError::Decode(format!("tar: {e}")))?;
        if path.to_str() == Some(member) {
            let mut out = Vec::new();
            entry
                .read_to_end(&mut out)
                .map_err(|e| FetchError::Decode(format!("tar: {e}")))?;
            return Ok(out);
        }
    }
    Err(FetchError::Decode(format!(
        "tar member '{member}' not found"
    )))
}

/// Gunzip then extract a tar member; the shape of `APKINDEX.tar.gz`.
///
/// The container is a sequence of gzip streams (detached signature first,
/// index second), so a multi-stream decoder runs over the whole payload
/// before the member search.
pub fn gunzip_untar_member(data: &[u8], member: &str) -> Result<Vec<u8>> {
    let mut decoder = MultiGzDecoder::new(data);
    let mut out = Vec::with_capacity(data.len() * 4);
    decoder
        .read_to_end(&mut out)
        .map_err(|e| FetchError::Decode(format!("gzip: {e}")))?;
    untar_member(&out, member)
}
