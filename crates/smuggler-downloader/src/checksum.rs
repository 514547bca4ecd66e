//! Streaming checksum computation and verification.

use crate::error::{DownloadError, Result};
use digest::DynDigest;
use md5::Md5;
use sha1::Sha1;
use sha2::{Digest, Sha256, Sha512};
use smuggler_core::{Checksum, ChecksumType};
use std::io::Read;
use std::path::Path;

/// Incremental hasher for one download, created per item with the
/// package's declared algorithm.
pub struct Hasher {
    inner: Box<dyn DynDigest + Send>,
}

impl std::fmt::Debug for Hasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hasher").finish_non_exhaustive()
    }
}

impl Hasher {
    /// Create a hasher for the given algorithm.
    #[must_use]
    pub fn new(algo: ChecksumType) -> Self {
        let inner: Box<dyn DynDigest + Send> = match algo {
            ChecksumType::Md5 => Box::new(Md5::new()),
            ChecksumType::Sha1 => Box::new(Sha1::new()),
            ChecksumType::Sha256 => Box::new(Sha256::new()),
            ChecksumType::Sha512 => Box::new(Sha512::new()),
        };
        Self { inner }
    }

    /// Feed data.
    pub fn update(&mut self, data: &[u8]) {
        self.inner.update(data);
    }

    /// Finish and return the lowercase hex digest.
    #[must_use]
    pub fn finalize_hex(self) -> String {
        hex::encode(self.inner.finalize())
    }
}

/// Compute the hex digest of a file under the given algorithm.
pub fn hash_file(path: &Path, algo: ChecksumType) -> Result<String> {
    let file = std::fs::File::open(path).map_err(|e| DownloadError::io(path, e))?;
    let mut reader = std::io::BufReader::with_capacity(128 * 1024, file);
    let mut hasher = Hasher::new(algo);
    let mut buf = vec![0u8; 128 * 1024];

    loop {
        let n = reader
            .read(&mut buf)
            .map_err(|e| DownloadError::io(path, e))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hasher.finalize_hex())
}

/// Verify a file against its declared checksum.
pub fn verify_file(path: &Path, checksum: &Checksum, name: &str) -> Result<()> {
    let actual = hash_file(path, checksum.algo)?;
    if actual != checksum.value {
        return Err(DownloadError::ChecksumMismatch {
            name: name.to_string(),
            expected: checksum.value.clone(),
            actual,
        });
    }
    Ok(())
}
