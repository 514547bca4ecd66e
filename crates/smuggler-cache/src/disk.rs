//! Persistent tier: one JSON file per cache entry.

use crate::key::{CacheEntry, CacheKey};
use serde::{Deserialize, Serialize};
use smuggler_core::{Error, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

/// On-disk record wrapping an entry with its key so the tier can be
/// rehydrated without guessing from filenames.
#[derive(Debug, Serialize, Deserialize)]
struct DiskRecord {
    key: CacheKey,
    #[serde(flatten)]
    entry: CacheEntry,
}

/// Content directory of JSON cache files.
#[derive(Debug)]
pub struct DiskTier {
    dir: PathBuf,
}

impl DiskTier {
    /// Open (creating if needed) the tier at `dir`.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|e| Error::io(&dir, e))?;
        Ok(Self { dir })
    }

    /// The tier's directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn entry_path(&self, key: &CacheKey) -> PathBuf {
        self.dir.join(format!("{}.json", key.file_stem()))
    }

    /// Write an entry. Failures are logged and swallowed; the memory tier
    /// stays authoritative.
    pub fn store(&self, key: &CacheKey, entry: &CacheEntry) {
        let path = self.entry_path(key);
        let record = DiskRecord {
            key: key.clone(),
            entry: entry.clone(),
        };
        let result = serde_json::to_vec(&record)
            .map_err(|e| Error::Cache(e.to_string()))
            .and_then(|json| std::fs::write(&path, json).map_err(|e| Error::io(&path, e)));
        if let Err(e) = result {
            warn!(key = %key, error = %e, "failed to persist cache entry");
        }
    }

    /// Remove an entry's file, if present.
    pub fn remove(&self, key: &CacheKey) {
        let _ = std::fs::remove_file(self.entry_path(key));
    }

    /// Scan the directory: delete expired files, return live entries.
    pub fn load_all(&self, ttl: Duration) -> Vec<(CacheKey, CacheEntry)> {
        let mut live = Vec::new();
        let Ok(entries) = std::fs::read_dir(&self.dir) else {
            return live;
        };

        for dir_entry in entries.flatten() {
            let path = dir_entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match std::fs::read(&path)
                .ok()
                .and_then(|data| serde_json::from_slice::<DiskRecord>(&data).ok())
            {
                Some(record) if !record.entry.is_expired(ttl) => {
                    live.push((record.key, record.entry));
                }
                _ => {
                    // expired or unreadable
                    debug!(path = %path.display(), "removing stale cache file");
                    let _ = std::fs::remove_file(&path);
                }
            }
        }
        live
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::ArtefactKind;
    use smuggler_core::{Architecture, PackageFamily};

    fn key(repo: &str) -> CacheKey {
        CacheKey::new(
            PackageFamily::Apt,
            repo,
            Architecture::Amd64,
            ArtefactKind::Packages,
        )
    }

    #[test]
    fn store_and_rehydrate() {
        let dir = tempfile::tempdir().unwrap();
        let tier = DiskTier::open(dir.path()).unwrap();

        let k = key("https://deb.debian.org/debian/dists/bookworm");
        tier.store(&k, &CacheEntry::new(b"Package: curl\n".to_vec()));

        let live = tier.load_all(Duration::from_secs(3600));
        assert_eq!(live.len(), 1);
        assert_eq!(live[0].0, k);
        assert_eq!(live[0].1.data, b"Package: curl\n");
    }

    #[test]
    fn expired_files_are_swept() {
        let dir = tempfile::tempdir().unwrap();
        let tier = DiskTier::open(dir.path()).unwrap();

        let k = key("https://deb.debian.org/debian/dists/bookworm");
        let mut entry = CacheEntry::new(vec![1]);
        entry.timestamp = chrono::Utc::now() - chrono::Duration::hours(3);
        tier.store(&k, &entry);

        assert!(tier.load_all(Duration::from_secs(3600)).is_empty());
        // second scan sees an empty directory
        assert!(tier.load_all(Duration::from_secs(3600)).is_empty());
    }

    #[test]
    fn unreadable_files_are_swept() {
        let dir = tempfile::tempdir().unwrap();
        let tier = DiskTier::open(dir.path()).unwrap();
        std::fs::write(dir.path().join("garbage.json"), b"not json").unwrap();

        assert!(tier.load_all(Duration::from_secs(3600)).is_empty());
        assert!(!dir.path().join("garbage.json").exists());
    }
}
