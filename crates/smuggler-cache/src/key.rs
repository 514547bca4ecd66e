//! Cache keys and entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use smuggler_core::{Architecture, PackageFamily};
use std::fmt;

/// Which repository artefact an entry holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtefactKind {
    /// YUM `repodata/repomd.xml`.
    Repomd,
    /// YUM `primary.xml.gz`.
    Primary,
    /// APT `Packages.gz`.
    Packages,
    /// APT `Release`.
    Release,
    /// APK `APKINDEX.tar.gz`.
    ApkIndex,
}

impl ArtefactKind {
    /// Short identifier used in keys and filenames.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Repomd => "repomd",
            Self::Primary => "primary",
            Self::Packages => "packages",
            Self::Release => "release",
            Self::ApkIndex => "apkindex",
        }
    }
}

/// Key identifying one cached artefact.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey {
    /// Package-manager family.
    pub family: PackageFamily,
    /// Resolved repository base URL.
    pub repo_url: String,
    /// Target architecture.
    pub arch: Architecture,
    /// Artefact kind.
    pub artefact: ArtefactKind,
}

impl CacheKey {
    /// Create a key.
    #[must_use]
    pub fn new(
        family: PackageFamily,
        repo_url: impl Into<String>,
        arch: Architecture,
        artefact: ArtefactKind,
    ) -> Self {
        Self {
            family,
            repo_url: repo_url.into(),
            arch,
            artefact,
        }
    }

    /// Filename stem for the persistent tier: the display form with every
    /// non-alphanumeric byte replaced by `_`.
    #[must_use]
    pub fn file_stem(&self) -> String {
        self.to_string()
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect()
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}:{}",
            self.family,
            self.repo_url,
            self.arch,
            self.artefact.as_str()
        )
    }
}

/// A cached artefact with its bookkeeping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Raw artefact bytes as fetched.
    #[serde(with = "base64_bytes")]
    pub data: Vec<u8>,
    /// When the entry was stored.
    pub timestamp: DateTime<Utc>,
    /// When the entry was last read.
    pub last_access: DateTime<Utc>,
    /// Size of `data` in bytes.
    pub size: u64,
}

impl CacheEntry {
    /// Create an entry stamped with the current time.
    #[must_use]
    pub fn new(data: Vec<u8>) -> Self {
        let now = Utc::now();
        let size = data.len() as u64;
        Self {
            data,
            timestamp: now,
            last_access: now,
            size,
        }
    }

    /// Whether the entry is older than `ttl`.
    #[must_use]
    pub fn is_expired(&self, ttl: std::time::Duration) -> bool {
        let age = Utc::now().signed_duration_since(self.timestamp);
        age.to_std().map_or(true, |age| age > ttl)
    }
}

mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(data: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(data))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        STANDARD
            .decode(s.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}
