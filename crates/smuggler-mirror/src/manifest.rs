//! `metadata.json`: the install-ordered manifest for archive-style output.

use crate::error::{MirrorError, Result};
use crate::util::write_file;
use serde::{Deserialize, Serialize};
use smuggler_core::Package;
use std::path::Path;

/// One manifest row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// Package name.
    pub name: String,
    /// Version string.
    pub version: String,
    /// Architecture in the family spelling.
    pub arch: String,
    /// Download size in bytes.
    pub size: u64,
    /// Family filename the package was stored under.
    pub filename: String,
}

impl From<&Package> for ManifestEntry {
    fn from(pkg: &Package) -> Self {
        Self {
            name: pkg.name.clone(),
            version: pkg.full_version(),
            arch: pkg.architecture.to_string(),
            size: pkg.size,
            filename: pkg.filename(),
        }
    }
}

/// Write `metadata.json` preserving the given (install) order.
pub fn write_manifest(packages: &[Package], out_dir: &Path) -> Result<()> {
    let entries: Vec<ManifestEntry> = packages.iter().map(ManifestEntry::from).collect();
    let json =
        serde_json::to_vec_pretty(&entries).map_err(|e| MirrorError::Xml(e.to_string()))?;
    write_file(&out_dir.join("metadata.json"), &json)
}

/// Read a manifest back.
pub fn read_manifest(path: &Path) -> Result<Vec<ManifestEntry>> {
    let data = std::fs::read(path).map_err(|e| MirrorError::io(path, e))?;
    serde_json::from_slice(&data).map_err(|e| MirrorError::Xml(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use smuggler_test_utils::PackageBuilder;

    #[test]
    fn manifest_preserves_order() {
        let packages = vec![
            PackageBuilder::rpm("zlib", "1.2.11", "40.el9").build(),
            PackageBuilder::rpm("curl", "8.0.1", "1.el9").build(),
        ];
        let dir = tempfile::tempdir().unwrap();
        write_manifest(&packages, dir.path()).unwrap();

        let entries = read_manifest(&dir.path().join("metadata.json")).unwrap();
        // install order is the caller's order, not alphabetical
        assert_eq!(entries[0].name, "zlib");
        assert_eq!(entries[1].name, "curl");
        assert_eq!(entries[1].filename, "curl-8.0.1-1.el9.x86_64.rpm");
        assert_eq!(entries[0].version, "1.2.11-40.el9");
    }
}
