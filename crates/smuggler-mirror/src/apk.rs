//! APK mirror synthesis: `{arch}/APKINDEX.tar.gz` plus the `.apk` files.

use crate::error::{MirrorError, Result};
use crate::util::{copy_package_file, gzip, sort_for_output, write_file};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use smuggler_core::{ChecksumType, DepKind, Package, PackageFamily};
use std::fmt::Write as _;
use std::path::Path;
use tracing::info;

/// Write an APK repository over the downloaded subset.
///
/// Packages are grouped per architecture directory the way Alpine mirrors
/// lay them out.
pub fn write_apk_mirror(packages: &[Package], files_dir: &Path, out_dir: &Path) -> Result<()> {
    let mut packages = packages.to_vec();
    sort_for_output(&mut packages, PackageFamily::Apk);

    let mut archs: Vec<&str> = packages
        .iter()
        .map(|p| p.architecture.canonical_for(PackageFamily::Apk))
        .collect();
    archs.sort_unstable();
    archs.dedup();

    for arch in archs {
        let subset: Vec<&Package> = packages
            .iter()
            .filter(|p| p.architecture.canonical_for(PackageFamily::Apk) == arch)
            .collect();
        let arch_dir = out_dir.join(arch);

        for pkg in &subset {
            copy_package_file(files_dir, &arch_dir, &pkg.filename())?;
        }

        let index_text = apkindex_text(&subset)?;
        let container = gzip(&index_tar(index_text.as_bytes()));
        write_file(&arch_dir.join("APKINDEX.tar.gz"), &container)?;

        info!(arch, packages = subset.len(), "apk mirror written");
    }
    Ok(())
}

/// Render the `APKINDEX` text member in the single-letter grammar.
fn apkindex_text(packages: &[&Package]) -> Result<String> {
    let mut out = String::new();
    for pkg in packages {
        let _ = writeln!(out, "C:{}", encode_checksum(pkg)?);
        let _ = writeln!(out, "P:{}", pkg.name);
        let _ = writeln!(out, "V:{}", pkg.version);
        let _ = writeln!(out, "A:{}", pkg.architecture.canonical_for(PackageFamily::Apk));
        let _ = writeln!(out, "S:{}", pkg.size);
        if let Some(installed) = pkg.installed_size {
            let _ = writeln!(out, "I:{installed}");
        }
        if let Some(description) = &pkg.description {
            let _ = writeln!(out, "T:{description}");
        }
        if let Some(license) = &pkg.license {
            let _ = writeln!(out, "L:{license}");
        }

        let mut depends: Vec<String> = pkg
            .dependencies
            .iter()
            .filter(|d| d.kind == DepKind::Requires)
            .map(|d| match (&d.op, &d.version) {
                (Some(op), Some(version)) => format!("{}{}{}", d.name, op, version),
                _ => d.name.clone(),
            })
            .collect();
        depends.extend(pkg.conflicts.iter().map(|c| format!("!{c}")));
        if !depends.is_empty() {
            let _ = writeln!(out, "D:{}", depends.join(" "));
        }
        if !pkg.provides.is_empty() {
            let _ = writeln!(out, "p:{}", pkg.provides.join(" "));
        }
        out.push('\n');
    }
    Ok(out)
}

/// Re-encode a checksum in the index spelling: SHA-1 as `Q1` + base64,
/// SHA-256 as `sha256:` + hex.
fn encode_checksum(pkg: &Package) -> Result<String> {
    match pkg.checksum.algo {
        ChecksumType::Sha1 => {
            let raw = hex::decode(&pkg.checksum.value).map_err(|e| {
                MirrorError::Xml(format!("bad stored checksum for {}: {e}", pkg.name))
            })?;
            Ok(format!("Q1{}", BASE64.encode(raw)))
        }
        _ => Ok(format!("sha256:{}", pkg.checksum.value)),
    }
}

/// A deterministic single-member tar holding the index text.
fn index_tar(index: &[u8]) -> Vec<u8> {
    let mut builder = tar::Builder::new(Vec::new());
    let mut header = tar::Header::new_gnu();
    header.set_size(index.len() as u64);
    header.set_mode(0o644);
    header.set_mtime(0);
    header.set_uid(0);
    header.set_gid(0);
    header.set_cksum();
    // writing to a Vec cannot fail
    let _ = builder.append_data(&mut header, "APKINDEX", index);
    builder.into_inner().unwrap_or_default()
}
