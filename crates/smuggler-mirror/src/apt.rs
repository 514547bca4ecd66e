//! APT mirror synthesis: a flat repository (`deb file:/path ./`).
//!
//! The tree holds the `.deb` files next to `Packages`, `Packages.gz`, and
//! `Release`, with `Components: ./` so apt treats it as a trivial archive.

use crate::error::Result;
use crate::util::{copy_package_file, gzip, sha256_hex, sort_for_output, write_file};
use chrono::{DateTime, Utc};
use smuggler_core::{DepKind, Dependency, Package, PackageFamily};
use std::fmt::Write as _;
use std::path::Path;
use tracing::info;

/// Write a flat APT repository over the downloaded subset.
///
/// `revision` is the synthesis time as a Unix timestamp; it feeds the
/// `Date` field deterministically.
pub fn write_apt_mirror(
    packages: &[Package],
    files_dir: &Path,
    out_dir: &Path,
    revision: u64,
) -> Result<()> {
    let mut packages = packages.to_vec();
    sort_for_output(&mut packages, PackageFamily::Apt);

    for pkg in &packages {
        copy_package_file(files_dir, out_dir, &pkg.filename())?;
    }

    let packages_text = packages_file(&packages);
    let packages_bytes = packages_text.as_bytes();
    let packages_gz = gzip(packages_bytes);

    write_file(&out_dir.join("Packages"), packages_bytes)?;
    write_file(&out_dir.join("Packages.gz"), &packages_gz)?;

    let release = release_file(&packages, packages_bytes, &packages_gz, revision);
    write_file(&out_dir.join("Release"), release.as_bytes())?;

    info!(packages = packages.len(), out = %out_dir.display(), "apt mirror written");
    Ok(())
}

fn packages_file(packages: &[Package]) -> String {
    let mut out = String::new();
    for pkg in packages {
        let _ = writeln!(out, "Package: {}", pkg.name);
        let _ = writeln!(out, "Version: {}", pkg.version);
        let _ = writeln!(
            out,
            "Architecture: {}",
            pkg.architecture.canonical_for(PackageFamily::Apt)
        );
        if let Some(installed) = pkg.installed_size {
            let _ = writeln!(out, "Installed-Size: {}", installed / 1024);
        }
        if let Some(depends) = depends_field(&pkg.dependencies, DepKind::Requires) {
            let _ = writeln!(out, "Depends: {depends}");
        }
        if let Some(recommends) = depends_field(&pkg.dependencies, DepKind::Recommends) {
            let _ = writeln!(out, "Recommends: {recommends}");
        }
        if let Some(suggests) = depends_field(&pkg.dependencies, DepKind::Suggests) {
            let _ = writeln!(out, "Suggests: {suggests}");
        }
        if !pkg.provides.is_empty() {
            let _ = writeln!(out, "Provides: {}", pkg.provides.join(", "));
        }
        if !pkg.conflicts.is_empty() {
            let _ = writeln!(out, "Conflicts: {}", pkg.conflicts.join(", "));
        }
        let _ = writeln!(out, "Filename: ./{}", pkg.filename());
        let _ = writeln!(out, "Size: {}", pkg.size);
        let _ = writeln!(out, "{}: {}", checksum_field(pkg), pkg.checksum.value);
        if let Some(description) = &pkg.description {
            let _ = writeln!(out, "Description: {description}");
        }
        out.push('\n');
    }
    out
}

fn checksum_field(pkg: &Package) -> &'static str {
    match pkg.checksum.algo {
        smuggler_core::ChecksumType::Md5 => "MD5sum",
        smuggler_core::ChecksumType::Sha1 => "SHA1",
        // APT has no SHA512 field in common use; emit the strongest it
        // reads
        _ => "SHA256",
    }
}

fn depends_field(dependencies: &[Dependency], kind: DepKind) -> Option<String> {
    let entries: Vec<String> = dependencies
        .iter()
        .filter(|d| d.kind == kind)
        .map(|d| match (&d.op, &d.version) {
            (Some(op), Some(version)) => format!("{} ({} {})", d.name, op, version),
            _ => d.name.clone(),
        })
        .collect();
    if entries.is_empty() {
        None
    } else {
        Some(entries.join(", "))
    }
}

fn release_file(
    packages: &[Package],
    packages_bytes: &[u8],
    packages_gz: &[u8],
    revision: u64,
) -> String {
    let mut architectures: Vec<&str> = packages
        .iter()
        .map(|p| p.architecture.canonical_for(PackageFamily::Apt))
        .collect();
    architectures.sort_unstable();
    architectures.dedup();

    let date = DateTime::<Utc>::from_timestamp(revision as i64, 0)
        .unwrap_or_else(|| DateTime::<Utc>::UNIX_EPOCH)
        .to_rfc2822();

    let mut out = String::new();
    out.push_str("Origin: smuggler\n");
    out.push_str("Label: smuggler\n");
    out.push_str("Suite: local\n");
    out.push_str("Codename: local\n");
    let _ = writeln!(out, "Date: {date}");
    let _ = writeln!(out, "Architectures: {}", architectures.join(" "));
    out.push_str("Components: ./\n");
    out.push_str("Description: offline mirror generated by smuggler\n");
    out.push_str("SHA256:\n");
    let _ = writeln!(
        out,
        " {} {} Packages",
        sha256_hex(packages_bytes),
        packages_bytes.len()
    );
    let _ = writeln!(
        out,
        " {} {} Packages.gz",
        sha256_hex(packages_gz),
        packages_gz.len()
    );
    out
}
