//! Round-trip and determinism laws for the mirror writers.

use flate2::read::GzDecoder;
use smuggler_core::{Architecture, Package, PackageIdentity};
use smuggler_mirror::{write_apk_mirror, write_apt_mirror, write_yum_mirror};
use smuggler_test_utils::fixtures;
use std::io::Read;
use std::path::Path;

const REVISION: u64 = 1_719_400_000;

fn place_package_files(packages: &[Package], dir: &Path) {
    for pkg in packages {
        std::fs::write(dir.join(pkg.filename()), b"package-bytes").unwrap();
    }
}

fn gunzip(path: &Path) -> Vec<u8> {
    let compressed = std::fs::read(path).unwrap();
    let mut out = Vec::new();
    GzDecoder::new(&compressed[..])
        .read_to_end(&mut out)
        .unwrap();
    out
}

fn identities(packages: &[Package]) -> Vec<String> {
    let mut ids: Vec<String> = packages
        .iter()
        .map(Package::identity)
        .map(|id: PackageIdentity| id.to_string())
        .collect();
    ids.sort();
    ids
}

#[test]
fn yum_mirror_round_trips_by_identity() {
    let original = smuggler_index::yum::parse_primary(
        fixtures::PRIMARY_XML.as_bytes(),
        "baseos",
        Architecture::X86_64,
    )
    .unwrap();

    let files = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    place_package_files(&original, files.path());

    write_yum_mirror(&original, files.path(), out.path(), REVISION).unwrap();

    // the tree is complete
    for artefact in ["primary.xml.gz", "filelists.xml.gz", "other.xml.gz", "repomd.xml"] {
        assert!(out.path().join("repodata").join(artefact).exists());
    }
    assert!(out
        .path()
        .join("Packages/curl-7.76.1-29.el9.x86_64.rpm")
        .exists());

    // repomd lists the primary artefact with the checksum of the emitted file
    let repomd_entries = smuggler_index::yum::parse_repomd(
        &std::fs::read(out.path().join("repodata/repomd.xml")).unwrap(),
    )
    .unwrap();
    let primary_entry = smuggler_index::yum::primary_location(&repomd_entries).unwrap();
    let emitted = std::fs::read(out.path().join(&primary_entry.location)).unwrap();
    assert_eq!(
        primary_entry.checksum.as_ref().unwrap().value,
        fixtures::sha256_hex(&emitted)
    );

    // feeding the emitted primary back through the parser yields the same set
    let xml = gunzip(&out.path().join("repodata/primary.xml.gz"));
    let reparsed =
        smuggler_index::yum::parse_primary(&xml, "baseos", Architecture::X86_64).unwrap();
    assert_eq!(identities(&original), identities(&reparsed));

    // the real EVR is carried, not a constant
    let openssl = reparsed.iter().find(|p| p.name == "openssl-libs").unwrap();
    assert_eq!(openssl.epoch, Some(1));
    assert_eq!(openssl.release.as_deref(), Some("27.el9"));
}

#[test]
fn yum_mirror_is_byte_deterministic() {
    let packages = smuggler_index::yum::parse_primary(
        fixtures::PRIMARY_XML.as_bytes(),
        "baseos",
        Architecture::X86_64,
    )
    .unwrap();

    let files = tempfile::tempdir().unwrap();
    place_package_files(&packages, files.path());

    let first = tempfile::tempdir().unwrap();
    let second = tempfile::tempdir().unwrap();
    write_yum_mirror(&packages, files.path(), first.path(), REVISION).unwrap();
    write_yum_mirror(&packages, files.path(), second.path(), REVISION).unwrap();

    for artefact in ["primary.xml.gz", "filelists.xml.gz", "other.xml.gz", "repomd.xml"] {
        let a = std::fs::read(first.path().join("repodata").join(artefact)).unwrap();
        let b = std::fs::read(second.path().join("repodata").join(artefact)).unwrap();
        assert_eq!(a, b, "{artefact} differs between runs");
    }
}

#[test]
fn apt_mirror_round_trips_by_identity() {
    let original = smuggler_index::apt::parse_packages(
        fixtures::PACKAGES,
        "main",
        Architecture::Amd64,
    )
    .unwrap();

    let files = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    place_package_files(&original, files.path());

    write_apt_mirror(&original, files.path(), out.path(), REVISION).unwrap();

    let text = String::from_utf8(std::fs::read(out.path().join("Packages")).unwrap()).unwrap();
    let reparsed =
        smuggler_index::apt::parse_packages(&text, "main", Architecture::Amd64).unwrap();
    assert_eq!(identities(&original), identities(&reparsed));

    // the gz variant decompresses to the human form
    assert_eq!(gunzip(&out.path().join("Packages.gz")), text.as_bytes());

    // deb files sit flat next to the indices
    assert!(out
        .path()
        .join("curl_7.81.0-1ubuntu1.15_amd64.deb")
        .exists());
}

#[test]
fn apt_release_lists_checksums() {
    let packages = smuggler_index::apt::parse_packages(
        fixtures::PACKAGES,
        "main",
        Architecture::Amd64,
    )
    .unwrap();

    let files = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    place_package_files(&packages, files.path());
    write_apt_mirror(&packages, files.path(), out.path(), REVISION).unwrap();

    let release =
        String::from_utf8(std::fs::read(out.path().join("Release")).unwrap()).unwrap();
    assert!(release.contains("Codename: local"));
    assert!(release.contains("Components: ./"));
    assert!(release.contains("Architectures: amd64"));

    let packages_bytes = std::fs::read(out.path().join("Packages")).unwrap();
    let expected = format!(
        " {} {} Packages",
        fixtures::sha256_hex(&packages_bytes),
        packages_bytes.len()
    );
    assert!(release.contains(&expected), "Release must hash Packages");
}

#[test]
fn apk_mirror_round_trips_by_identity() {
    let original = smuggler_index::apk::parse_apkindex(
        fixtures::APKINDEX,
        "main",
        Architecture::X86_64,
    )
    .unwrap();

    let files = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    place_package_files(&original, files.path());

    write_apk_mirror(&original, files.path(), out.path()).unwrap();

    let container = std::fs::read(out.path().join("x86_64/APKINDEX.tar.gz")).unwrap();
    let index = extract_apkindex(&container);
    let reparsed = smuggler_index::apk::parse_apkindex(
        &String::from_utf8(index).unwrap(),
        "main",
        Architecture::X86_64,
    )
    .unwrap();

    assert_eq!(identities(&original), identities(&reparsed));

    // checksums survive the Q1 re-encoding
    let curl_before = original.iter().find(|p| p.name == "curl").unwrap();
    let curl_after = reparsed.iter().find(|p| p.name == "curl").unwrap();
    assert_eq!(curl_before.checksum, curl_after.checksum);

    assert!(out.path().join("x86_64/curl-8.5.0-r0.apk").exists());
}

#[test]
fn apk_mirror_is_byte_deterministic() {
    let packages = smuggler_index::apk::parse_apkindex(
        fixtures::APKINDEX,
        "main",
        Architecture::X86_64,
    )
    .unwrap();

    let files = tempfile::tempdir().unwrap();
    place_package_files(&packages, files.path());

    let first = tempfile::tempdir().unwrap();
    let second = tempfile::tempdir().unwrap();
    write_apk_mirror(&packages, files.path(), first.path()).unwrap();
    write_apk_mirror(&packages, files.path(), second.path()).unwrap();

    assert_eq!(
        std::fs::read(first.path().join("x86_64/APKINDEX.tar.gz")).unwrap(),
        std::fs::read(second.path().join("x86_64/APKINDEX.tar.gz")).unwrap()
    );
}

/// Extract the APKINDEX member from a gzipped tar.
fn extract_apkindex(container: &[u8]) -> Vec<u8> {
    let mut tar_bytes = Vec::new();
    GzDecoder::new(container)
        .read_to_end(&mut tar_bytes)
        .unwrap();
    let mut archive = tar::Archive::new(&tar_bytes[..]);
    for entry in archive.entries().unwrap() {
        let mut entry = entry.unwrap();
        if entry.path().unwrap().to_str() == Some("APKINDEX") {
            let mut out = Vec::new();
            entry.read_to_end(&mut out).unwrap();
            return out;
        }
    }
    panic!("APKINDEX member missing");
}
