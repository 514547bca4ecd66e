//! YUM mirror synthesis: `Packages/` plus `repodata/`.

use crate::error::Result;
use crate::util::{copy_package_file, gzip, sha256_hex, sort_for_output, split_evr, write_file};
use crate::xml::XmlDoc;
use smuggler_core::{DepKind, DepOperator, Dependency, Package, PackageFamily};
use std::path::Path;
use tracing::info;

const COMMON_NS: &str = "http://linux.duke.edu/metadata/common";
const RPM_NS: &str = "http://linux.duke.edu/metadata/rpm";
const FILELISTS_NS: &str = "http://linux.duke.edu/metadata/filelists";
const OTHER_NS: &str = "http://linux.duke.edu/metadata/other";
const REPO_NS: &str = "http://linux.duke.edu/metadata/repo";

/// Write a YUM repository tree over the downloaded subset.
///
/// `files_dir` holds the downloaded `.rpm` files under their family
/// filenames; `revision` stamps `repomd.xml` (callers pass the synthesis
/// time; tests pin it for byte-identical output).
pub fn write_yum_mirror(
    packages: &[Package],
    files_dir: &Path,
    out_dir: &Path,
    revision: u64,
) -> Result<()> {
    let mut packages = packages.to_vec();
    sort_for_output(&mut packages, PackageFamily::Yum);

    let pkg_dir = out_dir.join("Packages");
    for pkg in &packages {
        copy_package_file(files_dir, &pkg_dir, &pkg.filename())?;
    }

    let primary = primary_xml(&packages)?;
    let filelists = filelists_xml(&packages)?;
    let other = other_xml(&packages)?;

    let mut artefacts = Vec::new();
    for (kind, xml) in [
        ("primary", primary),
        ("filelists", filelists),
        ("other", other),
    ] {
        let compressed = gzip(&xml);
        let location = format!("repodata/{kind}.xml.gz");
        write_file(&out_dir.join(&location), &compressed)?;
        artefacts.push(RepomdData {
            kind,
            location,
            checksum: sha256_hex(&compressed),
            open_checksum: sha256_hex(&xml),
            size: compressed.len() as u64,
            open_size: xml.len() as u64,
        });
    }

    let repomd = repomd_xml(&artefacts, revision)?;
    write_file(&out_dir.join("repodata/repomd.xml"), &repomd)?;

    info!(packages = packages.len(), out = %out_dir.display(), "yum mirror written");
    Ok(())
}

struct RepomdData {
    kind: &'static str,
    location: String,
    checksum: String,
    open_checksum: String,
    size: u64,
    open_size: u64,
}

fn primary_xml(packages: &[Package]) -> Result<Vec<u8>> {
    let mut doc = XmlDoc::new()?;
    let count = packages.len().to_string();
    doc.start(
        "metadata",
        &[
            ("xmlns", COMMON_NS),
            ("xmlns:rpm", RPM_NS),
            ("packages", count.as_str()),
        ],
    )?;

    for pkg in packages {
        doc.start("package", &[("type", "rpm")])?;
        doc.text_element("name", &[], &pkg.name)?;
        doc.text_element("arch", &[], pkg.architecture.as_str())?;
        write_version_attrs(&mut doc, pkg)?;
        doc.text_element(
            "checksum",
            &[("type", pkg.checksum.algo.as_str()), ("pkgid", "YES")],
            &pkg.checksum.value,
        )?;
        if let Some(description) = &pkg.description {
            doc.text_element("summary", &[], description)?;
        }
        let size = pkg.size.to_string();
        let mut size_attrs = vec![("package", size.as_str())];
        let installed = pkg.installed_size.map(|s| s.to_string());
        if let Some(installed) = &installed {
            size_attrs.push(("installed", installed.as_str()));
        }
        doc.empty("size", &size_attrs)?;
        let href = format!("Packages/{}", pkg.filename());
        doc.empty("location", &[("href", href.as_str())])?;

        doc.start("format", &[])?;
        if let Some(license) = &pkg.license {
            doc.text_element("rpm:license", &[], license)?;
        }

        // provides always includes the package's own name
        doc.start("rpm:provides", &[])?;
        if !pkg.provides.iter().any(|p| p == &pkg.name) {
            doc.empty("rpm:entry", &[("name", pkg.name.as_str())])?;
        }
        for capability in &pkg.provides {
            doc.empty("rpm:entry", &[("name", capability.as_str())])?;
        }
        doc.end("rpm:provides")?;

        write_dep_list(&mut doc, "rpm:requires", pkg, DepKind::Requires)?;
        write_dep_list(&mut doc, "rpm:recommends", pkg, DepKind::Recommends)?;
        write_dep_list(&mut doc, "rpm:suggests", pkg, DepKind::Suggests)?;

        if !pkg.conflicts.is_empty() {
            doc.start("rpm:conflicts", &[])?;
            for name in &pkg.conflicts {
                doc.empty("rpm:entry", &[("name", name.as_str())])?;
            }
            doc.end("rpm:conflicts")?;
        }
        if !pkg.obsoletes.is_empty() {
            doc.start("rpm:obsoletes", &[])?;
            for name in &pkg.obsoletes {
                doc.empty("rpm:entry", &[("name", name.as_str())])?;
            }
            doc.end("rpm:obsoletes")?;
        }

        doc.end("format")?;
        doc.end("package")?;
    }

    doc.end("metadata")?;
    Ok(doc.finish())
}

/// `<version epoch=.. ver=.. rel=../>` carrying the package's real EVR.
fn write_version_attrs(doc: &mut XmlDoc, pkg: &Package) -> Result<()> {
    let epoch = pkg.epoch.unwrap_or(0).to_string();
    let mut attrs = vec![("epoch", epoch.as_str()), ("ver", pkg.version.as_str())];
    if let Some(release) = &pkg.release {
        attrs.push(("rel", release.as_str()));
    }
    doc.empty("version", &attrs)
}

fn write_dep_list(doc: &mut XmlDoc, tag: &str, pkg: &Package, kind: DepKind) -> Result<()> {
    let deps: Vec<&Dependency> = pkg
        .dependencies
        .iter()
        .filter(|d| d.kind == kind)
        .collect();
    if deps.is_empty() {
        return Ok(());
    }

    doc.start(tag, &[])?;
    for dep in deps {
        match (&dep.op, &dep.version) {
            (Some(op), Some(version)) => {
                let flags = operator_flags(*op);
                let (epoch, ver, rel) = split_evr(version);
                let epoch = epoch.unwrap_or("0");
                let mut attrs = vec![
                    ("name", dep.name.as_str()),
                    ("flags", flags),
                    ("epoch", epoch),
                    ("ver", ver),
                ];
                if let Some(rel) = rel {
                    attrs.push(("rel", rel));
                }
                doc.empty("rpm:entry", &attrs)?;
            }
            _ => doc.empty("rpm:entry", &[("name", dep.name.as_str())])?,
        }
    }
    doc.end(tag)
}

const fn operator_flags(op: DepOperator) -> &'static str {
    match op {
        DepOperator::Eq => "EQ",
        DepOperator::Lt | DepOperator::StrictLt => "LT",
        DepOperator::Gt | DepOperator::StrictGt => "GT",
        DepOperator::Le => "LE",
        DepOperator::Ge => "GE",
    }
}

fn filelists_xml(packages: &[Package]) -> Result<Vec<u8>> {
    let mut doc = XmlDoc::new()?;
    let count = packages.len().to_string();
    doc.start("filelists", &[("xmlns", FILELISTS_NS), ("packages", count.as_str())])?;
    for pkg in packages {
        doc.start(
            "package",
            &[
                ("pkgid", pkg.checksum.value.as_str()),
                ("name", pkg.name.as_str()),
                ("arch", pkg.architecture.as_str()),
            ],
        )?;
        write_version_attrs(&mut doc, pkg)?;
        doc.end("package")?;
    }
    doc.end("filelists")?;
    Ok(doc.finish())
}

fn other_xml(packages: &[Package]) -> Result<Vec<u8>> {
    let mut doc = XmlDoc::new()?;
    let count = packages.len().to_string();
    doc.start("otherdata", &[("xmlns", OTHER_NS), ("packages", count.as_str())])?;
    for pkg in packages {
        doc.start(
            "package",
            &[
                ("pkgid", pkg.checksum.value.as_str()),
                ("name", pkg.name.as_str()),
                ("arch", pkg.architecture.as_str()),
            ],
        )?;
        write_version_attrs(&mut doc, pkg)?;
        doc.end("package")?;
    }
    doc.end("otherdata")?;
    Ok(doc.finish())
}

fn repomd_xml(artefacts: &[RepomdData], revision: u64) -> Result<Vec<u8>> {
    let mut doc = XmlDoc::new()?;
    doc.start("repomd", &[("xmlns", REPO_NS), ("xmlns:rpm", RPM_NS)])?;
    doc.text_element("revision", &[], &revision.to_string())?;

    let timestamp = revision.to_string();
    for artefact in artefacts {
        doc.start("data", &[("type", artefact.kind)])?;
        doc.text_element("checksum", &[("type", "sha256")], &artefact.checksum)?;
        doc.text_element(
            "open-checksum",
            &[("type", "sha256")],
            &artefact.open_checksum,
        )?;
        doc.empty("location", &[("href", artefact.location.as_str())])?;
        doc.text_element("timestamp", &[], &timestamp)?;
        doc.text_element("size", &[], &artefact.size.to_string())?;
        doc.text_element("open-size", &[], &artefact.open_size.to_string())?;
        doc.end("data")?;
    }

    doc.end("repomd")?;
    Ok(doc.finish())
}
