//! APT repository metadata: `Release` and `Packages`.
//!
//! Both files use the Debian control-file grammar: `Field: value` lines,
//! continuation lines beginning with space or tab, stanzas separated by
//! blank lines.

use crate::error::Result;
use smuggler_core::{
    Architecture, Checksum, ChecksumType, DepKind, DepOperator, Dependency, Package, PackageFamily,
};
use smuggler_core::AHashMap;
use tracing::warn;

/// Summary of a `Release` file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReleaseInfo {
    /// Declared architectures.
    pub architectures: Vec<String>,
    /// Declared components (`main`, `universe`, ...).
    pub components: Vec<String>,
    /// Codename, e.g. `jammy`.
    pub codename: Option<String>,
    /// Suite, e.g. `stable`.
    pub suite: Option<String>,
    /// Origin, e.g. `Ubuntu`.
    pub origin: Option<String>,
}

/// Parse a `Release` file.
#[must_use]
pub fn parse_release(text: &str) -> ReleaseInfo {
    let mut info = ReleaseInfo::default();
    for line in text.lines() {
        // the SHA256 block is indented; top-level fields are not
        if line.starts_with([' ', '\t']) {
            continue;
        }
        let Some((field, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();
        match field {
            "Architectures" => {
                info.architectures = value.split_whitespace().map(String::from).collect();
            }
            "Components" => {
                info.components = value.split_whitespace().map(String::from).collect();
            }
            "Codename" => info.codename = Some(value.to_string()),
            "Suite" => info.suite = Some(value.to_string()),
            "Origin" => info.origin = Some(value.to_string()),
            _ => {}
        }
    }
    info
}

/// Parse a decompressed `Packages` file into packages compatible with
/// `target_arch`. Stanzas missing mandatory fields are skipped with a
/// warning.
pub fn parse_packages(
    text: &str,
    repo_id: &str,
    target_arch: Architecture,
) -> Result<Vec<Package>> {
    let mut packages = Vec::new();

    for stanza in text.split("\n\n") {
        let fields = parse_stanza(stanza);
        if fields.is_empty() {
            continue;
        }
        match build_package(&fields, repo_id) {
            Some(pkg) if pkg.architecture.is_compatible(target_arch) => packages.push(pkg),
            Some(_) => {}
            None => {
                let name = fields.get("Package").map_or("<unnamed>", String::as_str);
                warn!(package = name, "skipping incomplete Packages stanza");
            }
        }
    }

    Ok(packages)
}

/// Parse one control-file stanza into a field map, folding continuation
/// lines into their field.
fn parse_stanza(stanza: &str) -> AHashMap<String, String> {
    let mut fields: AHashMap<String, String> = AHashMap::new();
    let mut current: Option<String> = None;

    for line in stanza.lines() {
        if line.starts_with([' ', '\t']) {
            if let Some(field) = &current {
                if let Some(value) = fields.get_mut(field) {
                    value.push('\n');
                    value.push_str(line.trim_start());
                }
            }
            continue;
        }
        if let Some((field, value)) = line.split_once(':') {
            fields.insert(field.to_string(), value.trim().to_string());
            current = Some(field.to_string());
        }
    }
    fields
}

fn build_package(fields: &AHashMap<String, String>, repo_id: &str) -> Option<Package> {
    let name = fields.get("Package")?.clone();
    let version = fields.get("Version")?.clone();
    let architecture = Architecture::parse(fields.get("Architecture")?)?;
    let location = fields.get("Filename")?.clone();
    let size = fields.get("Size")?.parse().ok()?;
    let checksum = best_checksum(fields)?;

    // Installed-Size is in kilobytes
    let installed_size = fields
        .get("Installed-Size")
        .and_then(|v| v.parse::<u64>().ok())
        .map(|kb| kb * 1024);

    let mut dependencies = Vec::new();
    for (field, kind) in [
        ("Pre-Depends", DepKind::Requires),
        ("Depends", DepKind::Requires),
        ("Recommends", DepKind::Recommends),
        ("Suggests", DepKind::Suggests),
    ] {
        if let Some(value) = fields.get(field) {
            dependencies.extend(parse_depends(value, kind));
        }
    }

    let provides = fields
        .get("Provides")
        .map(|v| split_name_list(v))
        .unwrap_or_default();
    let conflicts = fields
        .get("Conflicts")
        .map(|v| split_name_list(v))
        .unwrap_or_default();

    Some(Package {
        name,
        version,
        release: None,
        epoch: None,
        architecture,
        family: PackageFamily::Apt,
        size,
        installed_size,
        checksum,
        location,
        repo_id: repo_id.to_string(),
        dependencies,
        provides,
        conflicts,
        obsoletes: Vec::new(),
        description: fields
            .get("Description")
            .map(|d| d.lines().next().unwrap_or_default().to_string()),
        license: None,
    })
}

/// Checksum preference: SHA256 over SHA1 over MD5sum.
fn best_checksum(fields: &AHashMap<String, String>) -> Option<Checksum> {
    for (field, algo) in [
        ("SHA256", ChecksumType::Sha256),
        ("SHA1", ChecksumType::Sha1),
        ("MD5sum", ChecksumType::Md5),
    ] {
        if let Some(value) = fields.get(field) {
            return Some(Checksum::new(algo, value.clone()));
        }
    }
    None
}

/// Parse a `Depends`-style field.
///
/// Entries are comma-separated. Within an alternation `a | b | c` only the
/// first literal is kept. Names containing `{` (substvars that escaped the
/// build) or starting with `:` are rejected.
#[must_use]
pub fn parse_depends(value: &str, kind: DepKind) -> Vec<Dependency> {
    let mut deps = Vec::new();

    for entry in value.split(',') {
        let entry = entry.trim();
        if entry.is_empty() {
            continue;
        }
        // keep the first alternative only
        let first = entry.split('|').next().unwrap_or(entry).trim();

        let (raw_name, constraint) = match first.split_once('(') {
            Some((name, rest)) => (name.trim(), rest.trim_end_matches(')').trim()),
            None => (first, ""),
        };

        // strip architecture qualifiers like [amd64] and the multiarch
        // `any` marker
        let raw_name = raw_name
            .split_whitespace()
            .next()
            .unwrap_or(raw_name);

        if raw_name.is_empty() || raw_name.contains('{') || raw_name.starts_with(':') {
            continue;
        }

        let (op, version) = parse_constraint(constraint);
        deps.push(Dependency {
            name: raw_name.to_string(),
            version,
            op,
            kind,
        });
    }
    deps
}

/// Parse `>= 1.2.3` inside a constraint parenthesis.
fn parse_constraint(constraint: &str) -> (Option<DepOperator>, Option<String>) {
    if constraint.is_empty() {
        return (None, None);
    }
    let mut parts = constraint.splitn(2, char::is_whitespace);
    let op = parts.next().and_then(DepOperator::parse);
    let version = parts.next().map(|v| v.trim().to_string());
    match (op, version) {
        (Some(op), Some(version)) if !version.is_empty() => (Some(op), Some(version)),
        _ => (None, None),
    }
}

/// Flatten a `Provides`/`Conflicts` list to bare names, dropping any
/// version annotations.
fn split_name_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .filter_map(|entry| {
            let name = entry.trim().split_whitespace().next()?;
            if name.is_empty() {
                None
            } else {
                Some(name.to_string())
            }
        })
        .collect()
}
