//! APK repository metadata: the `APKINDEX` text member.
//!
//! Stanzas are sequences of single-letter-keyed lines separated by blank
//! lines:
//!
//! ```text
//! P:curl
//! V:8.5.0-r0
//! A:x86_64
//! S:253456
//! I:548864
//! C:Q1frT4EeHzMvMboFGcJA/bgl2ODNY=
//! D:so:libc.musl-x86_64.so.1 so:libcurl.so.4
//! p:cmd:curl=8.5.0-r0
//! ```

use crate::error::{IndexError, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use smuggler_core::{
    Architecture, Checksum, ChecksumType, DepKind, DepOperator, Dependency, Package, PackageFamily,
};
use tracing::warn;

/// Decode an APKINDEX `C:` checksum.
///
/// `Q1` prefixes a base64-encoded SHA-1; `sha256:` prefixes a hex SHA-256.
pub fn decode_checksum(value: &str) -> Result<Checksum> {
    if let Some(encoded) = value.strip_prefix("Q1") {
        let raw = BASE64
            .decode(encoded.as_bytes())
            .map_err(|e| IndexError::malformed("apk", format!("bad Q1 checksum: {e}")))?;
        return Ok(Checksum::new(ChecksumType::Sha1, hex::encode(raw)));
    }
    if let Some(hex_digest) = value.strip_prefix("sha256:") {
        return Ok(Checksum::new(ChecksumType::Sha256, hex_digest));
    }
    Err(IndexError::malformed(
        "apk",
        format!("unsupported checksum encoding: {value:?}"),
    ))
}

#[derive(Debug, Default)]
struct ApkDraft {
    name: Option<String>,
    version: Option<String>,
    arch: Option<String>,
    size: Option<u64>,
    installed_size: Option<u64>,
    description: Option<String>,
    license: Option<String>,
    checksum: Option<Checksum>,
    dependencies: Vec<Dependency>,
    provides: Vec<String>,
    conflicts: Vec<String>,
}

impl ApkDraft {
    fn is_empty(&self) -> bool {
        self.name.is_none() && self.version.is_none()
    }

    fn finish(self, repo_id: &str) -> Option<Package> {
        let name = self.name?;
        let version = self.version?;
        let arch = Architecture::parse(self.arch.as_deref()?)?;
        let location = format!("{}/{}-{}.apk", arch.as_str(), name, version);
        Some(Package {
            name,
            version,
            release: None,
            epoch: None,
            architecture: arch,
            family: PackageFamily::Apk,
            size: self.size?,
            installed_size: self.installed_size,
            checksum: self.checksum?,
            location,
            repo_id: repo_id.to_string(),
            dependencies: self.dependencies,
            provides: self.provides,
            conflicts: self.conflicts,
            obsoletes: Vec::new(),
            description: self.description,
            license: self.license,
        })
    }
}

/// Parse an extracted `APKINDEX` text into packages compatible with
/// `target_arch`. Incomplete stanzas are skipped with a warning.
pub fn parse_apkindex(
    text: &str,
    repo_id: &str,
    target_arch: Architecture,
) -> Result<Vec<Package>> {
    let mut packages = Vec::new();
    let mut draft = ApkDraft::default();

    for line in text.lines().chain(std::iter::once("")) {
        if line.is_empty() {
            if !draft.is_empty() {
                match std::mem::take(&mut draft).finish(repo_id) {
                    Some(pkg) if pkg.architecture.is_compatible(target_arch) => {
                        packages.push(pkg);
                    }
                    Some(_) => {}
                    None => warn!("skipping incomplete APKINDEX stanza"),
                }
            }
            continue;
        }

        let Some((key, value)) = line.split_once(':') else {
            warn!(line, "ignoring malformed APKINDEX line");
            continue;
        };

        match key {
            "P" => draft.name = Some(value.to_string()),
            "V" => draft.version = Some(value.to_string()),
            "A" => draft.arch = Some(value.to_string()),
            "S" => draft.size = value.parse().ok(),
            "I" => draft.installed_size = value.parse().ok(),
            "T" => draft.description = Some(value.to_string()),
            "L" => draft.license = Some(value.to_string()),
            "C" => match decode_checksum(value) {
                Ok(checksum) => draft.checksum = Some(checksum),
                Err(e) => warn!(error = %e, "bad APKINDEX checksum"),
            },
            "D" => parse_depends(value, &mut draft),
            "p" => draft
                .provides
                .extend(value.split_whitespace().map(String::from)),
            _ => {}
        }
    }

    Ok(packages)
}

/// Parse a `D:` depends line.
///
/// Entries are space-separated. `!name` is a conflict. Operators are
/// `=`, `<`, `>`, `<=`, `>=`, and `~` which approximates to `>=`.
/// `so:` / `cmd:` / `pc:` names are capabilities and kept verbatim.
fn parse_depends(value: &str, draft: &mut ApkDraft) {
    for token in value.split_whitespace() {
        if let Some(conflict) = token.strip_prefix('!') {
            draft.conflicts.push(conflict.to_string());
            continue;
        }

        let (name, op, version) = split_constraint(token);
        if name.is_empty() {
            continue;
        }
        draft.dependencies.push(Dependency {
            name: name.to_string(),
            version,
            op,
            kind: DepKind::Requires,
        });
    }
}

/// Split `name>=1.2` style tokens. Capability names (`so:`, `cmd:`, `pc:`)
/// contain no operator characters, so a plain scan leaves them intact.
fn split_constraint(token: &str) -> (&str, Option<DepOperator>, Option<String>) {
    let Some(pos) = token.find(['<', '>', '=', '~']) else {
        return (token, None, None);
    };

    let name = &token[..pos];
    let rest = &token[pos..];

    let (op_str, version) = if let Some(v) = rest.strip_prefix(">=") {
        (">=", v)
    } else if let Some(v) = rest.strip_prefix("<=") {
        ("<=", v)
    } else if let Some(v) = rest.strip_prefix('=') {
        ("=", v)
    } else if let Some(v) = rest.strip_prefix('<') {
        ("<", v)
    } else if let Some(v) = rest.strip_prefix('>') {
        (">", v)
    } else if let Some(v) = rest.strip_prefix('~') {
        // fuzzy match approximates to >=
        (">=", v)
    } else {
        return (name, None, None);
    };

    if version.is_empty() {
        return (name, None, None);
    }
    (
        name,
        DepOperator::parse(op_str),
        Some(version.to_string()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use smuggler_test_utils::fixtures;

    #[test]
    fn apkindex_parses_stanzas() {
        let packages =
            parse_apkindex(fixtures::APKINDEX, "main", Architecture::X86_64).unwrap();
        let names: Vec<&str> = packages.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["curl", "libssl3", "musl", "zlib"]);
    }

    #[test]
    fn q1_checksum_decodes_to_sha1_hex() {
        let checksum = decode_checksum("Q1mM1TFPg9UPEQhT3PXqvnHtu0ozA=").unwrap();
        assert_eq!(checksum.algo, ChecksumType::Sha1);
        assert_eq!(checksum.value.len(), 40);
        assert!(checksum.value.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn sha256_checksum_passthrough() {
        let digest = "a".repeat(64);
        let checksum = decode_checksum(&format!("sha256:{digest}")).unwrap();
        assert_eq!(checksum.algo, ChecksumType::Sha256);
        assert_eq!(checksum.value, digest);
    }

    #[test]
    fn unsupported_checksum_rejected() {
        assert!(decode_checksum("X9deadbeef").is_err());
    }

    #[test]
    fn so_capabilities_survive_constraint_split() {
        let (name, op, version) = split_constraint("so:libssl.so.3=3");
        assert_eq!(name, "so:libssl.so.3");
        assert_eq!(op, Some(DepOperator::Eq));
        assert_eq!(version.as_deref(), Some("3"));

        let (name, op, _) = split_constraint("so:libc.musl-x86_64.so.1");
        assert_eq!(name, "so:libc.musl-x86_64.so.1");
        assert_eq!(op, None);
    }

    #[test]
    fn tilde_approximates_ge() {
        let (name, op, version) = split_constraint("musl~1.2");
        assert_eq!(name, "musl");
        assert_eq!(op, Some(DepOperator::Ge));
        assert_eq!(version.as_deref(), Some("1.2"));
    }

    #[test]
    fn conflicts_split_from_depends() {
        let packages =
            parse_apkindex(fixtures::APKINDEX, "main", Architecture::X86_64).unwrap();
        let musl = packages.iter().find(|p| p.name == "musl").unwrap();
        assert!(musl.conflicts.contains(&"libc6-compat".to_string()));
    }

    #[test]
    fn location_follows_arch_layout() {
        let packages =
            parse_apkindex(fixtures::APKINDEX, "main", Architecture::X86_64).unwrap();
        let curl = packages.iter().find(|p| p.name == "curl").unwrap();
        assert_eq!(curl.location, "x86_64/curl-8.5.0-r0.apk");
    }

    #[test]
    fn provides_include_commands() {
        let packages =
            parse_apkindex(fixtures::APKINDEX, "main", Architecture::X86_64).unwrap();
        let curl = packages.iter().find(|p| p.name == "curl").unwrap();
        assert!(curl.provides.iter().any(|p| p.starts_with("cmd:curl")));
    }
}
