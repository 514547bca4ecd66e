//! YUM repository metadata: `repomd.xml` and `primary.xml.gz`.

use crate::error::{IndexError, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use smuggler_core::{
    Architecture, Checksum, ChecksumType, DepKind, DepOperator, Dependency, Package, PackageFamily,
};
use tracing::warn;

/// Requires whose names start with these are satisfied by the base system
/// and never resolved as packages.
const SYSTEM_DEP_PREFIXES: &[&str] = &[
    "rpmlib(",
    "config(",
    "/",
    "libc.so",
    "libpthread.so",
    "libm.so",
    "libdl.so",
    "librt.so",
    "rtld(",
];

/// Whether a require is a system dependency.
#[must_use]
pub fn is_system_dep(name: &str) -> bool {
    SYSTEM_DEP_PREFIXES.iter().any(|p| name.starts_with(p))
}

/// One `<data>` artefact listed in `repomd.xml`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepomdEntry {
    /// Artefact type: `primary`, `filelists`, `other`, ...
    pub kind: String,
    /// Repo-relative path of the (compressed) artefact.
    pub location: String,
    /// Declared checksum of the compressed artefact.
    pub checksum: Option<Checksum>,
}

/// Parse `repomd.xml` into its artefact list.
pub fn parse_repomd(xml: &[u8]) -> Result<Vec<RepomdEntry>> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(true);

    let mut entries = Vec::new();
    let mut buf = Vec::new();

    let mut kind: Option<String> = None;
    let mut location: Option<String> = None;
    let mut checksum_type: Option<ChecksumType> = None;
    let mut checksum_value: Option<String> = None;
    let mut in_checksum = false;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e) => match e.name().as_ref() {
                b"data" => {
                    kind = attr(&e, "type")?;
                    location = None;
                    checksum_type = None;
                    checksum_value = None;
                }
                b"location" => location = attr(&e, "href")?,
                b"checksum" => {
                    in_checksum = true;
                    checksum_type = attr(&e, "type")?.and_then(|t| ChecksumType::parse(&t));
                }
                _ => {}
            },
            Event::Text(t) if in_checksum => {
                checksum_value = Some(t.unescape()?.into_owned());
            }
            Event::End(e) => match e.name().as_ref() {
                b"checksum" => in_checksum = false,
                b"data" => {
                    if let (Some(kind), Some(location)) = (kind.take(), location.take()) {
                        let checksum = match (checksum_type.take(), checksum_value.take()) {
                            (Some(algo), Some(value)) => Some(Checksum::new(algo, value)),
                            _ => None,
                        };
                        entries.push(RepomdEntry {
                            kind,
                            location,
                            checksum,
                        });
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if entries.is_empty() {
        return Err(IndexError::malformed("yum", "repomd.xml lists no artefacts"));
    }
    Ok(entries)
}

/// Find the `primary` artefact in a parsed repomd.
pub fn primary_location(entries: &[RepomdEntry]) -> Result<&RepomdEntry> {
    entries
        .iter()
        .find(|e| e.kind == "primary")
        .ok_or_else(|| IndexError::malformed("yum", "repomd.xml has no primary artefact"))
}

/// Fields of the `<package>` element currently being read.
#[derive(Debug, Default)]
struct PkgDraft {
    name: Option<String>,
    arch: Option<String>,
    epoch: Option<u64>,
    version: Option<String>,
    release: Option<String>,
    checksum: Option<Checksum>,
    size: Option<u64>,
    installed_size: Option<u64>,
    location: Option<String>,
    license: Option<String>,
    description: Option<String>,
    dependencies: Vec<Dependency>,
    provides: Vec<String>,
    conflicts: Vec<String>,
    obsoletes: Vec<String>,
}

impl PkgDraft {
    fn finish(self, repo_id: &str) -> Option<Package> {
        let name = self.name?;
        let arch = Architecture::parse(self.arch.as_deref()?)?;
        Some(Package {
            name,
            version: self.version?,
            release: self.release,
            epoch: self.epoch,
            architecture: arch,
            family: PackageFamily::Yum,
            size: self.size?,
            installed_size: self.installed_size,
            checksum: self.checksum?,
            location: self.location?,
            repo_id: repo_id.to_string(),
            dependencies: self.dependencies,
            provides: self.provides,
            conflicts: self.conflicts,
            obsoletes: self.obsoletes,
            description: self.description,
            license: self.license,
        })
    }
}

/// Which capability list an `<rpm:entry>` belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryList {
    Requires,
    Provides,
    Conflicts,
    Obsoletes,
    Suggests,
    Recommends,
}

/// Parse a decompressed `primary.xml` into packages compatible with
/// `target_arch`. Incomplete entries are skipped with a warning.
pub fn parse_primary(
    xml: &[u8],
    repo_id: &str,
    target_arch: Architecture,
) -> Result<Vec<Package>> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(true);

    let mut packages = Vec::new();
    let mut buf = Vec::new();

    let mut draft: Option<PkgDraft> = None;
    let mut text_field: Option<&'static str> = None;
    let mut entry_list: Option<EntryList> = None;

    loop {
        let event = reader.read_event_into(&mut buf)?;
        let is_empty = matches!(event, Event::Empty(_));
        match event {
            Event::Start(ref e) | Event::Empty(ref e) => {
                let name = e.name();
                match name.as_ref() {
                    b"package" => draft = Some(PkgDraft::default()),
                    b"name" => text_field = Some("name"),
                    b"arch" => text_field = Some("arch"),
                    b"summary" => text_field = Some("summary"),
                    b"rpm:license" => text_field = Some("license"),
                    b"version" => {
                        if let Some(d) = draft.as_mut() {
                            d.epoch = attr(e, "epoch")?.and_then(|v| v.parse().ok());
                            d.version = attr(e, "ver")?;
                            d.release = attr(e, "rel")?;
                        }
                    }
                    b"checksum" => {
                        if let Some(d) = draft.as_mut() {
                            let algo = attr(e, "type")?.and_then(|t| ChecksumType::parse(&t));
                            // value arrives as element text
                            d.checksum = algo.map(|algo| Checksum::new(algo, ""));
                            text_field = Some("checksum");
                        }
                    }
                    b"size" => {
                        if let Some(d) = draft.as_mut() {
                            d.size = attr(e, "package")?.and_then(|v| v.parse().ok());
                            d.installed_size =
                                attr(e, "installed")?.and_then(|v| v.parse().ok());
                        }
                    }
                    b"location" => {
                        if let Some(d) = draft.as_mut() {
                            d.location = attr(e, "href")?;
                        }
                    }
                    b"rpm:requires" => entry_list = Some(EntryList::Requires),
                    b"rpm:provides" => entry_list = Some(EntryList::Provides),
                    b"rpm:conflicts" => entry_list = Some(EntryList::Conflicts),
                    b"rpm:obsoletes" => entry_list = Some(EntryList::Obsoletes),
                    b"rpm:suggests" => entry_list = Some(EntryList::Suggests),
                    b"rpm:recommends" => entry_list = Some(EntryList::Recommends),
                    b"rpm:entry" => {
                        if let (Some(d), Some(list)) = (draft.as_mut(), entry_list) {
                            read_entry(e, list, d)?;
                        }
                    }
                    _ => {}
                }
                // self-closing elements produce no End event
                if is_empty {
                    text_field = None;
                }
            }
            Event::Text(ref t) => {
                if let (Some(d), Some(field)) = (draft.as_mut(), text_field) {
                    let text = t.unescape()?.into_owned();
                    match field {
                        "name" => d.name = Some(text),
                        "arch" => d.arch = Some(text),
                        "summary" => d.description = Some(text),
                        "license" => d.license = Some(text),
                        "checksum" => {
                            if let Some(c) = d.checksum.as_mut() {
                                *c = Checksum::new(c.algo, text);
                            }
                        }
                        _ => {}
                    }
                }
            }
            Event::End(ref e) => {
                text_field = None;
                match e.name().as_ref() {
                    b"rpm:requires" | b"rpm:provides" | b"rpm:conflicts" | b"rpm:obsoletes"
                    | b"rpm:suggests" | b"rpm:recommends" => entry_list = None,
                    b"package" => {
                        if let Some(d) = draft.take() {
                            match d.finish(repo_id) {
                                Some(pkg) if pkg.architecture.is_compatible(target_arch) => {
                                    packages.push(pkg);
                                }
                                Some(_) => {}
                                None => warn!("skipping incomplete primary.xml entry"),
                            }
                        }
                    }
                    _ => {}
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(packages)
}

/// Read one `<rpm:entry>` into the draft's current list.
fn read_entry(e: &BytesStart<'_>, list: EntryList, draft: &mut PkgDraft) -> Result<()> {
    let Some(name) = attr(e, "name")? else {
        return Ok(());
    };

    match list {
        EntryList::Provides => draft.provides.push(name),
        EntryList::Conflicts => draft.conflicts.push(name),
        EntryList::Obsoletes => draft.obsoletes.push(name),
        EntryList::Requires | EntryList::Suggests | EntryList::Recommends => {
            if list == EntryList::Requires && is_system_dep(&name) {
                return Ok(());
            }
            let op = attr(e, "flags")?.and_then(|f| DepOperator::parse(&f));
            let version = entry_version(e)?;
            let kind = match list {
                EntryList::Requires => DepKind::Requires,
                EntryList::Recommends => DepKind::Recommends,
                _ => DepKind::Suggests,
            };
            draft.dependencies.push(Dependency {
                name,
                op: if version.is_some() { op } else { None },
                version,
                kind,
            });
        }
    }
    Ok(())
}

/// Compose the EVR string of a versioned `<rpm:entry>`.
fn entry_version(e: &BytesStart<'_>) -> Result<Option<String>> {
    let Some(ver) = attr(e, "ver")? else {
        return Ok(None);
    };
    let mut version = String::new();
    if let Some(epoch) = attr(e, "epoch")? {
        if epoch != "0" {
            version.push_str(&epoch);
            version.push(':');
        }
    }
    version.push_str(&ver);
    if let Some(rel) = attr(e, "rel")? {
        version.push('-');
        version.push_str(&rel);
    }
    Ok(Some(version))
}

/// Read one attribute as an owned string.
fn attr(e: &BytesStart<'_>, name: &str) -> Result<Option<String>> {
    e.try_get_attribute(name)
        .map_err(|err| IndexError::Xml(err.to_string()))?
        .map(|a| {
            a.unescape_value()
                .map(std::borrow::Cow::into_owned)
                .map_err(|err| IndexError::Xml(err.to_string()))
        })
        .transpose()
}
