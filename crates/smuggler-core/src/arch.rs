//! Architecture names and compatibility.
//!
//! Every family spells CPU architectures differently (`x86_64` vs `amd64`,
//! `aarch64` vs `arm64`). The canonicalisation table here is the single
//! source of truth; parsers, the resolver, and the downloader all go through
//! it rather than comparing raw strings.

use crate::package::PackageFamily;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A package architecture from the closed set the three families use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Architecture {
    /// 64-bit x86 (YUM/APK spelling).
    X86_64,
    /// 64-bit x86 (APT spelling).
    Amd64,
    /// 64-bit ARM (YUM/APK spelling).
    Aarch64,
    /// 64-bit ARM (APT spelling).
    Arm64,
    /// 32-bit x86 (YUM spelling).
    I686,
    /// 32-bit x86 (APT spelling).
    I386,
    /// 32-bit x86 (APK spelling).
    X86,
    /// 32-bit ARM hard-float (YUM spelling).
    Armv7l,
    /// 32-bit ARM hard-float (APT spelling).
    Armhf,
    /// 32-bit ARM hard-float (APK spelling).
    Armv7,
    /// Architecture-independent (YUM/APK spelling).
    Noarch,
    /// Architecture-independent (APT spelling).
    All,
}

/// Alias-collapsed architecture groups used for compatibility checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum ArchGroup {
    X86_64,
    Aarch64,
    X86_32,
    Arm32,
    Any,
}

impl Architecture {
    /// Parse an architecture string. Returns `None` for values outside the
    /// closed set (`src`, `riscv64`, ...), which callers treat as
    /// incompatible with every target.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "x86_64" => Some(Self::X86_64),
            "amd64" => Some(Self::Amd64),
            "aarch64" => Some(Self::Aarch64),
            "arm64" => Some(Self::Arm64),
            "i686" => Some(Self::I686),
            "i386" => Some(Self::I386),
            "x86" => Some(Self::X86),
            "armv7l" => Some(Self::Armv7l),
            "armhf" => Some(Self::Armhf),
            "armv7" => Some(Self::Armv7),
            "noarch" => Some(Self::Noarch),
            "all" => Some(Self::All),
            _ => None,
        }
    }

    /// The lexeme this variant was parsed from.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::X86_64 => "x86_64",
            Self::Amd64 => "amd64",
            Self::Aarch64 => "aarch64",
            Self::Arm64 => "arm64",
            Self::I686 => "i686",
            Self::I386 => "i386",
            Self::X86 => "x86",
            Self::Armv7l => "armv7l",
            Self::Armhf => "armhf",
            Self::Armv7 => "armv7",
            Self::Noarch => "noarch",
            Self::All => "all",
        }
    }

    const fn group(self) -> ArchGroup {
        match self {
            Self::X86_64 | Self::Amd64 => ArchGroup::X86_64,
            Self::Aarch64 | Self::Arm64 => ArchGroup::Aarch64,
            Self::I686 | Self::I386 | Self::X86 => ArchGroup::X86_32,
            Self::Armv7l | Self::Armhf | Self::Armv7 => ArchGroup::Arm32,
            Self::Noarch | Self::All => ArchGroup::Any,
        }
    }

    /// Collapse aliases to one representative per group. Idempotent:
    /// `a.canonical().canonical() == a.canonical()`.
    #[must_use]
    pub const fn canonical(self) -> Self {
        match self.group() {
            ArchGroup::X86_64 => Self::X86_64,
            ArchGroup::Aarch64 => Self::Aarch64,
            ArchGroup::X86_32 => Self::I686,
            ArchGroup::Arm32 => Self::Armv7l,
            ArchGroup::Any => Self::Noarch,
        }
    }

    /// The spelling a given family uses for this architecture, e.g.
    /// `x86_64` becomes `amd64` for APT and `x86` stays `x86` only for APK.
    #[must_use]
    pub const fn canonical_for(self, family: PackageFamily) -> &'static str {
        match (self.group(), family) {
            (ArchGroup::X86_64, PackageFamily::Apt) => "amd64",
            (ArchGroup::X86_64, _) => "x86_64",
            (ArchGroup::Aarch64, PackageFamily::Apt) => "arm64",
            (ArchGroup::Aarch64, _) => "aarch64",
            (ArchGroup::X86_32, PackageFamily::Apt) => "i386",
            (ArchGroup::X86_32, PackageFamily::Apk) => "x86",
            (ArchGroup::X86_32, PackageFamily::Yum) => "i686",
            (ArchGroup::Arm32, PackageFamily::Apt) => "armhf",
            (ArchGroup::Arm32, PackageFamily::Apk) => "armv7",
            (ArchGroup::Arm32, PackageFamily::Yum) => "armv7l",
            (ArchGroup::Any, PackageFamily::Apt) => "all",
            (ArchGroup::Any, _) => "noarch",
        }
    }

    /// Whether a package of this architecture installs on `target`.
    /// `noarch`/`all` packages are compatible with every target.
    #[must_use]
    pub const fn is_compatible(self, target: Self) -> bool {
        matches!(self.group(), ArchGroup::Any) || self.canonical() as u8 == target.canonical() as u8
    }

    /// Whether this is an architecture-independent value.
    #[must_use]
    pub const fn is_any(self) -> bool {
        matches!(self.group(), ArchGroup::Any)
    }
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Architecture {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| crate::Error::config(format!("unknown architecture '{s}'")))
    }
}
