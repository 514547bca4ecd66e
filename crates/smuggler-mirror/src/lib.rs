//! Offline mirror synthesis.
//!
//! Re-emits native repository metadata over a downloaded package subset so
//! the target's package manager consumes the tree from `file://` without
//! network access:
//!
//! - YUM: `Packages/` + `repodata/{primary,filelists,other}.xml.gz` +
//!   `repomd.xml`, carrying each package's real EVR
//! - APT: a flat archive with `Packages`, `Packages.gz`, and `Release`
//! - APK: `{arch}/APKINDEX.tar.gz` in the single-letter grammar
//!
//! All index files are byte-identical across runs over the same input set
//! and revision: packages are ordered by name then family version order,
//! gzip headers are zeroed, and timestamps come from the caller.

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

mod apk;
mod apt;
mod error;
mod manifest;
mod util;
mod xml;
mod yum;

pub use apk::write_apk_mirror;
pub use apt::write_apt_mirror;
pub use error::{MirrorError, Result};
pub use manifest::{read_manifest, write_manifest, ManifestEntry};
pub use yum::write_yum_mirror;
