//! Core types shared across the smuggler workspace.
//!
//! This crate provides the foundation the other crates build on:
//! - The unified [`Package`] / [`Dependency`] model all three package
//!   families (YUM, APT, APK) are parsed into
//! - Architecture canonicalisation and compatibility checks
//! - Family-specific version total orders and constraint matching
//! - The shared error type

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod arch;
pub mod error;
pub mod package;
pub mod version;

pub use arch::Architecture;
pub use error::{Error, Result};
pub use package::{
    Checksum, ChecksumType, DepKind, DepOperator, Dependency, Package, PackageFamily,
    PackageIdentity,
};

// Re-export commonly used collection types
pub use ahash::{AHashMap, AHashSet};
pub use dashmap::DashMap;
pub use parking_lot::{Mutex, RwLock};
