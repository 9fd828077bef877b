//! Module hosts shipped with the crate.
//!
//! - [`DylibHost`]: native shared libraries exporting a
//!   [`ModuleDescriptor`] registration table (see [`abi`])
//! - [`ManifestHost`]: JSON side-car manifests describing a module's types

pub mod abi;
mod dylib;
mod manifest;

pub use abi::{ModuleDescriptor, RawStr, TypeEntry, GATHER_ABI_VERSION};
pub use dylib::DylibHost;
pub use manifest::{ManifestHost, MANIFEST_EXTENSION};
