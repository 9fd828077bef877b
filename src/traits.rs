//! The module introspection boundary.
//!
//! The gather pipeline never touches dynamic loading directly. A
//! [`ModuleHost`] turns candidate files into [`Module`]s, and a module reports
//! its participation marker and exported types. See [`crate::host`] for the
//! shipped implementations.

use std::path::Path;
use thiserror::Error;

use crate::model::TypeDescriptor;

/// Errors that make a single module file unusable.
#[derive(Error, Debug)]
pub enum ModuleLoadError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to load library: {0}")]
    LoadFailed(String),

    #[error("ABI version mismatch: expected {expected}, got {actual}")]
    AbiMismatch { expected: u32, actual: u32 },

    #[error("invalid manifest: {0}")]
    InvalidManifest(String),
}

/// One or more exported types of a module could not be reflected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unable to load types from {module}: {}", .loader_errors.join(", "))]
pub struct TypeLoadError {
    /// Module the types belong to
    pub module: String,
    /// Underlying per-type causes
    pub loader_errors: Vec<String>,
}

/// Errors while enumerating the exported types of a loaded module.
#[derive(Error, Debug)]
pub enum EnumerationError {
    /// Some types could not be loaded; routed to the type-load handler
    #[error(transparent)]
    Partial(#[from] TypeLoadError),

    #[error("type enumeration failed: {0}")]
    Other(String),
}

/// A loaded binary unit.
pub trait Module {
    /// Path the module was loaded from.
    fn path(&self) -> &Path;

    /// Whether the module carries the participation marker.
    fn is_gathered(&self) -> bool;

    /// Enumerates the module's exported types in discovery order.
    ///
    /// # Errors
    ///
    /// Returns [`EnumerationError::Partial`] when individual types fail to
    /// load. No types of the module are returned in that case.
    fn types(&self) -> Result<Vec<TypeDescriptor>, EnumerationError>;
}

/// Loads module files for a particular module format.
///
/// # Thread Safety
///
/// Hosts are shared between `Gatherer` clones, so they must be `Send + Sync`.
pub trait ModuleHost: Send + Sync {
    /// File extension (without the dot) of loadable modules.
    fn module_extension(&self) -> &str;

    /// Whether `path` names a candidate module file. The extension matches
    /// case-insensitively, so `Plugin.DLL` is a candidate for `dll`.
    fn is_module_file(&self, path: &Path) -> bool {
        path.is_file()
            && path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case(self.module_extension()))
    }

    /// Loads the module at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ModuleLoadError`] for malformed files, missing dependencies
    /// or incompatible formats.
    fn load(&self, path: &Path) -> Result<Box<dyn Module>, ModuleLoadError>;
}
