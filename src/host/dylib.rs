//! Native module loading using libloading.

use libloading::{Library, Symbol};
use std::path::{Path, PathBuf};

use super::abi::{DescriptorEntryPoint, ModuleDescriptor, DESCRIPTOR_SYMBOL, GATHER_ABI_VERSION};
use crate::model::TypeDescriptor;
use crate::traits::{EnumerationError, Module, ModuleHost, ModuleLoadError};

/// Loads shared libraries (`.so`, `.dylib`, `.dll`) from the gathered
/// directories.
///
/// # Safety
///
/// Loading a library runs its initialisation code, and the registration table
/// is trusted to match [`ModuleDescriptor`]. Only point a gatherer using this
/// host at directories whose contents you trust.
#[derive(Debug, Clone)]
pub struct DylibHost {
    extension: String,
}

impl DylibHost {
    /// Host for the platform's native library extension.
    pub fn new() -> Self {
        Self::with_extension(std::env::consts::DLL_EXTENSION)
    }

    pub fn with_extension(extension: impl Into<String>) -> Self {
        Self {
            extension: extension.into(),
        }
    }
}

impl Default for DylibHost {
    fn default() -> Self {
        Self::new()
    }
}

impl ModuleHost for DylibHost {
    fn module_extension(&self) -> &str {
        &self.extension
    }

    fn load(&self, path: &Path) -> Result<Box<dyn Module>, ModuleLoadError> {
        // SAFETY: Loading a dynamic library. The host's contract requires
        // trusted directories.
        let library =
            unsafe { Library::new(path) }.map_err(|e| ModuleLoadError::LoadFailed(e.to_string()))?;

        // A missing entry point means the library does not participate.
        // SAFETY: The symbol type matches the documented entry point.
        let entry_point: Option<Symbol<DescriptorEntryPoint>> =
            unsafe { library.get(DESCRIPTOR_SYMBOL) }.ok();

        let descriptor = match entry_point {
            // SAFETY: The library was just loaded and stays loaded below.
            Some(entry_point) => Some(unsafe { resolve_descriptor(*entry_point) }?),
            None => None,
        };

        Ok(Box::new(DylibModule {
            path: path.to_path_buf(),
            descriptor,
            _library: library,
        }))
    }
}

/// Calls the entry point and checks the returned registration table.
///
/// # Safety
///
/// `entry_point` must be callable, and a non-null result must point at a
/// valid [`ModuleDescriptor`].
unsafe fn resolve_descriptor(
    entry_point: DescriptorEntryPoint,
) -> Result<*const ModuleDescriptor, ModuleLoadError> {
    // SAFETY: Caller guarantees the entry point is callable.
    let descriptor = unsafe { entry_point() };
    if descriptor.is_null() {
        return Err(ModuleLoadError::LoadFailed(
            "module returned null descriptor".to_string(),
        ));
    }

    // SAFETY: Non-null, and the caller guarantees validity.
    let actual = unsafe { (*descriptor).abi_version };
    if actual != GATHER_ABI_VERSION {
        return Err(ModuleLoadError::AbiMismatch {
            expected: GATHER_ABI_VERSION,
            actual,
        });
    }
    Ok(descriptor)
}

/// A loaded library. The library stays loaded while the module is alive.
struct DylibModule {
    path: PathBuf,
    /// Valid as long as `_library` is loaded
    descriptor: Option<*const ModuleDescriptor>,
    _library: Library,
}

impl DylibModule {
    fn descriptor(&self) -> Option<&ModuleDescriptor> {
        // SAFETY: Checked non-null at load time; the library is still loaded.
        self.descriptor.map(|ptr| unsafe { &*ptr })
    }
}

impl Module for DylibModule {
    fn path(&self) -> &Path {
        &self.path
    }

    fn is_gathered(&self) -> bool {
        self.descriptor().is_some_and(|d| d.gathered)
    }

    fn types(&self) -> Result<Vec<TypeDescriptor>, EnumerationError> {
        match self.descriptor() {
            // SAFETY: The table belongs to the loaded library.
            Some(descriptor) => unsafe { descriptor.read_types(&self.path) }.map_err(Into::into),
            None => Err(EnumerationError::Other(
                "module exports no type table".to_string(),
            )),
        }
    }
}
