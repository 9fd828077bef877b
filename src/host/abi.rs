//! C-compatible registration table exported by native modules.
//!
//! A gathered library exports one symbol:
//!
//! ```c
//! const ModuleDescriptor* gather_module_descriptor();
//! ```
//!
//! Libraries without the symbol still load, but carry no participation
//! marker and are skipped.
//!
//! # Example Module (Rust)
//!
//! ```ignore
//! use gatherer::host::{ModuleDescriptor, RawStr, TypeEntry};
//!
//! static FOO_CAPS: [RawStr; 2] = [RawStr::new(c"TypeA"), RawStr::new(c"TypeB")];
//! static TYPES: [TypeEntry; 1] = [TypeEntry::new(c"Foo", true, &FOO_CAPS)];
//! static MODULE: ModuleDescriptor = ModuleDescriptor::new(true, &TYPES);
//!
//! gatherer::export_module!(MODULE);
//! ```

use std::ffi::{c_char, CStr};
use std::path::Path;

use crate::model::{Capability, TypeDescriptor};
use crate::traits::TypeLoadError;

/// Current ABI version. Modules must match this version to be loaded.
pub const GATHER_ABI_VERSION: u32 = 1;

/// Null-terminated name of the entry point symbol.
pub const DESCRIPTOR_SYMBOL: &[u8] = b"gather_module_descriptor\0";

/// Type of the entry point function.
pub type DescriptorEntryPoint = unsafe extern "C" fn() -> *const ModuleDescriptor;

/// Pointer to a static, null-terminated string.
#[repr(transparent)]
#[derive(Debug, Clone, Copy)]
pub struct RawStr(*const c_char);

// SAFETY: RawStr only points at static, immutable string data.
unsafe impl Send for RawStr {}
unsafe impl Sync for RawStr {}

impl RawStr {
    pub const fn new(s: &'static CStr) -> Self {
        Self(s.as_ptr())
    }

    pub const fn null() -> Self {
        Self(std::ptr::null())
    }

    /// # Safety
    ///
    /// A non-null pointer must be valid and null-terminated.
    unsafe fn to_str<'a>(self) -> Result<&'a str, &'static str> {
        if self.0.is_null() {
            return Err("null string");
        }
        // SAFETY: Caller guarantees the pointer is valid and null-terminated.
        unsafe { CStr::from_ptr(self.0) }
            .to_str()
            .map_err(|_| "string is not valid UTF-8")
    }
}

/// One exported type.
#[repr(C)]
pub struct TypeEntry {
    /// Type name
    pub name: RawStr,
    /// Per-type marker
    pub gathered: bool,
    pub capabilities: *const RawStr,
    pub capability_count: usize,
}

// SAFETY: TypeEntry only points at static data.
unsafe impl Send for TypeEntry {}
unsafe impl Sync for TypeEntry {}

impl TypeEntry {
    pub const fn new(name: &'static CStr, gathered: bool, capabilities: &'static [RawStr]) -> Self {
        Self {
            name: RawStr::new(name),
            gathered,
            capabilities: capabilities.as_ptr(),
            capability_count: capabilities.len(),
        }
    }
}

/// Registration table returned by `gather_module_descriptor()`.
#[repr(C)]
pub struct ModuleDescriptor {
    /// Must equal [`GATHER_ABI_VERSION`]
    pub abi_version: u32,
    /// Module-level participation marker
    pub gathered: bool,
    pub types: *const TypeEntry,
    pub type_count: usize,
}

// SAFETY: ModuleDescriptor only points at static data.
unsafe impl Send for ModuleDescriptor {}
unsafe impl Sync for ModuleDescriptor {}

impl ModuleDescriptor {
    pub const fn new(gathered: bool, types: &'static [TypeEntry]) -> Self {
        Self {
            abi_version: GATHER_ABI_VERSION,
            gathered,
            types: types.as_ptr(),
            type_count: types.len(),
        }
    }

    /// Copies the type table into owned descriptors.
    ///
    /// # Safety
    ///
    /// Every non-null pointer reachable from the descriptor must be valid for
    /// its stated length.
    ///
    /// # Errors
    ///
    /// Returns a [`TypeLoadError`] listing every entry that could not be read.
    pub unsafe fn read_types(&self, module: &Path) -> Result<Vec<TypeDescriptor>, TypeLoadError> {
        // SAFETY: Caller guarantees the table pointers are valid.
        let entries = unsafe { table(self.types, self.type_count) }.ok_or_else(|| TypeLoadError {
            module: module.display().to_string(),
            loader_errors: vec!["type table is null".to_string()],
        })?;

        let mut types = Vec::with_capacity(entries.len());
        let mut loader_errors = Vec::new();

        for (index, entry) in entries.iter().enumerate() {
            // SAFETY: Caller guarantees entry pointers are valid.
            match unsafe { read_entry(entry, module) } {
                Ok(descriptor) => types.push(descriptor),
                Err(reason) => loader_errors.push(format!("type #{index}: {reason}")),
            }
        }

        if loader_errors.is_empty() {
            Ok(types)
        } else {
            Err(TypeLoadError {
                module: module.display().to_string(),
                loader_errors,
            })
        }
    }
}

/// Declares the `gather_module_descriptor` entry point for a static
/// [`ModuleDescriptor`].
#[macro_export]
macro_rules! export_module {
    ($descriptor:path) => {
        #[no_mangle]
        pub extern "C" fn gather_module_descriptor() -> *const $crate::host::ModuleDescriptor {
            &$descriptor
        }
    };
}

unsafe fn table<'a, T>(ptr: *const T, len: usize) -> Option<&'a [T]> {
    match (ptr.is_null(), len) {
        (_, 0) => Some(<&[T]>::default()),
        (true, _) => None,
        // SAFETY: Caller guarantees ptr is valid for len elements.
        (false, len) => Some(unsafe { std::slice::from_raw_parts(ptr, len) }),
    }
}

unsafe fn read_entry(entry: &TypeEntry, module: &Path) -> Result<TypeDescriptor, String> {
    // SAFETY: Caller guarantees the name pointer is valid.
    let name = unsafe { entry.name.to_str() }.map_err(|e| format!("name: {e}"))?;

    // SAFETY: Caller guarantees the capability table is valid.
    let raw_caps = unsafe { table(entry.capabilities, entry.capability_count) }
        .ok_or_else(|| format!("{name}: capability table is null"))?;

    let mut capabilities = Vec::with_capacity(raw_caps.len());
    for raw in raw_caps {
        // SAFETY: Caller guarantees capability pointers are valid.
        let capability = unsafe { raw.to_str() }.map_err(|e| format!("{name}: capability: {e}"))?;
        capabilities.push(Capability::new(capability));
    }

    Ok(TypeDescriptor {
        name: name.to_string(),
        module: module.to_path_buf(),
        capabilities,
        gathered: entry.gathered,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    static FOO_CAPS: [RawStr; 3] = [
        RawStr::new(c"TypeA"),
        RawStr::new(c"TypeB"),
        RawStr::new(c"TypeC"),
    ];
    static BAR_CAPS: [RawStr; 2] = [RawStr::new(c"TypeB"), RawStr::new(c"TypeC")];
    static TYPES: [TypeEntry; 3] = [
        TypeEntry::new(c"Foo", true, &FOO_CAPS),
        TypeEntry::new(c"Bar", true, &BAR_CAPS),
        TypeEntry::new(c"Loder", false, &[]),
    ];
    static MODULE: ModuleDescriptor = ModuleDescriptor::new(true, &TYPES);

    static BROKEN_CAPS: [RawStr; 1] = [RawStr::null()];
    static BROKEN_TYPES: [TypeEntry; 2] = [
        TypeEntry::new(c"Baz", true, &BROKEN_CAPS),
        TypeEntry {
            name: RawStr::null(),
            gathered: true,
            capabilities: std::ptr::null(),
            capability_count: 0,
        },
    ];
    static BROKEN: ModuleDescriptor = ModuleDescriptor::new(true, &BROKEN_TYPES);

    #[test]
    fn test_read_types_copies_table() {
        let types = unsafe { MODULE.read_types(Path::new("/plugins/libfoo.so")) }.unwrap();

        assert_eq!(MODULE.abi_version, GATHER_ABI_VERSION);
        let names: Vec<_> = types.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["Foo", "Bar", "Loder"]);
        assert_eq!(types[0].capabilities.len(), 3);
        assert_eq!(types[1].capabilities, vec![Capability::new("TypeB"), Capability::new("TypeC")]);
        assert!(types[2].capabilities.is_empty());
        assert!(!types[2].gathered);
        assert_eq!(types[0].module, Path::new("/plugins/libfoo.so"));
    }

    #[test]
    fn test_read_types_reports_every_broken_entry() {
        let err = unsafe { BROKEN.read_types(Path::new("libbroken.so")) }.unwrap_err();

        assert_eq!(err.module, "libbroken.so");
        assert_eq!(
            err.loader_errors,
            vec![
                "type #0: Baz: capability: null string".to_string(),
                "type #1: name: null string".to_string(),
            ]
        );
    }

    #[test]
    fn test_empty_table_reads_as_no_types() {
        let empty = ModuleDescriptor {
            abi_version: GATHER_ABI_VERSION,
            gathered: true,
            types: std::ptr::null(),
            type_count: 0,
        };
        let types = unsafe { empty.read_types(Path::new("libempty.so")) }.unwrap();
        assert!(types.is_empty());
    }
}
