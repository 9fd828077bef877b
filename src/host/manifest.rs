//! Side-car manifest modules.
//!
//! A manifest module is a JSON file describing what a module exports:
//!
//! ```json
//! {
//!   "gathered": true,
//!   "types": [
//!     { "name": "Foo", "gathered": true, "capabilities": ["TypeA", "TypeB"] }
//!   ]
//! }
//! ```

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::model::{Capability, TypeDescriptor};
use crate::traits::{EnumerationError, Module, ModuleHost, ModuleLoadError, TypeLoadError};

/// Default file extension of manifest modules.
pub const MANIFEST_EXTENSION: &str = "gather";

#[derive(Debug, Deserialize)]
struct ModuleManifest {
    /// Module-level participation marker
    #[serde(default)]
    gathered: bool,

    /// Kept raw so each entry fails on its own
    #[serde(default)]
    types: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct ManifestType {
    name: String,

    #[serde(default)]
    gathered: bool,

    #[serde(default)]
    capabilities: Vec<Capability>,
}

/// Loads JSON manifest modules.
#[derive(Debug, Clone)]
pub struct ManifestHost {
    extension: String,
}

impl ManifestHost {
    pub fn new() -> Self {
        Self::with_extension(MANIFEST_EXTENSION)
    }

    pub fn with_extension(extension: impl Into<String>) -> Self {
        Self {
            extension: extension.into(),
        }
    }
}

impl Default for ManifestHost {
    fn default() -> Self {
        Self::new()
    }
}

impl ModuleHost for ManifestHost {
    fn module_extension(&self) -> &str {
        &self.extension
    }

    fn load(&self, path: &Path) -> Result<Box<dyn Module>, ModuleLoadError> {
        let content = std::fs::read_to_string(path)?;
        let manifest: ModuleManifest = serde_json::from_str(&content)
            .map_err(|e| ModuleLoadError::InvalidManifest(e.to_string()))?;

        Ok(Box::new(ManifestModule {
            path: path.to_path_buf(),
            manifest,
        }))
    }
}

struct ManifestModule {
    path: PathBuf,
    manifest: ModuleManifest,
}

impl Module for ManifestModule {
    fn path(&self) -> &Path {
        &self.path
    }

    fn is_gathered(&self) -> bool {
        self.manifest.gathered
    }

    fn types(&self) -> Result<Vec<TypeDescriptor>, EnumerationError> {
        let mut types = Vec::with_capacity(self.manifest.types.len());
        let mut loader_errors = Vec::new();

        for (index, raw) in self.manifest.types.iter().enumerate() {
            match ManifestType::deserialize(raw) {
                Ok(entry) => types.push(TypeDescriptor {
                    name: entry.name,
                    module: self.path.clone(),
                    capabilities: entry.capabilities,
                    gathered: entry.gathered,
                }),
                Err(e) => loader_errors.push(format!("type #{index}: {e}")),
            }
        }

        if !loader_errors.is_empty() {
            return Err(TypeLoadError {
                module: self.path.display().to_string(),
                loader_errors,
            }
            .into());
        }

        Ok(types)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_load_valid_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = json!({
            "gathered": true,
            "types": [
                { "name": "Foo", "gathered": true, "capabilities": ["TypeA", "TypeB"] },
                { "name": "Loder" }
            ]
        });
        let path = write(dir.path(), "a.gather", &manifest.to_string());

        let module = ManifestHost::new().load(&path).unwrap();
        assert!(module.is_gathered());
        assert_eq!(module.path(), path);

        let types = module.types().unwrap();
        assert_eq!(types.len(), 2);
        assert_eq!(types[0].name, "Foo");
        assert_eq!(types[0].module, path);
        assert!(types[0].implements(&Capability::new("TypeB")));
        assert!(!types[1].gathered);
        assert!(types[1].capabilities.is_empty());
    }

    #[test]
    fn test_missing_marker_defaults_to_not_gathered() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "plain.gather", r#"{ "types": [] }"#);

        let module = ManifestHost::new().load(&path).unwrap();
        assert!(!module.is_gathered());
    }

    #[test]
    fn test_invalid_json_is_load_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "bad.gather", "not valid json");

        let result = ManifestHost::new().load(&path);
        assert!(matches!(result, Err(ModuleLoadError::InvalidManifest(_))));
    }

    #[test]
    fn test_unreadable_file_is_io_failure() {
        let dir = tempfile::tempdir().unwrap();
        let result = ManifestHost::new().load(&dir.path().join("missing.gather"));
        assert!(matches!(result, Err(ModuleLoadError::Io(_))));
    }

    #[test]
    fn test_bad_type_entries_are_partial_failure() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = json!({
            "gathered": true,
            "types": [
                { "name": "Foo", "gathered": true },
                { "gathered": true },
                { "name": "Bar", "capabilities": "TypeA" }
            ]
        });
        let path = write(dir.path(), "partial.gather", &manifest.to_string());

        let module = ManifestHost::new().load(&path).unwrap();
        match module.types() {
            Err(EnumerationError::Partial(e)) => {
                assert_eq!(e.loader_errors.len(), 2);
                assert!(e.loader_errors[0].starts_with("type #1:"));
                assert!(e.loader_errors[1].starts_with("type #2:"));
            }
            other => panic!("expected partial failure, got {other:?}"),
        }
    }

    #[test]
    fn test_custom_extension() {
        let host = ManifestHost::with_extension("plugin");
        assert_eq!(host.module_extension(), "plugin");
    }
}
