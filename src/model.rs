use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// An interface/contract a gathered type declares support for.
///
/// Capabilities are compared by name, so the same token can be used to
/// filter (`Gatherer::load_only`) and to bind harvest results in a consumer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Capability(String);

impl Capability {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Capability {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Capability {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// An exported type as reported by a loaded module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDescriptor {
    pub name: String,
    /// Module file the type was enumerated from
    pub module: PathBuf,
    /// Declared capabilities, in declaration order
    pub capabilities: Vec<Capability>,
    /// Per-type participation marker
    pub gathered: bool,
}

impl TypeDescriptor {
    pub fn new(name: impl Into<String>, module: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            module: module.into(),
            capabilities: Vec::new(),
            gathered: false,
        }
    }

    pub fn with_capability(mut self, capability: impl Into<Capability>) -> Self {
        self.capabilities.push(capability.into());
        self
    }

    pub fn with_gathered(mut self, gathered: bool) -> Self {
        self.gathered = gathered;
        self
    }

    pub fn implements(&self, capability: &Capability) -> bool {
        self.capabilities.contains(capability)
    }
}

/// The result of a gather: one accepted type and every capability it declares.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Harvest {
    gathered_type: TypeDescriptor,
    supported_interfaces: Vec<Capability>,
}

impl Harvest {
    pub(crate) fn new(gathered_type: TypeDescriptor) -> Self {
        let supported_interfaces = gathered_type.capabilities.clone();
        Self {
            gathered_type,
            supported_interfaces,
        }
    }

    /// The type that was gathered
    pub fn gathered_type(&self) -> &TypeDescriptor {
        &self.gathered_type
    }

    /// All the capabilities this type supports, possibly none
    pub fn supported_interfaces(&self) -> &[Capability] {
        &self.supported_interfaces
    }

    pub fn supports(&self, capability: &Capability) -> bool {
        self.supported_interfaces.contains(capability)
    }

    pub fn name(&self) -> &str {
        &self.gathered_type.name
    }
}
