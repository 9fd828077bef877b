//! Discover, load and filter plugin modules into a harvest of types.
//!
//! A [`Gatherer`] scans directory roots for module files, loads the ones
//! carrying the participation marker through a [`ModuleHost`], runs every
//! exported type through its [`Condition`] chain and returns the accepted
//! types as [`Harvest`] records.

pub mod condition;
pub mod diagnostics;
pub mod gatherer;
pub mod harvest;
pub mod host;
pub mod model;
pub mod traits;

// Re-export common types for convenience
pub use condition::Condition;
pub use diagnostics::{LogSink, ModuleLoadHandler, TypeLoadHandler};
pub use gatherer::{GatherError, GatherOptions, Gatherer};
pub use host::{DylibHost, ManifestHost};
pub use model::{Capability, Harvest, TypeDescriptor};
pub use traits::{EnumerationError, Module, ModuleHost, ModuleLoadError, TypeLoadError};
