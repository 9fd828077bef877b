//! The `Gatherer` façade.
//!
//! A `Gatherer` owns its configuration (directory roots, condition chain, log
//! sink, flags) and runs the [`GatherPipeline`] on demand. Configuration is
//! a consuming builder; runs borrow the gatherer immutably.
//!
//! # Example
//!
//! ```no_run
//! use gatherer::{Capability, Gatherer};
//!
//! let gatherer = Gatherer::new()
//!     .add_directory("/usr/lib/myapp/plugins")?
//!     .with_verbose_logging()
//!     .with_diagnostic_timing()
//!     .with_logger(|line| println!("{line}"));
//!
//! for harvest in gatherer.load_only(&Capability::new("Storage")) {
//!     println!("{} implements {:?}", harvest.name(), harvest.supported_interfaces());
//! }
//! # Ok::<(), gatherer::GatherError>(())
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

use crate::condition::Condition;
use crate::diagnostics::{
    default_sink, messages, Diagnostics, LoadTimer, LogSink, ModuleLoadHandler, TypeLoadHandler,
};
use crate::harvest::pipeline::{executable_dir, GatherPipeline};
use crate::host::DylibHost;
use crate::model::{Capability, Harvest};
use crate::traits::{ModuleHost, ModuleLoadError, TypeLoadError};

/// Configuration misuse, reported by the configuration call itself.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatherError {
    #[error("invalid argument `{argument}`: {reason}")]
    InvalidArgument {
        argument: &'static str,
        reason: &'static str,
    },
}

/// Plain configuration values of a [`Gatherer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatherOptions {
    /// Directory roots, searched in order
    pub directories: Vec<PathBuf>,

    /// Log per-type consideration, acceptance and rejection
    pub verbose_logging: bool,

    /// Log the elapsed time of every load
    pub diagnostic_timing: bool,
}

impl Default for GatherOptions {
    fn default() -> Self {
        Self {
            directories: vec![executable_dir()],
            verbose_logging: false,
            diagnostic_timing: false,
        }
    }
}

/// Core gatherer for loading types from plugin modules.
///
/// # Thread Safety
///
/// Configuration requires ownership, so it cannot race with a run. Separate
/// instances share nothing except an explicitly shared [`ModuleHost`].
#[derive(Clone)]
pub struct Gatherer {
    options: GatherOptions,
    conditions: Vec<Condition>,
    host: Arc<dyn ModuleHost>,
    logger: LogSink,
    module_load_handler: Option<ModuleLoadHandler>,
    type_load_handler: Option<TypeLoadHandler>,
}

impl Gatherer {
    /// Creates a gatherer over the directory containing the running program.
    pub fn new() -> Self {
        Self::build(GatherOptions::default())
    }

    /// Creates a gatherer over a single directory.
    pub fn with_directory(directory: impl Into<PathBuf>) -> Result<Self, GatherError> {
        Self::with_directories(vec![directory.into()])
    }

    /// Creates a gatherer over a list of directories.
    ///
    /// # Errors
    ///
    /// Returns [`GatherError::InvalidArgument`] if the list or any path in it
    /// is empty.
    pub fn with_directories(directories: Vec<PathBuf>) -> Result<Self, GatherError> {
        validate_directories(&directories)?;
        Ok(Self::build(GatherOptions {
            directories,
            ..GatherOptions::default()
        }))
    }

    /// Creates a gatherer from explicit options, with the default condition
    /// set, log sink and the native module host.
    ///
    /// # Errors
    ///
    /// Returns [`GatherError::InvalidArgument`] if `options.directories` or
    /// any path in it is empty.
    pub fn from_options(options: GatherOptions) -> Result<Self, GatherError> {
        validate_directories(&options.directories)?;
        Ok(Self::build(options))
    }

    fn build(options: GatherOptions) -> Self {
        Self {
            options,
            conditions: vec![Condition::gathered_type()],
            host: Arc::new(DylibHost::new()),
            logger: default_sink(),
            module_load_handler: None,
            type_load_handler: None,
        }
    }

    // ========================================================================
    // Configuration
    // ========================================================================

    /// Adds a directory root for future loads.
    pub fn add_directory(self, directory: impl Into<PathBuf>) -> Result<Self, GatherError> {
        self.add_directories(vec![directory.into()])
    }

    /// Adds directory roots for future loads.
    ///
    /// # Errors
    ///
    /// Returns [`GatherError::InvalidArgument`] if the list or any path in it
    /// is empty. No directory is added in that case.
    pub fn add_directories(
        mut self,
        directories: impl IntoIterator<Item = PathBuf>,
    ) -> Result<Self, GatherError> {
        let directories: Vec<PathBuf> = directories.into_iter().collect();
        validate_directories(&directories)?;
        self.options.directories.extend(directories);
        Ok(self)
    }

    /// Replaces the log sink.
    pub fn with_logger<F>(mut self, logger: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.logger = Arc::new(logger);
        self
    }

    pub fn with_verbose_logging(mut self) -> Self {
        self.options.verbose_logging = true;
        self
    }

    /// Enables diagnostic timing for future loads.
    pub fn with_diagnostic_timing(mut self) -> Self {
        self.options.diagnostic_timing = true;
        self
    }

    /// Appends a condition to the chain checked for future loads.
    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    /// Removes `condition` from the chain. Matching is by identity, so this is
    /// a no-op unless `condition` is (a clone of) an added instance.
    pub fn without_condition(mut self, condition: &Condition) -> Self {
        if let Some(index) = self.conditions.iter().position(|c| c.same_as(condition)) {
            self.conditions.remove(index);
        }
        self
    }

    /// Replaces how module files that fail to load are reported. The default
    /// writes one summary line per failed file to the log sink.
    pub fn with_module_load_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&Path, &ModuleLoadError) + Send + Sync + 'static,
    {
        self.module_load_handler = Some(Arc::new(handler));
        self
    }

    /// Replaces how partial type-load failures are reported. The default
    /// writes one summary line to the log sink.
    pub fn with_type_load_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&TypeLoadError) + Send + Sync + 'static,
    {
        self.type_load_handler = Some(Arc::new(handler));
        self
    }

    /// Replaces the module host (native libraries by default).
    pub fn with_host(mut self, host: impl ModuleHost + 'static) -> Self {
        self.host = Arc::new(host);
        self
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn directories(&self) -> &[PathBuf] {
        &self.options.directories
    }

    /// The condition chain in evaluation order.
    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn options(&self) -> &GatherOptions {
        &self.options
    }

    // ========================================================================
    // Loading
    // ========================================================================

    /// Loads every type that passes the condition chain from every module
    /// carrying the participation marker.
    ///
    /// Never fails: unreadable directories, broken modules and partial type
    /// loads are reported through the log sink or type-load handler and
    /// skipped.
    pub fn load_all(&self) -> Vec<Harvest> {
        self.run(&self.conditions)
    }

    /// Like [`load_all`](Self::load_all), additionally requiring `capability`.
    ///
    /// The capability condition applies to this run only; the configured
    /// condition chain is left untouched.
    pub fn load_only(&self, capability: &Capability) -> Vec<Harvest> {
        let mut conditions = self.conditions.clone();
        conditions.push(Condition::implements(capability.clone()));
        self.run(&conditions)
    }

    fn run(&self, conditions: &[Condition]) -> Vec<Harvest> {
        let span = tracing::debug_span!(
            "gather",
            directories = self.options.directories.len(),
            conditions = conditions.len()
        );
        let _enter = span.enter();

        let diagnostics = Diagnostics::new(Arc::clone(&self.logger), self.options.verbose_logging);
        let timer = LoadTimer::start(self.options.diagnostic_timing);

        let log_module_failure =
            |path: &Path, e: &ModuleLoadError| diagnostics.log(messages::unable_to_load_module(path, e));
        let on_module_load_error: &dyn Fn(&Path, &ModuleLoadError) = match &self.module_load_handler {
            Some(handler) => handler.as_ref(),
            None => &log_module_failure,
        };

        let log_type_failure = |e: &TypeLoadError| diagnostics.log(messages::type_load_failure(e));
        let on_type_load_error: &dyn Fn(&TypeLoadError) = match &self.type_load_handler {
            Some(handler) => handler.as_ref(),
            None => &log_type_failure,
        };

        let result = GatherPipeline {
            host: self.host.as_ref(),
            directories: &self.options.directories,
            conditions,
            diagnostics: &diagnostics,
            on_module_load_error,
            on_type_load_error,
        }
        .execute();

        timer.stop(&diagnostics);
        result.harvest
    }
}

impl Default for Gatherer {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Gatherer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Gatherer")
            .field("options", &self.options)
            .field("conditions", &self.conditions)
            .field("custom_module_load_handler", &self.module_load_handler.is_some())
            .field("custom_type_load_handler", &self.type_load_handler.is_some())
            .finish_non_exhaustive()
    }
}

fn validate_directories(directories: &[PathBuf]) -> Result<(), GatherError> {
    if directories.is_empty() {
        return Err(GatherError::InvalidArgument {
            argument: "directories",
            reason: "at least one directory is required",
        });
    }
    if directories.iter().any(|d| d.as_os_str().is_empty()) {
        return Err(GatherError::InvalidArgument {
            argument: "directories",
            reason: "directory path is empty",
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_configuration() {
        let gatherer = Gatherer::new();

        assert_eq!(gatherer.directories(), &[executable_dir()]);
        assert_eq!(gatherer.conditions().len(), 1);
        assert_eq!(gatherer.conditions()[0].name(), "Gathered");
        assert!(!gatherer.options().verbose_logging);
        assert!(!gatherer.options().diagnostic_timing);
    }

    #[test]
    fn test_instances_do_not_share_default_condition() {
        let a = Gatherer::new();
        let b = Gatherer::new();
        assert_ne!(a.conditions()[0], b.conditions()[0]);
    }

    #[test]
    fn test_add_directories_rejects_empty_list() {
        let err = Gatherer::new().add_directories(Vec::new()).unwrap_err();
        assert!(matches!(
            err,
            GatherError::InvalidArgument {
                argument: "directories",
                ..
            }
        ));
    }

    #[test]
    fn test_empty_directory_path_is_rejected() {
        assert!(Gatherer::new().add_directory("").is_err());
        assert!(Gatherer::with_directory("").is_err());
        assert!(Gatherer::with_directories(vec![]).is_err());
    }

    #[test]
    fn test_from_options_validates_directories() {
        let empty = GatherOptions {
            directories: Vec::new(),
            ..GatherOptions::default()
        };
        assert_eq!(
            Gatherer::from_options(empty).unwrap_err(),
            GatherError::InvalidArgument {
                argument: "directories",
                reason: "at least one directory is required",
            }
        );

        let blank = GatherOptions {
            directories: vec![PathBuf::from("/a"), PathBuf::new()],
            ..GatherOptions::default()
        };
        assert_eq!(
            Gatherer::from_options(blank).unwrap_err(),
            GatherError::InvalidArgument {
                argument: "directories",
                reason: "directory path is empty",
            }
        );

        let options = GatherOptions {
            directories: vec![PathBuf::from("/a")],
            verbose_logging: true,
            diagnostic_timing: false,
        };
        let gatherer = Gatherer::from_options(options.clone()).unwrap();
        assert_eq!(gatherer.options(), &options);
    }

    #[test]
    fn test_add_directories_appends_in_order() {
        let gatherer = Gatherer::with_directory("/a")
            .unwrap()
            .add_directories(vec![PathBuf::from("/b"), PathBuf::from("/c")])
            .unwrap()
            .add_directory("/d")
            .unwrap();

        let dirs: Vec<_> = gatherer.directories().iter().map(|d| d.to_str().unwrap()).collect();
        assert_eq!(dirs, vec!["/a", "/b", "/c", "/d"]);
    }

    #[test]
    fn test_without_condition_is_identity_based() {
        let named = Condition::new("Named Foo", |t| t.name == "Foo");
        let lookalike = Condition::new("Named Foo", |t| t.name == "Foo");

        let gatherer = Gatherer::new()
            .with_condition(named.clone())
            .without_condition(&lookalike);
        assert_eq!(gatherer.conditions().len(), 2);

        let gatherer = gatherer.without_condition(&named);
        assert_eq!(gatherer.conditions().len(), 1);
    }

    #[test]
    fn test_default_condition_removable_by_handle() {
        let gatherer = Gatherer::new();
        let builtin = gatherer.conditions()[0].clone();

        let gatherer = gatherer.without_condition(&builtin);
        assert!(gatherer.conditions().is_empty());
    }

    #[test]
    fn test_flags_are_set() {
        let gatherer = Gatherer::new()
            .with_verbose_logging()
            .with_diagnostic_timing();
        assert!(gatherer.options().verbose_logging);
        assert!(gatherer.options().diagnostic_timing);
    }

    #[test]
    fn test_load_all_on_missing_directory_returns_empty() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing");
        let gatherer = Gatherer::with_directory(&missing).unwrap();

        assert!(gatherer.load_all().is_empty());
    }
}
