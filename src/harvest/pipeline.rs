//! Gather pipeline stages.
//!
//! [`GatherPipeline`] runs the stages sequentially on the calling thread:
//! 1. **Scan**: list candidate module files of each directory root
//! 2. **Load**: load candidates, keep modules with the participation marker
//! 3. **Filter**: enumerate types and evaluate the condition chain
//! 4. **Harvest**: pair accepted types with their capabilities
//!
//! Failures are isolated to the file, module or directory they occur in;
//! nothing here aborts a run.

use std::path::{Path, PathBuf};

use crate::condition::Condition;
use crate::diagnostics::{messages, Diagnostics};
use crate::model::{Harvest, TypeDescriptor};
use crate::traits::{EnumerationError, Module, ModuleHost, ModuleLoadError, TypeLoadError};

// ============================================================================
// Pipeline Types
// ============================================================================

/// Counters collected during one run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct HarvestStats {
    /// Directory roots that existed and were listed
    pub directories_scanned: usize,

    /// Module files found across all directory roots
    pub candidate_files: usize,

    /// Loaded modules carrying the participation marker
    pub modules_gathered: usize,

    /// Types evaluated against the condition chain
    pub types_considered: usize,

    /// Types that passed every condition
    pub types_accepted: usize,
}

/// Output of [`GatherPipeline::execute`].
#[derive(Debug, Clone)]
pub struct GatherResult {
    /// Harvest records in discovery order
    pub harvest: Vec<Harvest>,

    pub stats: HarvestStats,
}

/// One configured gather run, borrowing everything from its `Gatherer`.
pub struct GatherPipeline<'a> {
    pub host: &'a dyn ModuleHost,
    pub directories: &'a [PathBuf],
    pub conditions: &'a [Condition],
    pub diagnostics: &'a Diagnostics,
    pub on_module_load_error: &'a dyn Fn(&Path, &ModuleLoadError),
    pub on_type_load_error: &'a dyn Fn(&TypeLoadError),
}

impl GatherPipeline<'_> {
    pub fn execute(&self) -> GatherResult {
        let mut stats = HarvestStats::default();

        let files = self.candidate_files(&mut stats);
        let modules = self.load_modules(&files);
        stats.modules_gathered = modules.len();

        let accepted = self.scan_types(&modules, &mut stats);
        let harvest = build_harvest(accepted);

        self.diagnostics
            .log(messages::gathered(harvest.len(), stats.modules_gathered));
        self.diagnostics.verbose(messages::run_stats(
            stats.directories_scanned,
            stats.candidate_files,
            stats.types_considered,
            stats.types_accepted,
        ));

        GatherResult { harvest, stats }
    }

    /// Lists module files of each directory, non-recursively, in
    /// configuration order then filesystem order.
    fn candidate_files(&self, stats: &mut HarvestStats) -> Vec<PathBuf> {
        let mut files = Vec::new();

        for dir in self.directories {
            if !dir.is_dir() {
                self.diagnostics.log(messages::unable_to_load_directory(dir));
                continue;
            }

            let entries = match std::fs::read_dir(dir) {
                Ok(entries) => entries,
                Err(e) => {
                    self.diagnostics
                        .log(messages::unable_to_read_directory(dir, &e));
                    continue;
                }
            };

            stats.directories_scanned += 1;
            files.extend(
                entries
                    .flatten()
                    .map(|entry| entry.path())
                    .filter(|path| self.host.is_module_file(path)),
            );
        }

        stats.candidate_files = files.len();
        files
    }

    /// Loads every candidate. Failures go to the module-load handler; modules
    /// without the participation marker are dropped without logging.
    fn load_modules(&self, files: &[PathBuf]) -> Vec<Box<dyn Module>> {
        let mut modules = Vec::new();

        for file in files {
            match self.host.load(file) {
                Ok(module) if module.is_gathered() => modules.push(module),
                Ok(_) => {}
                Err(e) => (self.on_module_load_error)(file, &e),
            }
        }

        modules
    }

    fn scan_types(
        &self,
        modules: &[Box<dyn Module>],
        stats: &mut HarvestStats,
    ) -> Vec<TypeDescriptor> {
        let mut accepted = Vec::new();

        for module in modules {
            let candidates = match module.types() {
                Ok(types) => types,
                Err(EnumerationError::Partial(e)) => {
                    (self.on_type_load_error)(&e);
                    continue;
                }
                Err(e) => {
                    self.diagnostics
                        .log(messages::enumeration_failure(module.path(), &e));
                    continue;
                }
            };

            for candidate in candidates {
                stats.types_considered += 1;
                if self.passes_conditions(&candidate) {
                    accepted.push(candidate);
                }
            }
        }

        stats.types_accepted = accepted.len();
        accepted
    }

    /// Evaluates conditions in insertion order, stopping at the first
    /// rejection.
    fn passes_conditions(&self, candidate: &TypeDescriptor) -> bool {
        self.diagnostics
            .verbose(messages::considering_type(&candidate.name));

        match self.conditions.iter().find(|c| !c.accepts(candidate)) {
            Some(rejecting) => {
                self.diagnostics
                    .verbose(messages::disqualified_by(rejecting.name()));
                false
            }
            None => {
                self.diagnostics.verbose(messages::accepted());
                true
            }
        }
    }
}

/// Pairs each accepted type with its full capability set, preserving order.
pub fn build_harvest(types: Vec<TypeDescriptor>) -> Vec<Harvest> {
    types.into_iter().map(Harvest::new).collect()
}

/// Directory containing the running executable, or `.` when unknown.
pub fn executable_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
}

// ============================================================================
// Tests
// ============================================================================
