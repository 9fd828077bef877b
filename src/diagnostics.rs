//! Log sink plumbing and diagnostic timing.

use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::traits::{ModuleLoadError, TypeLoadError};

/// Accepts one line of log text.
pub type LogSink = Arc<dyn Fn(&str) + Send + Sync>;

/// Reports a module file that failed to load.
pub type ModuleLoadHandler = Arc<dyn Fn(&Path, &ModuleLoadError) + Send + Sync>;

/// Reports partial type-load failures.
pub type TypeLoadHandler = Arc<dyn Fn(&TypeLoadError) + Send + Sync>;

/// Default sink: the `gatherer` tracing target at debug level.
pub fn default_sink() -> LogSink {
    Arc::new(|line| tracing::debug!(target: "gatherer", "{line}"))
}

/// Log sink paired with the verbose switch for one gather run.
#[derive(Clone)]
pub struct Diagnostics {
    sink: LogSink,
    verbose: bool,
}

impl Diagnostics {
    pub fn new(sink: LogSink, verbose: bool) -> Self {
        Self { sink, verbose }
    }

    /// Summary line, always emitted.
    pub fn log(&self, message: impl fmt::Display) {
        (self.sink)(&message.to_string());
    }

    /// Per-type detail, emitted only with verbose logging.
    pub fn verbose(&self, message: impl fmt::Display) {
        if self.verbose {
            self.log(message);
        }
    }
}

impl fmt::Debug for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Diagnostics")
            .field("verbose", &self.verbose)
            .finish_non_exhaustive()
    }
}

/// Stopwatch around a gather run; inert when timing is disabled.
#[derive(Debug)]
pub struct LoadTimer {
    started: Option<Instant>,
}

impl LoadTimer {
    pub fn start(enabled: bool) -> Self {
        Self {
            started: enabled.then(Instant::now),
        }
    }

    /// Logs the elapsed time, returning it if timing was enabled.
    pub fn stop(self, diagnostics: &Diagnostics) -> Option<Duration> {
        let elapsed = self.started?.elapsed();
        diagnostics.log(messages::completed_load(elapsed));
        Some(elapsed)
    }
}

pub(crate) mod messages {
    use super::*;

    pub fn unable_to_load_directory(dir: &Path) -> String {
        format!("Unable to load directory {}", dir.display())
    }

    pub fn unable_to_read_directory(dir: &Path, err: &std::io::Error) -> String {
        format!("Unable to read directory {}: {err}", dir.display())
    }

    pub fn unable_to_load_module(path: &Path, err: &ModuleLoadError) -> String {
        format!("Unable to load module {}: {err}", path.display())
    }

    pub fn type_load_failure(err: &TypeLoadError) -> String {
        format!("Unable to load types: {}", err.loader_errors.join(", "))
    }

    pub fn enumeration_failure(path: &Path, err: &dyn std::error::Error) -> String {
        format!("Unable to enumerate types of {}: {err}", path.display())
    }

    pub fn considering_type(name: &str) -> String {
        format!("Considering type {name}")
    }

    pub fn disqualified_by(condition: &str) -> String {
        format!("Disqualified by {condition}")
    }

    pub fn accepted() -> &'static str {
        "Accepted"
    }

    pub fn completed_load(elapsed: Duration) -> String {
        format!("Completed load in {elapsed:?}")
    }

    pub fn gathered(types: usize, modules: usize) -> String {
        format!("Gathered {types} types from {modules} modules")
    }

    pub fn run_stats(
        directories: usize,
        files: usize,
        considered: usize,
        accepted: usize,
    ) -> String {
        format!(
            "Scanned {directories} directories and {files} module files, \
             accepted {accepted} of {considered} types"
        )
    }
}
