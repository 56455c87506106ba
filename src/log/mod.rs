//! Diagnostic logging for the simulator. This is separate from the statistics reports: log
//! messages describe what the engine is doing, reports record what the epidemic is doing.
//!
//! All crate code logs through the five macros of the `log` crate, re-exported here. Logging is
//! _disabled_ by default; the command line runner turns it on with `--log-level` or `-v`, and
//! code can configure it directly:
//!
//! ```rust
//! use epigrid::log::{set_log_level, set_module_filter, LevelFilter};
//!
//! // Per-tick summaries from everywhere...
//! set_log_level(LevelFilter::Debug);
//! // ...but every movement decision of the agents.
//! set_module_filter("epigrid::movement", LevelFilter::Trace);
//! ```
//!
//! A module filter applies to the module path it names and to everything below it.
#[cfg(feature = "logging")]
mod standard_logger;

#[cfg(not(feature = "logging"))]
mod null_logger;

use std::collections::hash_map::Entry;
use std::sync::{LazyLock, Mutex, MutexGuard};

pub use log::{debug, error, info, trace, warn, LevelFilter};
#[cfg(feature = "logging")]
use log4rs::Handle;

use crate::HashMap;

const DEFAULT_LOG_LEVEL: LevelFilter = LevelFilter::Off;

static LOG_CONFIGURATION: LazyLock<Mutex<LogConfiguration>> = LazyLock::new(Mutex::default);

/// The level filter of one module path, e.g. `"epigrid::transmission"`.
#[derive(Debug, PartialEq)]
struct ModuleLogConfiguration {
    module: String,
    level: LevelFilter,
}

impl From<(&str, LevelFilter)> for ModuleLogConfiguration {
    fn from((module, level): (&str, LevelFilter)) -> Self {
        Self {
            module: module.to_string(),
            level,
        }
    }
}

/// The global level, the per-module filters and the handle of the installed logger. There is
/// one instance per process, reached through the free functions of this module.
#[derive(Debug)]
struct LogConfiguration {
    global_log_level: LevelFilter,
    module_configurations: HashMap<String, ModuleLogConfiguration>,

    #[cfg(feature = "logging")]
    root_handle: Option<Handle>,
}

impl Default for LogConfiguration {
    fn default() -> Self {
        Self {
            global_log_level: DEFAULT_LOG_LEVEL,
            module_configurations: HashMap::default(),

            #[cfg(feature = "logging")]
            root_handle: None,
        }
    }
}

impl LogConfiguration {
    fn set_log_level(&mut self, level: LevelFilter) {
        self.global_log_level = level;
        self.set_config();
    }

    /// Returns true if the filters changed.
    fn insert_module_filter(&mut self, module: &str, level: LevelFilter) -> bool {
        match self.module_configurations.entry(module.to_string()) {
            Entry::Occupied(mut entry) => {
                if entry.get().level == level {
                    return false;
                }
                entry.get_mut().level = level;
            }
            Entry::Vacant(entry) => {
                entry.insert((module, level).into());
            }
        }
        true
    }

    fn set_module_filters(&mut self, module_filters: &[(&str, LevelFilter)]) {
        let mut changed = false;
        for (module, level) in module_filters {
            changed |= self.insert_module_filter(module, *level);
        }
        if changed {
            self.set_config();
        }
    }

    fn remove_module_filter(&mut self, module: &str) {
        if self.module_configurations.remove(module).is_some() {
            self.set_config();
        }
    }
}

/// Turns on every log message. Equivalent to `set_log_level(LevelFilter::Trace)`.
pub fn enable_logging() {
    set_log_level(LevelFilter::Trace);
}

/// Turns off every log message. Equivalent to `set_log_level(LevelFilter::Off)`.
pub fn disable_logging() {
    set_log_level(LevelFilter::Off);
}

/// Sets the level of modules without a filter of their own.
pub fn set_log_level(level: LevelFilter) {
    get_log_configuration().set_log_level(level);
}

/// Sets the level filter for `module_path` and the modules below it.
pub fn set_module_filter(module_path: &str, level: LevelFilter) {
    get_log_configuration().set_module_filters(&[(module_path, level)]);
}

/// Sets several module filters at once, rebuilding the logger only once.
pub fn set_module_filters(module_filters: &[(&str, LevelFilter)]) {
    get_log_configuration().set_module_filters(module_filters);
}

/// Removes the filter of `module_path`, which falls back to the global level.
pub fn remove_module_filter(module_path: &str) {
    get_log_configuration().remove_module_filter(module_path);
}

fn get_log_configuration() -> MutexGuard<'static, LogConfiguration> {
    LOG_CONFIGURATION.lock().expect("Mutex poisoned")
}
