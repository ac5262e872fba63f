//! Process-wide cache of which external tools can be run.
//!
//! The first check for a tool spawns it with its version flag; later checks
//! reuse that answer until a caller forces a re-check.

use crate::config::Config;
use crate::error::Result;
use crate::process::ToolCommand;
use crate::tool::Tool;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, OnceLock};

/// Outcome of an availability check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Availability {
    pub available: bool,
    /// Why the tool could not be run. Empty when it is available.
    pub reason: String,
}

impl Availability {
    fn from_probe(result: Result<()>) -> Self {
        match result {
            Ok(()) => Availability {
                available: true,
                reason: String::new(),
            },
            Err(e) => Availability {
                available: false,
                reason: e.to_string(),
            },
        }
    }
}

/// Availability answers keyed by tool and executable path.
#[derive(Debug, Default)]
pub struct AvailabilityCache {
    entries: Mutex<HashMap<(Tool, PathBuf), Availability>>,
}

impl AvailabilityCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached answer for `tool`, running its version command when
    /// there is none yet or when `force` is set.
    pub fn check(&self, config: &Config, tool: Tool, force: bool) -> Availability {
        self.check_with(config, tool, force, || {
            ToolCommand::bare(config, tool)
                .args(tool.version_args())
                .probe()
        })
    }

    pub(crate) fn check_with<F>(&self, config: &Config, tool: Tool, force: bool, probe: F) -> Availability
    where
        F: FnOnce() -> Result<()>,
    {
        let key = (tool, config.executable(tool).to_path_buf());
        if !force {
            if let Some(known) = self.lock().get(&key) {
                return known.clone();
            }
        }

        // Probing can take up to the tool timeout; other checks must not wait
        // on it. Two concurrent first checks may both probe.
        let availability = Availability::from_probe(probe());
        if !availability.available {
            log::warn!("{} is not available, some commands may fail: {}", tool, availability.reason);
        }
        self.lock().insert(key, availability.clone());
        availability
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<(Tool, PathBuf), Availability>> {
        // A poisoned lock only means another check panicked; the map is still usable.
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn global_cache() -> &'static AvailabilityCache {
    static CACHE: OnceLock<AvailabilityCache> = OnceLock::new();
    CACHE.get_or_init(AvailabilityCache::new)
}

/// Checks whether `tool` can be run with the given configuration, using the
/// process-wide cache.
///
/// ```no_run
/// use binmeta::{is_tool_available, Config, Tool};
///
/// let exiftool = is_tool_available(&Config::default(), Tool::ExifTool, false);
/// if !exiftool.available {
///     eprintln!("ExifTool missing: {}", exiftool.reason);
/// }
/// ```
pub fn is_tool_available(config: &Config, tool: Tool, force: bool) -> Availability {
    global_cache().check(config, tool, force)
}
