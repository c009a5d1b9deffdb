//! Locating external executables.
//!
//! Tools are found by checking a fixed, ordered list of install directories
//! for a file with the exact executable name. `PATH` is never consulted, so
//! lookups behave the same whether the host was started from a shell or from
//! a desktop launcher with a minimal environment.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::config::CoreConfig;

/// Result of a tool lookup. An empty `path` means the tool was not found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutableLocation {
    /// Executable name that was searched for
    pub name: String,
    /// Full path of the first match, or empty
    pub path: PathBuf,
}

impl ExecutableLocation {
    /// Whether a matching file was found.
    #[must_use]
    pub fn is_found(&self) -> bool {
        !self.path.as_os_str().is_empty()
    }
}

/// Searches an ordered list of directories for executables.
///
/// Created with [`BinaryLocator::new`] every call hits the filesystem again.
/// [`BinaryLocator::memoized`] remembers successful lookups; misses are always
/// searched again so a tool installed while the process runs is picked up.
#[derive(Debug)]
pub struct BinaryLocator {
    search_dirs: Vec<PathBuf>,
    memo: Option<Mutex<HashMap<String, PathBuf>>>,
}

impl BinaryLocator {
    /// Creates a locator that searches on every call.
    pub fn new(search_dirs: Vec<PathBuf>) -> Self {
        Self {
            search_dirs,
            memo: None,
        }
    }

    /// Creates a locator that caches found locations.
    pub fn memoized(search_dirs: Vec<PathBuf>) -> Self {
        Self {
            search_dirs,
            memo: Some(Mutex::new(HashMap::new())),
        }
    }

    /// Creates a locator from the configured directories and memoization flag.
    pub fn from_config(config: &CoreConfig) -> Self {
        if config.memoize_binary_lookup {
            Self::memoized(config.search_dirs.clone())
        } else {
            Self::new(config.search_dirs.clone())
        }
    }

    /// Directories searched, in order.
    pub fn search_dirs(&self) -> &[PathBuf] {
        &self.search_dirs
    }

    /// Finds `executable_name` in the first search directory that contains it.
    pub fn locate(&self, executable_name: &str) -> ExecutableLocation {
        if let Some(memo) = &self.memo {
            if let Ok(guard) = memo.lock() {
                if let Some(path) = guard.get(executable_name) {
                    return ExecutableLocation {
                        name: executable_name.to_string(),
                        path: path.clone(),
                    };
                }
            }
        }

        let path = search(&self.search_dirs, executable_name).unwrap_or_default();
        if path.as_os_str().is_empty() {
            log::debug!("No '{executable_name}' in {:?}", self.search_dirs);
        } else {
            log::debug!("Located '{executable_name}' at {}", path.display());
            if let Some(memo) = &self.memo {
                if let Ok(mut guard) = memo.lock() {
                    guard.insert(executable_name.to_string(), path.clone());
                }
            }
        }

        ExecutableLocation {
            name: executable_name.to_string(),
            path,
        }
    }
}

fn search(dirs: &[PathBuf], executable_name: &str) -> Option<PathBuf> {
    if executable_name.is_empty() || Path::new(executable_name).components().count() != 1 {
        return None;
    }
    dirs.iter()
        .map(|dir| dir.join(executable_name))
        .find(|candidate| candidate.is_file())
}
