//! On-disk listing cache
//!
//! A cache file is a plain-text snapshot of one wildcard expansion: one url
//! per line, sorted, UTF-8. It is only ever fully overwritten, never merged.

use crate::error::Result;
use crate::utils::make_hash_string;
use std::path::{Path, PathBuf};

/// Where (and whether) to cache a wildcard expansion
#[derive(Clone, Debug)]
pub struct CachePolicy {
    /// Whether an existing cache file short-circuits the remote listing
    pub enabled: bool,
    path_template: String,
}

impl CachePolicy {
    /// Create a policy from a path template
    ///
    /// The template may contain `{hash}`, replaced with a digest of the
    /// wildcard url so distinct patterns get distinct cache files.
    pub fn new(enabled: bool, path_template: impl Into<String>) -> Self {
        Self {
            enabled,
            path_template: path_template.into(),
        }
    }

    /// A policy that never reads or writes cache files
    pub fn disabled() -> Self {
        Self::new(false, "")
    }

    /// Resolve the cache file path for a given wildcard url
    pub fn resolve(&self, pattern: &str) -> PathBuf {
        PathBuf::from(
            self.path_template
                .replace("{hash}", &make_hash_string(pattern)),
        )
    }
}

/// Read a cache file into a sorted url list; `None` when the file is absent
pub(crate) fn read_cache(path: &Path) -> Result<Option<Vec<String>>> {
    if !path.is_file() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path)?;
    let mut urls: Vec<String> = content
        .lines()
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect();
    urls.sort();
    Ok(Some(urls))
}

/// Overwrite the cache file with a url list, creating parent directories
pub(crate) fn write_cache(path: &Path, urls: &[String]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, urls.join("\n"))?;
    Ok(())
}
