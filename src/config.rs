//! Configuration types for fetch-data
//!
//! [`FetchOptions`] enumerates every recognized option of a fetch call as an
//! explicit structure. Callers build it (usually from `Default`) instead of
//! relying on ad-hoc keyword capture, so the README generator and template
//! rendering read from the same structure the executor does.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tokio_util::sync::CancellationToken;

/// Hard cap on parallel downloads, to avoid overwhelming remote servers
pub const MAX_JOBS: usize = 8;

/// Logging verbosity of a fetch call
///
/// Mirrors the three accepted shapes of the original `verbose` argument:
/// off, on, or an explicit numeric severity. Severities below 40 enable
/// informational logging (and the per-call log file).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verbosity {
    /// Errors only (severity 40)
    #[default]
    Quiet,
    /// Informational logging (severity 15)
    Verbose,
    /// Explicit numeric severity
    Level(u8),
}

impl Verbosity {
    /// Effective numeric severity
    pub fn severity(&self) -> u8 {
        match self {
            Verbosity::Quiet => 40,
            Verbosity::Verbose => 15,
            Verbosity::Level(level) => *level,
        }
    }

    /// Whether informational logging (and the file log sink) is enabled
    pub fn enables_info(&self) -> bool {
        self.severity() < 40
    }
}

impl From<bool> for Verbosity {
    fn from(verbose: bool) -> Self {
        if verbose {
            Verbosity::Verbose
        } else {
            Verbosity::Quiet
        }
    }
}

impl From<u8> for Verbosity {
    fn from(level: u8) -> Self {
        Verbosity::Level(level)
    }
}

/// Login details for protected servers
///
/// Either a username/password pair (FTP login, HTTP basic auth) or a cookie
/// map (HTTP session auth). Supplying both to one downloader is a conflict.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// Username, if required for the given url and protocol (e.g. FTP)
    #[serde(default)]
    pub username: Option<String>,

    /// Password, if required for the given url and protocol (e.g. FTP)
    #[serde(default)]
    pub password: Option<String>,

    /// Cookies for HTTP session authentication
    #[serde(default)]
    pub cookies: BTreeMap<String, String>,
}

impl Credentials {
    /// True when no login details are set at all
    pub fn is_empty(&self) -> bool {
        self.username.is_none() && self.password.is_none() && self.cookies.is_empty()
    }

    /// True when a username/password pair is set
    pub fn has_basic_auth(&self) -> bool {
        self.username.is_some() || self.password.is_some()
    }

    /// Reject ambiguous credential combinations before any retrieval is attempted
    pub fn validate(&self) -> Result<()> {
        if self.has_basic_auth() && !self.cookies.is_empty() {
            return Err(Error::config_key(
                "login may carry either username/password or cookies, not both",
                "login",
            ));
        }
        Ok(())
    }
}

/// Options for a [`fetch`](crate::fetch) call
///
/// Every field has the documented default, so `FetchOptions::default()` plus
/// a couple of overrides is the common construction path.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FetchOptions {
    /// Destination directory; may contain `{placeholder}` tokens and `~`
    #[serde(default = "default_dest")]
    pub dest: String,

    /// Number of parallel downloads, between 1 and [`MAX_JOBS`]
    #[serde(default = "default_n_jobs")]
    pub n_jobs: usize,

    /// Reuse a cached url list instead of fetching a new one
    #[serde(default = "default_true")]
    pub use_cache: bool,

    /// Cache file name relative to `dest`; `{hash}` is replaced with a
    /// digest of the wildcard url
    #[serde(default = "default_cache_name")]
    pub cache_name: String,

    /// Logging verbosity; informational levels attach the file log sink
    #[serde(default)]
    pub verbose: Verbosity,

    /// Log file name relative to `dest`
    #[serde(default = "default_log_name")]
    pub log_name: String,

    /// Raise [`Error::NoFilesFound`] when a wildcard expands to nothing;
    /// when false an empty expansion yields an empty result
    #[serde(default = "default_true")]
    pub raise_on_empty: bool,

    /// Decompress retrieved archives (tar/zip/gzip) after download
    #[serde(default = "default_true")]
    pub decompress: bool,

    /// Write a README metadata file to `dest` before downloading
    #[serde(default = "default_true")]
    pub create_readme: bool,

    /// README file name relative to `dest`
    #[serde(default = "default_readme_name")]
    pub readme_name: String,

    /// Login details for protected servers
    #[serde(default)]
    pub login: Credentials,

    /// Dataset name, used as the README title
    #[serde(default)]
    pub name: String,

    /// Dataset metadata written to the README (doi, description, citation, ...)
    #[serde(default)]
    pub meta: BTreeMap<String, String>,

    /// Values substituted for `{key}` tokens in the url and dest templates
    #[serde(default)]
    pub placeholders: BTreeMap<String, String>,

    /// Cancellation token; firing it aborts the whole batch
    #[serde(skip)]
    pub cancel: CancellationToken,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            dest: default_dest(),
            n_jobs: default_n_jobs(),
            use_cache: true,
            cache_name: default_cache_name(),
            verbose: Verbosity::default(),
            log_name: default_log_name(),
            raise_on_empty: true,
            decompress: true,
            create_readme: true,
            readme_name: default_readme_name(),
            login: Credentials::default(),
            name: String::new(),
            meta: BTreeMap::new(),
            placeholders: BTreeMap::new(),
            cancel: CancellationToken::new(),
        }
    }
}

impl FetchOptions {
    /// Validate the options before any network activity
    ///
    /// Checks the `n_jobs` range and rejects conflicting credentials.
    pub fn validate(&self) -> Result<()> {
        if self.n_jobs < 1 || self.n_jobs > MAX_JOBS {
            return Err(Error::config_key(
                format!(
                    "n_jobs must be between 1 and {MAX_JOBS} to avoid too many requests, got {}",
                    self.n_jobs
                ),
                "n_jobs",
            ));
        }
        self.login.validate()
    }
}

fn default_dest() -> String {
    "./".to_string()
}

fn default_n_jobs() -> usize {
    1
}

fn default_true() -> bool {
    true
}

fn default_cache_name() -> String {
    "_urls_{hash}.cache".to_string()
}

fn default_log_name() -> String {
    "_downloads.log".to_string()
}

fn default_readme_name() -> String {
    "README.md".to_string()
}
