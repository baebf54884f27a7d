//! Error types for fetch-data
//!
//! This module provides the error surface for the library:
//! - Typed listing failures (no files, bad host, rejected credentials)
//! - Configuration errors raised before any network activity
//! - Ambient I/O, HTTP, FTP and YAML failures wrapped via `#[from]`
//!
//! Individual download failures are deliberately NOT errors: the executor
//! records them and returns only the successfully retrieved paths.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for fetch-data operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for fetch-data
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "n_jobs")
        key: Option<String>,
    },

    /// Wildcard expansion yielded zero matches under strict policy
    #[error("no files could be found for the url: {pattern}")]
    NoFilesFound {
        /// The wildcard pattern that matched nothing
        pattern: String,
    },

    /// Credentials supplied to a protocol/host combination that rejects them
    #[error("credentials not supported for {scheme}://{host}: {reason}")]
    CredentialsUnsupported {
        /// URL scheme of the rejected listing (e.g., "http")
        scheme: String,
        /// Host that rejected the credentials
        host: String,
        /// Why the credentials were rejected
        reason: String,
    },

    /// Malformed host or DNS/connection failure during listing
    #[error("host unreachable: {host}: {reason}")]
    HostUnreachable {
        /// The host that could not be reached
        host: String,
        /// Underlying connection or parse failure
        reason: String,
    },

    /// URL scheme outside the supported set (http, https, ftp)
    #[error("unrecognized URL protocol '{scheme}' in '{url}', must be one of ftp, http, https")]
    UnsupportedProtocol {
        /// The unsupported scheme
        scheme: String,
        /// The full URL carrying it
        url: String,
    },

    /// Executor-level download failure
    #[error("download error: {0}")]
    Download(String),

    /// Archive extraction failed
    #[error("extraction failed for {archive}: {reason}")]
    Extraction {
        /// The archive file that failed to extract
        archive: PathBuf,
        /// The reason extraction failed
        reason: String,
    },

    /// Catalog file could not be interpreted as a set of dataset entries
    #[error("invalid catalog: {0}")]
    InvalidCatalog(String),

    /// Operation cancelled by the caller's cancellation token
    #[error("operation cancelled")]
    Cancelled,

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP transport error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// FTP protocol or connection error
    #[error("FTP error: {0}")]
    Ftp(#[from] suppaftp::FtpError),

    /// URL parsing error
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// Invalid wildcard pattern
    #[error("invalid wildcard pattern: {0}")]
    Pattern(#[from] globset::Error),

    /// YAML parsing error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Construct a `Config` error without an associated key
    pub(crate) fn config(message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: None,
        }
    }

    /// Construct a `Config` error tied to a specific configuration key
    pub(crate) fn config_key(message: impl Into<String>, key: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.into()),
        }
    }

    /// Whether the rendered error text carries an FTP permission-denied
    /// indicator (reply code 550). Used by the executor's final retry stage
    /// to log a permission hint before recording the task as failed.
    pub fn is_permission_denied(&self) -> bool {
        self.to_string().contains("550")
    }
}
