//! Per-url download tasks and the ordered retry-policy chain
//!
//! Each task runs a fixed sequence of attempt policies, first success wins:
//!
//! 1. as configured (progress display included when enabled)
//! 2. progress display forcibly disabled, for servers that reject the HEAD
//!    request used to size the progress bar
//! 3. final attempt; on failure the error is classified (FTP 550 logs a
//!    permission hint) and the task is recorded as failed
//!
//! Intermediate failures are discarded without logging. Cancellation is the
//! one error the chain never swallows: it propagates immediately and aborts
//! the whole batch.

use super::{ftp, http};
use crate::config::Credentials;
use crate::error::{Error, Result};
use crate::logging::DownloadLog;
use crate::processors::Processor;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// Supported download protocols
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Scheme {
    /// HTTP or HTTPS via reqwest
    Http,
    /// FTP via a blocking control connection
    Ftp,
}

impl Scheme {
    /// Select the downloader for a url; anything outside ftp/http/https is
    /// rejected before any task starts
    pub(crate) fn for_url(url: &str) -> Result<Self> {
        let scheme = url.split("://").next().unwrap_or_default().to_lowercase();
        match scheme.as_str() {
            "http" | "https" => Ok(Scheme::Http),
            "ftp" => Ok(Scheme::Ftp),
            _ => Err(Error::UnsupportedProtocol {
                scheme,
                url: url.to_string(),
            }),
        }
    }
}

/// Attempt policies, evaluated strictly in order
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum AttemptPolicy {
    /// First try, progress display as configured
    AsConfigured,
    /// Retry with progress display disabled
    ProgressDisabled,
    /// Last try; on failure classify and record, never raise
    FinalClassify,
}

const POLICY_CHAIN: [AttemptPolicy; 3] = [
    AttemptPolicy::AsConfigured,
    AttemptPolicy::ProgressDisabled,
    AttemptPolicy::FinalClassify,
];

/// Result of one task after the full policy chain
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum TaskOutcome {
    /// Local paths produced by the task (several when decompression
    /// extracts an archive)
    Retrieved(Vec<PathBuf>),
    /// The url that could not be retrieved
    Failed(String),
}

/// Everything needed to retrieve one url
#[derive(Clone, Debug)]
pub(crate) struct DownloadTask {
    pub(crate) url: String,
    pub(crate) fname: String,
    pub(crate) dest_dir: PathBuf,
    pub(crate) scheme: Scheme,
    pub(crate) processor: Option<Processor>,
    pub(crate) login: Credentials,
    pub(crate) progress: bool,
}

impl DownloadTask {
    /// Run the policy chain to completion
    ///
    /// Returns `Err` only for cancellation; every other failure ends up as
    /// `TaskOutcome::Failed` after the final attempt.
    pub(crate) async fn run(
        &self,
        client: &reqwest::Client,
        cancel: &CancellationToken,
        log: &DownloadLog,
    ) -> Result<TaskOutcome> {
        log.info(&format!("retrieving {}", self.url));

        for policy in POLICY_CHAIN {
            if cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }
            let progress = match policy {
                AttemptPolicy::AsConfigured => self.progress,
                _ => false,
            };

            let attempt = self.attempt(client, progress);
            let result = tokio::select! {
                _ = cancel.cancelled() => Err(Error::Cancelled),
                result = attempt => result,
            };

            match result {
                Ok(paths) => return Ok(TaskOutcome::Retrieved(paths)),
                Err(Error::Cancelled) => return Err(Error::Cancelled),
                Err(error) if policy == AttemptPolicy::FinalClassify => {
                    if error.is_permission_denied() {
                        log.info(&format!("ERROR: Check file permissions: {}. ", self.url));
                    }
                    warn!(url = %self.url, error = %error, "download failed after all attempts");
                    return Ok(TaskOutcome::Failed(self.url.clone()));
                }
                // intermediate failures are discarded; the next policy retries
                Err(_) => {}
            }
        }
        Ok(TaskOutcome::Failed(self.url.clone()))
    }

    async fn attempt(&self, client: &reqwest::Client, progress: bool) -> Result<Vec<PathBuf>> {
        let target = self.dest_dir.join(&self.fname);
        let retrieved = match self.scheme {
            Scheme::Http => http::fetch(client, &self.url, &target, &self.login, progress).await?,
            Scheme::Ftp => ftp::fetch(&self.url, &target, &self.login).await?,
        };

        match self.processor {
            Some(processor) => {
                let archive = retrieved.clone();
                tokio::task::spawn_blocking(move || processor.apply(&archive))
                    .await
                    .map_err(|e| Error::Download(e.to_string()))?
            }
            None => Ok(vec![retrieved]),
        }
    }
}
