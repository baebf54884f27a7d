//! Download executor
//!
//! Retrieves a list of concrete urls to a destination directory with
//! bounded parallelism and best-effort semantics: individual failures are
//! recorded and summarized, never raised. Only configuration errors (bad
//! `n_jobs`, conflicting credentials, unknown scheme) and cancellation
//! abort a batch.

mod ftp;
mod http;
mod task;

pub(crate) use task::{DownloadTask, Scheme, TaskOutcome};

use crate::config::{Credentials, MAX_JOBS};
use crate::error::{Error, Result};
use crate::logging::DownloadLog;
use crate::processors::choose_processor;
use crate::utils::filename_from_url;
use futures::stream::{self, StreamExt, TryStreamExt};
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;

/// Executor-level knobs, assembled by the orchestrator
#[derive(Clone, Debug)]
pub struct DownloadOptions {
    /// Number of parallel downloads; clamped to the url count, then
    /// required to be within `[1, MAX_JOBS]`
    pub n_jobs: usize,
    /// Login details forwarded to every task
    pub login: Credentials,
    /// Select a decompressor per url by extension
    pub decompress: bool,
    /// Show a progress bar (effective only for sequential batches)
    pub progress: bool,
    /// Cancellation token; firing it aborts remaining tasks
    pub cancel: CancellationToken,
}

impl Default for DownloadOptions {
    fn default() -> Self {
        Self {
            n_jobs: 1,
            login: Credentials::default(),
            decompress: true,
            progress: false,
            cancel: CancellationToken::new(),
        }
    }
}

/// Download a list of urls into `dest_dir`, returning the local paths of
/// the successful retrievals (failures excluded)
///
/// Decompression can turn one retrieved archive into several extracted
/// files; the returned list is already flattened. An empty url list
/// returns an empty result without error.
pub async fn download_urls(
    urls: &[String],
    dest_dir: &Path,
    options: &DownloadOptions,
    log: &DownloadLog,
) -> Result<Vec<PathBuf>> {
    if urls.is_empty() {
        return Ok(Vec::new());
    }
    options.login.validate()?;

    // n_jobs defaults down to the url count, then the hard cap applies
    let n_jobs = options.n_jobs.min(urls.len());
    if n_jobs < 1 || n_jobs > MAX_JOBS {
        return Err(Error::config_key(
            format!("n_jobs must be between 1 and {MAX_JOBS} to avoid too many requests"),
            "n_jobs",
        ));
    }
    // progress bars interleave badly across parallel tasks
    let progress = options.progress && n_jobs == 1;

    let tasks = build_tasks(urls, dest_dir, options, progress)?;
    let client = reqwest::Client::new();

    let outcomes: Vec<TaskOutcome> = stream::iter(tasks)
        .map(|task| {
            let client = client.clone();
            let cancel = options.cancel.clone();
            async move { task.run(&client, &cancel, log).await }
        })
        .buffer_unordered(n_jobs)
        .try_collect()
        .await?;

    let mut passed = Vec::new();
    let mut failed = Vec::new();
    for outcome in outcomes {
        match outcome {
            TaskOutcome::Retrieved(paths) => passed.extend(paths),
            TaskOutcome::Failed(url) => failed.push(url),
        }
    }

    log.info(&format!(
        "SUMMARY: Retrieved={}, Failed={} listing failed below: \n{}",
        passed.len(),
        failed.len(),
        failed.join("\n")
    ));

    Ok(passed)
}

fn build_tasks(
    urls: &[String],
    dest_dir: &Path,
    options: &DownloadOptions,
    progress: bool,
) -> Result<Vec<DownloadTask>> {
    urls.iter()
        .map(|url| {
            Ok(DownloadTask {
                url: url.clone(),
                fname: filename_from_url(url),
                dest_dir: dest_dir.to_path_buf(),
                scheme: Scheme::for_url(url)?,
                processor: if options.decompress {
                    choose_processor(url)
                } else {
                    None
                },
                login: options.login.clone(),
                progress,
            })
        })
        .collect()
}
