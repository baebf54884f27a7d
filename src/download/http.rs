//! HTTP(S) downloader
//!
//! Streams the response body to a `.part` file and renames on completion,
//! so an interrupted retrieval never leaves a final artifact behind. The
//! optional progress bar is sized with a HEAD request; servers that reject
//! HEAD make the attempt fail, which the task's policy chain handles by
//! retrying without progress display.

use crate::config::Credentials;
use crate::error::{Error, Result};
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::header::COOKIE;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

fn apply_login(request: reqwest::RequestBuilder, login: &Credentials) -> reqwest::RequestBuilder {
    if let Some(username) = &login.username {
        return request.basic_auth(username, login.password.as_deref());
    }
    if !login.cookies.is_empty() {
        let header = login
            .cookies
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join("; ");
        return request.header(COOKIE, header);
    }
    request
}

async fn content_length(client: &reqwest::Client, url: &str, login: &Credentials) -> Result<u64> {
    let response = apply_login(client.head(url), login)
        .send()
        .await?
        .error_for_status()?;
    Ok(response.content_length().unwrap_or(0))
}

/// Retrieve `url` to `target`, returning the final path
pub(crate) async fn fetch(
    client: &reqwest::Client,
    url: &str,
    target: &Path,
    login: &Credentials,
    progress: bool,
) -> Result<PathBuf> {
    let bar = if progress {
        let total = content_length(client, url, login).await?;
        let bar = ProgressBar::new(total);
        bar.set_style(
            ProgressStyle::with_template(
                "{bar:40} {bytes}/{total_bytes} ({bytes_per_sec}, {eta}) {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        bar.set_message(
            target
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
        );
        Some(bar)
    } else {
        None
    };

    let mut response = apply_login(client.get(url), login)
        .send()
        .await?
        .error_for_status()?;

    if let Some(parent) = target.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let part = part_path(target);
    let mut file = tokio::fs::File::create(&part).await?;
    while let Some(chunk) = response.chunk().await? {
        file.write_all(&chunk).await?;
        if let Some(bar) = &bar {
            bar.inc(chunk.len() as u64);
        }
    }
    file.flush().await?;
    drop(file);

    tokio::fs::rename(&part, target).await?;
    if let Some(bar) = bar {
        bar.finish_and_clear();
    }
    Ok(target.to_path_buf())
}

fn part_path(target: &Path) -> PathBuf {
    let mut name = target.as_os_str().to_os_string();
    name.push(".part");
    PathBuf::from(name)
}
