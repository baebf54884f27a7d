//! High-level fetch orchestration
//!
//! [`fetch`] composes the catalog/listing/download/readme pieces into the
//! primary entry point: resolve templates, attach the per-call log, write
//! the README, expand wildcards (with caching), run the executor and
//! flatten the result.

use crate::catalog::{CatalogEntry, UrlSpec};
use crate::config::FetchOptions;
use crate::download::{self, DownloadOptions};
use crate::error::{Error, Result};
use crate::listing::{self, CachePolicy};
use crate::logging::DownloadLog;
use crate::readme::{self, ReadmeContext};
use crate::utils::{expanduser, render_template};
use std::path::PathBuf;

/// Url input of a fetch call
///
/// An explicit list is used as-is: entries are template-rendered but never
/// glob-expanded or cached, even when they contain `*`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UrlInput {
    /// One url; a `*` triggers remote listing
    Single(String),
    /// Already-concrete urls
    List(Vec<String>),
}

impl From<&str> for UrlInput {
    fn from(url: &str) -> Self {
        UrlInput::Single(url.to_string())
    }
}

impl From<String> for UrlInput {
    fn from(url: String) -> Self {
        UrlInput::Single(url)
    }
}

impl From<Vec<String>> for UrlInput {
    fn from(urls: Vec<String>) -> Self {
        UrlInput::List(urls)
    }
}

impl From<&[String]> for UrlInput {
    fn from(urls: &[String]) -> Self {
        UrlInput::List(urls.to_vec())
    }
}

impl From<&CatalogEntry> for UrlInput {
    fn from(entry: &CatalogEntry) -> Self {
        match &entry.url {
            UrlSpec::One(url) => UrlInput::Single(url.clone()),
            UrlSpec::Many(urls) => UrlInput::List(urls.clone()),
        }
    }
}

impl CatalogEntry {
    /// Build fetch options from this entry, carrying dest, login and
    /// README metadata; everything else keeps its default
    pub fn fetch_options(&self, name: &str) -> FetchOptions {
        FetchOptions {
            dest: self.dest.clone(),
            login: self.login.clone().unwrap_or_default(),
            name: name.to_string(),
            meta: self.meta.clone(),
            ..Default::default()
        }
    }
}

/// Fetch data from a url with a wildcard or from an explicit url list
///
/// Returns a flattened list of local file paths. When inputs are
/// compressed and `decompress` is enabled, the extracted member files are
/// returned instead of the archives. Individual download failures do not
/// abort the batch; they are only reflected in the summary log.
///
/// # Example
///
/// ```no_run
/// use fetch_data::{fetch, FetchOptions};
///
/// #[tokio::main]
/// async fn main() -> fetch_data::Result<()> {
///     let options = FetchOptions {
///         dest: "~/data/ocean_colour".to_string(),
///         n_jobs: 4,
///         ..Default::default()
///     };
///     let files = fetch("https://host.example.org/chlor_a/*.nc", &options).await?;
///     println!("retrieved {} files", files.len());
///     Ok(())
/// }
/// ```
pub async fn fetch(url: impl Into<UrlInput>, options: &FetchOptions) -> Result<Vec<PathBuf>> {
    let url = url.into();
    options.validate()?;

    let dest = expanduser(&render_template(&options.dest, &options.placeholders)?);

    let log = if options.verbose.enables_info() {
        DownloadLog::attach(&dest.join(&options.log_name))?
    } else {
        DownloadLog::disabled()
    };

    let display_url = match &url {
        UrlInput::Single(single) => render_template(single, &options.placeholders)?,
        UrlInput::List(list) => match list.first() {
            Some(first) => render_template(first, &options.placeholders)?,
            None => String::new(),
        },
    };

    // README records intent even if the download later fails
    if options.create_readme {
        let context = ReadmeContext {
            name: options.name.clone(),
            urls: match &url {
                UrlInput::Single(single) => vec![single.clone()],
                UrlInput::List(list) => list.clone(),
            },
            meta: options.meta.clone(),
            log_path: log.path().map(PathBuf::from),
        };
        readme::write_readme(&dest, &options.readme_name, &context)?;
    }

    let urls: Vec<String> = match &url {
        // caching and expansion are skipped for explicit lists
        UrlInput::List(list) => list
            .iter()
            .map(|entry| render_template(entry, &options.placeholders))
            .collect::<Result<_>>()?,
        UrlInput::Single(single) => {
            let rendered = render_template(single, &options.placeholders)?;
            if rendered.contains('*') {
                let cache = CachePolicy::new(
                    options.use_cache,
                    dest.join(&options.cache_name).to_string_lossy(),
                );
                listing::list_urls(
                    &rendered,
                    &options.login,
                    &cache,
                    options.raise_on_empty,
                    &log,
                )
                .await?
            } else {
                vec![rendered]
            }
        }
    };

    log.info(&format!("{: >3} files at {display_url}", urls.len()));
    if urls.is_empty() {
        return Ok(Vec::new());
    }
    log.info(&format!("Files will be saved to {}", dest.display()));

    let download_options = DownloadOptions {
        n_jobs: options.n_jobs,
        login: options.login.clone(),
        decompress: options.decompress,
        progress: options.verbose.enables_info(),
        cancel: options.cancel.clone(),
    };
    let files = download::download_urls(&urls, &dest, &download_options, &log)
        .await
        .map_err(|error| match error {
            // executor configuration and cancellation keep their type; any
            // other executor-level failure surfaces as a download error
            Error::Config { .. } | Error::Cancelled | Error::UnsupportedProtocol { .. } => error,
            other => Error::Download(other.to_string()),
        })?;

    Ok(files)
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[tokio::test]
    async fn wildcard_in_list_entries_is_not_expanded() {
        // entries with '*' in an explicit list are treated as concrete;
        // the bogus scheme-less url fails task building, proving no
        // listing was attempted
        let dir = tempfile::tempdir().unwrap();
        let options = FetchOptions {
            dest: dir.path().to_string_lossy().to_string(),
            create_readme: false,
            ..Default::default()
        };

        let err = fetch(vec!["not-a-scheme/*.nc".to_string()], &options)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedProtocol { .. }));
    }

    #[tokio::test]
    async fn empty_list_returns_empty_result() {
        let dir = tempfile::tempdir().unwrap();
        let options = FetchOptions {
            dest: dir.path().to_string_lossy().to_string(),
            create_readme: false,
            ..Default::default()
        };
        let files = fetch(Vec::<String>::new(), &options).await.unwrap();
        assert!(files.is_empty());
    }

    #[tokio::test]
    async fn invalid_n_jobs_fails_before_any_network_activity() {
        let options = FetchOptions {
            n_jobs: 9,
            ..Default::default()
        };
        let err = fetch("http://host.invalid/data/*.nc", &options)
            .await
            .unwrap_err();
        match err {
            Error::Config { key, .. } => assert_eq!(key.as_deref(), Some("n_jobs")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn dest_placeholders_are_rendered() {
        let dir = tempfile::tempdir().unwrap();
        let mut placeholders = BTreeMap::new();
        placeholders.insert("year".to_string(), "2020".to_string());

        let options = FetchOptions {
            dest: format!("{}/{{year}}", dir.path().to_string_lossy()),
            placeholders,
            name: "demo".to_string(),
            ..Default::default()
        };
        let files = fetch(Vec::<String>::new(), &options).await.unwrap();
        assert!(files.is_empty());
        // readme is written into the rendered destination before downloads
        assert!(dir.path().join("2020").join("README.md").is_file());
    }

    #[tokio::test]
    async fn missing_placeholder_is_a_config_error() {
        let options = FetchOptions {
            dest: "/tmp/{undefined_key}".to_string(),
            ..Default::default()
        };
        let err = fetch("http://host/a.nc", &options).await.unwrap_err();
        match err {
            Error::Config { key, .. } => assert_eq!(key.as_deref(), Some("undefined_key")),
            other => panic!("unexpected error: {other}"),
        }
    }
}
