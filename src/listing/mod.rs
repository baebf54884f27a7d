//! URL listing with wildcard expansion and on-disk caching
//!
//! [`list_urls`] turns a wildcarded remote path into a concrete, sorted
//! list of urls. Expansion is protocol-specific behind the [`RemoteLister`]
//! seam; successful non-empty listings are snapshotted to a cache file so
//! repeat fetches skip the remote walk entirely.

mod cache;
mod ftp;
mod http;

pub use cache::CachePolicy;

use crate::config::Credentials;
use crate::error::{Error, Result};
use crate::logging::DownloadLog;
use crate::utils::abbreviate_list;
use async_trait::async_trait;
use tracing::debug;
use url::Url;

/// Protocol-specific remote listing seam
///
/// Implementations expand a wildcarded url into full concrete urls. The
/// http lister scrapes index pages; the ftp lister walks `NLST` output and
/// re-prefixes the host itself.
#[async_trait]
pub(crate) trait RemoteLister: Send + Sync {
    /// Expand a wildcard pattern into concrete full urls
    async fn glob(&self, pattern: &str) -> Result<Vec<String>>;
}

fn lister_for(url: &Url, login: &Credentials) -> Result<Box<dyn RemoteLister>> {
    match url.scheme() {
        "http" | "https" => Ok(Box::new(http::HttpLister::new(url, login)?)),
        "ftp" => Ok(Box::new(ftp::FtpLister::new(url, login)?)),
        scheme => Err(Error::UnsupportedProtocol {
            scheme: scheme.to_string(),
            url: url.to_string(),
        }),
    }
}

/// Expand a wildcarded url into a sorted list of concrete urls
///
/// - A pattern without `*` is returned as-is in a singleton list, with no
///   network or cache interaction.
/// - With caching enabled and a cache file present, the file contents are
///   returned without touching the network.
/// - Otherwise the remote server is listed; a successful non-empty result
///   overwrites the cache file (parents created as needed).
///
/// The result is always sorted lexicographically, regardless of the order
/// the server reported.
pub async fn list_urls(
    pattern: &str,
    login: &Credentials,
    cache: &CachePolicy,
    raise_on_empty: bool,
    log: &DownloadLog,
) -> Result<Vec<String>> {
    if !pattern.contains('*') {
        return Ok(vec![pattern.to_string()]);
    }

    let cache_path = cache.resolve(pattern);
    if cache.enabled
        && let Some(urls) = cache::read_cache(&cache_path)?
    {
        log.info(&format!(
            "Fetched {} files from listing cache: {}",
            urls.len(),
            cache_path.display()
        ));
        debug!("{}", abbreviate_list(&urls));
        return Ok(urls);
    }

    log.info(&format!("Fetching filenames from {pattern}"));

    let url = Url::parse(pattern).map_err(|e| Error::HostUnreachable {
        host: pattern.to_string(),
        reason: e.to_string(),
    })?;
    if url.host_str().is_none() {
        return Err(Error::HostUnreachable {
            host: pattern.to_string(),
            reason: "url has no host".to_string(),
        });
    }

    let lister = lister_for(&url, login)?;
    let mut urls = lister.glob(pattern).await?;

    if urls.is_empty() {
        if raise_on_empty {
            return Err(Error::NoFilesFound {
                pattern: pattern.to_string(),
            });
        }
        return Ok(urls);
    }

    urls.sort();
    if cache.enabled {
        cache::write_cache(&cache_path, &urls)?;
        log.info(&format!(
            "Cached {} urls to: {}",
            urls.len(),
            cache_path.display()
        ));
    }
    debug!("{}", abbreviate_list(&urls));

    Ok(urls)
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn quiet() -> DownloadLog {
        DownloadLog::disabled()
    }

    #[tokio::test]
    async fn non_wildcard_passes_through_without_io() {
        let urls = list_urls(
            "http://host/data/file.nc",
            &Credentials::default(),
            &CachePolicy::new(true, "/nonexistent/dir/{hash}.cache"),
            true,
            &quiet(),
        )
        .await
        .unwrap();
        assert_eq!(urls, vec!["http://host/data/file.nc"]);
    }

    #[tokio::test]
    async fn cache_hit_short_circuits_the_network() {
        // no server exists for this host; a network attempt would fail
        let dir = tempfile::tempdir().unwrap();
        let policy = CachePolicy::new(
            true,
            dir.path().join("_urls_{hash}.cache").to_string_lossy(),
        );
        let pattern = "http://host.invalid/data/*.nc";

        let cached = vec![
            "http://host.invalid/data/b.nc".to_string(),
            "http://host.invalid/data/a.nc".to_string(),
        ];
        std::fs::write(policy.resolve(pattern), cached.join("\n")).unwrap();

        let urls = list_urls(pattern, &Credentials::default(), &policy, true, &quiet())
            .await
            .unwrap();
        assert_eq!(
            urls,
            vec!["http://host.invalid/data/a.nc", "http://host.invalid/data/b.nc"]
        );
    }

    #[tokio::test]
    async fn unsupported_scheme_is_rejected() {
        let err = list_urls(
            "sftp://host/data/*.nc",
            &Credentials::default(),
            &CachePolicy::disabled(),
            true,
            &quiet(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::UnsupportedProtocol { .. }));
    }

    #[tokio::test]
    async fn listing_writes_cache_and_rereads_identically() {
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data/"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"<a href="b.nc">b.nc</a><a href="a.nc">a.nc</a>"#,
            ))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let policy = CachePolicy::new(
            true,
            dir.path().join("_urls_{hash}.cache").to_string_lossy(),
        );
        let pattern = format!("{}/data/*.nc", server.uri());

        let first = list_urls(&pattern, &Credentials::default(), &policy, true, &quiet())
            .await
            .unwrap();
        assert_eq!(
            first,
            vec![
                format!("{}/data/a.nc", server.uri()),
                format!("{}/data/b.nc", server.uri()),
            ]
        );

        // second call must come from the cache; .expect(1) above verifies
        // the index page was fetched exactly once
        let second = list_urls(&pattern, &Credentials::default(), &policy, true, &quiet())
            .await
            .unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn empty_expansion_respects_raise_on_empty() {
        use wiremock::MockServer;

        let server = MockServer::start().await;
        let pattern = format!("{}/data/*.nc", server.uri());

        let err = list_urls(
            &pattern,
            &Credentials::default(),
            &CachePolicy::disabled(),
            true,
            &quiet(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::NoFilesFound { .. }));

        let urls = list_urls(
            &pattern,
            &Credentials::default(),
            &CachePolicy::disabled(),
            false,
            &quiet(),
        )
        .await
        .unwrap();
        assert!(urls.is_empty());
    }
}
