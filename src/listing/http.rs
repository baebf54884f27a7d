//! HTTP(S) remote listing
//!
//! Wildcard expansion over HTTP works on server-generated index pages: each
//! wildcarded path segment is resolved by fetching the parent directory
//! page, scraping its `href` attributes and matching the child names
//! against the segment's glob. Intermediate wildcard segments recurse one
//! directory level at a time.

use super::RemoteLister;
use crate::config::Credentials;
use crate::error::{Error, Result};
use async_trait::async_trait;
use globset::Glob;
use regex::Regex;
use std::sync::OnceLock;
use tracing::debug;
use url::Url;

fn href_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"(?i)href\s*=\s*["']([^"'<>]+)["']"#).expect("static regex"))
}

/// Listing handle for one HTTP(S) host
#[derive(Debug)]
pub(crate) struct HttpLister {
    client: reqwest::Client,
    host: String,
}

impl HttpLister {
    /// Build a lister; listing uses anonymous GETs only, so any supplied
    /// credentials are rejected up front
    pub(crate) fn new(url: &Url, login: &Credentials) -> Result<Self> {
        let host = url.host_str().unwrap_or_default().to_string();
        if !login.is_empty() {
            return Err(Error::CredentialsUnsupported {
                scheme: url.scheme().to_string(),
                host,
                reason: "http listing does not accept credentials".to_string(),
            });
        }
        Ok(Self {
            client: reqwest::Client::new(),
            host,
        })
    }

    /// Fetch one directory index page and return (child name, is_dir) pairs
    async fn list_children(&self, dir_url: &str) -> Result<Vec<(String, bool)>> {
        let response = self.client.get(dir_url).send().await.map_err(|e| {
            if e.is_connect() || e.is_timeout() {
                Error::HostUnreachable {
                    host: self.host.clone(),
                    reason: e.to_string(),
                }
            } else {
                Error::Network(e)
            }
        })?;

        if !response.status().is_success() {
            // a missing index page just contributes no matches
            debug!(url = dir_url, status = %response.status(), "listing page not available");
            return Ok(Vec::new());
        }
        let body = response.text().await?;

        let base = Url::parse(dir_url)?;
        let mut children = Vec::new();
        for caps in href_re().captures_iter(&body) {
            let href = &caps[1];
            let Ok(resolved) = base.join(href) else {
                continue;
            };
            if resolved.query().is_some() || resolved.fragment().is_some() {
                continue;
            }
            let resolved = resolved.to_string();
            // keep only direct children of the listed directory
            let Some(remainder) = resolved.strip_prefix(dir_url) else {
                continue;
            };
            let is_dir = remainder.ends_with('/');
            let name = remainder.trim_end_matches('/');
            if name.is_empty() || name.contains('/') {
                continue;
            }
            children.push((name.to_string(), is_dir));
        }
        Ok(children)
    }
}

#[async_trait]
impl RemoteLister for HttpLister {
    async fn glob(&self, pattern: &str) -> Result<Vec<String>> {
        let url = Url::parse(pattern)?;
        let mut base = format!("{}://{}", url.scheme(), self.host);
        if let Some(port) = url.port() {
            base.push_str(&format!(":{port}"));
        }

        let segments: Vec<&str> = url.path().split('/').filter(|s| !s.is_empty()).collect();
        let last = segments.len().saturating_sub(1);

        let mut frontier = vec![base];
        for (depth, segment) in segments.iter().enumerate() {
            if !segment.contains('*') {
                for prefix in frontier.iter_mut() {
                    prefix.push('/');
                    prefix.push_str(segment);
                }
                continue;
            }

            let matcher = Glob::new(segment)?.compile_matcher();
            let mut matched = Vec::new();
            for prefix in &frontier {
                let dir_url = format!("{prefix}/");
                for (name, is_dir) in self.list_children(&dir_url).await? {
                    // the final segment names files; directories only
                    // matter while walking intermediate levels
                    if depth == last && is_dir {
                        continue;
                    }
                    if matcher.is_match(&name) {
                        matched.push(format!("{prefix}/{name}"));
                    }
                }
            }
            frontier = matched;
            if frontier.is_empty() {
                break;
            }
        }
        Ok(frontier)
    }
}
