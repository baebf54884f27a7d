//! FTP remote listing
//!
//! FTP globbing walks the remote tree with `NLST`, one directory level per
//! wildcarded path segment. The protocol client is blocking, so the whole
//! walk runs on the blocking thread pool.

use super::RemoteLister;
use crate::config::Credentials;
use crate::error::{Error, Result};
use async_trait::async_trait;
use globset::Glob;
use suppaftp::FtpStream;
use url::Url;

/// Listing handle for one FTP host
#[derive(Debug)]
pub(crate) struct FtpLister {
    scheme: String,
    host: String,
    addr: String,
    login: Credentials,
}

impl FtpLister {
    pub(crate) fn new(url: &Url, login: &Credentials) -> Result<Self> {
        let host = url.host_str().unwrap_or_default().to_string();
        if !login.cookies.is_empty() {
            return Err(Error::CredentialsUnsupported {
                scheme: url.scheme().to_string(),
                host,
                reason: "cookies are not supported for ftp".to_string(),
            });
        }
        Ok(Self {
            scheme: url.scheme().to_string(),
            addr: format!("{host}:{}", url.port().unwrap_or(21)),
            host,
            login: login.clone(),
        })
    }

    fn connect(addr: &str, host: &str, login: &Credentials) -> Result<FtpStream> {
        let mut ftp = FtpStream::connect(addr).map_err(|e| Error::HostUnreachable {
            host: host.to_string(),
            reason: e.to_string(),
        })?;

        let (user, pass) = match (&login.username, &login.password) {
            (Some(user), Some(pass)) => (user.clone(), pass.clone()),
            (Some(user), None) => (user.clone(), String::new()),
            _ => ("anonymous".to_string(), "anonymous".to_string()),
        };
        ftp.login(&user, &pass)
            .map_err(|e| Error::CredentialsUnsupported {
                scheme: "ftp".to_string(),
                host: host.to_string(),
                reason: e.to_string(),
            })?;
        Ok(ftp)
    }

    /// Blocking segment walk; returns host-relative paths starting with `/`
    fn walk(ftp: &mut FtpStream, path: &str) -> Result<Vec<String>> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        let mut frontier = vec![String::new()];
        for segment in segments {
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
                let dir = if prefix.is_empty() { "/" } else { prefix.as_str() };
                let entries = match ftp.nlst(Some(dir)) {
                    Ok(entries) => entries,
                    // an unlistable directory just contributes no matches
                    Err(_) => continue,
                };
                for entry in entries {
                    // servers differ on whether NLST returns bare names or
                    // full paths; normalize to the last component
                    let name = entry.rsplit('/').next().unwrap_or(&entry);
                    if name.is_empty() || name == "." || name == ".." {
                        continue;
                    }
                    if matcher.is_match(name) {
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

#[async_trait]
impl RemoteLister for FtpLister {
    async fn glob(&self, pattern: &str) -> Result<Vec<String>> {
        let url = Url::parse(pattern)?;
        let path = url.path().to_string();
        let (scheme, host, addr, login) = (
            self.scheme.clone(),
            self.host.clone(),
            self.addr.clone(),
            self.login.clone(),
        );

        let paths = tokio::task::spawn_blocking(move || -> Result<Vec<String>> {
            let mut ftp = Self::connect(&addr, &host, &login)?;
            let paths = Self::walk(&mut ftp, &path)?;
            let _ = ftp.quit();
            Ok(paths)
        })
        .await
        .map_err(|e| Error::Download(e.to_string()))??;

        // re-prefix host-relative paths into full urls
        Ok(paths
            .into_iter()
            .map(|p| format!("{scheme}://{}{p}", self.host))
            .collect())
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cookies_are_rejected_for_ftp() {
        let url = Url::parse("ftp://ftp.example.org/data/*.nc").unwrap();
        let mut login = Credentials::default();
        login
            .cookies
            .insert("session".to_string(), "abc".to_string());

        let err = FtpLister::new(&url, &login).unwrap_err();
        assert!(matches!(err, Error::CredentialsUnsupported { .. }));
    }

    #[tokio::test]
    async fn unreachable_host_is_typed() {
        let url = Url::parse("ftp://127.0.0.1:1/data/*.nc").unwrap();
        let lister = FtpLister::new(&url, &Credentials::default()).unwrap();

        let err = lister.glob("ftp://127.0.0.1:1/data/*.nc").await.unwrap_err();
        match err {
            Error::HostUnreachable { host, .. } => assert_eq!(host, "127.0.0.1"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
