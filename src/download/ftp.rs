//! FTP downloader
//!
//! The control connection is blocking, so each retrieval runs on the
//! blocking thread pool. As with HTTP, the body lands in a `.part` file
//! that is renamed only on completion.

use crate::config::Credentials;
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use suppaftp::FtpStream;
use url::Url;

/// Retrieve `url` to `target`, returning the final path
pub(crate) async fn fetch(url: &str, target: &Path, login: &Credentials) -> Result<PathBuf> {
    let parsed = Url::parse(url)?;
    let host = parsed.host_str().unwrap_or_default().to_string();
    let addr = format!("{host}:{}", parsed.port().unwrap_or(21));
    let remote_path = parsed.path().to_string();
    let login = login.clone();
    let target = target.to_path_buf();

    tokio::task::spawn_blocking(move || -> Result<PathBuf> {
        let mut ftp = FtpStream::connect(&addr).map_err(|e| Error::HostUnreachable {
            host: host.clone(),
            reason: e.to_string(),
        })?;
        let (user, pass) = match (&login.username, &login.password) {
            (Some(user), Some(pass)) => (user.clone(), pass.clone()),
            (Some(user), None) => (user.clone(), String::new()),
            _ => ("anonymous".to_string(), "anonymous".to_string()),
        };
        ftp.login(&user, &pass)?;
        ftp.transfer_type(suppaftp::types::FileType::Binary)?;

        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let part = part_path(&target);
        let mut file = std::fs::File::create(&part)?;
        ftp.retr(&remote_path, |reader| {
            std::io::copy(reader, &mut file).map_err(suppaftp::FtpError::ConnectionError)
        })?;
        let _ = ftp.quit();

        std::fs::rename(&part, &target)?;
        Ok(target)
    })
    .await
    .map_err(|e| Error::Download(e.to_string()))?
}

fn part_path(target: &Path) -> PathBuf {
    let mut name = target.as_os_str().to_os_string();
    name.push(".part");
    PathBuf::from(name)
}
