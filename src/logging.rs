//! Per-call download log files
//!
//! Each fetch call owns an explicit [`DownloadLog`] handle instead of
//! mutating process-wide logger state, so concurrent callers embedding the
//! library do not interfere with each other. Messages are mirrored to
//! `tracing` and, when the call's verbosity enables informational logging,
//! appended to a plain-text log file in the destination directory.

use crate::error::Result;
use chrono::Local;
use std::fmt::Write as _;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Tag written between the timestamp and the message on every line
const LOG_TAG: &str = "DOWNLOAD";

/// File log handle for one fetch call
///
/// Line format: `<timestamp> [DOWNLOAD]  <message>`. The file is opened in
/// append mode; a session header separates runs. A disabled handle still
/// mirrors messages to `tracing` but writes nothing to disk.
#[derive(Debug)]
pub struct DownloadLog {
    sink: Option<Mutex<File>>,
    path: Option<PathBuf>,
}

impl DownloadLog {
    /// Attach a file sink at the given path, creating parent directories
    ///
    /// Writes the session header so consecutive runs are visually separated
    /// in the shared append-mode file.
    pub fn attach(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;

        let mut header = String::new();
        let _ = writeln!(header, "{}\n", "=".repeat(80));
        header.push_str(&format_line("Start of logging session"));
        header.push_str(&format_line(&"-".repeat(80)));
        file.write_all(header.as_bytes())?;

        Ok(Self {
            sink: Some(Mutex::new(file)),
            path: Some(path.to_path_buf()),
        })
    }

    /// A handle that only mirrors to `tracing`, with no file sink
    pub fn disabled() -> Self {
        Self {
            sink: None,
            path: None,
        }
    }

    /// Path of the file sink, if one is attached
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Log an informational message
    pub fn info(&self, message: &str) {
        tracing::info!("{message}");
        self.append(message);
    }

    /// Log a debug-level message (file sink only gets it when attached)
    pub fn debug(&self, message: &str) {
        tracing::debug!("{message}");
        self.append(message);
    }

    fn append(&self, message: &str) {
        if let Some(sink) = &self.sink
            && let Ok(mut file) = sink.lock()
        {
            // log-sink failures must never abort a download batch
            let _ = file.write_all(format_line(message).as_bytes());
        }
    }
}

fn format_line(message: &str) -> String {
    format!(
        "{} [{LOG_TAG}]  {message}\n",
        Local::now().format("%Y-%m-%d %H:%M:%S")
    )
}
