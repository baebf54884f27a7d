//! Post-retrieval decompression
//!
//! Processors extract a retrieved archive into its member files next to the
//! archive. Selection is table-driven on file extension; the table is
//! evaluated in order and a later match overrides an earlier one, so
//! `data.tar.gz` resolves to untar rather than plain gunzip.

use crate::error::{Error, Result};
use flate2::read::GzDecoder;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Post-retrieval decompression step
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Processor {
    /// Single-file gzip decompression (`.gz`, `.gz2`)
    Decompress,
    /// Tar archive extraction, gzipped or plain (`.tar`, `.tgz`, `.tar.gz`)
    Untar,
    /// Zip archive extraction (`.zip`)
    Unzip,
}

/// Ordered extension table; evaluated top to bottom, last match wins
const PROCESSOR_TABLE: &[(&[&str], Processor)] = &[
    (&[".gz2", ".gz"], Processor::Decompress),
    (&[".tar", ".tgz", ".tar.gz"], Processor::Untar),
    (&[".zip"], Processor::Unzip),
];

/// Choose the processor to uncompress a url, if any
///
/// Extension matching is case-insensitive and substring-based, matching the
/// listing cache entries which carry full urls.
pub fn choose_processor(url: &str) -> Option<Processor> {
    let lower = url.to_lowercase();
    let mut chosen = None;
    for (extensions, processor) in PROCESSOR_TABLE {
        for extension in *extensions {
            if lower.contains(extension) {
                chosen = Some(*processor);
            }
        }
    }
    chosen
}

impl Processor {
    /// Extract `archive` into its member files, returning their paths
    ///
    /// Archives unpack into a sibling directory named after the archive
    /// (`data.tar.gz` -> `data.tar.gz.untar/`); gzip output drops the
    /// compression suffix. The archive itself is left in place.
    pub fn apply(self, archive: &Path) -> Result<Vec<PathBuf>> {
        debug!(archive = %archive.display(), processor = ?self, "decompressing");
        match self {
            Processor::Decompress => gunzip(archive),
            Processor::Untar => untar(archive),
            Processor::Unzip => unzip(archive),
        }
    }

    fn output_dir(self, archive: &Path) -> PathBuf {
        let suffix = match self {
            Processor::Untar => "untar",
            Processor::Unzip => "unzip",
            Processor::Decompress => "decomp",
        };
        let mut name = archive.as_os_str().to_os_string();
        name.push(format!(".{suffix}"));
        PathBuf::from(name)
    }
}

fn extraction_error(archive: &Path, reason: impl ToString) -> Error {
    Error::Extraction {
        archive: archive.to_path_buf(),
        reason: reason.to_string(),
    }
}

fn gunzip(archive: &Path) -> Result<Vec<PathBuf>> {
    let output = strip_gzip_suffix(archive);
    let file = File::open(archive)?;
    let mut decoder = GzDecoder::new(file);
    let mut out = File::create(&output)?;
    std::io::copy(&mut decoder, &mut out).map_err(|e| extraction_error(archive, e))?;
    Ok(vec![output])
}

fn strip_gzip_suffix(archive: &Path) -> PathBuf {
    let name = archive.to_string_lossy();
    for suffix in [".gz2", ".gz"] {
        if let Some(stripped) = name.strip_suffix(suffix) {
            return PathBuf::from(stripped);
        }
    }
    Processor::Decompress.output_dir(archive)
}

fn untar(archive: &Path) -> Result<Vec<PathBuf>> {
    let out_dir = Processor::Untar.output_dir(archive);
    std::fs::create_dir_all(&out_dir)?;

    let name = archive.to_string_lossy().to_lowercase();
    let file = File::open(archive)?;
    if name.ends_with(".tgz") || name.ends_with(".tar.gz") {
        unpack_tar(tar::Archive::new(GzDecoder::new(file)), archive, &out_dir)
    } else {
        unpack_tar(tar::Archive::new(file), archive, &out_dir)
    }
}

fn unpack_tar<R: std::io::Read>(
    mut tar: tar::Archive<R>,
    archive: &Path,
    out_dir: &Path,
) -> Result<Vec<PathBuf>> {
    let mut members = Vec::new();
    let entries = tar.entries().map_err(|e| extraction_error(archive, e))?;
    for entry in entries {
        let mut entry = entry.map_err(|e| extraction_error(archive, e))?;
        let relative = entry
            .path()
            .map_err(|e| extraction_error(archive, e))?
            .to_path_buf();
        // unpack_in refuses paths escaping out_dir
        entry
            .unpack_in(out_dir)
            .map_err(|e| extraction_error(archive, e))?;
        if entry.header().entry_type().is_file() {
            members.push(out_dir.join(relative));
        }
    }
    Ok(members)
}

fn unzip(archive: &Path) -> Result<Vec<PathBuf>> {
    let out_dir = Processor::Unzip.output_dir(archive);
    std::fs::create_dir_all(&out_dir)?;

    let file = File::open(archive)?;
    let mut zip = zip::ZipArchive::new(file).map_err(|e| extraction_error(archive, e))?;
    let names: Vec<String> = zip
        .file_names()
        .filter(|name| !name.ends_with('/'))
        .map(String::from)
        .collect();
    zip.extract(&out_dir).map_err(|e| extraction_error(archive, e))?;

    Ok(names.into_iter().map(|name| out_dir.join(name)).collect())
}
