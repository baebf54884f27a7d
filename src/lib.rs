//! # fetch-data
//!
//! Bulk dataset retrieval library for wildcarded remote file sets.
//!
//! ## Design Philosophy
//!
//! fetch-data is designed to be:
//! - **Best-effort** - individual file failures never abort a batch
//! - **Repeatable** - wildcard expansions are cached so re-fetches of large
//!   archives skip the remote listing
//! - **Library-first** - no CLI or UI, purely a Rust crate for embedding
//! - **Self-documenting** - every destination directory gets a generated
//!   README recording where its data came from
//!
//! ## Quick Start
//!
//! ```no_run
//! use fetch_data::{fetch, FetchOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let options = FetchOptions {
//!         dest: "~/data/ocean_colour".to_string(),
//!         n_jobs: 4,
//!         ..Default::default()
//!     };
//!
//!     // expands the wildcard against the server, caches the listing,
//!     // downloads in parallel and decompresses archives
//!     let files = fetch("https://host.example.org/chlor_a/*.nc", &options).await?;
//!
//!     for file in files {
//!         println!("{}", file.display());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! Datasets that are fetched repeatedly are better described once in a YAML
//! catalog (see [`read_catalog`]) with per-entry urls, destinations,
//! credentials and README metadata.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Catalog files of named dataset entries
pub mod catalog;
/// Configuration types
pub mod config;
/// Download executor
pub mod download;
/// Error types
pub mod error;
/// High-level fetch orchestration
pub mod fetcher;
/// URL listing with wildcard expansion and caching
pub mod listing;
/// Per-call download log files
pub mod logging;
/// Post-retrieval decompression
pub mod processors;
/// Generated README metadata files
pub mod readme;
/// Utility functions
pub mod utils;

// Re-export commonly used types
pub use catalog::{Catalog, CatalogEntry, UrlSpec, read_catalog};
pub use config::{Credentials, FetchOptions, MAX_JOBS, Verbosity};
pub use download::{DownloadOptions, download_urls};
pub use error::{Error, Result};
pub use fetcher::{UrlInput, fetch};
pub use listing::{CachePolicy, list_urls};
pub use logging::DownloadLog;
pub use processors::{Processor, choose_processor};
pub use readme::{ReadmeContext, write_readme};
