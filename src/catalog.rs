//! Catalog files
//!
//! A catalog is a YAML file with one top-level entry per dataset:
//!
//! ```yaml
//! ocean_colour:
//!   url: ftp://ftp.example.org/chlor_a/*/*.nc
//!   dest: ~/data/ocean_colour
//!   meta:
//!     doi: https://doi.org/10.5067/ORBVIEW-2/SEAWIFS
//!     description: Monthly chlorophyll-a concentration
//!     citation: How to cite this dataset
//!   login:
//!     username: ${FTP_USER}
//!     password: ${FTP_PASSWORD}
//! ```
//!
//! `${VAR}` tokens are substituted from the process environment (an optional
//! `.env` file is loaded first); an undefined variable is a configuration
//! error. Top-level keys containing a `.` and top-level values that are not
//! mappings are treated as non-entry directives (e.g. YAML anchors) and
//! excluded.

use crate::config::Credentials;
use crate::error::{Error, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::OnceLock;

/// A named collection of dataset download descriptors
pub type Catalog = BTreeMap<String, CatalogEntry>;

/// One dataset entry of a catalog
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Remote path(s); may contain `*` wildcards and `{placeholder}` tokens
    pub url: UrlSpec,

    /// Destination directory; supports placeholders and `~` expansion
    #[serde(default = "default_entry_dest")]
    pub dest: String,

    /// Metadata written to the generated README (doi, description,
    /// citation, plus arbitrary extra keys)
    #[serde(default)]
    pub meta: BTreeMap<String, String>,

    /// Login details for protected servers
    #[serde(default)]
    pub login: Option<Credentials>,
}

/// A single wildcarded url or an explicit list of concrete urls
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UrlSpec {
    /// One url, possibly wildcarded
    One(String),
    /// An explicit list, used as-is (no expansion, no caching)
    Many(Vec<String>),
}

impl Default for UrlSpec {
    fn default() -> Self {
        UrlSpec::One(String::new())
    }
}

impl UrlSpec {
    /// First url of the entry, used as the representative for README output
    pub fn first(&self) -> Option<&str> {
        match self {
            UrlSpec::One(url) => Some(url.as_str()),
            UrlSpec::Many(urls) => urls.first().map(String::as_str),
        }
    }
}

impl CatalogEntry {
    fn trimmed(mut self) -> Self {
        match &mut self.url {
            UrlSpec::One(url) => *url = url.trim().to_string(),
            UrlSpec::Many(urls) => {
                for url in urls.iter_mut() {
                    *url = url.trim().to_string();
                }
            }
        }
        self.dest = self.dest.trim().to_string();
        self.meta = self
            .meta
            .into_iter()
            .map(|(k, v)| (k, v.trim().to_string()))
            .collect();
        self
    }
}

fn default_entry_dest() -> String {
    "./".to_string()
}

fn env_token_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("static regex"))
}

/// Read a YAML catalog of download entries
///
/// Loads an optional `.env` file, substitutes `${VAR}` tokens strictly,
/// parses the YAML and keeps only top-level mappings whose key contains no
/// `.` character. The input file is never modified.
pub fn read_catalog(path: impl AsRef<Path>) -> Result<Catalog> {
    let path = path.as_ref();

    // optional local env file; absence is not an error
    let _ = dotenvy::dotenv();

    let raw = std::fs::read_to_string(path)?;
    let substituted = substitute_env(&raw, true)?;

    let document: serde_yaml::Value = serde_yaml::from_str(&substituted)?;
    let serde_yaml::Value::Mapping(mapping) = document else {
        return Err(Error::InvalidCatalog(format!(
            "{} is not a top-level mapping",
            path.display()
        )));
    };

    let mut catalog = Catalog::new();
    for (key, value) in mapping {
        let Some(name) = key.as_str() else { continue };
        if name.contains('.') || !value.is_mapping() {
            continue;
        }
        let entry: CatalogEntry = serde_yaml::from_value(value)?;
        catalog.insert(name.to_string(), entry.trimmed());
    }

    tracing::debug!(
        path = %path.display(),
        entries = catalog.len(),
        "read catalog"
    );
    Ok(catalog)
}

/// Substitute `${VAR}` tokens against the process environment
///
/// In strict mode an undefined variable fails with a configuration error
/// naming the variable; otherwise the token is left in place.
pub(crate) fn substitute_env(text: &str, strict: bool) -> Result<String> {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for caps in env_token_re().captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        let name = &caps[1];
        out.push_str(&text[last..whole.start()]);
        match std::env::var(name) {
            Ok(value) => out.push_str(&value),
            Err(_) if strict => {
                return Err(Error::config_key(
                    format!("environment variable '{name}' referenced in catalog is not set"),
                    name,
                ));
            }
            Err(_) => out.push_str(whole.as_str()),
        }
        last = whole.end();
    }
    out.push_str(&text[last..]);
    Ok(out)
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    const CATALOG: &str = r#"
ocean_colour:
  url: ftp://ftp.example.org/chlor_a/*.nc
  dest: /tmp/ocean_colour
  meta:
    doi: "https://doi.org/10.5067/example "
    description: Monthly chlorophyll-a concentration

sst:
  url:
    - http://host/sst/sst_2020.nc
    - http://host/sst/sst_2021.nc
  dest: /tmp/sst

not.an.entry: &anchor
  url: http://ignored/

plain_scalar: just a string
"#;

    fn write_catalog(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn keeps_only_dot_free_mapping_entries() {
        let file = write_catalog(CATALOG);
        let catalog = read_catalog(file.path()).unwrap();

        assert_eq!(catalog.len(), 2);
        assert!(catalog.contains_key("ocean_colour"));
        assert!(catalog.contains_key("sst"));
        assert!(!catalog.contains_key("not.an.entry"));
        assert!(!catalog.contains_key("plain_scalar"));
    }

    #[test]
    fn entry_fields_are_parsed_and_trimmed() {
        let file = write_catalog(CATALOG);
        let catalog = read_catalog(file.path()).unwrap();

        let entry = &catalog["ocean_colour"];
        assert_eq!(
            entry.url,
            UrlSpec::One("ftp://ftp.example.org/chlor_a/*.nc".to_string())
        );
        assert_eq!(entry.meta["doi"], "https://doi.org/10.5067/example");

        let sst = &catalog["sst"];
        match &sst.url {
            UrlSpec::Many(urls) => assert_eq!(urls.len(), 2),
            other => panic!("expected url list, got {other:?}"),
        }
    }

    #[test]
    #[serial]
    fn env_substitution_resolves_from_process_env() {
        // set_var is unsafe since edition 2024; serialized via #[serial]
        unsafe { std::env::set_var("FETCH_DATA_TEST_USER", "alice") };
        let file = write_catalog(
            "entry:\n  url: ftp://host/data/*.nc\n  login:\n    username: ${FETCH_DATA_TEST_USER}\n",
        );
        let catalog = read_catalog(file.path()).unwrap();
        let login = catalog["entry"].login.clone().unwrap();
        assert_eq!(login.username.as_deref(), Some("alice"));
        unsafe { std::env::remove_var("FETCH_DATA_TEST_USER") };
    }

    #[test]
    #[serial]
    fn missing_env_var_fails_in_strict_mode() {
        unsafe { std::env::remove_var("FETCH_DATA_TEST_MISSING") };
        let file = write_catalog("entry:\n  url: ${FETCH_DATA_TEST_MISSING}/data.nc\n");
        let err = read_catalog(file.path()).unwrap_err();
        match err {
            Error::Config { key, .. } => {
                assert_eq!(key.as_deref(), Some("FETCH_DATA_TEST_MISSING"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn lenient_substitution_keeps_unknown_tokens() {
        let substituted = substitute_env("${FETCH_DATA_TEST_ABSENT}/x", false).unwrap();
        assert_eq!(substituted, "${FETCH_DATA_TEST_ABSENT}/x");
    }
}
