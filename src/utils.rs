//! Utility functions for template rendering and path manipulation

use crate::error::{Error, Result};
use regex::Regex;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::OnceLock;

/// Length of the hex digest substituted for `{hash}` in cache file names
const HASH_LEN: usize = 12;

fn placeholder_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // {hash} is reserved for cache file naming and left untouched here
    RE.get_or_init(|| Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("static regex"))
}

/// Render `{key}` placeholder tokens in a template against the given values
///
/// A token without a matching value fails with a configuration error, so a
/// typo in a catalog url or dest template surfaces before any retrieval.
/// The `{hash}` token is reserved for cache naming and passed through.
pub fn render_template(template: &str, values: &BTreeMap<String, String>) -> Result<String> {
    let mut out = String::with_capacity(template.len());
    let mut last = 0;
    for caps in placeholder_re().captures_iter(template) {
        let Some(whole) = caps.get(0) else { continue };
        let key = &caps[1];
        out.push_str(&template[last..whole.start()]);
        if key == "hash" {
            out.push_str(whole.as_str());
        } else {
            let value = values.get(key).ok_or_else(|| {
                Error::config_key(format!("no value supplied for placeholder '{{{key}}}'"), key)
            })?;
            out.push_str(value);
        }
        last = whole.end();
    }
    out.push_str(&template[last..]);
    Ok(out)
}

/// Short stable hex digest of a string, used to parameterize cache file names
pub fn make_hash_string(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    digest[..HASH_LEN].to_string()
}

/// Expand a leading `~` to the user's home directory
pub fn expanduser(path: &str) -> PathBuf {
    if path == "~" || path.starts_with("~/") {
        let home = std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_default();
        if !home.is_empty() {
            return PathBuf::from(path.replacen('~', &home, 1));
        }
    }
    PathBuf::from(path)
}

/// Last path segment of a url, used as the local file name
pub fn filename_from_url(url: &str) -> String {
    url.trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(url)
        .to_string()
}

/// Longest common substring of two strings
///
/// Classic dynamic-programming scan over byte positions; inputs are urls,
/// so ASCII is the practical case.
pub fn longest_common_substring(a: &str, b: &str) -> String {
    let (a_bytes, b_bytes) = (a.as_bytes(), b.as_bytes());
    let mut best_len = 0;
    let mut best_end = 0;
    let mut prev = vec![0usize; b_bytes.len() + 1];
    for (i, &ca) in a_bytes.iter().enumerate() {
        let mut current = vec![0usize; b_bytes.len() + 1];
        for (j, &cb) in b_bytes.iter().enumerate() {
            if ca == cb {
                current[j + 1] = prev[j] + 1;
                if current[j + 1] > best_len {
                    best_len = current[j + 1];
                    best_end = i + 1;
                }
            }
        }
        prev = current;
    }
    a[best_end - best_len..best_end].to_string()
}

/// Make a url shorter with max length set to `len_limit`
///
/// Middle path segments are collapsed into `/.../` so the host and file
/// name stay visible.
pub fn shorten_url(url: &str, len_limit: usize) -> String {
    if url.len() <= len_limit {
        return url.to_string();
    }
    let parts: Vec<&str> = url.split('/').collect();
    let Some((last, middle)) = parts.split_last() else {
        return url.to_string();
    };
    let Some((first, middle)) = middle.split_first() else {
        return url.to_string();
    };

    let mut short = (*first).to_string();
    for part in middle {
        if short.len() + last.len() + 5 > len_limit {
            short.push_str("/.../");
            short.push_str(last);
            return short;
        }
        short.push('/');
        short.push_str(part);
    }
    short.push('/');
    short.push_str(last);
    short
}

/// Abbreviate a list for debug logging when it is too long to show everything
pub fn abbreviate_list(items: &[String]) -> String {
    if items.len() > 4 {
        format!(
            "[{}, {},\n...\n{}, {}]",
            items[0],
            items[1],
            items[items.len() - 2],
            items[items.len() - 1]
        )
    } else {
        format!("{items:?}")
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn values(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn render_template_substitutes_known_keys() {
        let rendered = render_template(
            "http://host/data_{year}/*_{month}.nc",
            &values(&[("year", "2020"), ("month", "06")]),
        )
        .unwrap();
        assert_eq!(rendered, "http://host/data_2020/*_06.nc");
    }

    #[test]
    fn render_template_missing_key_is_config_error() {
        let err = render_template("/data/{year}", &BTreeMap::new()).unwrap_err();
        match err {
            crate::Error::Config { key, .. } => assert_eq!(key.as_deref(), Some("year")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn render_template_passes_hash_through() {
        let rendered = render_template("_urls_{hash}.cache", &BTreeMap::new()).unwrap();
        assert_eq!(rendered, "_urls_{hash}.cache");
    }

    #[test]
    fn hash_string_is_stable_and_short() {
        let a = make_hash_string("ftp://host/data/*.nc");
        let b = make_hash_string("ftp://host/data/*.nc");
        assert_eq!(a, b);
        assert_eq!(a.len(), HASH_LEN);
        assert_ne!(a, make_hash_string("ftp://host/other/*.nc"));
    }

    #[test]
    fn filename_is_last_segment() {
        assert_eq!(
            filename_from_url("http://host/data/file_2020.nc"),
            "file_2020.nc"
        );
        assert_eq!(filename_from_url("file.nc"), "file.nc");
    }

    #[test]
    fn lcs_finds_shared_run() {
        assert_eq!(
            longest_common_substring("http://host/data/a.nc", "http://host/data/b.nc"),
            "http://host/data/"
        );
        assert_eq!(longest_common_substring("abc", "xyz"), "");
    }

    #[test]
    fn shorten_url_collapses_middle_segments() {
        let url = "http://host.example.org/very/long/nested/path/to/file_20200101.nc";
        let short = shorten_url(url, 40);
        assert!(short.len() <= url.len());
        assert!(short.contains("/.../"));
        assert!(short.ends_with("file_20200101.nc"));

        assert_eq!(shorten_url("http://host/a.nc", 75), "http://host/a.nc");
    }

    #[test]
    fn abbreviate_long_lists() {
        let items: Vec<String> = (0..6).map(|i| format!("u{i}")).collect();
        let abbreviated = abbreviate_list(&items);
        assert!(abbreviated.contains("u0"));
        assert!(abbreviated.contains("..."));
        assert!(abbreviated.contains("u5"));
        assert!(!abbreviated.contains("u2"));
    }
}
