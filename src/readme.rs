//! Generated README metadata files
//!
//! A README is written to the destination directory before any download
//! starts, so the directory documents intent even when retrieval later
//! fails. Short metadata entries render as aligned `key: value` lines;
//! long entries become titled, word-wrapped sections.

use crate::error::Result;
use crate::utils::{longest_common_substring, shorten_url};
use chrono::Local;
use regex::Regex;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Wrap width for long metadata sections
const WRAP_WIDTH: usize = 80;

/// Minimum length limit separating short from long entries
const SHORT_INFO_LEN_LIMIT: usize = 120;

/// Inputs for one README file
#[derive(Clone, Debug, Default)]
pub struct ReadmeContext {
    /// Dataset name, rendered as the underlined title
    pub name: String,
    /// The url(s) being fetched; lists collapse to a common-substring form
    pub urls: Vec<String>,
    /// Metadata entries (doi, description, citation, arbitrary extras)
    pub meta: BTreeMap<String, String>,
    /// Path of the download log, when one is attached
    pub log_path: Option<PathBuf>,
}

/// Write the README file, overwriting any previous one
pub fn write_readme(dest: &Path, readme_name: &str, context: &ReadmeContext) -> Result<PathBuf> {
    std::fs::create_dir_all(dest)?;
    let path = dest.join(readme_name);
    std::fs::write(&path, make_readme_text(context))?;
    Ok(path)
}

/// Render the README body
pub(crate) fn make_readme_text(context: &ReadmeContext) -> String {
    let url = representative_url(&context.urls);
    let len_limit = SHORT_INFO_LEN_LIMIT.max(url.len());

    let contact = context
        .meta
        .get("contact")
        .cloned()
        .or_else(git_contact)
        .unwrap_or_else(|| format!("{} (USER)", whoami::username()));

    let mut short: Vec<(&str, &str)> = vec![];
    let mut long: Vec<(&str, &str)> = vec![];
    for (key, value) in &context.meta {
        if key == "contact" {
            continue;
        }
        if key.len() + value.len() <= len_limit {
            short.push((key.as_str(), value.as_str()));
        } else {
            long.push((key.as_str(), value.as_str()));
        }
    }

    let mut text = String::new();
    let rule = "=".repeat(context.name.len().max(1));
    text.push_str(&format!("{rule}\n{}\n{rule}\n\n", context.name));

    let date = Local::now().format("%Y-%m-%d").to_string();
    let log = context
        .log_path
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "None".to_string());

    let mut fields: Vec<(String, String)> = vec![
        ("Contact".to_string(), contact),
        ("Date".to_string(), date),
        ("URL".to_string(), shorten_url(&url, len_limit)),
        ("Logging".to_string(), log),
    ];
    fields.extend(
        short
            .iter()
            .map(|(k, v)| (title_case(k), (*v).to_string())),
    );

    let width = fields.iter().map(|(k, _)| k.len()).max().unwrap_or(0) + 1;
    for (key, value) in &fields {
        text.push_str(&format!("{:<width$} {value}\n", format!("{key}:")));
    }

    for (key, value) in &long {
        let title = title_case(key);
        let rule = "-".repeat(title.len());
        text.push_str(&format!("\n{rule}\n{title}\n{rule}\n"));
        for line in wrap_text(value, WRAP_WIDTH) {
            text.push_str(&line);
            text.push('\n');
        }
    }

    text.push_str(
        "\n------------------\nDataset processing\n------------------\n\
         Data has been downloaded directly from the server shown in URL.\n\
         There has been no modification to the original files.\n\
         There may be a data cache located in the destination folder.\n\n\n\
         readme file was automatically created using fetch-data\n\
         https://github.com/fetch-data/fetch-data-rs\n",
    );
    text
}

/// Collapse a url list into a representative short form
///
/// The pairwise longest common substring is reduced left-to-right across
/// the list and marked with an ellipsis, so the README does not enumerate
/// every member url.
fn representative_url(urls: &[String]) -> String {
    match urls {
        [] => String::new(),
        [only] => only.clone(),
        [first, rest @ ..] => {
            let common = rest.iter().fold(first.clone(), |acc, url| {
                longest_common_substring(&acc, url)
            });
            format!("{common}...")
        }
    }
}

fn title_case(key: &str) -> String {
    let mut chars = key.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

fn whitespace_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("static regex"))
}

/// Greedy word wrap; embedded newlines are treated as plain whitespace
fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let flattened = whitespace_re().replace_all(text, " ");
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in flattened.split(' ') {
        if word.is_empty() {
            continue;
        }
        if current.is_empty() {
            current = word.to_string();
        } else if current.len() + 1 + word.len() <= width {
            current.push(' ');
            current.push_str(word);
        } else {
            lines.push(current);
            current = word.to_string();
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

fn git_contact() -> Option<String> {
    let output = std::process::Command::new("git")
        .args(["config", "--list"])
        .output()
        .ok()?;
    let config = String::from_utf8_lossy(&output.stdout);
    let mut name = None;
    let mut email = None;
    for line in config.lines() {
        if let Some(value) = line.strip_prefix("user.email=") {
            email = Some(value.trim().to_string());
        } else if let Some(value) = line.strip_prefix("user.name=") {
            name = Some(value.trim().to_string());
        }
    }
    email.or(name)
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn meta(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn short_and_long_entries_are_partitioned() {
        let long_description = "x".repeat(200);
        let context = ReadmeContext {
            name: "ocean_colour".to_string(),
            urls: vec!["http://host/data/*.nc".to_string()],
            meta: meta(&[
                ("doi", "https://doi.org/10.5067/example"),
                ("citation", "Author et al. (2020)"),
                ("units", "mg m-3"),
                ("description", &long_description),
            ]),
            log_path: None,
        };

        let text = make_readme_text(&context);

        // all four keys present
        assert!(text.contains("Doi:"));
        assert!(text.contains("Citation:"));
        assert!(text.contains("Units:"));
        assert!(text.contains("\nDescription\n"));

        // the long field became a titled section with wrapped body
        let description_section = text.split("Description").nth(1).unwrap();
        let body_line = description_section
            .lines()
            .find(|l| l.starts_with('x'))
            .unwrap();
        assert!(body_line.len() <= WRAP_WIDTH || !body_line.contains(' '));
    }

    #[test]
    fn title_is_underlined_to_name_length() {
        let context = ReadmeContext {
            name: "sst".to_string(),
            urls: vec!["http://host/sst.nc".to_string()],
            ..Default::default()
        };
        let text = make_readme_text(&context);
        assert!(text.starts_with("===\nsst\n===\n"));
    }

    #[test]
    fn url_lists_collapse_to_common_substring() {
        let urls = vec![
            "http://host/data/a_2020.nc".to_string(),
            "http://host/data/b_2021.nc".to_string(),
        ];
        let representative = representative_url(&urls);
        assert_eq!(representative, "http://host/data/...");
    }

    #[test]
    fn explicit_contact_wins() {
        let context = ReadmeContext {
            name: "x".to_string(),
            urls: vec!["http://host/a.nc".to_string()],
            meta: meta(&[("contact", "someone@example.org")]),
            log_path: None,
        };
        let text = make_readme_text(&context);
        assert!(text.contains("Contact:"));
        assert!(text.contains("someone@example.org"));
        // contact is not repeated as a metadata line
        assert_eq!(text.matches("someone@example.org").count(), 1);
    }

    #[test]
    fn wrap_text_respects_width() {
        let text = "word ".repeat(50);
        for line in wrap_text(&text, 80) {
            assert!(line.len() <= 80);
        }
    }

    #[test]
    fn write_readme_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let context = ReadmeContext {
            name: "demo".to_string(),
            urls: vec!["http://host/a.nc".to_string()],
            ..Default::default()
        };

        let path = write_readme(dir.path(), "README.md", &context).unwrap();
        std::fs::write(&path, "stale").unwrap();
        write_readme(dir.path(), "README.md", &context).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("demo"));
        assert!(!content.contains("stale"));
    }
}
