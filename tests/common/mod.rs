//! Shared helpers for integration tests
#![allow(dead_code)]

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Mount a directory index page listing the given child names
///
/// Directory children should be passed with a trailing `/`.
pub async fn mount_index(server: &MockServer, dir: &str, children: &[&str]) {
    let links: String = children
        .iter()
        .map(|child| format!(r#"<a href="{child}">{child}</a>"#))
        .collect();
    let body = format!("<html><body>{links}</body></html>");
    Mock::given(method("GET"))
        .and(path(dir))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

/// Mount a downloadable file with the given body
pub async fn mount_file(server: &MockServer, file_path: &str, body: &[u8]) {
    Mock::given(method("GET"))
        .and(path(file_path))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body.to_vec()))
        .mount(server)
        .await;
}
