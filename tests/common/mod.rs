//! Shared helpers for tests that run against a mocked upstream API

#![allow(dead_code)]

use serde_json::{json, Value};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const CHARACTER_PATH: &str = "/api/character";

/// Base URL of the mocked API
pub fn base_url(server: &MockServer) -> String {
    format!("{}/api", server.uri())
}

/// URL of page `n` of the character collection
pub fn page_url(server: &MockServer, n: usize) -> String {
    format!("{}/character?page={}", base_url(server), n)
}

/// A page document with the given records and next link
pub fn page_body(results: Vec<Value>, next: Option<String>) -> Value {
    json!({
        "info": {"count": results.len(), "pages": 1, "next": next, "prev": null},
        "results": results
    })
}

/// A character with all projected fields present
pub fn character(name: &str, location: &str, image: &str) -> Value {
    json!({
        "id": 1,
        "name": name,
        "status": "Alive",
        "location": {"name": location, "url": ""},
        "image": image
    })
}

/// Serves `pages` as a linked chain starting at `/api/character`
///
/// Page 1 is the bare collection URL; page `n > 1` is `?page=n`. Each page
/// links to the next, the last links to null. Every page expects `expected`
/// hits.
pub async fn mount_pages(server: &MockServer, pages: Vec<Vec<Value>>, expected: u64) {
    let total = pages.len();
    for (i, results) in pages.into_iter().enumerate() {
        let n = i + 1;
        let next = (n < total).then(|| page_url(server, n + 1));
        let body = page_body(results, next);
        mount_page(server, n, ResponseTemplate::new(200).set_body_json(body), expected).await;
    }
}

/// Mounts a single response for page `n`
pub async fn mount_page(server: &MockServer, n: usize, response: ResponseTemplate, expected: u64) {
    let builder = Mock::given(method("GET")).and(path(CHARACTER_PATH));
    let mock = if n == 1 {
        builder.respond_with(response)
    } else {
        builder
            .and(query_param("page", n.to_string()))
            .respond_with(response)
            .with_priority(1)
    };
    mock.expect(expected).mount(server).await;
}
