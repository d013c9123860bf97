mod common;

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

use wordtrail::remote::{FetchResult, RemoteClient, RequestInit};

const NETWORK_ERROR: &str = "network down";

fn client() -> RemoteClient {
    RemoteClient::new(Duration::from_secs(5), NETWORK_ERROR).unwrap()
}

/// Matches when the header is missing or carries a different value.
struct HeaderNot(&'static str, &'static str);

impl wiremock::Match for HeaderNot {
    fn matches(&self, request: &Request) -> bool {
        request
            .headers
            .get(self.0)
            .map(|value| value.as_bytes() != self.1.as_bytes())
            .unwrap_or(true)
    }
}

#[tokio::test]
async fn test_success_envelope() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/meets"))
        .and(header("Accept", "application/json"))
        .and(header("Content-Type", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {"cat": 2}})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let result = client()
        .fetch_json(&format!("{}/api/meets", mock_server.uri()), RequestInit::get())
        .await;

    assert_eq!(result, FetchResult::ok(Some(json!({"cat": 2}))));
}

#[tokio::test]
async fn test_backend_message_is_surfaced() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/words/known/3"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({"data": null, "message": "word not found"})),
        )
        .mount(&mock_server)
        .await;

    let result = client()
        .fetch_json(
            &format!("{}/api/words/known/3", mock_server.uri()),
            RequestInit::post(),
        )
        .await;

    assert_eq!(result.data, None);
    assert_eq!(result.err_message.as_deref(), Some("word not found"));
}

#[tokio::test]
async fn test_non_json_body_collapses_to_network_error() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>"))
        .mount(&mock_server)
        .await;

    let result = client()
        .fetch_json(&format!("{}/api/meets", mock_server.uri()), RequestInit::get())
        .await;

    assert_eq!(result, FetchResult::error(NETWORK_ERROR));
}

#[tokio::test]
async fn test_unreachable_backend_collapses_to_network_error() {
    let result = client()
        .fetch_json(&format!("{}/api/meets", common::DEAD_BACKEND), RequestInit::get())
        .await;

    assert_eq!(result, FetchResult::error(NETWORK_ERROR));
}

#[tokio::test]
async fn test_json_body_is_sent() {
    let mock_server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/collection"))
        .and(body_json(json!({"id": 8})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": true})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let result = client()
        .fetch_json(
            &format!("{}/api/collection", mock_server.uri()),
            RequestInit::delete().json(json!({"id": 8})),
        )
        .await;

    assert!(result.is_ok());
    assert_eq!(result.data, Some(json!(true)));
}

#[tokio::test]
async fn test_custom_headers_replace_defaults() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(header("X-Client", "popup"))
        .and(HeaderNot("accept", "application/json"))
        .and(HeaderNot("content-type", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": "ok"})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut headers = HeaderMap::new();
    headers.insert("X-Client", HeaderValue::from_static("popup"));
    let result = client()
        .fetch_json(
            &format!("{}/api/meets", mock_server.uri()),
            RequestInit::get().headers(headers),
        )
        .await;

    assert_eq!(result.data, Some(json!("ok")));
}

#[tokio::test]
async fn test_url_is_percent_encoded() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/query/na%C3%AFve"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {"id": 1}})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let result = client()
        .fetch_json(
            &format!("{}/api/query/naïve", mock_server.uri()),
            RequestInit::post(),
        )
        .await;

    assert!(result.is_ok());
}
