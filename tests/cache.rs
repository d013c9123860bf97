mod common;

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use wordtrail::cache::RemoteCache;
use wordtrail::remote::RemoteClient;

fn meets_cache(base_url: &str) -> RemoteCache<u64> {
    let remote = Arc::new(RemoteClient::new(Duration::from_secs(5), "network down").unwrap());
    RemoteCache::new("meets", &format!("{}/api/meets", base_url), remote)
}

async fn mount_meets(mock_server: &MockServer, body: serde_json::Value, times: u64) {
    Mock::given(method("GET"))
        .and(path("/api/meets"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(times)
        .mount(mock_server)
        .await;
}

#[tokio::test]
async fn test_second_get_is_served_from_cache() {
    let mock_server = MockServer::start().await;
    mount_meets(&mock_server, json!({"data": {"cat": 2, "dog": 5}}), 1).await;

    let cache = meets_cache(&mock_server.uri());
    let first = cache.get().await;
    let second = cache.get().await;

    assert_eq!(first.get("dog"), Some(&5));
    assert_eq!(first, second);
    assert!(cache.is_valid().await);
}

#[tokio::test]
async fn test_invalidate_forces_refetch() {
    let mock_server = MockServer::start().await;
    mount_meets(&mock_server, json!({"data": {"cat": 2}}), 2).await;

    let cache = meets_cache(&mock_server.uri());
    cache.get().await;
    cache.invalidate().await;
    assert!(!cache.is_valid().await);

    cache.get().await;
    assert!(cache.is_valid().await);
}

#[tokio::test]
async fn test_invalidate_keeps_stored_map_until_next_get() {
    let mock_server = MockServer::start().await;
    mount_meets(&mock_server, json!({"data": {"cat": 2}}), 1).await;

    let cache = meets_cache(&mock_server.uri());
    cache.get().await;
    cache.invalidate().await;

    assert_eq!(cache.peek().await.get("cat"), Some(&2));
}

#[tokio::test]
async fn test_transport_failure_leaves_cache_invalid_and_empty() {
    let mock_server = MockServer::start().await;
    mount_meets(&mock_server, json!({"data": {"cat": 2}}), 1).await;

    let cache = meets_cache(&mock_server.uri());
    cache.get().await;
    cache.invalidate().await;

    mock_server.reset().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500).set_body_string("oops"))
        .mount(&mock_server)
        .await;

    let entries = cache.get().await;
    assert!(entries.is_empty());
    assert!(!cache.is_valid().await);
    assert!(cache.peek().await.is_empty());
}

#[tokio::test]
async fn test_unreachable_backend_retries_next_time() {
    let cache = meets_cache(common::DEAD_BACKEND);
    assert!(cache.get().await.is_empty());
    assert!(!cache.is_valid().await);
}

#[tokio::test]
async fn test_backend_error_is_not_cached() {
    let mock_server = MockServer::start().await;
    mount_meets(&mock_server, json!({"message": "please log in"}), 2).await;

    let cache = meets_cache(&mock_server.uri());
    assert!(cache.get().await.is_empty());
    assert!(!cache.is_valid().await);
    cache.get().await;
}

#[tokio::test]
async fn test_missing_data_is_a_valid_empty_map() {
    let mock_server = MockServer::start().await;
    mount_meets(&mock_server, json!({"data": null}), 1).await;

    let cache = meets_cache(&mock_server.uri());
    assert!(cache.get().await.is_empty());
    assert!(cache.is_valid().await);
    cache.get().await;
}

#[tokio::test]
async fn test_mismatched_payload_is_a_failure() {
    let mock_server = MockServer::start().await;
    mount_meets(&mock_server, json!({"data": ["cat", "dog"]}), 1).await;

    let cache = meets_cache(&mock_server.uri());
    assert!(cache.get().await.is_empty());
    assert!(!cache.is_valid().await);
}

#[tokio::test]
async fn test_invalidation_during_fetch_is_not_lost() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/meets"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"data": {"cat": 1}}))
                .set_delay(Duration::from_millis(200)),
        )
        .expect(2)
        .mount(&mock_server)
        .await;

    let cache = Arc::new(meets_cache(&mock_server.uri()));
    let reader = {
        let cache = cache.clone();
        tokio::spawn(async move { cache.get().await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;
    cache.invalidate().await;

    let entries = reader.await.unwrap();
    assert_eq!(entries.get("cat"), Some(&1));
    assert!(!cache.is_valid().await);

    cache.get().await;
    assert!(cache.is_valid().await);
}

#[tokio::test]
async fn test_concurrent_gets_on_invalid_cache_converge() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/meets"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"data": {"cat": 3}}))
                .set_delay(Duration::from_millis(50)),
        )
        .mount(&mock_server)
        .await;

    let cache = meets_cache(&mock_server.uri());
    let (a, b) = tokio::join!(cache.get(), cache.get());

    assert_eq!(a, b);
    assert!(cache.is_valid().await);
    let requests = mock_server.received_requests().await.unwrap();
    assert!((1..=2).contains(&requests.len()));
}
