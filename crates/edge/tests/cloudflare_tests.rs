use std::net::Ipv4Addr;

use edge::{CloudflareClient, DnsProvider, EdgeError};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ZONE_ID: &str = "023e105f4ecef8ad9ca31a8372d0c353";

fn ok(result: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "success": true,
        "errors": [],
        "messages": [],
        "result": result,
    }))
}

async fn mount_zone(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/zones"))
        .and(query_param("name", "example.com"))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ok(json!([{"id": ZONE_ID, "name": "example.com"}])))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_creates_missing_record() {
    let server = MockServer::start().await;
    mount_zone(&server).await;

    Mock::given(method("GET"))
        .and(path(format!("/zones/{}/dns_records", ZONE_ID)))
        .and(query_param("type", "A"))
        .and(query_param("name", "*.example.com"))
        .respond_with(ok(json!([])))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(format!("/zones/{}/dns_records", ZONE_ID)))
        .and(body_partial_json(json!({
            "type": "A",
            "name": "*.example.com",
            "content": "203.0.113.7"
        })))
        .respond_with(ok(json!({
            "id": "rec-1",
            "name": "*.example.com",
            "content": "203.0.113.7",
            "proxied": false
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = CloudflareClient::with_base_url(server.uri(), "test-token");
    let record = client
        .upsert_a_record("example.com", "*.example.com", Ipv4Addr::new(203, 0, 113, 7))
        .await
        .unwrap();

    assert_eq!(record.id, "rec-1");
    assert_eq!(record.content, "203.0.113.7");
}

#[tokio::test]
async fn test_updates_stale_record() {
    let server = MockServer::start().await;
    mount_zone(&server).await;

    Mock::given(method("GET"))
        .and(path(format!("/zones/{}/dns_records", ZONE_ID)))
        .respond_with(ok(json!([{
            "id": "rec-1",
            "name": "example.com",
            "content": "198.51.100.1"
        }])))
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .and(path(format!("/zones/{}/dns_records/rec-1", ZONE_ID)))
        .and(body_partial_json(json!({"content": "203.0.113.7"})))
        .respond_with(ok(json!({
            "id": "rec-1",
            "name": "example.com",
            "content": "203.0.113.7"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = CloudflareClient::with_base_url(server.uri(), "test-token");
    let record = client
        .upsert_a_record("example.com", "example.com", Ipv4Addr::new(203, 0, 113, 7))
        .await
        .unwrap();

    assert_eq!(record.content, "203.0.113.7");
}

#[tokio::test]
async fn test_current_record_is_left_alone() {
    let server = MockServer::start().await;
    mount_zone(&server).await;

    Mock::given(method("GET"))
        .and(path(format!("/zones/{}/dns_records", ZONE_ID)))
        .respond_with(ok(json!([{
            "id": "rec-1",
            "name": "example.com",
            "content": "203.0.113.7"
        }])))
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .respond_with(ok(json!({})))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ok(json!({})))
        .expect(0)
        .mount(&server)
        .await;

    let client = CloudflareClient::with_base_url(server.uri(), "test-token");
    let record = client
        .upsert_a_record("example.com", "example.com", Ipv4Addr::new(203, 0, 113, 7))
        .await
        .unwrap();

    assert_eq!(record.id, "rec-1");
}

#[tokio::test]
async fn test_subdomain_resolves_to_parent_zone() {
    let server = MockServer::start().await;
    mount_zone(&server).await;

    Mock::given(method("GET"))
        .and(path("/zones"))
        .and(query_param("name", "k1.example.com"))
        .respond_with(ok(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("/zones/{}/dns_records", ZONE_ID)))
        .and(query_param("name", "*.k1.example.com"))
        .respond_with(ok(json!([])))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(format!("/zones/{}/dns_records", ZONE_ID)))
        .and(body_partial_json(json!({"name": "*.k1.example.com"})))
        .respond_with(ok(json!({
            "id": "rec-7",
            "name": "*.k1.example.com",
            "content": "203.0.113.7"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = CloudflareClient::with_base_url(server.uri(), "test-token");
    let record = client
        .upsert_a_record(
            "k1.example.com",
            "*.k1.example.com",
            Ipv4Addr::new(203, 0, 113, 7),
        )
        .await
        .unwrap();

    assert_eq!(record.id, "rec-7");
}

#[tokio::test]
async fn test_no_zone_for_any_parent() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/zones"))
        .respond_with(ok(json!([])))
        .expect(2)
        .mount(&server)
        .await;

    let client = CloudflareClient::with_base_url(server.uri(), "test-token");
    let err = client
        .upsert_a_record("k1.example.org", "k1.example.org", Ipv4Addr::new(203, 0, 113, 7))
        .await
        .unwrap_err();

    assert!(matches!(err, EdgeError::ZoneNotFound(zone) if zone == "k1.example.org"));
}

#[tokio::test]
async fn test_unknown_zone() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/zones"))
        .respond_with(ok(json!([])))
        .mount(&server)
        .await;

    let client = CloudflareClient::with_base_url(server.uri(), "test-token");
    let err = client
        .upsert_a_record("example.org", "example.org", Ipv4Addr::new(203, 0, 113, 7))
        .await
        .unwrap_err();

    assert!(matches!(err, EdgeError::ZoneNotFound(zone) if zone == "example.org"));
}

#[tokio::test]
async fn test_rejected_token() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/zones"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "success": false,
            "errors": [{"code": 10000, "message": "Authentication error"}],
            "messages": [],
            "result": null
        })))
        .mount(&server)
        .await;

    let client = CloudflareClient::with_base_url(server.uri(), "bad-token");
    let err = client
        .upsert_a_record("example.com", "example.com", Ipv4Addr::new(203, 0, 113, 7))
        .await
        .unwrap_err();

    match err {
        EdgeError::Authentication(msg) => assert!(msg.contains("Authentication error")),
        other => panic!("expected Authentication, got {other:?}"),
    }
}
