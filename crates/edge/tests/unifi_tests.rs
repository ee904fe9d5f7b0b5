use std::net::Ipv4Addr;

use edge::{EdgeError, IngressDevice, PortForward, UnifiClient};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PORTFORWARD: &str = "/proxy/network/api/s/default/rest/portforward";

fn ok(data: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({"meta": {"rc": "ok"}, "data": data}))
}

async fn mount_login(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .and(body_partial_json(json!({"username": "admin", "password": "secret"})))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("x-csrf-token", "csrf-123")
                .insert_header("set-cookie", "TOKEN=session; Path=/")
                .set_body_json(json!({"username": "admin"})),
        )
        .expect(1)
        .mount(server)
        .await;
}

fn client(server: &MockServer) -> UnifiClient {
    UnifiClient::new(&server.uri(), "admin", "secret").unwrap()
}

#[tokio::test]
async fn test_wan_address() {
    let server = MockServer::start().await;
    mount_login(&server).await;

    Mock::given(method("GET"))
        .and(path("/proxy/network/api/s/default/stat/health"))
        .and(header("x-csrf-token", "csrf-123"))
        .respond_with(ok(json!([
            {"subsystem": "wlan"},
            {"subsystem": "wan", "wan_ip": "203.0.113.7"}
        ])))
        .mount(&server)
        .await;

    let address = client(&server).wan_address().await.unwrap();
    assert_eq!(address, Ipv4Addr::new(203, 0, 113, 7));
}

#[tokio::test]
async fn test_creates_missing_port_forward() {
    let server = MockServer::start().await;
    mount_login(&server).await;

    Mock::given(method("GET"))
        .and(path(PORTFORWARD))
        .respond_with(ok(json!([])))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(PORTFORWARD))
        .and(header("x-csrf-token", "csrf-123"))
        .and(body_partial_json(json!({
            "name": "kubefirst-https",
            "dst_port": "443",
            "fwd": "10.0.12.1",
            "fwd_port": "443",
            "proto": "tcp"
        })))
        .respond_with(ok(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let rule = PortForward::tcp("kubefirst-https", 443, Ipv4Addr::new(10, 0, 12, 1));
    client(&server).ensure_port_forward(&rule).await.unwrap();
}

#[tokio::test]
async fn test_updates_changed_port_forward() {
    let server = MockServer::start().await;
    mount_login(&server).await;

    Mock::given(method("GET"))
        .and(path(PORTFORWARD))
        .respond_with(ok(json!([{
            "_id": "pf-1",
            "name": "kubefirst-https",
            "enabled": true,
            "src": "any",
            "dst_port": "443",
            "fwd": "10.0.12.9",
            "fwd_port": "443",
            "proto": "tcp",
            "pfwd_interface": "wan",
            "log": false
        }])))
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .and(path(format!("{}/pf-1", PORTFORWARD)))
        .and(body_partial_json(json!({"_id": "pf-1", "fwd": "10.0.12.1"})))
        .respond_with(ok(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let device = client(&server);
    let rule = PortForward::tcp("kubefirst-https", 443, Ipv4Addr::new(10, 0, 12, 1));
    device.ensure_port_forward(&rule).await.unwrap();
}

#[tokio::test]
async fn test_changed_port_forward_without_id_is_rejected() {
    let server = MockServer::start().await;
    mount_login(&server).await;

    Mock::given(method("GET"))
        .and(path(PORTFORWARD))
        .respond_with(ok(json!([{
            "name": "kubefirst-https",
            "enabled": true,
            "src": "any",
            "dst_port": "443",
            "fwd": "10.0.12.9",
            "fwd_port": "443",
            "proto": "tcp",
            "pfwd_interface": "wan",
            "log": false
        }])))
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .respond_with(ok(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let rule = PortForward::tcp("kubefirst-https", 443, Ipv4Addr::new(10, 0, 12, 1));
    let err = client(&server).ensure_port_forward(&rule).await.unwrap_err();
    assert!(matches!(err, EdgeError::InvalidResponse(msg) if msg.contains("kubefirst-https")));
}

#[tokio::test]
async fn test_matching_port_forward_is_left_alone() {
    let server = MockServer::start().await;
    mount_login(&server).await;

    Mock::given(method("GET"))
        .and(path(PORTFORWARD))
        .respond_with(ok(json!([{
            "_id": "pf-1",
            "name": "kubefirst-http",
            "enabled": true,
            "src": "any",
            "dst_port": "80",
            "fwd": "10.0.12.1",
            "fwd_port": "80",
            "proto": "tcp",
            "pfwd_interface": "wan",
            "log": false
        }])))
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .respond_with(ok(json!([])))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(PORTFORWARD))
        .respond_with(ok(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let device = client(&server);
    let rule = PortForward::tcp("kubefirst-http", 80, Ipv4Addr::new(10, 0, 12, 1));
    device.ensure_port_forward(&rule).await.unwrap();
    // Second call reuses the session
    device.ensure_port_forward(&rule).await.unwrap();
}

#[tokio::test]
async fn test_login_rejected() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let err = client(&server).wan_address().await.unwrap_err();
    assert!(matches!(err, EdgeError::Authentication(_)));
}

#[tokio::test]
async fn test_api_error_code() {
    let server = MockServer::start().await;
    mount_login(&server).await;

    Mock::given(method("GET"))
        .and(path("/proxy/network/api/s/default/stat/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "meta": {"rc": "error", "msg": "api.err.NoSiteContext"},
            "data": []
        })))
        .mount(&server)
        .await;

    let err = client(&server).wan_address().await.unwrap_err();
    match err {
        EdgeError::Api(msg) => assert_eq!(msg, "api.err.NoSiteContext"),
        other => panic!("expected Api, got {other:?}"),
    }
}
