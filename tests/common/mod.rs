//! Shared test utilities for Pulse integration tests.
//!
//! Provides wire-format builders and wiremock helpers that stand in for the
//! master and tenant services.

#![allow(dead_code)]

use pulse::config::{ServiceEndpoint, ServicesConfig};
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Path prefix the master service is mounted under.
pub const MASTER_PREFIX: &str = "/master-ser";
/// Path prefix the tenant service is mounted under.
pub const TENANT_PREFIX: &str = "/tenant-ser";

// =============================================================================
// Wire Builders
// =============================================================================

/// Health block of one server.
pub fn server_health(status: &str, now_ms: Option<i64>) -> Value {
    let mut health = json!({
        "status": status,
        "uptime": 120.5,
        "timestamp": "2024-05-01T10:00:00Z",
    });
    if let Some(now) = now_ms {
        health["now"] = json!(now);
    }
    health
}

/// Snapshot reported by a service, seeing its peer under `peer_key`.
pub fn snapshot_json(now_ms: Option<i64>, peer_key: &str, peer_status: &str) -> Value {
    json!({
        "health": server_health("UP", now_ms),
        "servicesConnected": {
            peer_key: server_health(peer_status, None),
        },
    })
}

/// Successful `GET /connected` body.
pub fn poll_body(snapshot: Value) -> Value {
    json!({ "success": true, "data": snapshot })
}

/// One server-sent event carrying `snapshot`.
pub fn sse_message(snapshot: &Value) -> String {
    format!("data: {}\n\n", json!({ "data": snapshot }))
}

/// Epoch milliseconds `ago_ms` in the past.
pub fn epoch_ms_ago(ago_ms: i64) -> i64 {
    chrono::Utc::now().timestamp_millis() - ago_ms
}

// =============================================================================
// Mock Services
// =============================================================================

/// Service roots on `server` using the reverse-proxy prefixes.
pub fn services_on(server: &MockServer) -> ServicesConfig {
    ServicesConfig {
        master: ServiceEndpoint::new(format!("{}{}", server.uri(), MASTER_PREFIX)),
        tenant: ServiceEndpoint::new(format!("{}{}", server.uri(), TENANT_PREFIX)),
    }
}

/// Mount a poll endpoint under `prefix` answering `response`.
pub async fn mount_poll(server: &MockServer, prefix: &str, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(format!("{}/connected", prefix)))
        .respond_with(response)
        .mount(server)
        .await;
}

/// Mount an event-stream endpoint under `prefix` sending `body` then closing.
pub async fn mount_stream(server: &MockServer, prefix: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(format!("{}/sse/connected", prefix)))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(body.into_bytes(), "text/event-stream"),
        )
        .mount(server)
        .await;
}

/// Number of requests `server` received on `request_path`.
pub async fn request_count(server: &MockServer, request_path: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|request| request.url.path() == request_path)
        .count()
}
