#![allow(clippy::unwrap_used)]
// Integration tests for `StatusAggregator` against a mocked device.

use std::sync::Arc;

use pretty_assertions::assert_eq;
use serde_json::json;
use url::Url;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use intercom_api::{Credentials, DeviceClient};
use intercom_core::{ChannelId, StatusAggregator};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, StatusAggregator) {
    let server = MockServer::start().await;
    let client = DeviceClient::with_client(
        reqwest::Client::new(),
        Url::parse(&server.uri()).unwrap(),
        Credentials::new("admin", "2n".to_string().into()),
    );
    (server, StatusAggregator::new(Arc::new(client)))
}

fn ok(result: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "success": true, "result": result }))
}

async fn mount_ports(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/io/status"))
        .respond_with(ok(json!({
            "ports": [{ "port": "relay1", "state": 1 }, { "port": "input1", "state": 0 }]
        })))
        .mount(server)
        .await;
}

async fn mount_switches(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/switch/status"))
        .respond_with(ok(json!({ "switches": [{ "switch": 1, "active": false }] })))
        .mount(server)
        .await;
}

async fn mount_events(server: &MockServer, subscribe_calls: u64) {
    Mock::given(method("GET"))
        .and(path("/api/log/subscribe"))
        .respond_with(ok(json!({ "id": 2_121_013_117_u64 })))
        .expect(subscribe_calls)
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/log/pull"))
        .and(query_param("id", "2121013117"))
        .respond_with(ok(json!({
            "events": [{ "id": 1, "event": "KeyPressed", "params": { "key": "1" } }]
        })))
        .mount(server)
        .await;
}

// ── Tests ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_full_cycle() {
    let (server, mut aggregator) = setup().await;
    mount_ports(&server).await;
    mount_switches(&server).await;
    mount_events(&server, 1).await;

    let snap = aggregator.refresh().await;

    assert!(snap.health.ports && snap.health.switches && snap.health.events);
    assert_eq!(snap.ports.len(), 2);
    assert!(snap.port(&"relay1".into()).unwrap().is_on());
    assert!(!snap.switch(&ChannelId::Numeric(1)).unwrap().active);
    assert_eq!(snap.events[0].kind.as_deref(), Some("KeyPressed"));
    assert_eq!(aggregator.cursor().unwrap().as_str(), "2121013117");

    // cursor is reused
    let snap = aggregator.refresh().await;
    assert!(snap.health.events);
}

#[tokio::test]
async fn test_calls_are_sequential_and_ordered() {
    let (server, mut aggregator) = setup().await;
    mount_ports(&server).await;
    mount_switches(&server).await;
    mount_events(&server, 1).await;

    aggregator.refresh().await;

    let paths: Vec<String> = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .map(|r| r.url.path().to_owned())
        .collect();
    assert_eq!(
        paths,
        vec![
            "/api/io/status",
            "/api/switch/status",
            "/api/log/subscribe",
            "/api/log/pull"
        ]
    );
}

#[tokio::test]
async fn test_port_failures_do_not_carry_over() {
    let (server, mut aggregator) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/io/status"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .with_priority(1)
        .mount(&server)
        .await;
    mount_ports(&server).await;
    mount_switches(&server).await;

    let first = aggregator.refresh().await;
    let second = aggregator.refresh().await;
    let third = aggregator.refresh().await;

    assert_eq!(
        [first.health.ports, second.health.ports, third.health.ports],
        [false, false, true]
    );
    assert!(first.ports.is_empty());
    assert!(second.ports.is_empty());
    assert_eq!(third.ports.len(), 2);

    // switches unaffected by the port outage
    assert!(first.health.switches && second.health.switches);
    assert_eq!(first.switches.len(), 1);
}

#[tokio::test]
async fn test_partial_outage_is_still_online() {
    let (server, mut aggregator) = setup().await;
    mount_switches(&server).await;

    let snap = aggregator.refresh().await;

    assert!(!snap.health.ports);
    assert!(snap.health.switches);
    assert!(!snap.health.events);
    assert!(snap.online());
}

#[tokio::test]
async fn test_everything_down_yields_empty_snapshot() {
    let (server, mut aggregator) = setup().await;

    let snap = aggregator.refresh().await;

    assert!(!snap.online());
    assert!(snap.ports.is_empty() && snap.switches.is_empty() && snap.events.is_empty());
    assert!(aggregator.cursor().is_none());

    // no cursor, so no pull was attempted
    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 3);
    assert!(requests.iter().all(|r| r.url.path() != "/api/log/pull"));
}

#[tokio::test]
async fn test_failed_pull_forces_resubscribe() {
    let (server, mut aggregator) = setup().await;
    mount_ports(&server).await;
    mount_switches(&server).await;

    Mock::given(method("GET"))
        .and(path("/api/log/pull"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": false })))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    mount_events(&server, 2).await;

    let first = aggregator.refresh().await;
    assert!(!first.health.events);
    assert!(first.events.is_empty());
    assert!(aggregator.cursor().is_none());
    assert!(first.health.ports, "other subsystems unaffected");

    let second = aggregator.refresh().await;
    assert!(second.health.events);
    assert_eq!(second.events.len(), 1);

    let third = aggregator.refresh().await;
    assert!(third.health.events);
    // subscribe expectation (exactly 2) is verified when the server drops
}

#[tokio::test]
async fn test_malformed_list_counts_as_failure() {
    let (server, mut aggregator) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/io/status"))
        .respond_with(ok(json!({ "ports": "not a list" })))
        .mount(&server)
        .await;
    mount_switches(&server).await;

    let snap = aggregator.refresh().await;

    assert!(!snap.health.ports);
    assert!(snap.ports.is_empty());
    assert!(snap.health.switches);
}
