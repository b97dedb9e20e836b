//! Integration tests for the background refresh poller.

mod common;

use common::{authed_session, client_for};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tpops::policy::Role;
use tpops::poller::{Poller, PollerEvent};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_healthy_backend(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/config"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "summary": {
                "domain_id": "1", "domain_name": "PROD",
                "total_domains": 1, "total_nodes": 1, "total_server_groups": 1,
                "total_servers": 4, "total_services": 9, "total_gateways": 1,
                "nodes": ["NODE1"], "server_groups": ["SVG1"]
            },
            "last_update": "2026-08-07T09:00:00+09:00"
        })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/gateways"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "gateways": [{"name": "GW1", "node": "NODE1", "port": "7000"}]
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_first_refresh_fires_immediately() {
    let server = MockServer::start().await;
    mount_healthy_backend(&server).await;

    let session = authed_session(Role::Admin);
    let client = Arc::new(client_for(&server.uri(), session));
    let (tx, mut rx) = mpsc::channel(8);

    let token = CancellationToken::new();
    let handle = Poller::new(client, Duration::from_secs(30), tx).start(token.clone());

    // Well under the 30s interval: the first cycle must not wait for it.
    let event = tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("first refresh within bounds")
        .expect("poller alive");

    match event {
        PollerEvent::Snapshot(snapshot) => {
            assert_eq!(snapshot.config.summary.domain_name, "PROD");
            assert_eq!(snapshot.gateways.len(), 1);
            assert_eq!(snapshot.gateways[0].name, "GW1");
        }
        PollerEvent::Failed(message) => panic!("unexpected failure: {}", message),
    }

    token.cancel();
    tokio::time::timeout(Duration::from_secs(2), handle)
        .await
        .expect("poller stops promptly")
        .unwrap();
}

#[tokio::test]
async fn test_cancellation_tears_the_task_down() {
    let server = MockServer::start().await;
    mount_healthy_backend(&server).await;

    let session = authed_session(Role::Admin);
    let client = Arc::new(client_for(&server.uri(), session));
    let (tx, mut rx) = mpsc::channel(8);

    let token = CancellationToken::new();
    let handle = Poller::new(client, Duration::from_secs(30), tx).start(token.clone());

    // Drain the immediate snapshot, then cancel.
    let _ = tokio::time::timeout(Duration::from_secs(2), rx.recv()).await;
    token.cancel();

    tokio::time::timeout(Duration::from_secs(2), handle)
        .await
        .expect("no orphaned timer after cancellation")
        .unwrap();

    // Channel closes with the task; nothing keeps ticking.
    assert!(rx.recv().await.is_none());
}

#[tokio::test]
async fn test_refresh_failure_is_reported_not_fatal() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/config"))
        .respond_with(ResponseTemplate::new(500).set_body_json(serde_json::json!({
            "detail": "parser crashed"
        })))
        .mount(&server)
        .await;

    let session = authed_session(Role::Admin);
    let client = Arc::new(client_for(&server.uri(), session.clone()));
    let (tx, mut rx) = mpsc::channel(8);

    let token = CancellationToken::new();
    let handle = Poller::new(client, Duration::from_secs(30), tx).start(token.clone());

    let event = tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("event within bounds")
        .expect("poller alive");
    match event {
        PollerEvent::Failed(message) => assert!(message.contains("parser crashed")),
        PollerEvent::Snapshot(_) => panic!("expected a failure event"),
    }

    // A non-401 failure keeps both the poller and the session alive.
    assert!(session.is_authenticated());
    token.cancel();
    tokio::time::timeout(Duration::from_secs(2), handle)
        .await
        .expect("poller stops promptly")
        .unwrap();
}

#[tokio::test]
async fn test_session_expiry_stops_the_poller() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/config"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let session = authed_session(Role::Admin);
    let client = Arc::new(client_for(&server.uri(), session.clone()));
    let (tx, mut rx) = mpsc::channel(8);

    let token = CancellationToken::new();
    let handle = Poller::new(client, Duration::from_secs(30), tx).start(token.clone());

    // The 401 clears the session and the poller winds itself down
    // without being cancelled.
    tokio::time::timeout(Duration::from_secs(2), handle)
        .await
        .expect("poller stops on expiry")
        .unwrap();
    assert!(!session.is_authenticated());
    assert!(rx.recv().await.is_none());
}
