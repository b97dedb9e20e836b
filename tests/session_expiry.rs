//! Forced-logout semantics: any 401 on an authenticated call clears the
//! session exactly once, even under concurrent failures.

mod common;

use common::{authed_session, client_for};
use tpops::api::ApiError;
use tpops::policy::Role;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_single_401_clears_session_and_maps_to_session_expired() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/config"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let session = authed_session(Role::Monitoring);
    let client = client_for(&server.uri(), session.clone());

    let result = client.fetch_config_summary().await;
    assert!(matches!(result, Err(ApiError::SessionExpired)));
    assert!(!session.is_authenticated());
}

#[tokio::test]
async fn test_concurrent_401s_clear_exactly_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/config"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/gateways"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let session = authed_session(Role::Admin);
    let client = std::sync::Arc::new(client_for(&server.uri(), session.clone()));

    let mut watch = session.subscribe();
    assert!(*watch.borrow_and_update());

    // Two independent calls, both rejected. Clearing must be idempotent.
    let (a, b) = tokio::join!(client.fetch_config_summary(), client.fetch_gateways());
    assert!(matches!(a, Err(ApiError::SessionExpired)));
    assert!(matches!(b, Err(ApiError::SessionExpired)));

    assert!(!session.is_authenticated());

    // Observers see one transition to unauthenticated and nothing after.
    assert!(watch.has_changed().unwrap());
    assert!(!*watch.borrow_and_update());
    assert!(!watch.has_changed().unwrap());
}

#[tokio::test]
async fn test_stale_poll_401_behaves_like_any_other_401() {
    // A background poll hitting 401 goes through the same gateway path,
    // so the session is cleared without any user interaction.
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/services/performance"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let session = authed_session(Role::Service);
    let client = client_for(&server.uri(), session.clone());

    let result = client.fetch_performance_summary().await;
    assert!(result.unwrap_err().is_session_expired());
    assert!(!session.is_authenticated());
}

#[tokio::test]
async fn test_non_401_failures_keep_the_session() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/config"))
        .respond_with(ResponseTemplate::new(503).set_body_json(serde_json::json!({
            "detail": "backend restarting"
        })))
        .mount(&server)
        .await;

    let session = authed_session(Role::Monitoring);
    let client = client_for(&server.uri(), session.clone());

    match client.fetch_config_summary().await {
        Err(ApiError::Http { status, message }) => {
            assert_eq!(status, 503);
            assert_eq!(message, "backend restarting");
        }
        _ => panic!("expected Http error"),
    }
    assert!(session.is_authenticated());
}
