//! Integration tests for the REST gateway against a mock backend.

mod common;

use common::{authed_session, client_for, TEST_TOKEN};
use std::sync::Arc;
use tpops::api::ApiError;
use tpops::policy::Role;
use tpops::session::Session;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_login_success_returns_token_and_identity() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "issued-token",
            "token_type": "bearer",
            "user": {"id": 9, "username": "alice", "role": "admin"}
        })))
        .mount(&server)
        .await;

    let session = Arc::new(Session::new(None));
    let client = client_for(&server.uri(), session);

    let auth = client.login("alice", "secret").await.unwrap();
    assert_eq!(auth.access_token, "issued-token");
    assert_eq!(auth.user.username, "alice");
    assert_eq!(auth.user.role, Role::Admin);
}

#[tokio::test]
async fn test_login_rejection_is_invalid_credentials() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "detail": "Incorrect username or password"
        })))
        .mount(&server)
        .await;

    let session = Arc::new(Session::new(None));
    let client = client_for(&server.uri(), session.clone());

    let result = client.login("alice", "wrong").await;
    assert!(matches!(result, Err(ApiError::InvalidCredentials)));
    // A login rejection never touches session state.
    assert!(!session.is_authenticated());
}

#[tokio::test]
async fn test_login_rejection_keeps_existing_session() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let session = authed_session(Role::Monitoring);
    let client = client_for(&server.uri(), session.clone());

    let result = client.login("bob", "wrong").await;
    assert!(matches!(result, Err(ApiError::InvalidCredentials)));
    assert!(session.is_authenticated());
}

#[tokio::test]
async fn test_bearer_header_attached_to_authenticated_calls() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/servers"))
        .and(header("authorization", format!("Bearer {}", TEST_TOKEN).as_str()))
        .and(query_param("search", "pay"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "servers": [
                {"name": "payd", "svg": "SVG1", "min": "2", "max": "10",
                 "restart": "Y", "node": "NODE1"}
            ],
            "total": 1
        })))
        .expect(1)
        .mount(&server)
        .await;

    let session = authed_session(Role::Monitoring);
    let client = client_for(&server.uri(), session);

    let rows = client.search_processes(Some("pay")).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].name, "payd");
    // Restricted fields omitted by the backend stay absent, not empty.
    assert_eq!(rows[0].maxqcount, None);
    assert_eq!(rows[0].db_info, None);
}

#[tokio::test]
async fn test_elevated_rows_carry_restricted_fields() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/servers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "servers": [
                {"name": "payd", "svg": "SVG1", "min": "2", "max": "10",
                 "restart": "Y", "node": "NODE1",
                 "maxqcount": "100", "asqcount": "10", "db_info": "DBU01:CORE1"}
            ]
        })))
        .mount(&server)
        .await;

    let session = authed_session(Role::Infrastructure);
    let client = client_for(&server.uri(), session);

    let rows = client.search_processes(Some("pay")).await.unwrap();
    assert_eq!(rows[0].maxqcount.as_deref(), Some("100"));
    assert_eq!(rows[0].db_info.as_deref(), Some("DBU01:CORE1"));
}

#[tokio::test]
async fn test_service_detail_embeds_owning_process() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/service/PAYSVC01"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "service": {
                "name": "PAYSVC01",
                "server_name": "payd",
                "timeout": "30",
                "autotran": "N",
                "export": "Y",
                "server_info": {
                    "svg_name": "SVG1", "node_name": "NODE1",
                    "min_proc": "2", "max_proc": "10"
                }
            }
        })))
        .mount(&server)
        .await;

    let session = authed_session(Role::Service);
    let client = client_for(&server.uri(), session);

    let detail = client.fetch_service("PAYSVC01").await.unwrap();
    assert_eq!(detail.server_name, "payd");
    let owner = detail.server_info.expect("embedded owner");
    assert_eq!(owner.node_name, "NODE1");
}

#[tokio::test]
async fn test_backend_detail_text_is_surfaced() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/server/ghost"))
        .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
            "detail": "Server 'ghost' not found"
        })))
        .mount(&server)
        .await;

    let session = authed_session(Role::Monitoring);
    let client = client_for(&server.uri(), session);

    match client.fetch_process("ghost").await {
        Err(ApiError::Http { status, message }) => {
            assert_eq!(status, 404);
            assert_eq!(message, "Server 'ghost' not found");
        }
        _ => panic!("expected Http error"),
    }
}

#[tokio::test]
async fn test_missing_detail_text_falls_back_to_generic_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/gateways"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let session = authed_session(Role::Admin);
    let client = client_for(&server.uri(), session);

    match client.fetch_gateways().await {
        Err(ApiError::Http { status, message }) => {
            assert_eq!(status, 500);
            assert_eq!(message, "request failed with status 500");
        }
        _ => panic!("expected Http error"),
    }
}

#[tokio::test]
async fn test_performance_summary_tolerates_missing_list() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/services/performance"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .mount(&server)
        .await;

    let session = authed_session(Role::Monitoring);
    let client = client_for(&server.uri(), session);

    let rows = client.fetch_performance_summary().await.unwrap();
    assert!(rows.is_empty());
}

#[tokio::test]
async fn test_performance_summary_parses_nullable_timings() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/services/performance"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "services": [
                {"serviceName": "svcA", "avgTime": 50.0, "minTime": 1.0,
                 "maxTime": 120.0, "count": 42},
                {"serviceName": "svcB", "avgTime": null, "minTime": null,
                 "maxTime": null, "count": null}
            ]
        })))
        .mount(&server)
        .await;

    let session = authed_session(Role::Monitoring);
    let client = client_for(&server.uri(), session);

    let rows = client.fetch_performance_summary().await.unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].avg_time, Some(50.0));
    assert_eq!(rows[1].avg_time, None);
}

#[tokio::test]
async fn test_performance_detail_query_carries_window() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/performance/PAYSVC01"))
        .and(query_param("start", "2026-08-06T00:00:00Z"))
        .and(query_param("end", "2026-08-07T00:00:00Z"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "avgTime": 42.0, "minTime": 1.0, "maxTime": 900.0,
            "medianTime": 30.0, "count": 1234,
            "slowTransactions": [
                {"timestamp": "2026-08-06T12:00:00Z", "duration": 900.0, "status": "ok"}
            ],
            "timeSeriesData": [
                {"timestamp": "2026-08-06T00:00:00Z", "avgDuration": 40.0, "count": 17}
            ]
        })))
        .mount(&server)
        .await;

    let session = authed_session(Role::Monitoring);
    let client = client_for(&server.uri(), session);

    let detail = client
        .fetch_performance_detail("PAYSVC01", "2026-08-06T00:00:00Z", "2026-08-07T00:00:00Z")
        .await
        .unwrap();
    assert_eq!(detail.count, 1234);
    assert_eq!(detail.slow_transactions.len(), 1);
    assert_eq!(detail.time_series_data[0].count, 17);
}

#[tokio::test]
async fn test_export_recovers_filename_from_header() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/export/servers"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header(
                    "content-disposition",
                    "attachment; filename=servers_20260807.xlsx",
                )
                .set_body_bytes(vec![0x50, 0x4b, 0x03, 0x04]),
        )
        .mount(&server)
        .await;

    let session = authed_session(Role::Admin);
    let client = client_for(&server.uri(), session);

    let file = client.export_processes_file().await.unwrap();
    assert_eq!(file.filename, "servers_20260807.xlsx");
    assert_eq!(file.bytes, vec![0x50, 0x4b, 0x03, 0x04]);
}

#[tokio::test]
async fn test_export_falls_back_to_default_filename() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/export/services"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![1, 2, 3]))
        .mount(&server)
        .await;

    let session = authed_session(Role::Admin);
    let client = client_for(&server.uri(), session);

    let file = client.export_services_file().await.unwrap();
    assert_eq!(file.filename, "services.xlsx");
}

#[tokio::test]
async fn test_config_summary_roundtrip() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/config"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "success": true,
            "summary": {
                "domain_id": "1", "domain_name": "PROD",
                "total_domains": 1, "total_nodes": 2, "total_server_groups": 3,
                "total_servers": 10, "total_services": 25, "total_gateways": 2,
                "nodes": ["NODE1", "NODE2"],
                "server_groups": ["SVG1", "SVG2", "SVG3"]
            },
            "last_update": "2026-08-07T09:00:00+09:00"
        })))
        .mount(&server)
        .await;

    let session = authed_session(Role::Admin);
    let client = client_for(&server.uri(), session);

    let snapshot = client.fetch_config_summary().await.unwrap();
    assert_eq!(snapshot.summary.domain_name, "PROD");
    assert_eq!(snapshot.summary.nodes.len(), 2);
    assert_eq!(snapshot.last_update, "2026-08-07T09:00:00+09:00");
}

#[tokio::test]
async fn test_unauthenticated_calls_send_no_bearer() {
    let server = MockServer::start().await;
    // No Authorization header expected; wiremock matches on path only and
    // we assert on what the handler received via the identity check below.
    Mock::given(method("GET"))
        .and(path("/api/config"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "summary": {"domain_id": "", "domain_name": "N/A"},
            "last_update": ""
        })))
        .mount(&server)
        .await;

    let session = Arc::new(Session::new(None));
    let client = client_for(&server.uri(), session);

    let snapshot = client.fetch_config_summary().await.unwrap();
    assert_eq!(snapshot.summary.domain_name, "N/A");

    let requests = server.received_requests().await.unwrap();
    assert!(requests
        .iter()
        .all(|r| !r.headers.contains_key("authorization")));
}
