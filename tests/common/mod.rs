//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use tpops::api::ApiClient;
use tpops::config::ServerConfig;
use tpops::policy::Role;
use tpops::session::{Identity, Session};

pub const TEST_TOKEN: &str = "test-token";

pub fn identity(role: Role) -> Identity {
    Identity {
        id: 1,
        username: "operator".to_string(),
        role,
    }
}

pub fn authed_session(role: Role) -> Arc<Session> {
    let session = Arc::new(Session::new(None));
    session.set(TEST_TOKEN.to_string(), identity(role));
    session
}

pub fn client_for(base_url: &str, session: Arc<Session>) -> ApiClient {
    let config = ServerConfig {
        base_url: base_url.to_string(),
        timeout_seconds: 5,
    };
    ApiClient::new(&config, session)
}
