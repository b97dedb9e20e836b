//! Remote data gateway
//!
//! Typed request functions against the TPOps REST backend. This is the one
//! place where the bearer credential is attached to outgoing calls and
//! where a rejected credential (401) is converted into a forced session
//! clear. The gateway is reentrant: any number of calls may be in flight
//! concurrently, and the 401-triggered clear is idempotent.

mod error;
pub mod types;

pub use error::ApiError;
pub use types::*;

use crate::config::ServerConfig;
use crate::perf::ServicePerformance;
use crate::session::Session;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

/// HTTP client for the TPOps backend.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    session: Arc<Session>,
    timeout_seconds: u64,
}

#[derive(Deserialize)]
struct ProcessListEnvelope {
    #[serde(default)]
    servers: Vec<ProcessRow>,
}

#[derive(Deserialize)]
struct ProcessDetailEnvelope {
    server: ProcessDetail,
}

#[derive(Deserialize)]
struct ServiceListEnvelope {
    #[serde(default)]
    services: Vec<ServiceRow>,
}

#[derive(Deserialize)]
struct ServiceDetailEnvelope {
    service: ServiceDetail,
}

#[derive(Deserialize)]
struct GatewayListEnvelope {
    #[serde(default)]
    gateways: Vec<Gateway>,
}

#[derive(Deserialize)]
struct PerformanceListEnvelope {
    #[serde(default)]
    services: Vec<ServicePerformance>,
}

#[derive(Deserialize)]
struct ErrorBody {
    detail: Option<String>,
}

impl ApiClient {
    /// Create a gateway with a pooled HTTP client.
    pub fn new(config: &ServerConfig, session: Arc<Session>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .expect("Failed to build HTTP client");
        Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            session,
            timeout_seconds: config.timeout_seconds,
        }
    }

    /// Create a gateway with a custom HTTP client (for testing).
    pub fn with_client(
        config: &ServerConfig,
        session: Arc<Session>,
        http: reqwest::Client,
    ) -> Self {
        Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            session,
            timeout_seconds: config.timeout_seconds,
        }
    }

    /// Authenticate with the backend. A 401 here means bad credentials,
    /// not an expired session; nothing is cleared.
    pub async fn login(&self, username: &str, password: &str) -> Result<AuthResponse, ApiError> {
        let url = format!("{}/api/auth/login", self.base_url);
        let response = self
            .http
            .post(&url)
            .form(&[("username", username), ("password", password)])
            .send()
            .await
            .map_err(|e| ApiError::from_transport(e, self.timeout_seconds))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(ApiError::InvalidCredentials);
        }
        if !status.is_success() {
            return Err(self.http_error(status, response).await);
        }
        response
            .json::<AuthResponse>()
            .await
            .map_err(|e| ApiError::InvalidResponse(e.to_string()))
    }

    /// `GET /api/config`
    pub async fn fetch_config_summary(&self) -> Result<ConfigSnapshot, ApiError> {
        self.get_json("/api/config", &[]).await
    }

    /// `GET /api/node/{name}`
    pub async fn fetch_node(&self, name: &str) -> Result<NodeInfo, ApiError> {
        self.get_json(&format!("/api/node/{}", name), &[]).await
    }

    /// `GET /api/svrgroup/{name}`
    pub async fn fetch_server_group(&self, name: &str) -> Result<ServerGroupInfo, ApiError> {
        self.get_json(&format!("/api/svrgroup/{}", name), &[]).await
    }

    /// `GET /api/servers?search=`
    pub async fn search_processes(&self, query: Option<&str>) -> Result<Vec<ProcessRow>, ApiError> {
        let params: Vec<(&str, &str)> = query.map(|q| ("search", q)).into_iter().collect();
        let envelope: ProcessListEnvelope = self.get_json("/api/servers", &params).await?;
        Ok(envelope.servers)
    }

    /// `GET /api/server/{name}`
    pub async fn fetch_process(&self, name: &str) -> Result<ProcessDetail, ApiError> {
        let envelope: ProcessDetailEnvelope =
            self.get_json(&format!("/api/server/{}", name), &[]).await?;
        Ok(envelope.server)
    }

    /// `GET /api/services?search=`
    pub async fn search_services(&self, query: Option<&str>) -> Result<Vec<ServiceRow>, ApiError> {
        let params: Vec<(&str, &str)> = query.map(|q| ("search", q)).into_iter().collect();
        let envelope: ServiceListEnvelope = self.get_json("/api/services", &params).await?;
        Ok(envelope.services)
    }

    /// `GET /api/service/{name}`
    pub async fn fetch_service(&self, name: &str) -> Result<ServiceDetail, ApiError> {
        let envelope: ServiceDetailEnvelope =
            self.get_json(&format!("/api/service/{}", name), &[]).await?;
        Ok(envelope.service)
    }

    /// `GET /api/gateways`
    pub async fn fetch_gateways(&self) -> Result<Vec<Gateway>, ApiError> {
        let envelope: GatewayListEnvelope = self.get_json("/api/gateways", &[]).await?;
        Ok(envelope.gateways)
    }

    /// `GET /api/services/performance` — the whole-window summary used by
    /// the response-time table. A missing list is an empty snapshot.
    pub async fn fetch_performance_summary(&self) -> Result<Vec<ServicePerformance>, ApiError> {
        let envelope: PerformanceListEnvelope =
            self.get_json("/api/services/performance", &[]).await?;
        Ok(envelope.services)
    }

    /// `GET /api/performance/{service}?start=&end=`
    pub async fn fetch_performance_detail(
        &self,
        service: &str,
        start: &str,
        end: &str,
    ) -> Result<PerformanceDetail, ApiError> {
        self.get_json(
            &format!("/api/performance/{}", service),
            &[("start", start), ("end", end)],
        )
        .await
    }

    /// `GET /api/export/servers` — binary spreadsheet of all processes.
    pub async fn export_processes_file(&self) -> Result<ExportFile, ApiError> {
        self.export("/api/export/servers", "servers.xlsx").await
    }

    /// `GET /api/export/services` — binary spreadsheet of all services.
    pub async fn export_services_file(&self) -> Result<ExportFile, ApiError> {
        self.export("/api/export/services", "services.xlsx").await
    }

    async fn export(&self, path: &str, fallback_name: &str) -> Result<ExportFile, ApiError> {
        let response = self.get(path, &[]).await?;
        let filename = response
            .headers()
            .get(reqwest::header::CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(content_disposition_filename)
            .unwrap_or_else(|| fallback_name.to_string());
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        Ok(ExportFile {
            filename,
            bytes: bytes.to_vec(),
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ApiError> {
        let response = self.get(path, query).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::InvalidResponse(e.to_string()))
    }

    /// Issue an authenticated GET and normalize the failure modes.
    async fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<reqwest::Response, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.http.get(&url);
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(token) = self.session.credential() {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ApiError::from_transport(e, self.timeout_seconds))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            // Idempotent: concurrent 401s clear once, observers see one
            // transition.
            self.session.clear();
            tracing::warn!(path, "credential rejected by backend, session cleared");
            return Err(ApiError::SessionExpired);
        }
        if !status.is_success() {
            return Err(self.http_error(status, response).await);
        }
        Ok(response)
    }

    async fn http_error(&self, status: StatusCode, response: reqwest::Response) -> ApiError {
        let message = match response.text().await {
            Ok(body) => serde_json::from_str::<ErrorBody>(&body)
                .ok()
                .and_then(|b| b.detail)
                .unwrap_or_else(|| format!("request failed with status {}", status.as_u16())),
            Err(_) => format!("request failed with status {}", status.as_u16()),
        };
        ApiError::Http {
            status: status.as_u16(),
            message,
        }
    }
}

/// Recover a filename from a `Content-Disposition` style header value.
fn content_disposition_filename(value: &str) -> Option<String> {
    let (_, rest) = value.split_once("filename=")?;
    let name = rest
        .split(';')
        .next()
        .unwrap_or(rest)
        .trim()
        .trim_matches('"');
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_disposition_plain() {
        assert_eq!(
            content_disposition_filename("attachment; filename=servers_20260807.xlsx"),
            Some("servers_20260807.xlsx".to_string())
        );
    }

    #[test]
    fn test_content_disposition_quoted() {
        assert_eq!(
            content_disposition_filename("attachment; filename=\"services.xlsx\"; size=123"),
            Some("services.xlsx".to_string())
        );
    }

    #[test]
    fn test_content_disposition_absent() {
        assert_eq!(content_disposition_filename("attachment"), None);
        assert_eq!(content_disposition_filename("attachment; filename="), None);
    }
}
