//! Wire types for the TPOps REST backend.
//!
//! Field names mirror the backend JSON exactly. Role-restricted fields are
//! `Option`s: the backend omits them for non-elevated roles, and a missing
//! field means "hidden by policy", not "unset".

use crate::session::Identity;
use serde::{Deserialize, Serialize};

/// `POST /api/auth/login` response.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub token_type: String,
    pub user: Identity,
}

/// Domain-wide configuration summary from `GET /api/config`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainSummary {
    #[serde(default)]
    pub domain_id: String,
    #[serde(default)]
    pub domain_name: String,
    #[serde(default)]
    pub domain_shmkey: Option<String>,
    #[serde(default)]
    pub domain_tportno: Option<String>,
    #[serde(default)]
    pub domain_racport: Option<String>,
    #[serde(default)]
    pub domain_maxuser: Option<String>,
    #[serde(default)]
    pub domain_maxnode: Option<String>,
    #[serde(default)]
    pub domain_maxsvg: Option<String>,
    #[serde(default)]
    pub domain_maxsvr: Option<String>,
    #[serde(default)]
    pub domain_maxsvc: Option<String>,
    #[serde(default)]
    pub domain_maxgw: Option<String>,
    #[serde(default)]
    pub domain_maxsession: Option<String>,
    #[serde(default)]
    pub domain_security: Option<String>,
    #[serde(default)]
    pub domain_loglvl: Option<String>,
    #[serde(default)]
    pub total_domains: u64,
    #[serde(default)]
    pub total_nodes: u64,
    #[serde(default)]
    pub total_server_groups: u64,
    #[serde(default)]
    pub total_servers: u64,
    #[serde(default)]
    pub total_services: u64,
    #[serde(default)]
    pub total_gateways: u64,
    #[serde(default)]
    pub nodes: Vec<String>,
    #[serde(default)]
    pub server_groups: Vec<String>,
}

/// Envelope of `GET /api/config`.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigSnapshot {
    pub summary: DomainSummary,
    #[serde(default)]
    pub last_update: String,
}

/// `GET /api/node/{name}` response.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NodeInfo {
    pub node_name: String,
    #[serde(default)]
    pub hostname: String,
    #[serde(default)]
    pub port: String,
    #[serde(default)]
    pub server_groups: Vec<String>,
    #[serde(default)]
    pub max_servers: String,
    #[serde(default)]
    pub max_users: String,
    #[serde(default)]
    pub tmax_home: String,
}

/// Process entry embedded in a server-group detail.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GroupProcess {
    pub name: String,
    #[serde(default)]
    pub min: String,
    #[serde(default)]
    pub max: String,
    #[serde(default)]
    pub restart: String,
}

/// `GET /api/svrgroup/{name}` response.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ServerGroupInfo {
    pub svg_name: String,
    #[serde(default)]
    pub node: String,
    #[serde(default)]
    pub backup: String,
    #[serde(default)]
    pub cousin: String,
    #[serde(default)]
    pub restart: String,
    #[serde(default)]
    pub autobackup: String,
    #[serde(default)]
    pub servers: Vec<GroupProcess>,
}

/// One row of a process search result (`GET /api/servers?search=`).
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProcessRow {
    pub name: String,
    #[serde(default)]
    pub svg: String,
    #[serde(default)]
    pub min: String,
    #[serde(default)]
    pub max: String,
    #[serde(default)]
    pub restart: String,
    #[serde(default)]
    pub node: String,
    /// Capacity counter, elevated roles only
    #[serde(default)]
    pub maxqcount: Option<String>,
    /// Capacity counter, elevated roles only
    #[serde(default)]
    pub asqcount: Option<String>,
    /// Database binding, elevated roles only
    #[serde(default)]
    pub db_info: Option<String>,
}

/// One row of a service search result (`GET /api/services?search=`).
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ServiceRow {
    pub name: String,
    /// Owning process; absent when embedded in a process detail.
    #[serde(default)]
    pub server: String,
    #[serde(default)]
    pub timeout: String,
    #[serde(default)]
    pub autotran: String,
    #[serde(default)]
    pub export: String,
}

/// `GET /api/server/{name}` detail; embeds the services it hosts.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProcessDetail {
    pub name: String,
    #[serde(default)]
    pub svg_name: String,
    #[serde(default)]
    pub node_name: String,
    #[serde(default)]
    pub min_proc: String,
    #[serde(default)]
    pub max_proc: String,
    #[serde(default)]
    pub restart: String,
    #[serde(default)]
    pub maxqcount: Option<String>,
    #[serde(default)]
    pub asqcount: Option<String>,
    #[serde(default)]
    pub db_info: Option<String>,
    #[serde(default)]
    pub services: Vec<ServiceRow>,
}

/// Owning-process summary embedded in a service detail.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OwningProcess {
    #[serde(default)]
    pub svg_name: String,
    #[serde(default)]
    pub node_name: String,
    #[serde(default)]
    pub min_proc: String,
    #[serde(default)]
    pub max_proc: String,
}

/// `GET /api/service/{name}` detail.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ServiceDetail {
    pub name: String,
    #[serde(default)]
    pub server_name: String,
    #[serde(default)]
    pub timeout: String,
    #[serde(default)]
    pub autotran: String,
    #[serde(default)]
    pub export: String,
    #[serde(default)]
    pub server_info: Option<OwningProcess>,
}

/// One gateway from `GET /api/gateways`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Gateway {
    pub name: String,
    #[serde(default)]
    pub node: String,
    #[serde(default)]
    pub port: Option<String>,
    #[serde(default)]
    pub remote_addr: Option<String>,
    #[serde(default)]
    pub remote_port: Option<String>,
    #[serde(default)]
    pub direction: Option<String>,
    #[serde(default)]
    pub gw_type: Option<String>,
    #[serde(default)]
    pub backup_addr: Option<String>,
    #[serde(default)]
    pub backup_port: Option<String>,
    #[serde(default)]
    pub cpc: Option<String>,
    #[serde(default)]
    pub restart: Option<String>,
}

/// One of the slowest observed transactions in the detail window.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SlowTransaction {
    pub timestamp: String,
    pub duration: f64,
    #[serde(default)]
    pub status: String,
}

/// One bucket of the response-time series.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSeriesPoint {
    pub timestamp: String,
    pub avg_duration: f64,
    pub count: u64,
}

/// `GET /api/performance/{service}?start=&end=` response.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceDetail {
    pub avg_time: f64,
    pub min_time: f64,
    pub max_time: f64,
    #[serde(default)]
    pub median_time: f64,
    pub count: u64,
    #[serde(default)]
    pub slow_transactions: Vec<SlowTransaction>,
    #[serde(default)]
    pub time_series_data: Vec<TimeSeriesPoint>,
}

/// Binary spreadsheet payload plus the filename the backend suggested.
#[derive(Debug, Clone)]
pub struct ExportFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}
