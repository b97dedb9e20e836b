use crate::api::types::{
    DomainSummary, Gateway, NodeInfo, PerformanceDetail, ProcessDetail, ServerGroupInfo,
    ServiceDetail,
};
use crate::perf::format_duration;
use crate::policy::Capabilities;
use chrono::DateTime;

/// Display an optional wire field; absent means hidden or unset.
pub(crate) fn opt_str(value: &Option<String>) -> &str {
    match value {
        Some(v) if !v.is_empty() => v,
        _ => "-",
    }
}

pub(crate) fn non_empty(value: &str) -> &str {
    if value.is_empty() {
        "-"
    } else {
        value
    }
}

/// Humanize the backend's last-update timestamp; falls back to the raw
/// string when it isn't parseable.
pub(crate) fn format_last_update(raw: &str) -> String {
    if raw.is_empty() {
        return "never".to_string();
    }
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|_| raw.to_string())
}

pub(crate) fn domain_summary_rows(summary: &DomainSummary) -> Vec<(&'static str, String)> {
    vec![
        ("Domain", non_empty(&summary.domain_name).to_string()),
        ("Domain ID", non_empty(&summary.domain_id).to_string()),
        ("SHM key", opt_str(&summary.domain_shmkey).to_string()),
        ("Port", opt_str(&summary.domain_tportno).to_string()),
        ("RAC port", opt_str(&summary.domain_racport).to_string()),
        ("Max users", opt_str(&summary.domain_maxuser).to_string()),
        ("Max nodes", opt_str(&summary.domain_maxnode).to_string()),
        ("Max groups", opt_str(&summary.domain_maxsvg).to_string()),
        ("Max servers", opt_str(&summary.domain_maxsvr).to_string()),
        ("Max services", opt_str(&summary.domain_maxsvc).to_string()),
        ("Max gateways", opt_str(&summary.domain_maxgw).to_string()),
        ("Max sessions", opt_str(&summary.domain_maxsession).to_string()),
        ("Security", opt_str(&summary.domain_security).to_string()),
        ("Log level", opt_str(&summary.domain_loglvl).to_string()),
    ]
}

pub(crate) fn stat_badges(summary: &DomainSummary) -> String {
    format!(
        "domains {}  nodes {}  groups {}  servers {}  services {}  gateways {}",
        summary.total_domains,
        summary.total_nodes,
        summary.total_server_groups,
        summary.total_servers,
        summary.total_services,
        summary.total_gateways,
    )
}

pub(crate) fn process_detail_rows(
    detail: &ProcessDetail,
    caps: Capabilities,
) -> Vec<(&'static str, String)> {
    let mut rows = vec![
        ("Process", detail.name.clone()),
        ("Server group", non_empty(&detail.svg_name).to_string()),
        ("Node", non_empty(&detail.node_name).to_string()),
        (
            "Processes",
            format!(
                "{} - {}",
                non_empty(&detail.min_proc),
                non_empty(&detail.max_proc)
            ),
        ),
        ("Restart", non_empty(&detail.restart).to_string()),
    ];
    if caps.can_see_restricted_fields {
        rows.push(("MAXQCOUNT", opt_str(&detail.maxqcount).to_string()));
        rows.push(("ASQCOUNT", opt_str(&detail.asqcount).to_string()));
        rows.push(("DB binding", opt_str(&detail.db_info).to_string()));
    }
    rows
}

pub(crate) fn service_detail_rows(detail: &ServiceDetail) -> Vec<(&'static str, String)> {
    let mut rows = vec![
        ("Service", detail.name.clone()),
        ("Process", non_empty(&detail.server_name).to_string()),
        ("Timeout", non_empty(&detail.timeout).to_string()),
        ("Auto tran", non_empty(&detail.autotran).to_string()),
        ("Export", non_empty(&detail.export).to_string()),
    ];
    if let Some(owner) = &detail.server_info {
        rows.push(("Owner group", non_empty(&owner.svg_name).to_string()));
        rows.push(("Owner node", non_empty(&owner.node_name).to_string()));
        rows.push((
            "Owner procs",
            format!(
                "{} - {}",
                non_empty(&owner.min_proc),
                non_empty(&owner.max_proc)
            ),
        ));
    }
    rows
}

pub(crate) fn node_detail_rows(node: &NodeInfo) -> Vec<(&'static str, String)> {
    vec![
        ("Node", node.node_name.clone()),
        ("Hostname", non_empty(&node.hostname).to_string()),
        ("Port", non_empty(&node.port).to_string()),
        ("Server groups", node.server_groups.join(", ")),
        ("Max servers", non_empty(&node.max_servers).to_string()),
        ("Max users", non_empty(&node.max_users).to_string()),
        ("Home", non_empty(&node.tmax_home).to_string()),
    ]
}

pub(crate) fn group_detail_rows(group: &ServerGroupInfo) -> Vec<(&'static str, String)> {
    let mut rows = vec![
        ("Server group", group.svg_name.clone()),
        ("Node", non_empty(&group.node).to_string()),
        ("Backup", non_empty(&group.backup).to_string()),
        ("Cousin", non_empty(&group.cousin).to_string()),
        ("Restart", non_empty(&group.restart).to_string()),
        ("Auto backup", non_empty(&group.autobackup).to_string()),
    ];
    for server in &group.servers {
        rows.push((
            "Process",
            format!(
                "{} ({} - {}, restart {})",
                server.name,
                non_empty(&server.min),
                non_empty(&server.max),
                non_empty(&server.restart)
            ),
        ));
    }
    rows
}

pub(crate) fn gateway_remote(gateway: &Gateway) -> String {
    match (&gateway.remote_addr, &gateway.remote_port) {
        (Some(addr), Some(port)) if !addr.is_empty() => format!("{}:{}", addr, port),
        (Some(addr), _) if !addr.is_empty() => addr.clone(),
        _ => "-".to_string(),
    }
}

pub(crate) fn gateway_backup(gateway: &Gateway) -> String {
    match (&gateway.backup_addr, &gateway.backup_port) {
        (Some(addr), Some(port)) if !addr.is_empty() => format!("{}:{}", addr, port),
        (Some(addr), _) if !addr.is_empty() => addr.clone(),
        _ => "-".to_string(),
    }
}

pub(crate) fn performance_detail_rows(detail: &PerformanceDetail) -> Vec<(&'static str, String)> {
    let mut rows = vec![
        ("Average", format_duration(Some(detail.avg_time))),
        ("Median", format_duration(Some(detail.median_time))),
        ("Min", format_duration(Some(detail.min_time))),
        ("Max", format_duration(Some(detail.max_time))),
        ("Requests", detail.count.to_string()),
    ];
    for tx in detail.slow_transactions.iter().take(10) {
        rows.push((
            "Slow",
            format!(
                "{}  {}  {}",
                tx.timestamp,
                format_duration(Some(tx.duration)),
                non_empty(&tx.status)
            ),
        ));
    }
    rows
}
