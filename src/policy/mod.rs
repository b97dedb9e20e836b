//! Role policy
//!
//! Pure mapping from a user role to the tabs and capabilities the console
//! renders. Nothing here is cached: every caller recomputes from the
//! current identity, so a role change can never observe stale policy.


use serde::{Deserialize, Serialize};
use std::fmt;

/// Role carried by an authenticated identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Monitoring,
    Service,
    Infrastructure,
    Admin,
}

impl Role {
    /// Roles allowed to see domain configuration, gateways, restricted
    /// process fields, and the bulk export action.
    pub fn is_elevated(self) -> bool {
        matches!(self, Role::Infrastructure | Role::Admin)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Monitoring => "monitoring",
            Role::Service => "service",
            Role::Infrastructure => "infrastructure",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Top-level console tabs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    DomainConfig,
    Gateways,
    Processes,
    Services,
    ResponseTime,
}

impl Tab {
    pub fn title(self) -> &'static str {
        match self {
            Tab::DomainConfig => "Domain",
            Tab::Gateways => "Gateways",
            Tab::Processes => "Processes",
            Tab::Services => "Services (TR)",
            Tab::ResponseTime => "Response Time",
        }
    }
}

/// Ordered set of tabs visible to a role.
///
/// Base tabs are always present; domain configuration and gateways are
/// prepended for elevated roles.
pub fn tabs_for(role: Role) -> Vec<Tab> {
    let mut tabs = vec![Tab::Processes, Tab::Services, Tab::ResponseTime];
    if role.is_elevated() {
        tabs.insert(0, Tab::DomainConfig);
        tabs.insert(1, Tab::Gateways);
    }
    tabs
}

/// Capability flags derived from a role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// May trigger the bulk spreadsheet export. The export still requires
    /// an explicit confirmation step for every role.
    pub can_export: bool,
    /// May see capacity counters and database bindings on process rows.
    pub can_see_restricted_fields: bool,
}

pub fn capabilities_for(role: Role) -> Capabilities {
    Capabilities {
        can_export: role.is_elevated(),
        can_see_restricted_fields: role.is_elevated(),
    }
}
