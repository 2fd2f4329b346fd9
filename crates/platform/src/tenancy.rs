//! Per-request tenant resolution.
//!
//! A tenant ("organization") is chosen once per request: the
//! `organization` query parameter wins, otherwise a subdomain of the form
//! `tenant.example.com`, otherwise `default`. The selection is immutable
//! once made; middleware attaches it to the request and nothing downstream
//! re-resolves.

use serde::{Deserialize, Serialize};
use tracing::info;

/// The bind key used when nothing selects a tenant.
pub const DEFAULT_TENANT: &str = "default";

/// How the tenant was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TenantSource {
    QueryParam,
    Subdomain,
    Default,
}

/// An immutable per-request tenant selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantSelection {
    pub name: String,
    pub source: TenantSource,
    /// True when the selected tenant had no registered bind and the request
    /// is served from the default database.
    pub fell_back: bool,
}

impl TenantSelection {
    pub fn default_tenant() -> Self {
        Self {
            name: DEFAULT_TENANT.to_string(),
            source: TenantSource::Default,
            fell_back: false,
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TenantResolver;

impl TenantResolver {
    /// Resolve the tenant for a request.
    ///
    /// `host` is the value of the Host header (port suffix allowed);
    /// `organization_param` the `organization` query parameter if present.
    pub fn resolve(&self, host: &str, organization_param: Option<&str>) -> TenantSelection {
        if let Some(org) = organization_param.filter(|o| !o.is_empty()) {
            info!(organization = %org, "Organization set from query parameter");
            return TenantSelection {
                name: org.to_string(),
                source: TenantSource::QueryParam,
                fell_back: false,
            };
        }

        let host = host.split(':').next().unwrap_or(host);
        let labels: Vec<&str> = host.split('.').collect();
        if labels.len() == 3 && labels[0] != "www" && !labels[0].is_empty() {
            info!(organization = %labels[0], "Organization set from subdomain");
            return TenantSelection {
                name: labels[0].to_string(),
                source: TenantSource::Subdomain,
                fell_back: false,
            };
        }

        TenantSelection::default_tenant()
    }
}
