//! Row models for the bootstrap schema.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserRow {
    pub id: i64,
    pub email: String,
    /// `salt$hash` of the password, never the password itself.
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RoleRow {
    pub id: i64,
    pub name: String,
    /// Comma-separated permission names.
    pub permissions: String,
    pub created_at: DateTime<Utc>,
}

impl RoleRow {
    pub fn permission_list(&self) -> Vec<String> {
        self.permissions
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// A registered extension or plugin row. Which table it lives in decides
/// the kind.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UnitRow {
    pub id: i64,
    pub name: String,
    /// JSON blob of unit-specific options.
    pub kwargs: String,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Tenant registry row on the default bind: name plus connection info.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TenantRow {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub database_url: String,
    pub suspended: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SettingRow {
    pub key: String,
    pub value: String,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AuditRow {
    pub id: i64,
    pub actor: String,
    pub tenant: String,
    pub action: String,
    pub detail: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_permission_list() {
        let role = RoleRow {
            id: 1,
            name: "editor".to_string(),
            permissions: "read, write ,".to_string(),
            created_at: Utc::now(),
        };
        assert_eq!(role.permission_list(), vec!["read", "write"]);
    }
}
