//! Per-tenant connection pool registry.

use dashmap::DashMap;
use hivebase_core::{HivebaseError, HivebaseResult};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::path::Path;
use tracing::info;

/// The bind key every deployment is guaranteed to have.
pub const DEFAULT_BIND: &str = "default";

/// Registry of tenant database binds: one `SqlitePool` per bind key.
///
/// Lookups for unknown keys fall back to the `default` bind, matching the
/// behavior of the request path (a request for an unregistered tenant is
/// served from the default database rather than failing).
pub struct TenantBinds {
    pools: DashMap<String, SqlitePool>,
    max_connections: u32,
    busy_timeout_ms: u64,
}

impl TenantBinds {
    /// Open the default bind and create the registry around it.
    pub async fn open(
        default_url: &str,
        max_connections: u32,
        busy_timeout_ms: u64,
    ) -> HivebaseResult<Self> {
        let binds = Self {
            pools: DashMap::new(),
            max_connections,
            busy_timeout_ms,
        };
        let pool = binds.open_pool(default_url).await?;
        binds.pools.insert(DEFAULT_BIND.to_string(), pool);
        Ok(binds)
    }

    /// Connect a pool for `url`, creating the database file when missing.
    async fn open_pool(&self, url: &str) -> HivebaseResult<SqlitePool> {
        // sqlite://path?mode=rwc creates the file; make sure the parent
        // directory exists first.
        if let Some(path) = url
            .strip_prefix("sqlite://")
            .map(|rest| rest.split('?').next().unwrap_or(rest))
        {
            if !path.is_empty() && path != ":memory:" {
                if let Some(parent) = Path::new(path).parent() {
                    std::fs::create_dir_all(parent)?;
                }
            }
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(self.max_connections)
            .connect(url)
            .await?;

        sqlx::query("PRAGMA foreign_keys = ON").execute(&pool).await?;
        sqlx::query("PRAGMA journal_mode = WAL").execute(&pool).await?;
        let pragma = format!("PRAGMA busy_timeout = {}", self.busy_timeout_ms);
        sqlx::query(&pragma).execute(&pool).await?;

        Ok(pool)
    }

    /// Register (or replace) a bind. Last write wins: re-registering an
    /// existing key swaps in the new pool and drops the old one.
    pub async fn register(&self, bind_key: &str, url: &str) -> HivebaseResult<SqlitePool> {
        let pool = self.open_pool(url).await?;
        let replaced = self
            .pools
            .insert(bind_key.to_string(), pool.clone())
            .is_some();
        if replaced {
            info!(bind = %bind_key, "Replaced tenant bind");
        } else {
            info!(bind = %bind_key, "Registered tenant bind");
        }
        Ok(pool)
    }

    /// Remove a bind. The default bind cannot be removed.
    pub fn unregister(&self, bind_key: &str) -> HivebaseResult<()> {
        if bind_key == DEFAULT_BIND {
            return Err(HivebaseError::Validation(
                "the default bind cannot be removed".to_string(),
            ));
        }
        self.pools
            .remove(bind_key)
            .map(|_| ())
            .ok_or_else(|| HivebaseError::TenantNotFound(bind_key.to_string()))
    }

    /// Pool for `bind_key`, falling back to the default bind when unknown.
    pub fn pool(&self, bind_key: &str) -> SqlitePool {
        self.pools
            .get(bind_key)
            .or_else(|| self.pools.get(DEFAULT_BIND))
            .map(|entry| entry.value().clone())
            .expect("default bind always present")
    }

    /// Pool for `bind_key`, erroring on unknown keys instead of falling back.
    pub fn pool_strict(&self, bind_key: &str) -> HivebaseResult<SqlitePool> {
        self.pools
            .get(bind_key)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| HivebaseError::TenantNotFound(bind_key.to_string()))
    }

    /// Pool of the default bind.
    pub fn default_pool(&self) -> SqlitePool {
        self.pool(DEFAULT_BIND)
    }

    pub fn contains(&self, bind_key: &str) -> bool {
        self.pools.contains_key(bind_key)
    }

    /// Registered bind keys, default included.
    pub fn bind_keys(&self) -> Vec<String> {
        self.pools.iter().map(|e| e.key().clone()).collect()
    }

    /// Derive the database URL for a tenant stored under `data_dir`.
    pub fn tenant_url(data_dir: &str, tenant: &str) -> String {
        format!("sqlite://{data_dir}/{tenant}.db?mode=rwc")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn memory_binds() -> TenantBinds {
        TenantBinds::open("sqlite::memory:", 5, 1000)
            .await
            .expect("open in-memory binds")
    }

    #[tokio::test]
    async fn test_unknown_bind_falls_back_to_default() {
        let binds = memory_binds().await;
        assert!(binds.contains(DEFAULT_BIND));
        assert!(!binds.contains("acme"));

        // Falls back rather than panicking or erroring.
        let _pool = binds.pool("acme");
        assert!(binds.pool_strict("acme").is_err());
    }

    #[tokio::test]
    async fn test_register_is_last_write_wins() {
        let binds = memory_binds().await;
        binds.register("acme", "sqlite::memory:").await.unwrap();
        assert!(binds.contains("acme"));

        // Re-registering replaces the pool without error.
        binds.register("acme", "sqlite::memory:").await.unwrap();
        assert!(binds.pool_strict("acme").is_ok());
    }

    #[tokio::test]
    async fn test_default_bind_cannot_be_unregistered() {
        let binds = memory_binds().await;
        assert!(binds.unregister(DEFAULT_BIND).is_err());
        assert!(binds.unregister("missing").is_err());

        binds.register("acme", "sqlite::memory:").await.unwrap();
        binds.unregister("acme").unwrap();
        assert!(!binds.contains("acme"));
    }

    #[test]
    fn test_tenant_url() {
        assert_eq!(
            TenantBinds::tenant_url("./data", "acme"),
            "sqlite://./data/acme.db?mode=rwc"
        );
    }
}
