//! Tenant lifecycle: registry rows plus their database binds.

use hivebase_core::{HivebaseError, HivebaseResult};
use hivebase_store::models::TenantRow;
use hivebase_store::repo::{audit, tenants};
use hivebase_store::{schema, TenantBinds};
use std::sync::Arc;
use tracing::{info, warn};

pub struct TenantOps {
    binds: Arc<TenantBinds>,
    data_dir: String,
}

impl TenantOps {
    pub fn new(binds: Arc<TenantBinds>, data_dir: String) -> Self {
        Self { binds, data_dir }
    }

    pub async fn list(&self) -> HivebaseResult<Vec<TenantRow>> {
        tenants::list(&self.binds.default_pool()).await
    }

    pub async fn get(&self, name: &str) -> HivebaseResult<TenantRow> {
        tenants::get_by_name(&self.binds.default_pool(), name).await
    }

    /// Create a tenant: registry row, database bind, and schema, in that
    /// order. The new database is usable when this returns.
    pub async fn create(
        &self,
        actor: &str,
        name: &str,
        description: Option<&str>,
    ) -> HivebaseResult<TenantRow> {
        validate_tenant_name(name)?;

        let url = TenantBinds::tenant_url(&self.data_dir, name);
        let row = tenants::create(&self.binds.default_pool(), name, description, &url).await?;

        let pool = self.binds.register(name, &url).await?;
        schema::create_tables(&pool).await?;

        audit::record(&self.binds.default_pool(), actor, "default", "tenant.create", name).await?;
        info!(tenant = %name, "Tenant created");
        Ok(row)
    }

    pub async fn suspend(&self, actor: &str, name: &str) -> HivebaseResult<TenantRow> {
        let row = tenants::set_suspended(&self.binds.default_pool(), name, true).await?;
        // A suspended tenant keeps its data but loses its bind; requests
        // fall back to the default database.
        if let Err(e) = self.binds.unregister(name) {
            warn!(tenant = %name, error = %e, "Suspend could not drop bind");
        }
        audit::record(&self.binds.default_pool(), actor, "default", "tenant.suspend", name).await?;
        Ok(row)
    }

    pub async fn reactivate(&self, actor: &str, name: &str) -> HivebaseResult<TenantRow> {
        let row = tenants::set_suspended(&self.binds.default_pool(), name, false).await?;
        self.binds.register(name, &row.database_url).await?;
        audit::record(&self.binds.default_pool(), actor, "default", "tenant.reactivate", name)
            .await?;
        Ok(row)
    }

    /// Remove the registry row and the bind. The database file is left in
    /// place; dropping tenant data is a manual operation.
    pub async fn delete(&self, actor: &str, name: &str) -> HivebaseResult<()> {
        if name == "default" {
            return Err(HivebaseError::Validation(
                "the default tenant cannot be removed".to_string(),
            ));
        }
        tenants::delete(&self.binds.default_pool(), name).await?;
        if let Err(e) = self.binds.unregister(name) {
            warn!(tenant = %name, error = %e, "Delete could not drop bind");
        }
        audit::record(&self.binds.default_pool(), actor, "default", "tenant.delete", name).await?;
        Ok(())
    }

    /// Register a bind for every non-suspended registry row. Used at
    /// startup; bind failures are logged and skipped so one broken tenant
    /// does not take the platform down.
    pub async fn sync_binds_from_registry(&self) -> HivebaseResult<usize> {
        let rows = tenants::list(&self.binds.default_pool()).await?;
        let mut registered = 0;
        for row in rows.iter().filter(|r| !r.suspended) {
            match self.binds.register(&row.name, &row.database_url).await {
                Ok(pool) => match schema::create_tables(&pool).await {
                    Ok(()) => registered += 1,
                    Err(e) => {
                        warn!(tenant = %row.name, error = %e, "Failed to prepare tenant schema");
                        let _ = self.binds.unregister(&row.name);
                    }
                },
                Err(e) => {
                    warn!(tenant = %row.name, error = %e, "Failed to bind tenant database");
                }
            }
        }
        Ok(registered)
    }
}

fn validate_tenant_name(name: &str) -> HivebaseResult<()> {
    if name.is_empty()
        || name == "default"
        || !name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(HivebaseError::Validation(format!(
            "tenant name '{name}' must be lowercase alphanumeric/hyphen and not 'default'"
        )));
    }
    Ok(())
}
