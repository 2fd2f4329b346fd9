//! Typed access to the per-tenant settings table.

use hivebase_core::value::parse_boolish;
use hivebase_core::HivebaseResult;
use hivebase_store::models::SettingRow;
use hivebase_store::repo::{audit, settings};
use hivebase_store::TenantBinds;
use std::sync::Arc;

pub struct SystemSettings {
    binds: Arc<TenantBinds>,
}

impl SystemSettings {
    pub fn new(binds: Arc<TenantBinds>) -> Self {
        Self { binds }
    }

    pub async fn all(&self, tenant: &str) -> HivebaseResult<Vec<SettingRow>> {
        settings::all(&self.binds.pool(tenant)).await
    }

    pub async fn get(&self, tenant: &str, key: &str) -> HivebaseResult<Option<String>> {
        settings::get(&self.binds.pool(tenant), key).await
    }

    pub async fn get_bool(&self, tenant: &str, key: &str) -> HivebaseResult<Option<bool>> {
        match settings::get(&self.binds.pool(tenant), key).await? {
            Some(value) => Ok(Some(parse_boolish(&value)?)),
            None => Ok(None),
        }
    }

    pub async fn set(
        &self,
        actor: &str,
        tenant: &str,
        key: &str,
        value: &str,
    ) -> HivebaseResult<()> {
        settings::set(&self.binds.pool(tenant), key, value).await?;
        audit::record(&self.binds.default_pool(), actor, tenant, "setting.set", key).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hivebase_store::schema;

    #[tokio::test]
    async fn test_typed_get() {
        let binds = TenantBinds::open("sqlite::memory:", 1, 1000).await.unwrap();
        schema::create_tables(&binds.default_pool()).await.unwrap();
        let sys = SystemSettings::new(Arc::new(binds));

        sys.set("admin", "default", "feature.beta", "yes").await.unwrap();
        assert_eq!(sys.get_bool("default", "feature.beta").await.unwrap(), Some(true));
        assert_eq!(sys.get_bool("default", "missing").await.unwrap(), None);

        sys.set("admin", "default", "feature.beta", "not-a-bool")
            .await
            .unwrap();
        assert!(sys.get_bool("default", "feature.beta").await.is_err());
    }
}
