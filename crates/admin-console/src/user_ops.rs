//! User administration across tenant binds.

use hivebase_core::{HivebaseError, HivebaseResult};
use hivebase_store::models::UserRow;
use hivebase_store::repo::{audit, users};
use hivebase_store::TenantBinds;
use hivebase_platform::auth::hash_password;
use std::sync::Arc;

pub struct UserOps {
    binds: Arc<TenantBinds>,
    password_min_length: usize,
}

impl UserOps {
    pub fn new(binds: Arc<TenantBinds>, password_min_length: usize) -> Self {
        Self {
            binds,
            password_min_length,
        }
    }

    pub async fn list(&self, tenant: &str) -> HivebaseResult<Vec<UserRow>> {
        users::list(&self.binds.pool(tenant)).await
    }

    pub async fn deactivate(&self, actor: &str, tenant: &str, id: i64) -> HivebaseResult<UserRow> {
        let user = users::set_active(&self.binds.pool(tenant), id, false).await?;
        audit::record(
            &self.binds.default_pool(),
            actor,
            tenant,
            "user.deactivate",
            &id.to_string(),
        )
        .await?;
        Ok(user)
    }

    pub async fn reactivate(&self, actor: &str, tenant: &str, id: i64) -> HivebaseResult<UserRow> {
        let user = users::set_active(&self.binds.pool(tenant), id, true).await?;
        audit::record(
            &self.binds.default_pool(),
            actor,
            tenant,
            "user.reactivate",
            &id.to_string(),
        )
        .await?;
        Ok(user)
    }

    pub async fn reset_password(
        &self,
        actor: &str,
        tenant: &str,
        id: i64,
        new_password: &str,
    ) -> HivebaseResult<()> {
        if new_password.len() < self.password_min_length {
            return Err(HivebaseError::Validation(format!(
                "password must be at least {} characters",
                self.password_min_length
            )));
        }
        users::set_password_hash(&self.binds.pool(tenant), id, &hash_password(new_password))
            .await?;
        audit::record(
            &self.binds.default_pool(),
            actor,
            tenant,
            "user.reset_password",
            &id.to_string(),
        )
        .await?;
        Ok(())
    }

    pub async fn assign_role(
        &self,
        actor: &str,
        tenant: &str,
        id: i64,
        role: &str,
    ) -> HivebaseResult<()> {
        users::assign_role(&self.binds.pool(tenant), id, role).await?;
        audit::record(
            &self.binds.default_pool(),
            actor,
            tenant,
            "user.assign_role",
            &format!("{id}:{role}"),
        )
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hivebase_store::schema;

    async fn ops() -> UserOps {
        let binds = TenantBinds::open("sqlite::memory:", 1, 1000).await.unwrap();
        schema::create_tables(&binds.default_pool()).await.unwrap();
        UserOps::new(Arc::new(binds), 12)
    }

    #[tokio::test]
    async fn test_deactivate_and_reset_password() {
        let ops = ops().await;
        let pool = ops.binds.default_pool();
        let user = users::create(&pool, "u@example.com", &hash_password("longenoughpass"))
            .await
            .unwrap();

        let user = ops.deactivate("admin", "default", user.id).await.unwrap();
        assert!(!user.active);

        assert!(ops
            .reset_password("admin", "default", user.id, "short")
            .await
            .is_err());
        ops.reset_password("admin", "default", user.id, "anotherlongpass")
            .await
            .unwrap();

        let entries = audit::recent(&pool, 10).await.unwrap();
        assert_eq!(entries.len(), 2);
    }
}
