//! Tenant registry repository (default bind only).

use crate::models::TenantRow;
use chrono::Utc;
use hivebase_core::{HivebaseError, HivebaseResult};
use sqlx::SqlitePool;

pub async fn list(pool: &SqlitePool) -> HivebaseResult<Vec<TenantRow>> {
    let rows = sqlx::query_as::<_, TenantRow>("SELECT * FROM tenants ORDER BY name")
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

pub async fn get_by_name(pool: &SqlitePool, name: &str) -> HivebaseResult<TenantRow> {
    sqlx::query_as::<_, TenantRow>("SELECT * FROM tenants WHERE name = ?")
        .bind(name)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| HivebaseError::TenantNotFound(name.to_string()))
}

pub async fn create(
    pool: &SqlitePool,
    name: &str,
    description: Option<&str>,
    database_url: &str,
) -> HivebaseResult<TenantRow> {
    let now = Utc::now();
    sqlx::query(
        "INSERT INTO tenants (name, description, database_url, suspended, created_at, updated_at)
         VALUES (?, ?, ?, 0, ?, ?)",
    )
    .bind(name)
    .bind(description)
    .bind(database_url)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;
    get_by_name(pool, name).await
}

pub async fn set_suspended(
    pool: &SqlitePool,
    name: &str,
    suspended: bool,
) -> HivebaseResult<TenantRow> {
    let updated = sqlx::query("UPDATE tenants SET suspended = ?, updated_at = ? WHERE name = ?")
        .bind(suspended)
        .bind(Utc::now())
        .bind(name)
        .execute(pool)
        .await?
        .rows_affected();
    if updated == 0 {
        return Err(HivebaseError::TenantNotFound(name.to_string()));
    }
    get_by_name(pool, name).await
}

pub async fn delete(pool: &SqlitePool, name: &str) -> HivebaseResult<()> {
    let deleted = sqlx::query("DELETE FROM tenants WHERE name = ?")
        .bind(name)
        .execute(pool)
        .await?
        .rows_affected();
    if deleted == 0 {
        return Err(HivebaseError::TenantNotFound(name.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema;
    use sqlx::sqlite::SqlitePoolOptions;

    #[tokio::test]
    async fn test_tenant_registry_roundtrip() {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        schema::create_tables(&pool).await.unwrap();

        let row = create(&pool, "acme", Some("Acme Corp"), "sqlite://data/acme.db?mode=rwc")
            .await
            .unwrap();
        assert!(!row.suspended);

        let row = set_suspended(&pool, "acme", true).await.unwrap();
        assert!(row.suspended);

        delete(&pool, "acme").await.unwrap();
        assert!(get_by_name(&pool, "acme").await.is_err());
    }
}
