//! Extension/plugin row repository.

use crate::models::UnitRow;
use chrono::Utc;
use hivebase_core::{HivebaseError, HivebaseResult};
use sqlx::SqlitePool;

/// Which of the two unit tables to address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitTable {
    Extensions,
    Plugins,
}

impl UnitTable {
    fn name(self) -> &'static str {
        match self {
            UnitTable::Extensions => "extensions",
            UnitTable::Plugins => "plugins",
        }
    }
}

pub async fn list(pool: &SqlitePool, table: UnitTable) -> HivebaseResult<Vec<UnitRow>> {
    let sql = format!("SELECT * FROM {} ORDER BY name", table.name());
    let rows = sqlx::query_as::<_, UnitRow>(&sql).fetch_all(pool).await?;
    Ok(rows)
}

/// Names of enabled units, the database-backed enabled-set source.
pub async fn enabled_names(pool: &SqlitePool, table: UnitTable) -> HivebaseResult<Vec<String>> {
    let sql = format!(
        "SELECT name FROM {} WHERE enabled = 1 ORDER BY name",
        table.name()
    );
    let names = sqlx::query_scalar::<_, String>(&sql).fetch_all(pool).await?;
    Ok(names)
}

/// Insert the row if missing, otherwise leave it untouched. Used to make
/// the catalog of compiled-in units visible to the admin console.
pub async fn ensure_row(pool: &SqlitePool, table: UnitTable, name: &str) -> HivebaseResult<()> {
    let now = Utc::now();
    let sql = format!(
        "INSERT OR IGNORE INTO {} (name, kwargs, enabled, created_at, updated_at)
         VALUES (?, '{{}}', 0, ?, ?)",
        table.name()
    );
    sqlx::query(&sql)
        .bind(name)
        .bind(now)
        .bind(now)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn set_enabled(
    pool: &SqlitePool,
    table: UnitTable,
    name: &str,
    enabled: bool,
) -> HivebaseResult<UnitRow> {
    ensure_row(pool, table, name).await?;
    let sql = format!(
        "UPDATE {} SET enabled = ?, updated_at = ? WHERE name = ?",
        table.name()
    );
    sqlx::query(&sql)
        .bind(enabled)
        .bind(Utc::now())
        .bind(name)
        .execute(pool)
        .await?;

    let sql = format!("SELECT * FROM {} WHERE name = ?", table.name());
    sqlx::query_as::<_, UnitRow>(&sql)
        .bind(name)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| HivebaseError::UnitNotFound(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        schema::create_tables(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn test_enable_disable_cycle() {
        let pool = pool().await;

        let row = set_enabled(&pool, UnitTable::Plugins, "health", true)
            .await
            .unwrap();
        assert!(row.enabled);
        assert_eq!(
            enabled_names(&pool, UnitTable::Plugins).await.unwrap(),
            vec!["health"]
        );

        // Extensions table is independent of the plugins table.
        assert!(enabled_names(&pool, UnitTable::Extensions)
            .await
            .unwrap()
            .is_empty());

        let row = set_enabled(&pool, UnitTable::Plugins, "health", false)
            .await
            .unwrap();
        assert!(!row.enabled);
    }

    #[tokio::test]
    async fn test_ensure_row_keeps_existing_state() {
        let pool = pool().await;
        set_enabled(&pool, UnitTable::Extensions, "auth", true)
            .await
            .unwrap();
        ensure_row(&pool, UnitTable::Extensions, "auth").await.unwrap();

        let rows = list(&pool, UnitTable::Extensions).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert!(rows[0].enabled);
    }
}
