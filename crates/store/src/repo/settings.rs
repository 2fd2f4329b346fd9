//! Key/value settings repository, per tenant bind.

use crate::models::SettingRow;
use chrono::Utc;
use hivebase_core::HivebaseResult;
use sqlx::SqlitePool;

pub async fn all(pool: &SqlitePool) -> HivebaseResult<Vec<SettingRow>> {
    let rows = sqlx::query_as::<_, SettingRow>("SELECT * FROM settings ORDER BY key")
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

pub async fn get(pool: &SqlitePool, key: &str) -> HivebaseResult<Option<String>> {
    let value = sqlx::query_scalar::<_, String>("SELECT value FROM settings WHERE key = ?")
        .bind(key)
        .fetch_optional(pool)
        .await?;
    Ok(value)
}

pub async fn set(pool: &SqlitePool, key: &str, value: &str) -> HivebaseResult<()> {
    sqlx::query(
        "INSERT INTO settings (key, value, updated_at) VALUES (?, ?, ?)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
    )
    .bind(key)
    .bind(value)
    .bind(Utc::now())
    .execute(pool)
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema;
    use sqlx::sqlite::SqlitePoolOptions;

    #[tokio::test]
    async fn test_set_get_upsert() {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        schema::create_tables(&pool).await.unwrap();

        assert_eq!(get(&pool, "theme").await.unwrap(), None);
        set(&pool, "theme", "dark").await.unwrap();
        set(&pool, "theme", "light").await.unwrap();
        assert_eq!(get(&pool, "theme").await.unwrap().as_deref(), Some("light"));
        assert_eq!(all(&pool).await.unwrap().len(), 1);
    }
}
