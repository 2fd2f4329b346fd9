//! Idempotent schema bootstrap.
//!
//! Every bind gets the same schema so a tenant database is usable the
//! moment its bind is registered. All statements are `IF NOT EXISTS` and
//! safe to re-run.

use hivebase_core::HivebaseResult;
use sqlx::SqlitePool;
use tracing::info;

/// Create all bootstrap tables on `pool`.
pub async fn create_tables(pool: &SqlitePool) -> HivebaseResult<()> {
    create_users_table(pool).await?;
    create_roles_table(pool).await?;
    create_roles_users_table(pool).await?;
    create_extensions_table(pool).await?;
    create_plugins_table(pool).await?;
    create_tenants_table(pool).await?;
    create_settings_table(pool).await?;
    create_audit_log_table(pool).await?;
    Ok(())
}

async fn create_users_table(pool: &SqlitePool) -> HivebaseResult<()> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            email TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            active INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
    )
    .execute(pool)
    .await?;
    Ok(())
}

async fn create_roles_table(pool: &SqlitePool) -> HivebaseResult<()> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS roles (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            permissions TEXT NOT NULL DEFAULT '',
            created_at TEXT NOT NULL
        )",
    )
    .execute(pool)
    .await?;
    Ok(())
}

async fn create_roles_users_table(pool: &SqlitePool) -> HivebaseResult<()> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS roles_users (
            user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            role_id INTEGER NOT NULL REFERENCES roles(id) ON DELETE CASCADE,
            PRIMARY KEY (user_id, role_id)
        )",
    )
    .execute(pool)
    .await?;
    Ok(())
}

async fn create_extensions_table(pool: &SqlitePool) -> HivebaseResult<()> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS extensions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            kwargs TEXT NOT NULL DEFAULT '{}',
            enabled INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
    )
    .execute(pool)
    .await?;
    Ok(())
}

async fn create_plugins_table(pool: &SqlitePool) -> HivebaseResult<()> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS plugins (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            kwargs TEXT NOT NULL DEFAULT '{}',
            enabled INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
    )
    .execute(pool)
    .await?;
    Ok(())
}

async fn create_tenants_table(pool: &SqlitePool) -> HivebaseResult<()> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS tenants (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            description TEXT,
            database_url TEXT NOT NULL,
            suspended INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
    )
    .execute(pool)
    .await?;
    Ok(())
}

async fn create_settings_table(pool: &SqlitePool) -> HivebaseResult<()> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
    )
    .execute(pool)
    .await?;
    Ok(())
}

async fn create_audit_log_table(pool: &SqlitePool) -> HivebaseResult<()> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS audit_log (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            actor TEXT NOT NULL,
            tenant TEXT NOT NULL,
            action TEXT NOT NULL,
            detail TEXT NOT NULL DEFAULT '',
            created_at TEXT NOT NULL
        )",
    )
    .execute(pool)
    .await?;
    Ok(())
}

/// Seed the admin user and role when no user exists yet.
///
/// `password_hash` is a pre-hashed credential (the store never sees the
/// cleartext password).
pub async fn seed_admin(
    pool: &SqlitePool,
    email: &str,
    password_hash: &str,
) -> HivebaseResult<()> {
    let user_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await?;
    if user_count > 0 {
        return Ok(());
    }

    let now = chrono::Utc::now();
    sqlx::query("INSERT INTO users (email, password_hash, active, created_at, updated_at) VALUES (?, ?, 1, ?, ?)")
        .bind(email)
        .bind(password_hash)
        .bind(now)
        .bind(now)
        .execute(pool)
        .await?;

    sqlx::query("INSERT OR IGNORE INTO roles (name, permissions, created_at) VALUES ('admin', 'any', ?)")
        .bind(now)
        .execute(pool)
        .await?;

    sqlx::query(
        "INSERT OR IGNORE INTO roles_users (user_id, role_id)
         SELECT u.id, r.id FROM users u, roles r WHERE u.email = ? AND r.name = 'admin'",
    )
    .bind(email)
    .execute(pool)
    .await?;

    info!(email = %email, "Seeded admin user");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn memory_pool() -> SqlitePool {
        SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("connect in-memory sqlite")
    }

    #[tokio::test]
    async fn test_create_tables_is_idempotent() {
        let pool = memory_pool().await;
        create_tables(&pool).await.unwrap();
        create_tables(&pool).await.unwrap();
    }

    #[tokio::test]
    async fn test_seed_admin_only_on_empty_database() {
        let pool = memory_pool().await;
        create_tables(&pool).await.unwrap();

        seed_admin(&pool, "admin", "salt$hash").await.unwrap();
        seed_admin(&pool, "other", "salt$hash").await.unwrap();

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 1);

        let roles: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM roles_users")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(roles, 1);
    }
}
