//! User and role repository.

use crate::models::{RoleRow, UserRow};
use chrono::Utc;
use hivebase_core::{HivebaseError, HivebaseResult};
use sqlx::SqlitePool;

pub async fn list(pool: &SqlitePool) -> HivebaseResult<Vec<UserRow>> {
    let users = sqlx::query_as::<_, UserRow>("SELECT * FROM users ORDER BY id")
        .fetch_all(pool)
        .await?;
    Ok(users)
}

pub async fn get(pool: &SqlitePool, id: i64) -> HivebaseResult<UserRow> {
    sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| HivebaseError::NotFound(format!("user {id}")))
}

pub async fn get_by_email(pool: &SqlitePool, email: &str) -> HivebaseResult<Option<UserRow>> {
    let user = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE email = ?")
        .bind(email)
        .fetch_optional(pool)
        .await?;
    Ok(user)
}

pub async fn create(
    pool: &SqlitePool,
    email: &str,
    password_hash: &str,
) -> HivebaseResult<UserRow> {
    let now = Utc::now();
    let id = sqlx::query(
        "INSERT INTO users (email, password_hash, active, created_at, updated_at)
         VALUES (?, ?, 1, ?, ?)",
    )
    .bind(email)
    .bind(password_hash)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?
    .last_insert_rowid();
    get(pool, id).await
}

pub async fn set_active(pool: &SqlitePool, id: i64, active: bool) -> HivebaseResult<UserRow> {
    let updated = sqlx::query("UPDATE users SET active = ?, updated_at = ? WHERE id = ?")
        .bind(active)
        .bind(Utc::now())
        .bind(id)
        .execute(pool)
        .await?
        .rows_affected();
    if updated == 0 {
        return Err(HivebaseError::NotFound(format!("user {id}")));
    }
    get(pool, id).await
}

pub async fn set_password_hash(
    pool: &SqlitePool,
    id: i64,
    password_hash: &str,
) -> HivebaseResult<()> {
    let updated = sqlx::query("UPDATE users SET password_hash = ?, updated_at = ? WHERE id = ?")
        .bind(password_hash)
        .bind(Utc::now())
        .bind(id)
        .execute(pool)
        .await?
        .rows_affected();
    if updated == 0 {
        return Err(HivebaseError::NotFound(format!("user {id}")));
    }
    Ok(())
}

pub async fn delete(pool: &SqlitePool, id: i64) -> HivebaseResult<()> {
    let deleted = sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?
        .rows_affected();
    if deleted == 0 {
        return Err(HivebaseError::NotFound(format!("user {id}")));
    }
    Ok(())
}

/// Roles assigned to a user through the roles_users link table.
pub async fn roles_of(pool: &SqlitePool, user_id: i64) -> HivebaseResult<Vec<RoleRow>> {
    let roles = sqlx::query_as::<_, RoleRow>(
        "SELECT r.* FROM roles r
         JOIN roles_users ru ON ru.role_id = r.id
         WHERE ru.user_id = ?
         ORDER BY r.name",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(roles)
}

pub async fn assign_role(pool: &SqlitePool, user_id: i64, role_name: &str) -> HivebaseResult<()> {
    let inserted = sqlx::query(
        "INSERT OR IGNORE INTO roles_users (user_id, role_id)
         SELECT ?, id FROM roles WHERE name = ?",
    )
    .bind(user_id)
    .bind(role_name)
    .execute(pool)
    .await?
    .rows_affected();
    if inserted == 0 {
        return Err(HivebaseError::NotFound(format!("role {role_name}")));
    }
    Ok(())
}

pub async fn list_roles(pool: &SqlitePool) -> HivebaseResult<Vec<RoleRow>> {
    let roles = sqlx::query_as::<_, RoleRow>("SELECT * FROM roles ORDER BY name")
        .fetch_all(pool)
        .await?;
    Ok(roles)
}

pub async fn create_role(
    pool: &SqlitePool,
    name: &str,
    permissions: &str,
) -> HivebaseResult<RoleRow> {
    sqlx::query("INSERT INTO roles (name, permissions, created_at) VALUES (?, ?, ?)")
        .bind(name)
        .bind(permissions)
        .bind(Utc::now())
        .execute(pool)
        .await?;
    let role = sqlx::query_as::<_, RoleRow>("SELECT * FROM roles WHERE name = ?")
        .bind(name)
        .fetch_one(pool)
        .await?;
    Ok(role)
}
