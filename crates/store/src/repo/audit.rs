//! Append-only audit log.

use crate::models::AuditRow;
use chrono::Utc;
use hivebase_core::HivebaseResult;
use sqlx::SqlitePool;

pub async fn record(
    pool: &SqlitePool,
    actor: &str,
    tenant: &str,
    action: &str,
    detail: &str,
) -> HivebaseResult<()> {
    sqlx::query(
        "INSERT INTO audit_log (actor, tenant, action, detail, created_at)
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(actor)
    .bind(tenant)
    .bind(action)
    .bind(detail)
    .bind(Utc::now())
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn recent(pool: &SqlitePool, limit: i64) -> HivebaseResult<Vec<AuditRow>> {
    let rows = sqlx::query_as::<_, AuditRow>(
        "SELECT * FROM audit_log ORDER BY id DESC LIMIT ?",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
