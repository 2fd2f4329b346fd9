//! Tenant, settings and audit endpoints. Everything here requires the
//! `admin` role.

use crate::error::ApiError;
use crate::render::{self, RenderParams};
use crate::rest::AppState;
use axum::extract::{OriginalUri, Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::Response;
use axum::{Extension, Json};
use hivebase_core::HivebaseError;
use hivebase_platform::tenancy::TenantSelection;
use hivebase_store::repo::audit;
use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct CreateTenantRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateTenantRequest {
    pub suspended: bool,
}

#[derive(Deserialize, ToSchema)]
pub struct PutSettingRequest {
    pub key: String,
    pub value: String,
}

/// GET /api/tenants
#[utoipa::path(
    get,
    path = "/api/tenants",
    tag = "Tenants",
    responses(
        (status = 200, description = "Registered tenants"),
        (status = 403, description = "Admin role required", body = crate::error::ErrorBody),
    )
)]
pub async fn list_tenants(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<RenderParams>,
    OriginalUri(uri): OriginalUri,
) -> Result<Response, ApiError> {
    state.admin_session(&headers)?;
    let rows = state.tenant_ops.list().await?;
    let body = serde_json::to_value(&rows).map_err(HivebaseError::from)?;
    Ok(render::respond(uri.path(), &params, &state.config.render, body))
}

/// POST /api/tenants — create the registry row, the database and the bind.
#[utoipa::path(
    post,
    path = "/api/tenants",
    tag = "Tenants",
    request_body = CreateTenantRequest,
    responses(
        (status = 201, description = "Tenant created"),
        (status = 400, description = "Invalid tenant name", body = crate::error::ErrorBody),
    )
)]
pub async fn create_tenant(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<CreateTenantRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    let session = state.admin_session(&headers)?;
    let row = state
        .tenant_ops
        .create(&session.email, &request.name, request.description.as_deref())
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(serde_json::to_value(&row).map_err(HivebaseError::from)?),
    ))
}

/// GET /api/tenants/{name}
#[utoipa::path(
    get,
    path = "/api/tenants/{name}",
    tag = "Tenants",
    params(("name" = String, Path, description = "Tenant name")),
    responses(
        (status = 200, description = "Tenant detail"),
        (status = 404, description = "No such tenant", body = crate::error::ErrorBody),
    )
)]
pub async fn get_tenant(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(name): Path<String>,
    Query(params): Query<RenderParams>,
    OriginalUri(uri): OriginalUri,
) -> Result<Response, ApiError> {
    state.admin_session(&headers)?;
    let row = state.tenant_ops.get(&name).await?;
    let mut body = serde_json::to_value(&row).map_err(HivebaseError::from)?;
    if let Some(map) = body.as_object_mut() {
        map.insert("bound".to_string(), json!(state.binds.contains(&name)));
    }
    Ok(render::respond(uri.path(), &params, &state.config.render, body))
}

/// PUT /api/tenants/{name} — suspend or reactivate.
#[utoipa::path(
    put,
    path = "/api/tenants/{name}",
    tag = "Tenants",
    request_body = UpdateTenantRequest,
    params(("name" = String, Path, description = "Tenant name")),
    responses((status = 200, description = "Tenant updated"))
)]
pub async fn update_tenant(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(name): Path<String>,
    Json(request): Json<UpdateTenantRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let session = state.admin_session(&headers)?;
    let row = if request.suspended {
        state.tenant_ops.suspend(&session.email, &name).await?
    } else {
        state.tenant_ops.reactivate(&session.email, &name).await?
    };
    Ok(Json(serde_json::to_value(&row).map_err(HivebaseError::from)?))
}

/// DELETE /api/tenants/{name} — drop the registry row and the bind. The
/// database file stays on disk.
#[utoipa::path(
    delete,
    path = "/api/tenants/{name}",
    tag = "Tenants",
    params(("name" = String, Path, description = "Tenant name")),
    responses(
        (status = 204, description = "Tenant removed"),
        (status = 400, description = "The default tenant cannot be removed", body = crate::error::ErrorBody),
    )
)]
pub async fn delete_tenant(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(name): Path<String>,
) -> Result<StatusCode, ApiError> {
    let session = state.admin_session(&headers)?;
    state.tenant_ops.delete(&session.email, &name).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/settings — settings of the caller's tenant.
#[utoipa::path(
    get,
    path = "/api/settings",
    tag = "Settings",
    responses((status = 200, description = "Settings of the selected tenant"))
)]
pub async fn list_settings(
    State(state): State<AppState>,
    headers: HeaderMap,
    tenant: Option<Extension<TenantSelection>>,
    Query(params): Query<RenderParams>,
    OriginalUri(uri): OriginalUri,
) -> Result<Response, ApiError> {
    state.admin_session(&headers)?;
    let tenant = tenant
        .map(|t| t.name.clone())
        .unwrap_or_else(|| "default".to_string());
    let rows = state.system_settings.all(&tenant).await?;
    let body = serde_json::to_value(&rows).map_err(HivebaseError::from)?;
    Ok(render::respond(uri.path(), &params, &state.config.render, body))
}

/// PUT /api/settings — upsert one setting in the caller's tenant.
#[utoipa::path(
    put,
    path = "/api/settings",
    tag = "Settings",
    request_body = PutSettingRequest,
    responses((status = 200, description = "Setting stored"))
)]
pub async fn put_setting(
    State(state): State<AppState>,
    headers: HeaderMap,
    tenant: Option<Extension<TenantSelection>>,
    Json(request): Json<PutSettingRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let session = state.admin_session(&headers)?;
    if request.key.is_empty() {
        return Err(HivebaseError::Validation("setting key must not be empty".to_string()).into());
    }
    let tenant = tenant
        .map(|t| t.name.clone())
        .unwrap_or_else(|| "default".to_string());
    state
        .system_settings
        .set(&session.email, &tenant, &request.key, &request.value)
        .await?;
    Ok(Json(json!({ "key": request.key, "value": request.value })))
}

/// GET /admin/audit — recent audit entries from the default bind.
#[utoipa::path(
    get,
    path = "/admin/audit",
    tag = "Admin",
    params(("limit" = Option<i64>, Query, description = "Maximum entries, default 100")),
    responses((status = 200, description = "Recent audit entries"))
)]
pub async fn recent_audit(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<RenderParams>,
    Query(page): Query<AuditQuery>,
    OriginalUri(uri): OriginalUri,
) -> Result<Response, ApiError> {
    state.admin_session(&headers)?;
    let rows = audit::recent(&state.binds.default_pool(), page.limit.unwrap_or(100)).await?;
    let body = serde_json::to_value(&rows).map_err(HivebaseError::from)?;
    Ok(render::respond(uri.path(), &params, &state.config.render, body))
}

#[derive(Deserialize)]
pub struct AuditQuery {
    #[serde(default)]
    pub limit: Option<i64>,
}

/// Rate-limit windows idle this long are dropped during the stats sweep.
const RATE_LIMIT_IDLE_SECS: u64 = 120;

/// GET /admin/sessions — session and limiter stats, with a sweep of
/// expired sessions and stale rate-limit windows.
#[utoipa::path(
    get,
    path = "/admin/sessions",
    tag = "Admin",
    responses((status = 200, description = "Session and limiter stats"))
)]
pub async fn session_stats(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.admin_session(&headers)?;
    let swept = state.sessions.sweep_expired();
    let limits_swept = state.limiter.sweep_stale(RATE_LIMIT_IDLE_SECS);
    Ok(Json(json!({
        "active": state.sessions.active_count(),
        "swept": swept,
        "rate_limit_keys": state.limiter.tracked_keys(),
        "rate_limit_swept": limits_swept,
        "uptime_secs": state.start_time.elapsed().as_secs(),
    })))
}

/// GET /admin/binds — registered bind keys.
#[utoipa::path(
    get,
    path = "/admin/binds",
    tag = "Admin",
    responses((status = 200, description = "Registered tenant binds"))
)]
pub async fn list_binds(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.admin_session(&headers)?;
    Ok(Json(json!({ "binds": state.binds.bind_keys() })))
}
