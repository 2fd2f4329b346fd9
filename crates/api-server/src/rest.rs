//! Core REST handlers: operational probes, users, roles.
//!
//! List and detail payloads go through the format renderer, so every
//! endpoint here answers in JSON, XML, CSV or HTML depending on the
//! `format` query parameter.

use crate::error::ApiError;
use crate::render::{self, RenderParams};
use axum::extract::{OriginalUri, Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::Response;
use axum::{Extension, Json};
use hivebase_admin::{SystemSettings, TenantOps, UnitOps, UserOps};
use hivebase_core::config::AppConfig;
use hivebase_core::{HivebaseError, HivebaseResult};
use hivebase_platform::auth::{hash_password, Session, SessionStore};
use hivebase_platform::rate_limit::RateLimiter;
use hivebase_platform::rbac;
use hivebase_platform::tenancy::{TenantResolver, TenantSelection};
use hivebase_store::repo::users;
use hivebase_store::TenantBinds;
use hivebase_units::UnitRegistry;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use utoipa::ToSchema;

/// Shared application state for REST handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub binds: Arc<TenantBinds>,
    pub sessions: Arc<SessionStore>,
    pub registry: Arc<UnitRegistry>,
    pub resolver: TenantResolver,
    pub limiter: Arc<RateLimiter>,
    pub tenant_ops: Arc<TenantOps>,
    pub user_ops: Arc<UserOps>,
    pub unit_ops: Arc<UnitOps>,
    pub system_settings: Arc<SystemSettings>,
    pub start_time: Instant,
}

impl AppState {
    /// Resolve the caller's session from the Authorization header.
    pub fn session(&self, headers: &HeaderMap) -> HivebaseResult<Session> {
        let token = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .ok_or_else(|| {
                HivebaseError::Unauthorized("missing bearer token".to_string())
            })?;
        self.sessions.resolve(token)
    }

    /// Session plus an `admin` role check.
    pub fn admin_session(&self, headers: &HeaderMap) -> HivebaseResult<Session> {
        let session = self.session(headers)?;
        rbac::require_role(&session.roles, &["admin"])?;
        Ok(session)
    }
}

fn tenant_name(tenant: Option<&Extension<TenantSelection>>) -> String {
    tenant
        .map(|t| t.name.clone())
        .unwrap_or_else(|| "default".to_string())
}

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
    pub organization: String,
    pub site_title: String,
    pub site_url: String,
}

/// GET /health — service health plus the tenant the caller resolved to.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Operations",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
    )
)]
pub async fn health(
    State(state): State<AppState>,
    tenant: Option<Extension<TenantSelection>>,
    Query(params): Query<RenderParams>,
    OriginalUri(uri): OriginalUri,
) -> Response {
    let body = json!({
        "status": "ok",
        "message": format!("{} is running", state.config.site.title),
        "organization": tenant_name(tenant.as_ref()),
        "site_title": state.config.site.title,
        "site_url": state.config.site.url,
    });
    render::respond(uri.path(), &params, &state.config.render, body)
}

/// GET /ready — readiness probe: the default bind must answer.
#[utoipa::path(
    get,
    path = "/ready",
    tag = "Operations",
    responses(
        (status = 200, description = "Ready to accept traffic"),
        (status = 503, description = "Default database unavailable"),
    )
)]
pub async fn readiness(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").execute(&state.binds.default_pool()).await {
        Ok(_) => StatusCode::OK,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

/// GET /live — liveness probe.
#[utoipa::path(
    get,
    path = "/live",
    tag = "Operations",
    responses((status = 200, description = "Process is alive"))
)]
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

#[derive(Deserialize, ToSchema)]
pub struct CreateUserRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateUserRequest {
    #[serde(default)]
    pub active: Option<bool>,
    #[serde(default)]
    pub password: Option<String>,
}

/// GET /api/users — list users in the caller's tenant.
#[utoipa::path(
    get,
    path = "/api/users",
    tag = "Users",
    params(
        ("format" = Option<String>, Query, description = "Response format: json, xml, csv or html"),
        ("organization" = Option<String>, Query, description = "Tenant override"),
    ),
    responses(
        (status = 200, description = "Users in the selected tenant"),
        (status = 401, description = "Missing or invalid bearer token", body = crate::error::ErrorBody),
    )
)]
pub async fn list_users(
    State(state): State<AppState>,
    headers: HeaderMap,
    tenant: Option<Extension<TenantSelection>>,
    Query(params): Query<RenderParams>,
    OriginalUri(uri): OriginalUri,
) -> Result<Response, ApiError> {
    state.session(&headers)?;
    let rows = state.user_ops.list(&tenant_name(tenant.as_ref())).await?;
    let body = serde_json::to_value(&rows).map_err(HivebaseError::from)?;
    Ok(render::respond(uri.path(), &params, &state.config.render, body))
}

/// POST /api/users — create a user in the caller's tenant.
#[utoipa::path(
    post,
    path = "/api/users",
    tag = "Users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created"),
        (status = 400, description = "Validation failed", body = crate::error::ErrorBody),
    )
)]
pub async fn create_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    tenant: Option<Extension<TenantSelection>>,
    Json(request): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    let session = state.admin_session(&headers)?;
    if !request.email.contains('@') {
        return Err(HivebaseError::Validation("invalid email address".to_string()).into());
    }
    if request.password.len() < state.config.security.password_min_length {
        return Err(HivebaseError::Validation(format!(
            "password must be at least {} characters",
            state.config.security.password_min_length
        ))
        .into());
    }
    let tenant = tenant_name(tenant.as_ref());
    let pool = state.binds.pool(&tenant);
    if users::get_by_email(&pool, &request.email).await?.is_some() {
        return Err(HivebaseError::Validation("email already registered".to_string()).into());
    }
    let user = users::create(&pool, &request.email, &hash_password(&request.password)).await?;
    tracing::info!(actor = %session.email, user = %user.email, tenant = %tenant, "User created");
    Ok((
        StatusCode::CREATED,
        Json(serde_json::to_value(&user).map_err(HivebaseError::from)?),
    ))
}

/// GET /api/users/{id}
#[utoipa::path(
    get,
    path = "/api/users/{id}",
    tag = "Users",
    params(("id" = i64, Path, description = "User identifier")),
    responses(
        (status = 200, description = "User detail"),
        (status = 404, description = "No such user", body = crate::error::ErrorBody),
    )
)]
pub async fn get_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    tenant: Option<Extension<TenantSelection>>,
    Path(id): Path<i64>,
    Query(params): Query<RenderParams>,
    OriginalUri(uri): OriginalUri,
) -> Result<Response, ApiError> {
    state.session(&headers)?;
    let pool = state.binds.pool(&tenant_name(tenant.as_ref()));
    let user = users::get(&pool, id).await?;
    let roles = users::roles_of(&pool, id).await?;
    let mut body = serde_json::to_value(&user).map_err(HivebaseError::from)?;
    if let Some(map) = body.as_object_mut() {
        map.insert(
            "roles".to_string(),
            json!(roles.iter().map(|r| r.name.clone()).collect::<Vec<_>>()),
        );
    }
    Ok(render::respond(uri.path(), &params, &state.config.render, body))
}

/// PUT /api/users/{id} — update active flag and/or password.
#[utoipa::path(
    put,
    path = "/api/users/{id}",
    tag = "Users",
    request_body = UpdateUserRequest,
    params(("id" = i64, Path, description = "User identifier")),
    responses(
        (status = 200, description = "User updated"),
        (status = 403, description = "Admin role required", body = crate::error::ErrorBody),
    )
)]
pub async fn update_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    tenant: Option<Extension<TenantSelection>>,
    Path(id): Path<i64>,
    Json(request): Json<UpdateUserRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let session = state.admin_session(&headers)?;
    let tenant = tenant_name(tenant.as_ref());
    if let Some(password) = &request.password {
        state
            .user_ops
            .reset_password(&session.email, &tenant, id, password)
            .await?;
    }
    let user = match request.active {
        Some(true) => state.user_ops.reactivate(&session.email, &tenant, id).await?,
        Some(false) => state.user_ops.deactivate(&session.email, &tenant, id).await?,
        None => users::get(&state.binds.pool(&tenant), id).await?,
    };
    Ok(Json(serde_json::to_value(&user).map_err(HivebaseError::from)?))
}

/// DELETE /api/users/{id}
#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    tag = "Users",
    params(("id" = i64, Path, description = "User identifier")),
    responses(
        (status = 204, description = "User deleted"),
        (status = 404, description = "No such user", body = crate::error::ErrorBody),
    )
)]
pub async fn delete_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    tenant: Option<Extension<TenantSelection>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.admin_session(&headers)?;
    let pool = state.binds.pool(&tenant_name(tenant.as_ref()));
    users::get(&pool, id).await?;
    users::delete(&pool, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize, ToSchema)]
pub struct CreateRoleRequest {
    pub name: String,
    #[serde(default)]
    pub permissions: Vec<String>,
}

/// GET /api/roles
#[utoipa::path(
    get,
    path = "/api/roles",
    tag = "Users",
    responses((status = 200, description = "Roles in the selected tenant"))
)]
pub async fn list_roles(
    State(state): State<AppState>,
    headers: HeaderMap,
    tenant: Option<Extension<TenantSelection>>,
    Query(params): Query<RenderParams>,
    OriginalUri(uri): OriginalUri,
) -> Result<Response, ApiError> {
    state.session(&headers)?;
    let rows = users::list_roles(&state.binds.pool(&tenant_name(tenant.as_ref()))).await?;
    let body = serde_json::to_value(&rows).map_err(HivebaseError::from)?;
    Ok(render::respond(uri.path(), &params, &state.config.render, body))
}

/// POST /api/roles
#[utoipa::path(
    post,
    path = "/api/roles",
    tag = "Users",
    request_body = CreateRoleRequest,
    responses(
        (status = 201, description = "Role created"),
        (status = 403, description = "Admin role required", body = crate::error::ErrorBody),
    )
)]
pub async fn create_role(
    State(state): State<AppState>,
    headers: HeaderMap,
    tenant: Option<Extension<TenantSelection>>,
    Json(request): Json<CreateRoleRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    state.admin_session(&headers)?;
    if request.name.is_empty() {
        return Err(HivebaseError::Validation("role name must not be empty".to_string()).into());
    }
    let role = users::create_role(
        &state.binds.pool(&tenant_name(tenant.as_ref())),
        &request.name,
        &request.permissions.join(","),
    )
    .await?;
    Ok((
        StatusCode::CREATED,
        Json(serde_json::to_value(&role).map_err(HivebaseError::from)?),
    ))
}
