//! REST endpoints for extensions and plugins.

use crate::error::ApiError;
use crate::render::{self, RenderParams};
use crate::rest::AppState;
use axum::extract::{OriginalUri, Path, Query, State};
use axum::http::HeaderMap;
use axum::response::Response;
use axum::Json;
use hivebase_core::HivebaseError;
use hivebase_units::{SyncReport, UnitKind};
use serde::Deserialize;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct SetEnabledRequest {
    pub enabled: bool,
}

async fn list_units(
    state: &AppState,
    headers: &HeaderMap,
    kind: UnitKind,
    params: &RenderParams,
    path: &str,
) -> Result<Response, ApiError> {
    state.session(headers)?;
    let units = state.unit_ops.list(kind).await?;
    let body = serde_json::to_value(&units).map_err(HivebaseError::from)?;
    Ok(render::respond(path, params, &state.config.render, body))
}

/// GET /api/extensions — the extension catalog with enabled/active flags.
#[utoipa::path(
    get,
    path = "/api/extensions",
    tag = "Units",
    responses((status = 200, description = "Extension catalog"))
)]
pub async fn list_extensions(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<RenderParams>,
    OriginalUri(uri): OriginalUri,
) -> Result<Response, ApiError> {
    list_units(&state, &headers, UnitKind::Extension, &params, uri.path()).await
}

/// GET /api/plugins — the plugin catalog with enabled/active flags.
#[utoipa::path(
    get,
    path = "/api/plugins",
    tag = "Units",
    responses((status = 200, description = "Plugin catalog"))
)]
pub async fn list_plugins(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<RenderParams>,
    OriginalUri(uri): OriginalUri,
) -> Result<Response, ApiError> {
    list_units(&state, &headers, UnitKind::Plugin, &params, uri.path()).await
}

/// PUT /api/extensions/{name}/enabled
///
/// Extension routes are mounted at startup only; enabling one here takes
/// route effect on the next restart, while activation hooks run now.
#[utoipa::path(
    put,
    path = "/api/extensions/{name}/enabled",
    tag = "Units",
    request_body = SetEnabledRequest,
    params(("name" = String, Path, description = "Extension name")),
    responses(
        (status = 200, description = "Sync report", body = SyncReport),
        (status = 404, description = "Unknown extension", body = crate::error::ErrorBody),
    )
)]
pub async fn set_extension_enabled(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(name): Path<String>,
    Json(request): Json<SetEnabledRequest>,
) -> Result<Json<SyncReport>, ApiError> {
    let session = state.admin_session(&headers)?;
    let report = state
        .unit_ops
        .set_enabled(&session.email, UnitKind::Extension, &name, request.enabled)
        .await?;
    Ok(Json(report))
}

/// PUT /api/plugins/{name}/enabled
#[utoipa::path(
    put,
    path = "/api/plugins/{name}/enabled",
    tag = "Units",
    request_body = SetEnabledRequest,
    params(("name" = String, Path, description = "Plugin name")),
    responses(
        (status = 200, description = "Sync report", body = SyncReport),
        (status = 404, description = "Unknown plugin", body = crate::error::ErrorBody),
    )
)]
pub async fn set_plugin_enabled(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(name): Path<String>,
    Json(request): Json<SetEnabledRequest>,
) -> Result<Json<SyncReport>, ApiError> {
    let session = state.admin_session(&headers)?;
    let report = state
        .unit_ops
        .set_enabled(&session.email, UnitKind::Plugin, &name, request.enabled)
        .await?;
    Ok(Json(report))
}

/// POST /api/units/sync — re-run the activation diff for both kinds.
#[utoipa::path(
    post,
    path = "/api/units/sync",
    tag = "Units",
    responses((status = 200, description = "Sync report", body = SyncReport))
)]
pub async fn sync_units(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<SyncReport>, ApiError> {
    state.admin_session(&headers)?;
    let report = state.unit_ops.sync_all().await?;
    Ok(Json(report))
}
