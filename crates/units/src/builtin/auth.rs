//! The `auth` extension: login, logout, and registration endpoints.
//!
//! Mounted under `/auth` when the extension is enabled. Credentials live
//! in the users table of the request's tenant bind; successful logins
//! issue a bearer token backed by the session store.

use crate::registry::{Unit, UnitContext, UnitKind};
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Extension, Json, Router};
use chrono::{DateTime, Utc};
use hivebase_platform::auth::{hash_password, verify_password};
use hivebase_platform::tenancy::TenantSelection;
use hivebase_store::repo::users;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

pub struct AuthExtension;

impl Unit for AuthExtension {
    fn name(&self) -> &'static str {
        "auth"
    }

    fn kind(&self) -> UnitKind {
        UnitKind::Extension
    }

    fn description(&self) -> &'static str {
        "Login, logout, and registration endpoints"
    }

    fn routes(&self, ctx: &UnitContext) -> Option<Router> {
        Some(
            Router::new()
                .route("/login", post(handle_login))
                .route("/logout", post(handle_logout))
                .route("/register", post(handle_register))
                .with_state(ctx.clone()),
        )
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user_id: i64,
    pub email: String,
    pub roles: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user_id: i64,
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct AuthErrorBody {
    pub error: String,
    pub message: String,
}

type AuthError = (StatusCode, Json<AuthErrorBody>);

fn auth_error(status: StatusCode, error: &str, message: impl Into<String>) -> AuthError {
    (
        status,
        Json(AuthErrorBody {
            error: error.to_string(),
            message: message.into(),
        }),
    )
}

fn tenant_name(tenant: Option<&Extension<TenantSelection>>) -> String {
    tenant
        .map(|Extension(sel)| sel.name.clone())
        .unwrap_or_else(|| "default".to_string())
}

/// POST /auth/login
async fn handle_login(
    State(ctx): State<UnitContext>,
    tenant: Option<Extension<TenantSelection>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AuthError> {
    let tenant = tenant_name(tenant.as_ref());
    let pool = ctx.binds.pool(&tenant);

    let user = users::get_by_email(&pool, &request.email)
        .await
        .map_err(|e| auth_error(StatusCode::INTERNAL_SERVER_ERROR, "login_failed", e.to_string()))?;

    let Some(user) = user else {
        warn!(email = %request.email, tenant = %tenant, "Login for unknown user");
        metrics::counter!("auth.login_failures").increment(1);
        return Err(auth_error(
            StatusCode::UNAUTHORIZED,
            "invalid_credentials",
            "invalid email or password",
        ));
    };

    if !user.active || !verify_password(&request.password, &user.password_hash) {
        metrics::counter!("auth.login_failures").increment(1);
        return Err(auth_error(
            StatusCode::UNAUTHORIZED,
            "invalid_credentials",
            "invalid email or password",
        ));
    }

    let roles = users::roles_of(&pool, user.id)
        .await
        .map_err(|e| auth_error(StatusCode::INTERNAL_SERVER_ERROR, "login_failed", e.to_string()))?
        .into_iter()
        .map(|r| r.name)
        .collect();

    let session = ctx.sessions.create(user.id, &user.email, &tenant, roles);
    metrics::counter!("auth.logins").increment(1);

    Ok(Json(LoginResponse {
        token: session.token.to_string(),
        expires_at: session.expires_at,
        user_id: user.id,
        email: user.email,
        roles: session.roles,
    }))
}

/// POST /auth/logout
async fn handle_logout(
    State(ctx): State<UnitContext>,
    headers: HeaderMap,
) -> Result<StatusCode, AuthError> {
    let token = bearer_token(&headers).ok_or_else(|| {
        auth_error(
            StatusCode::UNAUTHORIZED,
            "missing_token",
            "Authorization: Bearer <token> required",
        )
    })?;

    if ctx.sessions.revoke(token) {
        info!("Session revoked");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(auth_error(
            StatusCode::UNAUTHORIZED,
            "unknown_token",
            "session not found",
        ))
    }
}

/// POST /auth/register
async fn handle_register(
    State(ctx): State<UnitContext>,
    tenant: Option<Extension<TenantSelection>>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), AuthError> {
    if !ctx.registration_enabled {
        return Err(auth_error(
            StatusCode::FORBIDDEN,
            "registration_disabled",
            "registration is disabled",
        ));
    }
    if request.password.len() < ctx.password_min_length {
        return Err(auth_error(
            StatusCode::BAD_REQUEST,
            "weak_password",
            format!(
                "password must be at least {} characters",
                ctx.password_min_length
            ),
        ));
    }
    if request.email.is_empty() || !request.email.contains('@') {
        return Err(auth_error(
            StatusCode::BAD_REQUEST,
            "invalid_email",
            "a valid email address is required",
        ));
    }

    let tenant = tenant_name(tenant.as_ref());
    let pool = ctx.binds.pool(&tenant);

    let existing = users::get_by_email(&pool, &request.email).await.map_err(|e| {
        auth_error(StatusCode::INTERNAL_SERVER_ERROR, "registration_failed", e.to_string())
    })?;
    if existing.is_some() {
        return Err(auth_error(
            StatusCode::CONFLICT,
            "email_taken",
            "a user with this email already exists",
        ));
    }

    let user = users::create(&pool, &request.email, &hash_password(&request.password))
        .await
        .map_err(|e| {
            auth_error(StatusCode::INTERNAL_SERVER_ERROR, "registration_failed", e.to_string())
        })?;

    info!(email = %user.email, tenant = %tenant, "User registered");
    metrics::counter!("auth.registrations").increment(1);

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            user_id: user.id,
            email: user.email,
        }),
    ))
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}
