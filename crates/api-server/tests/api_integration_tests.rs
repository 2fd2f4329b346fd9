//! Integration tests exercising the full router through tower's oneshot.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use hivebase_admin::{SystemSettings, TenantOps, UnitOps, UserOps};
use hivebase_api::rest::AppState;
use hivebase_api::ApiServer;
use hivebase_core::config::{AppConfig, UnitSource};
use hivebase_platform::auth::{hash_password, SessionStore};
use hivebase_platform::rate_limit::RateLimiter;
use hivebase_platform::tenancy::TenantResolver;
use hivebase_store::repo::users;
use hivebase_store::{schema, TenantBinds};
use hivebase_units::{UnitContext, UnitRegistry};
use http_body_util::BodyExt;
use std::sync::Arc;
use std::time::Instant;
use tower::ServiceExt;

struct TestApp {
    router: Router,
    state: AppState,
}

async fn test_app() -> TestApp {
    let mut config = AppConfig::default();
    config.security.force_https = false;
    config.units.source = UnitSource::Database;
    config.swagger.enabled = false;

    let binds = Arc::new(TenantBinds::open("sqlite::memory:", 1, 1000).await.unwrap());
    let pool = binds.default_pool();
    schema::create_tables(&pool).await.unwrap();
    schema::seed_admin(&pool, "admin@example.com", &hash_password("adminpassword"))
        .await
        .unwrap();

    let sessions = Arc::new(SessionStore::new(3600));
    let registry = Arc::new(UnitRegistry::with_builtins());
    let unit_ctx = UnitContext {
        binds: binds.clone(),
        sessions: sessions.clone(),
        registration_enabled: true,
        password_min_length: config.security.password_min_length,
    };
    let unit_ops = Arc::new(UnitOps::new(
        binds.clone(),
        registry.clone(),
        unit_ctx.clone(),
        config.units.clone(),
    ));
    let config = Arc::new(config);

    let state = AppState {
        config: config.clone(),
        binds: binds.clone(),
        sessions,
        registry,
        resolver: TenantResolver,
        limiter: Arc::new(RateLimiter::new(config.rate_limit.clone())),
        tenant_ops: Arc::new(TenantOps::new(binds.clone(), "/tmp".to_string())),
        user_ops: Arc::new(UserOps::new(
            binds.clone(),
            config.security.password_min_length,
        )),
        unit_ops,
        system_settings: Arc::new(SystemSettings::new(binds)),
        start_time: Instant::now(),
    };

    let router = ApiServer::new(state.clone()).router(&unit_ctx);
    TestApp { router, state }
}

/// Issue a bearer token for the seeded admin.
async fn admin_token(state: &AppState) -> String {
    let pool = state.binds.default_pool();
    let admin = users::get_by_email(&pool, "admin@example.com")
        .await
        .unwrap()
        .unwrap();
    let session = state.sessions.create(
        admin.id,
        &admin.email,
        "default",
        vec!["admin".to_string()],
    );
    session.token.to_string()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health_returns_default_tenant() {
    let app = test_app().await;
    let response = app
        .router
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-content-type-options"));
    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["organization"], "default");
}

#[tokio::test]
async fn test_tenant_from_query_parameter() {
    let app = test_app().await;
    let response = app
        .router
        .oneshot(
            Request::builder()
                .uri("/health?organization=acme")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let json = body_json(response).await;
    assert_eq!(json["organization"], "acme");
}

#[tokio::test]
async fn test_tenant_from_subdomain() {
    let app = test_app().await;
    let response = app
        .router
        .oneshot(
            Request::builder()
                .uri("/health")
                .header(header::HOST, "acme.example.com")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let json = body_json(response).await;
    assert_eq!(json["organization"], "acme");
}

#[tokio::test]
async fn test_query_parameter_beats_subdomain() {
    let app = test_app().await;
    let response = app
        .router
        .oneshot(
            Request::builder()
                .uri("/health?organization=blue")
                .header(header::HOST, "acme.example.com")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let json = body_json(response).await;
    assert_eq!(json["organization"], "blue");
}

#[tokio::test]
async fn test_csv_format_negotiation() {
    let app = test_app().await;
    let token = admin_token(&app.state).await;
    let response = app
        .router
        .oneshot(
            Request::builder()
                .uri("/api/users?format=csv")
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers()[header::CONTENT_TYPE]
        .to_str()
        .unwrap()
        .starts_with("text/plain"));
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("email"));
    assert!(text.contains('|'));
    assert!(text.contains("admin@example.com"));
}

#[tokio::test]
async fn test_download_disposition() {
    let app = test_app().await;
    let token = admin_token(&app.state).await;
    let response = app
        .router
        .oneshot(
            Request::builder()
                .uri("/api/users?format=csv&download=true")
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION].to_str().unwrap(),
        "attachment; filename=api_users.csv"
    );
    assert!(response.headers()[header::CONTENT_TYPE]
        .to_str()
        .unwrap()
        .starts_with("text/csv"));
}

#[tokio::test]
async fn test_missing_token_is_401_with_json_error() {
    let app = test_app().await;
    let response = app
        .router
        .oneshot(Request::builder().uri("/api/users").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(response).await;
    assert_eq!(json["code"], 401);
    assert_eq!(json["name"], "unauthorized");
}

#[tokio::test]
async fn test_non_admin_is_403_on_tenants() {
    let app = test_app().await;
    let session = app
        .state
        .sessions
        .create(99, "user@example.com", "default", vec!["member".to_string()]);
    let response = app
        .router
        .oneshot(
            Request::builder()
                .uri("/api/tenants")
                .header(header::AUTHORIZATION, format!("Bearer {}", session.token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let json = body_json(response).await;
    assert_eq!(json["name"], "forbidden");
}

#[tokio::test]
async fn test_unknown_tenant_is_404_with_json_error() {
    let app = test_app().await;
    let token = admin_token(&app.state).await;
    let response = app
        .router
        .oneshot(
            Request::builder()
                .uri("/api/tenants/nowhere")
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await;
    assert_eq!(json["name"], "tenant_not_found");
}

#[tokio::test]
async fn test_plugin_toggle_roundtrip() {
    let app = test_app().await;
    let token = admin_token(&app.state).await;

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/api/plugins/health/enabled")
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"enabled": true}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["activated"][0], "health");

    let response = app
        .router
        .oneshot(
            Request::builder()
                .uri("/api/plugins")
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let json = body_json(response).await;
    let health = json
        .as_array()
        .unwrap()
        .iter()
        .find(|u| u["name"] == "health")
        .unwrap()
        .clone();
    assert_eq!(health["enabled"], true);
    assert_eq!(health["active"], true);
}

#[tokio::test]
async fn test_disabled_extension_routes_return_404() {
    let app = test_app().await;
    let token = admin_token(&app.state).await;

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/api/extensions/auth/enabled")
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"enabled": true}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let unit_ctx = UnitContext {
        binds: app.state.binds.clone(),
        sessions: app.state.sessions.clone(),
        registration_enabled: true,
        password_min_length: app.state.config.security.password_min_length,
    };
    let router = ApiServer::new(app.state.clone()).router(&unit_ctx);

    // Serves while active.
    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/auth/register")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    r#"{"email": "first@example.com", "password": "longenoughpassword"}"#,
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    // Deactivate without rebuilding the router; the mounted routes must
    // stop serving.
    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/api/extensions/auth/enabled")
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"enabled": false}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["deactivated"][0], "auth");
    assert!(!app.state.registry.is_active("auth"));

    let response = router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/auth/register")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    r#"{"email": "second@example.com", "password": "longenoughpassword"}"#,
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await;
    assert_eq!(json["name"], "not_found");
}

#[tokio::test]
async fn test_register_and_login_through_auth_extension() {
    let app = test_app().await;
    let token = admin_token(&app.state).await;

    // Activate the auth extension, then remount so its routes exist.
    let response = app
        .router
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/api/extensions/auth/enabled")
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"enabled": true}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let unit_ctx = UnitContext {
        binds: app.state.binds.clone(),
        sessions: app.state.sessions.clone(),
        registration_enabled: true,
        password_min_length: app.state.config.security.password_min_length,
    };
    let router = ApiServer::new(app.state.clone()).router(&unit_ctx);

    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/auth/register")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    r#"{"email": "new@example.com", "password": "longenoughpassword"}"#,
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/auth/login")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    r#"{"email": "new@example.com", "password": "longenoughpassword"}"#,
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert!(json["token"].is_string());
}
