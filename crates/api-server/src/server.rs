//! HTTP server assembly: routes, middleware stack, metrics exporter.

use crate::error::ApiError;
use crate::rest::AppState;
use crate::swagger::ApiDoc;
use crate::{admin_rest, middleware, rest, unit_rest};
use axum::extract::Request;
use axum::http::{HeaderName, HeaderValue, Method};
use axum::middleware::{from_fn, from_fn_with_state, Next};
use axum::response::IntoResponse;
use axum::routing::{get, post, put};
use axum::Router;
use hivebase_core::HivebaseError;
use hivebase_units::{UnitContext, UnitKind};
use std::net::SocketAddr;
use std::time::Duration;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub struct ApiServer {
    state: AppState,
}

impl ApiServer {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    /// The full router: REST surface, active extension routes, Swagger,
    /// and the middleware stack.
    pub fn router(&self, unit_ctx: &UnitContext) -> Router {
        let state = self.state.clone();

        let api = Router::new()
            .route("/health", get(rest::health))
            .route("/ready", get(rest::readiness))
            .route("/live", get(rest::liveness))
            .route("/api/users", get(rest::list_users).post(rest::create_user))
            .route(
                "/api/users/:id",
                get(rest::get_user)
                    .put(rest::update_user)
                    .delete(rest::delete_user),
            )
            .route("/api/roles", get(rest::list_roles).post(rest::create_role))
            .route("/api/extensions", get(unit_rest::list_extensions))
            .route("/api/plugins", get(unit_rest::list_plugins))
            .route(
                "/api/extensions/:name/enabled",
                put(unit_rest::set_extension_enabled),
            )
            .route(
                "/api/plugins/:name/enabled",
                put(unit_rest::set_plugin_enabled),
            )
            .route("/api/units/sync", post(unit_rest::sync_units))
            .route(
                "/api/tenants",
                get(admin_rest::list_tenants).post(admin_rest::create_tenant),
            )
            .route(
                "/api/tenants/:name",
                get(admin_rest::get_tenant)
                    .put(admin_rest::update_tenant)
                    .delete(admin_rest::delete_tenant),
            )
            .route(
                "/api/settings",
                get(admin_rest::list_settings).put(admin_rest::put_setting),
            )
            .route("/admin/audit", get(admin_rest::recent_audit))
            .route("/admin/sessions", get(admin_rest::session_stats))
            .route("/admin/binds", get(admin_rest::list_binds))
            .with_state(state.clone());

        // Routes contributed by active extensions, nested under the
        // extension's name. These routers carry their own state, so they
        // join after the core surface is finalized. Each router is wrapped
        // in an activity guard: the routes stay mounted for the process
        // lifetime, but a deactivated extension answers 404.
        let mut app = api;
        for name in self.state.registry.active_names() {
            let Some(unit) = self.state.registry.get(&name) else {
                continue;
            };
            if unit.kind() != UnitKind::Extension {
                continue;
            }
            if let Some(routes) = unit.routes(unit_ctx) {
                info!(extension = %name, "Mounting extension routes");
                let registry = self.state.registry.clone();
                let unit_name = name.clone();
                let guarded = routes.layer(from_fn(move |req: Request, next: Next| {
                    let registry = registry.clone();
                    let unit_name = unit_name.clone();
                    async move {
                        if registry.is_active(&unit_name) {
                            next.run(req).await
                        } else {
                            ApiError(HivebaseError::NotFound(format!(
                                "extension '{unit_name}' is disabled"
                            )))
                            .into_response()
                        }
                    }
                }));
                app = app.nest(&format!("/{name}"), guarded);
            }
        }

        if self.state.config.swagger.enabled {
            app = app.merge(
                SwaggerUi::new(self.state.config.swagger.path.clone())
                    .url("/api-docs/openapi.json", ApiDoc::openapi()),
            );
        }

        // Order matters: tenant resolution runs before rate limiting so
        // limits are applied per tenant; security headers wrap everything.
        app.layer(from_fn_with_state(state.clone(), middleware::rate_limit))
            .layer(from_fn_with_state(state.clone(), middleware::resolve_tenant))
            .layer(CompressionLayer::new())
            .layer(TraceLayer::new_for_http())
            .layer(self.cors_layer())
            .layer(from_fn_with_state(
                state,
                middleware::security_headers,
            ))
    }

    fn cors_layer(&self) -> CorsLayer {
        let cors = &self.state.config.cors;
        if cors.origins.iter().any(|o| o == "*") {
            return CorsLayer::permissive();
        }

        let origins: Vec<HeaderValue> = cors
            .origins
            .iter()
            .filter_map(|o| match o.parse::<HeaderValue>() {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!(origin = %o, "Ignoring unparseable CORS origin");
                    None
                }
            })
            .collect();
        let methods: Vec<Method> = cors
            .methods
            .iter()
            .filter_map(|m| m.parse().ok())
            .collect();
        let headers: Vec<HeaderName> = cors
            .allow_headers
            .iter()
            .filter_map(|h| h.parse().ok())
            .collect();

        let mut layer = CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(methods)
            .allow_headers(headers)
            .max_age(Duration::from_secs(cors.max_age_secs));
        if cors.supports_credentials {
            layer = layer.allow_credentials(true);
        }
        layer
    }

    /// Serve until ctrl-c or SIGTERM.
    pub async fn start_http(&self, unit_ctx: &UnitContext) -> anyhow::Result<()> {
        let app = self.router(unit_ctx);
        let addr = SocketAddr::new(
            self.state.config.server.host.parse()?,
            self.state.config.server.http_port,
        );

        info!(addr = %addr, "Starting HTTP server");
        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal())
        .await?;
        Ok(())
    }

    /// Start the Prometheus exporter on its own port.
    pub fn start_metrics(&self) -> anyhow::Result<()> {
        let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
        let handle = builder
            .with_http_listener(SocketAddr::new(
                self.state.config.server.host.parse()?,
                self.state.config.metrics.port,
            ))
            .install_recorder()?;

        info!(port = self.state.config.metrics.port, "Metrics exporter started");

        // Keep the handle alive
        std::mem::forget(handle);
        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install ctrl-c handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => warn!(error = %e, "Failed to install SIGTERM handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received ctrl-c, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}
