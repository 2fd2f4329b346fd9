//! Hivebase — multi-tenant application platform.
//!
//! Main entry point: configuration, database binds, unit activation,
//! HTTP server.

use clap::Parser;
use hivebase_admin::{SystemSettings, TenantOps, UnitOps, UserOps};
use hivebase_api::ApiServer;
use hivebase_core::config::{AppConfig, EnvProfile};
use hivebase_platform::auth::{hash_password, SessionStore};
use hivebase_platform::rate_limit::RateLimiter;
use hivebase_platform::tenancy::TenantResolver;
use hivebase_store::{schema, TenantBinds};
use hivebase_units::{UnitContext, UnitRegistry};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "hivebase")]
#[command(about = "Multi-tenant application platform")]
#[command(version)]
struct Cli {
    /// HTTP port (overrides config)
    #[arg(long, env = "HIVEBASE__SERVER__HTTP_PORT")]
    http_port: Option<u16>,

    /// Directory holding per-tenant database files (overrides config)
    #[arg(long, env = "HIVEBASE__DATABASE__DATA_DIR")]
    data_dir: Option<String>,

    /// Environment profile: default, development, test or production
    #[arg(long, env = "HIVEBASE__ENV")]
    env: Option<String>,

    /// Path to a TOML configuration file
    #[arg(long, env = "HIVEBASE_CONFIG")]
    config: Option<String>,

    /// Skip unit activation (API-only mode)
    #[arg(long, default_value_t = false)]
    api_only: bool,
}

fn parse_profile(value: &str) -> anyhow::Result<EnvProfile> {
    match value {
        "default" => Ok(EnvProfile::Default),
        "development" => Ok(EnvProfile::Development),
        "test" => Ok(EnvProfile::Test),
        "production" => Ok(EnvProfile::Production),
        other => anyhow::bail!("unknown environment profile '{other}'"),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hivebase=info,tower_http=info".into()),
        )
        .json()
        .init();

    let cli = Cli::parse();

    info!("Hivebase starting up");

    // Load configuration
    let mut config = AppConfig::load(cli.config.as_deref()).unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        AppConfig::default()
    });

    // Apply CLI overrides
    if let Some(port) = cli.http_port {
        config.server.http_port = port;
    }
    if let Some(data_dir) = cli.data_dir {
        config.database.data_dir = data_dir;
    }
    if let Some(env) = &cli.env {
        config.env = parse_profile(env)?;
        config.apply_profile();
    }
    config.validate()?;

    info!(
        env = ?config.env,
        http_port = config.server.http_port,
        data_dir = %config.database.data_dir,
        units_source = ?config.units.source,
        "Configuration loaded"
    );

    // Open the default bind and bootstrap the schema
    let binds = Arc::new(
        TenantBinds::open(
            &config.default_database_url(),
            config.database.max_connections,
            config.database.busy_timeout_ms,
        )
        .await?,
    );
    if config.database.auto_create_tables {
        schema::create_tables(&binds.default_pool()).await?;
    }
    if config.database.auto_create_admin {
        schema::seed_admin(
            &binds.default_pool(),
            &config.admin.email,
            &hash_password(&config.admin.password),
        )
        .await?;
    }

    // Re-bind every registered tenant
    let tenant_ops = Arc::new(TenantOps::new(
        binds.clone(),
        config.database.data_dir.clone(),
    ));
    let bound = tenant_ops.sync_binds_from_registry().await?;
    info!(tenants = bound, "Tenant binds registered");

    // Platform services
    let sessions = Arc::new(SessionStore::new(config.security.session_ttl_secs));
    let limiter = Arc::new(RateLimiter::new(config.rate_limit.clone()));

    // Unit catalog and activation
    let registry = Arc::new(UnitRegistry::with_builtins());
    let unit_ctx = UnitContext {
        binds: binds.clone(),
        sessions: sessions.clone(),
        registration_enabled: config.security.registration_enabled,
        password_min_length: config.security.password_min_length,
    };
    let unit_ops = Arc::new(UnitOps::new(
        binds.clone(),
        registry.clone(),
        unit_ctx.clone(),
        config.units.clone(),
    ));

    if cli.api_only {
        info!("Running in API-only mode (no unit activation)");
    } else {
        match unit_ops.sync_all().await {
            Ok(report) => info!(
                activated = report.activated.len(),
                failed = report.failed.len(),
                "Unit sync complete"
            ),
            Err(e) => error!(error = %e, "Unit sync failed, all units inactive"),
        }
    }

    let config = Arc::new(config);
    let state = hivebase_api::rest::AppState {
        config: config.clone(),
        binds: binds.clone(),
        sessions,
        registry,
        resolver: TenantResolver,
        limiter,
        tenant_ops,
        user_ops: Arc::new(UserOps::new(
            binds.clone(),
            config.security.password_min_length,
        )),
        unit_ops,
        system_settings: Arc::new(SystemSettings::new(binds)),
        start_time: Instant::now(),
    };

    let server = ApiServer::new(state);

    // Start metrics exporter
    if let Err(e) = server.start_metrics() {
        error!(error = %e, "Failed to start metrics exporter");
    }

    server.start_http(&unit_ctx).await
}
