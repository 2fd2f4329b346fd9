use serde::Deserialize;

/// Root application configuration. Loaded from environment variables
/// with the prefix `HIVEBASE__` and an optional TOML config file.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub env: EnvProfile,
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub admin: AdminConfig,
    #[serde(default)]
    pub security: SecurityConfig,
    #[serde(default)]
    pub cors: CorsConfig,
    #[serde(default)]
    pub rate_limit: RateLimitSettings,
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub units: UnitsConfig,
    #[serde(default)]
    pub swagger: SwaggerConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Deployment environment profile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvProfile {
    #[default]
    Default,
    Development,
    Test,
    Production,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    #[serde(default = "default_site_title")]
    pub title: String,
    #[serde(default = "default_site_description")]
    pub description: String,
    #[serde(default = "default_site_url")]
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_http_port")]
    pub http_port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Directory holding per-tenant SQLite database files.
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    /// URL of the default tenant database. Empty means `<data_dir>/default.db`.
    #[serde(default)]
    pub default_url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    #[serde(default = "default_true")]
    pub auto_create_database: bool,
    #[serde(default = "default_true")]
    pub auto_create_tables: bool,
    #[serde(default = "default_true")]
    pub auto_create_admin: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AdminConfig {
    #[serde(default = "default_admin_email")]
    pub email: String,
    #[serde(default = "default_admin_password")]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    /// Secret used for signing tokens. Generated when empty (non-production).
    #[serde(default)]
    pub secret_key: String,
    #[serde(default = "default_session_ttl_secs")]
    pub session_ttl_secs: u64,
    #[serde(default = "default_password_min_length")]
    pub password_min_length: usize,
    #[serde(default = "default_true")]
    pub registration_enabled: bool,
    #[serde(default = "default_true")]
    pub force_https: bool,
    #[serde(default = "default_hsts_max_age")]
    pub hsts_max_age: u64,
    #[serde(default = "default_frame_options")]
    pub frame_options: String,
    #[serde(default = "default_csp_default_src")]
    pub csp_default_src: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    #[serde(default = "default_cors_origins")]
    pub origins: Vec<String>,
    #[serde(default = "default_cors_methods")]
    pub methods: Vec<String>,
    #[serde(default = "default_cors_headers")]
    pub allow_headers: Vec<String>,
    #[serde(default = "default_cors_max_age_secs")]
    pub max_age_secs: u64,
    #[serde(default)]
    pub supports_credentials: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitSettings {
    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: u32,
    #[serde(default = "default_requests_per_minute")]
    pub requests_per_minute: u32,
    #[serde(default = "default_burst_size")]
    pub burst_size: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RenderConfig {
    #[serde(default = "default_csv_delimiter")]
    pub csv_delimiter: String,
    #[serde(default = "default_date_format")]
    pub date_format: String,
    #[serde(default = "default_time_format")]
    pub time_format: String,
}

/// Where the enabled-unit sets come from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitSource {
    #[default]
    Json,
    Database,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UnitsConfig {
    #[serde(default)]
    pub source: UnitSource,
    #[serde(default = "default_extensions_enabled_file")]
    pub extensions_enabled_file: String,
    #[serde(default = "default_plugins_enabled_file")]
    pub plugins_enabled_file: String,
    /// Optional directory of unit manifests used to validate the catalog.
    #[serde(default)]
    pub manifest_dir: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SwaggerConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_swagger_path")]
    pub path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_metrics_port")]
    pub port: u16,
}

// Default functions
fn default_true() -> bool {
    true
}
fn default_site_title() -> String {
    "Hivebase".to_string()
}
fn default_site_description() -> String {
    "Multi-tenant application platform".to_string()
}
fn default_site_url() -> String {
    "http://localhost:5000".to_string()
}
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_http_port() -> u16 {
    5000
}
fn default_data_dir() -> String {
    "./data".to_string()
}
fn default_max_connections() -> u32 {
    20
}
fn default_busy_timeout_ms() -> u64 {
    5000
}
fn default_admin_email() -> String {
    "admin".to_string()
}
fn default_admin_password() -> String {
    "admin".to_string()
}
fn default_session_ttl_secs() -> u64 {
    3600
}
fn default_password_min_length() -> usize {
    12
}
fn default_hsts_max_age() -> u64 {
    31_536_000
}
fn default_frame_options() -> String {
    "DENY".to_string()
}
fn default_csp_default_src() -> String {
    "'self'".to_string()
}
fn default_cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}
fn default_cors_methods() -> Vec<String> {
    vec![
        "GET".to_string(),
        "POST".to_string(),
        "PUT".to_string(),
        "DELETE".to_string(),
        "OPTIONS".to_string(),
    ]
}
fn default_cors_headers() -> Vec<String> {
    vec!["Content-Type".to_string(), "Authorization".to_string()]
}
fn default_cors_max_age_secs() -> u64 {
    86_400
}
fn default_requests_per_second() -> u32 {
    50
}
fn default_requests_per_minute() -> u32 {
    3000
}
fn default_burst_size() -> u32 {
    100
}
fn default_csv_delimiter() -> String {
    "|".to_string()
}
fn default_date_format() -> String {
    "%Y/%m/%d".to_string()
}
fn default_time_format() -> String {
    "%H:%M:%S".to_string()
}
fn default_extensions_enabled_file() -> String {
    "configuration/enabled_extensions.json".to_string()
}
fn default_plugins_enabled_file() -> String {
    "configuration/enabled_plugins.json".to_string()
}
fn default_swagger_path() -> String {
    "/api/docs".to_string()
}
fn default_metrics_port() -> u16 {
    9091
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: default_site_title(),
            description: default_site_description(),
            url: default_site_url(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            http_port: default_http_port(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            default_url: String::new(),
            max_connections: default_max_connections(),
            busy_timeout_ms: default_busy_timeout_ms(),
            auto_create_database: true,
            auto_create_tables: true,
            auto_create_admin: true,
        }
    }
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            email: default_admin_email(),
            password: default_admin_password(),
        }
    }
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            secret_key: String::new(),
            session_ttl_secs: default_session_ttl_secs(),
            password_min_length: default_password_min_length(),
            registration_enabled: true,
            force_https: true,
            hsts_max_age: default_hsts_max_age(),
            frame_options: default_frame_options(),
            csp_default_src: default_csp_default_src(),
        }
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            origins: default_cors_origins(),
            methods: default_cors_methods(),
            allow_headers: default_cors_headers(),
            max_age_secs: default_cors_max_age_secs(),
            supports_credentials: false,
        }
    }
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            requests_per_second: default_requests_per_second(),
            requests_per_minute: default_requests_per_minute(),
            burst_size: default_burst_size(),
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            csv_delimiter: default_csv_delimiter(),
            date_format: default_date_format(),
            time_format: default_time_format(),
        }
    }
}

impl Default for UnitsConfig {
    fn default() -> Self {
        Self {
            source: UnitSource::Json,
            extensions_enabled_file: default_extensions_enabled_file(),
            plugins_enabled_file: default_plugins_enabled_file(),
            manifest_dir: String::new(),
        }
    }
}

impl Default for SwaggerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: default_swagger_path(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            port: default_metrics_port(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            env: EnvProfile::Default,
            site: SiteConfig::default(),
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            admin: AdminConfig::default(),
            security: SecurityConfig::default(),
            cors: CorsConfig::default(),
            rate_limit: RateLimitSettings::default(),
            render: RenderConfig::default(),
            units: UnitsConfig::default(),
            swagger: SwaggerConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables and an optional TOML
    /// file (path taken from `HIVEBASE_CONFIG` or passed explicitly).
    pub fn load(config_file: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();

        let file = config_file
            .map(str::to_string)
            .or_else(|| std::env::var("HIVEBASE_CONFIG").ok());
        if let Some(path) = file {
            builder = builder.add_source(config::File::with_name(&path).required(false));
        }

        let builder = builder.add_source(
            config::Environment::with_prefix("HIVEBASE")
                .separator("__")
                .try_parsing(true)
                .list_separator(","),
        );

        let config = builder.build()?;
        let mut app: AppConfig = config.try_deserialize()?;
        app.apply_profile();
        Ok(app)
    }

    /// Adjust defaults that depend on the environment profile. Called by
    /// `load`, and again by callers that change `env` afterwards.
    pub fn apply_profile(&mut self) {
        match self.env {
            EnvProfile::Development => {
                self.security.force_https = false;
            }
            EnvProfile::Test => {
                self.security.force_https = false;
                self.database.default_url = "sqlite::memory:".to_string();
            }
            EnvProfile::Production | EnvProfile::Default => {}
        }
    }

    /// URL of the default tenant database, derived from data_dir when unset.
    pub fn default_database_url(&self) -> String {
        if self.database.default_url.is_empty() {
            format!("sqlite://{}/default.db?mode=rwc", self.database.data_dir)
        } else {
            self.database.default_url.clone()
        }
    }

    /// Production requires an explicit secret key.
    pub fn validate(&self) -> Result<(), crate::HivebaseError> {
        if self.env == EnvProfile::Production && self.security.secret_key.is_empty() {
            return Err(crate::HivebaseError::Config(
                "security.secret_key must be set in production".to_string(),
            ));
        }
        Ok(())
    }
}
