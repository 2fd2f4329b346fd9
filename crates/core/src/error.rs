use thiserror::Error;

pub type HivebaseResult<T> = Result<T, HivebaseError>;

#[derive(Error, Debug)]
pub enum HivebaseError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Tenant not found: {0}")]
    TenantNotFound(String),

    #[error("Unit not found: {0}")]
    UnitNotFound(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl HivebaseError {
    /// Short machine-readable name used in JSON error bodies.
    pub fn name(&self) -> &'static str {
        match self {
            HivebaseError::Config(_) => "configuration_error",
            HivebaseError::Database(_) => "database_error",
            HivebaseError::TenantNotFound(_) => "tenant_not_found",
            HivebaseError::UnitNotFound(_) => "unit_not_found",
            HivebaseError::NotFound(_) => "not_found",
            HivebaseError::Validation(_) => "validation_error",
            HivebaseError::Unauthorized(_) => "unauthorized",
            HivebaseError::Forbidden(_) => "forbidden",
            HivebaseError::Serialization(_) => "serialization_error",
            HivebaseError::Io(_) => "io_error",
            HivebaseError::Internal(_) => "internal_error",
        }
    }
}
