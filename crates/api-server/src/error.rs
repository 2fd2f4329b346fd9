//! Mapping from domain errors to HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use hivebase_core::HivebaseError;
use serde::Serialize;
use tracing::error;
use utoipa::ToSchema;

/// JSON body carried by every error response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    pub code: u16,
    pub name: String,
    pub description: String,
}

/// A domain error crossing the HTTP boundary.
#[derive(Debug)]
pub struct ApiError(pub HivebaseError);

impl From<HivebaseError> for ApiError {
    fn from(err: HivebaseError) -> Self {
        Self(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            HivebaseError::Validation(_) => StatusCode::BAD_REQUEST,
            HivebaseError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            HivebaseError::Forbidden(_) => StatusCode::FORBIDDEN,
            HivebaseError::NotFound(_)
            | HivebaseError::TenantNotFound(_)
            | HivebaseError::UnitNotFound(_) => StatusCode::NOT_FOUND,
            HivebaseError::Database(sqlx::Error::RowNotFound) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self.0, "Request failed");
            metrics::counter!("api.errors").increment(1);
        }
        let body = ErrorBody {
            code: status.as_u16(),
            name: self.0.name().to_string(),
            description: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
