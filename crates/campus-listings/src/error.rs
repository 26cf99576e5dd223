use crate::config::ConfigError;
use crate::listings::{
    ListingServiceError, RegistrationServiceError, RepositoryError, SeedError,
};
use crate::telemetry::TelemetryError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("telemetry error: {0}")]
    Telemetry(#[from] TelemetryError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("server error: {0}")]
    Server(#[from] axum::Error),
    #[error("storage error: {0}")]
    Storage(#[from] RepositoryError),
    #[error("seed error: {0}")]
    Seed(#[from] SeedError),
    #[error(transparent)]
    Listing(#[from] ListingServiceError),
    #[error(transparent)]
    Registration(#[from] RegistrationServiceError),
    #[error("failed to render output: {0}")]
    Render(#[from] serde_json::Error),
    #[error("background task failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

impl AppError {
    fn status_and_body(self) -> (StatusCode, Value) {
        match self {
            AppError::Listing(ListingServiceError::InvalidFilter(error)) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": error.to_string(), "field": error.field().as_str() }),
            ),
            error @ (AppError::Listing(ListingServiceError::InvalidProperty(_))
            | AppError::Registration(RegistrationServiceError::Invalid(_))) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({ "error": error.to_string() }),
            ),
            AppError::Listing(ListingServiceError::NotFound(id)) => (
                StatusCode::NOT_FOUND,
                json!({ "error": "listing not found", "id": id }),
            ),
            AppError::Registration(RegistrationServiceError::Duplicate) => (
                StatusCode::CONFLICT,
                json!({ "error": "student already registered" }),
            ),
            error @ (AppError::Listing(ListingServiceError::StorageUnavailable(_))
            | AppError::Registration(RegistrationServiceError::StorageUnavailable(_))
            | AppError::Storage(_)) => (
                StatusCode::SERVICE_UNAVAILABLE,
                json!({ "error": error.to_string() }),
            ),
            error => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": error.to_string() }),
            ),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = self.status_and_body();
        (status, Json(body)).into_response()
    }
}
