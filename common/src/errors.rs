//! Application error types.
//!
//! Every operation on the facade, the models and the services reports failure
//! through [`AppError`].

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::response::ApiResponse;

/// Result alias used across the workspace.
pub type AppResult<T> = Result<T, AppError>;

/// Unified error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// The table or its namespace could not be found or read.
    #[error("Discovery failed: {0}")]
    Discovery(String),

    /// A discovered schema cannot be turned into a queryable model.
    #[error("Model construction failed: {0}")]
    ModelConstruction(String),

    /// A query failed against an open connection.
    #[error("Query failed: {0}")]
    Query(String),

    /// The connection was released by `disconnect`.
    #[error("Connection is closed")]
    ConnectionClosed,

    /// The data source could not be reached.
    #[error("Database connection failed: {0}")]
    DatabaseConnection(String),

    /// Invalid input.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The dialect is not supported.
    #[error("Unsupported database type: {0}")]
    UnsupportedDatabaseType(String),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl AppError {
    /// Creates a discovery error for a table missing from a namespace.
    pub fn table_not_found(table: &str, namespace: &str) -> Self {
        AppError::Discovery(format!(
            "table `{}` not found in namespace `{}`",
            table, namespace
        ))
    }

    /// Maps a driver error raised during catalog introspection.
    pub fn from_discovery(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolClosed => AppError::ConnectionClosed,
            e => AppError::Discovery(e.to_string()),
        }
    }

    /// Maps a driver error raised while running a data query.
    pub fn from_query(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolClosed => AppError::ConnectionClosed,
            e => AppError::Query(e.to_string()),
        }
    }

    /// Returns the stable error code exposed to API clients.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Discovery(_) => "DISCOVERY_ERROR",
            AppError::ModelConstruction(_) => "MODEL_CONSTRUCTION_ERROR",
            AppError::Query(_) => "QUERY_ERROR",
            AppError::ConnectionClosed => "CONNECTION_CLOSED",
            AppError::DatabaseConnection(_) => "DATABASE_CONNECTION_ERROR",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::UnsupportedDatabaseType(_) => "UNSUPPORTED_DATABASE_TYPE",
            AppError::Config(_) => "CONFIG_ERROR",
        }
    }

    /// Returns the HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::UnsupportedDatabaseType(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Discovery(_) => StatusCode::NOT_FOUND,
            AppError::ModelConstruction(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Query(_) => StatusCode::BAD_GATEWAY,
            AppError::ConnectionClosed | AppError::DatabaseConnection(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            AppError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Validation(errors.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(code = self.code(), error = %self, "Request failed");
        } else {
            tracing::warn!(code = self.code(), error = %self, "Request rejected");
        }
        (status, Json(ApiResponse::from_error(&self))).into_response()
    }
}
