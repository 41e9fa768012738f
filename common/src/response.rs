//! HTTP response envelope.
//!
//! Every schema-service endpoint answers with an [`ApiResponse`]: `data` on
//! success, `error` (an [`AppError`] code and message) on failure, and
//! `meta` in both cases.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::errors::AppError;

/// Response envelope.
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,

    /// Payload; omitted on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,

    /// Failure; omitted on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,

    pub meta: ResponseMeta,
}

/// Failure body.
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiError {
    /// Stable code, see [`AppError::code`].
    pub code: String,
    pub message: String,
}

impl From<&AppError> for ApiError {
    fn from(err: &AppError) -> Self {
        Self {
            code: err.code().to_string(),
            message: err.to_string(),
        }
    }
}

/// Envelope metadata.
#[derive(Debug, Serialize, ToSchema)]
pub struct ResponseMeta {
    /// Value of the `x-request-id` header the request was tagged with.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,

    pub timestamp: DateTime<Utc>,

    /// Time spent querying the data source.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
}

impl Default for ResponseMeta {
    fn default() -> Self {
        Self {
            request_id: None,
            timestamp: Utc::now(),
            duration_ms: None,
            service: None,
        }
    }
}

impl<T: Serialize> ApiResponse<T> {
    /// Successful envelope around `data`.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            meta: ResponseMeta::default(),
        }
    }

    /// Successful envelope tagged with the answering service.
    pub fn ok_with_service(data: T, service: impl Into<String>) -> Self {
        Self::ok(data).with_service(service)
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.meta.request_id = Some(request_id.into());
        self
    }

    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.meta.duration_ms = Some(duration_ms);
        self
    }

    pub fn with_service(mut self, service: impl Into<String>) -> Self {
        self.meta.service = Some(service.into());
        self
    }
}

impl ApiResponse<()> {
    /// Failure envelope for an [`AppError`].
    pub fn from_error(err: &AppError) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(ApiError::from(err)),
            meta: ResponseMeta::default(),
        }
    }
}
