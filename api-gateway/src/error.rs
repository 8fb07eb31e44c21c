//! Error handling for the API gateway

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use common::error::Error;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// API error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error information
    pub error: ErrorInfo,
    /// Request ID for tracing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

/// Detailed error information
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Error code (string identifier for the error type)
    pub code: String,
    /// Human-readable error message
    pub message: String,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>, request_id: Option<String>) -> Self {
        Self {
            error: ErrorInfo {
                code: code.into(),
                message: message.into(),
            },
            request_id,
        }
    }
}

/// Error raised by the gateway itself, as opposed to one relayed from an
/// upstream envelope
#[derive(Debug)]
pub struct ApiError {
    pub error: Error,
    pub request_id: Option<String>,
}

impl ApiError {
    pub fn new(error: Error) -> Self {
        Self { error, request_id: None }
    }

    /// Attach the id of the request being answered
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    /// Turn an extractor rejection into a `BadRequest`
    pub fn rejected(rejection: impl std::fmt::Display) -> Self {
        Self::new(Error::BadRequest(rejection.to_string()))
    }
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        Self::new(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let request_id = self.request_id.unwrap_or_else(|| Uuid::new_v4().to_string());
        let err = self.error;

        if err.is_client_error() {
            tracing::warn!(request_id = %request_id, code = err.code(), "Request rejected: {}", err);
        } else {
            tracing::error!(request_id = %request_id, code = err.code(), "API Error: {:?}", err);
        }

        let status = StatusCode::from_u16(err.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = ErrorResponse::new(err.code(), err.public_message(), Some(request_id));

        (status, Json(body)).into_response()
    }
}

/// Handler result type
pub type ApiResult<T> = std::result::Result<T, ApiError>;
