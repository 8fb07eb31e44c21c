//! Envelope responses

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use common::envelope::Envelope;
use common::error::Error;
use serde::Serialize;
use tracing::{error, warn};

/// 200 response carrying a payload in the service envelope
#[derive(Debug)]
pub struct ApiResponse<T>(pub T);

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        Json(Envelope::ok(StatusCode::OK.as_u16(), self.0)).into_response()
    }
}

/// Error response in the service envelope
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = self.0;
        if err.is_client_error() {
            warn!(code = err.code(), "Request rejected: {}", err);
        } else {
            error!(code = err.code(), "Request failed: {}", err);
        }

        let envelope = Envelope::from_error(&err);
        let status = StatusCode::from_u16(envelope.http_code)
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(envelope)).into_response()
    }
}

pub type ApiResult<T> = std::result::Result<ApiResponse<T>, ApiError>;
