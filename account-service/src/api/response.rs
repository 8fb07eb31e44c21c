//! Envelope responses for the account service HTTP API

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use common::envelope::Envelope;
use common::error::Error;
use serde::Serialize;
use std::fmt::Display;
use tracing::{error, warn};

/// Successful response, serialised inside the service envelope
#[derive(Debug)]
pub struct ApiResponse<T> {
    status: StatusCode,
    payload: T,
}

impl<T> ApiResponse<T> {
    /// 200 with a payload
    pub fn ok(payload: T) -> Self {
        Self { status: StatusCode::OK, payload }
    }

    /// 201 with a payload
    pub fn created(payload: T) -> Self {
        Self { status: StatusCode::CREATED, payload }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let envelope = Envelope::ok(self.status.as_u16(), self.payload);
        (self.status, Json(envelope)).into_response()
    }
}

/// Failed response, serialised inside the service envelope
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        ApiError(err)
    }
}

impl ApiError {
    /// Turn an extractor rejection into a `BadRequest`
    pub fn rejected(rejection: impl Display) -> Self {
        ApiError(Error::BadRequest(rejection.to_string()))
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

/// Handler result type
pub type ApiResult<T> = std::result::Result<ApiResponse<T>, ApiError>;
