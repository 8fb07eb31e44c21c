//! Calls to the account and crypto services
//!
//! Both services answer with the shared envelope. The gateway re-shapes it:
//! a success becomes `{"data": payload}` and a failure becomes the gateway's
//! error body, keeping the status the service chose. A service that cannot
//! be reached, or answers with anything but an envelope, is a `502`.

use std::fmt;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use common::envelope::Envelope;
use common::error::{Error, Result};
use reqwest::{Client, Method};
use serde_json::Value;
use tracing::{debug, warn};

use crate::api::ApiResponse;
use crate::config::GatewayConfig;
use crate::error::{ApiError, ErrorResponse};

/// Header carrying the request id to the services
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Backend service a call goes to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upstream {
    Account,
    Crypto,
}

impl fmt::Display for Upstream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Upstream::Account => f.write_str("account service"),
            Upstream::Crypto => f.write_str("crypto service"),
        }
    }
}

/// HTTP client for the backend services
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    client: Client,
    account_url: String,
    crypto_url: String,
}

impl UpstreamClient {
    pub fn new(config: &GatewayConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.upstream_timeout)
            .build()
            .map_err(|e| Error::ConfigurationError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            account_url: config.account_service_url.trim_end_matches('/').to_string(),
            crypto_url: config.crypto_service_url.trim_end_matches('/').to_string(),
        })
    }

    /// Send one request and decode the envelope it answers with
    pub async fn call(
        &self,
        upstream: Upstream,
        method: Method,
        path: &str,
        query: Option<&str>,
        body: Option<&Value>,
        request_id: &str,
    ) -> Result<Envelope> {
        let base = match upstream {
            Upstream::Account => &self.account_url,
            Upstream::Crypto => &self.crypto_url,
        };
        let url = match query.filter(|q| !q.is_empty()) {
            Some(query) => format!("{}{}?{}", base, path, query),
            None => format!("{}{}", base, path),
        };

        debug!(upstream = %upstream, method = %method, url = %url, "Forwarding request");

        let mut request = self.client.request(method, &url).header(REQUEST_ID_HEADER, request_id);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| {
            warn!(upstream = %upstream, error = %e, "Upstream unreachable");
            Error::Upstream(format!("The {} is unavailable", upstream))
        })?;

        let status = response.status();
        let bytes = response.bytes().await.map_err(|e| {
            warn!(upstream = %upstream, error = %e, "Failed to read upstream body");
            Error::Upstream(format!("The {} response could not be read", upstream))
        })?;

        let envelope: Envelope = serde_json::from_slice(&bytes).map_err(|e| {
            warn!(upstream = %upstream, status = %status, error = %e, "Upstream answered without an envelope");
            Error::Upstream(format!("The {} answered with an unexpected body", upstream))
        })?;

        if StatusCode::from_u16(envelope.http_code).is_err() {
            warn!(upstream = %upstream, http_code = envelope.http_code, "Envelope carries an invalid status");
            return Err(Error::Upstream(format!("The {} answered with an unexpected body", upstream)));
        }

        Ok(envelope)
    }

    /// `call` followed by [`normalize`], with gateway errors rendered too
    pub async fn proxy(
        &self,
        upstream: Upstream,
        method: Method,
        path: &str,
        query: Option<&str>,
        body: Option<&Value>,
        request_id: &str,
    ) -> Response {
        match self.call(upstream, method, path, query, body, request_id).await {
            Ok(envelope) => normalize(envelope, request_id),
            Err(err) => ApiError::new(err).with_request_id(request_id).into_response(),
        }
    }
}

/// Re-shape a service envelope into the gateway's response format
pub fn normalize(envelope: Envelope, request_id: &str) -> Response {
    let status = StatusCode::from_u16(envelope.http_code).unwrap_or(StatusCode::BAD_GATEWAY);

    if envelope.have_error {
        let (code, message) = match envelope.error {
            Some(error) => (error.code, error.message),
            None => ("upstream_error".to_string(), "Upstream reported an error".to_string()),
        };
        let body = ErrorResponse::new(code, message, Some(request_id.to_string()));
        return (status, Json(body)).into_response();
    }

    let payload = envelope.payload.unwrap_or(Value::Null);
    (status, ApiResponse::new(payload)).into_response()
}
