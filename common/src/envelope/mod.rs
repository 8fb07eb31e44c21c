//! Inter-service response envelope
//!
//! Every response the account and crypto services send is wrapped in the
//! same envelope, so the gateway and the account service's price client can
//! decode any of them without knowing the payload type up front.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Envelope error details
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvelopeError {
    /// Machine-readable code, see [`Error::code`]
    pub code: String,
    /// Human-readable message
    pub message: String,
}

/// Response envelope shared by the backend services
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope<T = serde_json::Value> {
    /// HTTP status the response was sent with
    pub http_code: u16,
    /// Whether `error` is set
    pub have_error: bool,
    /// Error details, present when `have_error`
    #[serde(default)]
    pub error: Option<EnvelopeError>,
    /// Response payload, absent on errors
    #[serde(default)]
    pub payload: Option<T>,
}

impl<T> Envelope<T> {
    /// Successful response carrying a payload
    pub fn ok(http_code: u16, payload: T) -> Self {
        Self {
            http_code,
            have_error: false,
            error: None,
            payload: Some(payload),
        }
    }
}

impl Envelope<serde_json::Value> {
    /// Failed response built from an error
    pub fn from_error(err: &Error) -> Self {
        Self {
            http_code: err.status(),
            have_error: true,
            error: Some(EnvelopeError {
                code: err.code().to_string(),
                message: err.public_message(),
            }),
            payload: None,
        }
    }

    /// Decode the payload into a concrete type, failing on error envelopes
    pub fn into_payload<T: DeserializeOwned>(self) -> Result<T> {
        if self.have_error {
            let message = self.error
                .map(|e| format!("{}: {}", e.code, e.message))
                .unwrap_or_else(|| "error envelope without details".to_string());
            return Err(Error::Upstream(message));
        }

        let payload = self.payload
            .ok_or_else(|| Error::Upstream("envelope has no payload".to_string()))?;
        Ok(serde_json::from_value(payload)?)
    }
}
