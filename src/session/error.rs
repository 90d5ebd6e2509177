use std::fmt::{self, Display, Formatter};

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::oauth::OAuthError;

/// Error code reported by Ubuntu SSO when a one-time password is needed to complete the request.
pub const TWO_FACTOR_REQUIRED: &str = "TWOFACTOR_REQUIRED";

/// This collection of errors is returned for various failure modes when talking to the Ubuntu SSO
/// API.
#[derive(Debug, thiserror::Error)]
pub enum SsoError {
    /// This error represents a network-related issue that occurred within
    /// [`reqwest`](https://docs.rs/reqwest).
    #[error("Failed to contact Ubuntu SSO: {error}")]
    RequestError {
        /// The inner error contains the error passed from [`reqwest`](https://docs.rs/reqwest).
        error: reqwest::Error,
    },
    /// This error is returned when the token endpoint refused the email address and password.
    #[error("Invalid email address or password")]
    InvalidCredentialsError,
    /// This error is returned when Ubuntu SSO answered with a well-formed error response.
    #[error("{0}")]
    ProviderError(ProviderError),
    /// This error is returned when Ubuntu SSO answered with an error that is not in the expected
    /// format. The raw status code and body are kept.
    #[error("Unexpected response from Ubuntu SSO (status {status}): {body}")]
    ProviderProtocolError {
        /// The HTTP status code of the response.
        status: u16,
        /// The response body, as text.
        body: String,
    },
    /// This error is returned when a successful response did not have the expected format.
    #[error("Failed to deserialize JSON returned by Ubuntu SSO: {error}")]
    DeserializationError {
        /// The inner error contains the deserialization error message from
        /// [`serde_json`](https://docs.rs/serde_json).
        error: serde_json::Error,
    },
    /// This error is returned when a request could not be signed.
    #[error("Failed to sign request: {error}")]
    SigningError {
        /// The inner error describes why the signature could not be computed.
        error: OAuthError,
    },
}

impl From<reqwest::Error> for SsoError {
    fn from(error: reqwest::Error) -> Self {
        SsoError::RequestError { error }
    }
}

impl From<serde_json::Error> for SsoError {
    fn from(error: serde_json::Error) -> Self {
        SsoError::DeserializationError { error }
    }
}

impl From<OAuthError> for SsoError {
    fn from(error: OAuthError) -> Self {
        SsoError::SigningError { error }
    }
}

/// The body of an error response from the Ubuntu SSO API.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct ProviderError {
    /// Human-readable description of the error.
    pub message: String,
    /// Machine-readable error code, e.g. `INVALID_DATA` or [`TWO_FACTOR_REQUIRED`].
    #[serde(default)]
    pub code: Option<String>,
    /// Additional information about the error.
    #[serde(default)]
    pub extra: Option<Map<String, Value>>,
}

impl ProviderError {
    /// Whether the request can succeed if it is repeated with a one-time password.
    pub fn is_two_factor_required(&self) -> bool {
        self.code.as_deref() == Some(TWO_FACTOR_REQUIRED)
    }

    fn ext(&self) -> Option<&Value> {
        self.extra.as_ref()?.get("ext")
    }
}

impl Display for ProviderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;

        match self.ext() {
            Some(Value::String(ext)) => write!(f, " (ext: {})", ext),
            Some(ext) => write!(f, " (ext: {})", ext),
            None => Ok(()),
        }
    }
}

impl std::error::Error for ProviderError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(body: &str) -> ProviderError {
        serde_json::from_str(body).unwrap()
    }

    #[test]
    fn test_message_only() {
        let error = parse(r#"{"message": "Invalid request data"}"#);

        assert_eq!(error.to_string(), "Invalid request data");
        assert_eq!(error.code, None);
        assert!(!error.is_two_factor_required());
    }

    #[test]
    fn test_ext_is_appended() {
        let error = parse(r#"{"message": "Invalid request data", "code": "INVALID_DATA", "extra": {"ext": "email"}}"#);
        assert_eq!(error.to_string(), "Invalid request data (ext: email)");

        let error = parse(r#"{"message": "Account locked", "extra": {"ext": {"until": 5}}}"#);
        assert_eq!(error.to_string(), r#"Account locked (ext: {"until":5})"#);
    }

    #[test]
    fn test_extra_without_ext() {
        let error = parse(r#"{"message": "Invalid request data", "extra": {"email": ["required"]}}"#);
        assert_eq!(error.to_string(), "Invalid request data");
    }

    #[test]
    fn test_two_factor_required() {
        let error = parse(r#"{"message": "2-factor authentication required.", "code": "TWOFACTOR_REQUIRED"}"#);
        assert!(error.is_two_factor_required());

        let wrapped = SsoError::ProviderError(error);
        assert_eq!(wrapped.to_string(), "2-factor authentication required.");
    }
}
