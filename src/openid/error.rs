/// Boxed error type returned by caller-supplied assertion verifiers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// This collection of errors is returned for various failure modes when processing the response of
/// an OpenID login.
#[derive(Debug, thiserror::Error)]
pub enum OpenIDError {
    /// This error is returned when the response URL was invalid.
    #[error("Failed to parse OpenID response URL: {error}")]
    MalformedUrlError {
        /// The inner error contains the error that occurred when parsing the invalid URL.
        error: url::ParseError,
    },
    /// This error is returned for responses with an `openid.mode` other than `id_res`, `cancel`
    /// and `error`.
    #[error("Unrecognised OpenID mode {mode:?}")]
    UnrecognizedModeError {
        /// The value of `openid.mode`, empty if it was missing.
        mode: String,
    },
    /// This error is returned when a positive assertion was not issued by the expected OpenID
    /// provider endpoint.
    #[error("OpenID response from unexpected endpoint {endpoint:?}")]
    EndpointMismatchError {
        /// The value of `openid.op_endpoint`.
        endpoint: String,
    },
    /// This error is returned when the OpenID provider reported an error. See
    /// <http://openid.net/specs/openid-authentication-2_0.html#rfc.section.5.2.3> for details.
    #[error("{message}")]
    OpenIDProviderError {
        /// The `openid.error` field of the response.
        message: String,
        /// The `openid.contact` field of the response.
        contact: String,
        /// The `openid.reference` field of the response.
        reference: String,
    },
    /// This error is returned when the user cancelled the login.
    #[error("Login cancelled")]
    LoginCancelledError,
    /// This error is returned when the assertion verifier rejected the response.
    #[error("Failed to verify OpenID assertion: {error}")]
    VerificationError {
        /// The inner error contains the reason given by the assertion verifier.
        error: BoxError,
    },
}

impl From<url::ParseError> for OpenIDError {
    fn from(error: url::ParseError) -> Self {
        OpenIDError::MalformedUrlError { error }
    }
}

/// This error describes why a nonce store refused a response nonce.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NonceError {
    /// The nonce does not start with a UTC timestamp.
    #[error("Malformed response nonce {nonce:?}")]
    Malformed { nonce: String },
    /// The timestamp of the nonce is too far from the current time.
    #[error("Response nonce {nonce:?} has expired")]
    Expired { nonce: String },
    /// The nonce was already used with the same endpoint.
    #[error("Response nonce {nonce:?} has already been used")]
    Replayed { nonce: String },
}

/// This error describes the ways in which decoding a discharge macaroon can fail.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MacaroonError {
    /// The macaroon was not valid base64.
    #[error("Invalid base64 encoding: {error}")]
    Base64 { error: base64::DecodeError },
    /// The data ended in the middle of a field or packet.
    #[error("Macaroon data is truncated")]
    Truncated,
    /// A field or packet was not where the binary format expects it.
    #[error("Unexpected macaroon field: {field}")]
    UnexpectedField { field: String },
    /// A field that must be present was missing.
    #[error("Missing macaroon field: {field}")]
    MissingField { field: &'static str },
    /// A location was not valid UTF-8.
    #[error("Macaroon location is not valid UTF-8")]
    InvalidLocation,
    /// The signature does not have the length of a HMAC-SHA256 digest.
    #[error("Macaroon signature has invalid length {length}")]
    InvalidSignature { length: usize },
}

impl From<base64::DecodeError> for MacaroonError {
    fn from(error: base64::DecodeError) -> Self {
        MacaroonError::Base64 { error }
    }
}
