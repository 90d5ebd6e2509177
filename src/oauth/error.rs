/// This collection of errors is returned for various failure modes when normalizing and signing
/// requests with OAuth 1.0a.
#[derive(Debug, thiserror::Error)]
pub enum OAuthError {
    /// This error is returned when the base URL of a request could not be parsed, or has no host.
    #[error("Failed to parse request URL {url:?}: {error}")]
    MalformedUrlError {
        /// The URL that was rejected.
        url: String,
        /// The inner error contains the reason why the URL was rejected.
        error: url::ParseError,
    },
    /// This error is returned for signature method names other than `PLAINTEXT` and `HMAC-SHA1`.
    #[error("OAuth signature method not supported: {name}")]
    UnsupportedSignatureMethodError {
        /// The name of the requested signature method.
        name: String,
    },
    /// This error is returned when reading or writing an on-disk credential file failed.
    #[error("Failed to use on-disk credential file: {message}")]
    CredentialFileError {
        /// The inner message contains a description of what went wrong.
        message: String,
    },
}

impl From<serde_json::Error> for OAuthError {
    fn from(error: serde_json::Error) -> Self {
        OAuthError::CredentialFileError {
            message: format!("invalid JSON: {}", error),
        }
    }
}

impl From<std::io::Error> for OAuthError {
    fn from(error: std::io::Error) -> Self {
        OAuthError::CredentialFileError {
            message: error.to_string(),
        }
    }
}
