//! OAuth 1.0a signature methods.

use std::fmt;
use std::str::FromStr;

use base64::prelude::BASE64_STANDARD;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha1::Sha1;

use super::credentials::Credentials;
use super::error::OAuthError;
use super::normalize::{normalize_parameters, normalize_url, percent_encode, OAUTH_SIGNATURE};
use super::RequestParameters;

type HmacSha1 = Hmac<Sha1>;

/// Version string included in every signed request.
pub(crate) const OAUTH_VERSION: &str = "1.0";

/// The signature methods supported by Ubuntu SSO.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SignatureMethod {
    /// Secrets sent as-is; only safe over TLS.
    Plaintext,
    /// HMAC-SHA1 over the signature base string of the request.
    #[default]
    HmacSha1,
}

impl SignatureMethod {
    /// The name of the method as it appears in `oauth_signature_method`.
    pub fn name(&self) -> &'static str {
        match self {
            SignatureMethod::Plaintext => "PLAINTEXT",
            SignatureMethod::HmacSha1 => "HMAC-SHA1",
        }
    }

    /// Compute the signature of a request with the given credentials.
    ///
    /// `PLAINTEXT` does not look at the request at all. `HMAC-SHA1` signs the normalized URL
    /// together with the request parameters and the protocol parameters (`oauth_consumer_key`,
    /// `oauth_nonce`, `oauth_signature_method`, `oauth_timestamp`, `oauth_token` and
    /// `oauth_version`); a missing nonce or timestamp is signed as an empty string.
    pub fn signature(&self, credentials: &Credentials, request: &RequestParameters) -> Result<String, OAuthError> {
        match self {
            SignatureMethod::Plaintext => Ok(format!(
                "{}&{}",
                percent_encode(&credentials.consumer_secret),
                percent_encode(&credentials.token_secret)
            )),
            SignatureMethod::HmacSha1 => {
                let base_string = signature_base_string(*self, credentials, request)?;
                log::debug!("Signature base string: {}", base_string);

                // the secrets go into the key without percent-encoding
                let key = format!("{}&{}", credentials.consumer_secret, credentials.token_secret);
                let mut mac = HmacSha1::new_from_slice(key.as_bytes()).expect("HMAC accepts keys of any length");
                mac.update(base_string.as_bytes());

                Ok(BASE64_STANDARD.encode(mac.finalize().into_bytes()))
            },
        }
    }
}

impl fmt::Display for SignatureMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SignatureMethod {
    type Err = OAuthError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "PLAINTEXT" => Ok(SignatureMethod::Plaintext),
            "HMAC-SHA1" => Ok(SignatureMethod::HmacSha1),
            _ => Err(OAuthError::UnsupportedSignatureMethodError { name: name.to_string() }),
        }
    }
}

/// Build the signature base string: `METHOD&enc(url)&enc(params)`.
///
/// The protocol parameters are merged into the request parameters before normalization and the
/// values of repeated keys are ordered by their encoded form. Without request parameters the
/// protocol parameters end up in the order consumer_key, nonce, signature_method, timestamp,
/// token, version.
fn signature_base_string(
    method: SignatureMethod,
    credentials: &Credentials,
    request: &RequestParameters,
) -> Result<String, OAuthError> {
    let base_url = normalize_url(&request.base_url)?;

    let mut params = request.params.clone();
    params.remove(OAUTH_SIGNATURE);
    params.extend([
        ("oauth_consumer_key", credentials.consumer_key.as_str()),
        ("oauth_nonce", request.nonce.as_deref().unwrap_or_default()),
        ("oauth_signature_method", method.name()),
        ("oauth_timestamp", request.timestamp.as_deref().unwrap_or_default()),
        ("oauth_token", credentials.token_key.as_str()),
        ("oauth_version", OAUTH_VERSION),
    ]);
    params.sort_values();

    Ok(format!(
        "{}&{}&{}",
        request.http_method.to_uppercase(),
        percent_encode(&base_url),
        percent_encode(&normalize_parameters(&params))
    ))
}
