//! This module contains the OAuth 1.0a request signing used by the Ubuntu SSO REST API.
//!
//! Requests are described by [`RequestParameters`], signed with one of the
//! [`SignatureMethod`s](SignatureMethod) using the [`Credentials`] of a token, and the resulting
//! `Authorization` header is produced by an [`AuthorizationSigner`].
//!
//! ```
//! use usso::oauth::{AuthorizationSigner, Credentials, RequestParameters, SignatureMethod};
//!
//! let credentials = Credentials {
//!     consumer_key: String::from("rfyzhdQ"),
//!     consumer_secret: String::from("rwDkQkkdfdfdeAslkmmxAOjOAT"),
//!     token_key: String::from("abcs"),
//!     token_secret: String::from("mTBgLxtTRUdfqewqgrqsvxlijbMWkPBajgKcoZCrDwv"),
//!     ..Credentials::default()
//! };
//!
//! let mut request = RequestParameters::new("GET", "https://localhost")
//!     .signature_method(SignatureMethod::HmacSha1);
//! request.nonce = Some(String::from("10888885"));
//! request.timestamp = Some(String::from("1358853126"));
//!
//! let header = AuthorizationSigner::new()
//!     .authorization_header(&credentials, &mut request)
//!     .unwrap();
//!
//! assert!(header.contains(r#"oauth_signature="amJnYeek4G9ObTgTiE2y6cwTyPg%3D""#));
//! ```

use std::time::{SystemTime, UNIX_EPOCH};

use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use reqwest::header::AUTHORIZATION;
use reqwest::RequestBuilder;
use url::Url;

mod credentials;
pub use credentials::{Credentials, DEFAULT_REALM};

mod error;
pub use error::OAuthError;

mod normalize;
pub use normalize::{normalize_parameters, normalize_url, percent_encode, Params};

mod signature;
pub use signature::SignatureMethod;

use signature::OAUTH_VERSION;

/// Nonces are decimal numbers below this bound.
const NONCE_BOUND: u32 = 100_000_000;

/// Everything about a single request that goes into its signature.
///
/// `nonce` and `timestamp` are filled in by [`AuthorizationSigner::authorization_header`] when they
/// are missing, and kept for any later signing of the same request.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RequestParameters {
    pub http_method: String,
    /// URL of the request; its query string and fragment are not part of the signed URL.
    pub base_url: String,
    /// Query or form parameters of the request.
    pub params: Params,
    pub nonce: Option<String>,
    pub timestamp: Option<String>,
    pub signature_method: SignatureMethod,
}

impl RequestParameters {
    /// This method creates parameters for a request without query or form parameters, signed with
    /// `HMAC-SHA1`.
    pub fn new(http_method: impl Into<String>, base_url: impl Into<String>) -> Self {
        RequestParameters {
            http_method: http_method.into(),
            base_url: base_url.into(),
            ..RequestParameters::default()
        }
    }

    /// This method creates parameters for a request to the given URL, taking the request
    /// parameters from its query string.
    pub fn from_url(http_method: impl Into<String>, url: &Url) -> Self {
        RequestParameters {
            http_method: http_method.into(),
            base_url: url.to_string(),
            params: Params::from_query(url),
            ..RequestParameters::default()
        }
    }

    /// This method can be used to override the default signature method.
    pub fn signature_method(mut self, signature_method: SignatureMethod) -> Self {
        self.signature_method = signature_method;
        self
    }

    /// This method can be used to set the query or form parameters of the request.
    pub fn params(mut self, params: Params) -> Self {
        self.params = params;
        self
    }
}

/// Builds `Authorization` headers for signed requests.
///
/// The random source for nonces and the clock for timestamps are owned by the signer, so tests
/// can substitute deterministic ones.
#[derive(Debug)]
pub struct AuthorizationSigner<R = StdRng> {
    rng: R,
    clock: fn() -> SystemTime,
    escape_realm: bool,
}

impl AuthorizationSigner<StdRng> {
    /// This method creates a signer with an entropy-seeded random source and the system clock.
    pub fn new() -> Self {
        AuthorizationSigner::with_rng(StdRng::from_entropy())
    }
}

impl Default for AuthorizationSigner<StdRng> {
    fn default() -> Self {
        AuthorizationSigner::new()
    }
}

impl<R: RngCore> AuthorizationSigner<R> {
    /// This method creates a signer that draws nonces from the given random source.
    pub fn with_rng(rng: R) -> Self {
        AuthorizationSigner {
            rng,
            clock: SystemTime::now,
            escape_realm: false,
        }
    }

    /// This method can be used to override the clock used for timestamps.
    pub fn clock(mut self, clock: fn() -> SystemTime) -> Self {
        self.clock = clock;
        self
    }

    /// This method can be used to percent-encode the realm in the header. By default it is sent
    /// literally.
    pub fn escape_realm(mut self, escape_realm: bool) -> Self {
        self.escape_realm = escape_realm;
        self
    }

    fn nonce(&mut self) -> String {
        self.rng.gen_range(0..NONCE_BOUND).to_string()
    }

    fn timestamp(&self) -> String {
        (self.clock)()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
            .to_string()
    }

    /// Compute the value of the `Authorization` header for a request.
    ///
    /// A missing nonce or timestamp is generated and stored in `request`, so signing the same
    /// request again produces the same header.
    pub fn authorization_header(
        &mut self,
        credentials: &Credentials,
        request: &mut RequestParameters,
    ) -> Result<String, OAuthError> {
        if request.nonce.as_deref().map_or(true, str::is_empty) {
            request.nonce = Some(self.nonce());
        }

        if request.timestamp.as_deref().map_or(true, str::is_empty) {
            request.timestamp = Some(self.timestamp());
        }

        let signature = request.signature_method.signature(credentials, request)?;

        let realm = if self.escape_realm {
            percent_encode(credentials.realm())
        } else {
            credentials.realm().to_string()
        };

        Ok(format!(
            concat!(
                r#"OAuth realm="{}", "#,
                r#"oauth_consumer_key="{}", "#,
                r#"oauth_token="{}", "#,
                r#"oauth_signature_method="{}", "#,
                r#"oauth_signature="{}", "#,
                r#"oauth_timestamp="{}", "#,
                r#"oauth_nonce="{}", "#,
                r#"oauth_version="{}""#,
            ),
            realm,
            percent_encode(&credentials.consumer_key),
            percent_encode(&credentials.token_key),
            request.signature_method.name(),
            percent_encode(&signature),
            percent_encode(request.timestamp.as_deref().unwrap_or_default()),
            percent_encode(request.nonce.as_deref().unwrap_or_default()),
            OAUTH_VERSION,
        ))
    }

    /// Sign a request that is about to be sent by attaching the `Authorization` header to it.
    pub fn sign(
        &mut self,
        credentials: &Credentials,
        request: &mut RequestParameters,
        builder: RequestBuilder,
    ) -> Result<RequestBuilder, OAuthError> {
        let header = self.authorization_header(credentials, request)?;
        Ok(builder.header(AUTHORIZATION, header))
    }
}
