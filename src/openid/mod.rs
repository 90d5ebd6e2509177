//! This module contains an OpenID 2.0 client for logging users in with Ubuntu SSO.
//!
//! A [`Client`] builds the URL to redirect the user's browser to, and verifies the response that
//! Ubuntu SSO sends back to the `return_to` address. Checking the cryptographic validity of the
//! assertion is left to an [`AssertionVerifier`] supplied by the caller; the client takes care of
//! the response mode, the provider endpoint, and the extensions (team membership, simple
//! registration and macaroon discharges).
//!
//! ```
//! use usso::openid::{sreg, BoxError, Client, DiscoveryCache, NonceStore, Request};
//! use usso::UbuntuSsoServer;
//!
//! fn verify(url: &str, _: &dyn DiscoveryCache, _: &dyn NonceStore) -> Result<String, BoxError> {
//!     // check the assertion with an OpenID library here
//!     # let _ = url;
//!     Ok(String::from("https://login.ubuntu.com/+id/AAAAAA"))
//! }
//!
//! let client = Client::new(UbuntuSsoServer::production(), verify);
//!
//! let mut request = Request::new("https://example.com/callback");
//! request.sreg_required = vec![sreg::EMAIL.to_string()];
//!
//! let url = client.redirect_url(&request);
//! assert!(url.starts_with("https://login.ubuntu.com/+openid?"));
//! ```

use std::sync::Arc;

use url::form_urlencoded;
use url::Url;

use crate::server::UbuntuSsoServer;

mod discovery;
pub use discovery::{DiscoveredInfo, DiscoveryCache, UssoDiscoveryCache};

mod error;
pub use error::{BoxError, MacaroonError, NonceError, OpenIDError};

mod macaroon;
pub use macaroon::{Caveat, Discharge};

mod nonce;
pub use nonce::{NonceStore, SimpleNonceStore};

mod parameters;
pub use parameters::{sreg, Request, Response, NS_MACAROON, NS_SREG, NS_TEAMS};

use parameters::{ResponseParameters, IDENTIFIER_SELECT, NS_OPENID};

/// Checks the cryptographic validity of a positive assertion (signature, nonce, discovered
/// information) and returns the verified claimed identifier.
///
/// This is usually a thin wrapper around an OpenID library. Any function with a matching signature
/// can be used as a verifier.
pub trait AssertionVerifier {
    fn verify(
        &self,
        response_url: &str,
        discovery_cache: &dyn DiscoveryCache,
        nonce_store: &dyn NonceStore,
    ) -> Result<String, BoxError>;
}

impl<F> AssertionVerifier for F
where
    F: Fn(&str, &dyn DiscoveryCache, &dyn NonceStore) -> Result<String, BoxError>,
{
    fn verify(
        &self,
        response_url: &str,
        discovery_cache: &dyn DiscoveryCache,
        nonce_store: &dyn NonceStore,
    ) -> Result<String, BoxError> {
        self(response_url, discovery_cache, nonce_store)
    }
}

/// An OpenID client for a specific Ubuntu SSO server.
pub struct Client<V> {
    server: UbuntuSsoServer,
    nonce_store: Arc<dyn NonceStore>,
    discovery_cache: Arc<dyn DiscoveryCache>,
    verifier: V,
}

impl<V: AssertionVerifier> Client<V> {
    /// This method creates a client with an in-memory [`SimpleNonceStore`] and a
    /// [`UssoDiscoveryCache`] for the server.
    pub fn new(server: UbuntuSsoServer, verifier: V) -> Self {
        Client {
            nonce_store: Arc::new(SimpleNonceStore::new()),
            discovery_cache: Arc::new(UssoDiscoveryCache::new(server.clone())),
            server,
            verifier,
        }
    }

    /// This method can be used to share a nonce store between clients, or to use a persistent one.
    pub fn nonce_store(mut self, nonce_store: Arc<dyn NonceStore>) -> Self {
        self.nonce_store = nonce_store;
        self
    }

    /// This method can be used to override the default discovery cache.
    pub fn discovery_cache(mut self, discovery_cache: Arc<dyn DiscoveryCache>) -> Self {
        self.discovery_cache = discovery_cache;
        self
    }

    pub fn server(&self) -> &UbuntuSsoServer {
        &self.server
    }

    /// Build the URL of a login request addressed to the server's OpenID endpoint.
    pub fn redirect_url(&self, request: &Request) -> String {
        let mut query = form_urlencoded::Serializer::new(String::new());

        query
            .append_pair("openid.ns", NS_OPENID)
            .append_pair("openid.mode", "checkid_setup")
            .append_pair("openid.claimed_id", IDENTIFIER_SELECT)
            .append_pair("openid.identity", IDENTIFIER_SELECT)
            .append_pair("openid.return_to", &request.return_to);

        if !request.realm.is_empty() {
            query.append_pair("openid.realm", &request.realm);
        }

        if !request.teams.is_empty() {
            query
                .append_pair("openid.ns.lp", NS_TEAMS)
                .append_pair("openid.lp.query_membership", &request.teams.join(","));
        }

        if !request.sreg_required.is_empty() || !request.sreg_optional.is_empty() {
            query.append_pair("openid.ns.sreg", NS_SREG);
        }
        if !request.sreg_required.is_empty() {
            query.append_pair("openid.sreg.required", &request.sreg_required.join(","));
        }
        if !request.sreg_optional.is_empty() {
            query.append_pair("openid.sreg.optional", &request.sreg_optional.join(","));
        }

        if !request.caveat_id.is_empty() {
            query
                .append_pair("openid.ns.macaroon", NS_MACAROON)
                .append_pair("openid.macaroon.caveat_id", &request.caveat_id);
        }

        format!("{}?{}", self.server.openid_url(), query.finish())
    }

    /// Process the response of a login request, given the full URL it was delivered to.
    ///
    /// Cancelled logins fail with [`OpenIDError::LoginCancelledError`], provider errors with
    /// [`OpenIDError::OpenIDProviderError`]. For positive assertions the provider endpoint is
    /// checked before the assertion verifier is called; afterwards, extension values are only
    /// copied into the [`Response`] if they are listed in `openid.signed`.
    pub fn verify(&self, response_url: &str) -> Result<Response, OpenIDError> {
        let url = Url::parse(response_url)?;
        let params = ResponseParameters::from_url(&url);

        match params.get("openid.mode") {
            "id_res" => {},
            "cancel" => return Err(OpenIDError::LoginCancelledError),
            "error" => {
                return Err(OpenIDError::OpenIDProviderError {
                    message: params.get("openid.error").to_string(),
                    contact: params.get("openid.contact").to_string(),
                    reference: params.get("openid.reference").to_string(),
                })
            },
            mode => {
                return Err(OpenIDError::UnrecognizedModeError { mode: mode.to_string() });
            },
        }

        let endpoint = params.get("openid.op_endpoint");
        if endpoint != self.server.openid_url() {
            return Err(OpenIDError::EndpointMismatchError {
                endpoint: endpoint.to_string(),
            });
        }

        let claimed_id = self
            .verifier
            .verify(response_url, &*self.discovery_cache, &*self.nonce_store)
            .map_err(|error| OpenIDError::VerificationError { error })?;
        log::debug!("Verified OpenID assertion for {}.", claimed_id);

        let signed = params.signed();

        Ok(Response {
            claimed_id,
            teams: params.teams(&signed),
            sreg: params.sreg(&signed),
            discharge: params.discharge(&signed),
        })
    }
}
