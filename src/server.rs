//! This module describes the Ubuntu SSO instance that requests are made against.

/// This is the base URL of the "production" Ubuntu SSO instance.
pub const PRODUCTION_BASE_URL: &str = "https://login.ubuntu.com";

/// This is the base URL of the "staging" Ubuntu SSO instance. Use it for testing.
pub const STAGING_BASE_URL: &str = "https://login.staging.ubuntu.com";

/// An Ubuntu SSO instance, identified by its base URL. Every endpoint of the instance is derived
/// from it.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct UbuntuSsoServer {
    base_url: String,
}

impl UbuntuSsoServer {
    /// The production Ubuntu SSO server at <https://login.ubuntu.com>.
    pub fn production() -> Self {
        UbuntuSsoServer::custom(PRODUCTION_BASE_URL)
    }

    /// The staging Ubuntu SSO server at <https://login.staging.ubuntu.com>.
    pub fn staging() -> Self {
        UbuntuSsoServer::custom(STAGING_BASE_URL)
    }

    /// A server at a custom location, for example a local test instance. A trailing slash is
    /// ignored.
    pub fn custom(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        UbuntuSsoServer { base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The URL users log in at. OpenID identifiers issued by the server start with it.
    pub fn login_url(&self) -> String {
        format!("{}/", self.base_url)
    }

    /// The OpenID 2.0 provider endpoint.
    pub fn openid_url(&self) -> String {
        format!("{}/+openid", self.base_url)
    }

    /// The endpoint where OAuth tokens are requested.
    pub fn token_url(&self) -> String {
        format!("{}/api/v2/tokens/oauth", self.base_url)
    }

    /// The endpoint with details about a single OAuth token.
    pub fn token_details_url(&self, token_key: &str) -> String {
        format!("{}/{}", self.token_url(), token_key)
    }

    /// The endpoint with details about the account owning a consumer key.
    pub fn account_url(&self, consumer_key: &str) -> String {
        format!("{}/api/v2/accounts/{}", self.base_url, consumer_key)
    }
}

impl Default for UbuntuSsoServer {
    fn default() -> Self {
        UbuntuSsoServer::production()
    }
}
