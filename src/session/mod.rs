//! This module contains a thin client for the Ubuntu SSO REST API: acquiring OAuth tokens with an
//! email address and password, and reading account and token details with signed requests.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;

use crate::oauth::{AuthorizationSigner, Credentials, RequestParameters};
use crate::server::UbuntuSsoServer;
use crate::{DEFAULT_TIMEOUT, USSO_USER_AGENT};

mod error;
pub use error::{ProviderError, SsoError, TWO_FACTOR_REQUIRED};

mod types;
pub use types::{AccountDetails, TokenDetails, TokenRequest};

/// A session for making requests against one Ubuntu SSO server.
#[derive(Debug)]
pub struct Session {
    client: Client,
    server: UbuntuSsoServer,
    signer: Mutex<AuthorizationSigner>,
}

impl Session {
    /// This method creates a builder for a session with default settings.
    pub fn builder<'a>(server: UbuntuSsoServer) -> SessionBuilder<'a> {
        SessionBuilder::new(server)
    }

    /// This method creates a session that uses an already configured HTTP client.
    pub fn with_client(server: UbuntuSsoServer, client: Client) -> Self {
        Session {
            client,
            server,
            signer: Mutex::new(AuthorizationSigner::new()),
        }
    }

    /// This method can be used to override the signer of authenticated requests, for example to
    /// escape the realm or to use a different random source.
    pub fn signer(mut self, signer: AuthorizationSigner) -> Self {
        self.signer = Mutex::new(signer);
        self
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn server(&self) -> &UbuntuSsoServer {
        &self.server
    }

    /// Request a new OAuth token.
    ///
    /// If the account has two-factor authentication enabled and no one-time password was given,
    /// this fails with a [`ProviderError`] for which
    /// [`is_two_factor_required`](ProviderError::is_two_factor_required) returns `true`.
    pub async fn get_token(&self, request: &TokenRequest) -> Result<Credentials, SsoError> {
        let response = self.client.post(self.server.token_url()).json(request).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(SsoError::InvalidCredentialsError);
        }

        let credentials: Credentials = parse_response(response).await?;
        log::info!("Acquired OAuth token {:?} from {}.", credentials.token_name, self.server.base_url());

        Ok(credentials)
    }

    /// Read the details of the account that owns the given token.
    pub async fn get_account(&self, credentials: &Credentials) -> Result<AccountDetails, SsoError> {
        self.signed_get(self.server.account_url(&credentials.consumer_key), credentials)
            .await
    }

    /// Read the details of the given token.
    pub async fn get_token_details(&self, credentials: &Credentials) -> Result<TokenDetails, SsoError> {
        self.signed_get(self.server.token_details_url(&credentials.token_key), credentials)
            .await
    }

    async fn signed_get<T: DeserializeOwned>(&self, url: String, credentials: &Credentials) -> Result<T, SsoError> {
        let mut params = RequestParameters::new("GET", url.as_str());
        let request = {
            let mut signer = self.signer.lock().unwrap_or_else(PoisonError::into_inner);
            signer.sign(credentials, &mut params, self.client.get(url))?
        };

        let response = request.send().await?;
        parse_response(response).await
    }
}

/// Deserialize the body of a successful response, or turn an unsuccessful one into the matching
/// [`SsoError`].
async fn parse_response<T: DeserializeOwned>(response: Response) -> Result<T, SsoError> {
    let status = response.status();
    let body = response.text().await?;

    if status.is_success() {
        return Ok(serde_json::from_str(&body)?);
    }

    match serde_json::from_str::<ProviderError>(&body) {
        Ok(error) => Err(SsoError::ProviderError(error)),
        Err(_) => Err(SsoError::ProviderProtocolError {
            status: status.as_u16(),
            body,
        }),
    }
}

/// Use this builder to construct a [`Session`] with custom settings.
///
/// ```
/// use std::time::Duration;
///
/// use usso::{Session, UbuntuSsoServer};
///
/// let session = Session::builder(UbuntuSsoServer::staging())
///     .timeout(Duration::from_secs(120))
///     .user_agent("rustdoc")
///     .build()
///     .unwrap();
/// ```
#[derive(Debug)]
pub struct SessionBuilder<'a> {
    server: UbuntuSsoServer,
    timeout: Option<Duration>,
    user_agent: Option<&'a str>,
    signer: Option<AuthorizationSigner>,
}

impl<'a> SessionBuilder<'a> {
    pub fn new(server: UbuntuSsoServer) -> Self {
        SessionBuilder {
            server,
            timeout: None,
            user_agent: None,
            signer: None,
        }
    }

    /// This method can be used to override the default request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// This method can be used to override the default request user agent.
    pub fn user_agent(mut self, user_agent: &'a str) -> Self {
        self.user_agent = Some(user_agent);
        self
    }

    /// This method can be used to override the signer of authenticated requests.
    pub fn signer(mut self, signer: AuthorizationSigner) -> Self {
        self.signer = Some(signer);
        self
    }

    pub fn build(self) -> Result<Session, SsoError> {
        let timeout = self.timeout.unwrap_or(DEFAULT_TIMEOUT);
        let user_agent = self.user_agent.unwrap_or(USSO_USER_AGENT);

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .default_headers(headers)
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;

        Ok(Session {
            client,
            server: self.server,
            signer: Mutex::new(self.signer.unwrap_or_default()),
        })
    }
}
