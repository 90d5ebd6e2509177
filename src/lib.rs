//! This crate contains client-side building blocks for Ubuntu SSO (<https://login.ubuntu.com>).
//!
//! - [`oauth`]: signing HTTP requests with OAuth 1.0a credentials (`PLAINTEXT` or `HMAC-SHA1`)
//! - [`openid`]: logging users in with OpenID 2.0, including the team membership, simple
//!   registration and macaroon extensions supported by Ubuntu SSO
//! - [`session`]: acquiring OAuth tokens and reading account details via the REST API

use std::time::Duration;

/// User agent sent by [`Session`]s unless overridden.
pub const USSO_USER_AGENT: &str = "usso-rs";

/// Request timeout of [`Session`]s unless overridden.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

pub mod oauth;
pub use oauth::{AuthorizationSigner, Credentials, OAuthError, RequestParameters, SignatureMethod};

pub mod openid;
pub use openid::OpenIDError;

pub mod server;
pub use server::UbuntuSsoServer;

pub mod session;
pub use session::{Session, SessionBuilder, SsoError, TokenRequest};
