use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The request body for acquiring a new OAuth token.
#[derive(Clone, Debug, Serialize)]
pub struct TokenRequest {
    pub email: String,
    pub password: String,
    /// Name under which the token is listed in the user's account.
    pub token_name: String,
    /// One-time password, for accounts with two-factor authentication.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub otp: Option<String>,
}

impl TokenRequest {
    pub fn new(email: impl Into<String>, password: impl Into<String>, token_name: impl Into<String>) -> Self {
        TokenRequest {
            email: email.into(),
            password: password.into(),
            token_name: token_name.into(),
            otp: None,
        }
    }

    pub fn otp(mut self, otp: impl Into<String>) -> Self {
        self.otp = Some(otp.into());
        self
    }
}

/// Details about an Ubuntu SSO account. Fields that are not known here are kept in `extra`.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct AccountDetails {
    #[serde(default)]
    pub href: Option<String>,
    #[serde(default)]
    pub openid: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub displayname: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub verified: Option<bool>,
    #[serde(default)]
    pub emails: Vec<Value>,
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

/// Details about an OAuth token. Fields that are not known here are kept in `extra`.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct TokenDetails {
    #[serde(default)]
    pub href: Option<String>,
    #[serde(default)]
    pub token_key: Option<String>,
    #[serde(default)]
    pub token_name: Option<String>,
    #[serde(default)]
    pub consumer_key: Option<String>,
    #[serde(default)]
    pub date_created: Option<String>,
    #[serde(default)]
    pub date_updated: Option<String>,
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_request_without_otp() {
        let request = TokenRequest::new("foo@example.com", "s3cret", "my-token");

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            serde_json::json!({"email": "foo@example.com", "password": "s3cret", "token_name": "my-token"})
        );
    }

    #[test]
    fn test_token_request_with_otp() {
        let request = TokenRequest::new("foo@example.com", "s3cret", "my-token").otp("123456");

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            serde_json::json!({
                "email": "foo@example.com",
                "password": "s3cret",
                "token_name": "my-token",
                "otp": "123456",
            })
        );
    }

    #[test]
    fn test_account_details_keep_unknown_fields() {
        let details: AccountDetails = serde_json::from_str(
            r#"{
                "openid": "AAAAAA",
                "username": "foo",
                "displayname": "Foo Bar",
                "email": "foo@example.com",
                "verified": true,
                "emails": [{"href": "/api/v2/emails/foo@example.com"}],
                "status": "Active"
            }"#,
        )
        .unwrap();

        assert_eq!(details.username.as_deref(), Some("foo"));
        assert_eq!(details.verified, Some(true));
        assert_eq!(details.emails.len(), 1);
        assert_eq!(details.extra.get("status"), Some(&Value::from("Active")));
    }

    #[test]
    fn test_token_details_minimal() {
        let details: TokenDetails = serde_json::from_str(r#"{"token_key": "abcd"}"#).unwrap();

        assert_eq!(details.token_key.as_deref(), Some("abcd"));
        assert_eq!(details.token_name, None);
        assert!(details.extra.is_empty());
    }
}
