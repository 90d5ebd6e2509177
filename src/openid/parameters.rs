use std::collections::{HashMap, HashSet};

use url::Url;

use super::macaroon::Discharge;

/// Namespace of OpenID 2.0 messages.
pub(crate) const NS_OPENID: &str = "http://specs.openid.net/auth/2.0";

/// Identifier that lets the user choose which identity to log in with.
pub(crate) const IDENTIFIER_SELECT: &str = "http://specs.openid.net/auth/2.0/identifier_select";

/// Namespace of the Launchpad team membership extension.
pub const NS_TEAMS: &str = "http://ns.launchpad.net/2007/openid-teams";

/// Namespace of the simple registration extension.
pub const NS_SREG: &str = "http://openid.net/extensions/sreg/1.1";

/// Namespace of the Ubuntu SSO macaroon extension.
pub const NS_MACAROON: &str = "http://ns.login.ubuntu.com/2016/openid-macaroon";

/// Simple registration fields supported by Ubuntu SSO.
pub mod sreg {
    pub const NICKNAME: &str = "nickname";
    pub const EMAIL: &str = "email";
    pub const FULL_NAME: &str = "fullname";
    pub const POSTCODE: &str = "postcode";
    pub const COUNTRY: &str = "country";
    pub const LANGUAGE: &str = "language";
    pub const TIMEZONE: &str = "timezone";

    // non-standard fields
    pub const ADDRESS1: &str = "x_address1";
    pub const ADDRESS2: &str = "x_address2";
    pub const CITY: &str = "x_city";
    pub const PROVINCE: &str = "x_province";
    pub const PHONE: &str = "x_phone";
}

/// The parameters of an OpenID login request. Empty fields are left out of the request.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Request {
    /// The callback address of the service; this is where the login response will come.
    pub return_to: String,
    /// The realm the user is logging into. See
    /// <http://openid.net/specs/openid-authentication-2_0.html#realms> for details.
    pub realm: String,
    /// Launchpad teams to query the membership of.
    pub teams: Vec<String>,
    /// Simple registration fields the service requires.
    pub sreg_required: Vec<String>,
    /// Simple registration fields the service would like to have.
    pub sreg_optional: Vec<String>,
    /// Identifier of a third party caveat that Ubuntu SSO should discharge.
    pub caveat_id: String,
}

impl Request {
    pub fn new(return_to: impl Into<String>) -> Self {
        Request {
            return_to: return_to.into(),
            ..Request::default()
        }
    }
}

/// The values asserted by Ubuntu SSO after a successful login.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Response {
    /// The verified claimed identifier of the user.
    pub claimed_id: String,
    /// The requested teams the user is a member of.
    pub teams: Vec<String>,
    /// Simple registration fields, keyed by field name.
    pub sreg: HashMap<String, String>,
    /// The discharge macaroon for the requested caveat, if one was returned and could be decoded.
    pub discharge: Option<Discharge>,
}

/// The `openid.*` parameters of a response URL. Missing parameters read as empty strings, and
/// only the first value of a repeated parameter is kept.
#[derive(Debug)]
pub(crate) struct ResponseParameters {
    values: HashMap<String, String>,
}

impl ResponseParameters {
    pub(crate) fn from_url(url: &Url) -> Self {
        let mut values = HashMap::new();
        for (key, value) in url.query_pairs() {
            values.entry(key.into_owned()).or_insert_with(|| value.into_owned());
        }
        ResponseParameters { values }
    }

    pub(crate) fn get(&self, key: &str) -> &str {
        self.values.get(key).map_or("", String::as_str)
    }

    /// Field names listed in `openid.signed`, without their `openid.` prefix.
    pub(crate) fn signed(&self) -> HashSet<&str> {
        self.get("openid.signed").split(',').filter(|field| !field.is_empty()).collect()
    }

    /// Team memberships, if the extension is present and its field is signed.
    pub(crate) fn teams(&self, signed: &HashSet<&str>) -> Vec<String> {
        if self.get("openid.ns.lp") != NS_TEAMS || !signed.contains("lp.is_member") {
            return Vec::new();
        }

        self.get("openid.lp.is_member")
            .split(',')
            .filter(|team| !team.is_empty())
            .map(String::from)
            .collect()
    }

    /// Simple registration fields that are signed, if the extension is present.
    pub(crate) fn sreg(&self, signed: &HashSet<&str>) -> HashMap<String, String> {
        if self.get("openid.ns.sreg") != NS_SREG {
            return HashMap::new();
        }

        self.values
            .iter()
            .filter_map(|(key, value)| {
                let field = key.strip_prefix("openid.")?;
                let name = field.strip_prefix("sreg.")?;
                signed.contains(field).then(|| (name.to_string(), value.clone()))
            })
            .collect()
    }

    /// The discharge macaroon, if the extension is present and its field is signed. A discharge
    /// that cannot be decoded is dropped.
    pub(crate) fn discharge(&self, signed: &HashSet<&str>) -> Option<Discharge> {
        if self.get("openid.ns.macaroon") != NS_MACAROON || !signed.contains("macaroon.discharge") {
            return None;
        }

        match Discharge::from_base64(self.get("openid.macaroon.discharge")) {
            Ok(discharge) => Some(discharge),
            Err(error) => {
                log::warn!("Ignoring undecodable discharge macaroon: {}", error);
                None
            },
        }
    }
}
