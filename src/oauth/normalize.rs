//! URL and parameter normalization (RFC 5849, section 3.4.1).

use std::collections::BTreeMap;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use url::Url;

use super::error::OAuthError;

/// OAuth unreserved characters: A-Z a-z 0-9 - . _ ~
const OAUTH_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'.').remove(b'_').remove(b'~');

/// Name of the parameter that carries a signature. It is never signed itself.
pub(crate) const OAUTH_SIGNATURE: &str = "oauth_signature";

/// Percent-encode a string the way OAuth requires it: everything except unreserved characters is
/// escaped as `%XX` with uppercase hex digits, so a space becomes `%20` and never `+`.
pub fn percent_encode(input: &str) -> String {
    utf8_percent_encode(input, OAUTH_ENCODE_SET).to_string()
}

/// A multi-valued collection of request parameters.
///
/// Keys are unique and kept in byte-wise order; the values of each key keep the order in which
/// they were added.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Params {
    inner: BTreeMap<String, Vec<String>>,
}

impl Params {
    /// Creates an empty parameter collection.
    pub fn new() -> Self {
        Params::default()
    }

    /// Collects the query parameters of a URL, in order of appearance.
    pub fn from_query(url: &Url) -> Self {
        url.query_pairs().collect()
    }

    /// Adds a value for the given key, after any values that are already present.
    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.inner.entry(key.into()).or_default().push(value.into());
    }

    /// Returns all values for the given key.
    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.inner.get(key).map(Vec::as_slice)
    }

    /// Removes a key and returns its values.
    pub fn remove(&mut self, key: &str) -> Option<Vec<String>> {
        self.inner.remove(key)
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Iterates over keys in byte-wise order, together with their values.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.inner.iter().map(|(key, values)| (key.as_str(), values.as_slice()))
    }

    /// Sorts the values of every key by their percent-encoded form.
    pub(crate) fn sort_values(&mut self) {
        for values in self.inner.values_mut() {
            values.sort_by_cached_key(|value| percent_encode(value));
        }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Params::new();
        params.extend(iter);
        params
    }
}

impl<K: Into<String>, V: Into<String>> Extend<(K, V)> for Params {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.append(key, value);
        }
    }
}

/// Normalize a URL for signing: port 80 of `http` and port 443 of `https` are dropped, any other
/// port is kept as written, and the query string and fragment are removed.
///
/// The path is used as written, so `https://localhost` stays without a trailing slash.
pub fn normalize_url(input: &str) -> Result<String, OAuthError> {
    let malformed = |error| OAuthError::MalformedUrlError {
        url: input.to_string(),
        error,
    };

    let parsed = Url::parse(input).map_err(malformed)?;
    let host = parsed.host_str().ok_or_else(|| malformed(url::ParseError::EmptyHost))?;
    let (authority, has_path) = split_authority(input, is_special(parsed.scheme()));

    // Url::port() hides a port that equals the scheme default, even for schemes other than http(s)
    let port = parsed.port().or_else(|| written_port(authority));

    let authority = match (parsed.scheme(), port) {
        ("http", Some(80)) | ("https", Some(443)) | (_, None) => host.to_string(),
        (_, Some(port)) => format!("{}:{}", host, port),
    };

    let path = if has_path { parsed.path() } else { "" };

    Ok(format!("{}://{}{}", parsed.scheme(), authority, path))
}

/// Schemes for which `\` separates path segments like `/` does.
fn is_special(scheme: &str) -> bool {
    matches!(scheme, "http" | "https" | "ws" | "wss" | "ftp" | "file")
}

/// Splits the authority component off a URL as written, and checks whether a path follows it.
fn split_authority(input: &str, special: bool) -> (&str, bool) {
    let rest = input.split_once("://").map_or(input, |(_, rest)| rest);
    let is_path_separator = |c: char| c == '/' || (special && c == '\\');

    match rest.find(|c: char| is_path_separator(c) || c == '?' || c == '#') {
        Some(index) => (&rest[..index], rest[index..].starts_with(is_path_separator)),
        None => (rest, false),
    }
}

/// The port given in an authority component, if any.
fn written_port(authority: &str) -> Option<u16> {
    let host_port = authority.rsplit_once('@').map_or(authority, |(_, host_port)| host_port);
    let (_, port) = host_port.rsplit_once(':')?;
    port.parse().ok()
}

/// Normalize request parameters for signing: `oauth_signature` is left out, keys are sorted
/// byte-wise, every value of a key is emitted as `key=value` (both percent-encoded) in stored
/// order, and the pairs are joined with `&`.
pub fn normalize_parameters(params: &Params) -> String {
    params
        .iter()
        .filter(|(key, _)| *key != OAUTH_SIGNATURE)
        .flat_map(|(key, values)| {
            let key = percent_encode(key);
            values
                .iter()
                .map(move |value| format!("{}={}", key, percent_encode(value)))
        })
        .collect::<Vec<_>>()
        .join("&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_encode_unreserved() {
        assert_eq!(percent_encode("abcXYZ019"), "abcXYZ019");
        assert_eq!(percent_encode("-._~"), "-._~");
    }

    #[test]
    fn test_percent_encode_reserved() {
        assert_eq!(percent_encode(" "), "%20");
        assert_eq!(percent_encode("&"), "%26");
        assert_eq!(percent_encode("="), "%3D");
        assert_eq!(percent_encode("+"), "%2B");
        assert_eq!(percent_encode("/"), "%2F");
        assert_eq!(percent_encode("é"), "%C3%A9");
    }

    #[test]
    fn test_normalize_url_basic() {
        assert_eq!(normalize_url("http://example.com/path").unwrap(), "http://example.com/path");
    }

    #[test]
    fn test_normalize_url_strips_default_ports() {
        assert_eq!(normalize_url("http://example.com:80/path").unwrap(), "http://example.com/path");
        assert_eq!(normalize_url("https://example.com:443/path").unwrap(), "https://example.com/path");
    }

    #[test]
    fn test_normalize_url_keeps_other_ports() {
        assert_eq!(normalize_url("http://example.com:8080/").unwrap(), "http://example.com:8080/");
        assert_eq!(normalize_url("http://example.com:443/").unwrap(), "http://example.com:443/");
        assert_eq!(normalize_url("https://example.com:80/").unwrap(), "https://example.com:80/");
    }

    #[test]
    fn test_normalize_url_keeps_default_ports_of_other_schemes() {
        assert_eq!(normalize_url("ftp://example.com:21/x").unwrap(), "ftp://example.com:21/x");
        assert_eq!(normalize_url("ws://example.com:80/x").unwrap(), "ws://example.com:80/x");
        assert_eq!(normalize_url("wss://user@example.com:443/x").unwrap(), "wss://example.com:443/x");
        assert_eq!(normalize_url("ftp://example.com/x").unwrap(), "ftp://example.com/x");
        assert_eq!(normalize_url("http://[::1]:80/x").unwrap(), "http://[::1]/x");
        assert_eq!(normalize_url("ws://[::1]:80/x").unwrap(), "ws://[::1]:80/x");
        assert_eq!(normalize_url("ws://[::1]/x").unwrap(), "ws://[::1]/x");
    }

    #[test]
    fn test_normalize_url_backslash_path() {
        let input = "https://example.com\\api";

        assert_eq!(Url::parse(input).unwrap().path(), "/api");
        assert_eq!(normalize_url(input).unwrap(), "https://example.com/api");
        assert_eq!(normalize_url("https://example.com:8443\\").unwrap(), "https://example.com:8443/");
    }

    #[test]
    fn test_normalize_url_drops_query_and_fragment() {
        assert_eq!(
            normalize_url("http://example.com/path?query=value&param=arg").unwrap(),
            "http://example.com/path"
        );
        assert_eq!(normalize_url("http://example.com/path#section").unwrap(), "http://example.com/path");
        assert_eq!(normalize_url("https://localhost?a=1").unwrap(), "https://localhost");
    }

    #[test]
    fn test_normalize_url_without_path() {
        assert_eq!(normalize_url("https://localhost").unwrap(), "https://localhost");
        assert_eq!(normalize_url("https://localhost:443").unwrap(), "https://localhost");
    }

    #[test]
    fn test_normalize_url_malformed() {
        assert!(matches!(
            normalize_url("://return.to"),
            Err(OAuthError::MalformedUrlError { .. })
        ));
        assert!(matches!(
            normalize_url("not a url"),
            Err(OAuthError::MalformedUrlError { .. })
        ));
        assert!(matches!(
            normalize_url("mailto:someone@example.com"),
            Err(OAuthError::MalformedUrlError { .. })
        ));
    }

    #[test]
    fn test_normalize_parameters_single() {
        let params: Params = [("param", "value")].into_iter().collect();
        assert_eq!(normalize_parameters(&params), "param=value");
    }

    #[test]
    fn test_normalize_parameters_sorted() {
        let forward: Params = [("a", "1"), ("b", "2"), ("c", "3")].into_iter().collect();
        let backward: Params = [("c", "3"), ("b", "2"), ("a", "1")].into_iter().collect();

        assert_eq!(normalize_parameters(&forward), "a=1&b=2&c=3");
        assert_eq!(normalize_parameters(&backward), "a=1&b=2&c=3");
    }

    #[test]
    fn test_normalize_parameters_sorts_bytewise() {
        let params: Params = [("b", "1"), ("B", "2"), ("a", "3")].into_iter().collect();
        assert_eq!(normalize_parameters(&params), "B=2&a=3&b=1");
    }

    #[test]
    fn test_normalize_parameters_keeps_value_order() {
        let params: Params = [("a", "B"), ("z", ""), ("a", "A")].into_iter().collect();
        assert_eq!(normalize_parameters(&params), "a=B&a=A&z=");
    }

    #[test]
    fn test_normalize_parameters_escapes() {
        let params: Params = [("a&b", "1")].into_iter().collect();
        assert_eq!(normalize_parameters(&params), "a%26b=1");

        let params: Params = [("q", "hello world")].into_iter().collect();
        assert_eq!(normalize_parameters(&params), "q=hello%20world");
    }

    #[test]
    fn test_normalize_parameters_omits_signature() {
        let params: Params = [("a", "1"), ("oauth_signature", "foobarsplatszot"), ("z", "26")]
            .into_iter()
            .collect();
        assert_eq!(normalize_parameters(&params), "a=1&z=26");
    }

    #[test]
    fn test_params_from_query() {
        let url = Url::parse("https://example.com/?b=2&a=1&b=3").unwrap();
        let params = Params::from_query(&url);

        assert_eq!(params.get("a").unwrap(), &["1".to_string()]);
        assert_eq!(params.get("b").unwrap(), &["2".to_string(), "3".to_string()]);
        assert!(params.get("c").is_none());
    }
}
