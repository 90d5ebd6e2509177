use crate::server::UbuntuSsoServer;

/// The result of discovering an OpenID identifier.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiscoveredInfo {
    pub op_endpoint: String,
    pub op_local_id: String,
    pub claimed_id: String,
}

/// Caches discovery results, so verifying an assertion does not require a discovery lookup.
pub trait DiscoveryCache: Send + Sync {
    fn put(&self, id: &str, info: DiscoveredInfo);
    fn get(&self, id: &str) -> Option<DiscoveredInfo>;
}

/// A [`DiscoveryCache`] that answers from what is known about Ubuntu SSO instead of from stored
/// results: every identifier under the server's login URL is its own local identifier, and is
/// served by the server's OpenID endpoint.
#[derive(Clone, Debug)]
pub struct UssoDiscoveryCache {
    server: UbuntuSsoServer,
}

impl UssoDiscoveryCache {
    pub fn new(server: UbuntuSsoServer) -> Self {
        UssoDiscoveryCache { server }
    }
}

impl DiscoveryCache for UssoDiscoveryCache {
    /// Discovery results are never stored.
    fn put(&self, _id: &str, _info: DiscoveredInfo) {}

    fn get(&self, id: &str) -> Option<DiscoveredInfo> {
        if !id.starts_with(&self.server.login_url()) {
            return None;
        }

        Some(DiscoveredInfo {
            op_endpoint: self.server.openid_url(),
            op_local_id: id.to_string(),
            claimed_id: id.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_identifier() {
        let cache = UssoDiscoveryCache::new(UbuntuSsoServer::production());
        let info = cache.get("https://login.ubuntu.com/+id/AAAAAA").unwrap();

        assert_eq!(info.claimed_id, "https://login.ubuntu.com/+id/AAAAAA");
        assert_eq!(info.op_local_id, "https://login.ubuntu.com/+id/AAAAAA");
        assert_eq!(info.op_endpoint, "https://login.ubuntu.com/+openid");
    }

    #[test]
    fn test_foreign_identifier() {
        let cache = UssoDiscoveryCache::new(UbuntuSsoServer::production());

        assert_eq!(cache.get("https://login.staging.ubuntu.com/+id/AAAAAA"), None);
        assert_eq!(cache.get("https://example.com/+id/AAAAAA"), None);
    }

    #[test]
    fn test_put_is_ignored() {
        let cache = UssoDiscoveryCache::new(UbuntuSsoServer::staging());
        let info = DiscoveredInfo {
            op_endpoint: String::from("https://example.com/openid"),
            op_local_id: String::from("https://example.com/id"),
            claimed_id: String::from("https://example.com/id"),
        };

        cache.put("https://example.com/id", info);
        assert_eq!(cache.get("https://example.com/id"), None);
    }
}
