use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};

use super::error::NonceError;

/// Length of the UTC timestamp at the start of every response nonce, e.g.
/// `2005-05-15T17:11:51Z`.
const TIMESTAMP_LENGTH: usize = 20;

/// Stores the response nonces of accepted assertions, so that a response cannot be processed
/// twice.
///
/// Implementations must be safe to share between threads that verify logins concurrently.
pub trait NonceStore: Send + Sync {
    /// Record the nonce of a response from the given OpenID endpoint, or refuse it if it was
    /// already used or is not acceptable.
    fn accept(&self, endpoint: &str, nonce: &str) -> Result<(), NonceError>;
}

/// An in-memory [`NonceStore`]. Nonces are remembered for as long as their timestamp is within
/// the maximum age; older nonces are refused, so forgetting them is safe.
#[derive(Debug)]
pub struct SimpleNonceStore {
    seen: Mutex<HashMap<String, Vec<(DateTime<Utc>, String)>>>,
    max_age: Duration,
    clock: fn() -> DateTime<Utc>,
}

impl SimpleNonceStore {
    /// Creates an empty store that accepts nonces up to one minute old.
    pub fn new() -> Self {
        SimpleNonceStore {
            seen: Mutex::new(HashMap::new()),
            max_age: Duration::seconds(60),
            clock: Utc::now,
        }
    }

    /// This method can be used to override the maximum accepted nonce age.
    pub fn max_age(mut self, max_age: Duration) -> Self {
        self.max_age = max_age;
        self
    }

    /// This method can be used to override the clock the nonce age is measured against.
    pub fn clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }
}

impl Default for SimpleNonceStore {
    fn default() -> Self {
        SimpleNonceStore::new()
    }
}

impl NonceStore for SimpleNonceStore {
    fn accept(&self, endpoint: &str, nonce: &str) -> Result<(), NonceError> {
        let timestamp = nonce
            .get(..TIMESTAMP_LENGTH)
            .and_then(|stamp| DateTime::parse_from_rfc3339(stamp).ok())
            .map(|stamp| stamp.with_timezone(&Utc))
            .ok_or_else(|| NonceError::Malformed {
                nonce: nonce.to_string(),
            })?;

        let now = (self.clock)();
        if now - timestamp > self.max_age || timestamp - now > self.max_age {
            log::warn!("Refusing expired OpenID response nonce from {}.", endpoint);
            return Err(NonceError::Expired {
                nonce: nonce.to_string(),
            });
        }

        let mut seen = self.seen.lock().unwrap();
        let nonces = seen.entry(endpoint.to_string()).or_default();
        nonces.retain(|(stamp, _)| now - *stamp <= self.max_age);

        if nonces.iter().any(|(_, seen)| seen == nonce) {
            log::warn!("Refusing replayed OpenID response nonce from {}.", endpoint);
            return Err(NonceError::Replayed {
                nonce: nonce.to_string(),
            });
        }

        nonces.push((timestamp, nonce.to_string()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ENDPOINT: &str = "https://login.ubuntu.com/+openid";

    fn fixed_clock() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2005-05-15T17:12:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn store() -> SimpleNonceStore {
        SimpleNonceStore::new().clock(fixed_clock)
    }

    #[test]
    fn test_accepts_fresh_nonce() {
        assert_eq!(store().accept(ENDPOINT, "2005-05-15T17:11:51ZUNIQUE"), Ok(()));
    }

    #[test]
    fn test_refuses_replayed_nonce() {
        let store = store();

        assert_eq!(store.accept(ENDPOINT, "2005-05-15T17:11:51ZUNIQUE"), Ok(()));
        assert_eq!(
            store.accept(ENDPOINT, "2005-05-15T17:11:51ZUNIQUE"),
            Err(NonceError::Replayed {
                nonce: String::from("2005-05-15T17:11:51ZUNIQUE")
            })
        );
    }

    #[test]
    fn test_same_nonce_from_other_endpoint() {
        let store = store();

        assert_eq!(store.accept(ENDPOINT, "2005-05-15T17:11:51ZUNIQUE"), Ok(()));
        assert_eq!(
            store.accept("https://login.staging.ubuntu.com/+openid", "2005-05-15T17:11:51ZUNIQUE"),
            Ok(())
        );
    }

    #[test]
    fn test_refuses_old_nonce() {
        assert!(matches!(
            store().accept(ENDPOINT, "2005-05-15T17:00:00ZUNIQUE"),
            Err(NonceError::Expired { .. })
        ));
    }

    #[test]
    fn test_refuses_future_nonce() {
        assert!(matches!(
            store().accept(ENDPOINT, "2005-05-15T17:30:00ZUNIQUE"),
            Err(NonceError::Expired { .. })
        ));
    }

    #[test]
    fn test_max_age_override() {
        let store = store().max_age(Duration::hours(1));
        assert_eq!(store.accept(ENDPOINT, "2005-05-15T17:00:00ZUNIQUE"), Ok(()));
    }

    #[test]
    fn test_refuses_malformed_nonce() {
        for nonce in ["", "UNIQUE", "2005-05-15 17:11:51 UNIQUE", "2005-13-45T17:11:51ZUNIQUE"] {
            assert!(
                matches!(store().accept(ENDPOINT, nonce), Err(NonceError::Malformed { .. })),
                "nonce {:?} should be malformed",
                nonce
            );
        }
    }

    #[test]
    fn test_shared_between_threads() {
        let store = std::sync::Arc::new(store());

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = store.clone();
                std::thread::spawn(move || store.accept(ENDPOINT, &format!("2005-05-15T17:11:51Z{}", i)))
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), Ok(()));
        }
    }
}
