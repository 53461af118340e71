//! A concurrent cache of derived signing keys.

use {
    crate::{constants::SHA256_OUTPUT_LEN, context::CredentialScope, crypto::sha256, KSecretKey, KSigningKey},
    chrono::NaiveDate,
    dashmap::DashMap,
    log::trace,
    std::fmt::{Debug, Formatter, Result as FmtResult},
};

/// `(date, region, service, sha256(secret))`. The secret itself is never stored.
type CacheKey = (NaiveDate, String, String, [u8; SHA256_OUTPUT_LEN]);

/// Signing keys keyed by credential scope and a hash of the secret key.
///
/// A signing key is valid for one day, so inserting a key for date `D` evicts every entry for a
/// date before `D`. Signing with or without the cache produces identical signatures.
#[derive(Default)]
pub struct SigningKeyCache {
    keys: DashMap<CacheKey, KSigningKey>,
}

impl SigningKeyCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the signing key for `scope`, deriving and caching it if necessary.
    pub fn get_or_derive<const M: usize>(&self, secret_key: &KSecretKey<M>, scope: &CredentialScope) -> KSigningKey {
        let cache_key =
            (scope.date(), scope.region().to_string(), scope.service().to_string(), sha256(secret_key.as_ref()));

        if let Some(key) = self.keys.get(&cache_key) {
            trace!("get_or_derive: cache hit for {}", scope);
            return *key;
        }

        trace!("get_or_derive: cache miss for {}", scope);
        let key = secret_key.derive_signing_key(scope);
        self.evict_before(scope.date());
        self.keys.insert(cache_key, key);
        key
    }

    /// Remove every entry for a date before `date`.
    pub fn evict_before(&self, date: NaiveDate) {
        self.keys.retain(|(entry_date, ..), _| *entry_date >= date);
    }

    /// The number of cached keys.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Indicates whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl Debug for SigningKeyCache {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("SigningKeyCache").field("len", &self.keys.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use {
        super::SigningKeyCache,
        crate::{context::CredentialScope, KSecretKey},
        chrono::NaiveDate,
        std::{str::FromStr, sync::Arc, thread},
    };

    const SECRET: &str = "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY";

    fn scope(day: u32, region: &str) -> CredentialScope {
        CredentialScope::new(NaiveDate::from_ymd_opt(2015, 8, day).unwrap(), region, "service")
    }

    #[test_log::test]
    fn test_cache_is_transparent() {
        let cache = SigningKeyCache::new();
        let secret = <KSecretKey>::from_str(SECRET).unwrap();

        assert!(cache.is_empty());
        let first = cache.get_or_derive(&secret, &scope(30, "us-east-1"));
        let second = cache.get_or_derive(&secret, &scope(30, "us-east-1"));
        assert_eq!(first, second);
        assert_eq!(first, secret.derive_signing_key(&scope(30, "us-east-1")));
        assert_eq!(
            hex::encode(first.as_ref()),
            "938127b5336810ddb6a5d6af445fcac9e371f9ed418ed386b022aed82901be75"
        );
        assert_eq!(cache.len(), 1);

        let west = cache.get_or_derive(&secret, &scope(30, "us-west-2"));
        assert_ne!(first, west);
        assert_eq!(cache.len(), 2);

        let other_secret = <KSecretKey>::from_str("another-secret").unwrap();
        let other = cache.get_or_derive(&other_secret, &scope(30, "us-east-1"));
        assert_ne!(first, other);
        assert_eq!(cache.len(), 3);
    }

    #[test_log::test]
    fn test_cache_evicts_old_dates() {
        let cache = SigningKeyCache::new();
        let secret = <KSecretKey>::from_str(SECRET).unwrap();

        cache.get_or_derive(&secret, &scope(30, "us-east-1"));
        cache.get_or_derive(&secret, &scope(30, "us-west-2"));
        assert_eq!(cache.len(), 2);

        let next_day = cache.get_or_derive(&secret, &scope(31, "us-east-1"));
        assert_eq!(cache.len(), 1);
        assert_eq!(
            hex::encode(next_day.as_ref()),
            "4f10458981d9757195ff4a3d55278d32d3c789809c4bb9c0785443035e0c10b2"
        );

        cache.evict_before(NaiveDate::from_ymd_opt(2015, 9, 1).unwrap());
        assert!(cache.is_empty());
        assert_eq!(format!("{:?}", cache), "SigningKeyCache { len: 0 }");
    }

    #[test_log::test]
    fn test_cache_concurrent_access() {
        let cache = Arc::new(SigningKeyCache::new());
        let secret = <KSecretKey>::from_str(SECRET).unwrap();
        let expected = secret.derive_signing_key(&scope(30, "us-east-1"));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || cache.get_or_derive(&secret, &scope(30, "us-east-1")))
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
        assert_eq!(cache.len(), 1);
    }
}
