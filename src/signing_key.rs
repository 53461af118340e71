use {
    crate::{constants::*, context::CredentialScope, crypto::hmac_sha256, KeyLengthError},
    chrono::NaiveDate,
    log::trace,
    std::{
        fmt::{Debug, Display, Formatter, Result as FmtResult},
        str::FromStr,
    },
    subtle::ConstantTimeEq,
};

/// The default maximum length of a secret key, including the "AWS4" prefix. AWS-issued secret
/// keys are 40 characters long.
pub const KSECRETKEY_MAX_LENGTH: usize = 132;

/// A raw AWS secret key (`kSecret`).
#[derive(Clone, Copy)]
pub struct KSecretKey<const M: usize = KSECRETKEY_MAX_LENGTH> {
    /// The secret key, prefixed with "AWS4".
    prefixed_key: [u8; M],

    /// The length of the key, including the prefix.
    len: usize,
}

/// One link of the signing key derivation chain, in the order the links are applied.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum DerivationLink {
    /// `kDate = HMAC("AWS4" + kSecret, "YYYYMMDD")`
    Date,
    /// `kRegion = HMAC(kDate, region)`
    Region,
    /// `kService = HMAC(kRegion, service)`
    Service,
    /// `kSigning = HMAC(kService, "aws4_request")`
    Request,
}

macro_rules! derived_key {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy)]
        pub struct $name {
            /// The raw key.
            key: [u8; SHA256_OUTPUT_LEN],
        }

        impl AsRef<[u8; SHA256_OUTPUT_LEN]> for $name {
            fn as_ref(&self) -> &[u8; SHA256_OUTPUT_LEN] {
                &self.key
            }
        }

        impl PartialEq for $name {
            fn eq(&self, other: &Self) -> bool {
                self.key.ct_eq(&other.key).into()
            }
        }

        impl Eq for $name {}

        impl Debug for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
                f.write_str(stringify!($name))
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
                f.write_str(stringify!($name))
            }
        }
    };
}

derived_key!(
    /// The `kDate` key: `HMAC_SHA256("AWS4" + KSecretKey, "YYYYMMDD")`
    KDateKey
);

derived_key!(
    /// The `kRegion` key: an AWS `kDate` key, HMAC-SHA256 hashed with the region.
    KRegionKey
);

derived_key!(
    /// The `kService` key: an AWS `kRegion` key, HMAC-SHA256 hashed with the service.
    KServiceKey
);

derived_key!(
    /// The `kSigning` key: an AWS `kService` key, HMAC-SHA256 hashed with the "aws4_request" string.
    ///
    /// This is scoped to exactly one date, region, and service.
    KSigningKey
);

impl<const M: usize> KSecretKey<M> {
    /// The secret key with the "AWS4" prefix; this is the HMAC key for the first link.
    #[inline]
    fn prefixed(&self) -> &[u8] {
        &self.prefixed_key[..self.len]
    }
}

impl<const M: usize> AsRef<[u8]> for KSecretKey<M> {
    fn as_ref(&self) -> &[u8] {
        // Remove the "AWS4" prefix.
        &self.prefixed_key[AWS4_KEY_PREFIX.len()..self.len]
    }
}

impl<const M: usize> PartialEq for KSecretKey<M> {
    fn eq(&self, other: &Self) -> bool {
        self.prefixed().ct_eq(other.prefixed()).into()
    }
}

impl<const M: usize> Eq for KSecretKey<M> {}

impl<const M: usize> Debug for KSecretKey<M> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str("KSecretKey")
    }
}

impl<const M: usize> Display for KSecretKey<M> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str("KSecretKey")
    }
}

impl<const M: usize> FromStr for KSecretKey<M> {
    type Err = KeyLengthError;

    /// Create a new `KSecretKey` from a raw AWS secret key.
    fn from_str(raw: &str) -> Result<Self, KeyLengthError> {
        let raw = raw.as_bytes();
        if raw.is_empty() {
            return Err(KeyLengthError::TooShort);
        }

        let len = AWS4_KEY_PREFIX.len() + raw.len();
        if len > M {
            return Err(KeyLengthError::TooLong);
        }

        let mut prefixed_key = [0; M];
        prefixed_key[..AWS4_KEY_PREFIX.len()].copy_from_slice(AWS4_KEY_PREFIX);
        prefixed_key[AWS4_KEY_PREFIX.len()..len].copy_from_slice(raw);
        Ok(Self {
            prefixed_key,
            len,
        })
    }
}

impl<const M: usize> KSecretKey<M> {
    /// Create a new `KDateKey` from this `KSecretKey` and a date.
    pub fn to_kdate(&self, date: NaiveDate) -> KDateKey {
        let date = date.format(ISO8601_DATE_FORMAT).to_string();
        KDateKey {
            key: hmac_sha256(self.prefixed(), date.as_bytes()),
        }
    }

    /// Create a new `KRegionKey` from this `KSecretKey`, a date, and a region.
    pub fn to_kregion(&self, date: NaiveDate, region: &str) -> KRegionKey {
        self.to_kdate(date).to_kregion(region)
    }

    /// Create a new `KServiceKey` from this `KSecretKey`, a date, a region, and a service.
    pub fn to_kservice(&self, date: NaiveDate, region: &str, service: &str) -> KServiceKey {
        self.to_kdate(date).to_kservice(region, service)
    }

    /// Create a new `KSigningKey` from this `KSecretKey`, a date, a region, and a service.
    pub fn to_ksigning(&self, date: NaiveDate, region: &str, service: &str) -> KSigningKey {
        self.to_kdate(date).to_ksigning(region, service)
    }

    /// Derive the signing key for a credential scope by applying each link of
    /// [`CredentialScope::derivation_links`] in order, each keyed by the previous link's output.
    pub fn derive_signing_key(&self, scope: &CredentialScope) -> KSigningKey {
        let mut key: Option<[u8; SHA256_OUTPUT_LEN]> = None;

        for (link, message) in scope.derivation_links() {
            trace!("derive_signing_key: applying {:?} link", link);
            let hmac_key = match &key {
                Some(previous) => previous.as_slice(),
                None => self.prefixed(),
            };
            key = Some(hmac_sha256(hmac_key, message.as_bytes()));
        }

        KSigningKey {
            key: key.expect("derivation chain has four links"),
        }
    }
}

impl KDateKey {
    /// Create a new `KRegionKey` from this `KDateKey` and a region.
    pub fn to_kregion(&self, region: &str) -> KRegionKey {
        KRegionKey {
            key: hmac_sha256(&self.key, region.as_bytes()),
        }
    }

    /// Create a new `KServiceKey` from this `KDateKey`, a region, and a service.
    pub fn to_kservice(&self, region: &str, service: &str) -> KServiceKey {
        self.to_kregion(region).to_kservice(service)
    }

    /// Create a new `KSigningKey` from this `KDateKey`, a region, and a service.
    pub fn to_ksigning(&self, region: &str, service: &str) -> KSigningKey {
        self.to_kregion(region).to_ksigning(service)
    }
}

impl KRegionKey {
    /// Create a new `KServiceKey` from this `KRegionKey` and a service.
    pub fn to_kservice(&self, service: &str) -> KServiceKey {
        KServiceKey {
            key: hmac_sha256(&self.key, service.as_bytes()),
        }
    }

    /// Create a new `KSigningKey` from this `KRegionKey` and a service.
    pub fn to_ksigning(&self, service: &str) -> KSigningKey {
        self.to_kservice(service).to_ksigning()
    }
}

impl KServiceKey {
    /// Create a new `KSigningKey` from this `KServiceKey`.
    pub fn to_ksigning(&self) -> KSigningKey {
        KSigningKey {
            key: hmac_sha256(&self.key, AWS4_REQUEST.as_bytes()),
        }
    }
}

#[cfg(test)]
mod tests {
    use {
        super::{DerivationLink, KSECRETKEY_MAX_LENGTH},
        crate::{constants::*, CredentialScope, KSecretKey},
        chrono::NaiveDate,
        std::str::FromStr,
    };

    #[test_log::test]
    fn test_signing_key_derived() {
        let date = NaiveDate::from_ymd_opt(2015, 8, 30).unwrap();

        let ksecret1a = KSecretKey::<64>::from_str("wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY").unwrap();
        let ksecret1b = KSecretKey::<64>::from_str("wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY").unwrap();
        let ksecret2 = KSecretKey::<64>::from_str("wJalrXUtnFEMI/K7MDENG+bPxRfiCZEXAMPLEKEY").unwrap();

        assert_eq!(ksecret1a, ksecret1b);
        assert_eq!(ksecret1a, ksecret1a.clone());
        assert_ne!(ksecret1a, ksecret2);
        assert_eq!(format!("{:?}", ksecret1a).as_str(), "KSecretKey");
        assert_eq!(format!("{}", ksecret1a).as_str(), "KSecretKey");
        assert_eq!(ksecret1a.as_ref(), b"wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY");

        let kdate1a = ksecret1a.to_kdate(date);
        let kdate1b = ksecret1b.to_kdate(date);
        let kdate2 = ksecret2.to_kdate(date);
        assert_eq!(
            kdate1a.as_ref(),
            &[
                0x01u8, 0x38u8, 0xc7u8, 0xa6u8, 0xcbu8, 0xd6u8, 0x0au8, 0xa7u8, 0x27u8, 0xb2u8, 0xf6u8, 0x53u8, 0xa5u8,
                0x22u8, 0x56u8, 0x74u8, 0x39u8, 0xdfu8, 0xb9u8, 0xf3u8, 0xe7u8, 0x2bu8, 0x21u8, 0xf9u8, 0xb2u8, 0x59u8,
                0x41u8, 0xa4u8, 0x2fu8, 0x04u8, 0xa7u8, 0xcdu8
            ]
        );
        assert_eq!(kdate1a, kdate1b);
        assert_ne!(kdate1a, kdate2);
        assert_eq!(format!("{:?}", kdate1a).as_str(), "KDateKey");
        assert_eq!(format!("{}", kdate1a).as_str(), "KDateKey");

        let kregion1a = kdate1a.to_kregion("us-east-1");
        let kregion2 = kdate2.to_kregion("us-east-1");
        assert_eq!(
            kregion1a.as_ref(),
            &[
                0xf3u8, 0x3du8, 0x58u8, 0x08u8, 0x50u8, 0x4bu8, 0xf3u8, 0x48u8, 0x12u8, 0xe5u8, 0xfau8, 0xdeu8, 0x63u8,
                0x30u8, 0x8bu8, 0x42u8, 0x4bu8, 0x24u8, 0x4cu8, 0x59u8, 0x18u8, 0x9bu8, 0xe2u8, 0xa5u8, 0x91u8, 0xddu8,
                0x22u8, 0x82u8, 0xc7u8, 0xcbu8, 0x56u8, 0x3fu8
            ]
        );
        assert_ne!(kregion1a, kregion2);
        assert_eq!(format!("{:?}", kregion1a).as_str(), "KRegionKey");

        let kservice1a = kregion1a.to_kservice("example");
        let kservice2 = kregion2.to_kservice("example");
        assert_eq!(
            kservice1a.as_ref(),
            &[
                0xc6u8, 0x0cu8, 0xc4u8, 0xb1u8, 0xd0u8, 0x34u8, 0xc7u8, 0x57u8, 0x34u8, 0x8fu8, 0x2cu8, 0x67u8, 0x30u8,
                0x04u8, 0xc1u8, 0x89u8, 0x08u8, 0xbbu8, 0xa9u8, 0xa4u8, 0x6fu8, 0xa1u8, 0xdbu8, 0x87u8, 0xa9u8, 0x83u8,
                0x50u8, 0xf2u8, 0x7eu8, 0x7bu8, 0x2du8, 0xf6u8
            ]
        );
        assert_ne!(kservice1a, kservice2);
        assert_eq!(format!("{}", kservice1a).as_str(), "KServiceKey");

        let ksigning1a = kservice1a.to_ksigning();
        let ksigning2 = kservice2.to_ksigning();
        assert_eq!(
            ksigning1a.as_ref(),
            &[
                0x43u8, 0x1cu8, 0xc9u8, 0xefu8, 0x58u8, 0x76u8, 0x28u8, 0x7du8, 0xbbu8, 0x92u8, 0x5du8, 0x4bu8, 0xa4u8,
                0x62u8, 0x9fu8, 0x45u8, 0x90u8, 0x02u8, 0xadu8, 0x1du8, 0x26u8, 0xb7u8, 0xc7u8, 0x51u8, 0x60u8, 0x1bu8,
                0xb2u8, 0x04u8, 0xe1u8, 0x17u8, 0x18u8, 0xb8u8
            ]
        );
        assert_ne!(ksigning1a, ksigning2);
        assert_eq!(format!("{:?}", ksigning1a).as_str(), "KSigningKey");

        assert_eq!(ksecret1a.to_kregion(date, "us-east-1"), kregion1a);
        assert_eq!(ksecret1a.to_kservice(date, "us-east-1", "example"), kservice1a);
        assert_eq!(ksecret1a.to_ksigning(date, "us-east-1", "example"), ksigning1a);
        assert_eq!(kdate1a.to_kservice("us-east-1", "example"), kservice1a);
        assert_eq!(kdate1a.to_ksigning("us-east-1", "example"), ksigning1a);
    }

    #[test_log::test]
    fn test_chain_matches_typed_links() {
        let date = NaiveDate::from_ymd_opt(2015, 8, 30).unwrap();
        let ksecret = KSecretKey::<KSECRETKEY_MAX_LENGTH>::from_str(TEST_SECRET_KEY).unwrap();
        let scope = CredentialScope::new(date, TEST_REGION, TEST_SERVICE);

        let links: Vec<DerivationLink> = scope.derivation_links().iter().map(|(link, _)| *link).collect();
        assert_eq!(
            links,
            vec![DerivationLink::Date, DerivationLink::Region, DerivationLink::Service, DerivationLink::Request]
        );

        let chained = ksecret.derive_signing_key(&scope);
        assert_eq!(chained, ksecret.to_ksigning(date, TEST_REGION, TEST_SERVICE));
        assert_eq!(hex::encode(chained.as_ref()), "938127b5336810ddb6a5d6af445fcac9e371f9ed418ed386b022aed82901be75");
    }

    #[test_log::test]
    fn test_links_do_not_commute() {
        let date = NaiveDate::from_ymd_opt(2015, 8, 30).unwrap();
        let ksecret = KSecretKey::<KSECRETKEY_MAX_LENGTH>::from_str(TEST_SECRET_KEY).unwrap();

        // Swapping the region and service messages yields an unrelated key.
        let expected = ksecret.to_ksigning(date, "us-east-1", "execute-api");
        let swapped = ksecret.to_kdate(date).to_kregion("execute-api").to_kservice("us-east-1").to_ksigning();
        assert_ne!(expected, swapped);
    }

    #[test_log::test]
    fn test_scope_sensitivity() {
        let date = NaiveDate::from_ymd_opt(2015, 8, 30).unwrap();
        let next_day = NaiveDate::from_ymd_opt(2015, 8, 31).unwrap();
        let ksecret = KSecretKey::<KSECRETKEY_MAX_LENGTH>::from_str(TEST_SECRET_KEY).unwrap();

        let base = ksecret.to_ksigning(date, "us-east-1", "service");
        let other_region = ksecret.to_ksigning(date, "us-west-2", "service");
        let other_service = ksecret.to_ksigning(date, "us-east-1", "execute-api");
        let other_date = ksecret.to_ksigning(next_day, "us-east-1", "service");

        assert_ne!(base, other_region);
        assert_ne!(base, other_service);
        assert_ne!(base, other_date);

        assert_eq!(hex::encode(other_region.as_ref()), "0a38a6f3474013ac531049dc732a4b04e3edc6956e8ece00fc81980055a51b22");
        assert_eq!(hex::encode(other_service.as_ref()), "93b1c5eb2fe9ca2ea35c60c8c2216092743113fd16a90223462cdd68ec95b5a7");
        assert_eq!(hex::encode(other_date.as_ref()), "4f10458981d9757195ff4a3d55278d32d3c789809c4bb9c0785443035e0c10b2");
    }

    #[test]
    fn test_key_from_str_length() {
        assert_eq!(KSecretKey::<KSECRETKEY_MAX_LENGTH>::from_str(""), Err(crate::KeyLengthError::TooShort));
        assert_eq!(KSecretKey::<8>::from_str("12345"), Err(crate::KeyLengthError::TooLong));
        assert!(KSecretKey::<8>::from_str("1234").is_ok());
        assert!(KSecretKey::<KSECRETKEY_MAX_LENGTH>::from_str(TEST_SECRET_KEY).is_ok());
    }
}
