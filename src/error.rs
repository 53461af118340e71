use {
    crate::constants::*,
    std::{
        error::Error,
        fmt::{Display, Formatter, Result as FmtResult},
    },
};

/// Error returned when an attempt at signing a request with AWS SigV4 fails.
///
/// Signing never produces a partial result: either every header is computed or one of these
/// errors is returned and the request must not be sent.
#[derive(Debug)]
#[non_exhaustive]
pub enum SignatureError {
    /// Two header names collide after lower-casing but carry different values, or a header supplied
    /// by the caller contradicts one derived by the signer (`host`, `x-amz-date`,
    /// `x-amz-security-token`).
    AmbiguousHeader(/* message */ String),

    /// The credentials or signing context are incomplete: an empty access key, secret key, region,
    /// or service, or an environment variable that is not set.
    Configuration(/* message */ String),

    /// The request cannot be signed. This can be a URL that cannot be parsed or has no host, a URI
    /// path with a malformed hex encoding (e.g. `%0J`) or one that navigates above the root
    /// (`/x/../../../y`), a malformed query string, or a header name or value that is not valid
    /// in HTTP.
    InvalidRequest(/* message */ String),
}

impl SignatureError {
    /// A short, stable identifier for the kind of failure.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::AmbiguousHeader(_) => ERR_CODE_AMBIGUOUS_HEADER,
            Self::Configuration(_) => ERR_CODE_CONFIGURATION,
            Self::InvalidRequest(_) => ERR_CODE_INVALID_REQUEST,
        }
    }
}

impl Display for SignatureError {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        match self {
            Self::AmbiguousHeader(msg) => f.write_str(msg),
            Self::Configuration(msg) => f.write_str(msg),
            Self::InvalidRequest(msg) => f.write_str(msg),
        }
    }
}

impl Error for SignatureError {}

impl From<KeyLengthError> for SignatureError {
    fn from(e: KeyLengthError) -> SignatureError {
        SignatureError::Configuration(format!("Invalid secret access key: {}", e))
    }
}

impl From<http::Error> for SignatureError {
    fn from(e: http::Error) -> SignatureError {
        SignatureError::InvalidRequest(e.to_string())
    }
}

/// Error returned by `KSecretKey::from_str` when the secret key cannot fit in the expected size.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum KeyLengthError {
    /// The key is too long.
    TooLong,
    /// The key is too short.
    TooShort,
}

impl Display for KeyLengthError {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        match self {
            KeyLengthError::TooLong => f.write_str(ERR_MSG_KEY_TOO_LONG),
            KeyLengthError::TooShort => f.write_str(ERR_MSG_KEY_TOO_SHORT),
        }
    }
}

impl Error for KeyLengthError {}
