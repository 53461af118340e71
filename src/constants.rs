//! Common constants used throughout the crate.
//!
//! This was consolidated here so every stage of the signing pipeline agrees on the same literal
//! values. If a value is spelled incorrectly, at least it can be fixed in one spot.
//!
//! Tests that are testing the content of a header or error message should not use these
//! constants; they should use hard-coded strings so the tests are also testing for misspellings.
//!
//! Please keep this file organized alphabetically. (This can be a bit hard with comments, etc.)

/// Algorithm for AWS SigV4
pub(crate) const AWS4_HMAC_SHA256: &str = "AWS4-HMAC-SHA256";

/// Prefix applied to the raw secret key to form `kSecret`.
pub(crate) const AWS4_KEY_PREFIX: &[u8] = b"AWS4";

/// String included at the end of the AWS SigV4 credential scope
pub(crate) const AWS4_REQUEST: &str = "aws4_request";

/// Default region used when none is configured.
pub(crate) const DEFAULT_REGION: &str = "us-gov-west-1";

/// Default service used when none is configured.
pub(crate) const DEFAULT_SERVICE: &str = "execute-api";

/// Environment variable holding the access key id.
pub(crate) const ENV_AWS_ACCESS_KEY_ID: &str = "AWS_ACCESS_KEY_ID";

/// Environment variable holding the fallback region.
pub(crate) const ENV_AWS_DEFAULT_REGION: &str = "AWS_DEFAULT_REGION";

/// Environment variable holding the region.
pub(crate) const ENV_AWS_REGION: &str = "AWS_REGION";

/// Environment variable holding the secret access key.
pub(crate) const ENV_AWS_SECRET_ACCESS_KEY: &str = "AWS_SECRET_ACCESS_KEY";

/// Environment variable holding the session token.
pub(crate) const ENV_AWS_SESSION_TOKEN: &str = "AWS_SESSION_TOKEN";

/// Environment variable holding the service name to sign for.
pub(crate) const ENV_AWS_SIGV4_SERVICE: &str = "AWS_SIGV4_SERVICE";

/// Error code: AmbiguousHeader
pub(crate) const ERR_CODE_AMBIGUOUS_HEADER: &str = "AmbiguousHeader";

/// Error code: ConfigurationError
pub(crate) const ERR_CODE_CONFIGURATION: &str = "ConfigurationError";

/// Error code: InvalidRequest
pub(crate) const ERR_CODE_INVALID_REQUEST: &str = "InvalidRequest";

/// Error message: Key too long
pub(crate) const ERR_MSG_KEY_TOO_LONG: &str = "Key too long";

/// Error message: Key too short
pub(crate) const ERR_MSG_KEY_TOO_SHORT: &str = "Key too short";

/// Header for `authorization`
pub(crate) const HDR_AUTHORIZATION: &str = "authorization";

/// Header for `host`
pub(crate) const HDR_HOST: &str = "host";

/// Header for `x-amz-content-sha256`
pub(crate) const HDR_X_AMZ_CONTENT_SHA256: &str = "x-amz-content-sha256";

/// Header for delivering the request timestamp
pub(crate) const HDR_X_AMZ_DATE: &str = "x-amz-date";

/// Header for delivering the session token
pub(crate) const HDR_X_AMZ_SECURITY_TOKEN: &str = "x-amz-security-token";

/// Uppercase hex digits.
pub(crate) const HEX_DIGITS_UPPER: [u8; 16] =
    [b'0', b'1', b'2', b'3', b'4', b'5', b'6', b'7', b'8', b'9', b'A', b'B', b'C', b'D', b'E', b'F'];

/// Compact ISO8601 format used for the string to sign.
pub(crate) const ISO8601_COMPACT_FORMAT: &str = "%Y%m%dT%H%M%SZ";

/// Short date format
pub(crate) const ISO8601_DATE_FORMAT: &str = "%Y%m%d";

/// Length of an ISO8601 date string in the UTC time zone.
pub(crate) const ISO8601_UTC_LENGTH: usize = 16;

/// Error message: `"Illegal hex character in escape % pattern: %"`
pub(crate) const MSG_ILLEGAL_HEX_CHAR: &str = "Illegal hex character in escape % pattern: %";

/// Error message: `"Incomplete trailing escape % sequence"`
pub(crate) const MSG_INCOMPLETE_TRAILING_ESCAPE: &str = "Incomplete trailing escape % sequence";

/// SHA-256 of an empty string.
pub(crate) const SHA256_EMPTY: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

/// Length of a SHA-256 hex string.
pub(crate) const SHA256_HEX_LENGTH: usize = SHA256_EMPTY.len();

/// The length of a SHA-256 digest in bytes.
pub(crate) const SHA256_OUTPUT_LEN: usize = 32;

/// The access key to use for testing.
#[cfg(test)]
pub(crate) const TEST_ACCESS_KEY: &str = "AKIDEXAMPLE";

/// The region to use for testing.
#[cfg(test)]
pub(crate) const TEST_REGION: &str = "us-east-1";

/// The secret key to use for testing.
#[cfg(test)]
pub(crate) const TEST_SECRET_KEY: &str = "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY";

/// The service to use for testing.
#[cfg(test)]
pub(crate) const TEST_SERVICE: &str = "service";
