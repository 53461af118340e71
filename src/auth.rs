//! AWS API request signature generation routines.
//!
//! This implements the last three stages of the AWS
//! [SigV4](http://docs.aws.amazon.com/general/latest/gr/signature-version-4.html) signing
//! algorithm: the string to sign, the signature itself, and the headers that carry it.
//!
//! **Stability of this module is not guaranteed except for items exposed at the crate root**.
//! The functions and types are subject to change in minor/patch versions. This is exposed (with
//! the `unstable` feature) for testing purposes only.

use {
    crate::{
        canonical::CanonicalRequest, constants::*, context::CredentialScope, crypto::hmac_sha256, KSigningKey,
        SignatureError,
    },
    http::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, HOST},
    log::{debug, trace},
    qualifier_attr::qualifiers,
    std::fmt::{Debug, Formatter, Result as FmtResult},
};

/// Display name for the `authorization` header
const AUTHORIZATION_NAME: &str = "Authorization";

/// Display name for the `host` header
const HOST_NAME: &str = "Host";

/// Display name for the `x-amz-content-sha256` header
const X_AMZ_CONTENT_SHA256_NAME: &str = "X-Amz-Content-Sha256";

/// Display name for the `x-amz-date` header
const X_AMZ_DATE_NAME: &str = "X-Amz-Date";

/// Display name for the `x-amz-security-token` header
const X_AMZ_SECURITY_TOKEN_NAME: &str = "X-Amz-Security-Token";

/// Return the string to sign for a request.
///
/// This is `AWS4-HMAC-SHA256`, the request timestamp, the credential scope, and the hex SHA-256 of
/// the canonical request, separated by newlines.
#[cfg_attr(any(doc, feature = "unstable"), qualifiers(pub))]
#[cfg_attr(not(any(doc, feature = "unstable")), qualifiers(pub(crate)))]
fn string_to_sign(amz_date: &str, scope: &CredentialScope, canonical_request_sha256: &[u8; SHA256_OUTPUT_LEN]) -> String {
    let scope = scope.to_string();
    let mut result = String::with_capacity(
        AWS4_HMAC_SHA256.len() + 1 + ISO8601_UTC_LENGTH + 1 + scope.len() + 1 + SHA256_HEX_LENGTH,
    );

    result.push_str(AWS4_HMAC_SHA256);
    result.push('\n');
    result.push_str(amz_date);
    result.push('\n');
    result.push_str(&scope);
    result.push('\n');
    result.push_str(&hex::encode(canonical_request_sha256));

    trace!("String to sign:\n{}", result);
    result
}

/// Compute the signature: the lower-case hex HMAC-SHA256 of the string to sign under the signing
/// key. The result is always 64 characters long.
#[cfg_attr(any(doc, feature = "unstable"), qualifiers(pub))]
#[cfg_attr(not(any(doc, feature = "unstable")), qualifiers(pub(crate)))]
fn compute_signature(signing_key: &KSigningKey, string_to_sign: &str) -> String {
    hex::encode(hmac_sha256(signing_key.as_ref(), string_to_sign.as_bytes()))
}

/// Format the `Authorization` header value.
#[cfg_attr(any(doc, feature = "unstable"), qualifiers(pub))]
#[cfg_attr(not(any(doc, feature = "unstable")), qualifiers(pub(crate)))]
fn authorization_header(
    access_key_id: &str,
    scope: &CredentialScope,
    signed_header_names: &str,
    signature: &str,
) -> String {
    format!(
        "{} Credential={}/{}, SignedHeaders={}, Signature={}",
        AWS4_HMAC_SHA256, access_key_id, scope, signed_header_names, signature
    )
}

/// The headers that authenticate a signed request.
///
/// These are the only output of the signer. They can be merged into an [`http::HeaderMap`] with
/// [`apply_to_headers`][SignatureResult::apply_to_headers], or taken as plain name/value pairs with
/// [`into_header_pairs`][SignatureResult::into_header_pairs].
#[derive(Clone, Eq, PartialEq)]
pub struct SignatureResult {
    authorization: String,
    amz_date: String,
    host: String,
    content_sha256: Option<String>,
    security_token: Option<String>,
    signature: String,
}

impl SignatureResult {
    /// Assemble the result from the pieces computed by the signing pipeline.
    pub(crate) fn assemble(
        access_key_id: &str,
        scope: &CredentialScope,
        canonical_request: &CanonicalRequest,
        signature: String,
        amz_date: String,
        security_token: Option<&str>,
    ) -> Self {
        let signed_header_names = canonical_request.signed_header_names();
        debug!("Assembled authorization for credential scope {} with signed headers {}", scope, signed_header_names);

        Self {
            authorization: authorization_header(access_key_id, scope, signed_header_names, &signature),
            amz_date,
            host: canonical_request.host().to_string(),
            content_sha256: canonical_request.content_sha256().map(str::to_string),
            security_token: security_token.map(str::to_string),
            signature,
        }
    }

    /// Retrieve the `Authorization` header value.
    #[inline]
    pub fn authorization(&self) -> &str {
        &self.authorization
    }

    /// Retrieve the `X-Amz-Date` header value.
    #[inline]
    pub fn amz_date(&self) -> &str {
        &self.amz_date
    }

    /// Retrieve the `Host` header value.
    #[inline]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Retrieve the `X-Amz-Content-Sha256` header value. This is only set when signing in S3 mode.
    #[inline]
    pub fn content_sha256(&self) -> Option<&str> {
        self.content_sha256.as_deref()
    }

    /// Retrieve the `X-Amz-Security-Token` header value, if a session token was used.
    #[inline]
    pub fn security_token(&self) -> Option<&str> {
        self.security_token.as_deref()
    }

    /// Retrieve the hex signature embedded in the `Authorization` header.
    #[inline]
    pub fn signature(&self) -> &str {
        &self.signature
    }

    /// Insert the signature headers into `headers`, replacing any existing values.
    ///
    /// Every value is validated before any header is inserted; on error, `headers` is left
    /// untouched.
    pub fn apply_to_headers(&self, headers: &mut HeaderMap) -> Result<(), SignatureError> {
        let mut values = vec![
            (AUTHORIZATION, header_value(HDR_AUTHORIZATION, &self.authorization)?),
            (HeaderName::from_static(HDR_X_AMZ_DATE), header_value(HDR_X_AMZ_DATE, &self.amz_date)?),
            (HOST, header_value(HDR_HOST, &self.host)?),
        ];

        if let Some(content_sha256) = &self.content_sha256 {
            values.push((
                HeaderName::from_static(HDR_X_AMZ_CONTENT_SHA256),
                header_value(HDR_X_AMZ_CONTENT_SHA256, content_sha256)?,
            ));
        }

        if let Some(token) = &self.security_token {
            let mut value = header_value(HDR_X_AMZ_SECURITY_TOKEN, token)?;
            value.set_sensitive(true);
            values.push((HeaderName::from_static(HDR_X_AMZ_SECURITY_TOKEN), value));
        }

        for (name, value) in values {
            headers.insert(name, value);
        }

        Ok(())
    }

    /// Convert the result into `(name, value)` header pairs.
    pub fn into_header_pairs(self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            (AUTHORIZATION_NAME, self.authorization),
            (X_AMZ_DATE_NAME, self.amz_date),
            (HOST_NAME, self.host),
        ];

        if let Some(content_sha256) = self.content_sha256 {
            pairs.push((X_AMZ_CONTENT_SHA256_NAME, content_sha256));
        }

        if let Some(token) = self.security_token {
            pairs.push((X_AMZ_SECURITY_TOKEN_NAME, token));
        }

        pairs
    }
}

impl Debug for SignatureResult {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("SignatureResult")
            .field("authorization", &self.authorization)
            .field("amz_date", &self.amz_date)
            .field("host", &self.host)
            .field("content_sha256", &self.content_sha256)
            .field("security_token", &self.security_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

fn header_value(name: &str, value: &str) -> Result<HeaderValue, SignatureError> {
    HeaderValue::from_str(value)
        .map_err(|_| SignatureError::InvalidRequest(format!("Header '{}' has an invalid value", name)))
}
