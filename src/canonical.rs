//! Canonicalization functionality for signature generation.
//!
//! This includes various URL, query string, and header canonicalization functions, as well as the
//! ability to create an AWS SigV4 canonical request.
//!
//! **Stability of this module is not guaranteed except for items exposed at the crate root**.
//! The functions and types are subject to change in minor/patch versions. This is exposed (with
//! the `unstable` feature) for testing purposes only.

use {
    crate::{
        constants::*,
        crypto::{sha256, sha256_hex},
        SignatureError, SignatureOptions, SigningContext, SigningRequest,
    },
    http::{
        header::{HeaderName, HeaderValue},
        uri::Uri,
    },
    lazy_static::lazy_static,
    log::{debug, trace},
    qualifier_attr::qualifiers,
    regex::Regex,
    std::{
        borrow::Cow,
        collections::{btree_map::Entry, BTreeMap},
        fmt::{Debug, Formatter, Result as FmtResult},
    },
};

lazy_static! {
    /// Multiple slash pattern for condensing URIs
    static ref MULTISLASH: Regex = Regex::new("//+").unwrap();
}

/// A canonicalized request for AWS SigV4.
///
/// This is mainly used internally for generating the canonical request for signing, but is
/// exposed for testing and debugging purposes.
///
/// **The stability of this struct is not guaranteed.** The fields and methods are subject to
/// change in minor/patch versions.
#[cfg_attr(any(doc, feature = "unstable"), qualifiers(pub))]
#[cfg_attr(not(any(doc, feature = "unstable")), qualifiers(pub(crate)))]
#[derive(Clone, Eq, PartialEq)]
struct CanonicalRequest {
    /// The HTTP method for the request (e.g., "GET", "POST", etc.)
    method: String,

    /// The canonicalized path from the URL. This is guaranteed to be ASCII.
    canonical_path: String,

    /// The canonicalized query string from the URL. Empty if the URL has no query.
    canonical_query: String,

    /// The value of the `host` header computed from the URL.
    host: String,

    /// Lower-cased header names mapped to their trimmed values, including the headers injected by
    /// the signer. Every header here is signed.
    headers: BTreeMap<String, String>,

    /// `;`-joined header names, in the same order as `headers`.
    signed_header_names: String,

    /// Hex SHA-256 of the request body.
    payload_hash: String,

    /// The `x-amz-content-sha256` value injected by the signer in S3 mode.
    content_sha256: Option<String>,
}

impl CanonicalRequest {
    /// Create a CanonicalRequest from a [SigningRequest].
    ///
    /// The `host` and `x-amz-date` headers (and `x-amz-security-token`, if a session token is
    /// supplied) are added to the caller's headers. In S3 mode, `x-amz-content-sha256` carrying the
    /// payload hash is added as well. A caller header that collides with one of
    /// these, or with another caller header, must have the same value or this returns
    /// [`SignatureError::AmbiguousHeader`].
    #[cfg_attr(any(doc, feature = "unstable"), qualifiers(pub))]
    #[cfg_attr(not(any(doc, feature = "unstable")), qualifiers(pub(crate)))]
    fn from_signing_request(
        request: &SigningRequest,
        context: &SigningContext,
        session_token: Option<&str>,
        options: &SignatureOptions,
    ) -> Result<Self, SignatureError> {
        let uri = parse_absolute_url(request.url())?;
        let host = host_header_value(&uri);
        let canonical_path = canonicalize_uri_path(uri.path(), options.s3)?;
        let canonical_query = canonicalize_query_string(uri.query().unwrap_or_default())?;
        let payload_hash = sha256_hex(request.body());
        let content_sha256 = options.s3.then(|| payload_hash.clone());

        let mut headers = BTreeMap::new();
        for (name, value) in request.headers() {
            add_caller_header(&mut headers, name, value)?;
        }

        add_signer_header(&mut headers, HDR_HOST, &host)?;
        add_signer_header(&mut headers, HDR_X_AMZ_DATE, &context.amz_date())?;
        if let Some(token) = session_token {
            add_signer_header(&mut headers, HDR_X_AMZ_SECURITY_TOKEN, token)?;
        }
        if let Some(content_sha256) = &content_sha256 {
            add_signer_header(&mut headers, HDR_X_AMZ_CONTENT_SHA256, content_sha256)?;
        }

        let signed_header_names = headers.keys().map(String::as_str).collect::<Vec<_>>().join(";");
        debug!("Signed headers: {}", signed_header_names);

        Ok(Self {
            method: request.method().as_str().to_string(),
            canonical_path,
            canonical_query,
            host,
            headers,
            signed_header_names,
            payload_hash,
            content_sha256,
        })
    }

    /// Retrieve the HTTP request method.
    #[cfg_attr(any(doc, feature = "unstable"), qualifiers(pub))]
    #[cfg_attr(not(any(doc, feature = "unstable")), qualifiers(pub(crate)))]
    #[inline(always)]
    fn method(&self) -> &str {
        &self.method
    }

    /// Retrieve the canonicalized URI path from the request.
    #[cfg_attr(any(doc, feature = "unstable"), qualifiers(pub))]
    #[cfg_attr(not(any(doc, feature = "unstable")), qualifiers(pub(crate)))]
    #[inline(always)]
    fn canonical_path(&self) -> &str {
        &self.canonical_path
    }

    /// Get the canonical query string from the request.
    #[cfg_attr(any(doc, feature = "unstable"), qualifiers(pub))]
    #[cfg_attr(not(any(doc, feature = "unstable")), qualifiers(pub(crate)))]
    #[inline(always)]
    fn canonical_query_string(&self) -> &str {
        &self.canonical_query
    }

    /// Retrieve the `host` header value derived from the URL.
    #[cfg_attr(any(doc, feature = "unstable"), qualifiers(pub))]
    #[cfg_attr(not(any(doc, feature = "unstable")), qualifiers(pub(crate)))]
    #[inline(always)]
    fn host(&self) -> &str {
        &self.host
    }

    /// Retrieve the signed headers, keyed by lower-cased name.
    #[cfg_attr(any(doc, feature = "unstable"), qualifiers(pub))]
    #[cfg_attr(not(any(doc, feature = "unstable")), qualifiers(pub(crate)))]
    #[inline(always)]
    fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    /// Retrieve the `;`-joined list of signed header names.
    #[cfg_attr(any(doc, feature = "unstable"), qualifiers(pub))]
    #[cfg_attr(not(any(doc, feature = "unstable")), qualifiers(pub(crate)))]
    #[inline(always)]
    fn signed_header_names(&self) -> &str {
        &self.signed_header_names
    }

    /// Retrieve the hex SHA-256 hash of the request body.
    #[cfg_attr(any(doc, feature = "unstable"), qualifiers(pub))]
    #[cfg_attr(not(any(doc, feature = "unstable")), qualifiers(pub(crate)))]
    #[inline(always)]
    fn payload_hash(&self) -> &str {
        &self.payload_hash
    }

    /// Retrieve the `x-amz-content-sha256` value added by the signer, if any.
    #[cfg_attr(any(doc, feature = "unstable"), qualifiers(pub))]
    #[cfg_attr(not(any(doc, feature = "unstable")), qualifiers(pub(crate)))]
    #[inline(always)]
    fn content_sha256(&self) -> Option<&str> {
        self.content_sha256.as_deref()
    }

    /// Get the [canonical request to hash](https://docs.aws.amazon.com/general/latest/gr/sigv4-create-canonical-request.html)
    /// for the request.
    #[cfg_attr(any(doc, feature = "unstable"), qualifiers(pub))]
    #[cfg_attr(not(any(doc, feature = "unstable")), qualifiers(pub(crate)))]
    fn canonical_request(&self) -> String {
        self.render(false)
    }

    /// Get the SHA-256 hash of the [canonical request](https://docs.aws.amazon.com/general/latest/gr/sigv4-create-canonical-request.html).
    #[cfg_attr(any(doc, feature = "unstable"), qualifiers(pub))]
    #[cfg_attr(not(any(doc, feature = "unstable")), qualifiers(pub(crate)))]
    fn canonical_request_sha256(&self) -> [u8; SHA256_OUTPUT_LEN] {
        let canonical_request = self.canonical_request();
        trace!("Canonical request:\n{}", self.render(true));
        sha256(canonical_request.as_bytes())
    }

    fn render(&self, redact_token: bool) -> String {
        let mut result = String::with_capacity(1024);
        result.push_str(self.method());
        result.push('\n');
        result.push_str(self.canonical_path());
        result.push('\n');
        result.push_str(self.canonical_query_string());
        result.push('\n');

        let mut names = Vec::with_capacity(self.headers.len());
        for (name, value) in self.headers() {
            result.push_str(name);
            result.push(':');
            if redact_token && name == HDR_X_AMZ_SECURITY_TOKEN {
                result.push_str("<redacted>");
            } else {
                result.push_str(value);
            }
            result.push('\n');
            names.push(name.as_str());
        }

        // Both blocks come from the same map, so they can never disagree.
        assert_eq!(names.join(";"), self.signed_header_names());

        result.push('\n');
        result.push_str(self.signed_header_names());
        result.push('\n');
        result.push_str(self.payload_hash());
        result
    }
}

impl Debug for CanonicalRequest {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let headers: BTreeMap<&str, &str> = self
            .headers
            .iter()
            .map(|(name, value)| {
                if name == HDR_X_AMZ_SECURITY_TOKEN {
                    (name.as_str(), "<redacted>")
                } else {
                    (name.as_str(), value.as_str())
                }
            })
            .collect();

        f.debug_struct("CanonicalRequest")
            .field("method", &self.method)
            .field("canonical_path", &self.canonical_path)
            .field("canonical_query", &self.canonical_query)
            .field("headers", &headers)
            .field("payload_hash", &self.payload_hash)
            .field("content_sha256", &self.content_sha256)
            .finish()
    }
}

/// Indicates whether we are normalizing a URI path element or a query string element. This is used to create the
/// correct error message.
#[cfg_attr(any(doc, feature = "unstable"), qualifiers(pub))]
#[cfg_attr(not(any(doc, feature = "unstable")), qualifiers(pub(crate)))]
#[derive(Clone, Copy, Debug)]
enum UriElement {
    /// URI element represents a path
    Path,

    /// URI element represents a query string
    Query,
}

/// Parse a URL, requiring a scheme and a host.
fn parse_absolute_url(url: &str) -> Result<Uri, SignatureError> {
    let uri = Uri::try_from(url).map_err(|e| SignatureError::InvalidRequest(format!("Invalid URL '{}': {}", url, e)))?;

    if uri.scheme().is_none() {
        return Err(SignatureError::InvalidRequest(format!("URL is not absolute: {}", url)));
    }

    match uri.host() {
        Some(host) if !host.is_empty() => Ok(uri),
        _ => Err(SignatureError::InvalidRequest(format!("URL has no host: {}", url))),
    }
}

/// The `host` header for a URL: the lower-cased host, plus the port if it is explicit and not the
/// default for the scheme.
fn host_header_value(uri: &Uri) -> String {
    let host = uri.host().unwrap_or_default().to_ascii_lowercase();
    let default_port = match uri.scheme_str() {
        Some("http") => Some(80),
        Some("https") => Some(443),
        _ => None,
    };

    match uri.port_u16() {
        Some(port) if Some(port) != default_port => format!("{}:{}", host, port),
        _ => host,
    }
}

fn add_caller_header(headers: &mut BTreeMap<String, String>, name: &str, value: &str) -> Result<(), SignatureError> {
    let name = HeaderName::from_bytes(name.as_bytes())
        .map_err(|_| SignatureError::InvalidRequest(format!("Invalid header name: '{}'", name)))?;
    let name = name.as_str();

    if name == HDR_AUTHORIZATION {
        return Err(SignatureError::InvalidRequest("The authorization header cannot be signed".to_string()));
    }

    let value = normalize_header_value(value);
    if HeaderValue::from_str(&value).is_err() {
        return Err(SignatureError::InvalidRequest(format!("Header '{}' has an invalid value", name)));
    }

    match headers.entry(name.to_string()) {
        Entry::Vacant(e) => {
            e.insert(value);
            Ok(())
        }
        Entry::Occupied(e) if *e.get() == value => Ok(()),
        Entry::Occupied(_) => {
            Err(SignatureError::AmbiguousHeader(format!("Header '{}' appears more than once with different values", name)))
        }
    }
}

fn add_signer_header(headers: &mut BTreeMap<String, String>, name: &str, value: &str) -> Result<(), SignatureError> {
    match headers.entry(name.to_string()) {
        Entry::Vacant(e) => {
            e.insert(value.to_string());
            Ok(())
        }
        Entry::Occupied(e) if e.get() == value => Ok(()),
        Entry::Occupied(_) => Err(SignatureError::AmbiguousHeader(format!(
            "Header '{}' does not match the value computed by the signer",
            name
        ))),
    }
}

/// Canonicalize a raw query string: normalize each key and value, sort by key then value, and join
/// the `key=value` pairs with `&`.
#[cfg_attr(any(doc, feature = "unstable"), qualifiers(pub))]
#[cfg_attr(not(any(doc, feature = "unstable")), qualifiers(pub(crate)))]
pub fn canonicalize_query_string(query_string: &str) -> Result<String, SignatureError> {
    let mut params = Vec::new();

    for component in query_string.split('&') {
        if component.is_empty() {
            continue;
        }

        let (key, value) = component.split_once('=').unwrap_or((component, ""));
        params.push((normalize_query_string_element(key)?, normalize_query_string_element(value)?));
    }

    params.sort_unstable();
    Ok(params.iter().map(|(key, value)| format!("{}={}", key, value)).collect::<Vec<_>>().join("&"))
}

/// Normalizes the specified URI path, removing redundant slashes and relative path components (unless performing S3
/// canonicalization).
#[cfg_attr(any(doc, feature = "unstable"), qualifiers(pub))]
#[cfg_attr(not(any(doc, feature = "unstable")), qualifiers(pub(crate)))]
pub fn canonicalize_uri_path(uri_path: &str, s3: bool) -> Result<String, SignatureError> {
    // Special case: empty path is converted to '/'; also short-circuit the usual '/' path here.
    if uri_path.is_empty() || uri_path == "/" {
        return Ok("/".to_string());
    }

    // All other paths must be abolute.
    if !uri_path.starts_with('/') {
        return Err(SignatureError::InvalidRequest(format!("Path is not absolute: {}", uri_path)));
    }

    let uri_path = if s3 {
        Cow::Borrowed(uri_path)
    } else {
        // Replace double slashes; this makes it easier to handle slashes at the end.
        MULTISLASH.replace_all(uri_path, "/")
    };

    // Examine each path component for relative directories.
    let mut components: Vec<String> = uri_path.split('/').map(|s| s.to_string()).collect();
    let mut i = 1; // Ignore the leading "/"
    while i < components.len() {
        let component = normalize_uri_path_component(&components[i])?;

        if component == "." && !s3 {
            // Relative path: current directory; remove this.
            components.remove(i);
        } else if component == ".." && !s3 {
            if i <= 1 {
                return Err(SignatureError::InvalidRequest(format!(
                    "Relative path entry '..' navigates above root: {}",
                    uri_path
                )));
            }

            components.remove(i - 1);
            components.remove(i - 1);

            // Two components are gone; back up one to examine what's now the next component.
            i -= 1;
        } else {
            components[i] = component;
            i += 1;
        }
    }

    assert!(!components.is_empty());
    match components.len() {
        1 => Ok("/".to_string()),
        _ => Ok(components.join("/")),
    }
}

/// Indicates whether the specified byte is RFC3986 unreserved -- i.e., can be represented without being
/// percent-encoded, e.g. '?' -> '%3F'.
#[cfg_attr(any(doc, feature = "unstable"), qualifiers(pub))]
#[cfg_attr(not(any(doc, feature = "unstable")), qualifiers(pub(crate)))]
#[inline(always)]
pub fn is_rfc3986_unreserved(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'-' || c == b'.' || c == b'_' || c == b'~'
}

/// Normalizes a header value by trimming leading and trailing whitespace. Interior whitespace is
/// left untouched.
#[cfg_attr(any(doc, feature = "unstable"), qualifiers(pub))]
#[cfg_attr(not(any(doc, feature = "unstable")), qualifiers(pub(crate)))]
pub fn normalize_header_value(value: &str) -> String {
    value.trim_matches(|c: char| c.is_ascii_whitespace()).to_string()
}

/// Normalize a single element (key or value from key=value) of a query string.
#[cfg_attr(any(doc, feature = "unstable"), qualifiers(pub))]
#[cfg_attr(not(any(doc, feature = "unstable")), qualifiers(pub(crate)))]
pub fn normalize_query_string_element(element: &str) -> Result<String, SignatureError> {
    normalize_uri_element(element, UriElement::Query)
}

/// Normalizes a path element of a URI.
#[cfg_attr(any(doc, feature = "unstable"), qualifiers(pub))]
#[cfg_attr(not(any(doc, feature = "unstable")), qualifiers(pub(crate)))]
pub fn normalize_uri_path_component(path: &str) -> Result<String, SignatureError> {
    normalize_uri_element(path, UriElement::Path)
}

/// Normalize the URI or query string according to RFC 3986.  This performs the following operations:
/// * Alpha, digit, and the symbols `-`, `.`, `_`, and `~` (unreserved characters) are left alone.
/// * Characters outside this range are percent-encoded.
/// * Percent-encoded values are upper-cased (`%2a` becomes `%2A`)
/// * Percent-encoded values in the unreserved space (`%41`-`%5A`, `%61`-`%7A`, `%30`-`%39`, `%2D`, `%2E`, `%5F`,
///   `%7E`) are converted to normal characters.
/// * `+` is treated as an encoded space and becomes `%20`.
///
/// If a percent encoding is incomplete, an error is returned.
fn normalize_uri_element(uri_el: &str, uri_el_type: UriElement) -> Result<String, SignatureError> {
    let bytes = uri_el.as_bytes();
    let mut i = 0;
    let mut result = String::with_capacity(bytes.len());

    let error = |message: String| {
        SignatureError::InvalidRequest(match uri_el_type {
            UriElement::Path => format!("Invalid URI path: {}", message),
            UriElement::Query => format!("Malformed query string: {}", message),
        })
    };

    while i < bytes.len() {
        let c = bytes[i];

        if is_rfc3986_unreserved(c) {
            result.push(c as char);
            i += 1;
        } else if c == b'%' {
            if i + 2 >= bytes.len() {
                // % encoding would go beyond end of string.
                return Err(error(MSG_INCOMPLETE_TRAILING_ESCAPE.to_string()));
            }

            let hex_digits = &bytes[i + 1..i + 3];
            match hex::decode(hex_digits) {
                Ok(value) => {
                    let c = value[0];

                    if is_rfc3986_unreserved(c) {
                        result.push(c as char);
                    } else {
                        // Rewrite the hex-escape so it's always upper-cased.
                        push_percent_encoded(&mut result, c);
                    }
                    i += 3;
                }
                Err(_) => {
                    return Err(error(format!(
                        "{}{}{}",
                        MSG_ILLEGAL_HEX_CHAR, hex_digits[0] as char, hex_digits[1] as char
                    )));
                }
            }
        } else if c == b'+' {
            // Plus-encoded space. Convert this to %20.
            result.push_str("%20");
            i += 1;
        } else {
            // Character should have been encoded.
            push_percent_encoded(&mut result, c);
            i += 1;
        }
    }

    Ok(result)
}

#[inline]
fn push_percent_encoded(result: &mut String, c: u8) {
    let [hi, lo] = u8_to_upper_hex(c);
    result.push('%');
    result.push(hi as char);
    result.push(lo as char);
}

/// Convert a byte to uppercase hex representation.
#[cfg_attr(any(doc, feature = "unstable"), qualifiers(pub))]
#[cfg_attr(not(any(doc, feature = "unstable")), qualifiers(pub(crate)))]
#[inline(always)]
const fn u8_to_upper_hex(b: u8) -> [u8; 2] {
    [HEX_DIGITS_UPPER[((b >> 4) & 0xf) as usize], HEX_DIGITS_UPPER[(b & 0xf) as usize]]
}
