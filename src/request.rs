use {
    crate::SignatureError,
    bytes::Bytes,
    derive_builder::Builder,
    http::{method::Method, request::Request},
};

/// The parts of an outbound HTTP request that are covered by a SigV4 signature.
///
/// Headers are kept as an ordered list of name/value pairs exactly as the caller supplied them so
/// that names differing only in case can be detected during canonicalization. SigningRequest
/// structs are immutable. Use [`SigningRequestBuilder`] to programmatically construct a request.
#[derive(Builder, Clone, Debug)]
#[builder(build_fn(error = "SignatureError"))]
pub struct SigningRequest {
    /// The HTTP method for the request (e.g., `GET`, `POST`, etc.)
    #[builder(default = "Method::GET")]
    method: Method,

    /// The absolute URL of the request, e.g. `https://example.amazonaws.com/path?key=value`.
    #[builder(setter(into))]
    url: String,

    /// Headers to sign. Every header listed here is included in `SignedHeaders`.
    #[builder(setter(custom), default)]
    headers: Vec<(String, String)>,

    /// The raw request body.
    #[builder(setter(into), default)]
    body: Bytes,
}

impl SigningRequestBuilder {
    /// Add a header to sign.
    pub fn header<N, V>(&mut self, name: N, value: V) -> &mut Self
    where
        N: Into<String>,
        V: Into<String>,
    {
        self.headers.get_or_insert_with(Vec::new).push((name.into(), value.into()));
        self
    }

    /// Add several headers to sign.
    pub fn headers<I, N, V>(&mut self, headers: I) -> &mut Self
    where
        I: IntoIterator<Item = (N, V)>,
        N: Into<String>,
        V: Into<String>,
    {
        let list = self.headers.get_or_insert_with(Vec::new);
        list.extend(headers.into_iter().map(|(n, v)| (n.into(), v.into())));
        self
    }
}

impl SigningRequest {
    /// Create a [SigningRequestBuilder] to construct a [SigningRequest].
    #[inline]
    pub fn builder() -> SigningRequestBuilder {
        SigningRequestBuilder::default()
    }

    /// Capture the method, URI, headers, and body of an [`http::Request`].
    ///
    /// Header values that are not visible ASCII are rejected, since they cannot be canonicalized
    /// reliably.
    pub fn from_http_request<B>(request: &Request<B>) -> Result<Self, SignatureError>
    where
        B: AsRef<[u8]>,
    {
        let mut headers = Vec::with_capacity(request.headers().len());
        for (name, value) in request.headers() {
            let value = value.to_str().map_err(|_| {
                SignatureError::InvalidRequest(format!("Header '{}' contains a value that is not visible ASCII", name))
            })?;
            headers.push((name.as_str().to_string(), value.to_string()));
        }

        Ok(Self {
            method: request.method().clone(),
            url: request.uri().to_string(),
            headers,
            body: Bytes::copy_from_slice(request.body().as_ref()),
        })
    }

    /// Retrieve the HTTP method.
    #[inline]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Retrieve the absolute URL.
    #[inline]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Retrieve the headers to sign, in the order they were supplied.
    #[inline]
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Retrieve the raw body.
    #[inline]
    pub fn body(&self) -> &Bytes {
        &self.body
    }
}
