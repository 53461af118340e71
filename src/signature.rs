use {
    crate::{
        auth::{compute_signature, string_to_sign, SignatureResult},
        canonical::CanonicalRequest,
        constants::*,
        Credentials, SignatureError, SigningContext, SigningKeyCache, SigningRequest,
    },
    chrono::{DateTime, Utc},
    http::request::Request,
    log::debug,
    std::{borrow::Cow, env},
};

/// Options that can be used to configure the signer.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SignatureOptions {
    /// Canonicalize requests according to S3 rules: the URI path is not normalized, and the payload
    /// hash is sent and signed as the `x-amz-content-sha256` header.
    pub s3: bool,

    /// The region used for contexts created by [`SignatureOptions::context_now`].
    pub region: Cow<'static, str>,

    /// The service used for contexts created by [`SignatureOptions::context_now`].
    pub service: Cow<'static, str>,
}

impl Default for SignatureOptions {
    /// Non-S3 canonicalization for the `execute-api` service in `us-gov-west-1`.
    fn default() -> Self {
        Self {
            s3: false,
            region: Cow::Borrowed(DEFAULT_REGION),
            service: Cow::Borrowed(DEFAULT_SERVICE),
        }
    }
}

impl SignatureOptions {
    /// Create a `SignatureOptions` suitable for use with S3-type authentication.
    ///
    /// This sets `s3` to `true` and `service` to `s3`, resulting in AWS SigV4S3-style
    /// canonicalization.
    pub const S3: Self = Self {
        s3: true,
        region: Cow::Borrowed(DEFAULT_REGION),
        service: Cow::Borrowed("s3"),
    };

    /// Read the region from `AWS_REGION` (falling back to `AWS_DEFAULT_REGION`) and the service
    /// from `AWS_SIGV4_SERVICE`. Variables that are unset or empty keep their defaults.
    pub fn from_env() -> Self {
        let mut options = Self::default();

        if let Some(region) = non_empty_env(ENV_AWS_REGION).or_else(|| non_empty_env(ENV_AWS_DEFAULT_REGION)) {
            options.region = Cow::Owned(region);
        }

        if let Some(service) = non_empty_env(ENV_AWS_SIGV4_SERVICE) {
            options.service = Cow::Owned(service);
        }

        debug!("Signature options from environment: region={} service={}", options.region, options.service);
        options
    }

    /// Create a [`SigningContext`] for the configured region and service at `timestamp`.
    pub fn context_at(&self, timestamp: DateTime<Utc>) -> Result<SigningContext, SignatureError> {
        SigningContext::builder().region(self.region.as_ref()).service(self.service.as_ref()).timestamp(timestamp).build()
    }

    /// Create a [`SigningContext`] for the configured region and service at the current time.
    pub fn context_now(&self) -> Result<SigningContext, SignatureError> {
        self.context_at(Utc::now())
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.is_empty())
}

/// Sign a request with AWS SigV4.
///
/// This computes the canonical request, derives the signing key for the context's credential
/// scope, and returns the headers that authenticate the request.
///
/// # Parameters
/// * `request` - The [`SigningRequest`] to sign.
/// * `credentials` - The [`Credentials`] to sign with. A session token, if present, is signed as
///   the `x-amz-security-token` header.
/// * `context` - The region, service, and timestamp of the signature.
/// * `options` - [`SignatureOptions`] that affect canonicalization. For most services, use
///   `SignatureOptions::default()`. The context's region and service always take precedence over
///   those in the options.
///
/// # Errors
/// This function returns a [`SignatureError`] if the credentials are incomplete or the request
/// cannot be canonicalized. No partial result is ever returned.
pub fn sigv4_sign_request(
    request: &SigningRequest,
    credentials: &Credentials,
    context: &SigningContext,
    options: SignatureOptions,
) -> Result<SignatureResult, SignatureError> {
    sign(request, credentials, context, &options, None)
}

fn sign(
    request: &SigningRequest,
    credentials: &Credentials,
    context: &SigningContext,
    options: &SignatureOptions,
    cache: Option<&SigningKeyCache>,
) -> Result<SignatureResult, SignatureError> {
    credentials.validate()?;
    let secret_key = credentials.secret_key()?;

    let canonical_request =
        CanonicalRequest::from_signing_request(request, context, credentials.session_token(), options)?;

    let scope = context.credential_scope();
    let signing_key = match cache {
        Some(cache) => cache.get_or_derive(&secret_key, &scope),
        None => secret_key.derive_signing_key(&scope),
    };

    let amz_date = context.amz_date();
    let string_to_sign = string_to_sign(&amz_date, &scope, &canonical_request.canonical_request_sha256());
    let signature = compute_signature(&signing_key, &string_to_sign);

    Ok(SignatureResult::assemble(
        credentials.access_key_id(),
        &scope,
        &canonical_request,
        signature,
        amz_date,
        credentials.session_token(),
    ))
}

/// A reusable signer: [`SignatureOptions`] plus an optional [`SigningKeyCache`].
///
/// Signers hold no per-request state and can be shared across threads.
#[derive(Debug, Default)]
pub struct Signer {
    options: SignatureOptions,
    cache: Option<SigningKeyCache>,
}

impl Signer {
    /// Create a signer that derives a fresh signing key for every request.
    pub fn new(options: SignatureOptions) -> Self {
        Self {
            options,
            cache: None,
        }
    }

    /// Cache derived signing keys across requests.
    pub fn with_cache(mut self) -> Self {
        self.cache = Some(SigningKeyCache::new());
        self
    }

    /// Retrieve the options for this signer.
    #[inline]
    pub fn options(&self) -> &SignatureOptions {
        &self.options
    }

    /// Retrieve the signing key cache, if caching is enabled.
    #[inline]
    pub fn cache(&self) -> Option<&SigningKeyCache> {
        self.cache.as_ref()
    }

    /// Sign a request. See [`sigv4_sign_request`].
    pub fn sign(
        &self,
        request: &SigningRequest,
        credentials: &Credentials,
        context: &SigningContext,
    ) -> Result<SignatureResult, SignatureError> {
        sign(request, credentials, context, &self.options, self.cache.as_ref())
    }

    /// Sign a request now, in the region and service of this signer's options.
    pub fn sign_now(&self, request: &SigningRequest, credentials: &Credentials) -> Result<SignatureResult, SignatureError> {
        let context = self.options.context_now()?;
        self.sign(request, credentials, &context)
    }

    /// Sign an [`http::Request`] and merge the signature headers into it.
    ///
    /// The request's headers are left untouched if signing fails. A request that already carries an
    /// `Authorization` header cannot be signed again.
    pub fn sign_http_request<B>(
        &self,
        request: &mut Request<B>,
        credentials: &Credentials,
        context: &SigningContext,
    ) -> Result<SignatureResult, SignatureError>
    where
        B: AsRef<[u8]>,
    {
        let signing_request = SigningRequest::from_http_request(request)?;
        let result = self.sign(&signing_request, credentials, context)?;
        result.apply_to_headers(request.headers_mut())?;
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use {
        super::{sigv4_sign_request, SignatureOptions, Signer},
        crate::{
            constants::{TEST_ACCESS_KEY, TEST_REGION, TEST_SECRET_KEY, TEST_SERVICE},
            Credentials, SigningContext, SigningRequest,
        },
        chrono::{NaiveDate, Utc},
        http::Method,
        std::{sync::Arc, thread},
    };

    fn credentials() -> Credentials {
        Credentials::new(TEST_ACCESS_KEY, TEST_SECRET_KEY)
    }

    fn context(service: &str) -> SigningContext {
        SigningContext::from_amz_date(TEST_REGION, service, "20150830T123600Z").unwrap()
    }

    fn get_vanilla() -> SigningRequest {
        SigningRequest::builder().url("https://example.amazonaws.com/").build().unwrap()
    }

    #[test_log::test]
    fn test_get_vanilla() {
        let result =
            sigv4_sign_request(&get_vanilla(), &credentials(), &context(TEST_SERVICE), SignatureOptions::default())
                .unwrap();
        assert_eq!(
            result.authorization(),
            "AWS4-HMAC-SHA256 Credential=AKIDEXAMPLE/20150830/us-east-1/service/aws4_request, \
             SignedHeaders=host;x-amz-date, \
             Signature=5fa00fa31553b73ebf1942676e86291e8372ff2a2260956d9b8aae1d763fbf31"
        );
        assert_eq!(result.amz_date(), "20150830T123600Z");
        assert_eq!(result.host(), "example.amazonaws.com");
        assert_eq!(result.security_token(), None);
    }

    #[test_log::test]
    fn test_execute_api_scenario() {
        let result =
            sigv4_sign_request(&get_vanilla(), &credentials(), &context("execute-api"), SignatureOptions::default())
                .unwrap();
        assert_eq!(
            result.authorization(),
            "AWS4-HMAC-SHA256 Credential=AKIDEXAMPLE/20150830/us-east-1/execute-api/aws4_request, \
             SignedHeaders=host;x-amz-date, \
             Signature=0b42ea2cbe5587460c2dc01f388964c0834d1cf82281963872548698c270aeb6"
        );
    }

    #[test_log::test]
    fn test_deterministic_and_cache_transparent() {
        let uncached = Signer::new(SignatureOptions::default());
        let cached = Signer::new(SignatureOptions::default()).with_cache();
        assert!(uncached.cache().is_none());

        let first = uncached.sign(&get_vanilla(), &credentials(), &context(TEST_SERVICE)).unwrap();
        let second = uncached.sign(&get_vanilla(), &credentials(), &context(TEST_SERVICE)).unwrap();
        let third = cached.sign(&get_vanilla(), &credentials(), &context(TEST_SERVICE)).unwrap();
        let fourth = cached.sign(&get_vanilla(), &credentials(), &context(TEST_SERVICE)).unwrap();

        assert_eq!(first, second);
        assert_eq!(first, third);
        assert_eq!(first, fourth);
        assert_eq!(cached.cache().unwrap().len(), 1);
    }

    #[test_log::test]
    fn test_signing_key_shared_across_requests_in_scope() {
        let signer = Signer::new(SignatureOptions::default()).with_cache();
        let get = SigningRequest::builder().url("https://example.amazonaws.com/a").build().unwrap();
        let post = SigningRequest::builder()
            .method(Method::POST)
            .url("https://example.amazonaws.com/b")
            .body(b"Param1=value1".to_vec())
            .build()
            .unwrap();

        let first = signer.sign(&get, &credentials(), &context(TEST_SERVICE)).unwrap();
        let second = signer.sign(&post, &credentials(), &context(TEST_SERVICE)).unwrap();
        assert_ne!(first.signature(), second.signature());
        assert_eq!(signer.cache().unwrap().len(), 1);

        signer.sign(&get, &credentials(), &context("execute-api")).unwrap();
        assert_eq!(signer.cache().unwrap().len(), 2);
    }

    #[test_log::test]
    fn test_session_token() {
        let creds = credentials().with_session_token("session-token");
        let result =
            sigv4_sign_request(&get_vanilla(), &creds, &context(TEST_SERVICE), SignatureOptions::default()).unwrap();
        assert!(result.authorization().contains("SignedHeaders=host;x-amz-date;x-amz-security-token,"));
        assert_eq!(result.security_token(), Some("session-token"));
    }

    #[test_log::test]
    fn test_invalid_credentials() {
        let e = sigv4_sign_request(
            &get_vanilla(),
            &Credentials::new(TEST_ACCESS_KEY, ""),
            &context(TEST_SERVICE),
            SignatureOptions::default(),
        )
        .unwrap_err();
        assert_eq!(e.error_code(), "ConfigurationError");

        let e = sigv4_sign_request(
            &get_vanilla(),
            &Credentials::new(TEST_ACCESS_KEY, "   "),
            &context(TEST_SERVICE),
            SignatureOptions::default(),
        )
        .unwrap_err();
        assert_eq!(e.to_string(), "Secret access key must not be empty");

        let long_secret = "x".repeat(200);
        let e = sigv4_sign_request(
            &get_vanilla(),
            &Credentials::new(TEST_ACCESS_KEY, long_secret),
            &context(TEST_SERVICE),
            SignatureOptions::default(),
        )
        .unwrap_err();
        assert_eq!(e.error_code(), "ConfigurationError");
        assert_eq!(e.to_string(), "Invalid secret access key: Key too long");
    }

    #[test_log::test]
    fn test_sign_http_request() {
        let signer = Signer::default();
        let mut request = http::Request::builder()
            .method(Method::POST)
            .uri("https://api.example.com/v1/chat")
            .header("Content-Type", "application/json")
            .header("Accept", "application/json")
            .body(br#"{"messages":[{"role":"user","text":"Hello"}]}"#.to_vec())
            .unwrap();
        let context = SigningContext::from_amz_date("us-gov-west-1", "execute-api", "20150830T123600Z").unwrap();

        let result = signer.sign_http_request(&mut request, &credentials(), &context).unwrap();
        assert_eq!(result.signature(), "1145e85479e7e52fe9a7d799a43b3c841d6bacf6ceb2019ee9977d6d0f1bd7bd");
        assert_eq!(request.headers()["authorization"], result.authorization());
        assert_eq!(request.headers()["x-amz-date"], "20150830T123600Z");
        assert_eq!(request.headers()["host"], "api.example.com");

        // Re-signing the already-signed request fails without touching its headers.
        let before = request.headers().clone();
        let e = signer.sign_http_request(&mut request, &credentials(), &context).unwrap_err();
        assert_eq!(e.error_code(), "InvalidRequest");
        assert_eq!(request.headers(), &before);
    }

    #[test_log::test]
    fn test_signer_is_shareable() {
        let signer = Arc::new(Signer::new(SignatureOptions::default()).with_cache());
        let expected = signer.sign(&get_vanilla(), &credentials(), &context(TEST_SERVICE)).unwrap();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let signer = Arc::clone(&signer);
                thread::spawn(move || signer.sign(&get_vanilla(), &credentials(), &context(TEST_SERVICE)).unwrap())
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
    }

    #[test_log::test]
    fn test_options_defaults() {
        let options = SignatureOptions::default();
        assert!(!options.s3);
        assert_eq!(options.region, "us-gov-west-1");
        assert_eq!(options.service, "execute-api");

        assert!(SignatureOptions::S3.s3);
        assert_eq!(SignatureOptions::S3.service, "s3");

        let midnight = NaiveDate::from_ymd_opt(2021, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap().and_utc();
        let context = options.context_at(midnight).unwrap();
        assert_eq!(context.credential_scope().to_string(), "20210101/us-gov-west-1/execute-api/aws4_request");

        let today = Utc::now().date_naive();
        let context = options.context_now().unwrap();
        assert!(context.credential_scope().date() >= today);
    }

    #[test_log::test]
    fn test_options_from_env() {
        temp_env::with_vars(
            [
                ("AWS_REGION", None),
                ("AWS_DEFAULT_REGION", Some("eu-west-1")),
                ("AWS_SIGV4_SERVICE", Some("lambda")),
            ],
            || {
                let options = SignatureOptions::from_env();
                assert_eq!(options.region, "eu-west-1");
                assert_eq!(options.service, "lambda");
                assert!(!options.s3);
            },
        );

        temp_env::with_vars(
            [
                ("AWS_REGION", Some("us-west-2")),
                ("AWS_DEFAULT_REGION", Some("eu-west-1")),
                ("AWS_SIGV4_SERVICE", Some("")),
            ],
            || {
                let options = SignatureOptions::from_env();
                assert_eq!(options.region, "us-west-2");
                assert_eq!(options.service, "execute-api");
            },
        );
    }
}
