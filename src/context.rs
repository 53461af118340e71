use {
    crate::{chronoutil::AmzDate, constants::*, signing_key::DerivationLink, SignatureError},
    chrono::{DateTime, NaiveDate, SubsecRound, Utc},
    derive_builder::Builder,
    std::{
        borrow::Cow,
        fmt::{Display, Formatter, Result as FmtResult},
    },
};

/// Where and when a request is being signed.
///
/// The region, service, and the date portion of the timestamp form the [credential
/// scope][CredentialScope]. SigningContext structs are immutable. Use [`SigningContextBuilder`] to
/// programmatically construct a context.
#[derive(Builder, Clone, Debug, Eq, PartialEq)]
#[builder(build_fn(validate = "Self::validate", error = "SignatureError"))]
pub struct SigningContext {
    /// The region of the request.
    #[builder(setter(into))]
    region: String,

    /// The service of the request.
    #[builder(setter(into))]
    service: String,

    /// The time the request is signed. Sub-second precision is ignored.
    #[builder(default = "Utc::now()")]
    timestamp: DateTime<Utc>,
}

impl From<derive_builder::UninitializedFieldError> for SignatureError {
    fn from(e: derive_builder::UninitializedFieldError) -> Self {
        SignatureError::Configuration(format!("Missing required field '{}'", e.field_name()))
    }
}

impl SigningContextBuilder {
    fn validate(&self) -> Result<(), SignatureError> {
        if let Some(region) = &self.region {
            if region.is_empty() {
                return Err(SignatureError::Configuration("Region must not be empty".to_string()));
            }
        }

        if let Some(service) = &self.service {
            if service.is_empty() {
                return Err(SignatureError::Configuration("Service must not be empty".to_string()));
            }
        }

        Ok(())
    }
}

impl SigningContext {
    /// Create a [SigningContextBuilder] to construct a [SigningContext].
    #[inline]
    pub fn builder() -> SigningContextBuilder {
        SigningContextBuilder::default()
    }

    /// Create a context for signing now.
    pub fn now<R, S>(region: R, service: S) -> Result<Self, SignatureError>
    where
        R: Into<String>,
        S: Into<String>,
    {
        Self::builder().region(region).service(service).build()
    }

    /// Create a context from an `X-Amz-Date` style timestamp (`YYYYMMDD'T'HHMMSS'Z'`).
    pub fn from_amz_date<R, S>(region: R, service: S, amz_date: &str) -> Result<Self, SignatureError>
    where
        R: Into<String>,
        S: Into<String>,
    {
        let timestamp = DateTime::<Utc>::parse_amz_date(amz_date)?;
        Self::builder().region(region).service(service).timestamp(timestamp).build()
    }

    /// Retrieve the region of the request.
    #[inline]
    pub fn region(&self) -> &str {
        &self.region
    }

    /// Retrieve the service of the request.
    #[inline]
    pub fn service(&self) -> &str {
        &self.service
    }

    /// Retrieve the signing time, truncated to whole seconds.
    #[inline]
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp.trunc_subsecs(0)
    }

    /// The `X-Amz-Date` value for this context.
    pub fn amz_date(&self) -> String {
        self.timestamp.to_amz_date()
    }

    /// The credential scope for this context.
    pub fn credential_scope(&self) -> CredentialScope {
        CredentialScope::new(self.timestamp.date_naive(), &self.region, &self.service)
    }
}

/// The date, region, and service that bound the validity of a derived signing key.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct CredentialScope {
    date: NaiveDate,
    region: String,
    service: String,
}

impl CredentialScope {
    /// Create a new credential scope.
    pub fn new<R, S>(date: NaiveDate, region: R, service: S) -> Self
    where
        R: Into<String>,
        S: Into<String>,
    {
        Self {
            date,
            region: region.into(),
            service: service.into(),
        }
    }

    /// Retrieve the date of the scope.
    #[inline]
    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// Retrieve the region of the scope.
    #[inline]
    pub fn region(&self) -> &str {
        &self.region
    }

    /// Retrieve the service of the scope.
    #[inline]
    pub fn service(&self) -> &str {
        &self.service
    }

    /// The ordered `(link, message)` pairs of the signing key derivation chain. Each message is
    /// HMAC'd under the key produced by the previous link; the first is keyed by `"AWS4" + secret`.
    pub fn derivation_links(&self) -> [(DerivationLink, Cow<'_, str>); 4] {
        [
            (DerivationLink::Date, Cow::Owned(self.date.format(ISO8601_DATE_FORMAT).to_string())),
            (DerivationLink::Region, Cow::Borrowed(self.region.as_str())),
            (DerivationLink::Service, Cow::Borrowed(self.service.as_str())),
            (DerivationLink::Request, Cow::Borrowed(AWS4_REQUEST)),
        ]
    }
}

impl Display for CredentialScope {
    /// Formats as `YYYYMMDD/region/service/aws4_request`.
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}/{}/{}/{}", self.date.format(ISO8601_DATE_FORMAT), self.region, self.service, AWS4_REQUEST)
    }
}
