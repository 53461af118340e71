//! Long-term credentials used to sign requests.

use {
    crate::{constants::*, KSecretKey, SignatureError},
    log::debug,
    std::{
        env,
        fmt::{Debug, Formatter, Result as FmtResult},
        str::FromStr,
    },
};

/// An AWS access key id and secret access key, optionally with a session token from a temporary
/// credential.
///
/// The signer never persists these. The `Debug` implementation redacts everything except the
/// access key id.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    access_key_id: String,
    secret_access_key: String,
    session_token: Option<String>,
}

impl Credentials {
    /// Create a new set of long-term credentials.
    pub fn new<A, S>(access_key_id: A, secret_access_key: S) -> Self
    where
        A: Into<String>,
        S: Into<String>,
    {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            session_token: None,
        }
    }

    /// Attach a session token. The token is signed as the `x-amz-security-token` header.
    pub fn with_session_token<T: Into<String>>(mut self, session_token: T) -> Self {
        self.session_token = Some(session_token.into());
        self
    }

    /// Load credentials from `AWS_ACCESS_KEY_ID`, `AWS_SECRET_ACCESS_KEY` and, if set,
    /// `AWS_SESSION_TOKEN`.
    pub fn from_env() -> Result<Self, SignatureError> {
        let access_key_id = required_env(ENV_AWS_ACCESS_KEY_ID)?;
        let secret_access_key = required_env(ENV_AWS_SECRET_ACCESS_KEY)?;
        let session_token = env::var(ENV_AWS_SESSION_TOKEN).ok().filter(|s| !s.is_empty());

        debug!(
            "Loaded credentials from environment: access_key_id={} session_token={}",
            access_key_id,
            session_token.is_some()
        );

        let credentials = Self {
            access_key_id,
            secret_access_key,
            session_token,
        };
        credentials.validate()?;
        Ok(credentials)
    }

    /// Retrieve the access key id.
    #[inline]
    pub fn access_key_id(&self) -> &str {
        &self.access_key_id
    }

    /// Retrieve the session token, if any.
    #[inline]
    pub fn session_token(&self) -> Option<&str> {
        self.session_token.as_deref()
    }

    /// Convert the secret access key into a `kSecret` key.
    pub fn secret_key(&self) -> Result<KSecretKey, SignatureError> {
        Ok(KSecretKey::from_str(&self.secret_access_key)?)
    }

    /// Ensure no required field is empty. Signing must never proceed with partial credentials.
    pub fn validate(&self) -> Result<(), SignatureError> {
        if self.access_key_id.trim().is_empty() {
            return Err(SignatureError::Configuration("Access key id must not be empty".to_string()));
        }

        if self.secret_access_key.trim().is_empty() {
            return Err(SignatureError::Configuration("Secret access key must not be empty".to_string()));
        }

        if let Some(token) = &self.session_token {
            if token.trim().is_empty() {
                return Err(SignatureError::Configuration("Session token must not be empty when set".to_string()));
            }
        }

        Ok(())
    }
}

impl Debug for Credentials {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("session_token", &self.session_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

fn required_env(name: &str) -> Result<String, SignatureError> {
    match env::var(name) {
        Ok(value) if !value.is_empty() => Ok(value),
        _ => Err(SignatureError::Configuration(format!("Environment variable {} is not set", name))),
    }
}
