//! The `aws_sigv4_signer` crate provides AWS SigV4 _signing_ routines for outbound HTTP requests.
//!
//! Given a request (method, URL, headers, and body), a set of [`Credentials`], and a
//! [`SigningContext`] (region, service, and timestamp), the signer produces the `Authorization`,
//! `X-Amz-Date`, and `Host` headers (plus `X-Amz-Security-Token` for temporary credentials) that
//! authenticate the request to AWS or any service that verifies AWS SigV4 signatures, such as
//! API Gateway with IAM authentication.
//!
//! Signing is synchronous, performs no I/O, and is deterministic: the same inputs always produce
//! the same signature. Secret keys, derived signing keys, and session tokens are never logged.
//!
//! # Workflow
//! 1. Build a [`SigningRequest`], or convert an [`http::Request`] with
//!    [`SigningRequest::from_http_request`].
//! 2. Load [`Credentials`] (directly or with [`Credentials::from_env`]).
//! 3. Create a [`SigningContext`] for the target region and service.
//! 4. Call [`sigv4_sign_request`] (or [`Signer::sign`]) and attach the resulting headers.
//!
//! ## Example
//! ```rust
//! use aws_sigv4_signer::{sigv4_sign_request, Credentials, SignatureOptions, SigningContext, SigningRequest};
//! use http::Method;
//!
//! let request = SigningRequest::builder()
//!     .method(Method::POST)
//!     .url("https://api.example.com/v1/chat")
//!     .header("Content-Type", "application/json")
//!     .body(br#"{"messages":[{"role":"user","text":"Hello"}]}"#.to_vec())
//!     .build()
//!     .unwrap();
//!
//! let credentials = Credentials::new("AKIDEXAMPLE", "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY");
//! let context = SigningContext::from_amz_date("us-gov-west-1", "execute-api", "20150830T123600Z").unwrap();
//!
//! let result = sigv4_sign_request(&request, &credentials, &context, SignatureOptions::default()).unwrap();
//! assert!(result.authorization().starts_with(
//!     "AWS4-HMAC-SHA256 Credential=AKIDEXAMPLE/20150830/us-gov-west-1/execute-api/aws4_request, "));
//! assert_eq!(result.amz_date(), "20150830T123600Z");
//! assert_eq!(result.host(), "api.example.com");
//!
//! for (name, value) in result.into_header_pairs() {
//!     println!("{}: {}", name, value);
//! }
//! ```

#![warn(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![warn(rustdoc::missing_crate_level_docs)]

#[cfg(any(doc, feature = "unstable"))]
pub mod auth;
#[cfg(not(any(doc, feature = "unstable")))]
mod auth;

mod cache;

#[cfg(any(doc, feature = "unstable"))]
pub mod canonical;
#[cfg(not(any(doc, feature = "unstable")))]
mod canonical;

mod chronoutil;
mod constants;
mod context;
mod credentials;
mod crypto;
mod error;
mod request;
mod signature;
mod signing_key;

pub use crate::{
    auth::SignatureResult,
    cache::SigningKeyCache,
    context::{CredentialScope, SigningContext, SigningContextBuilder},
    credentials::Credentials,
    error::{KeyLengthError, SignatureError},
    request::{SigningRequest, SigningRequestBuilder},
    signature::{sigv4_sign_request, SignatureOptions, Signer},
    signing_key::{
        DerivationLink, KDateKey, KRegionKey, KSecretKey, KServiceKey, KSigningKey, KSECRETKEY_MAX_LENGTH,
    },
};
