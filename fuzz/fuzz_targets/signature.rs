#![no_main]
use {
    arbitrary::Arbitrary,
    aws_sigv4_signer::{sigv4_sign_request, Credentials, SignatureOptions, SigningContext, SigningRequest},
    chrono::NaiveDate,
    http::Method,
    libfuzzer_sys::{fuzz_target, Corpus},
};

#[derive(Arbitrary, Debug)]
enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Head,
    Options,
    Trace,
    Connect,
    Patch,
}

impl From<HttpMethod> for Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
            HttpMethod::Put => Method::PUT,
            HttpMethod::Delete => Method::DELETE,
            HttpMethod::Head => Method::HEAD,
            HttpMethod::Options => Method::OPTIONS,
            HttpMethod::Trace => Method::TRACE,
            HttpMethod::Connect => Method::CONNECT,
            HttpMethod::Patch => Method::PATCH,
        }
    }
}

#[derive(Arbitrary, Debug)]
struct SignInput {
    method: HttpMethod,
    url: String,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
    region: String,
    service: String,
    session_token: Option<String>,
    s3: bool,
}

fuzz_target!(|data: SignInput| -> Corpus {
    match run_target(data) {
        Some(signature_len) => {
            assert_eq!(signature_len, 64);
            Corpus::Keep
        }
        None => Corpus::Reject,
    }
});

fn run_target(data: SignInput) -> Option<usize> {
    let timestamp = NaiveDate::from_ymd_opt(2015, 8, 30)?.and_hms_opt(12, 36, 0)?.and_utc();
    let context = SigningContext::builder().region(data.region).service(data.service).timestamp(timestamp).build().ok()?;

    let request = SigningRequest::builder()
        .method(data.method.into())
        .url(data.url)
        .headers(data.headers)
        .body(data.body)
        .build()
        .ok()?;

    let mut credentials = Credentials::new("AKIDEXAMPLE", "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY");
    if let Some(token) = data.session_token {
        credentials = credentials.with_session_token(token);
    }

    let options = SignatureOptions {
        s3: data.s3,
        ..SignatureOptions::default()
    };

    let result = sigv4_sign_request(&request, &credentials, &context, options).ok()?;
    Some(result.signature().len())
}
