//! S3 client
//!
//! S3 API reference: <https://docs.aws.amazon.com/AmazonS3/latest/API/Welcome.html>
//!
//! A request goes through four stages:
//!
//! 1. [`RequestBuilder`] accumulates method, host, bucket, object, query
//!    parameters, headers and body.
//! 2. [`RequestBuilder::finalize`] freezes it into a [`PreparedRequest`] in
//!    canonical form.
//! 3. [`PreparedRequest::sign`] derives a scoped signing key and produces a
//!    [`SignedRequest`] carrying the `Authorization` value.
//! 4. [`execute`] hands it to a [`Transport`] and returns a [`Response`],
//!    which owns the connection until it is read or closed.
//!
//! [`Client`] wires these together; the bucket and object helpers are thin
//! callers on top of it.
//!
//! Notes:
//!
//! - requests are signed in the `Authorization` header only; presigned urls
//!   are not supported
//! - payloads are hashed whole, there is no chunked payload signing

pub mod bucket;
pub mod canonical;
pub mod object;
pub mod request;
pub mod response;
pub mod service;
pub mod sign_v4;
pub mod transport;

mod error;
pub use error::{ApiError, BuildError, Error};

pub use bucket::Bucket;
pub use object::Object;
pub use request::{HTTPVerb, PreparedRequest, RequestBuilder, SignedRequest};
pub use response::Response;
pub use transport::{HttpTransport, RawResponse, Transport, TransportError, WireRequest, execute};

use crate::credentials::Credentials;
use bon::bon;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

pub const HTTP_HDR_AUTH: &str = "Authorization";
pub const HTTP_HDR_DATE: &str = "Date";
pub const HTTP_HDR_HOST: &str = "Host";

pub const DEFAULT_S3_ENDPOINT: &str = "s3.amazonaws.com";
pub const DEFAULT_S3_REGION: &str = "us-east-1";

pub const S3_NAMESPACE: &str = "http://s3.amazonaws.com/doc/2006-03-01/";

pub const AMZN_HDR_SHA256: &str = "x-amz-content-sha256";
pub const AMZN_HDR_SECURITY_TOKEN: &str = "x-amz-security-token";

pub struct Client {
    credentials: Credentials,
    endpoint: String,
    region: String,
    scheme: String,
    timeout: Option<Duration>,
    transport: Arc<dyn Transport>,
}

/// Create an s3 client
#[bon]
impl Client {
    /// - `endpoint`: host name, optionally with a port; defaults to `s3.amazonaws.com`
    /// - `region`: signing region; defaults to `us-east-1`
    /// - `scheme`: `http` or `https`; defaults to `https`
    /// - `transport`: defaults to a pooled [`HttpTransport`]
    #[builder(on(String, into))]
    pub fn new(
        access_key_id: String,
        access_key_secret: String,
        security_token: Option<String>,
        #[builder(default = DEFAULT_S3_ENDPOINT.to_owned())] endpoint: String,
        #[builder(default = DEFAULT_S3_REGION.to_owned())] region: String,
        #[builder(default = "https".to_owned())] scheme: String,
        timeout: Option<Duration>,
        transport: Option<Arc<dyn Transport>>,
    ) -> Self {
        Self {
            credentials: Credentials::new(access_key_id, access_key_secret, security_token, None),
            endpoint,
            region,
            scheme,
            timeout,
            transport: transport.unwrap_or_else(|| Arc::new(HttpTransport::new())),
        }
    }
}

impl Client {
    pub fn with_credentials(credentials: Credentials, transport: Arc<dyn Transport>) -> Self {
        Self {
            credentials,
            endpoint: DEFAULT_S3_ENDPOINT.to_owned(),
            region: DEFAULT_S3_REGION.to_owned(),
            scheme: "https".to_owned(),
            timeout: None,
            transport,
        }
    }

    pub fn set_endpoint_info(&mut self, endpoint: Option<&str>, region: Option<&str>) {
        if let Some(s) = endpoint {
            s.clone_into(&mut self.endpoint);
        }
        if let Some(s) = region {
            s.clone_into(&mut self.region);
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// A GET request against this client's endpoint, region and scheme,
    /// timestamped now.
    pub fn request(&self) -> RequestBuilder {
        self.request_at(time::OffsetDateTime::now_utc())
    }

    /// Same as [`Client::request`] with an explicit as-of instant.
    pub fn request_at(&self, timestamp: time::OffsetDateTime) -> RequestBuilder {
        let mut req = RequestBuilder::at(timestamp);
        req.scheme(&self.scheme).host(&self.region, &self.endpoint);
        if let Some(timeout) = self.timeout {
            req.timeout(timeout);
        }
        request::apply_credentials(&mut req, &self.credentials);
        req
    }

    /// Finalizes, signs and executes `request`.
    ///
    /// Any received response is returned, including non-2xx ones; see
    /// [`Response::error_for_status`].
    pub fn execute(&self, request: RequestBuilder) -> Result<Response, Error> {
        if self.credentials.is_expired_at(request.timestamp()) {
            warn!(access_key_id = %self.credentials.access_key_id, "signing with expired credentials");
        }
        let signed = request.finalize()?.sign(&self.credentials)?;
        execute(self.transport.as_ref(), signed)
    }
}

impl std::fmt::Display for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Client({})", self.endpoint)
    }
}
