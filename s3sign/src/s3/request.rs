//! Request accumulation, freezing and signing.
//!
//! A [`RequestBuilder`] collects the request shape through chained setters.
//! [`RequestBuilder::finalize`] validates it, fixes the `Host`, `Date` and
//! `x-amz-content-sha256` headers and returns a frozen [`PreparedRequest`].
//! `finalize()` consumes the builder, so a frozen request cannot be mutated.
//!
//! Setters never fail. The first invalid input is latched and returned by
//! `finalize()`.

use super::canonical::{
    CookedHeader, canonical_path, canonical_query_string, canonical_request, cook_headers,
    payload_hash, signed_headers,
};
use super::error::BuildError;
use super::sign_v4::{SignV4Param, Signature, sign_v4};
use super::{DEFAULT_S3_ENDPOINT, DEFAULT_S3_REGION, HTTP_HDR_DATE, HTTP_HDR_HOST};
use super::{AMZN_HDR_SECURITY_TOKEN, AMZN_HDR_SHA256};
use crate::credentials::Credentials;
use reqwest::header::{HeaderName, HeaderValue};
use s3sign_common::helper::{gmt_format, uri_encode_path};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use std::time::Duration;
use time::OffsetDateTime;
use tracing::warn;
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HTTPVerb {
    Get,
    Put,
    Post,
    Delete,
    Head,
}

impl Display for HTTPVerb {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            HTTPVerb::Get => write!(f, "GET"),
            HTTPVerb::Put => write!(f, "PUT"),
            HTTPVerb::Post => write!(f, "POST"),
            HTTPVerb::Delete => write!(f, "DELETE"),
            HTTPVerb::Head => write!(f, "HEAD"),
        }
    }
}

/// Case-insensitive, surrounding whitespace ignored.
impl FromStr for HTTPVerb {
    type Err = BuildError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "GET" => Ok(HTTPVerb::Get),
            "PUT" => Ok(HTTPVerb::Put),
            "POST" => Ok(HTTPVerb::Post),
            "DELETE" => Ok(HTTPVerb::Delete),
            "HEAD" => Ok(HTTPVerb::Head),
            _ => Err(BuildError::InvalidMethod(s.to_owned())),
        }
    }
}

impl From<HTTPVerb> for reqwest::Method {
    fn from(verb: HTTPVerb) -> Self {
        match verb {
            HTTPVerb::Get => reqwest::Method::GET,
            HTTPVerb::Put => reqwest::Method::PUT,
            HTTPVerb::Post => reqwest::Method::POST,
            HTTPVerb::Delete => reqwest::Method::DELETE,
            HTTPVerb::Head => reqwest::Method::HEAD,
        }
    }
}

#[derive(Debug)]
pub struct RequestBuilder {
    verb: HTTPVerb,
    scheme: String,
    region: String,
    host: String,
    bucket: Option<String>,
    object: Option<String>,
    query_params: BTreeMap<String, Vec<String>>,
    // (name, value) in insertion order, merged when cooked
    headers: Vec<(String, String)>,
    body: Option<Vec<u8>>,
    timeout: Option<Duration>,
    timestamp: OffsetDateTime,
    error: Option<BuildError>,
}

impl Default for RequestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestBuilder {
    /// GET against the default endpoint and region, timestamped now.
    pub fn new() -> Self {
        Self::at(OffsetDateTime::now_utc())
    }

    /// Same as [`RequestBuilder::new`] with an explicit as-of instant. Every
    /// time-derived value of the request is computed from it.
    pub fn at(timestamp: OffsetDateTime) -> Self {
        Self {
            verb: HTTPVerb::Get,
            scheme: "https".to_owned(),
            region: DEFAULT_S3_REGION.to_owned(),
            host: DEFAULT_S3_ENDPOINT.to_owned(),
            bucket: None,
            object: None,
            query_params: BTreeMap::new(),
            headers: Vec::new(),
            body: None,
            timeout: None,
            timestamp,
            error: None,
        }
    }

    fn latch(&mut self, err: BuildError) {
        if self.error.is_none() {
            self.error = Some(err);
        }
    }

    /// Accepts any case and surrounding whitespace.
    pub fn method(&mut self, value: &str) -> &mut Self {
        match value.parse::<HTTPVerb>() {
            Ok(verb) => self.verb = verb,
            Err(e) => self.latch(e),
        }
        self
    }

    pub fn verb(&mut self, verb: HTTPVerb) -> &mut Self {
        self.verb = verb;
        self
    }

    pub fn host(&mut self, region: &str, host_name: &str) -> &mut Self {
        self.region = region.trim().to_owned();
        self.host = host_name.trim().to_owned();
        self
    }

    /// `http` or `https`
    pub fn scheme(&mut self, scheme: &str) -> &mut Self {
        self.scheme = scheme.trim().to_lowercase();
        self
    }

    /// An empty name clears the bucket.
    pub fn bucket(&mut self, name: &str) -> &mut Self {
        self.bucket = Some(name.to_owned()).filter(|s| !s.is_empty());
        self
    }

    /// An empty key clears the object.
    pub fn object(&mut self, key: &str) -> &mut Self {
        self.object = Some(key.to_owned()).filter(|s| !s.is_empty());
        self
    }

    /// Headers whose names differ only in case or padding collapse when the
    /// request is finalized; the last one added wins. `Host`, `Date` and
    /// `x-amz-content-sha256` are always overwritten by `finalize()`.
    pub fn add_header(&mut self, name: &str, value: &str) -> &mut Self {
        self.headers.push((name.to_owned(), value.to_owned()));
        self
    }

    /// Repeated names are kept, values in the order they were added.
    pub fn add_query_param(&mut self, name: &str, value: &str) -> &mut Self {
        self.query_params
            .entry(name.to_owned())
            .or_default()
            .push(value.to_owned());
        self
    }

    pub fn body(&mut self, body: impl Into<Vec<u8>>) -> &mut Self {
        self.body = Some(body.into());
        self
    }

    /// Forwarded to the transport; aborts the call when exceeded.
    pub fn timeout(&mut self, timeout: Duration) -> &mut Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn timestamp(&self) -> OffsetDateTime {
        self.timestamp
    }

    /// Validates and freezes the request.
    ///
    /// The builder is consumed, so nothing can be changed once the request
    /// is frozen:
    ///
    /// ```compile_fail
    /// use s3sign::s3::RequestBuilder;
    ///
    /// let mut req = RequestBuilder::new();
    /// req.bucket("b");
    /// let prepared = req.finalize();
    /// req.add_header("x-amz-meta-late", "v");
    /// ```
    ///
    /// A latched setter error is returned before any validation runs.
    pub fn finalize(mut self) -> Result<PreparedRequest, BuildError> {
        if let Some(err) = self.error.take() {
            warn!(error = %err, "refusing to finalize request");
            return Err(err);
        }
        self.prepare().inspect_err(|err| {
            warn!(error = %err, "refusing to finalize request");
        })
    }

    fn prepare(&self) -> Result<PreparedRequest, BuildError> {
        self.validate()?;

        let payload_hash = payload_hash(self.body.as_deref());
        let date = gmt_format(&self.timestamp)?;
        let mut headers = self
            .headers
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect::<Vec<_>>();
        headers.push((HTTP_HDR_HOST, self.host.as_str()));
        headers.push((HTTP_HDR_DATE, date.as_str()));
        headers.push((AMZN_HDR_SHA256, payload_hash.as_str()));
        let cooked_headers = cook_headers(headers);
        for h in &cooked_headers {
            validate_header(h)?;
        }

        Ok(PreparedRequest {
            verb: self.verb,
            scheme: self.scheme.clone(),
            region: self.region.clone(),
            host: self.host.clone(),
            bucket: self.bucket.clone(),
            object: self.object.clone(),
            path: canonical_path(self.bucket.as_deref(), self.object.as_deref()),
            query: canonical_query_string(&self.query_params),
            cooked_headers,
            payload_hash,
            body: self.body.clone(),
            timeout: self.timeout,
            timestamp: self.timestamp,
        })
    }

    fn validate(&self) -> Result<(), BuildError> {
        if self.scheme != "http" && self.scheme != "https" {
            return Err(BuildError::InvalidScheme(self.scheme.clone()));
        }
        validate_host(&self.host)?;
        validate_region(&self.region)?;
        if let Some(bucket) = &self.bucket {
            // bucket names go into the path unescaped
            if bucket.bytes().any(|b| !(b.is_ascii_alphanumeric() || b"-._".contains(&b))) {
                return Err(BuildError::InvalidBucketName(bucket.clone()));
            }
        }
        if let Some(object) = &self.object {
            validate_object_name(object)?;
        }
        Ok(())
    }
}

fn validate_host(host: &str) -> Result<(), BuildError> {
    let invalid = host.is_empty()
        || host.contains("://")
        || host
            .bytes()
            .any(|b| b.is_ascii_whitespace() || b.is_ascii_control() || b"/?#@".contains(&b));
    if invalid {
        return Err(BuildError::InvalidHost(host.to_owned()));
    }
    Ok(())
}

fn validate_region(region: &str) -> Result<(), BuildError> {
    let invalid = region.is_empty()
        || region
            .bytes()
            .any(|b| !(b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-'));
    if invalid {
        return Err(BuildError::InvalidRegion(region.to_owned()));
    }
    Ok(())
}

// The wire url collapses `.` and `..` segments, which would no longer match
// the signed path.
pub(crate) fn validate_object_name(name: &str) -> Result<(), BuildError> {
    let reject = |reason| {
        Err(BuildError::InvalidObjectName {
            name: name.to_owned(),
            reason,
        })
    };
    if name.len() > 1024 {
        return reject("object name is too long, max is 1024 bytes");
    }
    if name.bytes().any(|b| b == b'\r' || b == b'\n') {
        return reject("object name cannot contain control characters");
    }
    if name.split('/').any(|seg| seg == "." || seg == "..") {
        return reject("object name cannot contain relative path segments '.' or '..'");
    }
    Ok(())
}

fn validate_header(h: &CookedHeader) -> Result<(), BuildError> {
    if h.name.is_empty()
        || HeaderName::from_bytes(h.name.as_bytes()).is_err()
        || HeaderValue::from_str(&h.value).is_err()
    {
        return Err(BuildError::InvalidHeader(h.raw_name.clone()));
    }
    Ok(())
}

/// A frozen request in canonical form. Nothing here can be changed.
#[derive(Debug, Clone)]
pub struct PreparedRequest {
    verb: HTTPVerb,
    scheme: String,
    region: String,
    host: String,
    bucket: Option<String>,
    object: Option<String>,
    path: String,
    query: String,
    cooked_headers: Vec<CookedHeader>,
    payload_hash: String,
    body: Option<Vec<u8>>,
    timeout: Option<Duration>,
    timestamp: OffsetDateTime,
}

impl PreparedRequest {
    pub fn verb(&self) -> HTTPVerb {
        self.verb
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn bucket(&self) -> Option<&str> {
        self.bucket.as_deref()
    }

    pub fn object(&self) -> Option<&str> {
        self.object.as_deref()
    }

    pub fn canonical_path(&self) -> &str {
        &self.path
    }

    pub fn canonical_query_string(&self) -> &str {
        &self.query
    }

    pub fn cooked_headers(&self) -> &[CookedHeader] {
        &self.cooked_headers
    }

    pub fn signed_headers(&self) -> String {
        signed_headers(&self.cooked_headers)
    }

    pub fn payload_hash(&self) -> &str {
        &self.payload_hash
    }

    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub(crate) fn take_body(&mut self) -> Option<Vec<u8>> {
        self.body.take()
    }

    pub fn timestamp(&self) -> OffsetDateTime {
        self.timestamp
    }

    pub fn canonical_request(&self) -> String {
        canonical_request(
            &self.verb.to_string(),
            &self.path,
            &self.query,
            &self.cooked_headers,
            &self.payload_hash,
        )
    }

    /// `scheme://host/bucket/object?query`, using the same encoding that was
    /// signed.
    pub fn url(&self) -> Result<Url, BuildError> {
        let mut s = format!("{}://{}{}", self.scheme, self.host, self.path);
        if !self.query.is_empty() {
            s.push('?');
            s.push_str(&self.query);
        }
        Ok(Url::parse(&s)?)
    }

    /// Signs with a fresh signing key derived from this request's own timestamp.
    pub fn sign(self, credentials: &Credentials) -> Result<SignedRequest, BuildError> {
        let canonical_request = self.canonical_request();
        let signed_headers = self.signed_headers();
        let signature = sign_v4(
            &credentials.access_key_id,
            &credentials.access_key_secret,
            SignV4Param {
                signing_region: &self.region,
                date_time: &self.timestamp,
                canonical_request: &canonical_request,
                signed_headers: &signed_headers,
            },
        )?;
        Ok(SignedRequest {
            request: self,
            canonical_request,
            signature,
        })
    }
}

/// A prepared request together with its signature.
#[derive(Debug, Clone)]
pub struct SignedRequest {
    request: PreparedRequest,
    canonical_request: String,
    signature: Signature,
}

impl SignedRequest {
    pub fn request(&self) -> &PreparedRequest {
        &self.request
    }

    pub fn canonical_request(&self) -> &str {
        &self.canonical_request
    }

    pub fn string_to_sign(&self) -> &str {
        &self.signature.string_to_sign
    }

    pub fn signature(&self) -> &str {
        &self.signature.signature
    }

    /// Value of the `Authorization` header.
    pub fn authorization(&self) -> &str {
        &self.signature.authorization
    }

    pub(crate) fn into_parts(self) -> (PreparedRequest, String) {
        (self.request, self.signature.authorization)
    }
}

/// Object keys as they appear in a url path.
pub(crate) fn encode_object_key(key: &str) -> String {
    uri_encode_path(key)
}

/// Adds the session token header when the credentials carry one.
pub(crate) fn apply_credentials(request: &mut RequestBuilder, credentials: &Credentials) {
    if let Some(token) = &credentials.security_token {
        request.add_header(AMZN_HDR_SECURITY_TOKEN, token);
    }
}
