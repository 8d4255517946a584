//! The wire-level seam between a signed request and the network.

use super::Error;
use super::HTTP_HDR_AUTH;
use super::request::SignedRequest;
use super::response::Response;
use reqwest::StatusCode;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use std::io::Read;
use std::time::Duration;
use tracing::debug;
use url::Url;

pub type TransportError = Box<dyn std::error::Error + Send + Sync>;

/// A request ready to be put on the wire, `Authorization` included.
#[derive(Debug)]
pub struct WireRequest {
    pub method: reqwest::Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<Vec<u8>>,
    pub timeout: Option<Duration>,
}

/// Whatever came back, whatever the status.
///
/// Dropping `body` releases the underlying connection.
pub struct RawResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Box<dyn Read + Send>,
}

/// Performs one HTTP exchange.
///
/// Implementations are shared across threads and must be safe to call
/// concurrently. Only failures to obtain a response (connection refused, DNS,
/// timeout) are errors; non-2xx statuses are returned as responses.
pub trait Transport: Send + Sync {
    fn send(&self, request: WireRequest) -> Result<RawResponse, TransportError>;
}

/// Pooled, thread-safe transport on top of `reqwest`'s blocking client.
#[derive(Clone, Debug, Default)]
pub struct HttpTransport {
    http_client: reqwest::blocking::Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self {
            http_client: reqwest::blocking::Client::new(),
        }
    }

    pub fn with_client(http_client: reqwest::blocking::Client) -> Self {
        Self { http_client }
    }
}

impl Transport for HttpTransport {
    fn send(&self, request: WireRequest) -> Result<RawResponse, TransportError> {
        let mut builder = self
            .http_client
            .request(request.method, request.url)
            .headers(request.headers);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }
        let resp = builder.send()?;

        Ok(RawResponse {
            status: resp.status(),
            headers: resp.headers().clone(),
            body: Box::new(resp),
        })
    }
}

/// Attaches the cooked headers and `Authorization`, then runs the exchange.
///
/// The returned [`Response`] owns the connection until it is consumed or
/// closed.
pub fn execute(transport: &dyn Transport, request: SignedRequest) -> Result<Response, Error> {
    let url = request.request().url()?;
    let (mut request, authorization) = request.into_parts();

    let mut headers = HeaderMap::new();
    for h in request.cooked_headers() {
        let name = HeaderName::from_bytes(h.name.as_bytes())
            .map_err(|_| super::BuildError::InvalidHeader(h.raw_name.clone()))?;
        let value = HeaderValue::from_str(&h.value)
            .map_err(|_| super::BuildError::InvalidHeader(h.raw_name.clone()))?;
        headers.insert(name, value);
    }
    let authorization = HeaderValue::from_str(&authorization)
        .map_err(|_| super::BuildError::InvalidHeader(HTTP_HDR_AUTH.to_owned()))?;
    headers.insert(reqwest::header::AUTHORIZATION, authorization);

    let method = reqwest::Method::from(request.verb());
    debug!(%method, %url, "executing request");
    let wire = WireRequest {
        method,
        url,
        headers,
        body: request.take_body(),
        timeout: request.timeout(),
    };

    let raw = transport.send(wire).map_err(Error::Transport)?;
    debug!(status = %raw.status, "received response");
    Ok(Response::new(raw))
}
