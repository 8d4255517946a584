use super::Error;
use super::error::ApiError;
use super::transport::RawResponse;
use quick_xml::Reader;
use quick_xml::events::Event;
use reqwest::StatusCode;
use reqwest::header::HeaderMap;
use serde::de::DeserializeOwned;
use std::io::{BufReader, Read, Write};
use tracing::trace;

/// Owns the body of one HTTP response.
///
/// The body can be read once, by [`Response::write_body`],
/// [`Response::read_bytes`] or [`Response::decode_body`]. Each of them
/// releases the connection when done, whether it succeeded or not.
/// [`Response::close`] releases it without reading and may be called any
/// number of times. Dropping the response closes it as well.
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    // None once released
    body: Option<Box<dyn Read + Send>>,
}

impl Response {
    pub(crate) fn new(raw: RawResponse) -> Self {
        Self {
            status: raw.status,
            headers: raw.headers,
            body: Some(raw.body),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn is_closed(&self) -> bool {
        self.body.is_none()
    }

    fn take_body(&mut self) -> Result<Box<dyn Read + Send>, Error> {
        self.body.take().ok_or(Error::BodyClosed)
    }

    /// Streams the body into `dst` and releases the connection.
    pub fn write_body<W: Write + ?Sized>(&mut self, dst: &mut W) -> Result<u64, Error> {
        let mut body = self.take_body()?;
        let res = std::io::copy(&mut body, dst);
        drop(body);
        trace!("response body released");
        Ok(res?)
    }

    /// Reads the whole body and releases the connection.
    pub fn read_bytes(&mut self) -> Result<Vec<u8>, Error> {
        let mut buf = Vec::new();
        self.write_body(&mut buf)?;
        Ok(buf)
    }

    /// Parses the body as an XML document and releases the connection.
    pub fn decode_body<T: DeserializeOwned>(&mut self) -> Result<T, Error> {
        let body = self.take_body()?;
        let res = quick_xml::de::from_reader(BufReader::new(body));
        trace!("response body released");
        Ok(res?)
    }

    /// Releases the connection if that has not happened yet.
    pub fn close(&mut self) {
        if self.body.take().is_some() {
            trace!("response body released");
        }
    }

    /// Passes 2xx responses through. Anything else is read, released and
    /// turned into [`Error::Protocol`] when the body is an `<Error>` document,
    /// or [`Error::MalformedResponse`] with the raw bytes when it is not.
    pub fn error_for_status(mut self) -> Result<Self, Error> {
        if self.status.is_success() {
            return Ok(self);
        }
        let status = self.status;
        let body = self.read_bytes()?;
        if !root_element_is(&body, b"Error") {
            return Err(Error::MalformedResponse { status, body });
        }
        match quick_xml::de::from_reader::<_, ApiError>(body.as_slice()) {
            Ok(error) => Err(Error::Protocol {
                status,
                error: Box::new(error),
            }),
            Err(_) => Err(Error::MalformedResponse { status, body }),
        }
    }
}

// the deserializer accepts any root, so `<Html><Code>..` would pass as an error document
fn root_element_is(body: &[u8], name: &[u8]) -> bool {
    let mut reader = Reader::from_reader(body);
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => return e.local_name().as_ref() == name,
            Ok(Event::Eof) | Err(_) => return false,
            Ok(_) => {}
        }
        buf.clear();
    }
}

impl Drop for Response {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for Response {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Response")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .field("closed", &self.is_closed())
            .finish()
    }
}
