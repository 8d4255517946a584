use reqwest::StatusCode;
use serde::Deserialize;

/// Raised while accumulating or freezing a request, before anything is signed.
#[derive(thiserror::Error, Debug)]
pub enum BuildError {
    #[error("invalid http method: {0:?}")]
    InvalidMethod(String),
    #[error("invalid host: {0:?}")]
    InvalidHost(String),
    #[error("invalid region: {0:?}")]
    InvalidRegion(String),
    #[error("invalid scheme: {0:?}, expected http or https")]
    InvalidScheme(String),
    #[error("invalid bucket name: {0:?}")]
    InvalidBucketName(String),
    #[error("invalid object name {name:?}: {reason}")]
    InvalidObjectName { name: String, reason: &'static str },
    #[error("invalid header: {0:?}")]
    InvalidHeader(String),
    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("timestamp error: {0}")]
    Timestamp(#[from] s3sign_common::Error),
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("build error: {0}")]
    Build(#[from] BuildError),
    #[error("transport error: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("request api failed: {status}, code: {}, message: {}", .error.code, .error.message)]
    Protocol {
        status: StatusCode,
        error: Box<ApiError>,
    },
    #[error("response status is not success: {status}, body is not an error document ({} bytes)", .body.len())]
    MalformedResponse { status: StatusCode, body: Vec<u8> },
    #[error("response body has already been released")]
    BodyClosed,
    #[error("xml parse error: {0}")]
    Xml(#[from] quick_xml::DeError),
    #[error("io error: {0}")]
    IO(#[from] std::io::Error),
    #[error("error: {0}")]
    Common(String),
}

impl Error {
    /// The decoded error document, for [`Error::Protocol`].
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            Error::Protocol { error, .. } => Some(error),
            _ => None,
        }
    }

    /// HTTP status of a non-2xx response.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::Protocol { status, .. } | Error::MalformedResponse { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }
}

/// The `<Error>` document returned with failed responses.
///
/// `canonical_request` and `string_to_sign` are only returned with
/// `SignatureDoesNotMatch`.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct ApiError {
    pub code: String,
    pub message: String,
    pub host_id: Option<String>,
    pub request_id: Option<String>,
    pub resource: Option<String>,
    #[serde(rename = "AWSAccessKeyId")]
    pub aws_access_key_id: Option<String>,
    pub argument_name: Option<String>,
    pub argument_value: Option<String>,
    pub canonical_request: Option<String>,
    pub string_to_sign: Option<String>,
}
