use crate::Error;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use sha2::{Digest, Sha256};
use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};

/// SHA-256 of zero bytes, hex encoded.
pub const EMPTY_PAYLOAD_SHA256: &str =
    "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

// Everything but the unreserved characters `A-Z a-z 0-9 - _ . ~` is escaped,
// so a space becomes `%20` and never `+`.
const URI_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

const PATH_ENCODE_SET: &AsciiSet = &URI_ENCODE_SET.remove(b'/');

/// RFC 1123 date, as sent in the `Date` header: Day, DD Mon YYYY hh:mm:ss GMT
///
/// eg: Fri, 24 May 2013 00:00:00 GMT
pub fn gmt_format(date_time: &OffsetDateTime) -> Result<String, Error> {
    use time::format_description::well_known::Rfc2822;
    let s = date_time.to_offset(UtcOffset::UTC).format(&Rfc2822)?;
    Ok(s.replace("+0000", "GMT"))
}

/// Credential scope date: YYYYMMDD
pub fn date_stamp(date_time: &OffsetDateTime) -> Result<String, Error> {
    let s = date_time
        .to_offset(UtcOffset::UTC)
        .format(&format_description!("[year][month][day]"))?;
    Ok(s)
}

/// ISO8601 basic format: YYYYMMDDThhmmssZ
///
/// eg: 20130524T000000Z
pub fn iso8601_basic(date_time: &OffsetDateTime) -> Result<String, Error> {
    let s = date_time
        .to_offset(UtcOffset::UTC)
        .format(&format_description!(
            "[year][month][day]T[hour][minute][second]Z"
        ))?;
    Ok(s)
}

pub fn hash_sha256(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Percent-encodes a query parameter name or value.
pub fn uri_encode(s: &str) -> String {
    utf8_percent_encode(s, URI_ENCODE_SET).to_string()
}

/// Same as [`uri_encode`] but keeps `/`, for object keys in a path.
pub fn uri_encode_path(s: &str) -> String {
    utf8_percent_encode(s, PATH_ENCODE_SET).to_string()
}
