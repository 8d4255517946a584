//! Canonical forms of a request, as consumed by the signer.
//!
//! Every function here is pure. The output is byte-exact input to the
//! signature, so ordering and escaping rules must not drift:
//!
//! ```text
//! METHOD\nPATH\nQUERY\nHEADERS\nSIGNED_HEADERS\nPAYLOAD_HASH
//! ```

use s3sign_common::helper::{EMPTY_PAYLOAD_SHA256, hash_sha256, uri_encode, uri_encode_path};
use std::collections::BTreeMap;

/// A header as given by the caller plus its normalized form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookedHeader {
    pub raw_name: String,
    pub raw_value: String,
    /// lowercase, trimmed
    pub name: String,
    /// trimmed
    pub value: String,
}

/// Normalizes and sorts headers by lowercase name.
///
/// Names that normalize identically collapse to one entry; the last one
/// given wins.
pub fn cook_headers<'a, I>(headers: I) -> Vec<CookedHeader>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut cooked = BTreeMap::new();
    for (name, value) in headers {
        let cooked_name = name.trim().to_lowercase();
        let header = CookedHeader {
            raw_name: name.to_owned(),
            raw_value: value.to_owned(),
            name: cooked_name.clone(),
            value: value.trim().to_owned(),
        };
        cooked.insert(cooked_name, header);
    }
    cooked.into_values().collect()
}

/// `/` + bucket + `/` + object, each part only if present.
pub fn canonical_path(bucket: Option<&str>, object: Option<&str>) -> String {
    let mut path = String::from("/");
    if let Some(bucket) = bucket.filter(|s| !s.is_empty()) {
        path.push_str(bucket);
        path.push('/');
    }
    if let Some(object) = object.filter(|s| !s.is_empty()) {
        path.push_str(&uri_encode_path(object));
    }
    path
}

/// Encoded `name=value` pairs sorted by encoded name. Repeated names keep
/// their values in the order they were added.
pub fn canonical_query_string(params: &BTreeMap<String, Vec<String>>) -> String {
    let mut encoded = params
        .iter()
        .map(|(name, values)| {
            let values = values.iter().map(|v| uri_encode(v)).collect::<Vec<_>>();
            (uri_encode(name), values)
        })
        .collect::<Vec<_>>();
    encoded.sort_by(|a, b| a.0.cmp(&b.0));

    let mut res = String::new();
    for (name, values) in &encoded {
        for value in values {
            res.push_str(&format!("{}={}&", name, value));
        }
    }
    // drop the trailing `&`
    res.pop();
    res
}

pub fn canonical_headers(headers: &[CookedHeader]) -> String {
    let mut res = String::new();
    for h in headers {
        res.push_str(&format!("{}:{}\n", h.name, h.value));
    }
    res
}

pub fn signed_headers(headers: &[CookedHeader]) -> String {
    headers
        .iter()
        .map(|h| h.name.as_str())
        .collect::<Vec<_>>()
        .join(";")
}

/// Hex SHA-256 of the body, or of zero bytes when there is none.
pub fn payload_hash(body: Option<&[u8]>) -> String {
    match body {
        Some(b) if !b.is_empty() => hash_sha256(b),
        _ => EMPTY_PAYLOAD_SHA256.to_owned(),
    }
}

pub fn canonical_request(
    method: &str,
    path: &str,
    query: &str,
    headers: &[CookedHeader],
    payload_hash: &str,
) -> String {
    // canonical_headers already ends with `\n`, which leaves the blank line
    // before the signed header list
    format!(
        "{}\n{}\n{}\n{}\n{}\n{}",
        method,
        path,
        query,
        canonical_headers(headers),
        signed_headers(headers),
        payload_hash
    )
}
