// Signature Version 4: https://docs.aws.amazon.com/AmazonS3/latest/API/sig-v4-header-based-auth.html

use hmac::{Hmac, Mac};
use s3sign_common::helper::{date_stamp, hash_sha256, iso8601_basic};
use sha2::Sha256;
use time::OffsetDateTime;
use tracing::trace;

pub const ALGORITHM: &str = "AWS4-HMAC-SHA256";
pub const SERVICE: &str = "s3";
pub const TERMINATOR: &str = "aws4_request";

fn sign_hmac_sha256_byte(secret: &[u8], str_to_sign: &[u8]) -> Vec<u8> {
    type HmacSha256 = Hmac<Sha256>;
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC accepts keys of any length");
    mac.update(str_to_sign);
    mac.finalize().into_bytes().to_vec()
}

/// Derives the scoped signing key. Pure in its four inputs.
pub fn signing_key(secret: &str, date_stamp: &str, region: &str, service: &str) -> Vec<u8> {
    let date_key = sign_hmac_sha256_byte(format!("AWS4{}", secret).as_bytes(), date_stamp.as_bytes());
    let date_region_key = sign_hmac_sha256_byte(&date_key, region.as_bytes());
    let date_region_service_key = sign_hmac_sha256_byte(&date_region_key, service.as_bytes());
    sign_hmac_sha256_byte(&date_region_service_key, TERMINATOR.as_bytes())
}

/// `yyyyMMdd/region/s3/aws4_request`
pub fn credential_scope(date_stamp: &str, region: &str) -> String {
    format!("{}/{}/{}/{}", date_stamp, region, SERVICE, TERMINATOR)
}

pub fn string_to_sign(iso_timestamp: &str, scope: &str, canonical_request: &str) -> String {
    format!(
        "{}\n{}\n{}\n{}",
        ALGORITHM,
        iso_timestamp,
        scope,
        hash_sha256(canonical_request.as_bytes())
    )
}

pub fn authorization(access_key_id: &str, scope: &str, signed_headers: &str, signature: &str) -> String {
    format!(
        "{} Credential={}/{}, SignedHeaders={}, Signature={}",
        ALGORITHM, access_key_id, scope, signed_headers, signature
    )
}

pub(crate) struct SignV4Param<'a> {
    pub signing_region: &'a str,
    pub date_time: &'a OffsetDateTime,
    pub canonical_request: &'a str,
    pub signed_headers: &'a str,
}

/// Output of one signing operation. The signing key is not kept.
#[derive(Debug, Clone)]
pub struct Signature {
    pub string_to_sign: String,
    pub signature: String,
    /// Value of the `Authorization` header.
    pub authorization: String,
}

pub(crate) fn sign_v4(
    access_key_id: &str,
    access_key_secret: &str,
    param: SignV4Param<'_>,
) -> Result<Signature, s3sign_common::Error> {
    let date = date_stamp(param.date_time)?;
    let iso_timestamp = iso8601_basic(param.date_time)?;
    let scope = credential_scope(&date, param.signing_region);

    trace!(canonical_request = %param.canonical_request, "canonical request");
    let string_to_sign = string_to_sign(&iso_timestamp, &scope, param.canonical_request);
    trace!(string_to_sign = %string_to_sign, "string to sign");

    let key = signing_key(access_key_secret, &date, param.signing_region, SERVICE);
    let signature = hex::encode(sign_hmac_sha256_byte(&key, string_to_sign.as_bytes()));
    let authorization = authorization(access_key_id, &scope, param.signed_headers, &signature);

    Ok(Signature {
        string_to_sign,
        signature,
        authorization,
    })
}
