//! Bucket level operations. Only a small part of the API is covered.
//!
//! [API docs](https://docs.aws.amazon.com/AmazonS3/latest/API/API_Operations_Amazon_Simple_Storage_Service.html)

use super::object::Object;
use super::request::validate_object_name;
use super::service::Owner;
use super::{Client, DEFAULT_S3_REGION, Error, HTTPVerb, RequestBuilder, S3_NAMESPACE};
use bon::Builder;
use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use tracing::debug;

/// A bucket, accessed through a specific client.
#[derive(Clone)]
pub struct Bucket<'a> {
    client: &'a Client,
    name: String,
}

impl<'a> Bucket<'a> {
    pub(crate) fn new(client: &'a Client, name: String) -> Self {
        Self { client, name }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn client(&self) -> &'a Client {
        self.client
    }

    /// A request on this bucket, ready for more parameters.
    pub fn request(&self) -> RequestBuilder {
        let mut req = self.client.request();
        req.bucket(&self.name);
        req
    }

    /// A handle on `key`; does not make a server call.
    pub fn object(&self, key: impl Into<String>) -> Object<'a> {
        Object::new(self.client, self.name.clone(), key.into())
    }

    /// Creates the bucket in the client's region.
    pub fn create(&self) -> Result<(), Error> {
        let mut req = self.request();
        req.verb(HTTPVerb::Put);
        // us-east-1 is the default location and must not be named
        if self.client.region() != DEFAULT_S3_REGION {
            let conf = CreateBucketConfiguration {
                xmlns: S3_NAMESPACE,
                location_constraint: self.client.region(),
            };
            let xml = quick_xml::se::to_string(&conf)
                .map_err(|e| Error::Common(format!("XML serialize error: {}", e)))?;
            req.body(xml);
        }
        self.client.execute(req)?.error_for_status()?;
        Ok(())
    }

    /// Deletes the bucket; fails if it is not empty.
    pub fn delete(&self) -> Result<(), Error> {
        let mut req = self.request();
        req.verb(HTTPVerb::Delete);
        self.client.execute(req)?.error_for_status()?;
        Ok(())
    }

    /// Deletes every object in the bucket, then the bucket.
    ///
    /// Every listed key is checked before the first DELETE is sent. If one
    /// of them cannot be addressed, nothing is deleted.
    pub fn delete_cascade(&self) -> Result<(), Error> {
        let objects = self.list_objects()?;
        for summary in &objects {
            validate_object_name(&summary.key)?;
        }
        debug!(bucket = %self.name, count = objects.len(), "deleting objects before bucket");
        for summary in &objects {
            self.object(summary.key.as_str()).delete()?;
        }
        self.delete()
    }

    pub fn list_objects_v2(&self) -> ListObjectsV2Builder<'_> {
        ListObjectsV2::builder(self)
    }

    /// All objects in the bucket, following continuation tokens.
    pub fn list_objects(&self) -> Result<Vec<ObjectSummary>, Error> {
        self.list_objects_within("")
    }

    /// All objects whose key starts with `prefix`.
    pub fn list_objects_within(&self, prefix: &str) -> Result<Vec<ObjectSummary>, Error> {
        let mut objects = Vec::new();
        let mut token: Option<String> = None;
        loop {
            let page = self
                .list_objects_v2()
                .maybe_prefix(Some(prefix).filter(|p| !p.is_empty()))
                .maybe_continuation_token(token.as_deref())
                .build()
                .send()?;
            objects.extend(page.contents);
            match page.next_continuation_token {
                Some(next) if page.is_truncated => {
                    if token.as_deref() == Some(next.as_str()) {
                        return Err(Error::Common(format!(
                            "list objects: continuation token {:?} returned twice",
                            next
                        )));
                    }
                    token = Some(next);
                }
                _ => break,
            }
        }
        Ok(objects)
    }
}

impl Display for Bucket<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Bucket({}, {})", self.client, self.name)
    }
}

#[derive(Serialize)]
#[serde(rename = "CreateBucketConfiguration", rename_all = "PascalCase")]
struct CreateBucketConfiguration<'a> {
    #[serde(rename = "@xmlns")]
    xmlns: &'a str,
    location_constraint: &'a str,
}

// region:    --- list objects v2
/// `list-type` is always sent as `2`.
#[serde_as]
#[serde_with::skip_serializing_none]
#[derive(Builder, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ListObjectsV2<'a> {
    #[builder(start_fn)]
    #[serde(skip_serializing)]
    pub(crate) bucket: &'a Bucket<'a>,
    delimiter: Option<&'a str>,
    start_after: Option<&'a str>,
    continuation_token: Option<&'a str>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    max_keys: Option<u16>,
    prefix: Option<&'a str>,
    encoding_type: Option<&'a str>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    fetch_owner: Option<bool>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "PascalCase")]
pub struct ListBucketResult {
    pub name: String,
    pub prefix: Option<String>,
    pub delimiter: Option<String>,
    pub max_keys: u32,
    pub key_count: u32,
    pub is_truncated: bool,
    #[serde(default)]
    pub contents: Vec<ObjectSummary>,
    #[serde(default)]
    pub common_prefixes: Vec<CommonPrefix>,
    pub continuation_token: Option<String>,
    pub next_continuation_token: Option<String>,
    pub start_after: Option<String>,
    pub encoding_type: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "PascalCase")]
pub struct ObjectSummary {
    pub key: String,
    pub last_modified: String,
    #[serde(rename = "ETag")]
    pub e_tag: String,
    pub size: u64,
    pub storage_class: Option<String>,
    pub owner: Option<Owner>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "PascalCase")]
pub struct CommonPrefix {
    pub prefix: String,
}

impl ListObjectsV2<'_> {
    pub(crate) fn query_params(&self) -> Result<BTreeMap<String, String>, Error> {
        let value = serde_json::to_value(self)
            .map_err(|e| Error::Common(format!("serialize query params failed: {}", e)))?;
        serde_json::from_value(value)
            .map_err(|e| Error::Common(format!("serialize query params failed: {}", e)))
    }

    pub fn send(&self) -> Result<ListBucketResult, Error> {
        let mut req = self.bucket.request();
        req.add_query_param("list-type", "2");
        for (k, v) in self.query_params()? {
            req.add_query_param(&k, &v);
        }
        let mut resp = self.bucket.client.execute(req)?.error_for_status()?;
        resp.decode_body()
    }
}
// endregion: --- list objects v2
