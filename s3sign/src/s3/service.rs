//! Service level operations.
//!
//! [API docs](https://docs.aws.amazon.com/AmazonS3/latest/API/API_ListBuckets.html)

use super::bucket::Bucket;
use super::{Client, Error, HTTPVerb};
use reqwest::StatusCode;
use serde::Deserialize;

#[derive(Deserialize, Debug)]
#[serde(rename_all = "PascalCase")]
pub struct ListAllMyBucketsResult {
    pub owner: Option<Owner>,
    #[serde(default)]
    pub buckets: Buckets,
}

#[derive(Deserialize, Debug, Default)]
pub struct Buckets {
    #[serde(rename = "Bucket", default)]
    pub bucket: Vec<BucketInfo>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "PascalCase")]
pub struct BucketInfo {
    pub name: String,
    pub creation_date: String,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "PascalCase")]
pub struct Owner {
    #[serde(rename = "ID")]
    pub id: String,
    pub display_name: Option<String>,
}

impl Client {
    /// Buckets owned by the signing account.
    pub fn list_buckets(&self) -> Result<ListAllMyBucketsResult, Error> {
        let mut resp = self.execute(self.request())?.error_for_status()?;
        resp.decode_body()
    }

    /// A handle on `name`; does not make a server call.
    pub fn bucket(&self, name: impl Into<String>) -> Bucket<'_> {
        Bucket::new(self, name.into())
    }

    /// `None` when the bucket does not exist.
    pub fn get_bucket(&self, name: &str) -> Result<Option<Bucket<'_>>, Error> {
        let mut req = self.request();
        req.verb(HTTPVerb::Head).bucket(name);
        let resp = self.execute(req)?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        resp.error_for_status()?;
        Ok(Some(self.bucket(name)))
    }

    pub fn get_or_create_bucket(&self, name: &str) -> Result<Bucket<'_>, Error> {
        if let Some(bucket) = self.get_bucket(name)? {
            return Ok(bucket);
        }
        let bucket = self.bucket(name);
        bucket.create()?;
        Ok(bucket)
    }
}
