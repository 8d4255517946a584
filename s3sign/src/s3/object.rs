//! Object level operations.
//!
//! [API docs](https://docs.aws.amazon.com/AmazonS3/latest/API/API_Operations_Amazon_Simple_Storage_Service.html)

use super::request::encode_object_key;
use super::{Client, Error, HTTPVerb, RequestBuilder};
use base64::{Engine, engine::general_purpose};
use std::fmt::{Display, Formatter};
use std::io::{Read, Write};

/// An object in a bucket. Creating one makes no server call.
#[derive(Clone)]
pub struct Object<'a> {
    client: &'a Client,
    bucket: String,
    key: String,
}

/// Base64 of the MD5 digest, as sent in `Content-MD5`.
pub fn get_content_md5(bytes: &[u8]) -> String {
    use md5::{Digest, Md5};

    let mut hasher = Md5::new();
    hasher.update(bytes);
    let res = hasher.finalize();

    general_purpose::STANDARD.encode(res)
}

impl<'a> Object<'a> {
    pub(crate) fn new(client: &'a Client, bucket: String, key: String) -> Self {
        Self {
            client,
            bucket,
            key,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn bucket_name(&self) -> &str {
        &self.bucket
    }

    /// Path-style url of the object, e.g. `https://s3.amazonaws.com/bucket/a%20b.txt`.
    pub fn url(&self) -> String {
        format!(
            "{}://{}/{}/{}",
            self.client.scheme(),
            self.client.endpoint(),
            self.bucket,
            encode_object_key(&self.key)
        )
    }

    pub fn request(&self) -> RequestBuilder {
        let mut req = self.client.request();
        req.bucket(&self.bucket).object(&self.key);
        req
    }

    /// The whole object content.
    pub fn read(&self) -> Result<Vec<u8>, Error> {
        let mut resp = self.client.execute(self.request())?.error_for_status()?;
        resp.read_bytes()
    }

    /// Streams the object content into `dst`, returns the number of bytes written.
    pub fn read_to_writer<W: Write + ?Sized>(&self, dst: &mut W) -> Result<u64, Error> {
        let mut resp = self.client.execute(self.request())?.error_for_status()?;
        resp.write_body(dst)
    }

    /// Uploads `data`, replacing any existing content.
    pub fn write(&self, data: impl Into<Vec<u8>>) -> Result<(), Error> {
        let data = data.into();
        let mut req = self.request();
        req.verb(HTTPVerb::Put)
            .add_header("Content-MD5", &get_content_md5(&data))
            .body(data);
        self.client.execute(req)?.error_for_status()?;
        Ok(())
    }

    /// Reads `src` to the end and uploads it.
    ///
    /// The payload is signed whole, so everything is buffered in memory first.
    pub fn write_from_reader<R: Read + ?Sized>(&self, src: &mut R) -> Result<(), Error> {
        let mut data = Vec::new();
        src.read_to_end(&mut data)?;
        self.write(data)
    }

    pub fn delete(&self) -> Result<(), Error> {
        let mut req = self.request();
        req.verb(HTTPVerb::Delete);
        self.client.execute(req)?.error_for_status()?;
        Ok(())
    }
}

impl Display for Object<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Object({}, {}, {})", self.client, self.bucket, self.key)
    }
}
