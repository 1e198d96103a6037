use aws_sdk_s3::Client;
use std::pin::Pin;
use tokio::io::AsyncRead;
use tokio::runtime::Handle;
use tokio_util::io::SyncIoBridge;

use super::{ByteRange, ObjectRef, RangeFetcher};
use anyhow::{Context, Result, anyhow};

/// Blocking view of an S3 `GetObject` body
pub type S3Body = SyncIoBridge<Pin<Box<dyn AsyncRead + Send>>>;

/// Range fetcher backed by `aws-sdk-s3`
///
/// The SDK is async, so every call blocks on the given runtime handle.
/// The fetcher and its bodies must therefore not be used from inside an
/// async task running on that runtime.
pub struct S3RangeFetcher {
    client: Client,
    handle: Handle,
}

impl S3RangeFetcher {
    pub fn new(client: Client, handle: Handle) -> Self {
        Self { client, handle }
    }

    /// Parse an `s3://bucket/key` URI
    pub fn parse_uri(uri: &str) -> Result<ObjectRef> {
        let rest = uri
            .strip_prefix("s3://")
            .ok_or_else(|| anyhow!("not an s3:// URI: {}", uri))?;
        match rest.split_once('/') {
            Some((bucket, key)) if !bucket.is_empty() && !key.is_empty() => {
                Ok(ObjectRef::new(bucket, key))
            }
            _ => Err(anyhow!("s3 URI needs both bucket and key: {}", uri)),
        }
    }
}

impl RangeFetcher for S3RangeFetcher {
    type Body = S3Body;

    fn head_size(&self, object: &ObjectRef) -> Result<u64> {
        let head = self
            .handle
            .block_on(
                self.client
                    .head_object()
                    .bucket(&object.bucket)
                    .key(&object.key)
                    .send(),
            )
            .with_context(|| format!("HeadObject {}", object))?;

        let size = head
            .content_length
            .ok_or_else(|| anyhow!("HeadObject {} returned no content length", object))?;
        u64::try_from(size).with_context(|| format!("negative content length {}", size))
    }

    fn fetch_range(&self, object: &ObjectRef, range: ByteRange) -> Result<Self::Body> {
        let output = self
            .handle
            .block_on(
                self.client
                    .get_object()
                    .bucket(&object.bucket)
                    .key(&object.key)
                    .range(range.header_value())
                    .send(),
            )
            .with_context(|| format!("GetObject {} bytes={}", object, range))?;

        let body: Pin<Box<dyn AsyncRead + Send>> = Box::pin(output.body.into_async_read());
        Ok(SyncIoBridge::new_with_handle(body, self.handle.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_s3_uris() -> Result<()> {
        assert_eq!(
            S3RangeFetcher::parse_uri("s3://blog-public/photos/2021-12-20-4.jpeg")?,
            ObjectRef::new("blog-public", "photos/2021-12-20-4.jpeg")
        );
        assert!(S3RangeFetcher::parse_uri("s3://bucket-only").is_err());
        assert!(S3RangeFetcher::parse_uri("s3:///key").is_err());
        assert!(S3RangeFetcher::parse_uri("https://host/bucket/key").is_err());
        Ok(())
    }
}
