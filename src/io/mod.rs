mod counting;
mod http;
mod local;
mod memory;
mod s3;

pub use counting::{CountingBody, CountingFetcher, FetchStats};
pub use http::HttpRangeFetcher;
pub use local::LocalFileFetcher;
pub use memory::MemoryFetcher;
pub use s3::{S3Body, S3RangeFetcher};

use anyhow::Result;
use std::fmt;
use std::io::Read;
use std::sync::Arc;

/// Identifies an immutable object in a remote store
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectRef {
    pub bucket: String,
    pub key: String,
}

impl ObjectRef {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.bucket, self.key)
    }
}

/// Inclusive byte range `[start, end]`, as used by HTTP `Range` headers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    pub fn new(start: u64, end: u64) -> Self {
        debug_assert!(start <= end, "empty byte range {start}-{end}");
        Self { start, end }
    }

    /// Number of bytes covered by the range
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    /// Always false; an inclusive range covers at least one byte
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Value for the HTTP `Range` request header
    pub fn header_value(&self) -> String {
        format!("bytes={}", self)
    }
}

impl fmt::Display for ByteRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// Trait for fetching byte ranges of objects from a store
///
/// The returned body is an open, forward-only stream positioned at
/// `range.start`. Dropping it releases the underlying connection.
pub trait RangeFetcher {
    type Body: Read;

    /// Get the total size of the object
    fn head_size(&self, object: &ObjectRef) -> Result<u64>;

    /// Open a stream over the inclusive `range` of the object
    fn fetch_range(&self, object: &ObjectRef, range: ByteRange) -> Result<Self::Body>;
}

impl<F: RangeFetcher + ?Sized> RangeFetcher for &F {
    type Body = F::Body;

    fn head_size(&self, object: &ObjectRef) -> Result<u64> {
        (**self).head_size(object)
    }

    fn fetch_range(&self, object: &ObjectRef, range: ByteRange) -> Result<Self::Body> {
        (**self).fetch_range(object, range)
    }
}

impl<F: RangeFetcher + ?Sized> RangeFetcher for Arc<F> {
    type Body = F::Body;

    fn head_size(&self, object: &ObjectRef) -> Result<u64> {
        (**self).head_size(object)
    }

    fn fetch_range(&self, object: &ObjectRef, range: ByteRange) -> Result<Self::Body> {
        (**self).fetch_range(object, range)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_range_is_inclusive() {
        let range = ByteRange::new(0, 99);
        assert_eq!(range.len(), 100);
        assert_eq!(range.header_value(), "bytes=0-99");
        assert_eq!(ByteRange::new(7, 7).len(), 1);
    }

    #[test]
    fn object_ref_display() {
        assert_eq!(ObjectRef::new("bucket", "a/b.bin").to_string(), "bucket/a/b.bin");
    }
}
