use super::{ByteRange, ObjectRef, RangeFetcher};
use anyhow::Result;
use std::io::{self, Read};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Request and transfer counters shared by a [`CountingFetcher`] and its bodies
#[derive(Debug, Default)]
pub struct FetchStats {
    heads: AtomicU64,
    transferred_bytes: AtomicU64,
    ranges: Mutex<Vec<ByteRange>>,
}

impl FetchStats {
    /// Number of size lookups issued
    pub fn heads(&self) -> u64 {
        self.heads.load(Ordering::Relaxed)
    }

    /// Number of range requests issued
    pub fn range_requests(&self) -> u64 {
        self.ranges().len() as u64
    }

    /// Ranges requested so far, in order
    pub fn ranges(&self) -> Vec<ByteRange> {
        self.ranges
            .lock()
            .map(|ranges| ranges.clone())
            .unwrap_or_default()
    }

    /// Get total bytes read out of range bodies
    pub fn transferred_bytes(&self) -> u64 {
        self.transferred_bytes.load(Ordering::Relaxed)
    }
}

/// Wraps a fetcher and records every request it serves
pub struct CountingFetcher<F> {
    inner: F,
    stats: Arc<FetchStats>,
}

impl<F: RangeFetcher> CountingFetcher<F> {
    pub fn new(inner: F) -> Self {
        Self {
            inner,
            stats: Arc::default(),
        }
    }

    /// Shared handle to the counters; stays valid after the fetcher is moved
    pub fn stats(&self) -> Arc<FetchStats> {
        self.stats.clone()
    }

    pub fn into_inner(self) -> F {
        self.inner
    }
}

impl<F: RangeFetcher> RangeFetcher for CountingFetcher<F> {
    type Body = CountingBody<F::Body>;

    fn head_size(&self, object: &ObjectRef) -> Result<u64> {
        self.stats.heads.fetch_add(1, Ordering::Relaxed);
        self.inner.head_size(object)
    }

    fn fetch_range(&self, object: &ObjectRef, range: ByteRange) -> Result<Self::Body> {
        if let Ok(mut ranges) = self.stats.ranges.lock() {
            ranges.push(range);
        }
        let inner = self.inner.fetch_range(object, range)?;
        Ok(CountingBody {
            inner,
            stats: self.stats.clone(),
        })
    }
}

/// Range body that adds every byte it delivers to [`FetchStats`]
pub struct CountingBody<B> {
    inner: B,
    stats: Arc<FetchStats>,
}

impl<B: Read> Read for CountingBody<B> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.stats
            .transferred_bytes
            .fetch_add(n as u64, Ordering::Relaxed);
        Ok(n)
    }
}
