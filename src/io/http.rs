use reqwest::Url;
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::{ACCEPT_RANGES, CONTENT_LENGTH, CONTENT_RANGE, HeaderMap, RANGE};
use std::time::Duration;

use super::{ByteRange, ObjectRef, RangeFetcher};
use anyhow::{Context, Result, anyhow, bail};

/// HTTP Range fetcher for path-style object stores
///
/// Objects are addressed as `{endpoint}/{bucket}/{key}`, which matches
/// public S3 buckets and most S3-compatible servers.
pub struct HttpRangeFetcher {
    client: Client,
    endpoint: Url,
    max_retry: u32,
}

impl HttpRangeFetcher {
    /// Create a fetcher with a 30 second request timeout
    pub fn new(endpoint: Url) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self::with_client(endpoint, client))
    }

    /// Create a fetcher around a preconfigured client
    pub fn with_client(endpoint: Url, client: Client) -> Self {
        Self {
            client,
            endpoint,
            max_retry: 10,
        }
    }

    /// Set how many times a request is re-sent after connect or timeout errors
    ///
    /// `0` disables retries; a request is sent at most `max_retry + 1` times.
    pub fn max_retry(mut self, max_retry: u32) -> Self {
        self.max_retry = max_retry;
        self
    }

    /// Split a path-style object URL into its endpoint and object reference
    ///
    /// `https://host/bucket/dir/file.bin` becomes endpoint `https://host/`,
    /// bucket `bucket` and key `dir/file.bin`.
    pub fn split_url(url: &Url) -> Result<(Url, ObjectRef)> {
        let mut segments = url
            .path_segments()
            .ok_or_else(|| anyhow!("URL has no path: {}", url))?
            .filter(|s| !s.is_empty());
        let bucket = segments
            .next()
            .ok_or_else(|| anyhow!("URL has no bucket: {}", url))?
            .to_string();
        let key = segments.collect::<Vec<_>>().join("/");
        if key.is_empty() {
            bail!("URL has no object key: {}", url);
        }

        let mut endpoint = url.clone();
        endpoint.set_path("");
        endpoint.set_query(None);
        endpoint.set_fragment(None);
        Ok((endpoint, ObjectRef::new(bucket, key)))
    }

    /// URL of an object under the endpoint
    pub fn object_url(&self, object: &ObjectRef) -> Result<Url> {
        let mut url = self.endpoint.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| anyhow!("endpoint cannot be a base URL: {}", self.endpoint))?;
            segments
                .pop_if_empty()
                .push(&object.bucket)
                .extend(object.key.split('/'));
        }
        Ok(url)
    }

    /// Send a request, retrying connection failures and timeouts
    fn send(&self, build: impl Fn() -> RequestBuilder) -> Result<Response> {
        let mut retry_count = 0;
        loop {
            match build().send() {
                Ok(resp) => return Ok(resp),
                Err(e) if e.is_timeout() || e.is_connect() => {
                    retry_count += 1;
                    if retry_count > self.max_retry {
                        return Err(e).context("Max retries exceeded");
                    }
                    log::warn!(
                        "Connection error, retry {}/{}: {}",
                        retry_count,
                        self.max_retry,
                        e
                    );
                    std::thread::sleep(Duration::from_millis(500 * retry_count as u64));
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

impl RangeFetcher for HttpRangeFetcher {
    type Body = Response;

    fn head_size(&self, object: &ObjectRef) -> Result<u64> {
        let url = self.object_url(object)?;
        let resp = self.send(|| self.client.head(url.clone()))?;

        if !resp.status().is_success() {
            bail!("HTTP request failed with status: {}", resp.status());
        }

        // Check if server supports Range requests
        let accept_ranges = resp
            .headers()
            .get(ACCEPT_RANGES)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("none");

        if !accept_ranges.contains("bytes") {
            bail!("Remote server does not support Range requests");
        }

        resp.headers()
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| anyhow!("Remote server did not return Content-Length"))
    }

    fn fetch_range(&self, object: &ObjectRef, range: ByteRange) -> Result<Self::Body> {
        let url = self.object_url(object)?;
        let header = range.header_value();
        let resp = self.send(|| self.client.get(url.clone()).header(RANGE, &header))?;

        // A 200 would stream the whole object; only partial content keeps the range contract
        if resp.status() != reqwest::StatusCode::PARTIAL_CONTENT {
            bail!("HTTP request failed with status: {}", resp.status());
        }

        match content_range_start(resp.headers()) {
            Some(start) if start == range.start => Ok(resp),
            Some(start) => bail!(
                "Content-Range starts at {} but bytes={} was requested",
                start,
                range
            ),
            None => bail!("Partial response without a valid Content-Range"),
        }
    }
}

/// First byte of a `Content-Range: bytes start-end/total` header
fn content_range_start(headers: &HeaderMap) -> Option<u64> {
    let value = headers.get(CONTENT_RANGE)?.to_str().ok()?;
    let (start, _) = value.trim().strip_prefix("bytes ")?.split_once('-')?;
    start.trim().parse().ok()
}
