//! # chunkseek
//!
//! Seekable, streaming reads of large immutable objects stored behind
//! byte-range requests (S3, S3-compatible servers, plain HTTP, local files).
//!
//! The store only has to answer two questions: how big is the object (HEAD),
//! and what are bytes `start..=end` of it (ranged GET). On top of that,
//! [`SeekableChunkReader`] implements [`std::io::Read`] and [`std::io::Seek`],
//! requesting the object chunk by chunk and serving short forward seeks from
//! the already open response body instead of issuing a new request.
//!
//! ## Features
//!
//! - Lazy size resolution, cached for the reader's lifetime
//! - Pluggable chunk sizing through [`ChunkSizePolicy`]
//! - Fetchers for S3 ([`S3RangeFetcher`]), path-style HTTP stores
//!   ([`HttpRangeFetcher`]), local directories ([`LocalFileFetcher`]) and
//!   memory ([`MemoryFetcher`])
//! - Request accounting with [`CountingFetcher`]
//!
//! ## Example
//!
//! ```no_run
//! use std::io::{Read, Seek, SeekFrom};
//! use chunkseek::{FixedChunkSizePolicy, HttpRangeFetcher, SeekableChunkReader};
//!
//! fn main() -> anyhow::Result<()> {
//!     let url = reqwest::Url::parse("https://s3.example.com/videos/2024-02-22.mov")?;
//!     let (endpoint, object) = HttpRangeFetcher::split_url(&url)?;
//!     let fetcher = HttpRangeFetcher::new(endpoint)?;
//!
//!     // 100 KB per range request
//!     let mut reader =
//!         SeekableChunkReader::new(fetcher, object, FixedChunkSizePolicy::new(100 * 1024));
//!
//!     reader.seek(SeekFrom::Current(100))?;
//!     let mut header = [0u8; 64];
//!     reader.read_exact(&mut header)?;
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod error;
pub mod io;
pub mod policy;
pub mod reader;

pub use cli::{Cli, Source};
pub use error::{Error, Result};
pub use io::{
    ByteRange, CountingFetcher, FetchStats, HttpRangeFetcher, LocalFileFetcher, MemoryFetcher,
    ObjectRef, RangeFetcher, S3RangeFetcher,
};
pub use policy::{ChunkSizePolicy, DEFAULT_CHUNK_SIZE, FixedChunkSizePolicy};
pub use reader::SeekableChunkReader;
