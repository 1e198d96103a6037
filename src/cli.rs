use anyhow::Result;
use clap::Parser;
use reqwest::Url;
use std::path::{Path, PathBuf};

use crate::io::{HttpRangeFetcher, ObjectRef, S3RangeFetcher};
use crate::policy::DEFAULT_CHUNK_SIZE;

#[derive(Parser, Debug)]
#[command(name = "chunkseek")]
#[command(version)]
#[command(about = "Read a byte range of a remote object using Range requests", long_about = None)]
#[command(after_help = "Examples:\n  \
  chunkseek s3://bucket/video.mov -n 4096 | xxd      dump the first 4 KB\n  \
  chunkseek https://host/bucket/big.bin -o -1024      print the last 1 KB\n  \
  chunkseek ./archive.zip -o 100 -n 50 --output part.bin")]
pub struct Cli {
    /// s3://bucket/key, http(s)://host/bucket/key or a local file path
    #[arg(value_name = "SOURCE")]
    pub source: String,

    /// Start offset; negative values count from the end of the object
    #[arg(short = 'o', long, default_value_t = 0, allow_hyphen_values = true)]
    pub offset: i64,

    /// Number of bytes to copy (default: up to the end)
    #[arg(short = 'n', long)]
    pub length: Option<u64>,

    /// Bytes requested per range request
    #[arg(short = 'c', long, default_value_t = DEFAULT_CHUNK_SIZE)]
    pub chunk_size: u64,

    /// Write to a file instead of stdout
    #[arg(long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Quiet mode, no transfer statistics
    #[arg(short = 'q')]
    pub quiet: bool,
}

/// Where the object comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    S3(ObjectRef),
    Http { endpoint: Url, object: ObjectRef },
    Local { root: PathBuf, object: ObjectRef },
}

impl Cli {
    pub fn is_quiet(&self) -> bool {
        self.quiet
    }

    pub fn source(&self) -> Result<Source> {
        if self.source.starts_with("s3://") {
            return Ok(Source::S3(S3RangeFetcher::parse_uri(&self.source)?));
        }

        if self.source.starts_with("http://") || self.source.starts_with("https://") {
            let url = Url::parse(&self.source)?;
            let (endpoint, object) = HttpRangeFetcher::split_url(&url)?;
            return Ok(Source::Http { endpoint, object });
        }

        let path = Path::new(&self.source);
        let key = path
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .ok_or_else(|| anyhow::anyhow!("not a file path: {}", self.source))?;
        let root = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Ok(Source::Local {
            root,
            object: ObjectRef::new("", key),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::parse_from(std::iter::once("chunkseek").chain(args.iter().copied()))
    }

    #[test]
    fn parses_negative_offsets() {
        let cli = parse(&["s3://b/k", "-o", "-1024", "-n", "10"]);
        assert_eq!(cli.offset, -1024);
        assert_eq!(cli.length, Some(10));
        assert_eq!(cli.chunk_size, DEFAULT_CHUNK_SIZE);
    }

    #[test]
    fn classifies_sources() -> Result<()> {
        assert_eq!(
            parse(&["s3://photos/a/b.jpeg"]).source()?,
            Source::S3(ObjectRef::new("photos", "a/b.jpeg"))
        );

        match parse(&["https://host:9000/media/clip.mov"]).source()? {
            Source::Http { endpoint, object } => {
                assert_eq!(endpoint.as_str(), "https://host:9000/");
                assert_eq!(object, ObjectRef::new("media", "clip.mov"));
            }
            other => panic!("unexpected source {:?}", other),
        }

        assert_eq!(
            parse(&["data/archive.zip"]).source()?,
            Source::Local {
                root: PathBuf::from("data"),
                object: ObjectRef::new("", "archive.zip"),
            }
        );
        Ok(())
    }
}
