//! Main entry point for the chunkseek CLI application.
//!
//! This binary copies a byte range of an object from S3, a path-style
//! HTTP store or the local filesystem to stdout or a file, reading it
//! through [`SeekableChunkReader`].

use anyhow::{Context, Result};
use aws_config::BehaviorVersion;
use clap::Parser;
use std::fs::File;
use std::io::{self, BufWriter, Read, Seek, SeekFrom, Write};

use chunkseek::{
    Cli, CountingFetcher, FixedChunkSizePolicy, HttpRangeFetcher, LocalFileFetcher, ObjectRef,
    RangeFetcher, S3RangeFetcher, SeekableChunkReader, Source,
};

/// Application entry point.
///
/// Parses command-line arguments and dispatches to the fetcher matching
/// the source: S3 URI, HTTP URL or local path.
fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.source()? {
        Source::S3(object) => {
            // The SDK is async; the fetcher blocks on this runtime for every request
            let runtime = tokio::runtime::Runtime::new()?;
            let config = runtime.block_on(aws_config::load_defaults(BehaviorVersion::latest()));
            let client = aws_sdk_s3::Client::new(&config);
            let fetcher = S3RangeFetcher::new(client, runtime.handle().clone());
            copy_range(fetcher, object, &cli)
        }
        Source::Http { endpoint, object } => {
            copy_range(HttpRangeFetcher::new(endpoint)?, object, &cli)
        }
        Source::Local { root, object } => copy_range(LocalFileFetcher::new(root), object, &cli),
    }
}

/// Copy the selected range of `object` to the configured output.
///
/// Displays the number of range requests and bytes transferred unless
/// quiet mode is enabled.
fn copy_range<F: RangeFetcher>(fetcher: F, object: ObjectRef, cli: &Cli) -> Result<()> {
    let fetcher = CountingFetcher::new(fetcher);
    let stats = fetcher.stats();
    let mut reader =
        SeekableChunkReader::new(fetcher, object, FixedChunkSizePolicy::new(cli.chunk_size));

    // Negative offsets are relative to the end of the object
    let start = if cli.offset < 0 {
        SeekFrom::End(cli.offset)
    } else {
        SeekFrom::Start(cli.offset as u64)
    };
    reader
        .seek(start)
        .with_context(|| format!("cannot seek {} to {:?}", reader.object(), start))?;

    let mut out: Box<dyn Write> = match &cli.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("create {}", path.display()))?,
        )),
        None => Box::new(io::stdout().lock()),
    };

    let copied = match cli.length {
        Some(length) => io::copy(&mut reader.by_ref().take(length), &mut out)?,
        None => io::copy(&mut reader, &mut out)?,
    };
    out.flush()?;
    reader.close();

    if !cli.is_quiet() {
        eprintln!("\nBytes copied: {}", format_size(copied));
        eprintln!("Range requests: {}", stats.range_requests());
        eprintln!("Total bytes transferred: {}", format_size(stats.transferred_bytes()));
    }

    Ok(())
}

/// Format a byte size into a human-readable string.
///
/// Automatically selects the appropriate unit (bytes, KB, MB, GB)
/// based on the size magnitude.
fn format_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.2} GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{} bytes", size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_sizes() {
        assert_eq!(format_size(500), "500 bytes");
        assert_eq!(format_size(1536), "1.50 KB");
        assert_eq!(format_size(1048576), "1.00 MB");
    }
}
