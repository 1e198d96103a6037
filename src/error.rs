use std::io;

use thiserror::Error;

use crate::io::{ByteRange, ObjectRef};

/// Boxed error reported by a [`RangeFetcher`](crate::io::RangeFetcher).
pub type FetchSource = Box<dyn std::error::Error + Send + Sync>;

/// Result type for reader operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by [`SeekableChunkReader`](crate::SeekableChunkReader)
#[derive(Error, Debug)]
pub enum Error {
    #[error("cannot resolve size of {object}")]
    Head {
        object: ObjectRef,
        #[source]
        source: FetchSource,
    },

    #[error("cannot fetch bytes={range} of {object}")]
    Fetch {
        object: ObjectRef,
        range: ByteRange,
        #[source]
        source: FetchSource,
    },

    #[error("invalid seek by {delta} from position {from}")]
    InvalidSeek { from: u64, delta: i64 },

    #[error("range body for bytes={range} ended before delivering any data")]
    EmptyBody { range: ByteRange },
}

impl Error {
    pub(crate) fn head(object: &ObjectRef, source: anyhow::Error) -> Self {
        Self::Head {
            object: object.clone(),
            source: source.into(),
        }
    }

    pub(crate) fn fetch(object: &ObjectRef, range: ByteRange, source: anyhow::Error) -> Self {
        Self::Fetch {
            object: object.clone(),
            range,
            source: source.into(),
        }
    }
}

impl From<Error> for io::Error {
    fn from(err: Error) -> Self {
        let kind = match err {
            Error::InvalidSeek { .. } => io::ErrorKind::InvalidInput,
            Error::EmptyBody { .. } => io::ErrorKind::UnexpectedEof,
            Error::Head { .. } | Error::Fetch { .. } => io::ErrorKind::Other,
        };
        io::Error::new(kind, err)
    }
}
