//! Seekable reader over byte-range requests.
//!
//! [`SeekableChunkReader`] turns a [`RangeFetcher`] into a
//! [`Read`] + [`Seek`] stream. It keeps at most one range body open at a
//! time and requests the object in chunks sized by a [`ChunkSizePolicy`].
//!
//! ## State
//!
//! The reader is either *idle* (no body open) or *active* (a body is open
//! and will deliver the bytes `offset..=last_byte` without another round
//! trip). Forward seeks that stay inside the open range are served by
//! reading and dropping bytes, since one extra request costs far more
//! than draining a few kilobytes. Backward seeks and seeks past the open
//! range drop the body; the next read fetches from the new offset.

use std::io::{self, Read, Seek, SeekFrom};

use crate::error::{Error, Result};
use crate::io::{ByteRange, ObjectRef, RangeFetcher};
use crate::policy::{ChunkSizePolicy, FixedChunkSizePolicy};

/// Outcome of opening the next chunk
enum Chunk {
    Opened,
    EndOfData,
}

/// Seekable, forward-streaming reader of one remote object
///
/// ## Example
///
/// ```
/// use std::io::{Read, Seek, SeekFrom};
/// use chunkseek::{FixedChunkSizePolicy, MemoryFetcher, ObjectRef, SeekableChunkReader};
///
/// let object = ObjectRef::new("bucket", "greeting.txt");
/// let fetcher = MemoryFetcher::new().with_object(object.clone(), b"hello, world".to_vec());
/// let mut reader = SeekableChunkReader::new(fetcher, object, FixedChunkSizePolicy::new(4));
///
/// reader.seek(SeekFrom::Start(7)).unwrap();
/// let mut rest = String::new();
/// reader.read_to_string(&mut rest).unwrap();
/// assert_eq!(rest, "world");
/// ```
pub struct SeekableChunkReader<F: RangeFetcher, P = FixedChunkSizePolicy> {
    fetcher: F,
    object: ObjectRef,
    policy: P,
    /// Logical position in the object
    offset: u64,
    /// Object size, resolved on first need
    size: Option<u64>,
    /// Last byte (inclusive) the open body is expected to deliver
    last_byte: Option<u64>,
    body: Option<F::Body>,
    /// Scratch space for bytes dropped during in-body seeks
    sink: Vec<u8>,
    /// Body error hit after a read had already copied bytes
    pending: Option<io::Error>,
}

impl<F: RangeFetcher, P: ChunkSizePolicy> SeekableChunkReader<F, P> {
    pub fn new(fetcher: F, object: ObjectRef, policy: P) -> Self {
        Self {
            fetcher,
            object,
            policy,
            offset: 0,
            size: None,
            last_byte: None,
            body: None,
            sink: Vec::new(),
            pending: None,
        }
    }

    /// Preallocate the buffer used to drop bytes on short forward seeks
    pub fn with_discard_capacity(mut self, capacity: usize) -> Self {
        if self.sink.len() < capacity {
            self.sink.resize(capacity, 0);
        }
        self
    }

    pub fn object(&self) -> &ObjectRef {
        &self.object
    }

    /// Current read position
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Object size if it has been resolved already
    pub fn known_size(&self) -> Option<u64> {
        self.size
    }

    /// Whether a range body is currently open
    pub fn is_active(&self) -> bool {
        self.body.is_some()
    }

    /// Release the open range body, if any. Safe to call repeatedly.
    pub fn close(&mut self) {
        self.pending = None;
        self.reset();
    }

    fn reset(&mut self) {
        if self.body.take().is_some() {
            log::debug!("{}: released range ending at {:?}", self.object, self.last_byte);
        }
        self.last_byte = None;
    }

    fn resolve_size(&mut self) -> Result<u64> {
        if let Some(size) = self.size {
            return Ok(size);
        }
        let size = self
            .fetcher
            .head_size(&self.object)
            .map_err(|e| Error::head(&self.object, e))?;
        log::debug!("{}: size is {} bytes", self.object, size);
        self.size = Some(size);
        Ok(size)
    }

    /// Open a body for the next `n` bytes starting at `offset`
    fn fetch(&mut self, n: u64) -> Result<Chunk> {
        self.reset();

        let remaining = self.resolve_size()?.saturating_sub(self.offset);
        let n = n.max(1).min(remaining);
        if n == 0 {
            return Ok(Chunk::EndOfData);
        }

        let range = ByteRange::new(self.offset, self.offset + n - 1);
        log::debug!("{}: fetching bytes={}", self.object, range);
        let body = self
            .fetcher
            .fetch_range(&self.object, range)
            .map_err(|e| Error::fetch(&self.object, range, e))?;

        self.body = Some(body);
        self.last_byte = Some(range.end);
        Ok(Chunk::Opened)
    }

    /// Drop `n` bytes from the open body; any failure resets the reader
    fn discard(&mut self, n: u64) {
        let Ok(n) = usize::try_from(n) else {
            self.reset();
            return;
        };
        if self.sink.len() < n {
            self.sink.resize(n, 0);
        }
        let Some(body) = self.body.as_mut() else {
            return;
        };
        log::trace!("{}: discarding {} bytes", self.object, n);
        if let Err(e) = body.read_exact(&mut self.sink[..n]) {
            log::debug!("{}: discard of {} bytes failed, refetching later: {}", self.object, n, e);
            self.reset();
        }
    }
}

impl<F: RangeFetcher, P: ChunkSizePolicy> Read for SeekableChunkReader<F, P> {
    /// Fill `buf` from the object, opening new chunks as earlier ones run out.
    ///
    /// Returns `Ok(0)` once the offset reaches the end of the object. If a
    /// fetch or the body fails after some bytes were already copied, those
    /// bytes are returned and the failure is reported by the next call.
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        if let Some(e) = self.pending.take() {
            return Err(e);
        }

        let mut filled = 0;
        let mut fresh = false;

        while filled < buf.len() {
            if self.body.is_none() {
                match self.fetch(self.policy.chunk_size()) {
                    Ok(Chunk::Opened) => fresh = true,
                    Ok(Chunk::EndOfData) => break,
                    Err(e) if filled > 0 => {
                        log::debug!("{}: deferring error after {} bytes: {}", self.object, filled, e);
                        break;
                    }
                    Err(e) => return Err(e.into()),
                }
            }

            let (Some(body), Some(last_byte)) = (self.body.as_mut(), self.last_byte) else {
                break;
            };
            // never read past the promised range, even if the body would allow it
            let promised = last_byte - self.offset + 1;
            let want = (buf.len() - filled).min(usize::try_from(promised).unwrap_or(usize::MAX));

            let n = match body.read(&mut buf[filled..filled + want]) {
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    self.reset();
                    if filled > 0 {
                        log::debug!("{}: deferring error after {} bytes: {}", self.object, filled, e);
                        self.pending = Some(e);
                        break;
                    }
                    return Err(e);
                }
            };

            if n == 0 {
                // body ran dry; drop it so the next iteration opens a new chunk
                let range = ByteRange::new(self.offset, last_byte);
                self.reset();
                if fresh {
                    if filled > 0 {
                        break;
                    }
                    return Err(Error::EmptyBody { range }.into());
                }
                continue;
            }

            fresh = false;
            filled += n;
            self.offset += n as u64;
            if self.offset > last_byte {
                self.reset();
            }
        }

        Ok(filled)
    }
}

impl<F: RangeFetcher, P: ChunkSizePolicy> Seek for SeekableChunkReader<F, P> {
    /// Move the read position.
    ///
    /// Seeking never checks the target against the object size; a position
    /// past the end simply makes the next read return `Ok(0)`.
    /// [`SeekFrom::End`] resolves the object size first (one HEAD request
    /// if it is not known yet).
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let (base, delta) = match pos {
            SeekFrom::Start(target) => (target, 0),
            SeekFrom::Current(delta) => (self.offset, delta),
            SeekFrom::End(delta) => (self.resolve_size()?, delta),
        };
        let target = base.checked_add_signed(delta).ok_or(Error::InvalidSeek {
            from: base,
            delta,
        })?;

        // repositioning drops an error that belonged to the old position
        self.pending = None;

        if target < self.offset {
            // bodies only read forward
            self.reset();
        } else if target > self.offset {
            match self.last_byte {
                Some(last_byte) if target <= last_byte => self.discard(target - self.offset),
                _ => self.reset(),
            }
        }

        self.offset = target;
        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::MemoryFetcher;

    fn reader(data: &[u8], chunk: u64) -> SeekableChunkReader<MemoryFetcher> {
        let object = ObjectRef::new("b", "k");
        let fetcher = MemoryFetcher::new().with_object(object.clone(), data.to_vec());
        SeekableChunkReader::new(fetcher, object, FixedChunkSizePolicy::new(chunk))
    }

    #[test]
    fn starts_idle_and_lazy() {
        let reader = reader(b"abc", 2);
        assert!(!reader.is_active());
        assert_eq!(reader.known_size(), None);
        assert_eq!(reader.offset(), 0);
    }

    #[test]
    fn releases_body_after_last_promised_byte() -> io::Result<()> {
        let mut reader = reader(b"abcdef", 3);
        let mut buf = [0u8; 2];
        reader.read_exact(&mut buf)?;
        assert!(reader.is_active());

        let mut buf = [0u8; 1];
        reader.read_exact(&mut buf)?;
        assert_eq!(reader.offset(), 3);
        assert!(!reader.is_active());
        Ok(())
    }

    #[test]
    fn empty_buffer_does_no_io() -> io::Result<()> {
        let mut reader = reader(b"abc", 2);
        assert_eq!(reader.read(&mut [])?, 0);
        assert_eq!(reader.known_size(), None);
        Ok(())
    }

    #[test]
    fn seek_to_same_position_keeps_body() -> io::Result<()> {
        let mut reader = reader(b"abcdef", 4);
        let mut buf = [0u8; 1];
        reader.read_exact(&mut buf)?;
        assert_eq!(reader.seek(SeekFrom::Current(0))?, 1);
        assert!(reader.is_active());
        Ok(())
    }

    #[test]
    fn discard_buffer_grows_to_largest_seek() -> io::Result<()> {
        let mut reader = reader(&[9u8; 200], 100);
        let mut byte = [0u8; 1];
        reader.read_exact(&mut byte)?;

        reader.seek(SeekFrom::Current(30))?;
        assert_eq!(reader.sink.len(), 30);
        reader.seek(SeekFrom::Current(5))?;
        assert_eq!(reader.sink.len(), 30);
        reader.seek(SeekFrom::Current(40))?;
        assert_eq!(reader.sink.len(), 40);

        assert_eq!(reader.offset(), 76);
        assert!(reader.is_active());
        Ok(())
    }

    #[test]
    fn discard_capacity_only_grows() {
        let reader = reader(b"abc", 2).with_discard_capacity(64).with_discard_capacity(8);
        assert_eq!(reader.sink.len(), 64);
    }
}
