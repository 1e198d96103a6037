//! Chunk sizing strategies.
//!
//! A [`ChunkSizePolicy`] tells the reader how many bytes to request in the
//! next range request. The value is an upper bound: near the end of the
//! object the reader asks for fewer bytes.

/// Default chunk size used by [`FixedChunkSizePolicy::default`] (8 MiB).
pub const DEFAULT_CHUNK_SIZE: u64 = 8 * 1024 * 1024;

/// Decides how much data to fetch in a single range request.
///
/// Implementations must return a positive value. The reader treats `0`
/// as `1` so a misbehaving policy cannot stall it.
pub trait ChunkSizePolicy {
    /// Number of bytes to request on the next fetch.
    fn chunk_size(&self) -> u64;
}

/// Always returns the same chunk size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedChunkSizePolicy {
    size: u64,
}

impl FixedChunkSizePolicy {
    pub fn new(size: u64) -> Self {
        Self { size: size.max(1) }
    }

    pub fn size(&self) -> u64 {
        self.size
    }
}

impl Default for FixedChunkSizePolicy {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE)
    }
}

impl ChunkSizePolicy for FixedChunkSizePolicy {
    fn chunk_size(&self) -> u64 {
        self.size
    }
}

impl<P: ChunkSizePolicy + ?Sized> ChunkSizePolicy for Box<P> {
    fn chunk_size(&self) -> u64 {
        (**self).chunk_size()
    }
}
