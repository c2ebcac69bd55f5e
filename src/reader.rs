//! Input-source abstraction for the decoder.
//!
//! All parsing runs against the [`Reader`] trait, so the same decode logic
//! works over an in-memory slice ([`SliceReader`]), a buffered file or socket
//! ([`StreamReader`]), or an external object that hands back arbitrary-sized
//! chunks ([`ChunkReader`]).
//!
//! `read_exact` lends the caller a slice that may point either directly into
//! source data or into reader-owned scratch memory; the distinction is hidden
//! behind the borrow, which ends when the caller is done with the bytes.

use crate::{Error, Result};
use std::io::{ErrorKind, Read};

/// A byte source the decoder can pull from.
pub trait Reader {
    /// Borrow exactly `len` bytes, failing [`Error::Truncated`] if the source
    /// cannot supply them.
    fn read_exact(&mut self, len: usize) -> Result<&[u8]>;

    /// Read a single byte.
    fn read_one(&mut self) -> Result<u8>;

    /// Number of bytes consumed so far, used for error context.
    fn position(&self) -> u64;
}

/// Reads from a fixed in-memory byte slice.
pub struct SliceReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> SliceReader<'a> {
    /// Wrap `data`, rejecting an empty buffer.
    pub fn new(data: &'a [u8]) -> Result<Self> {
        if data.is_empty() {
            return Err(Error::InvalidInput("empty input buffer"));
        }
        Ok(Self { data, pos: 0 })
    }
}

impl Reader for SliceReader<'_> {
    fn read_exact(&mut self, len: usize) -> Result<&[u8]> {
        let remaining = self.data.len() - self.pos;
        if len > remaining {
            return Err(Error::Truncated {
                offset: self.pos as u64,
                needed: len - remaining,
            });
        }
        let out = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(out)
    }

    fn read_one(&mut self) -> Result<u8> {
        if self.pos >= self.data.len() {
            return Err(Error::Truncated {
                offset: self.pos as u64,
                needed: 1,
            });
        }
        let b = self.data[self.pos];
        self.pos += 1;
        Ok(b)
    }

    fn position(&self) -> u64 {
        self.pos as u64
    }
}

// Scratch below this size is never worth releasing.
const SCRATCH_FLOOR: usize = 256;
// Consecutive reads using under a quarter of the scratch capacity before it
// shrinks back down.
const SHRINK_AFTER: u32 = 16;

/// Reads from any blocking [`std::io::Read`] source, such as a
/// `BufReader<File>` or a socket.
///
/// A single scratch buffer is reused across calls: it grows when a larger
/// read is requested and shrinks back once usage stays persistently small,
/// so one oversized value does not pin its peak allocation for the rest of
/// the stream.
pub struct StreamReader<R> {
    source: R,
    scratch: Vec<u8>,
    small_reads: u32,
    pos: u64,
}

impl<R: Read> StreamReader<R> {
    pub fn new(source: R) -> Self {
        Self {
            source,
            scratch: Vec::new(),
            small_reads: 0,
            pos: 0,
        }
    }

    /// Consume the reader, returning the underlying source.
    pub fn into_inner(self) -> R {
        self.source
    }

    fn fill(&mut self, len: usize) -> Result<()> {
        if self.scratch.len() < len {
            let extra = len - self.scratch.len();
            self.scratch.try_reserve(extra)?;
            self.scratch.resize(len, 0);
        }
        let mut filled = 0;
        while filled < len {
            match self.source.read(&mut self.scratch[filled..len]) {
                Ok(0) => {
                    return Err(Error::Truncated {
                        offset: self.pos + filled as u64,
                        needed: len - filled,
                    });
                }
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => return Err(Error::Io(e)),
            }
        }
        Ok(())
    }

    fn track_usage(&mut self, len: usize) {
        if self.scratch.capacity() > SCRATCH_FLOOR && len < self.scratch.capacity() / 4 {
            self.small_reads += 1;
            if self.small_reads >= SHRINK_AFTER {
                let keep = len.max(SCRATCH_FLOOR);
                self.scratch.truncate(keep);
                self.scratch.shrink_to(keep);
                self.small_reads = 0;
            }
        } else {
            self.small_reads = 0;
        }
    }
}

impl<R: Read> Reader for StreamReader<R> {
    fn read_exact(&mut self, len: usize) -> Result<&[u8]> {
        if len == 0 {
            return Ok(&[]);
        }
        self.fill(len)?;
        self.pos += len as u64;
        self.track_usage(len);
        Ok(&self.scratch[..len])
    }

    fn read_one(&mut self) -> Result<u8> {
        Ok(self.read_exact(1)?[0])
    }

    fn position(&self) -> u64 {
        self.pos
    }
}

/// An external source that yields chunks of at most the requested size.
///
/// A call may return fewer bytes than asked for, but never zero bytes unless
/// the source is exhausted; an empty chunk signals exhaustion.
pub trait ChunkSource {
    fn next_chunk(&mut self, max: usize) -> std::io::Result<Vec<u8>>;
}

/// Reads from a [`ChunkSource`], retrying short reads until each request is
/// satisfied.
///
/// Partial chunks accumulate in a scratch buffer; when the first chunk of a
/// request already covers it completely, the chunk is adopted as-is instead
/// of being copied.
pub struct ChunkReader<S> {
    source: S,
    scratch: Vec<u8>,
    pos: u64,
}

impl<S: ChunkSource> ChunkReader<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            scratch: Vec::new(),
            pos: 0,
        }
    }

    /// Consume the reader, returning the underlying source.
    pub fn into_inner(self) -> S {
        self.source
    }
}

impl<S: ChunkSource> Reader for ChunkReader<S> {
    fn read_exact(&mut self, len: usize) -> Result<&[u8]> {
        if len == 0 {
            return Ok(&[]);
        }
        self.scratch.clear();
        let mut remaining = len;
        while remaining > 0 {
            let chunk = self.source.next_chunk(remaining)?;
            if chunk.len() > remaining {
                return Err(Error::ProtocolViolation(
                    "chunk source returned more bytes than requested",
                ));
            }
            if chunk.is_empty() {
                return Err(Error::Truncated {
                    offset: self.pos + (len - remaining) as u64,
                    needed: remaining,
                });
            }
            remaining -= chunk.len();
            if self.scratch.is_empty() && remaining == 0 {
                // Single chunk satisfied the whole request; no copy needed.
                self.scratch = chunk;
            } else {
                self.scratch.try_reserve(chunk.len())?;
                self.scratch.extend_from_slice(&chunk);
            }
        }
        self.pos += len as u64;
        Ok(&self.scratch[..len])
    }

    fn read_one(&mut self) -> Result<u8> {
        Ok(self.read_exact(1)?[0])
    }

    fn position(&self) -> u64 {
        self.pos
    }
}
