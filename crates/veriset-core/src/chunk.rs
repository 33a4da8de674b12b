//! Chunking: split a byte stream into fixed-size pieces.
//!
//! The chunker is lazy and single-pass. It pulls from the reader only when the
//! next chunk is requested and cannot be rewound without reopening the source.

use std::io::Read;

use bytes::Bytes;

use crate::error::{CoreError, Result};

/// Default chunk size: 1 MiB.
pub const DEFAULT_CHUNK_SIZE: usize = 1024 * 1024;

/// Largest chunk size a configuration may ask for: 64 MiB.
pub const MAX_CHUNK_SIZE: usize = 64 * 1024 * 1024;

/// Buffers start no larger than this and grow with the data actually read.
const INITIAL_BUFFER: usize = 64 * 1024;

/// Lazy iterator over the chunks of a reader.
///
/// Every chunk except the last is exactly `chunk_size` bytes. Short reads from
/// the underlying reader are coalesced, so chunk boundaries depend only on the
/// byte content and never on how the reader happens to deliver it.
pub struct Chunker<R> {
    reader: R,
    chunk_size: usize,
    done: bool,
}

/// Split `source` into chunks of at most `chunk_size` bytes.
///
/// An empty source yields zero chunks. A read error is yielded once and ends
/// the sequence.
pub fn chunk<R: Read>(source: R, chunk_size: usize) -> Result<Chunker<R>> {
    if chunk_size == 0 {
        return Err(CoreError::InvalidChunkSize);
    }
    Ok(Chunker {
        reader: source,
        chunk_size,
        done: false,
    })
}

impl<R> Chunker<R> {
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }
}

impl<R: Read> Iterator for Chunker<R> {
    type Item = Result<Bytes>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let limit = u64::try_from(self.chunk_size).unwrap_or(u64::MAX);
        let mut buf = Vec::with_capacity(self.chunk_size.min(INITIAL_BUFFER));

        let filled = match (&mut self.reader).take(limit).read_to_end(&mut buf) {
            Ok(n) => n,
            Err(e) => {
                self.done = true;
                return Some(Err(CoreError::SourceRead(e)));
            }
        };
        if filled < self.chunk_size {
            self.done = true;
        }

        if filled == 0 {
            return None;
        }

        Some(Ok(Bytes::from(buf)))
    }
}

impl<R: Read> std::iter::FusedIterator for Chunker<R> {}
