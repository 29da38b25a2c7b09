// Copyright (C) 2026 FZI Forschungszentrum Informatik
// SPDX-License-Identifier: Apache-2.0
//! Loss-delimited bit chunks
//!
//! A [`ChunkStream`] concatenates the bits of consecutive units of a
//! sequenced source trace into chunks. Every [`Entry::Gap`] ends the current
//! chunk, i.e. a chunk is a maximal run of bits without data loss. Chunks are
//! read through a [`Reader`], which is a small [`Copy`] value and may thus be
//! duplicated freely in order to probe the data ahead.

use core::fmt;

use crate::sequence::Entry;

/// Reasons a read could not be satisfied
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Boundary {
    /// The current chunk is exhausted but more chunks follow
    DataMissing,
    /// The last chunk is exhausted
    DataEnd,
}

impl core::error::Error for Boundary {}

impl fmt::Display for Boundary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DataMissing => write!(f, "end of chunk, data is missing"),
            Self::DataEnd => write!(f, "end of data"),
        }
    }
}

/// Time and position at which some data was read
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Stamp {
    /// Time elapsed since the trace's start time
    ///
    /// This is [`None`] if the unit the data originates from does not carry a
    /// timestamp.
    pub time: Option<f64>,
    /// Number of bits between the start of the unit and the data
    pub offset: usize,
}

/// Position within a [`ChunkStream`]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Cursor {
    pub chunk: usize,
    pub bit: usize,
}

/// Contiguous bits, stored most significant bit first
#[derive(Clone, Debug, Default)]
struct Chunk {
    data: Vec<u8>,
    len: usize,
}

impl Chunk {
    fn push(&mut self, bit: bool) {
        let shift = 7 - (self.len & 0x7);
        if shift == 7 {
            self.data.push(0);
        }
        if let Some(byte) = self.data.last_mut() {
            *byte |= u8::from(bit) << shift;
        }
        self.len += 1;
    }

    fn bit(&self, pos: usize) -> bool {
        (self.data[pos >> 3] >> (7 - (pos & 0x7))) & 0x1 != 0
    }

    /// Read `count` bits starting at `pos` as an unsigned integer
    ///
    /// # Panics
    ///
    /// Panics if the bits requested are not within the chunk.
    fn bits(&self, pos: usize, count: u8) -> u64 {
        (pos..pos + usize::from(count)).fold(0, |acc, p| (acc << 1) | u64::from(self.bit(p)))
    }
}

/// Association of a bit position to the timestamp of the unit starting there
#[derive(Copy, Clone, Debug)]
struct Anchor {
    cursor: Cursor,
    timestamp: Option<f64>,
}

/// Stream of loss-delimited chunks for a single source
#[derive(Clone, Debug)]
pub struct ChunkStream {
    chunks: Vec<Chunk>,
    anchors: Vec<Anchor>,
    start_time: f64,
}

impl ChunkStream {
    /// Create a new stream from the sequenced entries of a single source
    ///
    /// The `start_time` is subtracted from unit timestamps when reporting
    /// [`Stamp`]s.
    pub fn new<'e>(entries: impl IntoIterator<Item = &'e Entry>, start_time: f64) -> Self {
        let mut chunks = Vec::new();
        let mut anchors = Vec::new();
        let mut current = Chunk::default();
        let mut chunk_anchors = 0;

        for entry in entries {
            match entry {
                Entry::Unit(unit) => {
                    anchors.push(Anchor {
                        cursor: Cursor {
                            chunk: chunks.len(),
                            bit: current.len,
                        },
                        timestamp: unit.timestamp(),
                    });
                    unit.bits().for_each(|b| current.push(b));
                }
                Entry::Gap if current.len > 0 => {
                    chunks.push(core::mem::take(&mut current));
                    chunk_anchors = anchors.len();
                }
                Entry::Gap => anchors.truncate(chunk_anchors),
            }
        }
        if current.len > 0 {
            chunks.push(current);
        } else {
            anchors.truncate(chunk_anchors);
        }

        Self {
            chunks,
            anchors,
            start_time,
        }
    }

    /// Retrieve the number of chunks
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Retrieve the length of the chunk with the given index in bits
    pub fn chunk_len(&self, index: usize) -> Option<usize> {
        self.chunks.get(index).map(|c| c.len)
    }

    /// Check whether the stream contains no data at all
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Create a [`Reader`] positioned at the start of the first chunk
    pub fn reader(&self) -> Reader<'_> {
        Reader {
            stream: self,
            cursor: Default::default(),
        }
    }
}

/// Forward-only reader for a [`ChunkStream`]
///
/// Reads never cross chunk boundaries: a read which cannot be satisfied
/// by the current chunk fails with a [`Boundary`], and the reader has to be
/// moved explicitly to the next chunk via [`advance_chunk`][Self::advance_chunk].
#[derive(Copy, Clone, Debug)]
pub struct Reader<'s> {
    stream: &'s ChunkStream,
    cursor: Cursor,
}

impl<'s> Reader<'s> {
    /// Retrieve the current position
    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    /// Retrieve the [`ChunkStream`] this reader reads from
    pub fn stream(&self) -> &'s ChunkStream {
        self.stream
    }

    /// Retrieve the number of bits left in the current chunk
    pub fn bits_left(&self) -> usize {
        self.stream
            .chunk_len(self.cursor.chunk)
            .unwrap_or_default()
            .saturating_sub(self.cursor.bit)
    }

    /// Read the next `count` bits without advancing
    ///
    /// The bits are returned as an unsigned integer, the first bit being the
    /// most significant one. Only the last 64 bits are retained if `count`
    /// exceeds 64.
    pub fn peek(&self, count: u8) -> Result<u64, Boundary> {
        self.check(count.into())?;
        Ok(self.stream.chunks[self.cursor.chunk].bits(self.cursor.bit, count))
    }

    /// Read the next `count` bits
    ///
    /// See [`peek`][Self::peek] for the result and constraints.
    pub fn read(&mut self, count: u8) -> Result<u64, Boundary> {
        let res = self.peek(count)?;
        self.cursor.bit += usize::from(count);
        Ok(res)
    }

    /// Discard the next `count` bits
    pub fn skip(&mut self, count: usize) -> Result<(), Boundary> {
        self.check(count)?;
        self.cursor.bit += count;
        Ok(())
    }

    /// Retrieve the [`Stamp`] for the current position
    pub fn read_time(&self) -> Stamp {
        let anchors = &self.stream.anchors;
        let idx = anchors.partition_point(|a| a.cursor <= self.cursor);
        idx.checked_sub(1)
            .map(|i| anchors[i])
            .filter(|a| a.cursor.chunk == self.cursor.chunk)
            .map(|a| Stamp {
                time: a.timestamp.map(|t| t - self.stream.start_time),
                offset: self.cursor.bit - a.cursor.bit,
            })
            .unwrap_or(Stamp {
                time: None,
                offset: self.cursor.bit,
            })
    }

    /// Move to the start of the next chunk
    ///
    /// Returns `true` if there is such a chunk.
    pub fn advance_chunk(&mut self) -> bool {
        self.cursor = Cursor {
            chunk: self.cursor.chunk + 1,
            bit: 0,
        };
        self.cursor.chunk < self.stream.chunks.len()
    }

    /// Check whether `count` bits are available in the current chunk
    fn check(&self, count: usize) -> Result<(), Boundary> {
        if self.cursor.chunk >= self.stream.chunks.len() {
            Err(Boundary::DataEnd)
        } else if self.bits_left() >= count {
            Ok(())
        } else if self.cursor.chunk + 1 < self.stream.chunks.len() {
            Err(Boundary::DataMissing)
        } else {
            Err(Boundary::DataEnd)
        }
    }
}

#[cfg(test)]
mod tests;
