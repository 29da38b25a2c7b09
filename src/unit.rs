// Copyright (C) 2026 FZI Forschungszentrum Informatik
// SPDX-License-Identifier: Apache-2.0
//! Log units
//!
//! A [`Unit`] is the smallest piece of trace data received from a source: a
//! short byte payload of which only a declared number of leading bits is
//! valid, tagged with the source's id, a wrapping sequence number and an
//! optional reception timestamp.

use core::fmt;
use core::iter::FusedIterator;

/// Maximum number of payload bits a single bitlog unit carries
pub const MAX_BITS: usize = 128;

/// A single received log unit
///
/// Units are immutable once created.
#[derive(Clone, Debug, PartialEq)]
pub struct Unit {
    source: u16,
    sequence: u8,
    timestamp: Option<f64>,
    valid_bits: usize,
    payload: Vec<u8>,
}

impl Unit {
    /// Create a new unit without timestamp
    ///
    /// A `valid_bits` count exceeding the payload is clamped to the number of
    /// bits in the payload.
    pub fn new(source: u16, sequence: u8, payload: Vec<u8>, valid_bits: usize) -> Self {
        let valid_bits = valid_bits.min(payload.len() * 8);
        Self {
            source,
            sequence,
            timestamp: None,
            valid_bits,
            payload,
        }
    }

    /// Attach a reception timestamp
    pub fn with_timestamp(self, timestamp: f64) -> Self {
        Self {
            timestamp: Some(timestamp),
            ..self
        }
    }

    /// Retrieve the id of the source which emitted this unit
    pub fn source(&self) -> u16 {
        self.source
    }

    /// Retrieve the unit's sequence number
    pub fn sequence(&self) -> u8 {
        self.sequence
    }

    /// Retrieve the reception timestamp, if known
    pub fn timestamp(&self) -> Option<f64> {
        self.timestamp
    }

    /// Retrieve the raw payload, including any invalid trailing bits
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Retrieve the number of valid bits
    pub fn bit_len(&self) -> usize {
        self.valid_bits
    }

    /// Retrieve the valid bits of this unit
    ///
    /// Bits are yielded most significant bit first for each payload byte and
    /// the sequence ends after [`bit_len`][Self::bit_len] bits.
    pub fn bits(&self) -> Bits<'_> {
        Bits {
            data: &self.payload,
            pos: 0,
            len: self.valid_bits,
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Log {:02}.{:04}", self.source, self.sequence)?;
        if let Some(timestamp) = self.timestamp {
            write!(f, " (at {timestamp:.6})")?;
        }
        write!(f, ":")?;
        self.payload.iter().try_for_each(|b| write!(f, " {b:02X}"))
    }
}

/// [`Iterator`] over the valid bits of a [`Unit`]
#[derive(Clone, Debug)]
pub struct Bits<'u> {
    data: &'u [u8],
    pos: usize,
    len: usize,
}

impl Iterator for Bits<'_> {
    type Item = bool;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.len {
            return None;
        }
        let byte = self.data[self.pos >> 3];
        let bit = (byte >> (7 - (self.pos & 0x7))) & 0x1;
        self.pos += 1;
        Some(bit != 0)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.len - self.pos;
        (left, Some(left))
    }
}

impl ExactSizeIterator for Bits<'_> {}

impl FusedIterator for Bits<'_> {}
