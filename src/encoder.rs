// Copyright (C) 2026 FZI Forschungszentrum Informatik
// SPDX-License-Identifier: Apache-2.0
//! Token encoder
//!
//! The [`Encoder`] emits tokens the same way instrumented programs do: the
//! scope prefix, the id and, for watch tokens, the watched value are written
//! most significant bit first into a bit buffer. The buffer is then cut into
//! [`Unit`]s of at most [`MAX_BITS`] bits with consecutive sequence numbers.

use core::fmt;

use crate::table::{Descriptor, Kind, Scope, Table};
use crate::unit::{MAX_BITS, Unit};

/// Encoding errors
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Error {
    /// A non-point descriptor does not carry an id
    MissingId,
    /// No value was supplied for a watch token
    MissingValue,
    /// A value was supplied for a token other than a watch token
    UnexpectedValue,
    /// The value does not fit into the field
    ValueTooWide { value: u64, width: u8 },
}

impl core::error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingId => write!(f, "Descriptor does not carry an id"),
            Self::MissingValue => write!(f, "Watch token requires a value"),
            Self::UnexpectedValue => write!(f, "Only watch tokens carry a value"),
            Self::ValueTooWide { value, width } => {
                write!(f, "Value {value} does not fit into {width} bits")
            }
        }
    }
}

/// Encoder for instrumentation tokens
#[derive(Clone, Debug)]
pub struct Encoder {
    data: Vec<u8>,
    bit_pos: usize,
    point_width: u8,
}

impl Encoder {
    /// Create a new encoder for tokens defined in the given [`Table`]
    pub fn new(table: &Table) -> Self {
        Self {
            data: Vec::new(),
            bit_pos: 0,
            point_width: table.point_width(),
        }
    }

    /// Encode one token
    ///
    /// A `value` must be given if and only if the descriptor is a
    /// [`Kind::Watch`].
    pub fn encode(&mut self, descriptor: &Descriptor, value: Option<u64>) -> Result<(), Error> {
        let value = match (descriptor.kind(), value) {
            (Kind::Watch { width, .. }, Some(value)) => Some((value, *width)),
            (Kind::Watch { .. }, None) => return Err(Error::MissingValue),
            (_, Some(_)) => return Err(Error::UnexpectedValue),
            (_, None) => None,
        };
        if let Some((value, width)) = value {
            check_width(value, width)?;
        }

        match descriptor.scope() {
            Scope::Point => self.point(),
            scope => {
                let id = descriptor.id().ok_or(Error::MissingId)?;
                check_width(id, descriptor.width())?;
                let prefix = if scope == Scope::Global { 0b10 } else { 0b11 };
                self.write_bits(prefix, 2);
                self.write_bits(id, descriptor.width());
            }
        }
        if let Some((value, width)) = value {
            self.write_bits(value, width);
        }
        Ok(())
    }

    /// Encode a point token
    pub fn point(&mut self) {
        self.write_bits(0, self.point_width);
    }

    /// Write `width` bits of `value` verbatim
    ///
    /// Bits above `width` are ignored.
    pub fn raw(&mut self, value: u64, width: u8) {
        self.write_bits(value, width);
    }

    /// Retrieve the number of bits written
    pub fn bit_len(&self) -> usize {
        self.bit_pos
    }

    /// Retrieve the bits written so far as [`Unit`]s
    ///
    /// Every unit but the last holds exactly [`MAX_BITS`] bits. Sequence
    /// numbers start at `first_sequence` and wrap around.
    pub fn units(&self, source: u16, first_sequence: u8) -> Vec<Unit> {
        let bytes = MAX_BITS / 8;
        self.data
            .chunks(bytes)
            .enumerate()
            .map(|(i, data)| {
                let bits = (self.bit_pos - i * MAX_BITS).min(MAX_BITS);
                let mut payload = data.to_vec();
                payload.resize(bytes, 0);
                let sequence = first_sequence.wrapping_add(i as u8);
                Unit::new(source, sequence, payload, bits)
            })
            .collect()
    }

    fn write_bits(&mut self, value: u64, width: u8) {
        (0..width).rev().for_each(|i| self.write_bit((value >> i) & 1 != 0));
    }

    fn write_bit(&mut self, bit: bool) {
        let shift = 7 - (self.bit_pos & 0x7);
        if shift == 7 {
            self.data.push(0);
        }
        if let Some(byte) = self.data.last_mut() {
            *byte |= u8::from(bit) << shift;
        }
        self.bit_pos += 1;
    }
}

fn check_width(value: u64, width: u8) -> Result<(), Error> {
    if width < 64 && value >> width != 0 {
        Err(Error::ValueTooWide { value, width })
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> Table {
        "
        header entry global 0 1
        footer entry point 0 1
        call entry local leaf 1 2
        watch entry global temp 8 1 1
        "
        .parse()
        .unwrap()
    }

    fn bits(unit: &Unit) -> String {
        unit.bits().map(|b| if b { '1' } else { '0' }).collect()
    }

    #[test]
    fn prefix_code() {
        let table = table();
        let mut encoder = Encoder::new(&table);
        let header = table.lookup(Scope::Global, 0, None).unwrap();
        let call = table.lookup(Scope::Local, 1, Some("entry")).unwrap();
        encoder.encode(header, None).unwrap();
        encoder.encode(call, None).unwrap();
        encoder.point();
        assert_eq!(encoder.bit_len(), 8);

        let units = encoder.units(4, 0);
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].source(), 4);
        assert_eq!(units[0].payload().len(), MAX_BITS / 8);
        assert_eq!(bits(&units[0]), "10011010");
    }

    #[test]
    fn watch_value() {
        let table = table();
        let watch = table.lookup(Scope::Global, 1, None).unwrap();
        let mut encoder = Encoder::new(&table);
        assert_eq!(encoder.encode(watch, None), Err(Error::MissingValue));
        assert_eq!(
            encoder.encode(watch, Some(256)),
            Err(Error::ValueTooWide {
                value: 256,
                width: 8
            })
        );
        assert_eq!(encoder.bit_len(), 0);
        encoder.encode(watch, Some(42)).unwrap();
        assert_eq!(bits(&encoder.units(1, 0)[0]), "10100101010");
    }

    #[test]
    fn unexpected_value() {
        let table = table();
        let header = table.lookup(Scope::Global, 0, None).unwrap();
        let mut encoder = Encoder::new(&table);
        assert_eq!(encoder.encode(header, Some(1)), Err(Error::UnexpectedValue));
    }

    #[test]
    fn split_into_units() {
        let table = table();
        let mut encoder = Encoder::new(&table);
        (0..300).for_each(|i| encoder.raw(i & 1, 1));
        let units = encoder.units(2, 255);
        let lens: Vec<_> = units.iter().map(Unit::bit_len).collect();
        assert_eq!(lens, [128, 128, 44]);
        let sequences: Vec<_> = units.iter().map(Unit::sequence).collect();
        assert_eq!(sequences, [255, 0, 1]);
        assert!(units.iter().flat_map(Unit::bits).eq((0..300).map(|i| i & 1 != 0)));
    }
}
