// Copyright (C) 2026 FZI Forschungszentrum Informatik
// SPDX-License-Identifier: Apache-2.0
//! Token decoder
//!
//! This module provides the [`Decoder`] which turns a [`ChunkStream`] into a
//! sequence of [`Token`]s, guided by a [`Table`]. Tokens are encoded as a
//! prefix code, most significant bit first:
//!
//! | prefix | scope                | followed by                       |
//! |--------|----------------------|-----------------------------------|
//! | `0`    | [`Scope::Point`]     | nothing (the point token is `0`)  |
//! | `10`   | [`Scope::Global`]    | global id                         |
//! | `11`   | [`Scope::Local`]     | id local to the current function  |
//!
//! A [`Kind::Watch`] token is additionally followed by the watched value.
//!
//! Decoding a token may alter the [`ContextStack`]: global headers push their
//! function, calls to functions signalling their return via point tokens push
//! the call target, and point tokens pop.
//!
//! # Example
//!
//! ```
//! use rlis_trace::chunk::ChunkStream;
//! use rlis_trace::decoder;
//! use rlis_trace::sequence::Entry;
//! use rlis_trace::table::Table;
//! use rlis_trace::unit::Unit;
//!
//! let table: Table = "
//!     header entry global 0 1
//!     footer entry point 0 1
//! "
//! .parse()
//! .unwrap();
//!
//! // Header of `entry` (`10` + id `0`) followed by a return (`0`)
//! let unit = Unit::new(1, 0, vec![0b1000_0000], 4);
//! let stream = ChunkStream::new(&[Entry::Unit(unit)], 0.0);
//!
//! let trace = decoder::builder().build(&table).decode(&stream);
//! assert_eq!(trace.tokens().count(), 2);
//! assert!(trace.reports[0].synced);
//! ```

pub mod context;
pub mod error;
pub mod sync;

#[cfg(test)]
mod tests;

pub use context::ContextStack;
pub use error::Misalignment;

use crate::chunk::{Boundary, ChunkStream, Reader, Stamp};
use crate::config;
use crate::sequence::Entry;
use crate::table::{Descriptor, Kind, LookupError, Scope, Table};

/// Create a new [`Builder`] for [`Decoder`]s
pub fn builder() -> Builder {
    Default::default()
}

/// Builder for [`Decoder`]s
#[derive(Copy, Clone, Debug, Default)]
pub struct Builder {
    params: config::Parameters,
}

impl Builder {
    /// Create a new builder
    pub fn new() -> Self {
        Default::default()
    }

    /// Set the [`config::Parameters`]
    pub fn with_params(self, params: &config::Parameters) -> Self {
        Self { params: *params }
    }

    /// Build a [`Decoder`] for the given [`Table`]
    pub fn build(self, table: &Table) -> Decoder<'_> {
        Decoder {
            table,
            params: self.params,
        }
    }
}

/// A decoded token
#[derive(Clone, Debug, PartialEq)]
pub struct Token<'t> {
    /// The instrumentation point which emitted the token
    pub descriptor: &'t Descriptor,
    /// The value captured by a [`Kind::Watch`] token
    pub value: Option<u64>,
    /// Time and position the token was read at
    pub stamp: Stamp,
}

/// Result of a single decoding step
#[derive(Clone, Debug, PartialEq)]
pub enum Step<'t> {
    /// A token was decoded
    Decoded(Token<'t>),
    /// The chunk ended, more data follows after some loss
    ChunkBoundary,
    /// All data was consumed
    StreamEnd,
    /// The data does not decode at the current position
    Misaligned(Misalignment),
}

/// Item of a decoded trace
#[derive(Clone, Debug, PartialEq)]
pub enum Event<'t> {
    Token(Token<'t>),
    /// Data was lost between the previous and the next token
    ChunkBoundary,
}

impl<'t> Event<'t> {
    /// Retrieve the [`Token`] if this event is one
    pub fn token(&self) -> Option<&Token<'t>> {
        match self {
            Self::Token(token) => Some(token),
            Self::ChunkBoundary => None,
        }
    }
}

/// Diagnostics for a single chunk
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ChunkReport {
    /// Index of the chunk
    pub chunk: usize,
    /// Number of bits discarded at the start of the chunk
    ///
    /// If the chunk could not be synchronized, this is the chunk's length.
    pub dropped_bits: usize,
    /// Whether a viable starting offset was found
    pub synced: bool,
    /// Number of tokens decoded
    pub tokens: usize,
}

/// Decoded trace of a single source
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Trace<'t> {
    /// Decoded tokens, with [`Event::ChunkBoundary`]s where data was lost
    pub events: Vec<Event<'t>>,
    /// One report per chunk
    pub reports: Vec<ChunkReport>,
}

impl<'t> Trace<'t> {
    /// Retrieve all decoded tokens
    pub fn tokens(&self) -> impl Iterator<Item = &Token<'t>> {
        self.events.iter().filter_map(Event::token)
    }

    /// Retrieve the total number of bits dropped
    pub fn dropped_bits(&self) -> usize {
        self.reports.iter().map(|r| r.dropped_bits).sum()
    }
}

/// Decoder for instrumentation tokens
#[derive(Copy, Clone, Debug)]
pub struct Decoder<'t> {
    table: &'t Table,
    params: config::Parameters,
}

impl<'t> Decoder<'t> {
    /// Retrieve the [`Table`] tokens are resolved with
    pub fn table(&self) -> &'t Table {
        self.table
    }

    /// Retrieve the [`config::Parameters`] in use
    pub fn params(&self) -> &config::Parameters {
        &self.params
    }

    /// Decode a single token
    ///
    /// On success, `reader` is advanced past the token and `stack` is updated
    /// to reflect the call context after the token. Otherwise, both may be
    /// left in an unspecified state.
    pub fn decode_one(&self, reader: &mut Reader<'_>, stack: &mut ContextStack<'t>) -> Step<'t> {
        match self.try_decode(reader, stack) {
            Ok(token) => Step::Decoded(token),
            Err(Failure::Boundary(Boundary::DataMissing)) => Step::ChunkBoundary,
            Err(Failure::Boundary(Boundary::DataEnd)) => Step::StreamEnd,
            Err(Failure::Misaligned(reason)) => Step::Misaligned(reason),
        }
    }

    /// Search the best starting offset for the chunk `reader` is positioned at
    ///
    /// See [`sync`] for details. Returns [`None`] if no offset up to
    /// [`max_offset`][config::Parameters::max_offset] decodes.
    pub fn synchronize(&self, reader: Reader<'_>) -> Option<sync::Candidate> {
        sync::search(self, reader)
    }

    /// Decode the entire stream
    ///
    /// Every chunk is synchronized independently and decoded with an empty
    /// call context. Chunks which fail to synchronize are skipped.
    pub fn decode(&self, stream: &ChunkStream) -> Trace<'t> {
        let mut trace = Trace::default();
        let mut reader = stream.reader();
        if stream.is_empty() {
            return trace;
        }
        loop {
            let report = self.decode_chunk(&mut reader, &mut trace.events);
            trace.reports.push(report);
            if !reader.advance_chunk() {
                break;
            }
        }
        trace
    }

    /// Decode the sequenced entries of a single source
    pub fn decode_entries(&self, entries: &[Entry], start_time: f64) -> Trace<'t> {
        self.decode(&ChunkStream::new(entries, start_time))
    }

    /// Synchronize with and decode the chunk `reader` is positioned at
    fn decode_chunk(&self, reader: &mut Reader<'_>, events: &mut Vec<Event<'t>>) -> ChunkReport {
        let chunk = reader.cursor().chunk;
        let len = reader.bits_left();
        let mut report = ChunkReport {
            chunk,
            dropped_bits: len,
            synced: false,
            tokens: 0,
        };

        let Some(candidate) = self.synchronize(*reader) else {
            log::warn!("Chunk {chunk}: could not synchronize, dropping {len} bits");
            return report;
        };
        if let Err(e) = reader.skip(candidate.offset) {
            log::warn!("Chunk {chunk}: could not skip to offset {}: {e}", candidate.offset);
            return report;
        }
        log::info!("Chunk {chunk}: dropped {} bits", candidate.offset);
        report.dropped_bits = candidate.offset;
        report.synced = true;

        if matches!(events.last(), Some(Event::Token(_))) {
            events.push(Event::ChunkBoundary);
        }
        let mut stack = ContextStack::new();
        loop {
            match self.decode_one(reader, &mut stack) {
                Step::Decoded(token) => {
                    report.tokens += 1;
                    events.push(Event::Token(token));
                }
                Step::ChunkBoundary | Step::StreamEnd => break,
                Step::Misaligned(reason) => {
                    let bit = reader.cursor().bit;
                    log::warn!("Chunk {chunk}: lost alignment at bit {bit}: {reason}");
                    break;
                }
            }
        }
        report
    }

    fn try_decode(
        &self,
        reader: &mut Reader<'_>,
        stack: &mut ContextStack<'t>,
    ) -> Result<Token<'t>, Failure> {
        let stamp = reader.read_time();

        if reader.peek(1)? == 0 {
            reader.skip(self.table.point_width().into())?;
            stack.pop()?;
            return Ok(Token {
                descriptor: self.table.point(),
                value: None,
                stamp,
            });
        }

        let descriptor = if reader.read(2)? == 0b10 {
            let width = self
                .table
                .global_width()
                .ok_or(LookupError::NoGlobalScope)?;
            let id = reader.read(width)?;
            self.table.lookup(Scope::Global, id, None)?
        } else {
            let context = stack.top().ok_or(Misalignment::NoContext)?;
            let width = self
                .table
                .local_width(context)
                .ok_or_else(|| LookupError::UnknownContext(context.into()))?;
            let id = reader.read(width)?;
            self.table.lookup(Scope::Local, id, Some(context))?
        };

        match descriptor.kind() {
            Kind::Header if descriptor.scope() == Scope::Global => {
                if let Some(function) = descriptor.function() {
                    stack.push(function);
                }
            }
            Kind::Call { target } if self.table.has_point_footer(target) => stack.push(target),
            _ => (),
        }

        let value = match descriptor.kind() {
            Kind::Watch { width, .. } => Some(reader.read(*width)?),
            _ => None,
        };

        Ok(Token {
            descriptor,
            value,
            stamp,
        })
    }
}

/// Reasons for failing to decode a token
#[derive(Clone, Debug)]
enum Failure {
    Boundary(Boundary),
    Misaligned(Misalignment),
}

impl From<Boundary> for Failure {
    fn from(boundary: Boundary) -> Self {
        Self::Boundary(boundary)
    }
}

impl From<Misalignment> for Failure {
    fn from(reason: Misalignment) -> Self {
        Self::Misaligned(reason)
    }
}

impl From<LookupError> for Failure {
    fn from(error: LookupError) -> Self {
        Self::Misaligned(error.into())
    }
}
