// Copyright (C) 2026 FZI Forschungszentrum Informatik
// SPDX-License-Identifier: Apache-2.0

//! # Decoder for bit-packed RLIS instrumentation logs
//!
//! Programs instrumented according to an RLIS specification emit compact
//! tokens at function entries, calls, branches, returns and variable
//! snapshots. The tokens are packed into small log units and sent over a
//! lossy channel. This crate reconstructs the program's execution from such
//! logs:
//!
//! 1. [`capture`] parses captured packets and extracts [`unit::Unit`]s.
//! 2. [`sequence`] splits units by source and marks lost units.
//! 3. [`chunk`] concatenates units into chunks of contiguous bits.
//! 4. [`decoder`] resynchronizes with every chunk and decodes tokens,
//!    resolving them via a [`table::Table`] compiled from the specification.
//! 5. [`tree`] replays decoded tokens into a call tree, while [`listing`]
//!    renders them as an indented listing.
//!
//! Sources are decoded independently. The [`table::Table`] is the only state
//! shared between them and is never modified after loading.
//!
//! # Example
//!
//! ```
//! use rlis_trace::encoder::Encoder;
//! use rlis_trace::table::{Scope, Table};
//! use rlis_trace::tree::CallTree;
//! use rlis_trace::{decoder, sequence};
//!
//! let table: Table = "
//!     header entry global 0 1
//!     footer entry point 0 1
//!     call entry local leaf 0 1
//!     footer leaf point 0 1
//! "
//! .parse()
//! .unwrap();
//!
//! // Emit the tokens `entry` would emit when calling `leaf` once
//! let mut encoder = Encoder::new(&table);
//! let header = table.lookup(Scope::Global, 0, None).unwrap();
//! let call = table.lookup(Scope::Local, 0, Some("entry")).unwrap();
//! encoder.encode(header, None).unwrap();
//! encoder.encode(call, None).unwrap();
//! encoder.point();
//! encoder.point();
//!
//! let traces = sequence::by_source(encoder.units(1, 0));
//! let start_time = sequence::start_time(&traces);
//! let decoder = decoder::builder().build(&table);
//! for entries in traces.values() {
//!     let trace = decoder.decode_entries(entries, start_time);
//!     assert_eq!(trace.tokens().count(), 4);
//!
//!     let tree = CallTree::build(&table, &trace.events);
//!     assert_eq!(tree.max_depth(), 2);
//! }
//! ```

pub mod capture;
pub mod chunk;
pub mod config;
pub mod decoder;
pub mod encoder;
pub mod listing;
pub mod sequence;
pub mod table;
pub mod tree;
pub mod unit;
