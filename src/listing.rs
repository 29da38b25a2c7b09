// Copyright (C) 2026 FZI Forschungszentrum Informatik
// SPDX-License-Identifier: Apache-2.0
//! Human readable trace listing

use core::fmt;

use crate::decoder::{Event, Token};
use crate::table::{Kind, Table};

const INDENT: &str = "    ";

/// Listing of decoded events
///
/// Every token is rendered on its own line, prefixed with the time and the
/// bit offset within its unit it was read at. Lines are indented according
/// to the call depth.
///
/// # Example
///
/// ```
/// use rlis_trace::decoder;
/// use rlis_trace::listing::Listing;
/// use rlis_trace::sequence::Entry;
/// use rlis_trace::table::Table;
/// use rlis_trace::unit::Unit;
///
/// let table: Table = "
///     header entry global 0 1
///     footer entry point 0 1
/// "
/// .parse()
/// .unwrap();
/// let unit = Unit::new(1, 0, vec![0b1000_0000], 4).with_timestamp(2.0);
/// let trace = decoder::builder()
///     .build(&table)
///     .decode_entries(&[Entry::Unit(unit)], 1.5);
///
/// let listing = Listing::new(&table, &trace.events).to_string();
/// assert!(listing.starts_with("0.500000   0: -- ENTRY --> entry\n"));
/// ```
#[derive(Copy, Clone, Debug)]
pub struct Listing<'a, 't> {
    table: &'a Table,
    events: &'a [Event<'t>],
}

impl<'a, 't> Listing<'a, 't> {
    /// Create a listing for the given events
    pub fn new(table: &'a Table, events: &'a [Event<'t>]) -> Self {
        Self { table, events }
    }

    fn line(&self, f: &mut fmt::Formatter<'_>, token: &Token<'_>, depth: usize) -> fmt::Result {
        match token.stamp.time {
            Some(time) => write!(f, "{time:4.6} {:3}: ", token.stamp.offset)?,
            None => write!(f, "{:>8} {:3}: ", "?", token.stamp.offset)?,
        }
        (0..depth).try_for_each(|_| f.write_str(INDENT))
    }
}

impl fmt::Display for Listing<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut depth = 0usize;
        for event in self.events {
            let token = match event {
                Event::Token(token) => token,
                Event::ChunkBoundary => {
                    write!(f, "\n\nEND OF CHUNK\n\n")?;
                    depth = 0;
                    continue;
                }
            };

            let descriptor = token.descriptor;
            match descriptor.kind() {
                Kind::Footer => {
                    depth = depth.saturating_sub(1);
                    self.line(f, token, depth)?;
                    writeln!(f, "<-- RETURN --")?;
                }
                Kind::Header => {
                    self.line(f, token, depth)?;
                    let function = descriptor.function().unwrap_or_default();
                    writeln!(f, "-- ENTRY --> {function}")?;
                    depth += 1;
                }
                Kind::Call { target } if self.table.has_point_footer(target) => {
                    self.line(f, token, depth)?;
                    writeln!(f, "-- BODY --> {target}")?;
                    depth += 1;
                }
                Kind::Call { target } => {
                    self.line(f, token, depth)?;
                    writeln!(f, "Calling {target}")?;
                }
                Kind::Conditional { range, .. } => {
                    self.line(f, token, depth)?;
                    let id = descriptor.id().unwrap_or_default();
                    writeln!(f, "Branch ID: {id} (of {range})")?;
                }
                Kind::Watch { variable, .. } => {
                    self.line(f, token, depth)?;
                    let value = token.value.unwrap_or_default();
                    writeln!(f, "Watch point for {variable} with value: {value}")?;
                }
            }
        }
        write!(f, "\n\nEND OF DATA\n\n")
    }
}
