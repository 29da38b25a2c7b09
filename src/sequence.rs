// Copyright (C) 2026 FZI Forschungszentrum Informatik
// SPDX-License-Identifier: Apache-2.0
//! Per-source sequencing of received units
//!
//! Units arrive interleaved from multiple sources over a lossy channel. This
//! module splits them into one ordered trace per source and marks the places
//! where units were lost with a single [`Entry::Gap`].

use core::fmt;
use std::collections::BTreeMap;

use crate::unit::Unit;

/// Element of a sequenced source trace
#[derive(Clone, Debug, PartialEq)]
pub enum Entry {
    /// A received unit
    Unit(Unit),
    /// One or more consecutive units were not received
    Gap,
}

impl Entry {
    /// Retrieve the [`Unit`] if this entry is one
    pub fn unit(&self) -> Option<&Unit> {
        match self {
            Self::Unit(unit) => Some(unit),
            Self::Gap => None,
        }
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unit(unit) => fmt::Display::fmt(unit, f),
            Self::Gap => write!(f, "MISSING DATA"),
        }
    }
}

/// Sequencer for the units of a single source
///
/// Units are fed in arrival order via [`push`][Self::push]. A unit whose
/// sequence number directly follows the previous one is appended. A unit
/// repeating the previous sequence number replaces the previous unit, as it
/// is assumed to be a fresher retransmission. Any other sequence number
/// results in a [`Entry::Gap`] followed by the unit, regardless of how many
/// units were lost.
#[derive(Clone, Debug, Default)]
pub struct Sequencer {
    entries: Vec<Entry>,
    prior: Option<u8>,
}

impl Sequencer {
    /// Create a new, empty sequencer
    pub fn new() -> Self {
        Default::default()
    }

    /// Feed the next unit
    pub fn push(&mut self, unit: Unit) {
        let sequence = unit.sequence();
        match self.prior {
            None => self.entries.push(Entry::Unit(unit)),
            Some(prior) if prior.wrapping_add(1) == sequence => {
                self.entries.push(Entry::Unit(unit))
            }
            Some(prior) if prior == sequence => {
                if let Some(last) = self.entries.last_mut() {
                    *last = Entry::Unit(unit);
                }
            }
            Some(_) => {
                self.entries.push(Entry::Gap);
                self.entries.push(Entry::Unit(unit));
            }
        }
        self.prior = Some(sequence);
    }

    /// Retrieve the entries sequenced so far
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Finish sequencing, yielding all entries
    pub fn finish(self) -> Vec<Entry> {
        self.entries
    }
}

/// Sequence the units of a single source
pub fn sequence(units: impl IntoIterator<Item = Unit>) -> Vec<Entry> {
    let mut sequencer = Sequencer::new();
    units.into_iter().for_each(|u| sequencer.push(u));
    sequencer.finish()
}

/// Split units by source and sequence each source's units
///
/// The relative arrival order of units from the same source is preserved.
pub fn by_source(units: impl IntoIterator<Item = Unit>) -> BTreeMap<u16, Vec<Entry>> {
    let mut sequencers: BTreeMap<u16, Sequencer> = BTreeMap::new();
    for unit in units {
        sequencers.entry(unit.source()).or_default().push(unit);
    }
    sequencers
        .into_iter()
        .map(|(source, s)| (source, s.finish()))
        .collect()
}

/// Determine the start time shared by all traces
///
/// This is the timestamp of the first unit of the source with the lowest id,
/// or `0` if that unit does not carry a timestamp.
pub fn start_time(traces: &BTreeMap<u16, Vec<Entry>>) -> f64 {
    traces
        .values()
        .next()
        .and_then(|t| t.iter().find_map(Entry::unit))
        .and_then(Unit::timestamp)
        .unwrap_or_default()
}
