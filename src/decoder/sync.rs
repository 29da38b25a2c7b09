// Copyright (C) 2026 FZI Forschungszentrum Informatik
// SPDX-License-Identifier: Apache-2.0
//! Resynchronization
//!
//! After data loss, the first bits of a chunk usually belong to a token whose
//! start was lost. The decoder thus probes a range of bit offsets at the start
//! of every chunk. For each offset it decodes greedily, with an empty call
//! context, until the end of the chunk. Offsets at which decoding runs into a
//! [`Misalignment`][super::Misalignment] are rejected. The remaining
//! [`Candidate`]s are ranked by their score:
//!
//! ```text
//! score = tokens - offset - nesting_penalty * nested_headers
//! ```
//!
//! where `nested_headers` is the number of global headers decoded while the
//! call depth was not zero. Entry points are not expected to nest, so such
//! headers hint at a wrong alignment.

use crate::chunk::Reader;
use crate::table::{Kind, Scope, Table};

use super::{ContextStack, Decoder, Step, Token};

/// A viable starting offset
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Candidate {
    /// Number of bits to discard
    pub offset: usize,
    /// Number of tokens decoded from the offset up to the end of the chunk
    pub tokens: usize,
    pub score: i64,
}

/// Running score of a single probe
#[derive(Copy, Clone, Debug, Default)]
pub struct Score {
    tokens: usize,
    depth: usize,
    nested_headers: usize,
}

impl Score {
    /// Account for a decoded token
    pub fn push(&mut self, token: &Token<'_>, table: &Table) {
        let descriptor = token.descriptor;
        self.tokens += 1;
        match (descriptor.kind(), descriptor.scope()) {
            (Kind::Header, Scope::Global) => {
                if self.depth > 0 {
                    self.nested_headers += 1;
                }
                self.depth += 1;
            }
            (Kind::Call { target }, Scope::Local) if table.has_point_footer(target) => {
                self.depth += 1;
            }
            (Kind::Footer, Scope::Point) => self.depth = self.depth.saturating_sub(1),
            _ => (),
        }
    }

    /// Retrieve the number of tokens accounted for
    pub fn tokens(&self) -> usize {
        self.tokens
    }

    /// Compute the final score for a probe starting at `offset`
    pub fn value(&self, offset: usize, nesting_penalty: i64) -> i64 {
        self.tokens as i64 - offset as i64 - nesting_penalty * self.nested_headers as i64
    }
}

/// Search the best starting offset for the chunk `reader` is positioned at
///
/// Offsets are probed in ascending order and a later candidate only replaces
/// the current best one if its score is strictly greater. Candidates which do
/// not decode any token are not considered.
pub(super) fn search(decoder: &Decoder<'_>, reader: Reader<'_>) -> Option<Candidate> {
    let chunk = reader.cursor().chunk;
    let mut best: Option<Candidate> = None;
    let mut viable = 0;
    for offset in 0..decoder.params.max_offset {
        let mut probe = reader;
        if probe.skip(offset).is_err() {
            break;
        }
        let Some(candidate) = probe_offset(decoder, probe, offset) else {
            continue;
        };
        log::trace!(
            "Chunk {chunk}: offset {offset} decodes {} tokens, score {}",
            candidate.tokens,
            candidate.score,
        );
        viable += 1;
        if best.is_none_or(|b| candidate.score > b.score) {
            best = Some(candidate);
        }
    }
    if let Some(best) = best {
        log::debug!(
            "Chunk {chunk}: chose offset {} out of {viable} candidates",
            best.offset
        );
    }
    best
}

/// Decode from `probe` until the end of the chunk
fn probe_offset(decoder: &Decoder<'_>, mut probe: Reader<'_>, offset: usize) -> Option<Candidate> {
    let mut stack = ContextStack::new();
    let mut score = Score::default();
    loop {
        match decoder.decode_one(&mut probe, &mut stack) {
            Step::Decoded(token) => score.push(&token, decoder.table),
            Step::ChunkBoundary | Step::StreamEnd => break,
            Step::Misaligned(reason) => {
                log::trace!("Offset {offset} rejected: {reason}");
                return None;
            }
        }
    }
    (score.tokens() > 0).then(|| Candidate {
        offset,
        tokens: score.tokens(),
        score: score.value(offset, decoder.params.nesting_penalty),
    })
}
