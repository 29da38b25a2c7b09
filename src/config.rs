// Copyright (C) 2026 FZI Forschungszentrum Informatik
// SPDX-License-Identifier: Apache-2.0
//! Configuration

/// Decoder parameters
///
/// These parameters tune the resynchronization search performed at the start
/// of every chunk. They are not part of the log format, but the defaults are
/// known to work for the token widths observed in practice.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Parameters {
    /// Number of bit offsets probed at the start of a chunk
    pub max_offset: usize,
    /// Score penalty for every global header decoded while already nested
    pub nesting_penalty: i64,
}

/// See [PARAMETERS] for default values of individual fields
impl Default for Parameters {
    fn default() -> Self {
        PARAMETERS
    }
}

/// Default [Parameters]
pub const PARAMETERS: Parameters = Parameters {
    max_offset: 100,
    nesting_penalty: 10,
};
