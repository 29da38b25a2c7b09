// Copyright (C) 2026 FZI Forschungszentrum Informatik
// SPDX-License-Identifier: Apache-2.0
//! Decoder specific error types

use core::fmt;

use crate::table::LookupError;

/// Indications that the decoder is not aligned with the data
///
/// None of these is fatal. During the resynchronization search, they reject
/// the probed offset.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Misalignment {
    /// A point token was read while no function was executing
    StackUnderflow,
    /// A local token was read while no function was executing
    NoContext,
    /// The id does not resolve to an instrumentation point
    Lookup(LookupError),
}

impl From<LookupError> for Misalignment {
    fn from(error: LookupError) -> Self {
        Self::Lookup(error)
    }
}

impl core::error::Error for Misalignment {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Self::Lookup(inner) => Some(inner),
            _ => None,
        }
    }
}

impl fmt::Display for Misalignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StackUnderflow => write!(f, "return without active function"),
            Self::NoContext => write!(f, "local token without active function"),
            Self::Lookup(_) => write!(f, "unresolvable token"),
        }
    }
}
