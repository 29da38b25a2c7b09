// Copyright (C) 2026 FZI Forschungszentrum Informatik
// SPDX-License-Identifier: Apache-2.0
//! Token table errors

use core::fmt;

use super::Scope;

/// Errors in a single line of a specification
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParseError {
    /// The type of the instrumentation point is not known
    UnknownType(String),
    /// The scope of the instrumentation point is not known
    UnknownScope(String),
    /// A required field is missing
    MissingField(&'static str),
    /// A numeric field could not be parsed
    BadNumber { field: &'static str, value: String },
    /// The line contains more fields than expected
    TrailingField(String),
    /// A conditional was declared with a range of zero ids
    ZeroRange,
}

impl core::error::Error for ParseError {}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownType(t) => write!(f, "unknown type '{t}'"),
            Self::UnknownScope(s) => write!(f, "unknown scope '{s}'"),
            Self::MissingField(n) => write!(f, "missing field '{n}'"),
            Self::BadNumber { field, value } => {
                write!(f, "invalid value '{value}' for field '{field}'")
            }
            Self::TrailingField(v) => write!(f, "unexpected trailing field '{v}'"),
            Self::ZeroRange => write!(f, "range must not be zero"),
        }
    }
}

/// Errors while adding instrumentation points to a [`Table`][super::Table]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Error {
    /// The line could not be parsed
    Parse(ParseError),
    /// The width differs from the one of other points sharing the scope
    InconsistentWidth {
        scope: Scope,
        function: Option<String>,
        expected: u8,
        found: u8,
    },
    /// The id is already taken in the scope
    DuplicateId {
        scope: Scope,
        function: Option<String>,
        id: u64,
    },
    /// The id cannot be represented with the declared width
    IdOutOfRange { id: u64, width: u8 },
    /// A width exceeds the supported 64 bits
    WidthTooLarge(u8),
    /// Point tokens need to be at least one bit wide
    ZeroPointWidth,
    /// The specification could not be read
    Io(std::io::ErrorKind),
}

impl From<ParseError> for Error {
    fn from(error: ParseError) -> Self {
        Self::Parse(error)
    }
}

impl core::error::Error for Error {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Self::Parse(inner) => Some(inner),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse(_) => write!(f, "malformed entry"),
            Self::InconsistentWidth {
                scope,
                function: Some(function),
                expected,
                found,
            } => write!(
                f,
                "width {found} differs from width {expected} of other {scope} ids of {function}"
            ),
            Self::InconsistentWidth {
                scope,
                function: None,
                expected,
                found,
            } => write!(
                f,
                "width {found} differs from width {expected} of other {scope} ids"
            ),
            Self::DuplicateId {
                scope,
                function: Some(function),
                id,
            } => write!(f, "{scope} id {id} of {function} defined more than once"),
            Self::DuplicateId {
                scope,
                function: None,
                id,
            } => write!(f, "{scope} id {id} defined more than once"),
            Self::IdOutOfRange { id, width } => write!(f, "id {id} does not fit into {width} bits"),
            Self::WidthTooLarge(w) => write!(f, "width {w} exceeds 64 bits"),
            Self::ZeroPointWidth => write!(f, "point width must not be zero"),
            Self::Io(kind) => write!(f, "could not read specification: {kind}"),
        }
    }
}

/// An [`Error`] located in a specific line of a specification
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoadError {
    /// Line number, starting at 1
    pub line: usize,
    pub error: Error,
}

impl core::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        Some(&self.error)
    }
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.error {
            Error::Parse(inner) => write!(f, "line {}: {inner}", self.line),
            error => write!(f, "line {}: {error}", self.line),
        }
    }
}

/// Errors resolving an id to an instrumentation point
///
/// During decoding, these errors indicate that the decoder is not aligned
/// with the data.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LookupError {
    /// No global ids are defined
    NoGlobalScope,
    /// The global id is not defined
    UnknownGlobal(u64),
    /// A local id was requested without a context
    NoContext,
    /// The function does not define any local ids
    UnknownContext(String),
    /// The local id is not defined for the function
    UnknownLocal { function: String, id: u64 },
}

impl core::error::Error for LookupError {}

impl fmt::Display for LookupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoGlobalScope => write!(f, "no global ids defined"),
            Self::UnknownGlobal(id) => write!(f, "unknown global id {id}"),
            Self::NoContext => write!(f, "local id without context"),
            Self::UnknownContext(function) => write!(f, "no local ids defined for {function}"),
            Self::UnknownLocal { function, id } => {
                write!(f, "unknown local id {id} for {function}")
            }
        }
    }
}
