// Copyright (C) 2026 FZI Forschungszentrum Informatik
// SPDX-License-Identifier: Apache-2.0
//! Instrumentation point descriptors

use core::fmt;
use core::str::{FromStr, SplitWhitespace};

use super::error::ParseError;

/// Scope in which the id of an instrumentation point is resolved
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Scope {
    /// Anonymous point without id, signalling a return
    Point,
    /// Id resolved in the context of the currently executing function
    Local,
    /// Id resolved in the single global table
    Global,
}

impl FromStr for Scope {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "point" => Ok(Self::Point),
            "local" => Ok(Self::Local),
            "global" => Ok(Self::Global),
            unknown => Err(ParseError::UnknownScope(unknown.into())),
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Point => write!(f, "point"),
            Self::Local => write!(f, "local"),
            Self::Global => write!(f, "global"),
        }
    }
}

bitflags::bitflags! {
    /// Kinds of branches a conditional instrumentation point covers
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Branch: u8 {
        const IF = 0x01;
        const SWITCH = 0x02;
        const LOOP = 0x04;
    }
}

/// Type of an instrumentation point, with type specific data
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Kind {
    /// Entry into the owning function
    Header,
    /// Return from the owning function
    Footer,
    /// Call from the owning function to `target`
    Call { target: String },
    /// Branch taken within the owning function
    ///
    /// A conditional covering multiple branches, e.g. the cases of a switch,
    /// occupies `range` consecutive ids.
    Conditional {
        branch: Branch,
        variable: String,
        range: u64,
    },
    /// Snapshot of a variable's value
    ///
    /// The value is logged directly after the id using `width` bits.
    Watch { variable: String, width: u8 },
}

impl Kind {
    /// Retrieve the name of this kind as used in specification files
    pub fn name(&self) -> &'static str {
        match self {
            Self::Header => "header",
            Self::Footer => "footer",
            Self::Call { .. } => "call",
            Self::Conditional { .. } => "conditional",
            Self::Watch { .. } => "watch",
        }
    }
}

/// Descriptor of an instrumentation point
///
/// Descriptors are parsed from lines of a specification file of the form
///
/// ```text
/// <type> <function> <scope> <type specific fields...>
/// ```
///
/// with the following type specific fields:
///
/// | type          | fields                                  |
/// |---------------|-----------------------------------------|
/// | `header`      | `id width`                              |
/// | `footer`      | `id width`                              |
/// | `call`        | `target id width`                       |
/// | `conditional` | `flags variable id range width`         |
/// | `watch`       | `variable variable_width id width`      |
///
/// # Example
///
/// ```
/// use rlis_trace::table::{Descriptor, Kind, Scope};
///
/// let descriptor: Descriptor = "call main local leaf 2 3".parse().unwrap();
/// assert_eq!(descriptor.scope(), Scope::Local);
/// assert_eq!(descriptor.function(), Some("main"));
/// assert_eq!(descriptor.id(), Some(2));
/// assert_eq!(descriptor.kind(), &Kind::Call { target: "leaf".into() });
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Descriptor {
    kind: Kind,
    scope: Scope,
    function: Option<String>,
    id: Option<u64>,
    width: u8,
}

impl Descriptor {
    /// Create a new descriptor
    pub fn new(kind: Kind, function: impl Into<String>, scope: Scope, id: u64, width: u8) -> Self {
        Self {
            kind,
            scope,
            function: Some(function.into()),
            id: Some(id),
            width,
        }
    }

    /// Create the generic, anonymous point descriptor
    ///
    /// This descriptor is not associated to any function and carries no id.
    /// It only signals a return from whatever function is executing.
    pub fn point(width: u8) -> Self {
        Self {
            kind: Kind::Footer,
            scope: Scope::Point,
            function: None,
            id: None,
            width,
        }
    }

    /// Retrieve the [`Kind`] of this instrumentation point
    pub fn kind(&self) -> &Kind {
        &self.kind
    }

    /// Retrieve the [`Scope`] of this instrumentation point
    pub fn scope(&self) -> Scope {
        self.scope
    }

    /// Retrieve the name of the function owning this instrumentation point
    pub fn function(&self) -> Option<&str> {
        self.function.as_deref()
    }

    /// Retrieve this instrumentation point's id
    pub fn id(&self) -> Option<u64> {
        self.id
    }

    /// Retrieve the width of the id field
    pub fn width(&self) -> u8 {
        self.width
    }

    /// Retrieve the number of consecutive ids this descriptor occupies
    pub fn range(&self) -> u64 {
        match self.kind {
            Kind::Conditional { range, .. } => range,
            _ => 1,
        }
    }

    /// Retrieve the name of the called function for [`Kind::Call`]s
    pub fn target(&self) -> Option<&str> {
        match &self.kind {
            Kind::Call { target } => Some(target),
            _ => None,
        }
    }

    /// Check whether this is a (global) function header
    pub fn is_header(&self) -> bool {
        self.kind == Kind::Header
    }

    /// Check whether this is a return signalled through a point
    pub fn is_point_footer(&self) -> bool {
        self.kind == Kind::Footer && self.scope == Scope::Point
    }

    /// Expand this descriptor into one descriptor per id it occupies
    ///
    /// All resulting descriptors share the same metadata.
    pub fn expand(self) -> impl Iterator<Item = Self> {
        let range = self.range();
        (0..range).map(move |offset| Self {
            id: self.id.map(|i| i + offset),
            ..self.clone()
        })
    }
}

impl FromStr for Descriptor {
    type Err = ParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut fields = Fields(line.split_whitespace());
        let kind = fields.text("type")?;
        let function = fields.text("function")?;
        let scope = fields.text("scope")?.parse()?;

        let (kind, id) = match kind {
            "header" => (Kind::Header, fields.number("id")?),
            "footer" => (Kind::Footer, fields.number("id")?),
            "call" => {
                let target = fields.text("target")?.into();
                (Kind::Call { target }, fields.number("id")?)
            }
            "conditional" => {
                let branch = Branch::from_bits_truncate(fields.number("flags")?);
                let variable = fields.text("variable")?.into();
                let id = fields.number("id")?;
                let range = fields.number("range")?;
                if range == 0 {
                    return Err(ParseError::ZeroRange);
                }
                let kind = Kind::Conditional {
                    branch,
                    variable,
                    range,
                };
                (kind, id)
            }
            "watch" => {
                let variable = fields.text("variable")?.into();
                let width = fields.number("variable width")?;
                (Kind::Watch { variable, width }, fields.number("id")?)
            }
            unknown => return Err(ParseError::UnknownType(unknown.into())),
        };
        let width = fields.number("width")?;
        fields.finish()?;
        Ok(Self::new(kind, function, scope, id, width))
    }
}

impl fmt::Display for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let function = self.function().unwrap_or("*");
        write!(f, "{} {function} {}", self.kind.name(), self.scope)?;
        match &self.kind {
            Kind::Call { target } => write!(f, " {target}")?,
            Kind::Conditional {
                branch, variable, ..
            } => write!(f, " {} {variable}", branch.bits())?,
            Kind::Watch { variable, width } => write!(f, " {variable} {width}")?,
            _ => (),
        }
        match self.id {
            Some(id) => write!(f, " {id}")?,
            None => write!(f, " *")?,
        }
        if let Kind::Conditional { range, .. } = self.kind {
            write!(f, " {range}")?;
        }
        write!(f, " {}", self.width)
    }
}

/// Whitespace separated fields of a single specification line
struct Fields<'l>(SplitWhitespace<'l>);

impl<'l> Fields<'l> {
    fn text(&mut self, name: &'static str) -> Result<&'l str, ParseError> {
        self.0.next().ok_or(ParseError::MissingField(name))
    }

    fn number<T: FromStr>(&mut self, name: &'static str) -> Result<T, ParseError> {
        let text = self.text(name)?;
        text.parse().map_err(|_| ParseError::BadNumber {
            field: name,
            value: text.into(),
        })
    }

    fn finish(mut self) -> Result<(), ParseError> {
        match self.0.next() {
            Some(field) => Err(ParseError::TrailingField(field.into())),
            None => Ok(()),
        }
    }
}
