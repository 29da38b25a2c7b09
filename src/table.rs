// Copyright (C) 2026 FZI Forschungszentrum Informatik
// SPDX-License-Identifier: Apache-2.0
//! Token table
//!
//! The [`Table`] maps the ids found in a log to the [`Descriptor`]s of the
//! instrumentation points which emitted them. It is compiled once from a
//! specification text with one [`Descriptor`] per line and is read-only
//! afterwards.
//!
//! Ids are resolved in one of three [`Scope`]s:
//! * a single global table with one shared id width,
//! * one local table per function, each with its own id width, consulted
//!   in the context of the function currently executing, and
//! * the anonymous point scope, which only signals a return.

pub mod descriptor;
pub mod error;


use core::fmt;
use core::str::FromStr;
use std::collections::{BTreeMap, BTreeSet};
use std::io::BufRead;

pub use descriptor::{Branch, Descriptor, Kind, Scope};
pub use error::{Error, LoadError, LookupError, ParseError};

/// Default width of point tokens
pub const POINT_WIDTH: u8 = 1;

/// Determine the minimal id width for the given number of ids
///
/// The result is at least one bit, even for a single id.
pub fn id_width(count: usize) -> u8 {
    count.next_power_of_two().trailing_zeros().max(1) as u8
}

/// Ids local to a single function
#[derive(Clone, Debug)]
struct Local {
    width: u8,
    tokens: BTreeMap<u64, Descriptor>,
}

/// Token table
///
/// # Example
///
/// ```
/// use rlis_trace::table::{Scope, Table};
///
/// let table: Table = "
///     header entry global 0 1
///     footer entry point 0 1
///     call entry local leaf 0 1
///     footer leaf point 0 1
/// "
/// .parse()
/// .unwrap();
///
/// let call = table.lookup(Scope::Local, 0, Some("entry")).unwrap();
/// assert_eq!(call.target(), Some("leaf"));
/// assert!(table.has_point_footer("leaf"));
/// ```
#[derive(Clone, Debug)]
pub struct Table {
    global: BTreeMap<u64, Descriptor>,
    global_width: Option<u8>,
    local: BTreeMap<String, Local>,
    points: Vec<Descriptor>,
    point_footers: BTreeSet<String>,
    point: Descriptor,
}

impl Default for Table {
    fn default() -> Self {
        Self {
            global: Default::default(),
            global_width: None,
            local: Default::default(),
            points: Default::default(),
            point_footers: Default::default(),
            point: Descriptor::point(POINT_WIDTH),
        }
    }
}

impl Table {
    /// Create a new, empty table
    pub fn new() -> Self {
        Default::default()
    }

    /// Compile a table from a specification text
    ///
    /// Empty lines and lines starting with `#` are ignored.
    pub fn parse(text: &str) -> Result<Self, LoadError> {
        let mut table = Self::new();
        text.lines()
            .enumerate()
            .try_for_each(|(n, l)| table.insert_line(n + 1, l))?;
        table.report_widths();
        Ok(table)
    }

    /// Compile a table from a specification read from `reader`
    pub fn from_reader(reader: impl BufRead) -> Result<Self, LoadError> {
        let mut table = Self::new();
        for (n, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| LoadError {
                line: n + 1,
                error: Error::Io(e.kind()),
            })?;
            table.insert_line(n + 1, &line)?;
        }
        table.report_widths();
        Ok(table)
    }

    /// Add an instrumentation point
    ///
    /// Descriptors occupying a range of ids are expanded into one entry per
    /// id. If an error is returned, the table is left unaltered.
    pub fn insert(&mut self, descriptor: Descriptor) -> Result<(), Error> {
        let width = descriptor.width();
        if width > 64 {
            return Err(Error::WidthTooLarge(width));
        }
        if let Kind::Watch { width, .. } = descriptor.kind() {
            if *width > 64 {
                return Err(Error::WidthTooLarge(*width));
            }
        }

        match descriptor.scope() {
            Scope::Global => {
                check_width(self.global_width, Scope::Global, None, width)?;
                check_ids(&self.global, &descriptor, None)?;
                self.global_width = Some(width);
                self.global
                    .extend(descriptor.expand().filter_map(|d| Some((d.id()?, d))));
            }
            Scope::Local => {
                let function = descriptor.function().unwrap_or_default().to_owned();
                let local = self.local.get(&function);
                check_width(local.map(|l| l.width), Scope::Local, Some(&function), width)?;
                if let Some(local) = local {
                    check_ids(&local.tokens, &descriptor, Some(&function))?;
                } else {
                    check_ids(&Default::default(), &descriptor, Some(&function))?;
                }
                let local = self.local.entry(function).or_insert(Local {
                    width,
                    tokens: Default::default(),
                });
                local
                    .tokens
                    .extend(descriptor.expand().filter_map(|d| Some((d.id()?, d))));
            }
            Scope::Point => {
                if width == 0 {
                    return Err(Error::ZeroPointWidth);
                }
                let declared = self.points.first().map(Descriptor::width);
                check_width(declared, Scope::Point, None, width)?;
                self.point = Descriptor::point(width);
                if descriptor.kind() == &Kind::Footer {
                    if let Some(function) = descriptor.function() {
                        self.point_footers.insert(function.into());
                    }
                }
                self.points.push(descriptor);
            }
        }
        Ok(())
    }

    /// Look up the instrumentation point for an id
    ///
    /// Local ids are resolved in the given `context`, i.e. in the local table
    /// of the function with that name. Any id in the [`Scope::Point`] resolves
    /// to the generic point descriptor.
    pub fn lookup(
        &self,
        scope: Scope,
        id: u64,
        context: Option<&str>,
    ) -> Result<&Descriptor, LookupError> {
        match scope {
            Scope::Point => Ok(&self.point),
            Scope::Global if self.global_width.is_none() => Err(LookupError::NoGlobalScope),
            Scope::Global => self.global.get(&id).ok_or(LookupError::UnknownGlobal(id)),
            Scope::Local => {
                let function = context.ok_or(LookupError::NoContext)?;
                let local = self
                    .local
                    .get(function)
                    .ok_or_else(|| LookupError::UnknownContext(function.into()))?;
                local.tokens.get(&id).ok_or_else(|| LookupError::UnknownLocal {
                    function: function.into(),
                    id,
                })
            }
        }
    }

    /// Check whether a function signals its return through a point token
    pub fn has_point_footer(&self, function: &str) -> bool {
        self.point_footers.contains(function)
    }

    /// Retrieve the width of global ids
    ///
    /// Returns [`None`] if no global ids are defined.
    pub fn global_width(&self) -> Option<u8> {
        self.global_width
    }

    /// Retrieve the width of the local ids of a function
    ///
    /// Returns [`None`] if the function defines no local ids.
    pub fn local_width(&self, function: &str) -> Option<u8> {
        self.local.get(function).map(|l| l.width)
    }

    /// Retrieve the width of point tokens
    pub fn point_width(&self) -> u8 {
        self.point.width()
    }

    /// Retrieve the generic point descriptor
    pub fn point(&self) -> &Descriptor {
        &self.point
    }

    /// Retrieve all global instrumentation points, ordered by id
    pub fn globals(&self) -> impl Iterator<Item = &Descriptor> {
        self.global.values()
    }

    /// Retrieve the local instrumentation points of a function, ordered by id
    pub fn locals(&self, function: &str) -> impl Iterator<Item = &Descriptor> {
        self.local.get(function).into_iter().flat_map(|l| l.tokens.values())
    }

    /// Retrieve the names of all functions with local ids
    pub fn contexts(&self) -> impl Iterator<Item = &str> {
        self.local.keys().map(String::as_str)
    }

    /// Parse and insert a single specification line
    fn insert_line(&mut self, line: usize, text: &str) -> Result<(), LoadError> {
        let text = text.trim();
        if text.is_empty() || text.starts_with('#') {
            return Ok(());
        }
        text.parse()
            .map_err(Error::from)
            .and_then(|d| self.insert(d))
            .map_err(|error| LoadError { line, error })
    }

    /// Log id widths which are wider than necessary
    fn report_widths(&self) {
        if let Some(width) = self.global_width {
            let needed = id_width(self.global.len());
            if width > needed {
                log::debug!("Global ids use {width} bits where {needed} would suffice");
            }
        }
        for (function, local) in &self.local {
            let needed = id_width(local.tokens.len());
            if local.width > needed {
                log::debug!(
                    "Local ids of {function} use {} bits where {needed} would suffice",
                    local.width,
                );
            }
        }
    }
}

impl FromStr for Table {
    type Err = LoadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.points.is_empty() {
            writeln!(f, "---- Point tokens (width {}) ----", self.point_width())?;
            self.points.iter().try_for_each(|d| writeln!(f, "{d}"))?;
        }
        if let Some(width) = self.global_width {
            writeln!(f, "---- Global tokens (width {width}) ----")?;
            self.globals().try_for_each(|d| writeln!(f, "{d}"))?;
        }
        for (function, local) in &self.local {
            writeln!(f, "---- Local tokens of {function} (width {}) ----", local.width)?;
            local.tokens.values().try_for_each(|d| writeln!(f, "{d}"))?;
        }
        Ok(())
    }
}

/// Check that `width` matches the width already declared for a scope
fn check_width(
    declared: Option<u8>,
    scope: Scope,
    function: Option<&str>,
    width: u8,
) -> Result<(), Error> {
    match declared {
        Some(expected) if expected != width => Err(Error::InconsistentWidth {
            scope,
            function: function.map(Into::into),
            expected,
            found: width,
        }),
        _ => Ok(()),
    }
}

/// Check that all ids occupied by `descriptor` are free and representable
fn check_ids(
    taken: &BTreeMap<u64, Descriptor>,
    descriptor: &Descriptor,
    function: Option<&str>,
) -> Result<(), Error> {
    let Some(first) = descriptor.id() else {
        return Ok(());
    };
    let width = descriptor.width();
    let last = first
        .checked_add(descriptor.range() - 1)
        .ok_or(Error::IdOutOfRange { id: first, width })?;
    if width < 64 && last >> width != 0 {
        return Err(Error::IdOutOfRange { id: last, width });
    }
    match taken.range(first..=last).next() {
        Some((id, _)) => Err(Error::DuplicateId {
            scope: descriptor.scope(),
            function: function.map(Into::into),
            id: *id,
        }),
        None => Ok(()),
    }
}
