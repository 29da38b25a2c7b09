// Copyright (C) 2026 FZI Forschungszentrum Informatik
// SPDX-License-Identifier: Apache-2.0
//! Call context tracking

use super::error::Misalignment;

/// Stack of the functions currently executing
///
/// The topmost function is the one local ids are resolved against.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ContextStack<'t> {
    frames: Vec<&'t str>,
}

impl<'t> ContextStack<'t> {
    /// Create a new, empty stack
    pub fn new() -> Self {
        Default::default()
    }

    /// Enter a function
    pub fn push(&mut self, function: &'t str) {
        self.frames.push(function);
    }

    /// Leave the currently executing function
    pub fn pop(&mut self) -> Result<&'t str, Misalignment> {
        self.frames.pop().ok_or(Misalignment::StackUnderflow)
    }

    /// Retrieve the currently executing function
    pub fn top(&self) -> Option<&'t str> {
        self.frames.last().copied()
    }

    /// Get the current nesting depth
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Retrieve the functions executing, outermost first
    pub fn frames(&self) -> &[&'t str] {
        &self.frames
    }
}
