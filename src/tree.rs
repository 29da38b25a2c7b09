// Copyright (C) 2026 FZI Forschungszentrum Informatik
// SPDX-License-Identifier: Apache-2.0
//! Call tree reconstruction
//!
//! A [`CallTree`] holds one node per dynamic occurrence of a function body,
//! branch or watch event. It is built by replaying decoded [`Event`]s through
//! a [`Builder`].

use core::fmt;

use crate::decoder::{Event, Token};
use crate::table::{Kind, Table};

/// Index of a [`Node`] within its [`CallTree`]
pub type NodeId = usize;

/// Identity of a [`Node`]
///
/// Every label but the root's carries a serial number which is unique across
/// the entire tree. Repeated occurrences of the same instrumentation point
/// thus result in distinct labels.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Label {
    Root,
    /// Execution of a function body
    Invocation { function: String, serial: usize },
    /// A branch taken
    Branch { id: u64, range: u64, serial: usize },
    /// A variable snapshot
    Watch {
        variable: String,
        id: u64,
        value: u64,
        serial: usize,
    },
}

impl Label {
    /// Retrieve the serial number, if any
    pub fn serial(&self) -> Option<usize> {
        match self {
            Self::Root => None,
            Self::Invocation { serial, .. } => Some(*serial),
            Self::Branch { serial, .. } => Some(*serial),
            Self::Watch { serial, .. } => Some(*serial),
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Root => write!(f, "root"),
            Self::Invocation { function, serial } => write!(f, "{function}_{serial}"),
            Self::Branch { id, range, serial } => write!(f, "branch_{id}_of_{range}_{serial}"),
            Self::Watch {
                variable,
                id,
                value,
                serial,
            } => write!(f, "{variable}_{id}_is_{value}_{serial}"),
        }
    }
}

/// Node of a [`CallTree`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Node {
    label: Label,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    pub fn label(&self) -> &Label {
        &self.label
    }

    /// Retrieve the parent node, which is [`None`] only for the root
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Retrieve all children, in the order they were added
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// Tree of dynamic invocations
///
/// Rendering a tree via [`Display`][fmt::Display] yields a Graphviz digraph.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallTree {
    nodes: Vec<Node>,
}

impl Default for CallTree {
    fn default() -> Self {
        Self {
            nodes: vec![Node {
                label: Label::Root,
                parent: None,
                children: Vec::new(),
            }],
        }
    }
}

impl CallTree {
    /// Id of the root node
    pub const ROOT: NodeId = 0;

    /// Create a tree by replaying the given events
    pub fn build<'e, 't: 'e>(
        table: &Table,
        events: impl IntoIterator<Item = &'e Event<'t>>,
    ) -> Self {
        let mut builder = Builder::new(table);
        events.into_iter().for_each(|e| builder.push(e));
        builder.finish()
    }

    /// Retrieve a node
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Retrieve the number of nodes, including the root
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check whether the tree consists of the root only
    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    /// Retrieve all nodes with their ids, in creation order
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter().enumerate()
    }

    /// Retrieve the number of edges between a node and the root
    pub fn depth(&self, id: NodeId) -> usize {
        core::iter::successors(self.get(id).and_then(Node::parent), |p| {
            self.get(*p).and_then(Node::parent)
        })
        .count()
    }

    /// Retrieve the depth of the deepest node
    pub fn max_depth(&self) -> usize {
        (0..self.len()).map(|i| self.depth(i)).max().unwrap_or_default()
    }

    /// Find the node with the given label
    pub fn find(&self, label: &Label) -> Option<NodeId> {
        self.nodes.iter().position(|n| n.label == *label)
    }

    fn add_child(&mut self, parent: NodeId, label: Label) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(Node {
            label,
            parent: Some(parent),
            children: Vec::new(),
        });
        if let Some(parent) = self.nodes.get_mut(parent) {
            parent.children.push(id);
        }
        id
    }
}

impl fmt::Display for CallTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "digraph trace {{")?;
        for node in &self.nodes {
            writeln!(f, "    \"{}\";", node.label)?;
            for child in node.children.iter().filter_map(|c| self.get(*c)) {
                writeln!(f, "    \"{}\" -> \"{}\";", node.label, child.label)?;
            }
        }
        writeln!(f, "}}")
    }
}

/// Builder for [`CallTree`]s
///
/// The builder tracks the node currently executing. Headers and calls to
/// functions signalling their return via point tokens descend into a new
/// child node, footers return to the parent. Calls to other functions,
/// branches and watch events add a leaf to the current node. A chunk boundary
/// returns to the root.
#[derive(Clone, Debug)]
pub struct Builder<'a> {
    table: &'a Table,
    tree: CallTree,
    current: NodeId,
    serial: usize,
}

impl<'a> Builder<'a> {
    /// Create a new builder for an empty tree
    pub fn new(table: &'a Table) -> Self {
        Self {
            table,
            tree: Default::default(),
            current: CallTree::ROOT,
            serial: 0,
        }
    }

    /// Replay a single event
    pub fn push(&mut self, event: &Event<'_>) {
        match event {
            Event::Token(token) => self.push_token(token),
            Event::ChunkBoundary => self.current = CallTree::ROOT,
        }
    }

    /// Retrieve the node currently executing
    pub fn current(&self) -> NodeId {
        self.current
    }

    /// Retrieve the tree built so far
    pub fn tree(&self) -> &CallTree {
        &self.tree
    }

    pub fn finish(self) -> CallTree {
        self.tree
    }

    fn push_token(&mut self, token: &Token<'_>) {
        let descriptor = token.descriptor;
        match descriptor.kind() {
            Kind::Footer => match self.tree.get(self.current).and_then(Node::parent) {
                Some(parent) => self.current = parent,
                None => log::warn!("Return at bit {} while at the root", token.stamp.offset),
            },
            Kind::Header => {
                let function = descriptor.function().unwrap_or_default().to_owned();
                self.current = self.add(|serial| Label::Invocation { function, serial });
            }
            Kind::Call { target } => {
                let function = target.clone();
                let child = self.add(|serial| Label::Invocation { function, serial });
                if self.table.has_point_footer(target) {
                    self.current = child;
                }
            }
            Kind::Conditional { range, .. } => {
                let id = descriptor.id().unwrap_or_default();
                let range = *range;
                self.add(|serial| Label::Branch { id, range, serial });
            }
            Kind::Watch { variable, .. } => {
                let variable = variable.clone();
                let id = descriptor.id().unwrap_or_default();
                let value = token.value.unwrap_or_default();
                self.add(|serial| Label::Watch {
                    variable,
                    id,
                    value,
                    serial,
                });
            }
        }
    }

    /// Add a child to the current node
    fn add(&mut self, label: impl FnOnce(usize) -> Label) -> NodeId {
        let label = label(self.serial);
        self.serial += 1;
        self.tree.add_child(self.current, label)
    }
}

#[cfg(test)]
mod tests;
