// Copyright (C) 2026 FZI Forschungszentrum Informatik
// SPDX-License-Identifier: Apache-2.0
use super::*;

use crate::table::{Descriptor, Scope};

const SPEC: &str = "
    header entry global 0 2
    footer entry point 0 1
    call entry local leaf 0 2
    call entry local printf 1 2
    conditional entry local 1 x 2 2 2
    watch entry global temp 8 1 2
    footer leaf point 0 1
";

fn token<'t>(descriptor: &'t Descriptor, value: Option<u64>) -> Event<'t> {
    Event::Token(Token {
        descriptor,
        value,
        stamp: Default::default(),
    })
}

fn invocation(function: &str, serial: usize) -> Label {
    Label::Invocation {
        function: function.into(),
        serial,
    }
}

struct Fixture {
    table: Table,
}

impl Fixture {
    fn new() -> Self {
        Self {
            table: SPEC.parse().unwrap(),
        }
    }

    fn header(&self) -> Event<'_> {
        token(self.table.lookup(Scope::Global, 0, None).unwrap(), None)
    }

    fn local(&self, id: u64) -> Event<'_> {
        token(
            self.table.lookup(Scope::Local, id, Some("entry")).unwrap(),
            None,
        )
    }

    fn watch(&self, value: u64) -> Event<'_> {
        token(
            self.table.lookup(Scope::Global, 1, None).unwrap(),
            Some(value),
        )
    }

    fn point(&self) -> Event<'_> {
        token(self.table.point(), None)
    }
}

#[test]
fn entry_and_leaf() {
    let fixture = Fixture::new();
    let events = [
        fixture.header(),
        fixture.local(0),
        fixture.point(),
        fixture.point(),
    ];
    let mut builder = Builder::new(&fixture.table);
    let mut currents = Vec::new();
    events.iter().for_each(|e| {
        builder.push(e);
        currents.push(builder.current());
    });
    assert_eq!(currents, [1, 2, 1, CallTree::ROOT]);

    let tree = builder.finish();
    assert_eq!(tree.len(), 3);
    assert_eq!(tree.max_depth(), 2);
    assert_eq!(tree.get(1).map(Node::label), Some(&invocation("entry", 0)));
    assert_eq!(tree.get(2).map(Node::label), Some(&invocation("leaf", 1)));
    assert_eq!(tree.get(2).and_then(Node::parent), Some(1));
    assert_eq!(tree.depth(2), 2);
    assert_eq!(tree.depth(CallTree::ROOT), 0);
}

#[test]
fn leaves() {
    let fixture = Fixture::new();
    let events = [
        fixture.header(),
        fixture.local(1),
        fixture.local(3),
        fixture.watch(42),
        fixture.point(),
    ];
    let tree = CallTree::build(&fixture.table, &events);
    let entry = tree.find(&invocation("entry", 0)).unwrap();
    let labels: Vec<_> = tree
        .get(entry)
        .unwrap()
        .children()
        .iter()
        .filter_map(|c| tree.get(*c))
        .map(Node::label)
        .cloned()
        .collect();
    assert_eq!(
        labels,
        [
            invocation("printf", 1),
            Label::Branch {
                id: 3,
                range: 2,
                serial: 2
            },
            Label::Watch {
                variable: "temp".into(),
                id: 1,
                value: 42,
                serial: 3
            },
        ]
    );
    assert_eq!(tree.max_depth(), 2);
}

#[test]
fn unique_labels() {
    let fixture = Fixture::new();
    let events = [
        fixture.header(),
        fixture.point(),
        fixture.header(),
        fixture.point(),
    ];
    let tree = CallTree::build(&fixture.table, &events);
    assert_eq!(tree.get(CallTree::ROOT).unwrap().children(), [1, 2]);
    assert_eq!(tree.find(&invocation("entry", 0)), Some(1));
    assert_eq!(tree.find(&invocation("entry", 1)), Some(2));
}

#[test]
fn boundary_resets_to_root() {
    let fixture = Fixture::new();
    let events = [
        fixture.header(),
        fixture.local(0),
        Event::ChunkBoundary,
        fixture.point(),
        fixture.header(),
    ];
    let mut builder = Builder::new(&fixture.table);
    events.iter().for_each(|e| builder.push(e));
    assert_eq!(builder.current(), 3);

    let tree = builder.tree();
    assert_eq!(tree.get(3).and_then(Node::parent), Some(CallTree::ROOT));
    assert_eq!(tree.get(CallTree::ROOT).unwrap().children(), [1, 3]);
}

#[test]
fn return_at_root() {
    let fixture = Fixture::new();
    let mut builder = Builder::new(&fixture.table);
    builder.push(&fixture.point());
    assert_eq!(builder.current(), CallTree::ROOT);
    assert!(builder.finish().is_empty());
}

#[test]
fn graphviz() {
    let fixture = Fixture::new();
    let events = [fixture.header(), fixture.local(0)];
    let tree = CallTree::build(&fixture.table, &events);
    assert_eq!(
        tree.to_string(),
        "digraph trace {\n    \"root\";\n    \"root\" -> \"entry_0\";\n    \"entry_0\";\n    \
        \"entry_0\" -> \"leaf_1\";\n    \"leaf_1\";\n}\n"
    );
}
