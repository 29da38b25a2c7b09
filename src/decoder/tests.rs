// Copyright (C) 2026 FZI Forschungszentrum Informatik
// SPDX-License-Identifier: Apache-2.0
use super::*;

use crate::unit::Unit;

const SPEC: &str = "
    header entry global 0 1
    footer entry point 0 1
    call entry local leaf 0 1
    footer leaf point 0 1
";

const POINT: &str = "footer * point * 1";
const HEADER: &str = "header entry global 0 1";
const CALL: &str = "call entry local leaf 0 1";

/// Create a unit holding the bits given as `0`s and `1`s
fn unit(sequence: u8, bits: &str) -> Unit {
    let bits: Vec<bool> = bits
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| c == '1')
        .collect();
    let mut payload = vec![0u8; bits.len().div_ceil(8)];
    bits.iter()
        .enumerate()
        .filter(|(_, b)| **b)
        .for_each(|(i, _)| payload[i >> 3] |= 0x80 >> (i & 0x7));
    Unit::new(1, sequence, payload, bits.len())
}

/// Create a stream with one chunk per `/` separated bit string
fn stream(text: &str) -> ChunkStream {
    let entries: Vec<_> = text
        .split('/')
        .enumerate()
        .flat_map(|(i, bits)| [Entry::Gap, Entry::Unit(unit(2 * i as u8, bits))])
        .skip(1)
        .collect();
    ChunkStream::new(&entries, 0.0)
}

fn names(trace: &Trace<'_>) -> Vec<String> {
    trace
        .events
        .iter()
        .map(|e| match e {
            Event::Token(token) => token.descriptor.to_string(),
            Event::ChunkBoundary => "|".into(),
        })
        .collect()
}

macro_rules! decode_test {
    ($n:ident, $s:expr, $b:literal, [$($e:expr),*]) => {
        #[test]
        fn $n() {
            let table: Table = $s.parse().unwrap();
            let trace = builder().build(&table).decode(&stream($b));
            let expected: Vec<String> = vec![$($e.to_string()),*];
            assert_eq!(names(&trace), expected);
        }
    };
}

macro_rules! step_test {
    ($n:ident, $s:expr, $b:literal, $d:expr) => {
        #[test]
        fn $n() {
            let table: Table = $s.parse().unwrap();
            let decoder = builder().build(&table);
            let stream = stream($b);
            let mut reader = stream.reader();
            let step = decoder.decode_one(&mut reader, &mut ContextStack::new());
            assert_eq!(step, $d);
        }
    };
}

step_test!(
    point_without_context,
    SPEC,
    "0",
    Step::Misaligned(Misalignment::StackUnderflow)
);
step_test!(
    local_without_context,
    SPEC,
    "110",
    Step::Misaligned(Misalignment::NoContext)
);
step_test!(
    unknown_global,
    "header a global 0 2",
    "1011",
    Step::Misaligned(Misalignment::Lookup(LookupError::UnknownGlobal(3)))
);
step_test!(
    global_without_globals,
    "call a local b 0 1",
    "100",
    Step::Misaligned(Misalignment::Lookup(LookupError::NoGlobalScope))
);
step_test!(truncated_id, SPEC, "10/100", Step::ChunkBoundary);
step_test!(truncated_prefix, SPEC, "1", Step::StreamEnd);
step_test!(empty, SPEC, "", Step::StreamEnd);

#[test]
fn steps_and_context() {
    let table: Table = SPEC.parse().unwrap();
    let decoder = builder().build(&table);
    let stream = stream("10011000");
    let mut reader = stream.reader();
    let mut stack = ContextStack::new();

    let expected: [(&str, &[&str]); 4] = [
        (HEADER, &["entry"]),
        (CALL, &["entry", "leaf"]),
        (POINT, &["entry"]),
        (POINT, &[]),
    ];
    for (name, frames) in expected {
        let Step::Decoded(token) = decoder.decode_one(&mut reader, &mut stack) else {
            panic!("Expected token {name}");
        };
        assert_eq!(token.descriptor.to_string(), name);
        assert_eq!(token.value, None);
        assert_eq!(stack.frames(), frames);
    }
    assert_eq!(
        decoder.decode_one(&mut reader, &mut stack),
        Step::StreamEnd
    );
    assert!(stack.is_empty());
}

#[test]
fn leaf_call_keeps_context() {
    let table: Table = "
        header main global 0 1
        call main local printf 0 1
    "
    .parse()
    .unwrap();
    let decoder = builder().build(&table);
    let stream = stream("100 110 110");
    let mut reader = stream.reader();
    let mut stack = ContextStack::new();
    (0..3).for_each(|_| {
        assert!(matches!(
            decoder.decode_one(&mut reader, &mut stack),
            Step::Decoded(_)
        ))
    });
    assert_eq!(stack.frames(), ["main"]);
    assert_eq!(stack.top(), Some("main"));
}

#[test]
fn watch_value() {
    let table: Table = "watch entry global temp 8 1 1".parse().unwrap();
    let decoder = builder().build(&table);
    let stream = stream("10 1 00101010");
    let mut reader = stream.reader();
    let Step::Decoded(token) = decoder.decode_one(&mut reader, &mut ContextStack::new()) else {
        panic!("Expected a token");
    };
    assert_eq!(token.value, Some(42));
    assert_eq!(reader.bits_left(), 0);
}

#[test]
fn stamps() {
    let table: Table = SPEC.parse().unwrap();
    let entries = [
        Entry::Unit(unit(0, "1001").with_timestamp(1.0)),
        Entry::Unit(unit(1, "1000").with_timestamp(2.0)),
    ];
    let trace = builder().build(&table).decode_entries(&entries, 0.5);
    let stamps: Vec<_> = trace.tokens().map(|t| t.stamp).collect();
    assert_eq!(
        stamps,
        [
            Stamp { time: Some(0.5), offset: 0 },
            Stamp { time: Some(0.5), offset: 3 },
            Stamp { time: Some(1.5), offset: 2 },
            Stamp { time: Some(1.5), offset: 3 },
        ]
    );
}

#[test]
fn synchronize_after_garbage() {
    let table: Table = SPEC.parse().unwrap();
    let decoder = builder().build(&table);
    let stream = stream("111 10011000");
    assert_eq!(
        decoder.synchronize(stream.reader()),
        Some(sync::Candidate {
            offset: 3,
            tokens: 4,
            score: 1
        })
    );
}

#[test]
fn synchronize_bounded() {
    let table: Table = SPEC.parse().unwrap();
    let params = config::Parameters {
        max_offset: 3,
        ..Default::default()
    };
    let decoder = builder().with_params(&params).build(&table);
    assert_eq!(decoder.synchronize(stream("111 10011000").reader()), None);
}

#[test]
fn nesting_penalty() {
    let table: Table = "
        header a global 0 1
        header b global 1 1
        footer a point 0 1
        footer b point 0 1
    "
    .parse()
    .unwrap();
    let stream = stream("100 101 0 0");

    let decoder = builder().build(&table);
    let best = decoder.synchronize(stream.reader());
    assert_eq!(best.map(|c| (c.offset, c.score)), Some((5, -4)));

    let params = config::Parameters {
        nesting_penalty: 0,
        ..Default::default()
    };
    let decoder = builder().with_params(&params).build(&table);
    let best = decoder.synchronize(stream.reader());
    assert_eq!(best.map(|c| (c.offset, c.score)), Some((0, 4)));
}

#[test]
fn reports() {
    let table: Table = SPEC.parse().unwrap();
    let trace = builder()
        .build(&table)
        .decode(&stream("10011000/0000/111 10011000"));
    assert_eq!(
        trace.reports,
        [
            ChunkReport {
                chunk: 0,
                dropped_bits: 0,
                synced: true,
                tokens: 4
            },
            ChunkReport {
                chunk: 1,
                dropped_bits: 4,
                synced: false,
                tokens: 0
            },
            ChunkReport {
                chunk: 2,
                dropped_bits: 3,
                synced: true,
                tokens: 4
            },
        ]
    );
    assert_eq!(trace.dropped_bits(), 7);
}

decode_test!(
    single_chunk,
    SPEC,
    "10011000",
    [HEADER, CALL, POINT, POINT]
);
decode_test!(
    boundary_between_chunks,
    SPEC,
    "1001/1000",
    [HEADER, "|", HEADER, POINT]
);
decode_test!(
    no_leading_boundary,
    SPEC,
    "0000/1000",
    [HEADER, POINT]
);
decode_test!(
    single_boundary_after_lost_chunk,
    SPEC,
    "1000/0000/1000",
    [HEADER, POINT, "|", HEADER, POINT]
);
decode_test!(
    partial_token_at_chunk_end,
    SPEC,
    "10011/1000",
    [HEADER, CALL, "|", HEADER, POINT]
);
decode_test!(empty_stream, SPEC, "", []);
