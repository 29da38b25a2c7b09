// Copyright (C) 2026 FZI Forschungszentrum Informatik
// SPDX-License-Identifier: Apache-2.0
use super::*;

use crate::unit::Unit;

fn unit(sequence: u8, payload: &[u8], bits: usize, timestamp: f64) -> Entry {
    Entry::Unit(Unit::new(1, sequence, payload.to_vec(), bits).with_timestamp(timestamp))
}

#[test]
fn concatenates_units() {
    let entries = [unit(0, b"\xa0", 3, 1.0), unit(1, b"\xff", 2, 2.0)];
    let stream = ChunkStream::new(&entries, 0.0);
    assert_eq!(stream.chunk_count(), 1);
    assert_eq!(stream.chunk_len(0), Some(5));

    let mut reader = stream.reader();
    assert_eq!(reader.peek(5), Ok(0b10111));
    assert_eq!(reader.read(2), Ok(0b10));
    assert_eq!(reader.cursor(), Cursor { chunk: 0, bit: 2 });
    assert_eq!(reader.read(3), Ok(0b111));
    assert_eq!(reader.bits_left(), 0);
}

#[test]
fn gaps_split_chunks() {
    let entries = [
        unit(0, b"\xf0", 4, 1.0),
        Entry::Gap,
        unit(5, b"\x0f", 8, 2.0),
    ];
    let stream = ChunkStream::new(&entries, 0.0);
    assert_eq!(stream.chunk_count(), 2);

    let mut reader = stream.reader();
    assert_eq!(reader.read(4), Ok(0xf));
    assert_eq!(reader.peek(1), Err(Boundary::DataMissing));
    assert!(reader.advance_chunk());
    assert_eq!(reader.read(8), Ok(0x0f));
    assert_eq!(reader.peek(1), Err(Boundary::DataEnd));
    assert!(!reader.advance_chunk());
    assert_eq!(reader.peek(0), Err(Boundary::DataEnd));
}

#[test]
fn empty_units_produce_no_chunk() {
    let entries = [
        unit(0, b"", 0, 1.0),
        Entry::Gap,
        unit(3, b"\x80", 1, 2.0),
        Entry::Gap,
        unit(9, b"", 0, 3.0),
    ];
    let stream = ChunkStream::new(&entries, 0.0);
    assert_eq!(stream.chunk_count(), 1);
    assert_eq!(stream.reader().read_time().time, Some(2.0));
}

#[test]
fn empty_stream() {
    let stream = ChunkStream::new(&Vec::<Entry>::new(), 0.0);
    assert!(stream.is_empty());
    let reader = stream.reader();
    assert_eq!(reader.peek(2), Err(Boundary::DataEnd));
    assert_eq!(reader.read_time(), Stamp { time: None, offset: 0 });
}

#[test]
fn skip_and_copy() {
    let entries = [unit(0, b"\x5a", 8, 0.0)];
    let stream = ChunkStream::new(&entries, 0.0);
    let reader = stream.reader();

    let mut probe = reader;
    assert_eq!(probe.skip(4), Ok(()));
    assert_eq!(probe.read(4), Ok(0xa));
    assert_eq!(probe.skip(1), Err(Boundary::DataEnd));

    // The original reader is unaffected
    assert_eq!(reader.cursor(), Cursor::default());
    assert_eq!(reader.peek(4), Ok(0x5));
}

#[test]
fn wide_reads() {
    let entries = [unit(0, b"\xff\x00\xff\x00\xff\x00\xff\x00\x80", 65, 0.0)];
    let stream = ChunkStream::new(&entries, 0.0);
    let mut reader = stream.reader();
    assert_eq!(reader.read(1), Ok(1));
    assert_eq!(reader.read(64), Ok(0xfe01_fe01_fe01_fe01));
}

#[test]
fn time_index() {
    let entries = [
        unit(0, b"\x00", 8, 10.0),
        unit(1, b"\x00", 4, 10.5),
        Entry::Gap,
        unit(7, b"\x00", 8, 12.0),
    ];
    let stream = ChunkStream::new(&entries, 9.0);
    let mut reader = stream.reader();

    assert_eq!(reader.read_time(), Stamp { time: Some(1.0), offset: 0 });
    reader.skip(7).unwrap();
    assert_eq!(reader.read_time(), Stamp { time: Some(1.0), offset: 7 });
    reader.skip(1).unwrap();
    assert_eq!(reader.read_time(), Stamp { time: Some(1.5), offset: 0 });
    reader.skip(3).unwrap();
    assert_eq!(reader.read_time(), Stamp { time: Some(1.5), offset: 3 });

    assert!(reader.advance_chunk());
    reader.skip(2).unwrap();
    assert_eq!(reader.read_time(), Stamp { time: Some(3.0), offset: 2 });
}

#[test]
fn missing_timestamp() {
    let entries = [Entry::Unit(Unit::new(1, 0, vec![0], 8))];
    let stream = ChunkStream::new(&entries, 5.0);
    assert_eq!(stream.reader().read_time(), Stamp { time: None, offset: 0 });
}
