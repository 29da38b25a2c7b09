// Copyright (C) 2026 FZI Forschungszentrum Informatik
// SPDX-License-Identifier: Apache-2.0
//! Capture file parsing
//!
//! Captures are text files with one packet per line. A line consists of an
//! optional timestamp, recognized by its decimal point, followed by the
//! packet's bytes as whitespace separated hex values. How the bytes are
//! framed depends on the [`Format`] of the capture.
//!
//! Bitlog packets carry log [`Unit`]s in a 20 byte payload:
//!
//! | byte  | content                                   |
//! |-------|-------------------------------------------|
//! | 0     | number of valid bits                      |
//! | 1     | sequence number                           |
//! | 2..4  | source address, least significant first   |
//! | 4..20 | log data                                  |

use core::fmt;
use core::str::FromStr;
use std::io::BufRead;

use crate::unit::Unit;

/// Port (AM handler id) bitlog packets are sent to
pub const BITLOG_PORT: u8 = 7;

/// Length of a bitlog packet's payload
pub const BITLOG_LEN: usize = 20;

/// Address used for both source and destination of system captures
pub const SYSTEM_ADDRESS: u16 = 1;

/// Framing of packets in a capture
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Format {
    /// Active message packets as reported by a TinyOS serial listener
    ///
    /// Each packet consists of a zero byte, destination and source address
    /// (most significant byte first), payload length, group id, handler id
    /// and the payload. The handler id serves as port.
    #[default]
    Network,
    /// Bare bitlog payloads as written by a host program
    System,
}

impl FromStr for Format {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "network" => Ok(Self::Network),
            "system" => Ok(Self::System),
            unknown => Err(Error::UnknownFormat(unknown.into())),
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network => write!(f, "network"),
            Self::System => write!(f, "system"),
        }
    }
}

/// Capture parsing errors
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Error {
    /// The format name is not known
    UnknownFormat(String),
    /// A field is not a hex byte
    BadByte(String),
    /// The leading field looks like, but is not a timestamp
    BadTimestamp(String),
    /// The packet is shorter than its header
    Truncated(usize),
    /// The leading byte of an AM packet is not zero
    NonZeroLead(u8),
    /// The payload length differs from the length declared
    LengthMismatch { declared: usize, actual: usize },
    /// The capture could not be read
    Io(std::io::ErrorKind),
}

impl core::error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownFormat(n) => write!(f, "Unknown capture format '{n}'"),
            Self::BadByte(b) => write!(f, "Invalid hex byte '{b}'"),
            Self::BadTimestamp(t) => write!(f, "Invalid timestamp '{t}'"),
            Self::Truncated(l) => write!(f, "Packet too short: {l} bytes"),
            Self::NonZeroLead(b) => write!(f, "Leading byte is {b:02X}, expected 00"),
            Self::LengthMismatch { declared, actual } => {
                write!(f, "Payload has {actual} bytes but {declared} were declared")
            }
            Self::Io(kind) => write!(f, "Could not read capture: {kind}"),
        }
    }
}

/// An [`Error`] located in a specific line of a capture
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LineError {
    /// Line number, starting at 1
    pub line: usize,
    pub error: Error,
}

impl core::error::Error for LineError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        Some(&self.error)
    }
}

impl fmt::Display for LineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.error)
    }
}

/// A captured packet
#[derive(Clone, Debug, PartialEq)]
pub struct Packet {
    pub dst: u16,
    pub src: u16,
    pub port: u8,
    pub payload: Vec<u8>,
    pub timestamp: Option<f64>,
}

impl Packet {
    /// Parse a single line of a capture
    pub fn parse(line: &str, format: Format) -> Result<Self, Error> {
        let mut fields = line.split_whitespace().peekable();
        let timestamp = fields
            .next_if(|f| f.contains('.'))
            .map(|f| f.parse::<f64>().map_err(|_| Error::BadTimestamp(f.into())))
            .transpose()?;
        let data = fields
            .map(|f| u8::from_str_radix(f, 16).map_err(|_| Error::BadByte(f.into())))
            .collect::<Result<Vec<_>, _>>()?;

        match format {
            Format::Network => {
                let [zero, dst_hi, dst_lo, src_hi, src_lo, len, _group, handler, payload @ ..] =
                    data.as_slice()
                else {
                    return Err(Error::Truncated(data.len()));
                };
                if *zero != 0 {
                    return Err(Error::NonZeroLead(*zero));
                }
                if usize::from(*len) != payload.len() {
                    return Err(Error::LengthMismatch {
                        declared: (*len).into(),
                        actual: payload.len(),
                    });
                }
                Ok(Self {
                    dst: u16::from_be_bytes([*dst_hi, *dst_lo]),
                    src: u16::from_be_bytes([*src_hi, *src_lo]),
                    port: *handler,
                    payload: payload.to_vec(),
                    timestamp,
                })
            }
            Format::System => Ok(Self {
                dst: SYSTEM_ADDRESS,
                src: SYSTEM_ADDRESS,
                port: BITLOG_PORT,
                payload: data,
                timestamp,
            }),
        }
    }

    /// Check whether this packet carries a bitlog [`Unit`]
    pub fn is_bitlog(&self) -> bool {
        self.port == BITLOG_PORT && self.payload.len() == BITLOG_LEN
    }

    /// Extract the bitlog [`Unit`] carried by this packet
    pub fn bitlog(&self) -> Option<Unit> {
        if !self.is_bitlog() {
            return None;
        }
        let [bits, sequence, src_lo, src_hi, data @ ..] = self.payload.as_slice() else {
            return None;
        };
        let source = u16::from_le_bytes([*src_lo, *src_hi]);
        let unit = Unit::new(source, *sequence, data.to_vec(), (*bits).into());
        Some(match self.timestamp {
            Some(timestamp) => unit.with_timestamp(timestamp),
            None => unit,
        })
    }
}

impl fmt::Display for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {} ({}):", self.dst, self.src, self.port)?;
        self.payload.iter().try_for_each(|b| write!(f, " {b:02X}"))
    }
}

/// Parse all packets of a capture
///
/// Empty lines are skipped.
pub fn read_packets(reader: impl BufRead, format: Format) -> Result<Vec<Packet>, LineError> {
    let mut packets = Vec::new();
    for (n, line) in reader.lines().enumerate() {
        let at = |error| LineError { line: n + 1, error };
        let line = line.map_err(|e| at(Error::Io(e.kind())))?;
        if line.trim().is_empty() {
            continue;
        }
        packets.push(Packet::parse(&line, format).map_err(at)?);
    }
    Ok(packets)
}

/// Extract the bitlog [`Unit`]s from packets, ignoring all other packets
pub fn bitlog_units<'p>(packets: impl IntoIterator<Item = &'p Packet>) -> Vec<Unit> {
    packets.into_iter().filter_map(Packet::bitlog).collect()
}
