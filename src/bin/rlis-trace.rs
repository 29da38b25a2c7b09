// Copyright (C) 2026 FZI Forschungszentrum Informatik
// SPDX-License-Identifier: Apache-2.0
//! Decoder for captured bitlog traces
//!
//!     Usage: rlis-trace [OPTIONS] <spec> <capture>
//!
//! This program decodes the instrumentation logs contained in a capture file.
//! The tokens are resolved using the specification file the instrumented
//! program was generated from. Optionally, decoder parameters may be supplied
//! in the form of a TOML file.
//!
//! By default, every source found in the capture is decoded and printed as a
//! listing to stdout. With `--packets`, the sequenced units are printed
//! instead. With `--tree`, the call tree is printed as a Graphviz digraph.
//! Chunk diagnostics are logged to stderr; run with `-d` or the environment
//! variable `DEBUG` set to `1` to see them all.

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use anyhow::{Context, bail};

use rlis_trace::capture::{self, Format};
use rlis_trace::config::Parameters;
use rlis_trace::listing::Listing;
use rlis_trace::table::Table;
use rlis_trace::tree::CallTree;
use rlis_trace::{decoder, sequence};

fn main() -> anyhow::Result<()> {
    let matches = clap::Command::new("RLIS trace decoder")
        .arg(
            clap::arg!(<spec> "Path to the instrumentation specification")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            clap::arg!(<capture> "Path to the capture file")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            clap::arg!(-f --format <FORMAT> "Framing of the captured packets")
                .value_parser(["network", "system"])
                .default_value("network"),
        )
        .arg(
            clap::arg!(-p --params <FILE> "Decoder parameters")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(clap::arg!(--packets "Print the sequenced units instead of decoding them"))
        .arg(clap::arg!(--tree "Print the call tree instead of a listing"))
        .arg(
            clap::arg!(--node <ID> "Only process the given source")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            clap::arg!(-d --debug "Enable additional debug output")
                .env("DEBUG")
                .action(clap::ArgAction::SetTrue)
                .value_parser(clap::builder::FalseyValueParser::new()),
        )
        .get_matches();

    let level = if matches.get_flag("debug") {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Warn
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    // We need the specification to make sense of the tokens ...
    let spec = matches
        .get_one::<PathBuf>("spec")
        .context("No specification specified")?;
    let file = File::open(spec)
        .with_context(|| format!("Could not open specification '{}'", spec.display()))?;
    let table = Table::from_reader(BufReader::new(file))
        .with_context(|| format!("Could not load specification '{}'", spec.display()))?;
    log::debug!("Token table:\n{table}");

    // ... and the capture containing them.
    let format: Format = matches
        .get_one::<String>("format")
        .map(|f| f.parse())
        .transpose()?
        .unwrap_or_default();
    let path = matches
        .get_one::<PathBuf>("capture")
        .context("No capture specified")?;
    let file = File::open(path)
        .with_context(|| format!("Could not open capture '{}'", path.display()))?;
    let packets = capture::read_packets(BufReader::new(file), format)
        .with_context(|| format!("Could not parse capture '{}'", path.display()))?;

    let params: Parameters = matches
        .get_one::<PathBuf>("params")
        .map(|p| -> anyhow::Result<_> {
            let params = std::fs::read_to_string(p).context("Could not load parameters")?;
            toml::from_str(&params).context("Could not parse parameters")
        })
        .transpose()?
        .unwrap_or_default();
    log::debug!("Parameters: {params:?}");

    let units = capture::bitlog_units(&packets);
    log::info!("Read {} packets, {} bitlog units", packets.len(), units.len());
    let mut traces = sequence::by_source(units);
    let start_time = sequence::start_time(&traces);
    if let Some(node) = matches.get_one::<u16>("node") {
        let Some(entries) = traces.remove(node) else {
            bail!("No data from node {node}");
        };
        traces = [(*node, entries)].into();
    }

    let decoder = decoder::builder().with_params(&params).build(&table);
    for (source, entries) in &traces {
        println!("Trace for node {source}:");
        if matches.get_flag("packets") {
            entries.iter().for_each(|e| println!("{e}"));
            continue;
        }

        let trace = decoder.decode_entries(entries, start_time);
        trace
            .reports
            .iter()
            .filter(|r| r.synced)
            .for_each(|r| log::debug!("Chunk {}: {} tokens", r.chunk, r.tokens));
        log::info!(
            "Node {source}: decoded {} tokens, dropped {} bits",
            trace.tokens().count(),
            trace.dropped_bits(),
        );

        if matches.get_flag("tree") {
            print!("{}", CallTree::build(&table, &trace.events));
        } else {
            print!("{}", Listing::new(&table, &trace.events));
        }
    }

    Ok(())
}
