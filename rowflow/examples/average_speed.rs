//! Average traffic speed in km/h per (weekday, hour), from two
//! line-delimited JSON inputs: per-edge travel times and per-edge
//! coordinates.
//!
//! ```sh
//! cargo run --example average_speed -- travel_time.jsonl edge_length.jsonl output.jsonl
//! ```

use anyhow::{Context, Result};
use rowflow::*;

use std::env;
use std::fs::File;
use std::io::{BufWriter, Write};

const TIME_FORMAT: &str = "%Y%m%dT%H%M%S%.6f";

fn main() -> Result<()> {
    env_logger::init();
    let mut args = env::args().skip(1);
    let usage = "usage: average_speed <travel_time.jsonl> <edge_length.jsonl> <output.jsonl>";
    let times_path = args.next().context(usage)?;
    let lengths_path = args.next().context(usage)?;
    let output = args.next().context(usage)?;

    let times = Graph::from_file(times_path, |line| Ok(Row::from_json(line)?))
        .map(CalculateTime::new("enter_time", TIME_FORMAT, "weekday", "hour"))
        .sort(&["edge_id"]);
    let lengths = Graph::from_file(lengths_path, |line| Ok(Row::from_json(line)?))
        .map(CalculateLength::new("start", "end", "length"))
        .sort(&["edge_id"]);
    let speeds = times
        .join(InnerJoiner::new(), &lengths, &["edge_id"])
        .sort(&["weekday", "hour"])
        .reduce(
            CalculateSpeed::new("length", "enter_time", "leave_time", TIME_FORMAT, "speed"),
            &["weekday", "hour"],
        );

    let mut out = BufWriter::new(File::create(&output)?);
    for row in speeds.run(&SourceBindings::new())? {
        writeln!(out, "{}", row?.to_json()?)?;
    }
    Ok(())
}
