//! Counts words across the `text` column of a line-delimited JSON file.
//!
//! ```sh
//! cargo run --example word_count -- input.jsonl output.jsonl
//! ```

use anyhow::{Context, Result};
use rowflow::*;

use std::env;
use std::fs::File;
use std::io::{BufWriter, Write};

fn main() -> Result<()> {
    env_logger::init();
    let mut args = env::args().skip(1);
    let usage = "usage: word_count <input.jsonl> <output.jsonl>";
    let input = args.next().context(usage)?;
    let output = args.next().context(usage)?;

    let word_counts = Graph::from_file(input, |line| Ok(Row::from_json(line)?))
        .map(FilterPunctuation::new("text"))
        .map(LowerCase::new("text"))
        .map(Split::new("text"))
        .sort(&["text"])
        .reduce(Count::new("count"), &["text"])
        .sort(&["count", "text"]);

    let mut out = BufWriter::new(File::create(&output)?);
    for row in word_counts.run(&SourceBindings::new())? {
        writeln!(out, "{}", row?.to_json()?)?;
    }
    Ok(())
}
