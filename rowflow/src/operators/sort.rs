use tempfile::NamedTempFile;

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Lines, Write};
use std::path::PathBuf;

use crate::error::FlowError;
use crate::row::{Row, Value};

use super::RowStream;

/// Tuning knobs for the external sort.
#[derive(Clone, Debug)]
pub struct SortOptions {
    /// How many rows to buffer before a run is spilled to disk.
    pub max_rows_in_memory: usize,
    /// Where spill files live; the OS temp dir when unset.
    pub spill_dir: Option<PathBuf>,
}

impl Default for SortOptions {
    fn default() -> Self {
        Self {
            max_rows_in_memory: 100_000,
            spill_dir: None,
        }
    }
}

/// Stable ascending sort by a key, spilling sorted runs to disk when the
/// input outgrows the in-memory buffer.
///
/// The upstream is not touched until the first output row is pulled.
/// Spill files are uniquely named temp files that disappear when the
/// stream is dropped, whether drained or abandoned.
pub(crate) struct SortStream {
    keys: Vec<String>,
    options: SortOptions,
    state: State,
}

enum State {
    Pending(RowStream),
    Memory(std::vec::IntoIter<Row>),
    Merging(Merge),
    Done,
}

impl SortStream {
    pub fn new(keys: Vec<String>, options: SortOptions, upstream: RowStream) -> Self {
        Self {
            keys,
            options,
            state: State::Pending(upstream),
        }
    }

    fn build(&mut self, upstream: RowStream) -> Result<State, FlowError> {
        let mut buffer: Vec<Row> = Vec::new();
        let mut runs: Vec<NamedTempFile> = Vec::new();
        for item in upstream {
            buffer.push(item?);
            if buffer.len() >= self.options.max_rows_in_memory {
                runs.push(self.spill(std::mem::take(&mut buffer))?);
            }
        }
        let tail = sorted(buffer, &self.keys)?;
        if runs.is_empty() {
            return Ok(State::Memory(tail.into_iter()));
        }
        debug!(
            "merging {} spilled runs and {} buffered rows",
            runs.len(),
            tail.len()
        );
        Ok(State::Merging(Merge::open(runs, tail, self.keys.clone())?))
    }

    fn spill(&self, rows: Vec<Row>) -> Result<NamedTempFile, FlowError> {
        let rows = sorted(rows, &self.keys)?;
        let dir = match &self.options.spill_dir {
            Some(dir) => dir.clone(),
            None => std::env::temp_dir(),
        };
        let mut file = tempfile::Builder::new()
            .prefix("rowflow-sort-")
            .suffix(".jsonl")
            .tempfile_in(dir)
            .map_err(FlowError::SortIo)?;
        {
            let mut writer = BufWriter::new(file.as_file_mut());
            for row in &rows {
                serde_json::to_writer(&mut writer, row)
                    .map_err(|error| FlowError::SortIo(error.into()))?;
                writer.write_all(b"\n").map_err(FlowError::SortIo)?;
            }
            writer.flush().map_err(FlowError::SortIo)?;
        }
        debug!("spilled run of {} rows to {:?}", rows.len(), file.path());
        Ok(file)
    }
}

/// Stable sort of one run: equal keys keep their input order.
fn sorted(rows: Vec<Row>, keys: &[String]) -> Result<Vec<Row>, FlowError> {
    let mut keyed = rows
        .into_iter()
        .map(|row| Ok((row.key_projection(keys)?, row)))
        .collect::<Result<Vec<_>, FlowError>>()?;
    keyed.sort_by(|(a, _), (b, _)| a.cmp(b));
    Ok(keyed.into_iter().map(|(_, row)| row).collect())
}

impl Iterator for SortStream {
    type Item = Result<Row, FlowError>;

    fn next(&mut self) -> Option<Self::Item> {
        if let State::Pending(_) = self.state {
            let upstream = match std::mem::replace(&mut self.state, State::Done) {
                State::Pending(upstream) => upstream,
                _ => return None,
            };
            match self.build(upstream) {
                Ok(state) => self.state = state,
                Err(error) => return Some(Err(error)),
            }
        }
        match &mut self.state {
            State::Done | State::Pending(_) => None,
            State::Memory(rows) => rows.next().map(Ok),
            State::Merging(merge) => match merge.next_row() {
                Ok(Some(row)) => Some(Ok(row)),
                Ok(None) => {
                    self.state = State::Done;
                    None
                }
                Err(error) => {
                    self.state = State::Done;
                    Some(Err(error))
                }
            },
        }
    }
}

/// One sorted run being merged: either a spill file read back line by
/// line, or the in-memory tail of the input.
enum Run {
    File(Lines<BufReader<File>>),
    Memory(std::vec::IntoIter<Row>),
}

impl Run {
    fn next_row(&mut self) -> Result<Option<Row>, FlowError> {
        match self {
            Run::Memory(rows) => Ok(rows.next()),
            Run::File(lines) => match lines.next() {
                None => Ok(None),
                Some(Err(error)) => Err(FlowError::SortIo(error)),
                Some(Ok(line)) => serde_json::from_str(&line)
                    .map(Some)
                    .map_err(|error| FlowError::SortIo(error.into())),
            },
        }
    }
}

struct Entry {
    key: Vec<Value>,
    run: usize,
    row: Row,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        // run index breaks key ties so the merge stays stable
        self.key.cmp(&other.key).then(self.run.cmp(&other.run))
    }
}

/// K-way merge of sorted runs through a min-heap.
struct Merge {
    runs: Vec<Run>,
    heap: BinaryHeap<Reverse<Entry>>,
    keys: Vec<String>,
    // holding the handles keeps the spill files on disk until drop
    _spills: Vec<NamedTempFile>,
}

impl Merge {
    fn open(spills: Vec<NamedTempFile>, tail: Vec<Row>, keys: Vec<String>) -> Result<Self, FlowError> {
        let mut runs = Vec::with_capacity(spills.len() + 1);
        for spill in &spills {
            let file = spill.reopen().map_err(FlowError::SortIo)?;
            runs.push(Run::File(BufReader::new(file).lines()));
        }
        runs.push(Run::Memory(tail.into_iter()));
        let mut merge = Self {
            runs,
            heap: BinaryHeap::new(),
            keys,
            _spills: spills,
        };
        for run in 0..merge.runs.len() {
            merge.refill(run)?;
        }
        Ok(merge)
    }

    fn refill(&mut self, run: usize) -> Result<(), FlowError> {
        if let Some(row) = self.runs[run].next_row()? {
            let key = row.key_projection(&self.keys)?;
            self.heap.push(Reverse(Entry { key, run, row }));
        }
        Ok(())
    }

    fn next_row(&mut self) -> Result<Option<Row>, FlowError> {
        match self.heap.pop() {
            None => Ok(None),
            Some(Reverse(entry)) => {
                self.refill(entry.run)?;
                Ok(Some(entry.row))
            }
        }
    }
}
