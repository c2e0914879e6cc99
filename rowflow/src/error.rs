use thiserror::Error;

use std::io;
use std::path::PathBuf;

/// Everything that can abort a pipeline run.
///
/// The engine performs no per-row recovery: the first error terminates the
/// output stream and releases whatever the pipeline held open (source
/// files, sort spills).
#[derive(Debug, Error)]
pub enum FlowError {
    /// A named source was referenced by the graph but not bound at run time.
    #[error("source `{0}` was not bound at run time")]
    SourceMissing(String),

    /// A source file could not be opened or read.
    #[error("failed to read source file {path:?}")]
    SourceIo {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The line parser rejected an input record.
    #[error("failed to parse line {line} of {path:?}")]
    SourceParse {
        path: PathBuf,
        line: usize,
        #[source]
        source: anyhow::Error,
    },

    /// A configured column is absent from a row being processed.
    #[error("column `{0}` is missing")]
    KeyMissing(String),

    /// A row value had the wrong tag for the requested operation.
    #[error("column `{column}` holds {found}, expected {expected}")]
    TypeMismatch {
        column: String,
        expected: &'static str,
        found: &'static str,
    },

    /// A temporary spill file failed during the external sort.
    #[error("external sort spill failed")]
    SortIo(#[source] io::Error),

    /// A user-supplied mapper failed.
    #[error("mapper failed")]
    Mapper(#[source] anyhow::Error),

    /// A user-supplied reducer failed.
    #[error("reducer failed")]
    Reducer(#[source] anyhow::Error),

    /// A user-supplied joiner failed.
    #[error("joiner failed")]
    Joiner(#[source] anyhow::Error),
}
