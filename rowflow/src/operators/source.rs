use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::error::FlowError;
use crate::row::Row;

use super::RowStream;

/// What a named-source factory produces: a fresh iterator of rows.
pub type RowIter = Box<dyn Iterator<Item = Row>>;

/// Parses one line of a source file into a row.
pub type LineParser = dyn Fn(&str) -> anyhow::Result<Row>;

/// Lifts a bound iterator into the engine stream shape.
pub(crate) fn iter_stream(rows: RowIter) -> RowStream {
    Box::new(rows.map(Ok))
}

/// Opens `path` and yields one parsed row per line.  The file handle is
/// released when the stream is dropped, drained or aborted.
pub(crate) fn file_stream(path: &Path, parser: Rc<LineParser>) -> Result<RowStream, FlowError> {
    let file = File::open(path).map_err(|source| FlowError::SourceIo {
        path: path.to_owned(),
        source,
    })?;
    Ok(Box::new(FileSource {
        path: path.to_owned(),
        lines: BufReader::new(file).lines(),
        parser,
        line: 0,
        failed: false,
    }))
}

struct FileSource {
    path: PathBuf,
    lines: Lines<BufReader<File>>,
    parser: Rc<LineParser>,
    line: usize,
    failed: bool,
}

impl Iterator for FileSource {
    type Item = Result<Row, FlowError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        self.line += 1;
        match self.lines.next()? {
            Err(source) => {
                self.failed = true;
                Some(Err(FlowError::SourceIo {
                    path: self.path.clone(),
                    source,
                }))
            }
            Ok(text) => match (self.parser)(&text) {
                Ok(row) => Some(Ok(row)),
                Err(source) => {
                    self.failed = true;
                    Some(Err(FlowError::SourceParse {
                        path: self.path.clone(),
                        line: self.line,
                        source,
                    }))
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row;

    use std::io::Write;

    fn json_parser() -> Rc<LineParser> {
        Rc::new(|line| Ok(Row::from_json(line)?))
    }

    #[test]
    fn reads_one_row_per_line() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"doc_id": 1, "text": "hi"}}"#).unwrap();
        writeln!(file, r#"{{"doc_id": 2, "text": "aboba"}}"#).unwrap();
        file.flush().unwrap();

        let rows: Vec<_> = file_stream(file.path(), json_parser())
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(rows, vec![
            row! {"doc_id" => 1, "text" => "hi"},
            row! {"doc_id" => 2, "text" => "aboba"},
        ]);
    }

    #[test]
    fn parse_failures_carry_the_line_number() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"doc_id": 1}}"#).unwrap();
        writeln!(file, "not json").unwrap();
        file.flush().unwrap();

        let mut stream = file_stream(file.path(), json_parser()).unwrap();
        assert!(stream.next().unwrap().is_ok());
        match stream.next() {
            Some(Err(FlowError::SourceParse { line, .. })) => assert_eq!(line, 2),
            other => panic!("expected SourceParse, got {other:?}"),
        }
        assert!(stream.next().is_none());
    }

    #[test]
    fn missing_file_is_a_source_io_error() {
        let missing = Path::new("/nonexistent/rowflow-input.jsonl");
        assert!(matches!(
            file_stream(missing, json_parser()),
            Err(FlowError::SourceIo { .. })
        ));
    }
}
