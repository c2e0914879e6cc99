use derive_new::new;

use std::collections::VecDeque;
use std::rc::Rc;

use crate::error::FlowError;
use crate::row::Row;

use super::{Mapper, RowStream};

/// Applies a [Mapper] to every upstream row, forwarding its outputs in
/// order.  Holds no more than one input row's worth of output.
#[derive(new)]
pub(crate) struct MapStream {
    mapper: Rc<dyn Mapper>,
    upstream: RowStream,
    #[new(default)]
    pending: VecDeque<Row>,
    #[new(default)]
    failed: bool,
}

impl Iterator for MapStream {
    type Item = Result<Row, FlowError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        loop {
            if let Some(row) = self.pending.pop_front() {
                return Some(Ok(row));
            }
            match self.upstream.next()? {
                Err(error) => {
                    self.failed = true;
                    return Some(Err(error));
                }
                Ok(row) => match self.mapper.map(row) {
                    Ok(rows) => self.pending.extend(rows),
                    Err(error) => {
                        self.failed = true;
                        return Some(Err(error));
                    }
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row;

    struct Duplicate;

    impl Mapper for Duplicate {
        fn map(&self, row: Row) -> Result<Vec<Row>, FlowError> {
            Ok(vec![row.clone(), row])
        }
    }

    struct DropAll;

    impl Mapper for DropAll {
        fn map(&self, _row: Row) -> Result<Vec<Row>, FlowError> {
            Ok(Vec::new())
        }
    }

    struct AlwaysFails;

    impl Mapper for AlwaysFails {
        fn map(&self, _row: Row) -> Result<Vec<Row>, FlowError> {
            Err(FlowError::Mapper(anyhow::anyhow!("boom")))
        }
    }

    fn stream(rows: Vec<Row>) -> RowStream {
        Box::new(rows.into_iter().map(Ok))
    }

    #[test]
    fn forwards_every_output_row_in_order() {
        let rows = vec![row! {"a" => 1}, row! {"a" => 2}];
        let out: Vec<_> = MapStream::new(Rc::new(Duplicate), stream(rows))
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(out, vec![
            row! {"a" => 1},
            row! {"a" => 1},
            row! {"a" => 2},
            row! {"a" => 2},
        ]);
    }

    #[test]
    fn zero_output_rows_filter_the_stream() {
        let rows = vec![row! {"a" => 1}, row! {"a" => 2}];
        let mut out = MapStream::new(Rc::new(DropAll), stream(rows));
        assert!(out.next().is_none());
    }

    #[test]
    fn a_mapper_error_aborts_the_stream() {
        let rows = vec![row! {"a" => 1}, row! {"a" => 2}];
        let mut out = MapStream::new(Rc::new(AlwaysFails), stream(rows));
        assert!(matches!(out.next(), Some(Err(FlowError::Mapper(_)))));
        assert!(out.next().is_none());
    }
}
