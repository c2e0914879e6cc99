use std::collections::VecDeque;
use std::rc::Rc;

use crate::error::FlowError;
use crate::row::Row;

use super::{Groups, Reducer, RowStream};

/// Walks the upstream stream one group at a time and forwards whatever
/// the [Reducer] emits for each group.
///
/// The upstream must already be grouped by the key: consecutive rows
/// with equal key projections are one group, and a key that reappears
/// later forms a fresh group.
pub(crate) struct ReduceStream {
    reducer: Rc<dyn Reducer>,
    keys: Vec<String>,
    groups: Groups,
    pending: VecDeque<Row>,
    failed: bool,
}

impl ReduceStream {
    pub fn new(reducer: Rc<dyn Reducer>, keys: Vec<String>, upstream: RowStream) -> Self {
        let groups = Groups::new(upstream, keys.clone(), false);
        Self {
            reducer,
            keys,
            groups,
            pending: VecDeque::new(),
            failed: false,
        }
    }
}

impl Iterator for ReduceStream {
    type Item = Result<Row, FlowError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        loop {
            if let Some(row) = self.pending.pop_front() {
                return Some(Ok(row));
            }
            match self.groups.next()? {
                Err(error) => {
                    self.failed = true;
                    return Some(Err(error));
                }
                Ok((_, rows)) => match self.reducer.reduce(&self.keys, &rows) {
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
    use crate::row::Value;

    struct GroupSize;

    impl Reducer for GroupSize {
        fn reduce(&self, key: &[String], rows: &[Row]) -> Result<Vec<Row>, FlowError> {
            let mut out = Row::new();
            for name in key {
                out.insert(name.clone(), rows[0].require(name)?.clone());
            }
            out.insert("size", Value::Int(rows.len() as i64));
            Ok(vec![out])
        }
    }

    fn stream(rows: Vec<Row>) -> RowStream {
        Box::new(rows.into_iter().map(Ok))
    }

    #[test]
    fn invokes_the_reducer_once_per_group() {
        let rows = vec![
            row! {"text" => "aboba"},
            row! {"text" => "aboba"},
            row! {"text" => "hi"},
        ];
        let out: Vec<_> = ReduceStream::new(Rc::new(GroupSize), vec!["text".to_owned()], stream(rows))
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(out, vec![
            row! {"text" => "aboba", "size" => 2},
            row! {"text" => "hi", "size" => 1},
        ]);
    }

    #[test]
    fn empty_key_reduces_the_whole_stream() {
        let rows = vec![row! {"a" => 1}, row! {"a" => 2}, row! {"a" => 3}];
        let out: Vec<_> = ReduceStream::new(Rc::new(GroupSize), Vec::new(), stream(rows))
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(out, vec![row! {"size" => 3}]);
    }
}
