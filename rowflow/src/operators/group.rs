use std::iter::Peekable;

use crate::error::FlowError;
use crate::row::{Row, Value};

use super::RowStream;

/// Streaming group-by: splits an upstream stream into maximal runs of
/// consecutive rows with equal key projections, materializing one group
/// at a time.  An empty key makes the whole stream a single group.
///
/// Grouping is only meaningful when the upstream is sorted (or at least
/// grouped) by the key; the engine does not verify that.  Join inputs
/// must additionally be ascending, which `check_ascending` asserts in
/// debug builds.
pub(crate) struct Groups {
    upstream: Peekable<RowStream>,
    keys: Vec<String>,
    check_ascending: bool,
    last_key: Option<Vec<Value>>,
    failed: bool,
}

impl Groups {
    pub fn new(upstream: RowStream, keys: Vec<String>, check_ascending: bool) -> Self {
        Self {
            upstream: upstream.peekable(),
            keys,
            check_ascending,
            last_key: None,
            failed: false,
        }
    }

    fn fail(&mut self, error: FlowError) -> Option<<Self as Iterator>::Item> {
        self.failed = true;
        Some(Err(error))
    }
}

impl Iterator for Groups {
    type Item = Result<(Vec<Value>, Vec<Row>), FlowError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let first = match self.upstream.next()? {
            Ok(row) => row,
            Err(error) => return self.fail(error),
        };
        let key = match first.key_projection(&self.keys) {
            Ok(key) => key,
            Err(error) => return self.fail(error),
        };
        if self.check_ascending {
            if let Some(last) = &self.last_key {
                debug_assert!(
                    *last < key,
                    "group keys must be ascending over {:?}, saw {:?} after {:?}",
                    self.keys,
                    key,
                    last
                );
            }
        }
        let mut rows = vec![first];
        loop {
            match self.upstream.peek() {
                None => break,
                Some(Err(_)) => {
                    self.failed = true;
                    return match self.upstream.next() {
                        Some(Err(error)) => Some(Err(error)),
                        _ => None,
                    };
                }
                Some(Ok(row)) => match row.key_projection(&self.keys) {
                    Err(error) => {
                        self.upstream.next();
                        return self.fail(error);
                    }
                    Ok(next_key) if next_key == key => {
                        if let Some(Ok(row)) = self.upstream.next() {
                            rows.push(row);
                        }
                    }
                    Ok(_) => break,
                },
            }
        }
        self.last_key = Some(key.clone());
        Some(Ok((key, rows)))
    }
}
