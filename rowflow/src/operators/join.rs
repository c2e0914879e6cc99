use std::cmp::Ordering;
use std::collections::VecDeque;
use std::rc::Rc;

use crate::error::FlowError;
use crate::row::{Row, Value};

use super::{Groups, Joiner, RowStream};

type Group = (Vec<Value>, Vec<Row>);

enum Side {
    Both,
    Left,
    Right,
}

/// Sort-merge join over two key-sorted streams.
///
/// Both inputs are grouped by the key; while both sides have a current
/// group the side with the smaller key is handed to the [Joiner] with an
/// empty counterpart and advanced, equal keys are handed over together,
/// and once one side is exhausted the other drains the same way.  Only
/// one group per side is held in memory at a time.
pub(crate) struct JoinStream {
    joiner: Rc<dyn Joiner>,
    keys: Vec<String>,
    left: Groups,
    right: Groups,
    left_group: Option<Group>,
    right_group: Option<Group>,
    primed: bool,
    pending: VecDeque<Row>,
    failed: bool,
}

impl JoinStream {
    pub fn new(joiner: Rc<dyn Joiner>, keys: Vec<String>, left: RowStream, right: RowStream) -> Self {
        Self {
            joiner,
            keys: keys.clone(),
            left: Groups::new(left, keys.clone(), true),
            right: Groups::new(right, keys, true),
            left_group: None,
            right_group: None,
            primed: false,
            pending: VecDeque::new(),
            failed: false,
        }
    }

    fn fail(&mut self, error: FlowError) -> Option<<Self as Iterator>::Item> {
        self.failed = true;
        Some(Err(error))
    }
}

fn advance(groups: &mut Groups) -> Result<Option<Group>, FlowError> {
    groups.next().transpose()
}

impl Iterator for JoinStream {
    type Item = Result<Row, FlowError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        loop {
            if let Some(row) = self.pending.pop_front() {
                return Some(Ok(row));
            }
            if !self.primed {
                self.primed = true;
                self.left_group = match advance(&mut self.left) {
                    Ok(group) => group,
                    Err(error) => return self.fail(error),
                };
                self.right_group = match advance(&mut self.right) {
                    Ok(group) => group,
                    Err(error) => return self.fail(error),
                };
            }
            let side = match (&self.left_group, &self.right_group) {
                (None, None) => return None,
                (Some(_), None) => Side::Left,
                (None, Some(_)) => Side::Right,
                (Some((left_key, _)), Some((right_key, _))) => match left_key.cmp(right_key) {
                    Ordering::Equal => Side::Both,
                    Ordering::Less => Side::Left,
                    Ordering::Greater => Side::Right,
                },
            };
            let (left_group, right_group) = match side {
                Side::Both => (self.left_group.take(), self.right_group.take()),
                Side::Left => (self.left_group.take(), None),
                Side::Right => (None, self.right_group.take()),
            };
            let no_rows = Vec::new();
            let left_rows = left_group.as_ref().map_or(&no_rows, |(_, rows)| rows);
            let right_rows = right_group.as_ref().map_or(&no_rows, |(_, rows)| rows);
            let merged = self.joiner.join(&self.keys, left_rows, right_rows);
            if left_group.is_some() {
                self.left_group = match advance(&mut self.left) {
                    Ok(group) => group,
                    Err(error) => return self.fail(error),
                };
            }
            if right_group.is_some() {
                self.right_group = match advance(&mut self.right) {
                    Ok(group) => group,
                    Err(error) => return self.fail(error),
                };
            }
            match merged {
                Ok(rows) => self.pending.extend(rows),
                Err(error) => return self.fail(error),
            }
        }
    }
}
