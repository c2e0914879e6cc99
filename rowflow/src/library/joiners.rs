use derive_new::new;
use itertools::Itertools;

use crate::error::FlowError;
use crate::operators::Joiner;
use crate::row::Row;

/// The column-collision suffixes a joiner appends when a non-key column
/// exists on both sides of a merged pair.
#[derive(new, Clone, Debug, PartialEq, Eq)]
pub struct Suffixes {
    pub left: String,
    pub right: String,
}

impl Default for Suffixes {
    fn default() -> Self {
        Self {
            left: "_1".to_owned(),
            right: "_2".to_owned(),
        }
    }
}

/// Cartesian product of two matched groups, left loop outer.  Join-key
/// columns appear once, taken from the left row; colliding non-key
/// columns are suffixed; everything else passes through.
fn merge_groups(keys: &[String], left: &[Row], right: &[Row], suffixes: &Suffixes) -> Vec<Row> {
    left.iter()
        .cartesian_product(right.iter())
        .map(|(left_row, right_row)| merge_pair(keys, left_row, right_row, suffixes))
        .collect()
}

fn merge_pair(keys: &[String], left: &Row, right: &Row, suffixes: &Suffixes) -> Row {
    let is_key = |column: &str| keys.iter().any(|key| key == column);
    let mut merged = Row::new();
    for (column, value) in left.columns() {
        if is_key(column) || !right.contains(column) {
            merged.insert(column, value.clone());
        } else {
            merged.insert(format!("{column}{}", suffixes.left), value.clone());
        }
    }
    for (column, value) in right.columns() {
        if is_key(column) {
            continue;
        }
        if left.contains(column) {
            merged.insert(format!("{column}{}", suffixes.right), value.clone());
        } else {
            merged.insert(column, value.clone());
        }
    }
    merged
}

macro_rules! suffix_accessors {
    () => {
        pub fn with_suffixes(left: impl Into<String>, right: impl Into<String>) -> Self {
            Self {
                suffixes: Suffixes::new(left.into(), right.into()),
            }
        }

        pub fn suffixes(&self) -> &Suffixes {
            &self.suffixes
        }
    };
}

/// Emits the cartesian product of matched groups; unmatched groups on
/// either side are dropped.
#[derive(Clone, Debug, Default)]
pub struct InnerJoiner {
    suffixes: Suffixes,
}

impl InnerJoiner {
    pub fn new() -> Self {
        Self::default()
    }

    suffix_accessors!();
}

impl Joiner for InnerJoiner {
    fn join(&self, keys: &[String], left: &[Row], right: &[Row]) -> Result<Vec<Row>, FlowError> {
        if left.is_empty() || right.is_empty() {
            Ok(Vec::new())
        } else {
            Ok(merge_groups(keys, left, right, &self.suffixes))
        }
    }
}

/// As inner, but a left group with no match passes through unchanged.
#[derive(Clone, Debug, Default)]
pub struct LeftJoiner {
    suffixes: Suffixes,
}

impl LeftJoiner {
    pub fn new() -> Self {
        Self::default()
    }

    suffix_accessors!();
}

impl Joiner for LeftJoiner {
    fn join(&self, keys: &[String], left: &[Row], right: &[Row]) -> Result<Vec<Row>, FlowError> {
        if right.is_empty() {
            Ok(left.to_vec())
        } else {
            Ok(merge_groups(keys, left, right, &self.suffixes))
        }
    }
}

/// As inner, but a right group with no match passes through unchanged.
#[derive(Clone, Debug, Default)]
pub struct RightJoiner {
    suffixes: Suffixes,
}

impl RightJoiner {
    pub fn new() -> Self {
        Self::default()
    }

    suffix_accessors!();
}

impl Joiner for RightJoiner {
    fn join(&self, keys: &[String], left: &[Row], right: &[Row]) -> Result<Vec<Row>, FlowError> {
        if left.is_empty() {
            Ok(right.to_vec())
        } else {
            Ok(merge_groups(keys, left, right, &self.suffixes))
        }
    }
}

/// Full outer strategy: unmatched groups from either side pass through.
#[derive(Clone, Debug, Default)]
pub struct OuterJoiner {
    suffixes: Suffixes,
}

impl OuterJoiner {
    pub fn new() -> Self {
        Self::default()
    }

    suffix_accessors!();
}

impl Joiner for OuterJoiner {
    fn join(&self, keys: &[String], left: &[Row], right: &[Row]) -> Result<Vec<Row>, FlowError> {
        if left.is_empty() {
            Ok(right.to_vec())
        } else if right.is_empty() {
            Ok(left.to_vec())
        } else {
            Ok(merge_groups(keys, left, right, &self.suffixes))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row;

    #[test]
    fn colliding_columns_get_suffixed() {
        let joiner = InnerJoiner::new();
        let keys = vec!["id".to_owned()];
        let left = vec![row! {"id" => 1, "name" => "left", "only_left" => 1}];
        let right = vec![row! {"id" => 1, "name" => "right", "only_right" => 2}];
        let out = joiner.join(&keys, &left, &right).unwrap();
        assert_eq!(out, vec![row! {
            "id" => 1,
            "name_1" => "left",
            "name_2" => "right",
            "only_left" => 1,
            "only_right" => 2,
        }]);
    }

    #[test]
    fn suffixes_are_configurable() {
        let joiner = InnerJoiner::with_suffixes("_a", "_b");
        assert_eq!(joiner.suffixes(), &Suffixes::new("_a".to_owned(), "_b".to_owned()));
        let keys = vec!["id".to_owned()];
        let left = vec![row! {"id" => 1, "v" => 10}];
        let right = vec![row! {"id" => 1, "v" => 20}];
        let out = joiner.join(&keys, &left, &right).unwrap();
        assert_eq!(out, vec![row! {"id" => 1, "v_a" => 10, "v_b" => 20}]);
    }

    #[test]
    fn inner_drops_unmatched_groups() {
        let joiner = InnerJoiner::new();
        let keys = vec!["id".to_owned()];
        assert!(joiner.join(&keys, &[row! {"id" => 1}], &[]).unwrap().is_empty());
        assert!(joiner.join(&keys, &[], &[row! {"id" => 1}]).unwrap().is_empty());
    }

    #[test]
    fn left_and_right_pass_their_own_side_through() {
        let keys = vec!["id".to_owned()];
        let rows = vec![row! {"id" => 1, "v" => 10}];
        assert_eq!(LeftJoiner::new().join(&keys, &rows, &[]).unwrap(), rows);
        assert!(LeftJoiner::new().join(&keys, &[], &rows).unwrap().is_empty());
        assert_eq!(RightJoiner::new().join(&keys, &[], &rows).unwrap(), rows);
        assert!(RightJoiner::new().join(&keys, &rows, &[]).unwrap().is_empty());
    }

    #[test]
    fn outer_passes_both_sides_through() {
        let keys = vec!["id".to_owned()];
        let rows = vec![row! {"id" => 1, "v" => 10}];
        assert_eq!(OuterJoiner::new().join(&keys, &rows, &[]).unwrap(), rows);
        assert_eq!(OuterJoiner::new().join(&keys, &[], &rows).unwrap(), rows);
    }
}
