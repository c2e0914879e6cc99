use derive_new::new;

use std::collections::HashMap;

use crate::error::FlowError;
use crate::operators::Reducer;
use crate::row::{Row, Value};

use super::{key_columns, numeric_add};

/// Keeps only the first row of each group.
#[derive(new, Clone, Copy, Debug, Default)]
pub struct FirstReducer;

impl Reducer for FirstReducer {
    fn reduce(&self, _key: &[String], rows: &[Row]) -> Result<Vec<Row>, FlowError> {
        Ok(rows.first().cloned().into_iter().collect())
    }
}

/// Emits one row per group: the group-key columns plus the group size.
pub struct Count {
    column: String,
}

impl Count {
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
        }
    }
}

impl Reducer for Count {
    fn reduce(&self, key: &[String], rows: &[Row]) -> Result<Vec<Row>, FlowError> {
        let mut out = key_columns(key, rows)?;
        out.insert(self.column.clone(), Value::Int(rows.len() as i64));
        Ok(vec![out])
    }
}

/// Emits the group-key columns plus the sum of a numeric column.
pub struct Sum {
    column: String,
}

impl Sum {
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
        }
    }
}

impl Reducer for Sum {
    fn reduce(&self, key: &[String], rows: &[Row]) -> Result<Vec<Row>, FlowError> {
        let mut total = Value::Int(0);
        for row in rows {
            total = numeric_add(&self.column, &total, row.require(&self.column)?)?;
        }
        let mut out = key_columns(key, rows)?;
        out.insert(self.column.clone(), total);
        Ok(vec![out])
    }
}

/// Emits, for every distinct value of `words_column` in the group, the
/// group-key columns, the value, and its relative frequency within the
/// group.  Distinct values appear in first-occurrence order.
pub struct TermFrequency {
    words_column: String,
    result: String,
}

impl TermFrequency {
    pub fn new(words_column: impl Into<String>, result: impl Into<String>) -> Self {
        Self {
            words_column: words_column.into(),
            result: result.into(),
        }
    }
}

impl Reducer for TermFrequency {
    fn reduce(&self, key: &[String], rows: &[Row]) -> Result<Vec<Row>, FlowError> {
        let total = rows.len() as f64;
        let mut order: Vec<&Value> = Vec::new();
        let mut counts: HashMap<&Value, usize> = HashMap::new();
        for row in rows {
            let word = row.require(&self.words_column)?;
            let count = counts.entry(word).or_insert(0);
            if *count == 0 {
                order.push(word);
            }
            *count += 1;
        }
        let keys = key_columns(key, rows)?;
        Ok(order
            .into_iter()
            .map(|word| {
                let mut out = keys.clone();
                out.insert(self.words_column.clone(), word.clone());
                out.insert(self.result.clone(), Value::Float(counts[word] as f64 / total));
                out
            })
            .collect())
    }
}

/// Emits the `n` rows of each group with the largest values in a
/// column.  Ties keep their input order.
#[derive(Clone, Debug)]
pub struct TopN {
    column: String,
    n: usize,
}

impl TopN {
    pub fn new(column: impl Into<String>, n: usize) -> Self {
        Self {
            column: column.into(),
            n,
        }
    }
}

impl Reducer for TopN {
    fn reduce(&self, _key: &[String], rows: &[Row]) -> Result<Vec<Row>, FlowError> {
        let mut keyed = rows
            .iter()
            .map(|row| Ok((row.require(&self.column)?, row)))
            .collect::<Result<Vec<_>, FlowError>>()?;
        keyed.sort_by(|(a, _), (b, _)| b.cmp(a));
        Ok(keyed
            .into_iter()
            .take(self.n)
            .map(|(_, row)| row.clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row;

    fn key(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| (*name).to_owned()).collect()
    }

    #[test]
    fn first_keeps_the_leading_row() {
        let rows = vec![row! {"a" => 1, "b" => 1}, row! {"a" => 1, "b" => 2}];
        let out = FirstReducer::new().reduce(&key(&["a"]), &rows).unwrap();
        assert_eq!(out, vec![row! {"a" => 1, "b" => 1}]);
    }

    #[test]
    fn count_emits_key_columns_and_group_size() {
        let rows = vec![
            row! {"text" => "hi", "doc_id" => 1},
            row! {"text" => "hi", "doc_id" => 2},
        ];
        let out = Count::new("count").reduce(&key(&["text"]), &rows).unwrap();
        assert_eq!(out, vec![row! {"text" => "hi", "count" => 2}]);
    }

    #[test]
    fn count_with_an_empty_key_emits_only_the_size() {
        let rows = vec![row! {"a" => 1}, row! {"a" => 2}, row! {"a" => 3}];
        let out = Count::new("docs_count").reduce(&[], &rows).unwrap();
        assert_eq!(out, vec![row! {"docs_count" => 3}]);
    }

    #[test]
    fn sum_totals_the_column() {
        let rows = vec![
            row! {"a" => 1, "b" => 2},
            row! {"a" => 1, "b" => 3},
        ];
        let out = Sum::new("b").reduce(&key(&["a"]), &rows).unwrap();
        assert_eq!(out, vec![row! {"a" => 1, "b" => 5}]);
    }

    #[test]
    fn sum_promotes_to_float_when_needed() {
        let rows = vec![row! {"b" => 1}, row! {"b" => 0.5}];
        let out = Sum::new("b").reduce(&[], &rows).unwrap();
        assert_eq!(out, vec![row! {"b" => 1.5}]);
    }

    #[test]
    fn term_frequency_counts_in_first_occurrence_order() {
        let rows = vec![
            row! {"doc_id" => 1, "text" => "hello"},
            row! {"doc_id" => 1, "text" => "little"},
            row! {"doc_id" => 1, "text" => "little"},
            row! {"doc_id" => 1, "text" => "world"},
        ];
        let out = TermFrequency::new("text", "tf")
            .reduce(&key(&["doc_id"]), &rows)
            .unwrap();
        assert_eq!(out, vec![
            row! {"doc_id" => 1, "text" => "hello", "tf" => 0.25},
            row! {"doc_id" => 1, "text" => "little", "tf" => 0.5},
            row! {"doc_id" => 1, "text" => "world", "tf" => 0.25},
        ]);
    }

    #[test]
    fn top_n_breaks_ties_by_input_order() {
        let rows = vec![
            row! {"text" => "a", "score" => 1},
            row! {"text" => "b", "score" => 3},
            row! {"text" => "c", "score" => 3},
            row! {"text" => "d", "score" => 2},
        ];
        let out = TopN::new("score", 3).reduce(&[], &rows).unwrap();
        assert_eq!(out, vec![
            row! {"text" => "b", "score" => 3},
            row! {"text" => "c", "score" => 3},
            row! {"text" => "d", "score" => 2},
        ]);
    }

    #[test]
    fn top_n_requires_its_column() {
        let rows = vec![row! {"text" => "a"}];
        assert!(matches!(
            TopN::new("score", 1).reduce(&[], &rows),
            Err(FlowError::KeyMissing(_))
        ));
    }
}
