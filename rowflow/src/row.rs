use derive_more::From;
use serde::{Deserialize, Serialize};

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

use crate::error::FlowError;

/// A single cell of a [Row].
///
/// The value domain is a small closed union, sufficient for every built-in
/// transform: extending it is a single edit point here.  Values compare by
/// natural order within one tag; the order *across* tags is deterministic
/// (so sorting mixed columns cannot panic) but carries no meaning, and
/// pipelines should not rely on it.
#[derive(Clone, Debug, From, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Int(i64),
    Float(f64),
    Str(String),
    Floats(Vec<f64>),
}

impl Value {
    /// Human readable tag name, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Int(_) => "an integer",
            Value::Float(_) => "a float",
            Value::Str(_) => "a string",
            Value::Floats(_) => "a float list",
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::Int(_) => 1,
            Value::Float(_) => 2,
            Value::Str(_) => 3,
            Value::Floats(_) => 4,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(value) => Some(*value),
            _ => None,
        }
    }

    /// Numeric view: integers widen to floats.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(value) => Some(*value as f64),
            Value::Float(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_floats(&self) -> Option<&[f64]> {
        match self {
            Value::Floats(values) => Some(values),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.to_owned())
    }
}

fn cmp_floats(a: &[f64], b: &[f64]) -> Ordering {
    for (x, y) in a.iter().zip(b.iter()) {
        match x.total_cmp(y) {
            Ordering::Equal => continue,
            unequal => return unequal,
        }
    }
    a.len().cmp(&b.len())
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Int(a), Value::Int(b)) => a.cmp(b),
            (Value::Float(a), Value::Float(b)) => a.total_cmp(b),
            (Value::Str(a), Value::Str(b)) => a.cmp(b),
            (Value::Floats(a), Value::Floats(b)) => cmp_floats(a, b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // floats hash by bit pattern, consistent with total_cmp equality
        self.rank().hash(state);
        match self {
            Value::Null => {}
            Value::Int(value) => value.hash(state),
            Value::Float(value) => value.to_bits().hash(state),
            Value::Str(value) => value.hash(state),
            Value::Floats(values) => {
                for value in values {
                    value.to_bits().hash(state);
                }
            }
        }
    }
}

/// A flat record: a mapping from column name to [Value].
///
/// Rows carry no schema; operators read only the columns they were
/// configured with and pass the rest through untouched.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row {
    columns: BTreeMap<String, Value>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses one line-delimited JSON record.
    pub fn from_json(line: &str) -> serde_json::Result<Row> {
        serde_json::from_str(line)
    }

    /// Serializes the row as a single JSON object.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn contains(&self, column: &str) -> bool {
        self.columns.contains_key(column)
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns.get(column)
    }

    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.columns.insert(column.into(), value.into())
    }

    pub fn remove(&mut self, column: &str) -> Option<Value> {
        self.columns.remove(column)
    }

    pub fn columns(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Like [Row::get] but missing columns are an error.
    pub fn require(&self, column: &str) -> Result<&Value, FlowError> {
        self.columns
            .get(column)
            .ok_or_else(|| FlowError::KeyMissing(column.to_owned()))
    }

    pub fn require_str(&self, column: &str) -> Result<&str, FlowError> {
        let value = self.require(column)?;
        value.as_str().ok_or_else(|| FlowError::TypeMismatch {
            column: column.to_owned(),
            expected: "a string",
            found: value.kind(),
        })
    }

    pub fn require_f64(&self, column: &str) -> Result<f64, FlowError> {
        let value = self.require(column)?;
        value.as_f64().ok_or_else(|| FlowError::TypeMismatch {
            column: column.to_owned(),
            expected: "a number",
            found: value.kind(),
        })
    }

    pub fn require_floats(&self, column: &str) -> Result<&[f64], FlowError> {
        let value = self.require(column)?;
        value.as_floats().ok_or_else(|| FlowError::TypeMismatch {
            column: column.to_owned(),
            expected: "a float list",
            found: value.kind(),
        })
    }

    /// The tuple of values behind the named columns, compared
    /// lexicographically by grouping, sorting and joining.
    pub fn key_projection(&self, keys: &[String]) -> Result<Vec<Value>, FlowError> {
        keys.iter()
            .map(|key| Ok(self.require(key)?.clone()))
            .collect()
    }
}

impl FromIterator<(String, Value)> for Row {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Row {
            columns: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Row {
    type Item = (String, Value);
    type IntoIter = std::collections::btree_map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.columns.into_iter()
    }
}

/// Builds a [Row] from column/value literals.
///
/// ```
/// use rowflow::row;
/// let row = row! {"doc_id" => 1, "text" => "hello world"};
/// assert_eq!(row.len(), 2);
/// ```
#[macro_export]
macro_rules! row {
    () => { $crate::Row::new() };
    ($($column:expr => $value:expr),+ $(,)?) => {{
        let mut row = $crate::Row::new();
        $(row.insert($column, $crate::Value::from($value));)+
        row
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_order_naturally_within_one_tag() {
        assert!(Value::from(1) < Value::from(2));
        assert!(Value::from(1.5) < Value::from(2.5));
        assert!(Value::from("aboba") < Value::from("baobab"));
        assert!(Value::from(vec![1.0, 2.0]) < Value::from(vec![1.0, 3.0]));
        assert!(Value::from(vec![1.0]) < Value::from(vec![1.0, 0.0]));
    }

    #[test]
    fn cross_tag_order_is_deterministic() {
        let mut values = vec![Value::from("z"), Value::from(1), Value::Null];
        values.sort();
        let again = {
            let mut v = vec![Value::from(1), Value::Null, Value::from("z")];
            v.sort();
            v
        };
        assert_eq!(values, again);
    }

    #[test]
    fn json_round_trip_preserves_tags() {
        let row = row! {
            "doc_id" => 1,
            "tf" => 0.5,
            "text" => "hello",
            "start" => vec![37.84, 55.73],
        };
        let parsed = Row::from_json(&row.to_json().unwrap()).unwrap();
        assert_eq!(parsed, row);
        assert_eq!(parsed.get("doc_id"), Some(&Value::Int(1)));
        assert_eq!(parsed.get("tf"), Some(&Value::Float(0.5)));
        assert_eq!(parsed.get("start"), Some(&Value::Floats(vec![37.84, 55.73])));
    }

    #[test]
    fn projection_reports_missing_columns() {
        let row = row! {"text" => "hello"};
        let keys = vec!["text".to_owned(), "count".to_owned()];
        match row.key_projection(&keys) {
            Err(FlowError::KeyMissing(column)) => assert_eq!(column, "count"),
            other => panic!("expected KeyMissing, got {other:?}"),
        }
    }

    #[test]
    fn insert_replaces_existing_columns() {
        let mut row = row! {"text" => "Hello"};
        row.insert("text", "hello");
        assert_eq!(row.require_str("text").unwrap(), "hello");
        assert_eq!(row.len(), 1);
    }
}
