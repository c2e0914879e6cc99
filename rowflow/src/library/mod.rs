//! Ready-made mappers, reducers and joiners for common transforms.

mod joiners;
mod mappers;
mod reducers;
mod route;
mod text;

pub use joiners::*;
pub use mappers::*;
pub use reducers::*;
pub use route::*;
pub use text::*;

use crate::error::FlowError;
use crate::row::{Row, Value};

/// The group-key columns of a group, copied verbatim from its first row.
/// Every aggregating reducer starts its output rows from these.
pub(crate) fn key_columns(key: &[String], rows: &[Row]) -> Result<Row, FlowError> {
    let Some(first) = rows.first() else {
        return Ok(Row::new());
    };
    key.iter()
        .map(|name| Ok((name.clone(), first.require(name)?.clone())))
        .collect()
}

/// Integer-preserving addition: Int + Int stays Int, anything else
/// promotes to Float.
pub(crate) fn numeric_add(column: &str, a: &Value, b: &Value) -> Result<Value, FlowError> {
    numeric(column, a, b, |x, y| x + y, |x, y| x + y)
}

/// Integer-preserving multiplication, same promotion rule as addition.
pub(crate) fn numeric_mul(column: &str, a: &Value, b: &Value) -> Result<Value, FlowError> {
    numeric(column, a, b, |x, y| x * y, |x, y| x * y)
}

fn numeric(
    column: &str,
    a: &Value,
    b: &Value,
    int_op: impl Fn(i64, i64) -> i64,
    float_op: impl Fn(f64, f64) -> f64,
) -> Result<Value, FlowError> {
    let mismatch = |found: &Value| FlowError::TypeMismatch {
        column: column.to_owned(),
        expected: "a number",
        found: found.kind(),
    };
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => Ok(Value::Int(int_op(*x, *y))),
        _ => {
            let x = a.as_f64().ok_or_else(|| mismatch(a))?;
            let y = b.as_f64().ok_or_else(|| mismatch(b))?;
            Ok(Value::Float(float_op(x, y)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integers_stay_integers_until_a_float_arrives() {
        let int = numeric_mul("x", &Value::Int(6), &Value::Int(7)).unwrap();
        assert_eq!(int, Value::Int(42));
        let float = numeric_mul("x", &Value::Int(6), &Value::Float(0.5)).unwrap();
        assert_eq!(float, Value::Float(3.0));
    }

    #[test]
    fn non_numeric_operands_are_a_type_mismatch() {
        let result = numeric_add("x", &Value::Int(1), &Value::from("nope"));
        assert!(matches!(result, Err(FlowError::TypeMismatch { .. })));
    }
}
