use derive_new::new;

use crate::error::FlowError;
use crate::operators::Mapper;
use crate::row::{Row, Value};

use super::numeric_mul;

/// Emits the input row untouched.
#[derive(new, Clone, Copy, Debug, Default)]
pub struct DummyMapper;

impl Mapper for DummyMapper {
    fn map(&self, row: Row) -> Result<Vec<Row>, FlowError> {
        Ok(vec![row])
    }
}

/// Drops every row the predicate rejects.
pub struct Filter {
    predicate: Box<dyn Fn(&Row) -> bool>,
}

impl Filter {
    pub fn new(predicate: impl Fn(&Row) -> bool + 'static) -> Self {
        Self {
            predicate: Box::new(predicate),
        }
    }
}

impl Mapper for Filter {
    fn map(&self, row: Row) -> Result<Vec<Row>, FlowError> {
        if (self.predicate)(&row) {
            Ok(vec![row])
        } else {
            Ok(Vec::new())
        }
    }
}

/// Keeps only the named columns.
pub struct Project {
    columns: Vec<String>,
}

impl Project {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }
}

impl Mapper for Project {
    fn map(&self, row: Row) -> Result<Vec<Row>, FlowError> {
        let projected = self
            .columns
            .iter()
            .map(|column| Ok((column.clone(), row.require(column)?.clone())))
            .collect::<Result<Row, FlowError>>()?;
        Ok(vec![projected])
    }
}

/// Multiplies the named numeric columns into `result`.
pub struct Product {
    columns: Vec<String>,
    result: String,
}

impl Product {
    pub fn new<I, S>(columns: I, result: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            result: result.into(),
        }
    }
}

impl Mapper for Product {
    fn map(&self, mut row: Row) -> Result<Vec<Row>, FlowError> {
        let mut product = Value::Int(1);
        for column in &self.columns {
            product = numeric_mul(column, &product, row.require(column)?)?;
        }
        row.insert(self.result.clone(), product);
        Ok(vec![row])
    }
}

/// Stores the result of an arbitrary per-row computation in `result`.
pub struct Calculate {
    operation: Box<dyn Fn(&Row) -> anyhow::Result<Value>>,
    result: String,
}

impl Calculate {
    pub fn new(
        operation: impl Fn(&Row) -> anyhow::Result<Value> + 'static,
        result: impl Into<String>,
    ) -> Self {
        Self {
            operation: Box::new(operation),
            result: result.into(),
        }
    }
}

impl Mapper for Calculate {
    fn map(&self, mut row: Row) -> Result<Vec<Row>, FlowError> {
        let value = (self.operation)(&row).map_err(FlowError::Mapper)?;
        row.insert(self.result.clone(), value);
        Ok(vec![row])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row;

    #[test]
    fn filter_keeps_only_matching_rows() {
        let filter = Filter::new(|row| row.require_f64("count").is_ok_and(|count| count > 1.0));
        assert_eq!(filter.map(row! {"count" => 2}).unwrap().len(), 1);
        assert!(filter.map(row! {"count" => 1}).unwrap().is_empty());
    }

    #[test]
    fn project_drops_everything_else() {
        let project = Project::new(["doc_id", "text"]);
        let out = project
            .map(row! {"doc_id" => 1, "text" => "hi", "tf" => 0.5})
            .unwrap();
        assert_eq!(out, vec![row! {"doc_id" => 1, "text" => "hi"}]);
    }

    #[test]
    fn project_requires_its_columns() {
        let project = Project::new(["missing"]);
        assert!(matches!(
            project.map(row! {"text" => "hi"}),
            Err(FlowError::KeyMissing(column)) if column == "missing"
        ));
    }

    #[test]
    fn product_multiplies_and_keeps_integers_integral() {
        let product = Product::new(["a", "b"], "product");
        let out = product.map(row! {"a" => 6, "b" => 7}).unwrap();
        assert_eq!(out[0].require("product").unwrap(), &Value::Int(42));

        let out = product.map(row! {"a" => 6, "b" => 0.5}).unwrap();
        assert_eq!(out[0].require("product").unwrap(), &Value::Float(3.0));
    }

    #[test]
    fn calculate_surfaces_user_errors_as_mapper_errors() {
        let calc = Calculate::new(|_| anyhow::bail!("no idea"), "out");
        assert!(matches!(
            calc.map(row! {"a" => 1}),
            Err(FlowError::Mapper(_))
        ));
    }

    #[test]
    fn calculate_stores_the_result_column() {
        let calc = Calculate::new(
            |row| Ok(Value::Float(row.require_f64("tf")?.ln())),
            "log_tf",
        );
        let out = calc.map(row! {"tf" => 1.0}).unwrap();
        assert_eq!(out[0].require("log_tf").unwrap(), &Value::Float(0.0));
    }
}
