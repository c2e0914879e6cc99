use chrono::{Datelike, NaiveDateTime, Timelike};

use crate::error::FlowError;
use crate::operators::{Mapper, Reducer};
use crate::row::{Row, Value};

use super::key_columns;

const EARTH_RADIUS_KM: f64 = 6373.0;
const SECONDS_PER_HOUR: f64 = 3600.0;

fn parse_timestamp(row: &Row, column: &str, format: &str) -> Result<NaiveDateTime, FlowError> {
    let text = row.require_str(column)?;
    NaiveDateTime::parse_from_str(text, format)
        .map_err(|error| FlowError::Mapper(anyhow::Error::new(error).context(format!(
            "timestamp column `{column}`"
        ))))
}

/// Derives weekday (`Mon`..`Sun`) and hour (0–23) columns from a
/// timestamp column parsed with a chrono format string.
pub struct CalculateTime {
    column: String,
    format: String,
    weekday_result: String,
    hour_result: String,
}

impl CalculateTime {
    pub fn new(
        column: impl Into<String>,
        format: impl Into<String>,
        weekday_result: impl Into<String>,
        hour_result: impl Into<String>,
    ) -> Self {
        Self {
            column: column.into(),
            format: format.into(),
            weekday_result: weekday_result.into(),
            hour_result: hour_result.into(),
        }
    }
}

impl Mapper for CalculateTime {
    fn map(&self, mut row: Row) -> Result<Vec<Row>, FlowError> {
        let instant = parse_timestamp(&row, &self.column, &self.format)?;
        row.insert(self.weekday_result.clone(), instant.weekday().to_string());
        row.insert(self.hour_result.clone(), i64::from(instant.hour()));
        Ok(vec![row])
    }
}

/// Haversine great-circle distance in kilometers between two
/// `[lon, lat]` coordinate columns (degrees).  A row that already
/// carries the result column passes through untouched.
pub struct CalculateLength {
    start: String,
    end: String,
    result: String,
}

impl CalculateLength {
    pub fn new(
        start: impl Into<String>,
        end: impl Into<String>,
        result: impl Into<String>,
    ) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
            result: result.into(),
        }
    }

    fn coordinates(&self, row: &Row, column: &str) -> Result<(f64, f64), FlowError> {
        let point = row.require_floats(column)?;
        match point {
            [lon, lat] => Ok((lon.to_radians(), lat.to_radians())),
            _ => Err(FlowError::TypeMismatch {
                column: column.to_owned(),
                expected: "a [lon, lat] pair",
                found: "a float list",
            }),
        }
    }
}

impl Mapper for CalculateLength {
    fn map(&self, mut row: Row) -> Result<Vec<Row>, FlowError> {
        if row.contains(&self.result) {
            return Ok(vec![row]);
        }
        let (lon_start, lat_start) = self.coordinates(&row, &self.start)?;
        let (lon_end, lat_end) = self.coordinates(&row, &self.end)?;
        let half_lat = (lat_end - lat_start) / 2.0;
        let half_lon = (lon_end - lon_start) / 2.0;
        let chord = half_lat.sin().powi(2) + lat_start.cos() * lat_end.cos() * half_lon.sin().powi(2);
        let distance = 2.0 * EARTH_RADIUS_KM * chord.sqrt().asin();
        row.insert(self.result.clone(), Value::Float(distance));
        Ok(vec![row])
    }
}

/// Per group, sums the length column (km) and the enter→leave spans
/// (hours), emitting the group-key columns plus the average speed.
pub struct CalculateSpeed {
    length_column: String,
    enter_column: String,
    leave_column: String,
    format: String,
    result: String,
}

impl CalculateSpeed {
    pub fn new(
        length_column: impl Into<String>,
        enter_column: impl Into<String>,
        leave_column: impl Into<String>,
        format: impl Into<String>,
        result: impl Into<String>,
    ) -> Self {
        Self {
            length_column: length_column.into(),
            enter_column: enter_column.into(),
            leave_column: leave_column.into(),
            format: format.into(),
            result: result.into(),
        }
    }
}

impl Reducer for CalculateSpeed {
    fn reduce(&self, key: &[String], rows: &[Row]) -> Result<Vec<Row>, FlowError> {
        let mut total_length = 0.0;
        let mut total_hours = 0.0;
        for row in rows {
            total_length += row.require_f64(&self.length_column)?;
            let enter = parse_timestamp(row, &self.enter_column, &self.format)
                .map_err(reducer_error)?;
            let leave = parse_timestamp(row, &self.leave_column, &self.format)
                .map_err(reducer_error)?;
            let seconds = (leave - enter).num_microseconds().unwrap_or(0) as f64 * 1e-6;
            total_hours += seconds / SECONDS_PER_HOUR;
        }
        let mut out = key_columns(key, rows)?;
        out.insert(self.result.clone(), Value::Float(total_length / total_hours));
        Ok(vec![out])
    }
}

fn reducer_error(error: FlowError) -> FlowError {
    match error {
        FlowError::Mapper(inner) => FlowError::Reducer(inner),
        other => other,
    }
}
