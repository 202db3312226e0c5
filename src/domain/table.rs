// In-memory tabular data shared by the filter and aggregation stages
use super::error::ChartError;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Serialize, Serializer};
use std::collections::HashSet;
use std::fmt;

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];
const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
];

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Missing,
    Text(String),
    Integer(i64),
    Number(f64),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
}

impl Value {
    pub fn text(s: impl Into<String>) -> Self {
        Value::Text(s.into())
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            Value::Number(n) if n.fract() == 0.0 => Some(*n as i64),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Value::Date(d) => Some(*d),
            Value::DateTime(dt) => Some(dt.date()),
            _ => None,
        }
    }

    pub fn is_temporal(&self) -> bool {
        matches!(self, Value::Date(_) | Value::DateTime(_))
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Value::Integer(_) | Value::Number(_))
    }

    /// Parse a date or datetime from text; `None` when no known format matches
    pub fn parse_temporal(raw: &str) -> Option<Value> {
        let raw = raw.trim();
        if let Some(date) = DATE_FORMATS
            .iter()
            .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        {
            return Some(Value::Date(date));
        }
        if let Some(datetime) = DATETIME_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        {
            return Some(Value::DateTime(datetime));
        }
        DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|dt| Value::DateTime(dt.naive_local()))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Missing => Ok(()),
            Value::Text(s) => f.write_str(s),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Number(n) => write!(f, "{}", n),
            Value::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Value::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Missing => serializer.serialize_none(),
            Value::Integer(i) => serializer.serialize_i64(*i),
            Value::Number(n) if n.is_finite() => serializer.serialize_f64(*n),
            Value::Number(_) => serializer.serialize_none(),
            other => serializer.collect_str(other),
        }
    }
}

/// Column-labelled rows. Every row holds exactly one value per column.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn from_rows(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        let mut table = Self::new(columns);
        for row in rows {
            table.push_row(row);
        }
        table
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Append a row, padding short rows with `Missing` and dropping surplus cells
    pub fn push_row(&mut self, mut row: Vec<Value>) {
        row.resize(self.columns.len(), Value::Missing);
        self.rows.push(row);
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn require_column(&self, name: &str) -> Result<usize, ChartError> {
        self.column_index(name)
            .ok_or_else(|| ChartError::unknown_column(name))
    }

    pub fn column(&self, index: usize) -> impl Iterator<Item = &Value> {
        self.rows.iter().map(move |row| &row[index])
    }

    /// Replace a column's values, or append the column when it does not exist yet
    pub fn set_column(&mut self, name: &str, values: Vec<Value>) {
        debug_assert_eq!(values.len(), self.rows.len());
        match self.column_index(name) {
            Some(index) => {
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row[index] = value;
                }
            }
            None => {
                self.columns.push(name.to_string());
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row.push(value);
                }
            }
        }
    }

    /// Copy of the rows matching `keep`; the source table is left untouched
    pub fn filter_rows(&self, keep: impl Fn(&[Value]) -> bool) -> Table {
        Table {
            columns: self.columns.clone(),
            rows: self.rows.iter().filter(|row| keep(row)).cloned().collect(),
        }
    }

    /// Distinct non-missing values of a column in first-appearance order
    pub fn distinct(&self, index: usize) -> Vec<&Value> {
        let mut seen = HashSet::new();
        self.column(index)
            .filter(|v| !v.is_missing())
            .filter(|v| seen.insert(v.to_string()))
            .collect()
    }

    /// Restrict to rows whose cell in `index` renders as one of `allowed`
    pub fn retain_labels(&self, index: usize, allowed: &[String]) -> Table {
        let allowed: HashSet<&str> = allowed.iter().map(String::as_str).collect();
        self.filter_rows(|row| !row[index].is_missing() && allowed.contains(row[index].to_string().as_str()))
    }
}

/// Column roles a dataset offers to the chart setup workflow
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct DatasetSchema {
    pub dimensions: Vec<String>,
    pub measures: Vec<String>,
    pub dates: Vec<String>,
}

impl DatasetSchema {
    /// Numeric columns are measures, temporal columns dates, the rest dimensions
    pub fn classify(table: &Table) -> Self {
        let mut schema = Self::default();
        for (index, name) in table.columns().iter().enumerate() {
            let mut present = table.column(index).filter(|v| !v.is_missing()).peekable();
            if present.peek().is_none() {
                schema.dimensions.push(name.clone());
                continue;
            }
            let cells: Vec<&Value> = present.collect();
            if cells.iter().all(|v| v.is_numeric()) {
                schema.measures.push(name.clone());
            } else if cells.iter().all(|v| v.is_temporal()) {
                schema.dates.push(name.clone());
            } else {
                schema.dimensions.push(name.clone());
            }
        }
        schema
    }
}
