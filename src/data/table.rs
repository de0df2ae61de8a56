//! Column-oriented trace table holding epoch markers and neuron voltages.

use crate::error::{Result, SpikeError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Read;
use std::path::Path;

/// Epoch marker column for trial periods.
pub const TRIAL_COLUMN: &str = "trial_on";
/// Epoch marker column for reward periods.
pub const REWARD_COLUMN: &str = "reward_on";
/// Epoch marker column for light-stimulation periods.
pub const LIGHT_COLUMN: &str = "light_on";
/// All epoch marker columns, in trial/reward/light order.
pub const EPOCH_COLUMNS: [&str; 3] = [TRIAL_COLUMN, REWARD_COLUMN, LIGHT_COLUMN];

/// A single cell of a trace table.
///
/// Cells keep the type they were read with, so that validation can tell a
/// boolean `True` from an integer `1` or a missing entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Floating-point value.
    Float(f64),
    /// Anything that did not parse as one of the above.
    Text(String),
    /// Missing value.
    Missing,
}

impl Value {
    /// Parse a raw delimited-text cell.
    ///
    /// `True`/`False` (any case) become booleans, blank, `NA` and `NaN`
    /// become [`Value::Missing`], then integers and floats are tried before
    /// falling back to text.
    pub fn parse_cell(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Value::Missing;
        }
        match trimmed.to_ascii_lowercase().as_str() {
            "true" => return Value::Bool(true),
            "false" => return Value::Bool(false),
            "na" | "nan" | "null" | "none" => return Value::Missing,
            _ => {}
        }
        if let Ok(v) = trimmed.parse::<i64>() {
            return Value::Int(v);
        }
        match trimmed.parse::<f64>() {
            Ok(v) if v.is_nan() => Value::Missing,
            Ok(v) => Value::Float(v),
            Err(_) => Value::Text(trimmed.to_string()),
        }
    }

    /// Check if this is a missing value (including a stored NaN).
    pub fn is_missing(&self) -> bool {
        match self {
            Value::Missing => true,
            Value::Float(v) => v.is_nan(),
            _ => false,
        }
    }

    /// Try to get as a boolean. Integers are not coerced.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Try to get as a number. Booleans are not coerced.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Short name of the value's type, used in validation messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Text(_) => "text",
            Value::Missing => "missing",
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        if v.is_nan() {
            Value::Missing
        } else {
            Value::Float(v)
        }
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(true) => write!(f, "True"),
            Value::Bool(false) => write!(f, "False"),
            Value::Int(v) => write!(f, "{}", v),
            // Debug keeps the decimal point so the value reloads as a float
            Value::Float(v) => write!(f, "{:?}", v),
            Value::Text(s) => write!(f, "{}", s),
            Value::Missing => Ok(()),
        }
    }
}

/// A table of equally long, named columns.
///
/// Rows are time samples. Three columns are expected to be the epoch markers
/// named in [`EPOCH_COLUMNS`]; every other column is a neuron voltage trace.
/// The table itself only enforces equal column lengths and unique names, the
/// remaining invariants are checked by [`crate::validate::validate_input`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TraceTable {
    /// Columns in insertion order.
    columns: Vec<(String, Vec<Value>)>,
    /// Number of rows, fixed by the first column added.
    n_rows: usize,
}

impl TraceTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a column.
    ///
    /// The first column fixes the row count; later columns must match it.
    pub fn add_column<S, V>(&mut self, name: S, values: Vec<V>) -> Result<()>
    where
        S: Into<String>,
        V: Into<Value>,
    {
        let name = name.into();
        if self.has_column(&name) {
            return Err(SpikeError::DuplicateColumn(name));
        }
        if !self.columns.is_empty() && values.len() != self.n_rows {
            return Err(SpikeError::DimensionMismatch {
                column: name,
                expected: self.n_rows,
                actual: values.len(),
            });
        }
        self.n_rows = values.len();
        self.columns
            .push((name, values.into_iter().map(Into::into).collect()));
        Ok(())
    }

    /// Builder form of [`TraceTable::add_column`].
    pub fn with_column<S, V>(mut self, name: S, values: Vec<V>) -> Result<Self>
    where
        S: Into<String>,
        V: Into<Value>,
    {
        self.add_column(name, values)?;
        Ok(self)
    }

    /// Load a table from a CSV file with one header row.
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    /// Load a table from any CSV source with one header row.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let header: Vec<String> = csv_reader.headers()?.iter().map(String::from).collect();
        if header.is_empty() || header.iter().all(|h| h.is_empty()) {
            return Err(SpikeError::EmptyData("CSV has no header row".to_string()));
        }

        let mut raw_columns: Vec<Vec<Value>> = vec![Vec::new(); header.len()];
        for record in csv_reader.records() {
            let record = record?;
            for (col_idx, field) in record.iter().enumerate() {
                raw_columns[col_idx].push(Value::parse_cell(field));
            }
        }

        let mut table = Self::new();
        for (name, values) in header.into_iter().zip(raw_columns) {
            table.add_column(name, values)?;
        }
        Ok(table)
    }

    /// Write the table to a CSV file with one header row.
    pub fn to_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record(self.columns.iter().map(|(name, _)| name.as_str()))?;
        for row in 0..self.n_rows {
            writer.write_record(
                self.columns
                    .iter()
                    .map(|(_, values)| values[row].to_string()),
            )?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Number of rows (time samples).
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    /// Number of columns.
    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    /// Check if a column exists.
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|(n, _)| n == name)
    }

    /// Get the values of a column.
    pub fn column(&self, name: &str) -> Option<&[Value]> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, values)| values.as_slice())
    }

    /// Names of all columns that are not epoch markers.
    pub fn neuron_columns(&self) -> Vec<&str> {
        self.columns
            .iter()
            .map(|(name, _)| name.as_str())
            .filter(|name| !EPOCH_COLUMNS.contains(name))
            .collect()
    }

    /// Iterate over `(name, values)` pairs in column order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Value])> {
        self.columns
            .iter()
            .map(|(name, values)| (name.as_str(), values.as_slice()))
    }

    /// Remove a column, returning its values.
    pub fn drop_column(&mut self, name: &str) -> Option<Vec<Value>> {
        let idx = self.columns.iter().position(|(n, _)| n == name)?;
        let (_, values) = self.columns.remove(idx);
        if self.columns.is_empty() {
            self.n_rows = 0;
        }
        Some(values)
    }

    /// Overwrite a single cell.
    pub fn set(&mut self, name: &str, row: usize, value: impl Into<Value>) -> Result<()> {
        let n_rows = self.n_rows;
        let values = self
            .columns
            .iter_mut()
            .find(|(n, _)| n == name)
            .map(|(_, values)| values)
            .ok_or_else(|| SpikeError::InvalidParameter(format!("No column '{}'", name)))?;
        let cell = values.get_mut(row).ok_or_else(|| {
            SpikeError::InvalidParameter(format!(
                "Row {} out of bounds for {} rows",
                row, n_rows
            ))
        })?;
        *cell = value.into();
        Ok(())
    }
}
