//! Validation of the trace table and parameter record.
//!
//! Validation turns loosely typed input into a [`ValidatedInput`] whose
//! epoch markers are plain booleans and whose traces are finite `f64`s, so
//! later stages never re-check types.

use crate::aggregate::EpochMarkers;
use crate::data::{
    Parameters, TraceTable, Value, EPOCH_COLUMNS, LIGHT_COLUMN, REWARD_COLUMN, SAMPLE_RATE_KEY,
    THRESHOLD_KEY, TRIAL_COLUMN,
};
use serde_json::Value as JsonValue;
use thiserror::Error;

/// Reason an input was rejected.
///
/// The `Display` form is the human-readable reason that gets logged.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Critical temporal epoch column '{0}' not in input data")]
    MissingEpochColumn(String),

    #[error("Critical temporal epoch column '{column}' has a non-boolean value ({found}) at row {row}")]
    NonBooleanEpoch {
        column: String,
        row: usize,
        found: &'static str,
    },

    #[error("Found missing (NaN) value in column '{column}' at row {row}")]
    MissingNeuronValue { column: String, row: usize },

    #[error("Found non-numeric value ({found}) in column '{column}' at row {row}")]
    NonNumericNeuronValue {
        column: String,
        row: usize,
        found: &'static str,
    },

    #[error("Found non-finite value in column '{column}' at row {row}")]
    NonFiniteNeuronValue { column: String, row: usize },

    #[error("Inconsistent column lengths: {0}")]
    InconsistentLengths(String),

    #[error("Input data has no samples")]
    NoSamples,

    #[error("Input data has no neuron voltage trace columns")]
    NoNeuronColumns,

    #[error("Parameter '{0}' missing in input parameters")]
    MissingParameter(String),

    #[error("Parameter '{key}' value type is not float ({found}) in input parameters")]
    NonFloatParameter { key: String, found: &'static str },

    #[error("Parameter 'sample_rate' must be positive, got {0}")]
    NonPositiveSampleRate(f64),
}

/// A neuron voltage trace that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct NeuronTrace {
    /// Column name.
    pub name: String,
    /// Voltage samples, all finite.
    pub samples: Vec<f64>,
}

/// Input that passed every validation check.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedInput {
    /// The three epoch marker columns.
    pub epochs: EpochMarkers,
    /// Neuron traces in table column order.
    pub traces: Vec<NeuronTrace>,
    /// Sampling rate in Hz.
    pub sample_rate: f64,
    /// Spike amplitude threshold.
    pub threshold: f64,
}

impl ValidatedInput {
    /// Number of time samples.
    pub fn n_samples(&self) -> usize {
        self.epochs.len()
    }

    /// Number of neuron traces.
    pub fn n_neurons(&self) -> usize {
        self.traces.len()
    }
}

/// Validate a trace table and parameter record.
///
/// Checks run in a fixed order and the first failure is reported:
/// 1. all three epoch marker columns are present;
/// 2. epoch marker values are booleans (integers and text are rejected);
/// 3. neuron values are present, numeric and finite;
/// 4. the table has at least one sample and at least one neuron column;
/// 5. `sample_rate` and `threshold` are present;
/// 6. both are JSON floats (integer literals are rejected);
/// 7. `sample_rate` is positive.
pub fn validate_input(
    table: &TraceTable,
    parameters: &Parameters,
) -> Result<ValidatedInput, ValidationError> {
    for column in EPOCH_COLUMNS {
        if !table.has_column(column) {
            return Err(ValidationError::MissingEpochColumn(column.to_string()));
        }
    }

    let trial = boolean_column(table, TRIAL_COLUMN)?;
    let reward = boolean_column(table, REWARD_COLUMN)?;
    let light = boolean_column(table, LIGHT_COLUMN)?;

    let mut traces = Vec::new();
    for (name, values) in table.iter() {
        if EPOCH_COLUMNS.contains(&name) {
            continue;
        }
        traces.push(NeuronTrace {
            name: name.to_string(),
            samples: numeric_column(name, values)?,
        });
    }

    if table.n_rows() == 0 {
        return Err(ValidationError::NoSamples);
    }
    if traces.is_empty() {
        return Err(ValidationError::NoNeuronColumns);
    }

    for key in [SAMPLE_RATE_KEY, THRESHOLD_KEY] {
        if !parameters.contains(key) {
            return Err(ValidationError::MissingParameter(key.to_string()));
        }
    }
    let sample_rate = float_parameter(parameters, SAMPLE_RATE_KEY)?;
    let threshold = float_parameter(parameters, THRESHOLD_KEY)?;

    if !(sample_rate.is_finite() && sample_rate > 0.0) {
        return Err(ValidationError::NonPositiveSampleRate(sample_rate));
    }

    let epochs = EpochMarkers::new(trial, reward, light)
        .map_err(|e| ValidationError::InconsistentLengths(e.to_string()))?;

    Ok(ValidatedInput {
        epochs,
        traces,
        sample_rate,
        threshold,
    })
}

fn boolean_column(table: &TraceTable, column: &str) -> Result<Vec<bool>, ValidationError> {
    let values = table
        .column(column)
        .ok_or_else(|| ValidationError::MissingEpochColumn(column.to_string()))?;
    values
        .iter()
        .enumerate()
        .map(|(row, value)| {
            value.as_bool().ok_or(ValidationError::NonBooleanEpoch {
                column: column.to_string(),
                row,
                found: value.type_name(),
            })
        })
        .collect()
}

fn numeric_column(column: &str, values: &[Value]) -> Result<Vec<f64>, ValidationError> {
    values
        .iter()
        .enumerate()
        .map(|(row, value)| {
            if value.is_missing() {
                return Err(ValidationError::MissingNeuronValue {
                    column: column.to_string(),
                    row,
                });
            }
            let v = value.as_f64().ok_or(ValidationError::NonNumericNeuronValue {
                column: column.to_string(),
                row,
                found: value.type_name(),
            })?;
            if !v.is_finite() {
                return Err(ValidationError::NonFiniteNeuronValue {
                    column: column.to_string(),
                    row,
                });
            }
            Ok(v)
        })
        .collect()
}

fn float_parameter(parameters: &Parameters, key: &str) -> Result<f64, ValidationError> {
    let value = parameters
        .get(key)
        .ok_or_else(|| ValidationError::MissingParameter(key.to_string()))?;
    match value {
        JsonValue::Number(n) if n.is_f64() => n.as_f64().ok_or(ValidationError::NonFloatParameter {
            key: key.to_string(),
            found: "number",
        }),
        other => Err(ValidationError::NonFloatParameter {
            key: key.to_string(),
            found: json_type_name(other),
        }),
    }
}

fn json_type_name(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "bool",
        JsonValue::Number(_) => "int",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}
