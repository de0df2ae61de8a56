//! Parameter record for the spike counting pipeline.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::path::Path;

/// Key of the sampling rate entry (Hz).
pub const SAMPLE_RATE_KEY: &str = "sample_rate";
/// Key of the spike amplitude threshold entry.
pub const THRESHOLD_KEY: &str = "threshold";

/// Key-value parameter record as read from a JSON object.
///
/// Values are kept as raw JSON so that validation can distinguish a float
/// literal (`1500.0`) from an integer literal (`1500`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Parameters {
    entries: Map<String, JsonValue>,
}

impl Parameters {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record with float-typed `sample_rate` and `threshold` entries.
    pub fn with_rate_and_threshold(sample_rate: f64, threshold: f64) -> Self {
        Self::new()
            .with(SAMPLE_RATE_KEY, sample_rate)
            .with(THRESHOLD_KEY, threshold)
    }

    /// Parse a JSON object.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a JSON object from a file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Serialize as pretty-printed JSON.
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write as JSON to a file.
    pub fn to_json_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path, self.to_json_string()?)?;
        Ok(())
    }

    /// Set an entry, builder style.
    pub fn with(mut self, key: &str, value: impl Into<JsonValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Set an entry.
    pub fn insert(&mut self, key: &str, value: impl Into<JsonValue>) {
        self.entries.insert(key.to_string(), value.into());
    }

    /// Remove an entry.
    pub fn remove(&mut self, key: &str) -> Option<JsonValue> {
        self.entries.remove(key)
    }

    /// Get an entry.
    pub fn get(&self, key: &str) -> Option<&JsonValue> {
        self.entries.get(key)
    }

    /// Check if an entry exists.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_float_and_int_literals() {
        let params = Parameters::from_json_str(r#"{"sample_rate": 1500.0, "threshold": 10}"#).unwrap();
        assert!(params.get(SAMPLE_RATE_KEY).unwrap().is_f64());
        assert!(!params.get(THRESHOLD_KEY).unwrap().is_f64());
    }

    #[test]
    fn test_nan_becomes_null() {
        let params = Parameters::new().with(SAMPLE_RATE_KEY, f64::NAN);
        assert!(params.get(SAMPLE_RATE_KEY).unwrap().is_null());
    }

    #[test]
    fn test_file_roundtrip() {
        let params = Parameters::with_rate_and_threshold(2000.0, -45.5);
        let file = NamedTempFile::new().unwrap();
        params.to_json_file(file.path()).unwrap();

        let loaded = Parameters::from_json_file(file.path()).unwrap();
        assert_eq!(loaded, params);
        assert_eq!(loaded.get(SAMPLE_RATE_KEY).and_then(|v| v.as_f64()), Some(2000.0));
    }

    #[test]
    fn test_invalid_json() {
        assert!(Parameters::from_json_str("").is_err());
        assert!(Parameters::from_json_str("[1, 2]").is_err());
        assert!(Parameters::from_json_str(r#"{"sample_rate": NaN}"#).is_err());
    }
}
