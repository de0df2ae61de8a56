//! Error types for the epoch-spikes library.

use thiserror::Error;

/// Main error type for the library.
///
/// Loading errors (`Io`, `Csv`, `Json`, `EmptyData`) are recovered by the
/// file-level pipeline entry point. `WindowTooLong` and `InvalidParameter`
/// come out of spike detection and always reach the caller.
#[derive(Error, Debug)]
pub enum SpikeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Dimension mismatch for column '{column}': expected {expected} rows, got {actual}")]
    DimensionMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },

    #[error("Duplicate column '{0}'")]
    DuplicateColumn(String),

    #[error("Empty data: {0}")]
    EmptyData(String),

    #[error("Smoothing window of {window} samples exceeds trace length {len}")]
    WindowTooLong { window: usize, len: usize },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, SpikeError>;
