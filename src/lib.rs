//! Epoch-conditioned spike counting.
//!
//! Takes a table of per-neuron voltage traces with three boolean epoch
//! markers (`trial_on`, `reward_on`, `light_on`), detects spikes in each
//! trace and counts, for every epoch combination, how many spikes fell
//! inside it.
//!
//! # Overview
//!
//! - **data**: Trace table, parameter record and result types
//! - **validate**: Structural and type checks on the input
//! - **detect**: Savitzky-Golay smoothing and peak detection
//! - **aggregate**: Counting pooled spikes per epoch condition
//! - **pipeline**: Validation → detection → aggregation
//! - **benchmark**: Synthetic recordings with known spike times
//!
//! # Example
//!
//! ```no_run
//! use epoch_spikes::prelude::*;
//!
//! let table = TraceTable::from_csv("data.csv").unwrap();
//! let params = Parameters::from_json_file("parameters.json").unwrap();
//!
//! let counts = Pipeline::new().run(&table, &params).unwrap();
//! println!("{}", counts.to_json_string().unwrap());
//! ```

pub mod aggregate;
pub mod benchmark;
pub mod data;
pub mod detect;
pub mod error;
pub mod pipeline;
pub mod validate;

/// Convenient re-exports for common usage.
pub mod prelude {
    pub use crate::aggregate::{count_by_condition, EpochMarkers};
    pub use crate::benchmark::{generate_recording, RecordingConfig, SyntheticRecording};
    pub use crate::data::{Condition, Parameters, SpikeCounts, TraceTable, Value};
    pub use crate::detect::{count_spikes, find_peaks, savgol_filter, DetectorConfig, SpikeDetector};
    pub use crate::error::{Result, SpikeError};
    pub use crate::pipeline::{run, run_files, Pipeline, PipelineRun, PipelineStage};
    pub use crate::validate::{validate_input, ValidatedInput, ValidationError};
}
