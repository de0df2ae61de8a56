//! Synthetic recordings with known spike times.
//!
//! Used to exercise the pipeline end to end and to check detection accuracy
//! against ground truth.

mod generate;

pub use generate::{generate_recording, RecordingConfig, SyntheticRecording};
