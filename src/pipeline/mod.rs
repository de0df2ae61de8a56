//! Pipeline orchestration: validation, detection and aggregation.

mod runner;

pub use runner::{run, run_files, Pipeline, PipelineRun, PipelineStage};
