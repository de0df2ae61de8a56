//! Pipeline runner.
//!
//! Rejected input never produces an error: a bad file, table or parameter
//! record is logged and yields an empty [`SpikeCounts`]. Errors returned from
//! [`Pipeline::run`] come from spike detection and indicate a processing
//! fault rather than malformed input.

use crate::aggregate::count_by_condition;
use crate::data::{Parameters, SpikeCounts, TraceTable};
use crate::detect::{DetectorConfig, SpikeDetector};
use crate::error::Result;
use crate::validate::{validate_input, NeuronTrace, ValidatedInput};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, error, info, warn};

/// Stage of a pipeline invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelineStage {
    Start,
    Loading,
    Validating,
    Detecting,
    Aggregating,
    Done,
}

/// Outcome of one pipeline invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineRun {
    /// Counts per condition; empty if the input was rejected.
    pub counts: SpikeCounts,
    /// Last stage entered before finishing.
    pub last_stage: PipelineStage,
    /// Why the input was rejected, if it was.
    pub rejection: Option<String>,
    /// Number of spikes detected per neuron, in column order.
    pub spikes_per_neuron: Vec<(String, usize)>,
}

impl PipelineRun {
    fn rejected(stage: PipelineStage, reason: String) -> Self {
        Self {
            counts: SpikeCounts::empty(),
            last_stage: stage,
            rejection: Some(reason),
            spikes_per_neuron: Vec::new(),
        }
    }

    /// Check if the input was rejected.
    pub fn is_rejected(&self) -> bool {
        self.rejection.is_some()
    }

    /// Total spikes over all neurons.
    pub fn total_spikes(&self) -> usize {
        self.spikes_per_neuron.iter().map(|(_, n)| n).sum()
    }
}

/// Validate → detect → aggregate pipeline.
#[derive(Debug, Clone)]
pub struct Pipeline {
    name: String,
    parallel: bool,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl Pipeline {
    /// Create a pipeline that detects spikes in parallel across neurons.
    pub fn new() -> Self {
        Self {
            name: "epoch-spikes".to_string(),
            parallel: true,
        }
    }

    /// Set the pipeline name used in log messages.
    pub fn name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    /// Detect spikes one neuron at a time.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }

    /// Count spikes per epoch condition.
    ///
    /// Returns an empty result if validation fails and an error if spike
    /// detection fails.
    pub fn run(&self, table: &TraceTable, parameters: &Parameters) -> Result<SpikeCounts> {
        Ok(self.execute(table, parameters)?.counts)
    }

    /// Load a CSV table and JSON parameter file, then run.
    ///
    /// Unreadable or malformed files give an empty result.
    pub fn run_files<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        data_path: P,
        parameters_path: Q,
    ) -> Result<SpikeCounts> {
        Ok(self.execute_files(data_path, parameters_path)?.counts)
    }

    /// Like [`Pipeline::run_files`] but returns the full run record.
    pub fn execute_files<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        data_path: P,
        parameters_path: Q,
    ) -> Result<PipelineRun> {
        let data_path = data_path.as_ref();
        let parameters_path = parameters_path.as_ref();
        debug!(pipeline = %self.name, stage = ?PipelineStage::Loading, "loading input files");

        let table = match TraceTable::from_csv(data_path) {
            Ok(table) => table,
            Err(e) => {
                let reason = format!("Error reading trace data file {:?}: {}", data_path, e);
                error!(pipeline = %self.name, "{}", reason);
                return Ok(PipelineRun::rejected(PipelineStage::Loading, reason));
            }
        };

        let parameters = match Parameters::from_json_file(parameters_path) {
            Ok(parameters) => parameters,
            Err(e) => {
                let reason = format!("Error reading parameters file {:?}: {}", parameters_path, e);
                error!(pipeline = %self.name, "{}", reason);
                return Ok(PipelineRun::rejected(PipelineStage::Loading, reason));
            }
        };

        self.execute(&table, &parameters)
    }

    /// Like [`Pipeline::run`] but returns the full run record.
    pub fn execute(&self, table: &TraceTable, parameters: &Parameters) -> Result<PipelineRun> {
        debug!(pipeline = %self.name, stage = ?PipelineStage::Validating, "validating input");
        let input = match validate_input(table, parameters) {
            Ok(input) => input,
            Err(e) => {
                let reason = format!("Input data validation failed due to: {}", e);
                warn!(pipeline = %self.name, "{}", reason);
                return Ok(PipelineRun::rejected(PipelineStage::Validating, reason));
            }
        };

        debug!(
            pipeline = %self.name,
            stage = ?PipelineStage::Detecting,
            neurons = input.n_neurons(),
            samples = input.n_samples(),
            "detecting spikes"
        );
        let spike_trains = self.detect_all(&input)?;

        debug!(pipeline = %self.name, stage = ?PipelineStage::Aggregating, "aggregating by condition");
        let pooled: Vec<usize> = spike_trains.iter().flatten().copied().collect();
        let counts = count_by_condition(&input.epochs, &pooled);

        let spikes_per_neuron: Vec<(String, usize)> = input
            .traces
            .iter()
            .zip(&spike_trains)
            .map(|(trace, spikes)| (trace.name.clone(), spikes.len()))
            .collect();

        info!(
            pipeline = %self.name,
            neurons = input.n_neurons(),
            spikes = pooled.len(),
            "pipeline finished"
        );

        Ok(PipelineRun {
            counts,
            last_stage: PipelineStage::Done,
            rejection: None,
            spikes_per_neuron,
        })
    }

    fn detect_all(&self, input: &ValidatedInput) -> Result<Vec<Vec<usize>>> {
        let detector = SpikeDetector::new(DetectorConfig::new(input.sample_rate, input.threshold))?;

        let detect_one = |trace: &NeuronTrace| -> Result<Vec<usize>> {
            let spikes = detector.detect(&trace.samples)?;
            debug!(neuron = %trace.name, spikes = spikes.len(), "detected spikes");
            Ok(spikes)
        };

        if self.parallel {
            input.traces.par_iter().map(detect_one).collect()
        } else {
            input.traces.iter().map(detect_one).collect()
        }
    }
}

/// Run the default pipeline on an in-memory table and parameter record.
pub fn run(table: &TraceTable, parameters: &Parameters) -> Result<SpikeCounts> {
    Pipeline::new().run(table, parameters)
}

/// Run the default pipeline on a CSV data file and JSON parameter file.
pub fn run_files<P: AsRef<Path>, Q: AsRef<Path>>(
    data_path: P,
    parameters_path: Q,
) -> Result<SpikeCounts> {
    Pipeline::new().run_files(data_path, parameters_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Condition, SAMPLE_RATE_KEY, THRESHOLD_KEY};
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_test_table() -> TraceTable {
        TraceTable::new()
            .with_column("trial_on", vec![true, false, false, false, true, true])
            .unwrap()
            .with_column("reward_on", vec![false, true, false, true, true, true])
            .unwrap()
            .with_column("light_on", vec![false, false, true, true, false, true])
            .unwrap()
            .with_column("neuron_1", vec![0i64, 1, 0, 1, 1, 0])
            .unwrap()
            .with_column("neuron_2", vec![-1i64, 1, 1, 0, 0, -1])
            .unwrap()
            .with_column("neuron_3", vec![1i64, 0, -1, 1, -1, -1])
            .unwrap()
    }

    #[test]
    fn test_run_counts() {
        let counts = run(&create_test_table(), &Parameters::with_rate_and_threshold(1500.0, -100.0)).unwrap();
        assert_eq!(counts.len(), 7);
        assert_eq!(counts.get(Condition::Reward), Some(3));
        assert_eq!(counts.get(Condition::RewardLight), Some(2));
    }

    #[test]
    fn test_sequential_matches_parallel() {
        let params = Parameters::with_rate_and_threshold(1500.0, -100.0);
        let table = create_test_table();
        let parallel = Pipeline::new().run(&table, &params).unwrap();
        let sequential = Pipeline::new().sequential().run(&table, &params).unwrap();
        assert_eq!(parallel, sequential);
    }

    #[test]
    fn test_execute_record() {
        let run = Pipeline::new()
            .execute(&create_test_table(), &Parameters::with_rate_and_threshold(1500.0, -100.0))
            .unwrap();

        assert!(!run.is_rejected());
        assert_eq!(run.last_stage, PipelineStage::Done);
        assert_eq!(
            run.spikes_per_neuron,
            vec![
                ("neuron_1".to_string(), 1),
                ("neuron_2".to_string(), 1),
                ("neuron_3".to_string(), 1)
            ]
        );
        assert_eq!(run.total_spikes(), 3);
    }

    #[test]
    fn test_validation_failure_is_empty() {
        let params = Parameters::new().with(SAMPLE_RATE_KEY, 1500.0);
        let run = Pipeline::new().execute(&create_test_table(), &params).unwrap();

        assert!(run.counts.is_empty());
        assert_eq!(run.last_stage, PipelineStage::Validating);
        assert!(run.rejection.unwrap().contains(THRESHOLD_KEY));
    }

    #[test]
    fn test_short_trace_is_error() {
        // 10 kHz needs a 21-sample window; the table only has 6 rows
        let result = run(&create_test_table(), &Parameters::with_rate_and_threshold(10_000.0, 0.0));
        assert!(matches!(
            result,
            Err(crate::error::SpikeError::WindowTooLong { window: 21, len: 6 })
        ));
    }

    #[test]
    fn test_unreadable_files_are_empty() {
        let mut params_file = NamedTempFile::new().unwrap();
        write!(params_file, r#"{{"sample_rate": 1500.0, "threshold": 0.0}}"#).unwrap();
        params_file.flush().unwrap();

        let run = Pipeline::new()
            .execute_files("/nonexistent/data.csv", params_file.path())
            .unwrap();
        assert!(run.counts.is_empty());
        assert_eq!(run.last_stage, PipelineStage::Loading);
    }
}
