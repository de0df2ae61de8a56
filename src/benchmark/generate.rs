//! Synthetic recording generation.
//!
//! Produces a trace table with square-wave epoch markers and noisy
//! extracellular-like voltage traces, together with the sample indices at
//! which spikes were injected.

use crate::data::{Parameters, TraceTable, LIGHT_COLUMN, REWARD_COLUMN, TRIAL_COLUMN};
use crate::error::{Result, SpikeError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration for synthetic recording generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordingConfig {
    /// Number of samples per trace.
    pub n_samples: usize,
    /// Number of neuron columns.
    pub n_neurons: usize,
    /// Sampling rate written to the parameter record (Hz).
    pub sample_rate: f64,
    /// Detection threshold written to the parameter record.
    pub threshold: f64,
    /// Resting membrane voltage.
    pub baseline: f64,
    /// Standard deviation of the latent membrane fluctuation.
    pub membrane_std: f64,
    /// Latent voltage above which a spike fires.
    pub trigger: f64,
    /// Samples that must pass after a firing candidate before the next.
    pub refractory: usize,
    /// Peak height of a spike above baseline.
    pub spike_amplitude: f64,
    /// Length of the spike waveform kernel in samples.
    pub kernel_len: usize,
    /// Width (standard deviation) of the spike waveform in samples.
    pub kernel_std: f64,
    /// Standard deviation of additive recording noise.
    pub noise_std: f64,
    /// Period of the trial marker; trial is on in the upper half.
    pub trial_period: usize,
    /// Period of the light marker.
    pub light_period: usize,
    /// Random seed for reproducibility.
    pub seed: u64,
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            n_samples: 100_000,
            n_neurons: 7,
            sample_rate: 10_000.0,
            threshold: 0.0,
            baseline: -70.0,
            membrane_std: 8.0,
            trigger: -45.0,
            refractory: 40,
            spike_amplitude: 100.0,
            kernel_len: 50,
            kernel_std: 10.0,
            noise_std: 10.0,
            trial_period: 1000,
            light_period: 2000,
            seed: 42,
        }
    }
}

impl RecordingConfig {
    /// Set trace dimensions.
    pub fn with_dimensions(mut self, n_samples: usize, n_neurons: usize) -> Self {
        self.n_samples = n_samples;
        self.n_neurons = n_neurons;
        self
    }

    /// Set the parameter record values.
    pub fn with_parameters(mut self, sample_rate: f64, threshold: f64) -> Self {
        self.sample_rate = sample_rate;
        self.threshold = threshold;
        self
    }

    /// Set random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Trial marker for a sample.
    fn trial_on(&self, i: usize) -> bool {
        i % self.trial_period > self.trial_period / 2
    }

    /// Reward marker: last quarter of each trial period.
    fn reward_on(&self, i: usize) -> bool {
        i % self.trial_period > self.trial_period * 3 / 4
    }

    fn light_on(&self, i: usize) -> bool {
        i % self.light_period > self.light_period * 9 / 20
    }
}

/// Generated recording with ground truth.
#[derive(Debug, Clone)]
pub struct SyntheticRecording {
    /// Epoch markers plus one voltage column per neuron.
    pub table: TraceTable,
    /// Parameter record matching the config.
    pub parameters: Parameters,
    /// Injected spike indices per neuron, ascending.
    pub spike_times: Vec<(String, Vec<usize>)>,
    /// Config used for generation.
    pub config: RecordingConfig,
}

impl SyntheticRecording {
    /// Total injected spikes across neurons.
    pub fn total_spikes(&self) -> usize {
        self.spike_times.iter().map(|(_, s)| s.len()).sum()
    }

    /// Write `data.csv` and `parameters.json` into a directory.
    ///
    /// Returns the two written paths.
    pub fn to_files(&self, dir: &Path) -> Result<(PathBuf, PathBuf)> {
        std::fs::create_dir_all(dir)?;
        let data_path = dir.join("data.csv");
        let parameters_path = dir.join("parameters.json");
        self.table.to_csv(&data_path)?;
        self.parameters.to_json_file(&parameters_path)?;
        Ok((data_path, parameters_path))
    }
}

/// Seeded xorshift64 stream feeding the membrane and recording noise.
struct NoiseSource {
    state: u64,
}

impl NoiseSource {
    fn seeded(seed: u64) -> Self {
        // An all-zero state never leaves zero
        Self { state: seed.max(1) }
    }

    /// Uniform sample in `[0, 1)` from the top 53 bits.
    fn uniform(&mut self) -> f64 {
        self.state ^= self.state << 13;
        self.state ^= self.state >> 7;
        self.state ^= self.state << 17;
        (self.state >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Normal sample by Box-Muller.
    fn gaussian(&mut self, mean: f64, std: f64) -> f64 {
        let radius = (-2.0 * (1.0 - self.uniform()).ln()).sqrt();
        let angle = std::f64::consts::TAU * self.uniform();
        mean + std * radius * angle.cos()
    }
}

/// Gaussian window normalised to a peak of 1.
fn spike_kernel(len: usize, std: f64) -> Vec<f64> {
    let centre = (len as f64 - 1.0) / 2.0;
    let raw: Vec<f64> = (0..len)
        .map(|k| {
            let n = k as f64 - centre;
            (-n * n / (2.0 * std * std)).exp()
        })
        .collect();
    let peak = raw.iter().copied().fold(0.0, f64::max);
    if peak > 0.0 {
        raw.into_iter().map(|w| w / peak).collect()
    } else {
        raw
    }
}

/// Firing times for one neuron.
///
/// A sample is a candidate when the latent membrane voltage crosses the
/// trigger level. A candidate fires only if it lies at least `refractory`
/// samples after the previous candidate (the first is measured from 0).
fn spike_train(rng: &mut NoiseSource, config: &RecordingConfig) -> Vec<usize> {
    let candidates: Vec<usize> = (0..config.n_samples)
        .filter(|_| rng.gaussian(config.baseline, config.membrane_std) > config.trigger)
        .collect();

    let mut fired = Vec::new();
    let mut previous = 0;
    for &candidate in &candidates {
        if candidate - previous >= config.refractory {
            fired.push(candidate);
        }
        previous = candidate;
    }
    fired
}

/// Voltage trace: baseline, spike waveforms centred on each firing time, noise.
fn voltage_trace(rng: &mut NoiseSource, config: &RecordingConfig, spikes: &[usize], kernel: &[f64]) -> Vec<f64> {
    let n = config.n_samples;
    let mut trace = vec![config.baseline; n];

    let offset = (kernel.len().saturating_sub(1) / 2) as isize;
    for &s in spikes {
        for (k, &w) in kernel.iter().enumerate() {
            let j = s as isize + k as isize - offset;
            if j >= 0 && (j as usize) < n {
                trace[j as usize] += config.spike_amplitude * w;
            }
        }
    }

    for v in trace.iter_mut() {
        *v += rng.gaussian(0.0, config.noise_std);
    }
    trace
}

/// Generate a synthetic recording.
///
/// Fails with [`SpikeError::InvalidParameter`] if an epoch period is zero.
pub fn generate_recording(config: &RecordingConfig) -> Result<SyntheticRecording> {
    if config.trial_period == 0 || config.light_period == 0 {
        return Err(SpikeError::InvalidParameter(format!(
            "Epoch periods must be positive, got trial {} and light {}",
            config.trial_period, config.light_period
        )));
    }

    let mut rng = NoiseSource::seeded(config.seed);
    let n = config.n_samples;

    let mut table = TraceTable::new()
        .with_column(TRIAL_COLUMN, (0..n).map(|i| config.trial_on(i)).collect::<Vec<bool>>())?
        .with_column(REWARD_COLUMN, (0..n).map(|i| config.reward_on(i)).collect::<Vec<bool>>())?
        .with_column(LIGHT_COLUMN, (0..n).map(|i| config.light_on(i)).collect::<Vec<bool>>())?;

    let kernel = spike_kernel(config.kernel_len, config.kernel_std);
    let mut spike_times = Vec::with_capacity(config.n_neurons);

    for neuron in 0..config.n_neurons {
        let name = format!("neuron_{}", neuron + 1);
        let spikes = spike_train(&mut rng, config);
        let trace = voltage_trace(&mut rng, config, &spikes, &kernel);
        table.add_column(name.clone(), trace)?;
        spike_times.push((name, spikes));
    }

    Ok(SyntheticRecording {
        table,
        parameters: Parameters::with_rate_and_threshold(config.sample_rate, config.threshold),
        spike_times,
        config: config.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::count_spikes;

    fn small_config() -> RecordingConfig {
        RecordingConfig::default().with_dimensions(20_000, 3)
    }

    #[test]
    fn test_generate_shape() {
        let rec = generate_recording(&small_config()).unwrap();

        assert_eq!(rec.table.n_rows(), 20_000);
        assert_eq!(rec.table.n_columns(), 6);
        assert_eq!(rec.table.neuron_columns(), vec!["neuron_1", "neuron_2", "neuron_3"]);
        assert_eq!(rec.spike_times.len(), 3);
        assert!(rec.total_spikes() > 0);
    }

    #[test]
    fn test_reproducibility() {
        let rec1 = generate_recording(&small_config()).unwrap();
        let rec2 = generate_recording(&small_config()).unwrap();
        assert_eq!(rec1.spike_times, rec2.spike_times);
        assert_eq!(rec1.table, rec2.table);

        let rec3 = generate_recording(&small_config().with_seed(7)).unwrap();
        assert_ne!(rec1.spike_times, rec3.spike_times);
    }

    #[test]
    fn test_epoch_markers() {
        let config = small_config();
        assert!(!config.trial_on(500));
        assert!(config.trial_on(501));
        assert!(!config.reward_on(750));
        assert!(config.reward_on(751));
        assert!(!config.light_on(900));
        assert!(config.light_on(901));
        assert!(!config.light_on(2000));
    }

    #[test]
    fn test_zero_period_rejected() {
        let mut config = small_config();
        config.trial_period = 0;
        assert!(matches!(
            generate_recording(&config),
            Err(SpikeError::InvalidParameter(_))
        ));

        let mut config = small_config();
        config.light_period = 0;
        assert!(generate_recording(&config).is_err());
    }

    #[test]
    fn test_refractory_gap_is_inclusive() {
        // Force every sample to be a candidate: gaps equal to the refractory
        // period must fire
        let mut config = small_config().with_dimensions(200, 1);
        config.trigger = f64::NEG_INFINITY;
        config.refractory = 1;
        let mut rng = NoiseSource::seeded(config.seed);
        let fired = spike_train(&mut rng, &config);
        assert_eq!(fired, (1..200).collect::<Vec<usize>>());

        config.refractory = 2;
        let fired = spike_train(&mut rng, &config);
        assert!(fired.is_empty());
    }

    #[test]
    fn test_refractory_respected() {
        let config = small_config();
        let rec = generate_recording(&config).unwrap();
        for (_, spikes) in &rec.spike_times {
            assert!(spikes.windows(2).all(|w| w[1] - w[0] >= config.refractory));
            assert!(spikes.iter().all(|&s| s >= config.refractory));
        }
    }

    #[test]
    fn test_kernel_peak() {
        let kernel = spike_kernel(50, 10.0);
        assert_eq!(kernel.len(), 50);
        let peak = kernel.iter().copied().fold(0.0, f64::max);
        assert!((peak - 1.0).abs() < 1e-12);
        assert!((kernel[24] - kernel[25]).abs() < 1e-12);
        assert!(kernel[0] < 0.1);
    }

    #[test]
    fn test_detection_recovers_spikes() {
        let rec = generate_recording(&small_config()).unwrap();
        let truth = rec.total_spikes() as f64;

        let mut detected = 0usize;
        for name in rec.table.neuron_columns() {
            let trace: Vec<f64> = rec
                .table
                .column(name)
                .unwrap()
                .iter()
                .map(|v| v.as_f64().unwrap())
                .collect();
            detected += count_spikes(&trace, 10_000.0, 0.0).unwrap().len();
        }

        let ratio = detected as f64 / truth;
        assert!(ratio > 0.8 && ratio < 1.2, "detected {} of {}", detected, truth);
    }
}
