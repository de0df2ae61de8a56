//! Spike detection: Savitzky-Golay smoothing followed by peak finding.

use crate::detect::peaks::find_peaks;
use crate::detect::smooth::savgol_filter;
use crate::error::{Result, SpikeError};
use serde::{Deserialize, Serialize};

/// Sampling rate used when none is configured (Hz).
pub const DEFAULT_SAMPLE_RATE: f64 = 10_000.0;
/// Spike amplitude threshold used when none is configured.
pub const DEFAULT_THRESHOLD: f64 = 10.0;
/// Polynomial order of the smoothing filter.
pub const SMOOTHING_POLYORDER: usize = 2;

/// A spike waveform spans roughly `sample_rate / 500` samples (2 ms).
const SPIKE_WIDTH_DIVISOR: f64 = 500.0;
/// Minimum spacing between two detected spikes, in milliseconds.
const REFRACTORY_MS: f64 = 2.0;
/// Shortest usable smoothing window.
const MIN_WINDOW: usize = 3;

/// Sampling rate and amplitude threshold for spike detection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Sampling rate in Hz.
    pub sample_rate: f64,
    /// Minimum smoothed amplitude of a spike.
    pub threshold: f64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

impl DetectorConfig {
    /// Create a config.
    pub fn new(sample_rate: f64, threshold: f64) -> Self {
        Self {
            sample_rate,
            threshold,
        }
    }

    /// Smoothing window in samples: `sample_rate / 500` rounded, bumped to
    /// the next odd number, and at least 3.
    pub fn window_length(&self) -> usize {
        let mut window = (self.sample_rate / SPIKE_WIDTH_DIVISOR).round() as usize;
        if window % 2 == 0 {
            window += 1;
        }
        window.max(MIN_WINDOW)
    }

    /// Minimum spacing between spikes in samples, at least 1.
    pub fn refractory_samples(&self) -> usize {
        let samples = (self.sample_rate * REFRACTORY_MS / 1000.0).ceil() as usize;
        samples.max(1)
    }
}

/// Detects spikes in single voltage traces.
///
/// # Example
/// ```
/// use epoch_spikes::detect::{DetectorConfig, SpikeDetector};
///
/// let detector = SpikeDetector::new(DetectorConfig::new(1500.0, 0.5)).unwrap();
/// let spikes = detector.detect(&[0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0]).unwrap();
/// assert_eq!(spikes, vec![2]);
/// ```
#[derive(Debug, Clone)]
pub struct SpikeDetector {
    config: DetectorConfig,
    window: usize,
    distance: usize,
}

impl SpikeDetector {
    /// Create a detector, checking that the config is usable.
    pub fn new(config: DetectorConfig) -> Result<Self> {
        if !(config.sample_rate.is_finite() && config.sample_rate > 0.0) {
            return Err(SpikeError::InvalidParameter(format!(
                "Sample rate must be positive and finite, got {}",
                config.sample_rate
            )));
        }
        if !config.threshold.is_finite() {
            return Err(SpikeError::InvalidParameter(format!(
                "Threshold must be finite, got {}",
                config.threshold
            )));
        }
        Ok(Self {
            window: config.window_length(),
            distance: config.refractory_samples(),
            config,
        })
    }

    /// The detector's config.
    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Smoothing window in samples.
    pub fn window(&self) -> usize {
        self.window
    }

    /// Minimum spacing between spikes in samples.
    pub fn distance(&self) -> usize {
        self.distance
    }

    /// Smooth a trace with the detector's window.
    pub fn smooth(&self, trace: &[f64]) -> Result<Vec<f64>> {
        savgol_filter(trace, self.window, SMOOTHING_POLYORDER)
    }

    /// Sample indices of detected spikes, ascending.
    ///
    /// Fails with [`SpikeError::WindowTooLong`] if the trace is shorter than
    /// the smoothing window.
    pub fn detect(&self, trace: &[f64]) -> Result<Vec<usize>> {
        let smoothed = self.smooth(trace)?;
        Ok(find_peaks(&smoothed, self.config.threshold, self.distance))
    }
}

/// Detect spikes in one trace with an explicit sampling rate and threshold.
pub fn count_spikes(trace: &[f64], sample_rate: f64, threshold: f64) -> Result<Vec<usize>> {
    SpikeDetector::new(DetectorConfig::new(sample_rate, threshold))?.detect(trace)
}
