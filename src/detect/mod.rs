//! Spike detection on single voltage traces.

pub mod detector;
pub mod peaks;
pub mod smooth;

pub use detector::{
    count_spikes, DetectorConfig, SpikeDetector, DEFAULT_SAMPLE_RATE, DEFAULT_THRESHOLD,
    SMOOTHING_POLYORDER,
};
pub use peaks::{find_peaks, local_maxima, select_by_distance};
pub use smooth::{savgol_coefficients, savgol_filter};
