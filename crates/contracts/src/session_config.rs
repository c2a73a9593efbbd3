//! Session configuration contracts shared across crates.
//!
//! Describes one acquisition session: buffer geometry, display binning,
//! correlation lag range, recording sink and the simulated producer.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete session configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Configuration version
    #[serde(default)]
    pub version: ConfigVersion,

    /// Counter and buffer geometry
    #[serde(default)]
    pub acquisition: AcquisitionConfig,

    /// Display poll settings
    #[serde(default)]
    pub display: DisplayConfig,

    /// Correlation poll settings
    #[serde(default)]
    pub correlation: CorrelationConfig,

    /// Recording sink settings
    #[serde(default)]
    pub recording: RecordingConfig,

    /// Simulated producer settings
    #[serde(default)]
    pub simulator: SimulatorConfig,
}

impl SessionConfig {
    /// Number of samples summed into one display bin
    pub fn samples_per_bin(&self) -> usize {
        (self.acquisition.acquisition_rate / self.display.bin_size.max(1)).max(1) as usize
    }

    /// Total slot count of the interleaved sample buffer
    pub fn buffer_len(&self) -> usize {
        self.acquisition.buffer_size * self.acquisition.channels
    }

    /// Duration of one tick in seconds
    pub fn clock_period(&self) -> f64 {
        self.acquisition.clock_period()
    }
}

/// Counter and buffer geometry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcquisitionConfig {
    /// Number of counter channels (detectors)
    #[serde(default = "default_channels")]
    pub channels: usize,

    /// Samples per second per channel
    #[serde(default = "default_acquisition_rate")]
    pub acquisition_rate: u64,

    /// Samples per channel held by the circular buffer
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,
}

impl AcquisitionConfig {
    /// Duration of one tick in seconds
    pub fn clock_period(&self) -> f64 {
        1.0 / self.acquisition_rate.max(1) as f64
    }
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            channels: default_channels(),
            acquisition_rate: default_acquisition_rate(),
            buffer_size: default_buffer_size(),
        }
    }
}

fn default_channels() -> usize {
    2
}

fn default_acquisition_rate() -> u64 {
    100_000
}

fn default_buffer_size() -> usize {
    200_000
}

/// Display poll settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Display bins per second (visualization only, unrelated to lag bins)
    #[serde(default = "default_bin_size")]
    pub bin_size: u64,

    /// Number of points in the rolling display trace
    #[serde(default = "default_trace_width")]
    pub trace_width: usize,

    /// Display poll interval in milliseconds
    #[serde(default = "default_display_poll_ms")]
    pub poll_interval_ms: u64,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            bin_size: default_bin_size(),
            trace_width: default_trace_width(),
            poll_interval_ms: default_display_poll_ms(),
        }
    }
}

fn default_bin_size() -> u64 {
    1_000
}

fn default_trace_width() -> usize {
    1_000
}

fn default_display_poll_ms() -> u64 {
    16
}

/// Correlation poll settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrelationConfig {
    /// Run the correlation poll at all
    #[serde(default)]
    pub enabled: bool,

    /// Compute per-channel auto-correlation
    #[serde(default = "default_true")]
    pub auto: bool,

    /// Compute channel 0 x channel 1 cross-correlation
    #[serde(default)]
    pub cross: bool,

    /// Number of logarithmic lag bins
    #[serde(default = "default_nbins")]
    pub nbins: usize,

    /// Smallest lag in seconds (<= 0 means one tick)
    #[serde(default)]
    pub tmin: f64,

    /// Largest lag in seconds
    #[serde(default = "default_tmax")]
    pub tmax: f64,

    /// Replace a zero smallest edge by one tick
    #[serde(default = "default_true")]
    pub avoid_zero: bool,

    /// Correlation poll interval in seconds (0 or >= 301 stops the poll)
    #[serde(default = "default_correlation_poll_s")]
    pub poll_interval_s: u64,
}

impl Default for CorrelationConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            auto: true,
            cross: false,
            nbins: default_nbins(),
            tmin: 0.0,
            tmax: default_tmax(),
            avoid_zero: true,
            poll_interval_s: default_correlation_poll_s(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_nbins() -> usize {
    9
}

fn default_tmax() -> f64 {
    1.0
}

fn default_correlation_poll_s() -> u64 {
    10
}

/// Acquisition sink selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkType {
    /// Photon-HDF5 file (needs the `photon-hdf5` recorder feature)
    Hdf5,
    /// Per-tick CSV rows
    #[default]
    Csv,
    /// Log summaries only
    Log,
}

/// Recording sink settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordingConfig {
    /// Sink used for recordings in this session
    #[serde(default)]
    pub sink: SinkType,

    /// Recording length in seconds
    #[serde(default = "default_duration_s")]
    pub duration_s: u64,

    /// Directory recordings are written to
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// File name prefix
    #[serde(default = "default_file_stem")]
    pub file_stem: String,

    /// Sink worker queue capacity (batches)
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Spread same-tick photons over distinct timestamps
    #[serde(default)]
    pub expand: bool,
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            sink: SinkType::default(),
            duration_s: default_duration_s(),
            output_dir: default_output_dir(),
            file_stem: default_file_stem(),
            queue_capacity: default_queue_capacity(),
            expand: false,
        }
    }
}

fn default_duration_s() -> u64 {
    1
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./output")
}

fn default_file_stem() -> String {
    "measurement".to_string()
}

fn default_queue_capacity() -> usize {
    64
}

/// Simulated producer settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulatorConfig {
    /// Probability that a display-bin block contains a burst
    #[serde(default = "default_burst_probability")]
    pub burst_probability: f64,

    /// Mean photons per channel in one burst
    #[serde(default = "default_photons_per_burst")]
    pub photons_per_burst: u32,

    /// Burst standard deviation in seconds
    #[serde(default = "default_burst_width_s")]
    pub burst_width_s: f64,

    /// Background photon probability per sample and channel
    #[serde(default)]
    pub dark_count_probability: f64,

    /// Random seed (None = entropy)
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            burst_probability: default_burst_probability(),
            photons_per_burst: default_photons_per_burst(),
            burst_width_s: default_burst_width_s(),
            dark_count_probability: 0.0,
            seed: None,
        }
    }
}

fn default_burst_probability() -> f64 {
    0.1
}

fn default_photons_per_burst() -> u32 {
    50
}

fn default_burst_width_s() -> f64 {
    1e-3
}
