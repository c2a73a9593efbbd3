//! # Recorder
//!
//! Acquisition recording module.
//!
//! Responsibilities:
//! - Consume the live sample buffer for a fixed duration
//! - Hand photon batches to the selected sink (CSV, photon-HDF5, log)
//! - Isolate slow sinks behind a bounded queue, never blocking the poll
//! - Load CSV recordings back into photon streams

pub mod error;
pub mod handle;
pub mod loader;
pub mod metrics;
pub mod recorder;
pub mod sinks;

pub use contracts::{PhotonBatch, PhotonSink};
pub use error::RecorderError;
pub use handle::SinkHandle;
pub use loader::{load_photon_csv, CsvPhotons};
pub use metrics::{MetricsSnapshot, SinkMetrics};
pub use recorder::{AcquisitionRecorder, RecorderSettings, RecordingStatus, RecordingSummary};
pub use sinks::{create_sink, recording_path, AcquisitionSink, CsvSink, LogSink};
#[cfg(feature = "photon-hdf5")]
pub use sinks::Hdf5Sink;
