//! Acquisition sink implementations
//!
//! Contains CsvSink, Hdf5Sink (feature `photon-hdf5`) and LogSink, plus the
//! `AcquisitionSink` enum selected once per recording.

mod acquisition;
mod csv_file;
#[cfg(feature = "photon-hdf5")]
mod hdf5_file;
mod log;

pub use self::acquisition::{create_sink, recording_path, AcquisitionSink};
pub use self::csv_file::CsvSink;
#[cfg(feature = "photon-hdf5")]
pub use self::hdf5_file::Hdf5Sink;
pub use self::log::LogSink;
