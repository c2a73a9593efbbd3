//! AcquisitionSink - the sink variant chosen for one recording

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use contracts::{ContractError, PhotonBatch, PhotonSink, SinkType};
use tracing::debug;

use super::{CsvSink, LogSink};
#[cfg(feature = "photon-hdf5")]
use super::Hdf5Sink;
use crate::error::RecorderError;
use crate::recorder::RecorderSettings;

/// Polymorphic acquisition sink
#[derive(Debug)]
pub enum AcquisitionSink {
    /// Per-tick CSV rows
    Csv(CsvSink),
    /// Photon-HDF5 file
    #[cfg(feature = "photon-hdf5")]
    Hdf5(Hdf5Sink),
    /// Log summaries only
    Log(LogSink),
}

impl AcquisitionSink {
    /// File the recording is saved to, if the sink writes one
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Csv(sink) => Some(sink.path()),
            #[cfg(feature = "photon-hdf5")]
            Self::Hdf5(sink) => Some(sink.path()),
            Self::Log(_) => None,
        }
    }
}

/// `<output_dir>/<file_stem>_<unix seconds>.<ext>`
pub fn recording_path(
    output_dir: &Path,
    file_stem: &str,
    started_at: DateTime<Utc>,
    extension: &str,
) -> PathBuf {
    output_dir.join(format!(
        "{file_stem}_{}.{extension}",
        started_at.timestamp()
    ))
}

/// Create the sink selected by `settings.sink`
///
/// # Errors
/// `UnsupportedSink` for HDF5 when built without the `photon-hdf5` feature.
pub fn create_sink(
    settings: &RecorderSettings,
    started_at: DateTime<Utc>,
) -> Result<AcquisitionSink, RecorderError> {
    let sink = match settings.sink {
        SinkType::Csv => {
            let path = recording_path(&settings.output_dir, &settings.file_stem, started_at, "csv");
            AcquisitionSink::Csv(CsvSink::new("csv", path, settings.channel_count))
        }
        #[cfg(feature = "photon-hdf5")]
        SinkType::Hdf5 => {
            let path = recording_path(&settings.output_dir, &settings.file_stem, started_at, "h5");
            std::fs::create_dir_all(&settings.output_dir)
                .map_err(|e| RecorderError::sink_creation("hdf5", e.to_string()))?;
            AcquisitionSink::Hdf5(Hdf5Sink::new(
                "hdf5",
                path,
                settings.clock_period,
                settings.channel_count,
                settings.expand,
            ))
        }
        #[cfg(not(feature = "photon-hdf5"))]
        SinkType::Hdf5 => {
            return Err(RecorderError::UnsupportedSink {
                sink: SinkType::Hdf5,
            })
        }
        SinkType::Log => AcquisitionSink::Log(LogSink::new("log")),
    };
    debug!(sink = ?settings.sink, path = ?sink.path(), "acquisition sink created");
    Ok(sink)
}

impl PhotonSink for AcquisitionSink {
    fn name(&self) -> &str {
        match self {
            Self::Csv(sink) => sink.name(),
            #[cfg(feature = "photon-hdf5")]
            Self::Hdf5(sink) => sink.name(),
            Self::Log(sink) => sink.name(),
        }
    }

    async fn write(&mut self, batch: &PhotonBatch) -> Result<(), ContractError> {
        match self {
            Self::Csv(sink) => sink.write(batch).await,
            #[cfg(feature = "photon-hdf5")]
            Self::Hdf5(sink) => sink.write(batch).await,
            Self::Log(sink) => sink.write(batch).await,
        }
    }

    async fn flush(&mut self) -> Result<(), ContractError> {
        match self {
            Self::Csv(sink) => sink.flush().await,
            #[cfg(feature = "photon-hdf5")]
            Self::Hdf5(sink) => sink.flush().await,
            Self::Log(sink) => sink.flush().await,
        }
    }

    async fn close(&mut self) -> Result<(), ContractError> {
        match self {
            Self::Csv(sink) => sink.close().await,
            #[cfg(feature = "photon-hdf5")]
            Self::Hdf5(sink) => sink.close().await,
            Self::Log(sink) => sink.close().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn settings(sink: SinkType) -> RecorderSettings {
        RecorderSettings {
            sink,
            output_dir: PathBuf::from("/tmp/rec"),
            ..RecorderSettings::default()
        }
    }

    #[test]
    fn test_recording_path() {
        let started_at = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let path = recording_path(Path::new("out"), "measurement", started_at, "csv");
        assert_eq!(path, PathBuf::from("out/measurement_1700000000.csv"));
    }

    #[test]
    fn test_create_csv_and_log() {
        let started_at = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let csv = create_sink(&settings(SinkType::Csv), started_at).unwrap();
        assert_eq!(csv.name(), "csv");
        assert_eq!(
            csv.path(),
            Some(Path::new("/tmp/rec/measurement_1700000000.csv"))
        );

        let log = create_sink(&settings(SinkType::Log), started_at).unwrap();
        assert!(log.path().is_none());
    }

    #[cfg(not(feature = "photon-hdf5"))]
    #[test]
    fn test_hdf5_unavailable_without_feature() {
        let err = create_sink(&settings(SinkType::Hdf5), Utc::now()).unwrap_err();
        assert!(matches!(err, RecorderError::UnsupportedSink { .. }));
    }
}
