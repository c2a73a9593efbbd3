//! Photon CSV loader
//!
//! Reads a `time,ch0,ch1,...` recording back into a photon stream.

use std::path::Path;

use contracts::{DetectorId, PhotonBatch, Tick};
use ingestion::expand_batch;
use tracing::debug;

use crate::error::RecorderError;

/// Photons loaded from a CSV recording
#[derive(Debug, Clone, PartialEq)]
pub struct CsvPhotons {
    /// Chronological photon stream, `timestamps_unit` already divided by `expand_by`
    pub batch: PhotonBatch,

    /// Factor the tick values were multiplied by (1 without expansion)
    pub expand_by: u64,
}

/// Load a CSV recording
///
/// `clock_period` is the acquisition tick in seconds. With `expand`, photons
/// sharing a tick are spread over distinct timestamps.
///
/// # Errors
/// - `Csv` when the file cannot be read
/// - `CsvFormat` for a row that is not integer `time,count,...`
pub fn load_photon_csv(
    path: &Path,
    expand: bool,
    clock_period: f64,
) -> Result<CsvPhotons, RecorderError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)?;

    let channel_count = reader.headers()?.len().saturating_sub(1);
    let mut batch = PhotonBatch::new(clock_period, channel_count);

    for record in reader.records() {
        let record = record?;
        let line = record.position().map_or(0, |p| p.line());
        let format_error = |message: String| RecorderError::CsvFormat {
            path: path.to_path_buf(),
            line,
            message,
        };

        let mut fields = record.iter();
        let tick: Tick = fields
            .next()
            .ok_or_else(|| format_error("missing time column".to_string()))?
            .trim()
            .parse()
            .map_err(|e| format_error(format!("invalid time: {e}")))?;

        for (detector, field) in fields.enumerate() {
            let count: usize = field
                .trim()
                .parse()
                .map_err(|e| format_error(format!("invalid count: {e}")))?;
            let detector = DetectorId::try_from(detector)
                .map_err(|_| format_error("too many detector columns".to_string()))?;
            batch.timestamps.extend(std::iter::repeat_n(tick, count));
            batch.detectors.extend(std::iter::repeat_n(detector, count));
        }
    }

    let (batch, expand_by) = if expand {
        expand_batch(&batch)
    } else {
        (batch, 1)
    };
    debug!(
        path = %path.display(),
        photons = batch.len(),
        expand_by,
        "photon CSV loaded"
    );
    Ok(CsvPhotons { batch, expand_by })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write_csv(content: &str) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("rec.csv");
        std::fs::write(&path, content).unwrap();
        (dir, path)
    }

    #[test]
    fn test_load_plain() {
        let (_dir, path) = write_csv("time,green,red\n3,1,2\n7,1,0\n");
        let loaded = load_photon_csv(&path, false, 1e-5).unwrap();
        assert_eq!(loaded.expand_by, 1);
        assert_eq!(loaded.batch.timestamps, vec![3, 3, 3, 7]);
        assert_eq!(loaded.batch.detectors, vec![0, 1, 1, 0]);
        assert_eq!(loaded.batch.channel_count, 2);
    }

    #[test]
    fn test_load_expanded() {
        let (_dir, path) = write_csv("time,green,red\n3,1,2\n7,1,0\n");
        let loaded = load_photon_csv(&path, true, 1e-5).unwrap();
        assert_eq!(loaded.expand_by, 3);
        assert_eq!(loaded.batch.timestamps, vec![9, 10, 11, 21]);
        assert!((loaded.batch.timestamps_unit - 1e-5 / 3.0).abs() < 1e-18);
    }

    #[test]
    fn test_bad_row_reports_line() {
        let (_dir, path) = write_csv("time,green,red\n3,1,2\n4,x,0\n");
        let err = load_photon_csv(&path, false, 1e-5).unwrap_err();
        match err {
            RecorderError::CsvFormat { line, message, .. } => {
                assert_eq!(line, 3);
                assert!(message.contains("invalid count"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
