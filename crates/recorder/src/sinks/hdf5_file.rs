//! Hdf5Sink - photon-HDF5 recording written on close
//!
//! Layout:
//! - `photon_data/timestamps` (i64)
//! - `photon_data/detectors` (u8)
//! - `photon_data/timestamps_specs/timestamps_unit` (f64 scalar, seconds)

use std::path::{Path, PathBuf};

use contracts::{ContractError, PhotonBatch, PhotonSink};
use hdf5::File as H5File;
use ingestion::expand_batch;
use tracing::{info, instrument};

/// Sink accumulating photons and saving them as photon-HDF5
#[derive(Debug)]
pub struct Hdf5Sink {
    name: String,
    path: PathBuf,
    expand: bool,
    photons: PhotonBatch,
}

impl Hdf5Sink {
    /// Create a sink that will write to `path` when closed
    ///
    /// With `expand`, same-tick photons are spread over distinct timestamps
    /// and `timestamps_unit` is divided by the expansion factor.
    pub fn new(
        name: impl Into<String>,
        path: impl Into<PathBuf>,
        timestamps_unit: f64,
        channel_count: usize,
        expand: bool,
    ) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            expand,
            photons: PhotonBatch::new(timestamps_unit, channel_count),
        }
    }

    /// Target file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self, batch: &PhotonBatch) -> hdf5::Result<()> {
        let file = H5File::create(&self.path)?;
        let photon_data = file.create_group("photon_data")?;

        let timestamps = photon_data
            .new_dataset::<i64>()
            .shape([batch.len()])
            .create("timestamps")?;
        timestamps.write(&batch.timestamps)?;

        let detectors = photon_data
            .new_dataset::<u8>()
            .shape([batch.len()])
            .create("detectors")?;
        detectors.write(&batch.detectors)?;

        let specs = photon_data.create_group("timestamps_specs")?;
        specs
            .new_dataset::<f64>()
            .create("timestamps_unit")?
            .write_scalar(&batch.timestamps_unit)?;

        Ok(())
    }
}

impl PhotonSink for Hdf5Sink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "hdf5_sink_write",
        skip(self, batch),
        fields(sink = %self.name, photons = batch.len())
    )]
    async fn write(&mut self, batch: &PhotonBatch) -> Result<(), ContractError> {
        self.photons.extend(batch);
        Ok(())
    }

    #[instrument(name = "hdf5_sink_flush", skip(self))]
    async fn flush(&mut self) -> Result<(), ContractError> {
        Ok(())
    }

    #[instrument(name = "hdf5_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        if self.photons.is_empty() {
            info!(sink = %self.name, "Nothing recorded, not saving");
            return Ok(());
        }

        let empty = PhotonBatch::new(self.photons.timestamps_unit, self.photons.channel_count);
        let recorded = std::mem::replace(&mut self.photons, empty);
        let (batch, expand_by) = if self.expand {
            expand_batch(&recorded)
        } else {
            (recorded, 1)
        };
        self.save(&batch)
            .map_err(|e| ContractError::sink_write(&self.name, e.to_string()))?;

        info!(
            sink = %self.name,
            path = %self.path.display(),
            photons = batch.len(),
            per_detector = ?batch.counts_per_detector(),
            expand_by,
            "HDF5 recording saved"
        );
        Ok(())
    }
}
