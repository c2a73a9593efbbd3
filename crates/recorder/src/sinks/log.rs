//! LogSink - logs batch summaries via tracing

use contracts::{ContractError, PhotonBatch, PhotonSink};
use tracing::{info, instrument};

/// Sink that logs batch summaries instead of saving photons
#[derive(Debug)]
pub struct LogSink {
    name: String,
    photons: u64,
}

impl LogSink {
    /// Create a new LogSink with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            photons: 0,
        }
    }

    fn log_batch_summary(&self, batch: &PhotonBatch) {
        info!(
            sink = %self.name,
            photons = batch.len(),
            first_tick = batch.timestamps.first().copied(),
            last_tick = batch.timestamps.last().copied(),
            per_detector = ?batch.counts_per_detector(),
            "PhotonBatch received"
        );
    }
}

impl PhotonSink for LogSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "log_sink_write",
        skip(self, batch),
        fields(sink = %self.name, photons = batch.len())
    )]
    async fn write(&mut self, batch: &PhotonBatch) -> Result<(), ContractError> {
        self.photons += batch.len() as u64;
        self.log_batch_summary(batch);
        Ok(())
    }

    #[instrument(name = "log_sink_flush", skip(self))]
    async fn flush(&mut self) -> Result<(), ContractError> {
        Ok(())
    }

    #[instrument(name = "log_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        info!(sink = %self.name, photons = self.photons, "LogSink closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_log_sink_counts_photons() {
        let mut sink = LogSink::new("test_log");
        let batch = PhotonBatch {
            timestamps: vec![0, 1, 1],
            detectors: vec![0, 0, 1],
            timestamps_unit: 1e-5,
            channel_count: 2,
        };

        sink.write(&batch).await.unwrap();
        sink.write(&PhotonBatch::new(1e-5, 2)).await.unwrap();
        sink.flush().await.unwrap();
        sink.close().await.unwrap();
        assert_eq!(sink.photons, 3);
    }
}
