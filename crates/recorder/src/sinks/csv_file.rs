//! CsvSink - one row of per-detector counts per tick
//!
//! Layout: header `time,ch0,ch1,...`, then one row per tick holding at
//! least one photon. The file is only created once the first photon
//! arrives, so an empty recording leaves nothing on disk.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use contracts::{ContractError, PhotonBatch, PhotonSink, Tick};
use tracing::{debug, info, instrument};

/// Sink writing tick rows to a CSV file
#[derive(Debug)]
pub struct CsvSink {
    name: String,
    path: PathBuf,
    channel_count: usize,
    writer: Option<csv::Writer<File>>,
    rows: u64,
}

impl CsvSink {
    /// Create a sink that will write to `path`
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>, channel_count: usize) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            channel_count: channel_count.max(1),
            writer: None,
            rows: 0,
        }
    }

    /// Target file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rows written so far
    pub fn rows(&self) -> u64 {
        self.rows
    }

    fn open(&mut self) -> Result<&mut csv::Writer<File>, ContractError> {
        if self.writer.is_none() {
            if let Some(parent) = self.path.parent() {
                fs::create_dir_all(parent)
                    .map_err(|e| ContractError::sink_connection(&self.name, e.to_string()))?;
            }
            let mut writer = csv::Writer::from_path(&self.path)
                .map_err(|e| ContractError::sink_connection(&self.name, e.to_string()))?;

            let mut header = vec!["time".to_string()];
            header.extend((0..self.channel_count).map(|c| format!("ch{c}")));
            writer
                .write_record(&header)
                .map_err(|e| ContractError::sink_write(&self.name, e.to_string()))?;

            debug!(sink = %self.name, path = %self.path.display(), "CSV file created");
            self.writer = Some(writer);
        }
        self.writer
            .as_mut()
            .ok_or_else(|| ContractError::sink_connection(&self.name, "writer unavailable"))
    }

    fn write_rows(&mut self, batch: &PhotonBatch) -> Result<(), ContractError> {
        let channel_count = self.channel_count;
        let name = self.name.clone();
        let writer = self.open()?;

        let mut rows = 0;
        let mut counts = vec![0u64; channel_count];
        let mut current: Option<Tick> = None;
        for (&tick, &detector) in batch.timestamps.iter().zip(&batch.detectors) {
            if let Some(previous) = current.filter(|&t| t != tick) {
                write_row(writer, previous, &counts, &name)?;
                counts.fill(0);
                rows += 1;
            }
            current = Some(tick);
            if let Some(count) = counts.get_mut(detector as usize) {
                *count += 1;
            }
        }
        if let Some(last) = current {
            write_row(writer, last, &counts, &name)?;
            rows += 1;
        }

        self.rows += rows;
        Ok(())
    }
}

fn write_row(
    writer: &mut csv::Writer<File>,
    tick: Tick,
    counts: &[u64],
    name: &str,
) -> Result<(), ContractError> {
    let mut record = csv::StringRecord::with_capacity(16, counts.len() + 1);
    record.push_field(&tick.to_string());
    for count in counts {
        record.push_field(&count.to_string());
    }
    writer
        .write_record(&record)
        .map_err(|e| ContractError::sink_write(name, e.to_string()))
}

impl PhotonSink for CsvSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "csv_sink_write",
        skip(self, batch),
        fields(sink = %self.name, photons = batch.len())
    )]
    async fn write(&mut self, batch: &PhotonBatch) -> Result<(), ContractError> {
        if batch.is_empty() {
            return Ok(());
        }
        self.write_rows(batch)
    }

    #[instrument(name = "csv_sink_flush", skip(self))]
    async fn flush(&mut self) -> Result<(), ContractError> {
        if let Some(writer) = self.writer.as_mut() {
            writer.flush()?;
        }
        Ok(())
    }

    #[instrument(name = "csv_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        match self.writer.take() {
            Some(mut writer) => {
                writer.flush()?;
                info!(
                    sink = %self.name,
                    path = %self.path.display(),
                    rows = self.rows,
                    "CSV recording saved"
                );
            }
            None => info!(sink = %self.name, "Nothing recorded, not saving"),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_csv_sink_rows_per_tick() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("rec.csv");
        let mut sink = CsvSink::new("csv", &path, 2);

        let batch = PhotonBatch {
            timestamps: vec![3, 3, 3, 7],
            detectors: vec![0, 1, 1, 0],
            timestamps_unit: 1e-5,
            channel_count: 2,
        };
        sink.write(&batch).await.unwrap();
        sink.write(&PhotonBatch {
            timestamps: vec![9],
            detectors: vec![1],
            timestamps_unit: 1e-5,
            channel_count: 2,
        })
        .await
        .unwrap();
        sink.close().await.unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, "time,ch0,ch1\n3,1,2\n7,1,0\n9,0,1\n");
        assert_eq!(sink.rows(), 3);
    }

    #[tokio::test]
    async fn test_empty_recording_not_saved() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.csv");
        let mut sink = CsvSink::new("csv", &path, 2);

        sink.write(&PhotonBatch::new(1e-5, 2)).await.unwrap();
        sink.flush().await.unwrap();
        sink.close().await.unwrap();
        assert!(!path.exists());
    }
}
