//! Recorder error types

use std::path::PathBuf;

use contracts::SinkType;
use thiserror::Error;

/// Recorder-specific errors
#[derive(Debug, Error)]
pub enum RecorderError {
    /// Sink creation error
    #[error("failed to create sink '{name}': {message}")]
    SinkCreation { name: String, message: String },

    /// Sink type not compiled into this build
    #[error("sink type {sink:?} is not available in this build")]
    UnsupportedSink { sink: SinkType },

    /// Malformed photon CSV file
    #[error("{}:{line}: {message}", path.display())]
    CsvFormat {
        path: PathBuf,
        line: u64,
        message: String,
    },

    /// CSV library error
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// Sink error (from contract)
    #[error("sink error: {0}")]
    Contract(#[from] contracts::ContractError),

    /// Buffer layout error
    #[error("ingestion error: {0}")]
    Ingestion(#[from] ingestion::IngestionError),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl RecorderError {
    /// Create a sink creation error
    pub fn sink_creation(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkCreation {
            name: name.into(),
            message: message.into(),
        }
    }
}
