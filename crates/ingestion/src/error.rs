//! Ingestion error types

use thiserror::Error;

/// Ingestion error
#[derive(Debug, Error)]
pub enum IngestionError {
    /// Buffer length is not a whole number of interleaved samples
    #[error("invalid buffer layout: length {buffer_len} with {channel_count} channels")]
    BufferLayout {
        /// Total slot count
        buffer_len: usize,
        /// Interleaved channel count
        channel_count: usize,
    },

    /// Display bin width of zero samples
    #[error("display bin must cover at least one sample")]
    EmptyDisplayBin,

    /// Simulated producer task failed
    #[error("simulated producer stopped abnormally: {message}")]
    ProducerFailed {
        /// Error message
        message: String,
    },
}

/// Ingestion Result type alias
pub type Result<T> = std::result::Result<T, IngestionError>;
