//! Session errors

use contracts::ContractError;
use ingestion::IngestionError;
use recorder::RecorderError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    /// Producer buffer does not match the configured geometry
    #[error("producer buffer is {actual_len} slots x {actual_channels} channels, config expects {expected_len} x {expected_channels}")]
    BufferMismatch {
        expected_len: usize,
        expected_channels: usize,
        actual_len: usize,
        actual_channels: usize,
    },

    #[error("display trace needs at least one point")]
    EmptyTrace,

    #[error("a recording is already running")]
    RecordingActive,

    #[error("no recording is running")]
    NoRecording,

    #[error(transparent)]
    Contract(#[from] ContractError),

    #[error(transparent)]
    Ingestion(#[from] IngestionError),

    #[error(transparent)]
    Recorder(#[from] RecorderError),
}

pub type Result<T> = std::result::Result<T, SessionError>;
