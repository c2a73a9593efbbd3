//! Correlation error types
//!
//! None of these are fatal: the poll that hits one skips the affected
//! curve and tries again on the next tick.

use contracts::Tick;
use thiserror::Error;

/// Correlation error
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CorrelationError {
    /// An input sequence holds no arrival
    #[error("{which} arrival sequence is empty")]
    EmptySequence {
        /// Which input ("reference" or "target")
        which: &'static str,
    },

    /// Observed span does not exceed the largest lag edge
    #[error("arrival span of {span} ticks does not exceed the largest lag of {required} ticks")]
    InsufficientSpan {
        /// Combined span of both inputs
        span: Tick,
        /// Largest lag-bin edge
        required: Tick,
    },

    /// Fewer than two lag edges survived binning
    #[error("no lag bin is resolvable at this clock period")]
    NoLagBins,

    /// Lag edges are not strictly increasing
    #[error("lag edge {index} is not greater than the previous edge")]
    NonIncreasingEdges {
        /// Index of the offending edge
        index: usize,
    },

    /// Timestamps and detectors of a photon stream differ in length
    #[error("photon stream has {timestamps} timestamps but {detectors} detector ids")]
    LengthMismatch {
        /// Number of timestamps
        timestamps: usize,
        /// Number of detector ids
        detectors: usize,
    },

    /// Detector selection cannot be resolved against the stream
    #[error("detector selection: {message}")]
    DetectorSelection {
        /// Error message
        message: String,
    },
}

impl CorrelationError {
    /// Create detector selection error
    pub fn detector_selection(message: impl Into<String>) -> Self {
        Self::DetectorSelection {
            message: message.into(),
        }
    }
}

/// Correlation Result type alias
pub type Result<T> = std::result::Result<T, CorrelationError>;
