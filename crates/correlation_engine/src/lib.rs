//! # Correlation Engine
//!
//! Fluorescence correlation of photon arrival sequences.
//!
//! Responsibilities:
//! - Logarithmic lag bins in clock ticks (`gen_bins`)
//! - Two-pointer point-process correlation with finite-window normalization
//! - Span guard deciding whether a curve can be computed at all
//! - Detector selection for recorded photon streams
//! - Per-poll auto/cross correlation of live windows (`CorrelationEngine`)
//!
//! ## Usage Example
//!
//! ```
//! use correlation_engine::{correlate_checked, gen_bins};
//!
//! let bins = gen_bins(5, 0.0, 0.0, 1e-5, true);
//! let t: Vec<i64> = (0..2_000).map(|i| i * 97).collect();
//! let g = correlate_checked(&t, &t, bins.edges()).unwrap();
//! assert_eq!(g.len(), bins.bin_count());
//! ```

mod correlator;
mod engine;
mod error;
mod lag_bins;
mod selection;

pub use correlator::{
    check_span, combined_span, correlate_checked, pcorrelate, pcorrelate_counts, pcorrelate_raw,
    pnormalize,
};
pub use engine::{CorrelationCurve, CorrelationEngine, CorrelationReport, CurveKind};
pub use error::{CorrelationError, Result};
pub use lag_bins::{gen_bins, LagBins};
pub use selection::{correlate_stream, select_times, DetectorSelection, StreamCorrelation};
