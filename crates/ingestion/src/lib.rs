//! # Ingestion
//!
//! Turns the continuously overwritten sample buffer into ordered data.
//!
//! Responsibilities:
//! - Track each consumer's read position (`RingBufferCursor`)
//! - Snapshot unread windows, wraparound included
//! - Expand counts into arrival times, photon streams or display bins
//! - Simulated counter standing in for the hardware producer
//!
//! ## Usage Example
//!
//! ```ignore
//! use ingestion::{arrival_times, RingBufferCursor};
//!
//! let mut cursor = RingBufferCursor::for_buffer(&buffer);
//! let window = cursor.extract(buffer.write_index());
//! let snapshot = window.snapshot(&buffer);
//! let per_channel = arrival_times(&snapshot, 0);
//! ```

mod cursor;
mod error;
mod expander;
mod simulator;
mod window;

pub use cursor::RingBufferCursor;
pub use error::{IngestionError, Result};
pub use expander::{
    aggregate_bins, arrival_times, channel_arrival_times, expand_batch, expanded_arrival_times,
    merged_arrival_times, photon_stream, AggregatedBins, ArrivalExpander,
};
pub use simulator::{BurstGenerator, SimulatedCounter, SimulatorSettings, SimulatorStats};
pub use window::{Window, WindowSnapshot};
