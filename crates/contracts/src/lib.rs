//! # Contracts
//!
//! Frozen interface contracts shared by every stage of the photon
//! correlation pipeline. Business crates depend on this crate only,
//! reverse dependencies are prohibited.
//!
//! ## Time Model
//! - All timestamps are integer clock ticks (`Tick`)
//! - One tick is one acquisition sample, `1 / acquisition_rate` seconds
//! - The sample buffer is channel-interleaved: slot `i` channel `c` lives at
//!   index `i * channel_count + c`

mod buffer;
mod error;
mod photon;
mod session_config;
mod sink;

pub use buffer::{SampleBuffer, SampleProducer, SampleWriter};
pub use error::*;
pub use photon::*;
pub use session_config::*;
pub use sink::*;
