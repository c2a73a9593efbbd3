//! # Session
//!
//! One live acquisition session: the producer, every consumer of its
//! buffer, and the timers that poll them.
//!
//! - `DisplayTrace`: rolling per-channel trace of whole display bins
//! - `LiveCorrelator`: periodic auto/cross correlation of new samples
//! - recording through `recorder::AcquisitionRecorder`
//! - `Measurement`: mean count rate over a wait, for alignment controllers
//! - `SessionRunner`: async loop over the poll timers until shutdown
//!
//! ## Usage Example
//!
//! ```ignore
//! let session = Session::simulated(config)?;
//! let (runner, controls) = SessionRunner::new(session);
//! let task = tokio::spawn(runner.run());
//!
//! controls.correlation.set_seconds(5);
//! controls.commands.send(SessionCommand::StartRecording).await?;
//! // ...
//! controls.shutdown.cancel();
//! println!("{}", task.await??);
//! ```

mod correlation;
mod display;
mod error;
mod measure;
mod runner;
mod scheduler;
mod session;
mod stats;

pub use correlation::{CorrelationPoll, LiveCorrelator};
pub use display::{DisplayTrace, DisplayUpdate};
pub use error::{Result, SessionError};
pub use measure::{count_rate, Measurement};
pub use runner::{RunnerControls, SessionCommand, SessionRunner};
pub use scheduler::{period_from_secs, poll_timer, PollTimer, TimerControl, STOP_SECONDS};
pub use session::Session;
pub use stats::{SessionStats, SessionSummary};
