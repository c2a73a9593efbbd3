//! PhotonSink trait - acquisition output interface
//!
//! Defines the abstract interface for persistence collaborators.

use crate::{ContractError, PhotonBatch};

/// Photon data output trait
///
/// All sink implementations must implement this trait. A sink receives the
/// photon stream of one recording as consecutive batches.
#[trait_variant::make(PhotonSink: Send)]
pub trait LocalPhotonSink {
    /// Sink name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Write one batch of timestamps and detector ids
    ///
    /// # Errors
    /// Returns write error (should include context)
    async fn write(&mut self, batch: &PhotonBatch) -> Result<(), ContractError>;

    /// Flush buffer (if any)
    async fn flush(&mut self) -> Result<(), ContractError>;

    /// Close sink, persisting anything still pending
    async fn close(&mut self) -> Result<(), ContractError>;
}
