//! SinkHandle - runs a sink behind a bounded queue on its own task
//!
//! The recorder polls on the session's timer and must never wait for disk
//! I/O. Batches go through `try_send`; a full queue drops the batch and
//! counts it.

use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, instrument, warn};

use contracts::{PhotonBatch, PhotonSink};
use observability::metrics::record_sink_batch;

use crate::metrics::SinkMetrics;

/// Handle to a running sink worker
pub struct SinkHandle {
    /// Sink name
    name: String,
    /// Channel to send batches to worker
    tx: mpsc::Sender<PhotonBatch>,
    /// Shared metrics
    metrics: Arc<SinkMetrics>,
    /// Worker task handle
    worker_handle: JoinHandle<()>,
}

impl SinkHandle {
    /// Create a new SinkHandle and spawn the worker task
    pub fn spawn<S: PhotonSink + Send + 'static>(sink: S, queue_capacity: usize) -> Self {
        let name = sink.name().to_string();
        let (tx, rx) = mpsc::channel(queue_capacity.max(1));
        let metrics = Arc::new(SinkMetrics::new());

        let worker_metrics = Arc::clone(&metrics);
        let worker_name = name.clone();

        let worker_handle = tokio::spawn(async move {
            sink_worker(sink, rx, worker_metrics, worker_name).await;
        });

        Self {
            name,
            tx,
            metrics,
            worker_handle,
        }
    }

    /// Get sink name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get current metrics
    pub fn metrics(&self) -> &Arc<SinkMetrics> {
        &self.metrics
    }

    /// Queue a batch for the sink (non-blocking)
    ///
    /// Returns true if queued, false if the queue was full (batch dropped)
    pub fn try_send(&self, batch: PhotonBatch) -> bool {
        match self.tx.try_send(batch) {
            Ok(()) => {
                self.metrics
                    .observe_queue(self.tx.max_capacity() - self.tx.capacity());
                true
            }
            Err(mpsc::error::TrySendError::Full(b)) => {
                self.metrics.record_drop(b.len());
                record_sink_batch(&self.name, "dropped");
                warn!(
                    sink = %self.name,
                    photons = b.len(),
                    "Queue full, batch dropped"
                );
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                error!(sink = %self.name, "Sink worker closed unexpectedly");
                false
            }
        }
    }

    /// Shutdown the sink worker gracefully
    ///
    /// Queued batches are written, then the sink is flushed and closed.
    #[instrument(name = "sink_handle_shutdown", skip(self))]
    pub async fn shutdown(self) {
        drop(self.tx);
        if let Err(e) = self.worker_handle.await {
            error!(sink = %self.name, error = ?e, "Worker task panicked");
        }
        debug!(sink = %self.name, "SinkHandle shutdown complete");
    }
}

/// Worker task that consumes batches and writes them to the sink
#[instrument(
    name = "sink_worker_loop",
    skip(sink, rx, metrics),
    fields(sink = %name)
)]
async fn sink_worker<S: PhotonSink>(
    mut sink: S,
    mut rx: mpsc::Receiver<PhotonBatch>,
    metrics: Arc<SinkMetrics>,
    name: String,
) {
    debug!(sink = %name, "Sink worker started");

    while let Some(batch) = rx.recv().await {
        match sink.write(&batch).await {
            Ok(()) => {
                metrics.record_write(batch.len());
                record_sink_batch(&name, "ok");
            }
            Err(e) => {
                metrics.record_failure(batch.len());
                record_sink_batch(&name, "error");
                error!(
                    sink = %name,
                    photons = batch.len(),
                    error = %e,
                    "Write failed"
                );
            }
        }
    }

    if let Err(e) = sink.flush().await {
        error!(sink = %name, error = %e, "Flush failed on shutdown");
    }
    if let Err(e) = sink.close().await {
        error!(sink = %name, error = %e, "Close failed on shutdown");
    }

    debug!(sink = %name, "Sink worker stopped");
}
