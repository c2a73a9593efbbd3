//! Per-recording sink accounting
//!
//! Shared between the polling side (drops) and the sink worker (writes and
//! failures). Photons are counted next to batches so a summary can tell how
//! much of the recording actually reached the file.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

#[derive(Debug, Default)]
pub struct SinkMetrics {
    batches_written: AtomicU64,
    photons_written: AtomicU64,
    failed_batches: AtomicU64,
    dropped_batches: AtomicU64,
    /// Photons in failed or dropped batches
    photons_lost: AtomicU64,
    peak_queue: AtomicUsize,
}

impl SinkMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// A batch reached the sink
    pub fn record_write(&self, photons: usize) {
        self.batches_written.fetch_add(1, Ordering::Relaxed);
        self.photons_written
            .fetch_add(photons as u64, Ordering::Relaxed);
    }

    /// The sink rejected a batch
    pub fn record_failure(&self, photons: usize) {
        self.failed_batches.fetch_add(1, Ordering::Relaxed);
        self.photons_lost.fetch_add(photons as u64, Ordering::Relaxed);
    }

    /// A batch never got queued
    pub fn record_drop(&self, photons: usize) {
        self.dropped_batches.fetch_add(1, Ordering::Relaxed);
        self.photons_lost.fetch_add(photons as u64, Ordering::Relaxed);
    }

    /// Track the deepest the queue has been
    pub fn observe_queue(&self, len: usize) {
        self.peak_queue.fetch_max(len, Ordering::Relaxed);
    }

    pub fn photons_written(&self) -> u64 {
        self.photons_written.load(Ordering::Relaxed)
    }

    pub fn dropped_batches(&self) -> u64 {
        self.dropped_batches.load(Ordering::Relaxed)
    }

    pub fn failed_batches(&self) -> u64 {
        self.failed_batches.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            batches_written: self.batches_written.load(Ordering::Relaxed),
            photons_written: self.photons_written(),
            failed_batches: self.failed_batches(),
            dropped_batches: self.dropped_batches(),
            photons_lost: self.photons_lost.load(Ordering::Relaxed),
            peak_queue: self.peak_queue.load(Ordering::Relaxed),
        }
    }
}

/// Sink accounting at the end of a recording
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub batches_written: u64,
    pub photons_written: u64,
    pub failed_batches: u64,
    pub dropped_batches: u64,
    pub photons_lost: u64,
    pub peak_queue: usize,
}

impl MetricsSnapshot {
    /// Every photon handed to the sink was written
    pub fn is_lossless(&self) -> bool {
        self.photons_lost == 0
    }
}
