//! Shared sample buffer - Producer output / consumer input
//!
//! A fixed-length, channel-interleaved circular buffer of photon counts.
//! Exactly one `SampleWriter` overwrites it in place and publishes a write
//! index; any number of `SampleBuffer` views read it. No lock guards the
//! slots: each slot is an atomic cell, and the write index is published with
//! release ordering after the slots it covers have been stored.

use std::fmt;
use std::ops::Range;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

struct Shared {
    slots: Box<[AtomicU64]>,
    channel_count: usize,
    write_index: AtomicUsize,
}

/// Read-only view of the shared sample buffer
///
/// Cheap to clone; every consumer role holds its own clone.
#[derive(Clone)]
pub struct SampleBuffer {
    shared: Arc<Shared>,
}

/// Exclusive write handle of the shared sample buffer
///
/// Not `Clone`: the buffer has a single producer.
pub struct SampleWriter {
    shared: Arc<Shared>,
}

impl fmt::Debug for SampleBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SampleBuffer")
            .field("len", &self.len())
            .field("channel_count", &self.channel_count())
            .field("write_index", &self.write_index())
            .finish()
    }
}

impl fmt::Debug for SampleWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SampleWriter")
            .field("len", &self.len())
            .field("write_index", &self.write_index())
            .finish()
    }
}

impl SampleBuffer {
    /// Allocate a zeroed buffer of `samples_per_channel * channel_count` slots
    ///
    /// Zero sizes are raised to one so cursor arithmetic never divides by zero.
    pub fn allocate(samples_per_channel: usize, channel_count: usize) -> (SampleWriter, Self) {
        let channel_count = channel_count.max(1);
        let len = samples_per_channel.max(1) * channel_count;
        let slots = (0..len).map(|_| AtomicU64::new(0)).collect();
        let shared = Arc::new(Shared {
            slots,
            channel_count,
            write_index: AtomicUsize::new(0),
        });
        (
            SampleWriter {
                shared: Arc::clone(&shared),
            },
            Self { shared },
        )
    }

    /// Build a buffer pre-filled with interleaved counts
    ///
    /// `counts.len()` must be a multiple of `channel_count`; a trailing
    /// partial sample is dropped.
    pub fn from_counts(counts: &[u64], channel_count: usize, write_index: usize) -> Self {
        let channel_count = channel_count.max(1);
        let samples = counts.len() / channel_count;
        let (mut writer, buffer) = Self::allocate(samples, channel_count);
        for (index, &value) in counts.iter().take(writer.len()).enumerate() {
            writer.store(index, value);
        }
        writer.publish(write_index);
        buffer
    }

    /// Total slot count (`samples_per_channel * channel_count`)
    #[inline]
    pub fn len(&self) -> usize {
        self.shared.slots.len()
    }

    /// Always false; kept for API symmetry with slices
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.shared.slots.is_empty()
    }

    /// Number of interleaved channels
    #[inline]
    pub fn channel_count(&self) -> usize {
        self.shared.channel_count
    }

    /// Number of samples per channel
    #[inline]
    pub fn samples_per_channel(&self) -> usize {
        self.len() / self.channel_count()
    }

    /// Read one slot
    #[inline]
    pub fn load(&self, index: usize) -> u64 {
        self.shared.slots[index].load(Ordering::Relaxed)
    }

    /// Copy a contiguous slot range into `out`
    pub fn copy_range(&self, range: Range<usize>, out: &mut Vec<u64>) {
        out.extend(
            self.shared.slots[range]
                .iter()
                .map(|slot| slot.load(Ordering::Relaxed)),
        );
    }

    /// Last index published by the producer
    #[inline]
    pub fn write_index(&self) -> usize {
        self.shared.write_index.load(Ordering::Acquire)
    }
}

impl SampleWriter {
    /// A read view onto the buffer this writer owns
    pub fn buffer(&self) -> SampleBuffer {
        SampleBuffer {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Total slot count
    #[inline]
    pub fn len(&self) -> usize {
        self.shared.slots.len()
    }

    /// Always false; kept for API symmetry with slices
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.shared.slots.is_empty()
    }

    /// Number of interleaved channels
    #[inline]
    pub fn channel_count(&self) -> usize {
        self.shared.channel_count
    }

    /// Overwrite one slot
    #[inline]
    pub fn store(&mut self, index: usize, value: u64) {
        self.shared.slots[index].store(value, Ordering::Relaxed);
    }

    /// Add to one slot
    #[inline]
    pub fn add(&mut self, index: usize, value: u64) {
        self.shared.slots[index].fetch_add(value, Ordering::Relaxed);
    }

    /// Publish the write index (taken modulo buffer length)
    #[inline]
    pub fn publish(&mut self, write_index: usize) {
        let len = self.len();
        self.shared
            .write_index
            .store(write_index % len, Ordering::Release);
    }

    /// Last index published by this writer
    #[inline]
    pub fn write_index(&self) -> usize {
        self.shared.write_index.load(Ordering::Acquire)
    }
}

/// Photon counter producer
///
/// Implemented by hardware bindings and by the simulated counter. The core
/// only reads through this interface.
pub trait SampleProducer: Send + Sync {
    /// Index up to which samples are valid
    ///
    /// May point into the middle of a multi-channel sample; consumers round
    /// it down to a multiple of the channel count.
    fn current_write_index(&self) -> usize;

    /// The fixed-length buffer the producer writes into
    fn read_buffer(&self) -> SampleBuffer;
}

impl SampleProducer for SampleBuffer {
    fn current_write_index(&self) -> usize {
        self.write_index()
    }

    fn read_buffer(&self) -> SampleBuffer {
        self.clone()
    }
}
