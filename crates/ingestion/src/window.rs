//! Unread windows of the shared sample buffer

use std::ops::Range;

use contracts::SampleBuffer;

/// Slot ranges of one unread window, in chronological order
///
/// A wrapped window is `[last_read, len)` followed by `[0, producer_index)`.
/// Both ranges always start and end on a sample boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Window {
    first: Range<usize>,
    second: Range<usize>,
    channel_count: usize,
}

impl Window {
    pub(crate) fn new(first: Range<usize>, second: Range<usize>, channel_count: usize) -> Self {
        Self {
            first,
            second,
            channel_count,
        }
    }

    /// A window covering no slot
    pub fn empty(channel_count: usize) -> Self {
        Self::new(0..0, 0..0, channel_count.max(1))
    }

    /// True when the window holds no slot
    pub fn is_empty(&self) -> bool {
        self.first.is_empty() && self.second.is_empty()
    }

    /// True when the window crosses the end of the buffer
    pub fn is_wrapped(&self) -> bool {
        !self.second.is_empty()
    }

    /// First slot of the window
    pub fn start(&self) -> usize {
        self.first.start
    }

    /// Slot ranges in chronological order (the second one may be empty)
    pub fn ranges(&self) -> [Range<usize>; 2] {
        [self.first.clone(), self.second.clone()]
    }

    /// Every slot index, in chronological order
    pub fn slots(&self) -> impl Iterator<Item = usize> + '_ {
        self.first.clone().chain(self.second.clone())
    }

    /// Number of slots
    pub fn slot_count(&self) -> usize {
        self.first.len() + self.second.len()
    }

    /// Number of whole multi-channel samples
    pub fn sample_count(&self) -> usize {
        self.slot_count() / self.channel_count
    }

    /// Interleaved channel count
    pub fn channel_count(&self) -> usize {
        self.channel_count
    }

    /// Keep only the first `samples` samples
    pub fn truncated(&self, samples: usize) -> Window {
        let mut remaining = samples.saturating_mul(self.channel_count);
        let first_len = self.first.len().min(remaining);
        remaining -= first_len;
        let second_len = self.second.len().min(remaining);
        Window::new(
            self.first.start..self.first.start + first_len,
            self.second.start..self.second.start + second_len,
            self.channel_count,
        )
    }

    /// Copy the window's counts out of the live buffer
    pub fn snapshot(&self, buffer: &SampleBuffer) -> WindowSnapshot {
        let mut counts = Vec::with_capacity(self.slot_count());
        for range in self.ranges() {
            buffer.copy_range(range, &mut counts);
        }
        WindowSnapshot::new(counts, self.channel_count)
    }
}

/// Owned, chronologically ordered copy of a window's interleaved counts
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WindowSnapshot {
    counts: Vec<u64>,
    channel_count: usize,
}

impl WindowSnapshot {
    /// Wrap interleaved counts; a trailing partial sample is dropped
    pub fn new(mut counts: Vec<u64>, channel_count: usize) -> Self {
        let channel_count = channel_count.max(1);
        counts.truncate(counts.len() - counts.len() % channel_count);
        Self {
            counts,
            channel_count,
        }
    }

    /// Interleaved channel count
    pub fn channel_count(&self) -> usize {
        self.channel_count
    }

    /// Number of whole samples
    pub fn sample_count(&self) -> usize {
        self.counts.len() / self.channel_count
    }

    /// True when the snapshot holds no sample
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Raw interleaved counts
    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    /// Per-sample slices of `channel_count` counts
    pub fn samples(&self) -> std::slice::ChunksExact<'_, u64> {
        self.counts.chunks_exact(self.channel_count)
    }

    /// Total count over every channel
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Total count of one channel
    pub fn channel_total(&self, channel: usize) -> u64 {
        self.samples().filter_map(|s| s.get(channel)).sum()
    }
}
